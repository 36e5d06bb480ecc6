//! SSH transport for the firewall fetch and the controller-host upload.
//!
//! Files are moved over exec channels (`cat`), so only a POSIX shell is
//! required on the remote side. Every call blocks its caller until the
//! remote command exits; nothing runs in parallel.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use russh::client::{self, Handle};
use russh::keys::{HashAlg, PublicKey};
use russh::{ChannelMsg, Disconnect};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info, warn};

use crate::MigrationError;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);
const INACTIVITY_TIMEOUT: Duration = Duration::from_secs(60);

/// Where and as whom to connect.
#[derive(Debug, Clone)]
pub struct SshTarget {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: SecretString,
    /// Expected `SHA256:...` fingerprint of the server key.
    pub host_key_fingerprint: Option<String>,
}

/// Output of a finished remote command.
#[derive(Debug, Default)]
pub struct CommandOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub exit_status: Option<u32>,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_status == Some(0)
    }

    fn stderr_message(&self) -> String {
        let text = String::from_utf8_lossy(&self.stderr).trim().to_string();
        if text.is_empty() {
            match self.exit_status {
                Some(code) => format!("remote command exited with status {}", code),
                None => "remote command ended without an exit status".to_string(),
            }
        } else {
            text
        }
    }
}

struct HostKeyCheck {
    host: String,
    expected: Option<String>,
}

impl client::Handler for HostKeyCheck {
    type Error = russh::Error;

    async fn check_server_key(&mut self, server_public_key: &PublicKey) -> Result<bool, Self::Error> {
        let fingerprint = server_public_key.fingerprint(HashAlg::Sha256).to_string();
        match &self.expected {
            Some(expected) if fingerprint_matches(expected, &fingerprint) => Ok(true),
            Some(expected) => {
                warn!(
                    host = %self.host,
                    %expected,
                    presented = %fingerprint,
                    "host key mismatch"
                );
                Ok(false)
            }
            None => {
                warn!(host = %self.host, %fingerprint, "accepting unverified host key");
                Ok(true)
            }
        }
    }
}

fn fingerprint_matches(expected: &str, presented: &str) -> bool {
    let strip = |s: &str| s.trim().trim_start_matches("SHA256:").to_string();
    strip(expected) == strip(presented)
}

/// Quote a path for a POSIX shell command line.
pub(crate) fn shell_quote(raw: &str) -> String {
    format!("'{}'", raw.replace('\'', r"'\''"))
}

/// An authenticated SSH session.
pub struct SshSession {
    handle: Handle<HostKeyCheck>,
    host: String,
}

impl SshSession {
    /// Connect and authenticate with a password.
    pub async fn connect(target: &SshTarget) -> Result<Self, MigrationError> {
        let connection_error = |message: String| MigrationError::Connection {
            host: target.host.clone(),
            message,
        };

        let config = Arc::new(client::Config {
            inactivity_timeout: Some(INACTIVITY_TIMEOUT),
            ..Default::default()
        });
        let handler = HostKeyCheck {
            host: target.host.clone(),
            expected: target.host_key_fingerprint.clone(),
        };

        debug!(host = %target.host, port = target.port, "opening SSH connection");
        let connect = client::connect(config, (target.host.as_str(), target.port), handler);
        let mut handle = tokio::time::timeout(CONNECT_TIMEOUT, connect)
            .await
            .map_err(|_| {
                connection_error(format!(
                    "timed out after {}s",
                    CONNECT_TIMEOUT.as_secs()
                ))
            })?
            .map_err(|e| connection_error(e.to_string()))?;

        let auth = handle
            .authenticate_password(target.username.as_str(), target.password.expose_secret())
            .await
            .map_err(|e| connection_error(e.to_string()))?;
        if !auth.success() {
            return Err(connection_error(format!(
                "authentication rejected for user {}",
                target.username
            )));
        }

        info!(host = %target.host, user = %target.username, "SSH session established");
        Ok(Self {
            handle,
            host: target.host.clone(),
        })
    }

    /// Run a command, optionally feeding `stdin`, and wait for it to exit.
    pub async fn exec(
        &self,
        command: &str,
        stdin: Option<&[u8]>,
    ) -> Result<CommandOutput, MigrationError> {
        let channel_error = |e: russh::Error| MigrationError::Connection {
            host: self.host.clone(),
            message: e.to_string(),
        };

        debug!(host = %self.host, %command, "exec");
        let mut channel = self
            .handle
            .channel_open_session()
            .await
            .map_err(channel_error)?;
        channel.exec(true, command).await.map_err(channel_error)?;

        if let Some(data) = stdin {
            channel.data(data).await.map_err(channel_error)?;
        }
        channel.eof().await.map_err(channel_error)?;

        let mut output = CommandOutput::default();
        while let Some(msg) = channel.wait().await {
            match msg {
                ChannelMsg::Data { ref data } => output.stdout.extend_from_slice(data),
                ChannelMsg::ExtendedData { ref data, ext: 1 } => {
                    output.stderr.extend_from_slice(data);
                }
                ChannelMsg::ExitStatus { exit_status } => output.exit_status = Some(exit_status),
                _ => {}
            }
        }

        Ok(output)
    }

    /// Read a remote file into memory.
    pub async fn read_file(&self, remote_path: &str) -> Result<Vec<u8>, MigrationError> {
        let output = self
            .exec(&format!("cat -- {}", shell_quote(remote_path)), None)
            .await?;
        if !output.success() {
            return Err(MigrationError::Transfer {
                path: remote_path.to_string(),
                message: output.stderr_message(),
            });
        }
        Ok(output.stdout)
    }

    /// Replace a remote file with `contents`.
    pub async fn write_file(&self, remote_path: &str, contents: &[u8]) -> Result<(), MigrationError> {
        let output = self
            .exec(&format!("cat > {}", shell_quote(remote_path)), Some(contents))
            .await?;
        if !output.success() {
            return Err(MigrationError::Transfer {
                path: remote_path.to_string(),
                message: output.stderr_message(),
            });
        }
        Ok(())
    }

    pub async fn close(self) {
        if let Err(e) = self
            .handle
            .disconnect(Disconnect::ByApplication, "", "en")
            .await
        {
            debug!(host = %self.host, error = %e, "SSH disconnect failed");
        }
    }
}

/// Write bytes to `path` through a temporary sibling file, synced before
/// the rename.
pub(crate) fn write_atomically(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let tmp_path = path.with_extension(format!("tmp.{}", std::process::id()));
    let written = File::create(&tmp_path).and_then(|mut tmp_file| {
        tmp_file.write_all(contents)?;
        tmp_file.sync_all()
    });
    if let Err(e) = written {
        let _ = fs::remove_file(&tmp_path);
        return Err(e);
    }
    if let Err(e) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e);
    }
    Ok(())
}

/// Copy `remote_path` from the firewall to `local_path`, overwriting it.
pub async fn fetch_file(
    target: &SshTarget,
    remote_path: &str,
    local_path: &Path,
) -> Result<usize, MigrationError> {
    let session = SshSession::connect(target).await?;
    let result = session.read_file(remote_path).await;
    session.close().await;
    let contents = result?;

    write_atomically(local_path, &contents).map_err(|e| MigrationError::Transfer {
        path: local_path.display().to_string(),
        message: e.to_string(),
    })?;

    info!(
        bytes = contents.len(),
        local = %local_path.display(),
        "fetched {}",
        remote_path
    );
    Ok(contents.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shell_quote() {
        assert_eq!(shell_quote("/cf/conf/config.xml"), "'/cf/conf/config.xml'");
        assert_eq!(shell_quote("/tmp/it's here"), r"'/tmp/it'\''s here'");
    }

    const TEST_KEY: &str =
        "ssh-ed25519 AAAAC3NzaC1lZDI1NTE5AAAAIAECAwQFBgcICQoLDA0ODxAREhMUFRYXGBkaGxwdHh8g pfsense@test";

    fn host_key_check(expected: Option<String>) -> HostKeyCheck {
        HostKeyCheck {
            host: "192.168.1.1".to_string(),
            expected,
        }
    }

    #[tokio::test]
    async fn test_host_key_check() {
        use russh::client::Handler as _;

        let key = PublicKey::from_openssh(TEST_KEY).unwrap();
        let fingerprint = key.fingerprint(HashAlg::Sha256).to_string();

        let mut pinned = host_key_check(Some(fingerprint));
        assert!(pinned.check_server_key(&key).await.unwrap());

        let mut mismatched = host_key_check(Some(
            "SHA256:47DEQpj8HBSa+/TImW+5JCeuQeRkm5NMpJWZG3hSuFU".to_string(),
        ));
        assert!(!mismatched.check_server_key(&key).await.unwrap());

        let mut unpinned = host_key_check(None);
        assert!(unpinned.check_server_key(&key).await.unwrap());
    }

    #[test]
    fn test_fingerprint_matches_with_or_without_prefix() {
        assert!(fingerprint_matches("SHA256:abc", "SHA256:abc"));
        assert!(fingerprint_matches(" abc ", "SHA256:abc"));
        assert!(!fingerprint_matches("SHA256:abd", "SHA256:abc"));
    }

    #[test]
    fn test_stderr_message_falls_back_to_status() {
        let output = CommandOutput {
            stderr: b"cat: /nope: No such file or directory\n".to_vec(),
            exit_status: Some(1),
            ..Default::default()
        };
        assert_eq!(
            output.stderr_message(),
            "cat: /nope: No such file or directory"
        );

        let silent = CommandOutput {
            exit_status: Some(2),
            ..Default::default()
        };
        assert_eq!(silent.stderr_message(), "remote command exited with status 2");
    }

    #[test]
    fn test_write_atomically_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.xml");
        fs::write(&path, "old").unwrap();

        write_atomically(&path, b"<pfsense/>").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "<pfsense/>");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
