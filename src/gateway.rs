//! `config.gateway.json` generation for DNS host overrides.
//!
//! The controller merges this file into the gateway's provisioned
//! configuration; overrides live under
//! `system → static-host-mapping → host-name → <fqdn> → inet`.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;
use tracing::{info, warn};

use crate::config::GatewayUpload;
use crate::remote::{write_atomically, SshSession};
use crate::{DnsEntry, MigrationError};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GatewayConfig {
    pub system: SystemSection,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SystemSection {
    #[serde(rename = "static-host-mapping")]
    pub static_host_mapping: StaticHostMapping,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StaticHostMapping {
    /// Keyed by FQDN; sorted so output is stable.
    #[serde(rename = "host-name")]
    pub host_name: BTreeMap<String, HostAddresses>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HostAddresses {
    pub inet: Vec<String>,
}

impl GatewayConfig {
    pub fn len(&self) -> usize {
        self.system.static_host_mapping.host_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn addresses(&self, fqdn: &str) -> Option<&[String]> {
        self.system
            .static_host_mapping
            .host_name
            .get(fqdn)
            .map(|h| h.inet.as_slice())
    }
}

fn validate_entry(entry: &DnsEntry) -> Result<(), MigrationError> {
    let reason = if entry.hostname.is_empty() {
        Some("empty hostname")
    } else if entry.ip_address.is_empty() {
        Some("empty IP address")
    } else if entry.hostname.chars().any(char::is_whitespace)
        || entry.domain.chars().any(char::is_whitespace)
    {
        Some("whitespace in host name")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(MigrationError::Serialization {
            entry: format!("{} -> {}", entry.fqdn(), entry.ip_address),
            reason: reason.to_string(),
        }),
        None => Ok(()),
    }
}

/// Build the gateway document, one override per FQDN.
///
/// Entries sharing an FQDN are merged into one `inet` list.
pub fn generate_gateway_config(entries: &[DnsEntry]) -> Result<GatewayConfig, MigrationError> {
    let mut config = GatewayConfig::default();

    for entry in entries {
        validate_entry(entry)?;

        let fqdn = entry.fqdn();
        let host = config
            .system
            .static_host_mapping
            .host_name
            .entry(fqdn.clone())
            .or_default();

        if !host.inet.is_empty() {
            warn!(%fqdn, ip = %entry.ip_address, "duplicate host override, merging addresses");
        }
        if !host.inet.contains(&entry.ip_address) {
            host.inet.push(entry.ip_address.clone());
        }
    }

    Ok(config)
}

/// Pretty JSON with 4-space indentation and a trailing newline.
pub fn render_gateway_config(config: &GatewayConfig) -> Result<String, MigrationError> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    config
        .serialize(&mut serializer)
        .map_err(|e| MigrationError::Serialization {
            entry: "gateway config".to_string(),
            reason: e.to_string(),
        })?;
    buf.push(b'\n');

    String::from_utf8(buf).map_err(|e| MigrationError::Serialization {
        entry: "gateway config".to_string(),
        reason: e.to_string(),
    })
}

/// Render and write the gateway file, replacing any previous copy.
pub fn write_gateway_file(config: &GatewayConfig, path: &Path) -> Result<(), MigrationError> {
    let rendered = render_gateway_config(config)?;
    write_atomically(path, rendered.as_bytes()).map_err(|e| MigrationError::Transfer {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    info!(path = %path.display(), overrides = config.len(), "wrote gateway config");
    Ok(())
}

/// Copy the gateway file to the controller host and run the restart
/// command, returning the command's output.
pub async fn upload_gateway_file(
    path: &Path,
    upload: &GatewayUpload,
) -> Result<String, MigrationError> {
    let contents = std::fs::read(path)
        .map_err(|e| MigrationError::Upload(format!("cannot read {}: {}", path.display(), e)))?;

    let session = SshSession::connect(&upload.target)
        .await
        .map_err(|e| MigrationError::Upload(e.to_string()))?;

    let result: Result<String, MigrationError> = async {
        session
            .write_file(&upload.remote_path, &contents)
            .await
            .map_err(|e| MigrationError::Upload(e.to_string()))?;
        info!(host = %upload.target.host, remote = %upload.remote_path, "uploaded gateway config");

        let output = session
            .exec(&upload.restart_command, None)
            .await
            .map_err(|e| MigrationError::Upload(e.to_string()))?;
        if !output.success() {
            return Err(MigrationError::Upload(format!(
                "'{}' failed: {}",
                upload.restart_command,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
    .await;

    session.close().await;
    result
}
