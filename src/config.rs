//! Connection settings for the pfSense firewall and the UniFi controller.
//!
//! Loaded from a TOML file with two tables, `[pfsense]` and `[unifi]`;
//! environment variables prefixed `PFSENSE2UNIFI_` override file values
//! (`PFSENSE2UNIFI_UNIFI__API_KEY` sets `unifi.api_key`).

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use secrecy::SecretString;
use serde::Deserialize;
use url::Url;

use crate::controller::ControllerPlatform;
use crate::remote::SshTarget;
use crate::MigrationError;

pub const ENV_PREFIX: &str = "PFSENSE2UNIFI_";

#[derive(Debug, Deserialize)]
pub struct Config {
    pub pfsense: PfSenseConfig,
    pub unifi: UnifiConfig,
}

#[derive(Debug, Deserialize)]
pub struct PfSenseConfig {
    pub host: String,

    #[serde(default = "default_ssh_port")]
    pub port: u16,

    pub username: String,

    pub password: SecretString,

    /// Location of config.xml on the firewall.
    #[serde(default = "default_remote_path")]
    pub remote_path: String,

    /// Where the fetched config.xml is stored and read back from.
    #[serde(default = "default_local_path")]
    pub local_path: PathBuf,

    /// Expected `SHA256:` host key fingerprint; unset accepts any key.
    #[serde(default)]
    pub host_key_fingerprint: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UnifiConfig {
    /// Controller base URL (e.g. "https://192.168.1.1").
    pub controller: Url,

    pub api_key: SecretString,

    /// Display name of the network that receives the reservations.
    pub lan_name: String,

    #[serde(default)]
    pub platform: ControllerPlatform,

    /// Accept self-signed controller certificates.
    #[serde(default = "default_insecure")]
    pub insecure: bool,

    /// HTTP timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    #[serde(default = "default_gateway_file")]
    pub gateway_file: PathBuf,

    // Controller host SSH access, only used when uploading the gateway file.
    #[serde(default)]
    pub ssh_host: Option<String>,

    #[serde(default = "default_ssh_port")]
    pub ssh_port: u16,

    #[serde(default)]
    pub ssh_username: Option<String>,

    #[serde(default)]
    pub ssh_password: Option<SecretString>,

    #[serde(default)]
    pub ssh_host_key_fingerprint: Option<String>,

    #[serde(default)]
    pub gateway_remote_path: Option<String>,

    #[serde(default = "default_restart_command")]
    pub restart_command: String,
}

fn default_ssh_port() -> u16 {
    22
}
fn default_remote_path() -> String {
    "/cf/conf/config.xml".into()
}
fn default_local_path() -> PathBuf {
    PathBuf::from("config.xml")
}
fn default_insecure() -> bool {
    true
}
fn default_timeout() -> u64 {
    30
}
fn default_gateway_file() -> PathBuf {
    PathBuf::from("config.gateway.json")
}
fn default_restart_command() -> String {
    "sudo systemctl restart unifi".into()
}

/// Load the configuration file, applying environment overrides.
pub fn load_config(path: &Path) -> Result<Config, MigrationError> {
    if !path.is_file() {
        return Err(MigrationError::Config(format!(
            "config file not found: {}",
            path.display()
        )));
    }

    Figment::new()
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()
        .map_err(|e| MigrationError::Config(e.to_string()))
}

impl PfSenseConfig {
    pub fn ssh_target(&self) -> SshTarget {
        SshTarget {
            host: self.host.clone(),
            port: self.port,
            username: self.username.clone(),
            password: self.password.clone(),
            host_key_fingerprint: self.host_key_fingerprint.clone(),
        }
    }
}

/// Settings needed to upload the gateway file to the controller host.
#[derive(Debug, Clone)]
pub struct GatewayUpload {
    pub target: SshTarget,
    pub remote_path: String,
    pub restart_command: String,
}

impl UnifiConfig {
    /// Validate and collect the upload settings; the SSH host defaults to
    /// the controller URL's host.
    pub fn gateway_upload(&self) -> Result<GatewayUpload, MigrationError> {
        let host = self
            .ssh_host
            .clone()
            .or_else(|| self.controller.host_str().map(str::to_string))
            .ok_or_else(|| missing_upload_key("ssh_host"))?;
        let username = self
            .ssh_username
            .clone()
            .ok_or_else(|| missing_upload_key("ssh_username"))?;
        let password = self
            .ssh_password
            .clone()
            .ok_or_else(|| missing_upload_key("ssh_password"))?;
        let remote_path = self
            .gateway_remote_path
            .clone()
            .ok_or_else(|| missing_upload_key("gateway_remote_path"))?;

        Ok(GatewayUpload {
            target: SshTarget {
                host,
                port: self.ssh_port,
                username,
                password,
                host_key_fingerprint: self.ssh_host_key_fingerprint.clone(),
            },
            remote_path,
            restart_command: self.restart_command.clone(),
        })
    }
}

fn missing_upload_key(key: &str) -> MigrationError {
    MigrationError::Config(format!(
        "unifi.{} is required for --upload-gateway",
        key
    ))
}
