use thiserror::Error;

#[derive(Error, Debug)]
pub enum MigrationError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("SSH connection to {host} failed: {message}")]
    Connection { host: String, message: String },

    #[error("Transfer of {path} failed: {message}")]
    Transfer { path: String, message: String },

    #[error("Failed to parse pfSense config: {0}")]
    Parse(String),

    #[error("UniFi API login failed: {0}")]
    Auth(String),

    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Not logged in to the UniFi controller (call login first)")]
    NotLoggedIn,

    #[error("No UniFi site resolved (call resolve_site first)")]
    SiteNotResolved,

    #[error("{kind} not found: {detail}")]
    NotFound { kind: &'static str, detail: String },

    #[error("{kind} '{name}' is ambiguous, matches: {}", .matches.join(", "))]
    Ambiguous {
        kind: &'static str,
        name: String,
        matches: Vec<String>,
    },

    #[error("UniFi API request rejected (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Cannot serialize DNS entry {entry}: {reason}")]
    Serialization { entry: String, reason: String },

    #[error("Gateway config upload failed: {0}")]
    Upload(String),
}

impl MigrationError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
