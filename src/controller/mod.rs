//! UniFi Network controller client.
//!
//! Speaks the controller's legacy JSON API (`{ meta, data }` envelopes),
//! authenticated with an `X-API-KEY` header.

mod client;
mod models;

use serde::Deserialize;

pub use client::{ControllerClient, TransportConfig};
pub use models::{NetworkRef, Site};

/// Controller flavour, which decides where the Network API is mounted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ControllerPlatform {
    /// UniFi OS consoles (UDM, UXG, Cloud Key Gen2+): `/proxy/network`
    #[default]
    UnifiOs,
    /// Self-hosted Network application
    Standalone,
}

impl ControllerPlatform {
    pub fn api_prefix(self) -> &'static str {
        match self {
            ControllerPlatform::UnifiOs => "/proxy/network",
            ControllerPlatform::Standalone => "",
        }
    }
}
