// Legacy API payloads used by the migration. Fields the migration never
// reads are left out; serde ignores them.

use std::fmt;

use serde::{Deserialize, Serialize};

/// `{ "meta": { "rc": "ok", "msg": "..." }, "data": [...] }`
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    pub meta: Meta,
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Meta {
    pub rc: String,
    #[serde(default)]
    pub msg: Option<String>,
}

/// A management partition, as listed by `api/self/sites`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Site {
    /// Short name used in site-scoped URLs (e.g. `default`).
    pub name: String,
    #[serde(default)]
    pub desc: Option<String>,
}

/// `name (description)`, or just the name when the description is empty.
impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.desc.as_deref().filter(|d| !d.is_empty()) {
            Some(desc) => write!(f, "{} ({})", self.name, desc),
            None => write!(f, "{}", self.name),
        }
    }
}

/// Internal identifier (`_id`) of a configured network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkRef(pub String);

impl NetworkRef {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct NetworkConf {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Body of `POST rest/user`: a known client with a fixed IP.
#[derive(Debug, Serialize)]
pub(crate) struct FixedIpClient<'a> {
    pub mac: String,
    pub fixed_ip: &'a str,
    pub name: &'a str,
    pub network_id: &'a str,
    pub use_fixedip: bool,
}

/// Error bodies are not always enveloped (UniFi OS proxy errors are plain
/// `{ "message": ... }` or HTML).
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub meta: Option<Meta>,
    #[serde(default)]
    pub message: Option<String>,
}
