// Stateful controller client for one migration run.
//
// Holds the HTTP client and the session established by `login`; the site
// resolved by `resolve_site` scopes every later request. Operations must be
// called in order: login, resolve_site, resolve_network, submit.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};
use url::Url;

use super::models::{Envelope, ErrorBody, FixedIpClient, NetworkConf, NetworkRef, Site};
use super::ControllerPlatform;
use crate::{MigrationError, StaticMapping, SubmissionFailure, SubmissionReport};

const API_KEY_HEADER: &str = "x-api-key";

/// HTTP settings shared by every controller request.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub timeout: Duration,
    /// Accept self-signed certificates (UniFi consoles ship with one).
    pub accept_invalid_certs: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            accept_invalid_certs: true,
        }
    }
}

impl TransportConfig {
    pub fn build_client(&self) -> Result<reqwest::Client, MigrationError> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(concat!("pfsense2unifi/", env!("CARGO_PKG_VERSION")))
            .danger_accept_invalid_certs(self.accept_invalid_certs)
            .build()
            .map_err(MigrationError::Transport)
    }
}

struct Session {
    base_url: Url,
    api_key: SecretString,
}

pub struct ControllerClient {
    http: reqwest::Client,
    platform: ControllerPlatform,
    session: Option<Session>,
    site: Option<Site>,
}

impl ControllerClient {
    pub fn new(
        platform: ControllerPlatform,
        transport: &TransportConfig,
    ) -> Result<Self, MigrationError> {
        Ok(Self::with_client(transport.build_client()?, platform))
    }

    /// Use a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, platform: ControllerPlatform) -> Self {
        Self {
            http,
            platform,
            session: None,
            site: None,
        }
    }

    /// The site chosen by [`resolve_site`](Self::resolve_site), if any.
    pub fn site(&self) -> Option<&Site> {
        self.site.as_ref()
    }

    // ── URL builders ─────────────────────────────────────────────────

    fn url(&self, base_url: &Url, path: &str) -> Result<Url, MigrationError> {
        let full = format!(
            "{}{}/api/{}",
            base_url.as_str().trim_end_matches('/'),
            self.platform.api_prefix(),
            path
        );
        Url::parse(&full)
            .map_err(|e| MigrationError::Config(format!("invalid controller URL {}: {}", full, e)))
    }

    fn session(&self) -> Result<&Session, MigrationError> {
        self.session.as_ref().ok_or(MigrationError::NotLoggedIn)
    }

    /// `{base}{prefix}/api/{path}`
    fn api_url(&self, path: &str) -> Result<Url, MigrationError> {
        self.url(&self.session()?.base_url, path)
    }

    /// `{base}{prefix}/api/s/{site}/{path}`
    fn site_url(&self, path: &str) -> Result<Url, MigrationError> {
        let site = self.site.as_ref().ok_or(MigrationError::SiteNotResolved)?;
        self.api_url(&format!("s/{}/{}", site.name, path))
    }

    fn headers(api_key: &SecretString) -> Result<HeaderMap, MigrationError> {
        let mut headers = HeaderMap::new();
        let mut key = HeaderValue::from_str(api_key.expose_secret())
            .map_err(|_| MigrationError::Auth("API key contains invalid characters".into()))?;
        key.set_sensitive(true);
        headers.insert(API_KEY_HEADER, key);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    // ── Request helpers ──────────────────────────────────────────────

    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<Vec<T>, MigrationError> {
        debug!("GET {}", url);
        let headers = Self::headers(&self.session()?.api_key)?;
        let resp = self.http.get(url).headers(headers).send().await?;
        parse_envelope(resp).await
    }

    async fn post<T: DeserializeOwned>(
        &self,
        url: Url,
        body: &impl Serialize,
    ) -> Result<Vec<T>, MigrationError> {
        debug!("POST {}", url);
        let headers = Self::headers(&self.session()?.api_key)?;
        let resp = self
            .http
            .post(url)
            .headers(headers)
            .json(body)
            .send()
            .await?;
        parse_envelope(resp).await
    }

    // ── Operations ───────────────────────────────────────────────────

    /// Verify the API key against `api/self` and keep it for later calls.
    pub async fn login(
        &mut self,
        base_url: &Url,
        api_key: &SecretString,
    ) -> Result<(), MigrationError> {
        let url = self.url(base_url, "self")?;
        debug!("GET {}", url);

        let resp = self
            .http
            .get(url)
            .headers(Self::headers(api_key)?)
            .send()
            .await
            .map_err(|e| MigrationError::Auth(format!("controller unreachable: {}", e)))?;

        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(MigrationError::Auth(format!(
                "API key rejected (HTTP {})",
                status.as_u16()
            )));
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(MigrationError::Auth(format!(
                "HTTP {}: {}",
                status.as_u16(),
                error_message(&body)
            )));
        }

        info!(controller = %base_url, "logged in to UniFi controller");
        self.session = Some(Session {
            base_url: base_url.clone(),
            api_key: api_key.clone(),
        });
        Ok(())
    }

    /// Pick the first site the API key can manage.
    pub async fn resolve_site(&mut self) -> Result<Site, MigrationError> {
        let url = self.api_url("self/sites")?;
        let sites: Vec<Site> = self.get(url).await?;

        let Some(site) = sites.first().cloned() else {
            return Err(MigrationError::NotFound {
                kind: "site",
                detail: "controller returned no sites".into(),
            });
        };

        if sites.len() > 1 {
            let names: Vec<&str> = sites.iter().map(|s| s.name.as_str()).collect();
            warn!(
                sites = %names.join(", "),
                "controller manages {} sites, using the first one ({})",
                sites.len(),
                site.name
            );
        }

        info!(site = %site.name, "resolved site");
        self.site = Some(site.clone());
        Ok(site)
    }

    /// Find the network whose display name is exactly `name`.
    pub async fn resolve_network(&self, name: &str) -> Result<NetworkRef, MigrationError> {
        let url = self.site_url("rest/networkconf")?;
        let networks: Vec<NetworkConf> = self.get(url).await?;

        let matches: Vec<&NetworkConf> = networks
            .iter()
            .filter(|n| n.name.as_deref() == Some(name))
            .collect();

        match matches.as_slice() {
            [network] => {
                info!(network = %name, id = %network.id, "resolved network");
                Ok(NetworkRef(network.id.clone()))
            }
            [] => {
                let available: Vec<&str> =
                    networks.iter().filter_map(|n| n.name.as_deref()).collect();
                Err(MigrationError::NotFound {
                    kind: "network",
                    detail: format!("'{}' (available: {})", name, available.join(", ")),
                })
            }
            _ => Err(MigrationError::Ambiguous {
                kind: "network",
                name: name.to_string(),
                matches: matches.iter().map(|n| n.id.clone()).collect(),
            }),
        }
    }

    /// Create one fixed-IP client reservation on `network`.
    pub async fn submit_static_mapping(
        &self,
        mapping: &StaticMapping,
        network: &NetworkRef,
    ) -> Result<(), MigrationError> {
        let url = self.site_url("rest/user")?;
        let body = FixedIpClient {
            mac: normalize_mac(&mapping.mac_address),
            fixed_ip: &mapping.ip_address,
            name: &mapping.hostname,
            network_id: network.as_str(),
            use_fixedip: true,
        };

        let _: Vec<serde_json::Value> = self.post(url, &body).await?;
        debug!(mac = %body.mac, ip = %mapping.ip_address, "reservation created");
        Ok(())
    }

    /// Submit each mapping in turn. A rejected mapping is recorded in the
    /// report and the remaining ones are still submitted.
    pub async fn submit_static_mappings(
        &self,
        mappings: &[StaticMapping],
        network: &NetworkRef,
    ) -> SubmissionReport {
        let mut report = SubmissionReport::default();

        for mapping in mappings {
            match self.submit_static_mapping(mapping, network).await {
                Ok(()) => report.succeeded.push(mapping.clone()),
                Err(error) => {
                    debug!(
                        mac = %mapping.mac_address,
                        ip = %mapping.ip_address,
                        %error,
                        "reservation rejected"
                    );
                    report.failed.push(SubmissionFailure {
                        mapping: mapping.clone(),
                        error,
                    });
                }
            }
        }

        info!(
            succeeded = report.succeeded.len(),
            failed = report.failed.len(),
            "DHCP submission finished"
        );
        report
    }
}

/// Unwrap the `{ meta, data }` envelope, mapping failures to `Api` errors.
async fn parse_envelope<T: DeserializeOwned>(
    resp: reqwest::Response,
) -> Result<Vec<T>, MigrationError> {
    let status = resp.status();
    let body = resp.text().await?;

    if status == StatusCode::UNAUTHORIZED {
        return Err(MigrationError::Auth(
            "API key no longer accepted (HTTP 401)".into(),
        ));
    }
    if !status.is_success() {
        return Err(MigrationError::Api {
            status: status.as_u16(),
            message: error_message(&body),
        });
    }

    let envelope: Envelope<T> =
        serde_json::from_str(&body).map_err(|e| MigrationError::Api {
            status: status.as_u16(),
            message: format!("unexpected response body: {}", e),
        })?;

    if envelope.meta.rc == "ok" {
        Ok(envelope.data)
    } else {
        Err(MigrationError::Api {
            status: status.as_u16(),
            message: envelope
                .meta
                .msg
                .unwrap_or_else(|| format!("rc={}", envelope.meta.rc)),
        })
    }
}

/// Best-effort human message from an error response body.
fn error_message(body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        if let Some(msg) = parsed.meta.and_then(|m| m.msg).or(parsed.message) {
            return msg;
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        "no response body".to_string()
    } else {
        trimmed.chars().take(200).collect()
    }
}

/// Lowercase, colon-separated MAC as the controller stores it.
pub(crate) fn normalize_mac(mac: &str) -> String {
    mac.trim().to_ascii_lowercase().replace('-', ":")
}
