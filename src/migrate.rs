use anyhow::{Context, Result};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::{Config, GatewayUpload, UnifiConfig};
use crate::controller::{ControllerClient, NetworkRef, TransportConfig};
use crate::gateway::{generate_gateway_config, upload_gateway_file, write_gateway_file};
use crate::remote::fetch_file;
use crate::{
    parse_config, DnsEntry, MigrationOptions, ParseReport, StaticMapping, SubmissionReport,
};

/// Which stages of the migration to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Fetch from pfSense, then submit to UniFi
    All,
    /// Fetch and parse only
    PfSenseOnly,
    /// Parse the local copy and submit to UniFi
    UnifiOnly,
}

impl Mode {
    pub fn fetches(self) -> bool {
        matches!(self, Mode::All | Mode::PfSenseOnly)
    }

    pub fn submits(self) -> bool {
        matches!(self, Mode::All | Mode::UnifiOnly)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MigrationPlan {
    pub mode: Mode,
    /// Submit DHCP reservations to the controller
    pub dhcp: bool,
    /// Generate the gateway file for DNS host overrides
    pub dns: bool,
    /// Upload the gateway file and restart the controller service
    pub upload_gateway: bool,
}

impl MigrationPlan {
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            dhcp: true,
            dns: true,
            upload_gateway: false,
        }
    }
}

#[derive(Debug)]
pub struct DnsOutcome {
    pub path: PathBuf,
    pub overrides: usize,
    pub uploaded: bool,
}

#[derive(Debug, Default)]
pub struct MigrationSummary {
    pub fetched_bytes: Option<usize>,
    pub parse: ParseReport,
    pub dhcp: Option<SubmissionReport>,
    pub dns: Option<DnsOutcome>,
    /// One line per branch that did not complete
    pub failures: Vec<String>,
}

impl MigrationSummary {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Run the selected stages in order: fetch, parse, then the DHCP and DNS
/// branches. A failure inside one branch does not stop the other.
pub async fn run_migration(
    config: &Config,
    plan: &MigrationPlan,
    options: &MigrationOptions,
) -> Result<MigrationSummary> {
    let upload = if plan.mode.submits() && plan.dns && plan.upload_gateway {
        Some(config.unifi.gateway_upload()?)
    } else {
        None
    };

    let mut summary = MigrationSummary::default();
    let pfsense = &config.pfsense;

    if plan.mode.fetches() {
        if options.verbose {
            println!("Connecting to pfSense at {}...", pfsense.host);
        }
        let bytes = fetch_file(&pfsense.ssh_target(), &pfsense.remote_path, &pfsense.local_path)
            .await
            .context("Failed to fetch config.xml from pfSense")?;
        println!(
            "[+] Downloaded {} ({} bytes) to {}",
            pfsense.remote_path,
            bytes,
            pfsense.local_path.display()
        );
        summary.fetched_bytes = Some(bytes);
    }

    summary.parse = load_source(&pfsense.local_path, options)?;

    if !plan.mode.submits() {
        return Ok(summary);
    }

    if plan.dhcp {
        match migrate_dhcp(&config.unifi, &summary.parse.mappings, options).await {
            Ok(report) => {
                if !report.is_complete() {
                    summary.failures.push(format!(
                        "{} of {} DHCP reservations failed",
                        report.failed.len(),
                        report.failed.len() + report.succeeded.len()
                    ));
                }
                summary.dhcp = Some(report);
            }
            Err(e) => {
                eprintln!("[-] DHCP migration aborted: {:#}", e);
                summary.failures.push(format!("DHCP migration aborted: {:#}", e));
            }
        }
    }

    if plan.dns {
        match migrate_dns(&config.unifi, &summary.parse.dns_entries) {
            Ok(mut outcome) => {
                if let Some(upload) = &upload {
                    if let Err(e) = upload_gateway(&mut outcome, upload).await {
                        eprintln!("[-] Gateway upload failed: {:#}", e);
                        summary.failures.push(format!("Gateway upload failed: {:#}", e));
                    }
                }
                summary.dns = Some(outcome);
            }
            Err(e) => {
                eprintln!("[-] DNS migration failed: {:#}", e);
                summary.failures.push(format!("DNS migration failed: {:#}", e));
            }
        }
    }

    Ok(summary)
}

/// Read and parse the local pfSense config, reporting what was found.
pub fn load_source(path: &Path, options: &MigrationOptions) -> Result<ParseReport> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open input file: {}", path.display()))?;
    let report = parse_config(BufReader::new(file))
        .with_context(|| format!("Failed to parse input file: {}", path.display()))?;

    if options.verbose {
        for mapping in &report.mappings {
            println!(
                "Found static mapping: {} -> {} ({})",
                mapping.mac_address, mapping.ip_address, mapping.hostname
            );
        }
        for entry in &report.dns_entries {
            println!("Found DNS entry: {} -> {}", entry.fqdn(), entry.ip_address);
        }
    }
    for skipped in &report.skipped {
        println!("[!] Skipped {}", skipped);
    }

    println!(
        "[+] Extracted {} DHCP reservations and {} static DNS entries.",
        report.mappings.len(),
        report.dns_entries.len()
    );
    Ok(report)
}

/// Log in, resolve site and network, then submit every mapping.
pub async fn migrate_dhcp(
    unifi: &UnifiConfig,
    mappings: &[StaticMapping],
    options: &MigrationOptions,
) -> Result<SubmissionReport> {
    if mappings.is_empty() {
        println!("[!] No DHCP reservations to migrate.");
        return Ok(SubmissionReport::default());
    }

    let transport = TransportConfig {
        timeout: Duration::from_secs(unifi.timeout),
        accept_invalid_certs: unifi.insecure,
    };
    let mut client = ControllerClient::new(unifi.platform, &transport)?;

    client
        .login(&unifi.controller, &unifi.api_key)
        .await
        .with_context(|| format!("Failed to log in to {}", unifi.controller))?;
    println!("[+] UniFi API login successful!");

    let site = client
        .resolve_site()
        .await
        .context("Failed to resolve UniFi site")?;
    println!("[+] Using site: {}", site);

    let network = client
        .resolve_network(&unifi.lan_name)
        .await
        .with_context(|| format!("Failed to resolve network '{}'", unifi.lan_name))?;
    if options.verbose {
        println!("[+] Found network '{}': {}", unifi.lan_name, network.as_str());
    }

    Ok(submit_mappings(&client, mappings, &network).await)
}

/// Submit every mapping and print one line per outcome.
pub async fn submit_mappings(
    client: &ControllerClient,
    mappings: &[StaticMapping],
    network: &NetworkRef,
) -> SubmissionReport {
    let report = client.submit_static_mappings(mappings, network).await;

    for mapping in &report.succeeded {
        println!(
            "[+] Added {} -> {} ({})",
            mapping.mac_address, mapping.ip_address, mapping.hostname
        );
    }
    for failure in &report.failed {
        eprintln!(
            "[-] Failed to add {} -> {}: {}",
            failure.mapping.mac_address, failure.mapping.ip_address, failure.error
        );
    }
    report
}

/// Generate and write the gateway file.
pub fn migrate_dns(unifi: &UnifiConfig, entries: &[DnsEntry]) -> Result<DnsOutcome> {
    let gateway = generate_gateway_config(entries)?;
    let path = unifi.gateway_file.clone();
    write_gateway_file(&gateway, &path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!(
        "[+] Generated {} with {} static DNS entries.",
        path.display(),
        gateway.len()
    );

    Ok(DnsOutcome {
        path,
        overrides: gateway.len(),
        uploaded: false,
    })
}

/// Upload a written gateway file and restart the controller service.
///
/// On failure the outcome keeps `uploaded: false`; the local file is untouched.
pub async fn upload_gateway(outcome: &mut DnsOutcome, upload: &GatewayUpload) -> Result<()> {
    let output = upload_gateway_file(&outcome.path, upload)
        .await
        .with_context(|| {
            format!(
                "{} was written locally but not uploaded",
                outcome.path.display()
            )
        })?;
    if !output.is_empty() {
        println!("{}", output);
    }
    println!(
        "[+] Uploaded {} to {} and restarted the controller.",
        outcome.path.display(),
        upload.target.host
    );
    outcome.uploaded = true;
    Ok(())
}
