use anyhow::{bail, Context, Result};
use clap::{ArgGroup, CommandFactory, Parser};
use std::ffi::OsString;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use crate::config::load_config;
use crate::migrate::{run_migration, MigrationPlan, Mode};
use crate::MigrationOptions;

mod report;

#[derive(Parser)]
#[command(
    name = "pfsense2unifi",
    version,
    about = "Migrate DHCP static mappings and DNS host overrides from pfSense to a UniFi controller",
    long_about = "Fetches config.xml from pfSense over SSH, creates fixed-IP reservations on the \
                  UniFi controller and writes a config.gateway.json with the DNS host overrides.",
    group(ArgGroup::new("mode").args(["all", "pfsense_only", "unifi_only"])),
    after_help = "Examples:\n  pfsense2unifi --all --verbose\n  pfsense2unifi --pfsense-only\n  pfsense2unifi --unifi-only --skip-dns\n\nThe --upload-gateway path has not been verified against a live controller; check the result in the UniFi UI."
)]
struct Cli {
    /// Configuration file with [pfsense] and [unifi] sections
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Fetch from pfSense and migrate to UniFi
    #[arg(short, long)]
    all: bool,

    /// Only fetch and parse the pfSense config
    #[arg(short, long = "pfsense-only")]
    pfsense_only: bool,

    /// Only migrate to UniFi, using the previously fetched config
    #[arg(short, long = "unifi-only")]
    unifi_only: bool,

    /// Use this local config.xml instead of pfsense.local_path
    #[arg(long)]
    input: Option<PathBuf>,

    /// Write the gateway file here instead of unifi.gateway_file
    #[arg(long)]
    gateway_out: Option<PathBuf>,

    /// Do not submit DHCP reservations
    #[arg(long)]
    skip_dhcp: bool,

    /// Do not generate the DNS gateway file
    #[arg(long)]
    skip_dns: bool,

    /// Upload config.gateway.json to the controller host and restart it
    #[arg(long, conflicts_with_all = ["skip_dns", "pfsense_only"])]
    upload_gateway: bool,

    /// Show every extracted record and each step
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn mode(&self) -> Option<Mode> {
        if self.all {
            Some(Mode::All)
        } else if self.pfsense_only {
            Some(Mode::PfSenseOnly)
        } else if self.unifi_only {
            Some(Mode::UnifiOnly)
        } else {
            None
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose { "info" } else { "warn" };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

pub fn run_with_args<I, T>(args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::parse_from(args);

    let Some(mode) = cli.mode() else {
        let _ = Cli::command().print_help();
        bail!("No mode given: use --all, --pfsense-only or --unifi-only");
    };

    init_tracing(cli.verbose);
    let options = MigrationOptions {
        verbose: cli.verbose,
    };
    if options.verbose {
        println!("[!] Verbose mode enabled.");
    }

    let mut config = load_config(&cli.config)
        .with_context(|| format!("Failed to load configuration: {}", cli.config.display()))?;
    if let Some(input) = cli.input {
        config.pfsense.local_path = input;
    }
    if let Some(gateway_out) = cli.gateway_out {
        config.unifi.gateway_file = gateway_out;
    }

    let plan = MigrationPlan {
        mode,
        dhcp: !cli.skip_dhcp,
        dns: !cli.skip_dns,
        upload_gateway: cli.upload_gateway,
    };

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;
    let summary = runtime.block_on(run_migration(&config, &plan, &options))?;

    report::print_summary(&summary, &plan);

    if !summary.is_success() {
        bail!("{}", summary.failures.join("; "));
    }
    Ok(())
}
