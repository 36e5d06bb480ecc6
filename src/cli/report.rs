use crate::migrate::{MigrationPlan, MigrationSummary};

pub(crate) fn print_summary(summary: &MigrationSummary, plan: &MigrationPlan) {
    println!();
    if let Some(bytes) = summary.fetched_bytes {
        println!("pfSense config fetched: {} bytes", bytes);
    }
    println!(
        "DHCP static mappings found: {}",
        summary.parse.mappings.len()
    );
    println!(
        "DNS host overrides found: {}",
        summary.parse.dns_entries.len()
    );
    if !summary.parse.skipped.is_empty() {
        println!(
            "Records skipped (incomplete): {}",
            summary.parse.skipped.len()
        );
    }

    if !plan.mode.submits() {
        return;
    }

    if let Some(dhcp) = &summary.dhcp {
        println!("Reservations created: {}", dhcp.succeeded.len());
        println!("Reservations failed: {}", dhcp.failed.len());
        for failure in &dhcp.failed {
            println!(
                "  FAIL: {} -> {} ({}): {}",
                failure.mapping.mac_address,
                failure.mapping.ip_address,
                failure.mapping.hostname,
                failure.error
            );
        }
    }

    if let Some(dns) = &summary.dns {
        println!(
            "Gateway file: {} ({} host overrides{})",
            dns.path.display(),
            dns.overrides,
            if dns.uploaded { ", uploaded" } else { "" }
        );
    }

    if summary.is_success() {
        println!("\nMigration completed successfully!");
    }
}
