use xmltree::Element;

use super::missing_reason;
use crate::xml_helpers::{child_text, children_named, get_child_ci};
use crate::{DnsEntry, RecordKind, SkippedRecord};

/// DNS Resolver first, then DNS Forwarder; both use `<hosts>` records
const DNS_SECTIONS: [&str; 2] = ["unbound", "dnsmasq"];

/// Extract host overrides from `<unbound>/<hosts>` and `<dnsmasq>/<hosts>`
pub fn extract_dns_entries(root: &Element) -> (Vec<DnsEntry>, Vec<SkippedRecord>) {
    let mut entries = Vec::new();
    let mut skipped = Vec::new();

    let hosts = DNS_SECTIONS
        .iter()
        .filter_map(|section| get_child_ci(root, section))
        .flat_map(|section| children_named(section, "hosts"));

    for (index, host) in hosts.enumerate() {
        let hostname = child_text(host, "host");
        let ip_address = child_text(host, "ip");
        let domain = child_text(host, "domain");

        match (hostname, ip_address, domain) {
            (Some(hostname), Some(ip_address), Some(domain)) => entries.push(DnsEntry {
                hostname,
                ip_address,
                domain,
            }),
            (hostname, ip_address, domain) => skipped.push(SkippedRecord {
                kind: RecordKind::DnsHostOverride,
                index,
                reason: missing_reason(&[
                    ("host", hostname.is_none()),
                    ("ip", ip_address.is_none()),
                    ("domain", domain.is_none()),
                ]),
            }),
        }
    }

    (entries, skipped)
}
