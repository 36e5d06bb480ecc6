use xmltree::Element;

use super::missing_reason;
use crate::xml_helpers::{child_elements, child_text, children_named, get_child_ci};
use crate::{RecordKind, SkippedRecord, StaticMapping};

/// Hostname used when a mapping has neither hostname nor description
const UNKNOWN_HOSTNAME: &str = "Unknown";

/// Extract DHCP static mappings from `<dhcpd>/<iface>/<staticmap>`
pub fn extract_static_mappings(root: &Element) -> (Vec<StaticMapping>, Vec<SkippedRecord>) {
    let mut mappings = Vec::new();
    let mut skipped = Vec::new();

    let Some(dhcpd) = get_child_ci(root, "dhcpd") else {
        return (mappings, skipped);
    };

    let staticmaps = child_elements(dhcpd).flat_map(|iface| children_named(iface, "staticmap"));

    for (index, staticmap) in staticmaps.enumerate() {
        let mac = child_text(staticmap, "mac");
        let ipaddr = child_text(staticmap, "ipaddr");

        match (mac, ipaddr) {
            (Some(mac_address), Some(ip_address)) => {
                let hostname = child_text(staticmap, "hostname")
                    .or_else(|| child_text(staticmap, "descr"))
                    .unwrap_or_else(|| UNKNOWN_HOSTNAME.to_string());

                mappings.push(StaticMapping {
                    mac_address,
                    ip_address,
                    hostname,
                });
            }
            (mac, ipaddr) => skipped.push(SkippedRecord {
                kind: RecordKind::StaticMapping,
                index,
                reason: missing_reason(&[("mac", mac.is_none()), ("ipaddr", ipaddr.is_none())]),
            }),
        }
    }

    (mappings, skipped)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root(xml: &str) -> Element {
        Element::parse(xml.as_bytes()).unwrap()
    }

    #[test]
    fn test_hostname_falls_back_to_descr_then_unknown() {
        let root = root(
            r#"<pfsense><dhcpd><lan>
                <staticmap><mac>aa:aa:aa:aa:aa:01</mac><ipaddr>10.0.0.1</ipaddr><descr>printer</descr></staticmap>
                <staticmap><mac>aa:aa:aa:aa:aa:02</mac><ipaddr>10.0.0.2</ipaddr></staticmap>
            </lan></dhcpd></pfsense>"#,
        );

        let (mappings, skipped) = extract_static_mappings(&root);
        assert!(skipped.is_empty());
        assert_eq!(mappings[0].hostname, "printer");
        assert_eq!(mappings[1].hostname, "Unknown");
    }

    #[test]
    fn test_collects_every_interface() {
        let root = root(
            r#"<pfsense><dhcpd>
                <lan><staticmap><mac>aa:aa:aa:aa:aa:01</mac><ipaddr>192.168.1.10</ipaddr></staticmap></lan>
                <opt1><enable/><staticmap><mac>aa:aa:aa:aa:aa:02</mac><ipaddr>10.10.0.10</ipaddr></staticmap></opt1>
            </dhcpd></pfsense>"#,
        );

        let (mappings, _) = extract_static_mappings(&root);
        let ips: Vec<_> = mappings.iter().map(|m| m.ip_address.as_str()).collect();
        assert_eq!(ips, vec!["192.168.1.10", "10.10.0.10"]);
    }

    #[test]
    fn test_skips_mapping_without_ip() {
        let root = root(
            r#"<pfsense><dhcpd><lan>
                <staticmap><mac>aa:aa:aa:aa:aa:01</mac><hostname>noip</hostname></staticmap>
                <staticmap><ipaddr>10.0.0.3</ipaddr></staticmap>
                <staticmap><hostname>nothing</hostname></staticmap>
            </lan></dhcpd></pfsense>"#,
        );

        let (mappings, skipped) = extract_static_mappings(&root);
        assert!(mappings.is_empty());
        let reasons: Vec<_> = skipped.iter().map(|s| (s.index, s.reason.as_str())).collect();
        assert_eq!(
            reasons,
            vec![(0, "missing ipaddr"), (1, "missing mac"), (2, "missing mac, ipaddr")]
        );
    }
}
