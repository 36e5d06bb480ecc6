use pfsense2unifi::{parse_config, DnsEntry, MigrationError, RecordKind, StaticMapping};
use pretty_assertions::assert_eq;

const PFSENSE_XML: &str = r#"<?xml version="1.0"?>
<pfsense>
    <version>23.3</version>
    <interfaces>
        <lan>
            <if>vtnet1</if>
            <ipaddr>192.168.1.1</ipaddr>
            <subnet>24</subnet>
        </lan>
    </interfaces>
    <dhcpd>
        <lan>
            <enable/>
            <range>
                <from>192.168.1.100</from>
                <to>192.168.1.199</to>
            </range>
            <staticmap>
                <mac>bc:24:11:74:d7:62</mac>
                <cid/>
                <ipaddr>192.168.1.143</ipaddr>
                <hostname>ubuntu_desktop</hostname>
                <descr><![CDATA[Office desktop]]></descr>
            </staticmap>
            <staticmap>
                <mac>AA:BB:CC:DD:EE:01</mac>
                <ipaddr>192.168.1.20</ipaddr>
                <hostname>NAS</hostname>
            </staticmap>
        </lan>
        <opt1>
            <staticmap>
                <mac>aa:bb:cc:dd:ee:02</mac>
                <ipaddr>10.20.0.5</ipaddr>
                <hostname>camera</hostname>
            </staticmap>
        </opt1>
    </dhcpd>
    <unbound>
        <enable/>
        <hosts>
            <host>testdns</host>
            <domain>bendiksens.net</domain>
            <ip>1.3.3.7</ip>
            <descr/>
            <aliases/>
        </hosts>
        <hosts>
            <host>printer</host>
            <domain>home.arpa</domain>
            <ip>192.168.1.30</ip>
        </hosts>
    </unbound>
</pfsense>
"#;

fn mapping(mac: &str, ip: &str, hostname: &str) -> StaticMapping {
    StaticMapping {
        mac_address: mac.to_string(),
        ip_address: ip.to_string(),
        hostname: hostname.to_string(),
    }
}

#[test]
fn test_extracts_all_records_in_document_order() {
    let report = parse_config(PFSENSE_XML.as_bytes()).expect("parse");

    assert_eq!(
        report.mappings,
        vec![
            mapping("bc:24:11:74:d7:62", "192.168.1.143", "ubuntu_desktop"),
            mapping("AA:BB:CC:DD:EE:01", "192.168.1.20", "NAS"),
            mapping("aa:bb:cc:dd:ee:02", "10.20.0.5", "camera"),
        ]
    );
    assert_eq!(
        report.dns_entries,
        vec![
            DnsEntry {
                hostname: "testdns".to_string(),
                ip_address: "1.3.3.7".to_string(),
                domain: "bendiksens.net".to_string(),
            },
            DnsEntry {
                hostname: "printer".to_string(),
                ip_address: "192.168.1.30".to_string(),
                domain: "home.arpa".to_string(),
            },
        ]
    );
    assert!(report.skipped.is_empty());
}

#[test]
fn test_values_are_not_normalized() {
    let report = parse_config(PFSENSE_XML.as_bytes()).unwrap();
    assert_eq!(report.mappings[1].mac_address, "AA:BB:CC:DD:EE:01");
    assert_eq!(report.mappings[1].hostname, "NAS");
}

#[test]
fn test_parsing_is_repeatable() {
    let first = parse_config(PFSENSE_XML.as_bytes()).unwrap();
    let second = parse_config(PFSENSE_XML.as_bytes()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_missing_dhcp_section_yields_no_mappings() {
    let xml = r#"<?xml version="1.0"?>
<pfsense>
    <unbound>
        <hosts>
            <host>gw</host>
            <domain>lan</domain>
            <ip>192.168.1.1</ip>
        </hosts>
    </unbound>
</pfsense>
"#;

    let report = parse_config(xml.as_bytes()).expect("well-formed document");
    assert!(report.mappings.is_empty());
    assert_eq!(report.dns_entries.len(), 1);
}

#[test]
fn test_non_xml_input_fails() {
    let result = parse_config("this is not xml at all".as_bytes());
    assert!(matches!(result, Err(MigrationError::Parse(_))));

    let truncated = parse_config("<pfsense><dhcpd><lan>".as_bytes());
    assert!(matches!(truncated, Err(MigrationError::Parse(_))));
}

#[test]
fn test_incomplete_records_are_skipped_and_reported() {
    let xml = r#"<?xml version="1.0"?>
<pfsense>
    <dhcpd>
        <lan>
            <staticmap>
                <mac>00:11:22:33:44:01</mac>
                <ipaddr>192.168.1.10</ipaddr>
                <hostname>first</hostname>
            </staticmap>
            <staticmap>
                <mac>00:11:22:33:44:02</mac>
                <hostname>no-ip</hostname>
            </staticmap>
            <staticmap>
                <mac>00:11:22:33:44:03</mac>
                <ipaddr>192.168.1.12</ipaddr>
                <hostname>third</hostname>
            </staticmap>
        </lan>
    </dhcpd>
    <unbound>
        <hosts>
            <host>noip</host>
            <domain>lan</domain>
        </hosts>
    </unbound>
</pfsense>
"#;

    let report = parse_config(xml.as_bytes()).unwrap();

    let hostnames: Vec<_> = report.mappings.iter().map(|m| m.hostname.as_str()).collect();
    assert_eq!(hostnames, vec!["first", "third"]);
    assert!(report.dns_entries.is_empty());

    assert_eq!(report.skipped.len(), 2);
    assert_eq!(report.skipped[0].kind, RecordKind::StaticMapping);
    assert_eq!(report.skipped[0].index, 1);
    assert_eq!(report.skipped[0].reason, "missing ipaddr");
    assert_eq!(report.skipped[1].kind, RecordKind::DnsHostOverride);
    assert_eq!(
        report.skipped[1].to_string(),
        "DNS host override #1: missing ip"
    );
}

#[test]
fn test_dns_forwarder_overrides_are_included() {
    let xml = r#"<?xml version="1.0"?>
<pfsense>
    <dnsmasq>
        <enable/>
        <hosts>
            <host>legacy</host>
            <domain>lan</domain>
            <ip>192.168.1.40</ip>
        </hosts>
    </dnsmasq>
</pfsense>
"#;

    let report = parse_config(xml.as_bytes()).unwrap();
    assert_eq!(report.dns_entries.len(), 1);
    assert_eq!(report.dns_entries[0].fqdn(), "legacy.lan");
}
