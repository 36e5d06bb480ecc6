use std::io::Read;

use xmltree::Element;

use crate::{MigrationError, ParseReport};

mod dhcp;
mod dns;

pub use dhcp::extract_static_mappings;
pub use dns::extract_dns_entries;

/// Root elements whose DHCP/DNS sections follow the pfSense schema
const ACCEPTED_ROOTS: [&str; 2] = ["pfsense", "opnsense"];

/// Parse a pfSense config.xml and extract static mappings and host overrides.
///
/// Records missing a required field are skipped and listed in
/// [`ParseReport::skipped`]; only malformed XML or a foreign root element fails.
pub fn parse_config<R: Read>(reader: R) -> Result<ParseReport, MigrationError> {
    let root = Element::parse(reader).map_err(|e| MigrationError::Parse(e.to_string()))?;

    if !ACCEPTED_ROOTS
        .iter()
        .any(|name| root.name.eq_ignore_ascii_case(name))
    {
        return Err(MigrationError::Parse(format!(
            "unexpected root element <{}>, expected <pfsense>",
            root.name
        )));
    }

    let (mappings, mut skipped) = extract_static_mappings(&root);
    let (dns_entries, dns_skipped) = extract_dns_entries(&root);
    skipped.extend(dns_skipped);

    Ok(ParseReport {
        mappings,
        dns_entries,
        skipped,
    })
}

/// Skip reason listing the required fields that were absent
pub(super) fn missing_reason(fields: &[(&str, bool)]) -> String {
    let missing: Vec<&str> = fields
        .iter()
        .filter(|(_, absent)| *absent)
        .map(|(name, _)| *name)
        .collect();
    format!("missing {}", missing.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_foreign_root() {
        let err = parse_config("<config><dhcpd/></config>".as_bytes()).unwrap_err();
        assert!(matches!(err, MigrationError::Parse(_)));
        assert!(err.to_string().contains("unexpected root element <config>"));
    }

    #[test]
    fn test_empty_pfsense_document() {
        let report = parse_config("<?xml version=\"1.0\"?><pfsense/>".as_bytes()).unwrap();
        assert_eq!(report, ParseReport::default());
    }
}
