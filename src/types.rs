use std::fmt;

use crate::MigrationError;

/// A pfSense DHCP static mapping, values taken verbatim from config.xml.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticMapping {
    pub mac_address: String,
    pub ip_address: String,
    pub hostname: String,
}

/// A DNS Resolver/Forwarder host override.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsEntry {
    pub hostname: String,
    pub ip_address: String,
    pub domain: String,
}

impl DnsEntry {
    /// Fully qualified name, or the bare hostname when no domain is set.
    pub fn fqdn(&self) -> String {
        if self.domain.is_empty() {
            self.hostname.clone()
        } else {
            format!("{}.{}", self.hostname, self.domain)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    StaticMapping,
    DnsHostOverride,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKind::StaticMapping => write!(f, "DHCP static mapping"),
            RecordKind::DnsHostOverride => write!(f, "DNS host override"),
        }
    }
}

/// A source record left out of the extraction, with the reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRecord {
    pub kind: RecordKind,
    /// Zero-based position among records of the same kind.
    pub index: usize,
    pub reason: String,
}

impl fmt::Display for SkippedRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} #{}: {}", self.kind, self.index + 1, self.reason)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseReport {
    pub mappings: Vec<StaticMapping>,
    pub dns_entries: Vec<DnsEntry>,
    pub skipped: Vec<SkippedRecord>,
}

#[derive(Debug)]
pub struct SubmissionFailure {
    pub mapping: StaticMapping,
    pub error: MigrationError,
}

#[derive(Debug, Default)]
pub struct SubmissionReport {
    pub succeeded: Vec<StaticMapping>,
    pub failed: Vec<SubmissionFailure>,
}

impl SubmissionReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct MigrationOptions {
    pub verbose: bool,
}
