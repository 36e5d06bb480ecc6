pub mod cli;
pub mod config;
pub mod controller;
mod errors;
mod extract;
pub mod gateway;
pub mod migrate;
pub mod remote;
mod types;
mod xml_helpers;

pub use errors::MigrationError;
pub use extract::{extract_dns_entries, extract_static_mappings, parse_config};
pub use types::{
    DnsEntry, MigrationOptions, ParseReport, RecordKind, SkippedRecord, StaticMapping,
    SubmissionFailure, SubmissionReport,
};
