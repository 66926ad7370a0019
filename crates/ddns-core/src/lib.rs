// # ddns-core
//
// Core library for the DDNS reconciler.
//
// ## Architecture Overview
//
// Given the records of each zone and the machine's public address, decide
// which A records to leave alone and which to rewrite:
// - **match_pattern**: Regex test of a record name
// - **IgnorePolicy**: Exception rules excluding records from management
// - **CreateDirective**: Optional record the operator wants ensured
// - **build_managed_set**: A records + directive, minus ignored records
// - **Reconciler**: Per-zone fetch → filter → decide → update pass
// - **DnsProvider** / **IpSource**: Capabilities supplied by other crates
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Decisions live here, HTTP lives in provider crates
// 2. **Failure Isolation**: A failing zone or record never aborts the others
// 3. **Read-only Policy**: Directive and ignore rules are loaded once per run
// 4. **Library-First**: The daemon is a thin layer over this crate

pub mod config;
pub mod engine;
pub mod error;
pub mod policy;
pub mod record;
pub mod traits;

// Re-export core types for convenience
pub use config::{DdnsConfig, LogLevel, ProviderCredentials, RunPolicy};
pub use engine::{Reconciler, RecordFailure, RunReport, ZoneResult, ZoneStatus};
pub use error::{Error, Result};
pub use policy::{ConflictInfo, CreateDirective, IgnorePolicy, IgnoreRule, Verdict, match_pattern};
pub use record::{DnsRecord, ManagedSet, RECORD_TYPE_A, build_managed_set, filter_by_type};
pub use traits::{DnsProvider, IpSource, RecordUpdate};
