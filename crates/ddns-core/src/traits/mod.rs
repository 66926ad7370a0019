//! Capability traits consumed by the reconciler
//!
//! - [`DnsProvider`]: list zones and records, write records back
//! - [`IpSource`]: look up the machine's current public address

pub mod dns_provider;
pub mod ip_source;

pub use dns_provider::{DnsProvider, RecordUpdate};
pub use ip_source::IpSource;
