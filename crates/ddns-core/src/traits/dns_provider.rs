// # DNS Provider Trait
//
// Defines the interface the reconciler uses to read and write DNS records.
//
// ## Implementations
//
// - Cloudflare: `ddns-provider-cloudflare` crate
//
// ## Usage
//
// ```rust,ignore
// use ddns_core::{DnsProvider, RecordUpdate};
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let provider = /* DnsProvider implementation */;
//
//     for zone_id in provider.list_zone_ids().await? {
//         for record in provider.list_records(&zone_id).await? {
//             let update = RecordUpdate::from_record(&record, "203.0.113.7");
//             provider.update_record(&zone_id, &record.id, &update).await?;
//         }
//     }
//
//     Ok(())
// }
// ```

use crate::record::DnsRecord;
use async_trait::async_trait;
use serde::Serialize;

/// Full set of fields written back on update or create
///
/// Every optional field is concrete here: a null comment becomes `""` and
/// tags are always sent as an empty list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordUpdate {
    pub content: String,
    pub name: String,
    pub proxied: bool,
    #[serde(rename = "type")]
    pub record_type: String,
    pub comment: String,
    pub tags: Vec<String>,
    pub ttl: u32,
}

impl RecordUpdate {
    /// Carry `record` over unchanged except for its content
    pub fn from_record(record: &DnsRecord, new_content: impl Into<String>) -> Self {
        Self {
            content: new_content.into(),
            name: record.name.clone(),
            proxied: record.proxied,
            record_type: record.record_type.clone(),
            comment: record.comment.clone().unwrap_or_default(),
            tags: Vec::new(),
            ttl: record.ttl,
        }
    }
}

/// Trait for DNS provider implementations
///
/// Providers are single-shot: one logical API operation per call, no retries,
/// no caching. Decisions about *what* to write belong to the reconciler.
///
/// # Errors
///
/// Implementations must report rejected credentials (HTTP 401/403) as
/// [`crate::Error::Authentication`] and error messages returned by the
/// provider as [`crate::Error::Provider`], so callers can log something
/// actionable.
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// List the ids of every zone visible to the credentials
    async fn list_zone_ids(&self) -> Result<Vec<String>, crate::Error>;

    /// List every record of a zone, in provider order
    async fn list_records(&self, zone_id: &str) -> Result<Vec<DnsRecord>, crate::Error>;

    /// Overwrite an existing record
    async fn update_record(
        &self,
        zone_id: &str,
        record_id: &str,
        update: &RecordUpdate,
    ) -> Result<(), crate::Error>;

    /// Create a record that does not exist yet, returning its new id
    async fn create_record(
        &self,
        zone_id: &str,
        record: &RecordUpdate,
    ) -> Result<String, crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}
