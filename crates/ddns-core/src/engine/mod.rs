//! Zone reconciler
//!
//! The Reconciler is responsible for:
//! - Listing each zone's records via DnsProvider
//! - Building the managed set (A records, create directive, ignore policy)
//! - Deciding whether the zone drifted from the observed public IP
//! - Writing the new address to every managed record
//!
//! ## Per-zone state machine
//!
//! ```text
//! Fetching ──err──► Failed (zone skipped, run continues)
//!    │
//!    ▼
//! Filtering ──► Deciding ──empty──► Done (nothing to manage)
//!                  │  └──sentinel == observed──► Done (unchanged)
//!                  ▼
//!               Updating ──► Done (N failures, N may be 0)
//! ```
//!
//! Only the sentinel (managed record 0) is compared against the observed IP.
//! When it differs, every managed record is written with the new address.
//! Zones are processed one at a time in the order given, and updates inside
//! a zone are issued in managed-set order.

use crate::config::RunPolicy;
use crate::error::{Error, Result};
use crate::policy::{ConflictInfo, CreateDirective, IgnorePolicy};
use crate::record::{DnsRecord, ManagedSet, RECORD_TYPE_A, build_managed_set, filter_by_type};
use crate::traits::{DnsProvider, IpSource, RecordUpdate};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::net::IpAddr;
use tracing::{debug, error, info, warn};

/// Terminal state of one zone pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum ZoneStatus {
    /// Managed set was empty; nothing compared or written
    NothingManaged,
    /// Sentinel already holds the observed IP
    Unchanged,
    /// Update pass ran; see `failed_count` for per-record failures
    Reconciled,
    /// Records could not be listed
    Failed(String),
}

/// A record whose update or creation failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordFailure {
    pub name: String,
    pub error: String,
    /// Credentials were rejected by the provider
    pub auth: bool,
}

/// Per-zone summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ZoneResult {
    pub zone_id: String,
    pub status: ZoneStatus,
    /// Candidates before exclusion (A records plus the directive record)
    pub considered: usize,
    pub managed_count: usize,
    pub updated_count: usize,
    pub failed_count: usize,
    pub excluded: Vec<String>,
    pub conflicts: Vec<ConflictInfo>,
    pub failures: Vec<RecordFailure>,
}

impl ZoneResult {
    fn failed(zone_id: &str, reason: String) -> Self {
        Self {
            zone_id: zone_id.to_string(),
            status: ZoneStatus::Failed(reason),
            considered: 0,
            managed_count: 0,
            updated_count: 0,
            failed_count: 0,
            excluded: Vec::new(),
            conflicts: Vec::new(),
            failures: Vec::new(),
        }
    }

    fn from_set(zone_id: &str, considered: usize, set: &ManagedSet) -> Self {
        Self {
            zone_id: zone_id.to_string(),
            status: ZoneStatus::NothingManaged,
            considered,
            managed_count: set.len(),
            updated_count: 0,
            failed_count: 0,
            excluded: set.excluded.clone(),
            conflicts: set.conflicts.clone(),
            failures: Vec::new(),
        }
    }

    /// Records could not be listed for this zone
    pub fn is_failed(&self) -> bool {
        matches!(self.status, ZoneStatus::Failed(_))
    }
}

/// Outcome of one full run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub observed_ip: IpAddr,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub zones: Vec<ZoneResult>,
}

impl RunReport {
    /// Zones whose records could not be listed
    pub fn failed_zones(&self) -> usize {
        self.zones.iter().filter(|z| z.is_failed()).count()
    }

    /// Record writes that failed, across all zones
    pub fn failed_records(&self) -> usize {
        self.zones.iter().map(|z| z.failed_count).sum()
    }

    /// Record writes that succeeded, across all zones
    pub fn updated_records(&self) -> usize {
        self.zones.iter().map(|z| z.updated_count).sum()
    }

    /// No zone or record failed
    pub fn is_clean(&self) -> bool {
        self.failed_zones() == 0 && self.failed_records() == 0
    }
}

/// Reconciles zones against the observed public IP
pub struct Reconciler {
    /// DNS provider for listing and writing records
    provider: Box<dyn DnsProvider>,
}

impl Reconciler {
    pub fn new(provider: Box<dyn DnsProvider>) -> Self {
        Self { provider }
    }

    /// Run one full pass
    ///
    /// Looks up the public IP first; if that fails nothing else happens.
    /// Zones come from `policy.zone_ids`, or from the provider when that list
    /// is empty.
    ///
    /// # Errors
    ///
    /// - The public IP lookup failed, or returned an IPv6 address
    /// - Zone ids had to be listed and the listing failed
    ///
    /// Zone and record failures are reported in the [`RunReport`] instead.
    pub async fn run(&self, ip_source: &dyn IpSource, policy: &RunPolicy) -> Result<RunReport> {
        let started_at = Utc::now();

        let observed_ip = ip_source.current().await?;
        if !observed_ip.is_ipv4() {
            return Err(Error::ip_source(format!(
                "{} returned {}, but A records need an IPv4 address",
                ip_source.source_name(),
                observed_ip
            )));
        }
        info!("Public IP: {}", observed_ip);

        let zone_ids = if policy.zone_ids.is_empty() {
            self.provider.list_zone_ids().await?
        } else {
            policy.zone_ids.clone()
        };
        debug!("Reconciling {} zone(s)", zone_ids.len());

        let zones = self
            .reconcile(
                &zone_ids,
                &observed_ip.to_string(),
                policy.directive.as_ref(),
                &policy.rules,
            )
            .await;

        Ok(RunReport {
            observed_ip,
            started_at,
            finished_at: Utc::now(),
            zones,
        })
    }

    /// Reconcile each zone in order against `observed_ip`
    ///
    /// A zone whose records cannot be listed is reported as failed and the
    /// remaining zones are still processed.
    pub async fn reconcile(
        &self,
        zone_ids: &[String],
        observed_ip: &str,
        directive: Option<&CreateDirective>,
        rules: &IgnorePolicy,
    ) -> Vec<ZoneResult> {
        let mut results = Vec::with_capacity(zone_ids.len());

        for zone_id in zone_ids {
            let result = self.reconcile_zone(zone_id, observed_ip, directive, rules).await;
            info!(
                "Zone {}: {:?} (considered={}, excluded={}, managed={}, updated={}, failed={})",
                result.zone_id,
                result.status,
                result.considered,
                result.excluded.len(),
                result.managed_count,
                result.updated_count,
                result.failed_count
            );
            results.push(result);
        }

        results
    }

    async fn reconcile_zone(
        &self,
        zone_id: &str,
        observed_ip: &str,
        directive: Option<&CreateDirective>,
        rules: &IgnorePolicy,
    ) -> ZoneResult {
        // Fetching
        let records = match self.provider.list_records(zone_id).await {
            Ok(records) => records,
            Err(e) => {
                error!("Failed to list records for zone {}: {}", zone_id, e);
                return ZoneResult::failed(zone_id, e.to_string());
            }
        };

        // Filtering
        let typed = filter_by_type(&records, RECORD_TYPE_A);
        let set = build_managed_set(&typed, directive, rules);
        let considered = set.len() + set.excluded.len();
        let mut result = ZoneResult::from_set(zone_id, considered, &set);

        // Deciding
        let Some(sentinel) = set.sentinel() else {
            debug!("Zone {} has no managed A records", zone_id);
            return result;
        };

        if sentinel.content == observed_ip {
            info!("IP address has not changed ({} = {})", sentinel.name, observed_ip);
            result.status = ZoneStatus::Unchanged;
            return result;
        }

        info!(
            "IP changed for zone {}: {} -> {} ({} record(s) to update)",
            zone_id,
            sentinel.content,
            observed_ip,
            set.len()
        );

        // Updating
        for record in &set.records {
            match self.write_record(zone_id, record, observed_ip).await {
                Ok(()) => result.updated_count += 1,
                Err(e) => {
                    if e.is_auth() {
                        error!("Provider rejected credentials updating {}: {}", record.name, e);
                    } else {
                        warn!("Failed to update {}: {}", record.name, e);
                    }
                    result.failed_count += 1;
                    result.failures.push(RecordFailure {
                        name: record.name.clone(),
                        error: e.to_string(),
                        auth: e.is_auth(),
                    });
                }
            }
        }

        result.status = ZoneStatus::Reconciled;
        result
    }

    /// Write one managed record; synthetic records are created instead
    async fn write_record(&self, zone_id: &str, record: &DnsRecord, observed_ip: &str) -> Result<()> {
        let update = RecordUpdate::from_record(record, observed_ip);

        if record.is_synthetic() {
            let id = self.provider.create_record(zone_id, &update).await?;
            info!("Created {} -> {} (id {})", record.name, observed_ip, id);
        } else {
            self.provider.update_record(zone_id, &record.id, &update).await?;
            info!("Updated {} -> {} (was {})", record.name, observed_ip, record.content);
        }

        Ok(())
    }

    /// Name of the underlying provider
    pub fn provider_name(&self) -> &'static str {
        self.provider.provider_name()
    }
}
