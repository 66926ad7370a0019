//! Test doubles and common utilities for reconciler contract tests

#![allow(dead_code)]

use ddns_core::error::{Error, Result};
use ddns_core::traits::{DnsProvider, IpSource, RecordUpdate};
use ddns_core::{DnsRecord, RECORD_TYPE_A};
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// One write issued against the mock provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteCall {
    pub zone_id: String,
    /// `None` for a create
    pub record_id: Option<String>,
    pub update: RecordUpdate,
}

/// How a failing write should fail
#[derive(Debug, Clone, Copy)]
pub enum WriteFailure {
    Auth,
    Provider,
}

/// A DnsProvider backed by in-memory zones that records every write
#[derive(Default)]
pub struct MockDnsProvider {
    /// Zone id → records, or the error message listing should fail with
    zones: Arc<Mutex<Vec<(String, std::result::Result<Vec<DnsRecord>, String>)>>>,
    /// Record names whose writes fail
    failing_names: Arc<Mutex<HashMap<String, WriteFailure>>>,
    /// Writes in the order they were issued
    writes: Arc<Mutex<Vec<WriteCall>>>,
    /// Call counter for list_zone_ids()
    list_zones_calls: Arc<AtomicUsize>,
    /// Zones whose records were listed
    listed: Arc<Mutex<Vec<String>>>,
}

impl MockDnsProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a zone with the given records
    pub fn with_zone(self, zone_id: &str, records: Vec<DnsRecord>) -> Self {
        self.zones
            .lock()
            .unwrap()
            .push((zone_id.to_string(), Ok(records)));
        self
    }

    /// Add a zone whose record listing fails
    pub fn with_failing_zone(self, zone_id: &str, message: &str) -> Self {
        self.zones
            .lock()
            .unwrap()
            .push((zone_id.to_string(), Err(message.to_string())));
        self
    }

    /// Make writes to `name` fail
    pub fn failing_writes_for(self, name: &str, failure: WriteFailure) -> Self {
        self.failing_names
            .lock()
            .unwrap()
            .insert(name.to_string(), failure);
        self
    }

    /// Create a new MockDnsProvider that shares state with an existing one
    pub fn sharing_counters_with(other: &Self) -> Self {
        Self {
            zones: Arc::clone(&other.zones),
            failing_names: Arc::clone(&other.failing_names),
            writes: Arc::clone(&other.writes),
            list_zones_calls: Arc::clone(&other.list_zones_calls),
            listed: Arc::clone(&other.listed),
        }
    }

    pub fn writes(&self) -> Vec<WriteCall> {
        self.writes.lock().unwrap().clone()
    }

    pub fn write_count(&self) -> usize {
        self.writes.lock().unwrap().len()
    }

    pub fn written_names(&self) -> Vec<String> {
        self.writes()
            .into_iter()
            .map(|w| w.update.name)
            .collect()
    }

    pub fn list_zones_calls(&self) -> usize {
        self.list_zones_calls.load(Ordering::SeqCst)
    }

    pub fn listed_zones(&self) -> Vec<String> {
        self.listed.lock().unwrap().clone()
    }

    fn check_failure(&self, name: &str) -> Result<()> {
        match self.failing_names.lock().unwrap().get(name) {
            Some(WriteFailure::Auth) => Err(Error::auth("status 403 Forbidden")),
            Some(WriteFailure::Provider) => Err(Error::provider("mock", "record rejected")),
            None => Ok(()),
        }
    }
}

#[async_trait::async_trait]
impl DnsProvider for MockDnsProvider {
    async fn list_zone_ids(&self) -> Result<Vec<String>> {
        self.list_zones_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .zones
            .lock()
            .unwrap()
            .iter()
            .map(|(id, _)| id.clone())
            .collect())
    }

    async fn list_records(&self, zone_id: &str) -> Result<Vec<DnsRecord>> {
        self.listed.lock().unwrap().push(zone_id.to_string());
        let zones = self.zones.lock().unwrap();
        match zones.iter().find(|(id, _)| id == zone_id) {
            Some((_, Ok(records))) => Ok(records.clone()),
            Some((_, Err(message))) => Err(Error::http(message.clone())),
            None => Err(Error::not_found(format!("zone {zone_id}"))),
        }
    }

    async fn update_record(
        &self,
        zone_id: &str,
        record_id: &str,
        update: &RecordUpdate,
    ) -> Result<()> {
        self.writes.lock().unwrap().push(WriteCall {
            zone_id: zone_id.to_string(),
            record_id: Some(record_id.to_string()),
            update: update.clone(),
        });
        self.check_failure(&update.name)
    }

    async fn create_record(&self, zone_id: &str, record: &RecordUpdate) -> Result<String> {
        self.writes.lock().unwrap().push(WriteCall {
            zone_id: zone_id.to_string(),
            record_id: None,
            update: record.clone(),
        });
        self.check_failure(&record.name)?;
        Ok(format!("created-{}", record.name))
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// An IpSource that always returns the same address
pub struct StaticIpSource {
    ip: IpAddr,
    calls: Arc<AtomicUsize>,
}

impl StaticIpSource {
    pub fn new(ip: IpAddr) -> Self {
        Self {
            ip,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl IpSource for StaticIpSource {
    async fn current(&self) -> Result<IpAddr> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.ip)
    }

    fn source_name(&self) -> &'static str {
        "static"
    }
}

/// An IpSource whose lookup always fails
pub struct FailingIpSource;

#[async_trait::async_trait]
impl IpSource for FailingIpSource {
    async fn current(&self) -> Result<IpAddr> {
        Err(Error::ip_source("echo service unreachable"))
    }
}

/// Build an A record listed from `zone-1`
pub fn a_record(id: &str, name: &str, content: &str) -> DnsRecord {
    DnsRecord {
        id: id.to_string(),
        zone_id: "zone-1".to_string(),
        name: name.to_string(),
        record_type: RECORD_TYPE_A.to_string(),
        content: content.to_string(),
        proxied: false,
        comment: None,
        tags: Vec::new(),
        ttl: 300,
    }
}

/// Build a record of another type
pub fn other_record(id: &str, record_type: &str, name: &str, content: &str) -> DnsRecord {
    DnsRecord {
        record_type: record_type.to_string(),
        ..a_record(id, name, content)
    }
}

pub fn zones(ids: &[&str]) -> Vec<String> {
    ids.iter().map(|s| s.to_string()).collect()
}

