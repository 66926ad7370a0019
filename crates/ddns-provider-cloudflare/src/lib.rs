// # Cloudflare DNS Provider
//
// This crate provides a Cloudflare DNS provider implementation for the DDNS
// reconciler.
//
// ## Behaviour
//
// - One logical API operation per trait call (list zones, list records,
//   patch a record, create a record); listings follow pagination
// - Full error propagation to the reconciler, no retry or backoff here
// - HTTP timeout configured (30 seconds)
// - Status mapping: 401/403 → Authentication, 404 → NotFound,
//   429 → RateLimited, Cloudflare `errors[]` → Provider
// - Dry-run mode: GETs are performed, writes are only logged
//
// ## Security Requirements
//
// - Credentials NEVER appear in logs or Debug output
// - Provider construction fails if credentials are empty
//
// ## API Reference
//
// - Cloudflare API v4: https://developers.cloudflare.com/api/
// - List Zones: GET `/zones`
// - List DNS Records: GET `/zones/:zone_id/dns_records`
// - Update DNS Record: PATCH `/zones/:zone_id/dns_records/:record_id`
// - Create DNS Record: POST `/zones/:zone_id/dns_records`

use async_trait::async_trait;
use ddns_core::config::ProviderCredentials;
use ddns_core::traits::{DnsProvider, RecordUpdate};
use ddns_core::{DnsRecord, Error, Result};
use reqwest::{RequestBuilder, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Cloudflare API base URL
const CLOUDFLARE_API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Page size for zone listings (API maximum is 50)
const ZONES_PER_PAGE: u32 = 50;

/// Page size for record listings
const RECORDS_PER_PAGE: u32 = 100;

const PROVIDER: &str = "cloudflare";

/// Standard Cloudflare response envelope
#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    errors: Vec<ApiMessage>,
    result: Option<T>,
    result_info: Option<ResultInfo>,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct ResultInfo {
    #[serde(default)]
    page: u32,
    #[serde(default)]
    total_pages: u32,
}

#[derive(Debug, Deserialize)]
struct ZoneSummary {
    id: String,
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct CreatedRecord {
    id: String,
}

/// A DNS record exactly as the API returns it
///
/// Cloudflare sends `null` for several of these, so everything except `id`
/// and `content` is optional here and defaulted in [`RawDnsRecord::into_record`].
#[derive(Debug, Deserialize)]
struct RawDnsRecord {
    id: String,
    zone_id: Option<String>,
    name: Option<String>,
    #[serde(rename = "type")]
    record_type: Option<String>,
    content: String,
    proxied: Option<bool>,
    comment: Option<String>,
    tags: Option<Vec<String>>,
    ttl: Option<u32>,
}

impl RawDnsRecord {
    fn into_record(self, zone_id: &str) -> DnsRecord {
        DnsRecord {
            id: self.id,
            zone_id: self.zone_id.unwrap_or_else(|| zone_id.to_string()),
            name: self.name.unwrap_or_default(),
            record_type: self.record_type.unwrap_or_default(),
            content: self.content,
            proxied: self.proxied.unwrap_or(false),
            comment: self.comment,
            tags: self.tags.unwrap_or_default(),
            ttl: self.ttl.unwrap_or(1),
        }
    }
}

/// Cloudflare DNS provider
///
/// # Dry-Run Mode
///
/// When `dry_run` is true, the provider will:
/// - Perform all GET requests (zone and record listings)
/// - Log the intended PATCH/POST payload
/// - **NOT** actually modify DNS records
///
/// # Security
///
/// The Debug implementation intentionally does NOT expose credentials.
pub struct CloudflareProvider {
    /// API credentials
    /// ⚠️ NEVER log these values
    credentials: ProviderCredentials,

    /// API base URL; `with_base_url` points it at a local mock in tests
    base_url: String,

    /// HTTP client for API requests
    client: reqwest::Client,

    /// Dry-run mode: if true, perform GET requests but skip writes
    dry_run: bool,
}

// Custom Debug implementation that hides the credentials
impl std::fmt::Debug for CloudflareProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudflareProvider")
            .field("credentials", &self.credentials)
            .field("base_url", &self.base_url)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl CloudflareProvider {
    /// Create a new Cloudflare provider
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the credentials are empty or the
    /// HTTP client cannot be built.
    pub fn new(credentials: ProviderCredentials, dry_run: bool) -> Result<Self> {
        match &credentials {
            ProviderCredentials::ApiToken(token) if token.is_empty() => {
                return Err(Error::config("Cloudflare API token cannot be empty"));
            }
            ProviderCredentials::GlobalKey { email, key } if email.is_empty() || key.is_empty() => {
                return Err(Error::config("Cloudflare email and API key cannot be empty"));
            }
            _ => {}
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        if dry_run {
            tracing::warn!("Cloudflare provider running in DRY-RUN mode - no changes will be made");
        }

        Ok(Self {
            credentials,
            base_url: CLOUDFLARE_API_BASE.to_string(),
            client,
            dry_run,
        })
    }

    /// Create a new Cloudflare provider (production/live mode)
    pub fn new_live(credentials: ProviderCredentials) -> Result<Self> {
        Self::new(credentials, false)
    }

    /// Create a new Cloudflare provider (dry-run mode)
    pub fn new_dry_run(credentials: ProviderCredentials) -> Result<Self> {
        Self::new(credentials, true)
    }

    /// Point the provider at a different API root
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    fn records_url(&self, zone_id: &str) -> String {
        format!("{}/zones/{}/dns_records", self.base_url, zone_id)
    }

    /// Attach authentication headers
    fn authed(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request.header("Content-Type", "application/json");
        match &self.credentials {
            ProviderCredentials::ApiToken(token) => request.bearer_auth(token),
            ProviderCredentials::GlobalKey { email, key } => request
                .header("X-Auth-Email", email)
                .header("X-Auth-Key", key),
        }
    }

    /// Send a request and unwrap the Cloudflare envelope
    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        operation: &str,
    ) -> Result<ApiEnvelope<T>> {
        let response = self
            .authed(request)
            .send()
            .await
            .map_err(|e| Error::http(format!("{}: request failed: {}", operation, e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read response body".to_string());

        if !status.is_success() {
            return Err(map_status(status, &body, operation));
        }

        let envelope: ApiEnvelope<T> = serde_json::from_str(&body).map_err(|e| {
            Error::provider(PROVIDER, format!("{}: failed to parse response: {}", operation, e))
        })?;

        if !envelope.success {
            return Err(Error::provider(
                PROVIDER,
                format!("{}: {}", operation, describe_errors(&envelope.errors)),
            ));
        }

        Ok(envelope)
    }

    /// Fetch every page of a listing
    async fn list_all<T: DeserializeOwned>(
        &self,
        url: &str,
        per_page: u32,
        operation: &str,
    ) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let mut page = 1;

        loop {
            let request = self
                .client
                .get(url)
                .query(&[("page", page), ("per_page", per_page)]);
            let envelope: ApiEnvelope<Vec<T>> = self.send(request, operation).await?;

            items.extend(envelope.result.unwrap_or_default());

            if !has_more_pages(envelope.result_info.as_ref(), page) {
                break;
            }
            page += 1;
        }

        Ok(items)
    }
}

/// Whether another page follows `page`
fn has_more_pages(info: Option<&ResultInfo>, page: u32) -> bool {
    match info {
        Some(info) => info.page.max(page) < info.total_pages,
        None => false,
    }
}

/// Map a non-2xx response to an error
fn map_status(status: StatusCode, body: &str, operation: &str) -> Error {
    let detail = serde_json::from_str::<ApiEnvelope<serde_json::Value>>(body)
        .ok()
        .filter(|e| !e.errors.is_empty())
        .map(|e| describe_errors(&e.errors));

    match status.as_u16() {
        401 | 403 => Error::auth(format!(
            "{}: invalid credentials or insufficient permissions. Status: {}{}",
            operation,
            status,
            detail.map(|d| format!(" ({})", d)).unwrap_or_default()
        )),
        404 => Error::not_found(format!("{}: {}", operation, detail.unwrap_or_else(|| status.to_string()))),
        429 => Error::rate_limited(format!(
            "{}: rate limit exceeded. Please retry later. Status: {}",
            operation, status
        )),
        _ => match detail {
            Some(detail) => Error::provider(PROVIDER, format!("{}: {} - {}", operation, status, detail)),
            None => Error::http(format!("{}: {} - {}", operation, status, body)),
        },
    }
}

fn describe_errors(errors: &[ApiMessage]) -> String {
    if errors.is_empty() {
        return "request was not successful".to_string();
    }
    errors
        .iter()
        .map(|e| format!("[{}] {}", e.code, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

#[async_trait]
impl DnsProvider for CloudflareProvider {
    async fn list_zone_ids(&self) -> Result<Vec<String>> {
        let url = format!("{}/zones", self.base_url);
        let zones: Vec<ZoneSummary> = self.list_all(&url, ZONES_PER_PAGE, "list zones").await?;

        for zone in &zones {
            tracing::debug!("Found zone {} ({})", zone.name, zone.id);
        }
        if zones.is_empty() {
            tracing::warn!("No zones visible to these credentials");
        }

        Ok(zones.into_iter().map(|z| z.id).collect())
    }

    async fn list_records(&self, zone_id: &str) -> Result<Vec<DnsRecord>> {
        let url = self.records_url(zone_id);
        let raw: Vec<RawDnsRecord> = self
            .list_all(&url, RECORDS_PER_PAGE, "list records")
            .await?;

        tracing::debug!("Zone {}: {} record(s)", zone_id, raw.len());
        Ok(raw.into_iter().map(|r| r.into_record(zone_id)).collect())
    }

    async fn update_record(
        &self,
        zone_id: &str,
        record_id: &str,
        update: &RecordUpdate,
    ) -> Result<()> {
        let url = format!("{}/{}", self.records_url(zone_id), record_id);

        if self.dry_run {
            tracing::info!(
                "[DRY-RUN] Would send PATCH request to {} with payload: {}",
                url,
                serde_json::to_string(update)?
            );
            return Ok(());
        }

        let request = self.client.patch(&url).json(update);
        let _: ApiEnvelope<serde_json::Value> = self.send(request, "update record").await?;
        Ok(())
    }

    async fn create_record(&self, zone_id: &str, record: &RecordUpdate) -> Result<String> {
        let url = self.records_url(zone_id);

        if self.dry_run {
            tracing::info!(
                "[DRY-RUN] Would send POST request to {} with payload: {}",
                url,
                serde_json::to_string(record)?
            );
            return Ok(String::new());
        }

        let request = self.client.post(&url).json(record);
        let envelope: ApiEnvelope<CreatedRecord> = self.send(request, "create record").await?;

        envelope
            .result
            .map(|r| r.id)
            .ok_or_else(|| Error::provider(PROVIDER, "create record: response has no result"))
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER
    }
}
