//! Configuration types for the DDNS reconciler
//!
//! Runtime settings come from environment variables only. The per-run policy
//! (create directive and ignore rules) comes from two optional YAML files in
//! the configuration directory.

use crate::error::{Error, Result};
use crate::policy::{CreateDirective, IgnorePolicy};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Default public IP echo service
pub const DEFAULT_IP_SOURCE_URL: &str = "https://api.ipify.org";

/// Default directory holding `create.yaml` and `ignore.yaml`
pub const DEFAULT_CONFIG_DIR: &str = "./CONFIG";

/// File name of the create directive
pub const CREATE_FILE: &str = "create.yaml";

/// File name of the ignore policy
pub const IGNORE_FILE: &str = "ignore.yaml";

/// Provider credentials
///
/// The Debug implementation never exposes secret values.
#[derive(Clone, PartialEq, Eq)]
pub enum ProviderCredentials {
    /// Scoped API token, sent as a bearer token
    ApiToken(String),
    /// Account email plus global API key
    GlobalKey { email: String, key: String },
}

impl std::fmt::Debug for ProviderCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ApiToken(_) => f.debug_tuple("ApiToken").field(&"<REDACTED>").finish(),
            Self::GlobalKey { email, .. } => f
                .debug_struct("GlobalKey")
                .field("email", email)
                .field("key", &"<REDACTED>")
                .finish(),
        }
    }
}

impl ProviderCredentials {
    fn validate(&self) -> Result<()> {
        match self {
            Self::ApiToken(token) if token.is_empty() => {
                Err(Error::config("DDNS_PROVIDER_API_TOKEN cannot be empty"))
            }
            Self::GlobalKey { email, key } if email.is_empty() || key.is_empty() => Err(
                Error::config("DDNS_PROVIDER_EMAIL and DDNS_PROVIDER_API_KEY must both be set"),
            ),
            _ => Ok(()),
        }
    }
}

/// Log verbosity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl std::str::FromStr for LogLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            other => Err(Error::config(format!(
                "DDNS_LOG_LEVEL '{other}' is not valid. Valid levels: trace, debug, info, warn, error"
            ))),
        }
    }
}

/// Runtime configuration
#[derive(Debug, Clone)]
pub struct DdnsConfig {
    /// Provider credentials
    pub credentials: ProviderCredentials,

    /// Zones to reconcile; empty means every zone the credentials can see
    pub zone_ids: Vec<String>,

    /// Public IP echo service
    pub ip_source_url: String,

    /// Directory holding the policy files
    pub config_dir: PathBuf,

    /// List records but do not write anything
    pub dry_run: bool,

    /// Repeat the pass on this interval instead of running once
    pub run_interval: Option<Duration>,

    pub log_level: LogLevel,
}

impl DdnsConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable lookup
    ///
    /// Recognized variables:
    ///
    /// - `DDNS_PROVIDER_API_TOKEN`, or `DDNS_PROVIDER_EMAIL` + `DDNS_PROVIDER_API_KEY`
    /// - `DDNS_ZONES`: comma-separated zone ids
    /// - `DDNS_IP_SOURCE_URL`
    /// - `DDNS_CONFIG_DIR`
    /// - `DDNS_MODE`: `dry-run` or `live`
    /// - `DDNS_RUN_INTERVAL_SECS`
    /// - `DDNS_LOG_LEVEL`
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let credentials = match lookup("DDNS_PROVIDER_API_TOKEN") {
            Some(token) => ProviderCredentials::ApiToken(token),
            None => match (lookup("DDNS_PROVIDER_EMAIL"), lookup("DDNS_PROVIDER_API_KEY")) {
                (Some(email), Some(key)) => ProviderCredentials::GlobalKey { email, key },
                _ => {
                    return Err(Error::config(
                        "No credentials: set DDNS_PROVIDER_API_TOKEN, or DDNS_PROVIDER_EMAIL and DDNS_PROVIDER_API_KEY",
                    ));
                }
            },
        };

        let zone_ids = lookup("DDNS_ZONES")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let dry_run = match lookup("DDNS_MODE").map(|m| m.to_lowercase()).as_deref() {
            None | Some("") | Some("live") => false,
            Some("dry-run") => true,
            Some(other) => {
                return Err(Error::config(format!(
                    "DDNS_MODE '{other}' is not supported. Supported modes: live, dry-run"
                )));
            }
        };

        let run_interval = match lookup("DDNS_RUN_INTERVAL_SECS") {
            Some(raw) => {
                let secs: u64 = raw.trim().parse().map_err(|_| {
                    Error::config(format!("DDNS_RUN_INTERVAL_SECS must be a number. Got: {raw}"))
                })?;
                Some(Duration::from_secs(secs))
            }
            None => None,
        };

        let config = Self {
            credentials,
            zone_ids,
            ip_source_url: lookup("DDNS_IP_SOURCE_URL")
                .unwrap_or_else(|| DEFAULT_IP_SOURCE_URL.to_string()),
            config_dir: lookup("DDNS_CONFIG_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_DIR)),
            dry_run,
            run_interval,
            log_level: lookup("DDNS_LOG_LEVEL")
                .as_deref()
                .unwrap_or("info")
                .parse()?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.credentials.validate()?;

        if !self.ip_source_url.starts_with("https://") && !self.ip_source_url.starts_with("http://")
        {
            return Err(Error::config(format!(
                "DDNS_IP_SOURCE_URL must use HTTP or HTTPS scheme. Got: {}",
                self.ip_source_url
            )));
        }

        if let Some(interval) = self.run_interval
            && !(10..=86_400).contains(&interval.as_secs())
        {
            return Err(Error::config(format!(
                "DDNS_RUN_INTERVAL_SECS must be between 10 and 86400 seconds. Got: {}",
                interval.as_secs()
            )));
        }

        Ok(())
    }
}

/// Read-only policy snapshot shared by every zone of a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunPolicy {
    /// Zones to reconcile; empty means ask the provider
    pub zone_ids: Vec<String>,
    pub directive: Option<CreateDirective>,
    pub rules: IgnorePolicy,
}

impl RunPolicy {
    /// Load the create directive and ignore policy from `dir`
    ///
    /// Missing files disable the corresponding feature. Files that exist but
    /// cannot be read or parsed are errors.
    pub fn load(dir: impl AsRef<Path>, zone_ids: Vec<String>) -> Result<Self> {
        let dir = dir.as_ref();
        let directive = load_create_directive(dir.join(CREATE_FILE))?;
        let rules = load_ignore_policy(dir.join(IGNORE_FILE))?;

        if let Some(ref d) = directive {
            info!("Create directive: {} {} -> {}", d.record_type, d.name, d.content);
        }
        info!("Loaded {} ignore rule(s)", rules.len());

        Ok(Self {
            zone_ids,
            directive,
            rules,
        })
    }
}

/// Read `create.yaml`; `None` if the file is missing or its content is blank
pub fn load_create_directive(path: impl AsRef<Path>) -> Result<Option<CreateDirective>> {
    let Some(raw) = read_optional(path.as_ref())? else {
        return Ok(None);
    };
    if raw.trim().is_empty() {
        return Ok(None);
    }

    let directive: CreateDirective = serde_yaml::from_str(&raw).map_err(|e| {
        Error::config(format!("Failed to parse {}: {}", path.as_ref().display(), e))
    })?;

    Ok(directive.is_present().then_some(directive))
}

/// Read `ignore.yaml`; an empty policy if the file is missing
pub fn load_ignore_policy(path: impl AsRef<Path>) -> Result<IgnorePolicy> {
    let Some(raw) = read_optional(path.as_ref())? else {
        return Ok(IgnorePolicy::default());
    };
    if raw.trim().is_empty() {
        return Ok(IgnorePolicy::default());
    }

    serde_yaml::from_str(&raw)
        .map_err(|e| Error::config(format!("Failed to parse {}: {}", path.as_ref().display(), e)))
}

fn read_optional(path: &Path) -> Result<Option<String>> {
    match std::fs::read_to_string(path) {
        Ok(raw) => Ok(Some(raw)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("{} not found, feature disabled", path.display());
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}
