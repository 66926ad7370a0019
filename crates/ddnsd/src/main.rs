// # ddnsd - DDNS reconciler runner
//
// A THIN integration layer: all reconciliation logic lives in ddns-core.
//
// The ddnsd binary is responsible for:
// 1. Reading configuration from environment variables
// 2. Initializing logging and the runtime
// 3. Constructing the DNS provider and the public IP source
// 4. Loading the create directive and ignore policy
// 5. Running one reconciliation pass, or one per interval until signalled
//
// ## Configuration
//
// ### Provider
// - `DDNS_PROVIDER_API_TOKEN`: Scoped API token
// - `DDNS_PROVIDER_EMAIL` / `DDNS_PROVIDER_API_KEY`: Global key pair (alternative)
// - `DDNS_ZONES`: Comma-separated zone ids (default: every visible zone)
// - `DDNS_MODE`: `live` (default) or `dry-run`
//
// ### IP Source
// - `DDNS_IP_SOURCE_URL`: Echo service (default https://api.ipify.org)
//
// ### Policy
// - `DDNS_CONFIG_DIR`: Directory holding create.yaml and ignore.yaml (default ./CONFIG)
//
// ### Scheduling
// - `DDNS_RUN_INTERVAL_SECS`: Repeat every N seconds instead of running once
// - `DDNS_LOG_LEVEL`: trace, debug, info, warn, error
//
// ## Example
//
// ```bash
// export DDNS_PROVIDER_API_TOKEN=your_token
// export DDNS_CONFIG_DIR=/etc/ddns
// ddnsd
// ```

use anyhow::{Context, Result};
use ddns_core::config::DdnsConfig;
use ddns_core::{DnsProvider, IpSource, LogLevel, Reconciler, RunPolicy, RunReport, ZoneStatus};
use std::process::ExitCode;
use std::time::Duration;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes for different termination scenarios
///
/// - 0: Clean run (in interval mode: every pass was clean)
/// - 1: Configuration or startup error
/// - 2: Runtime error (e.g. public IP lookup failed)
/// - 3: Run completed with zone or record failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DdnsExitCode {
    Clean = 0,
    ConfigError = 1,
    RuntimeError = 2,
    PartialFailure = 3,
}

impl DdnsExitCode {
    fn severity(self) -> u8 {
        match self {
            Self::Clean => 0,
            Self::PartialFailure => 1,
            Self::RuntimeError => 2,
            Self::ConfigError => 3,
        }
    }

    /// The more severe of two outcomes
    fn worst(self, other: Self) -> Self {
        if other.severity() > self.severity() { other } else { self }
    }
}

impl From<DdnsExitCode> for ExitCode {
    fn from(code: DdnsExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

fn tracing_level(level: LogLevel) -> Level {
    match level {
        LogLevel::Trace => Level::TRACE,
        LogLevel::Debug => Level::DEBUG,
        LogLevel::Info => Level::INFO,
        LogLevel::Warn => Level::WARN,
        LogLevel::Error => Level::ERROR,
    }
}

fn main() -> ExitCode {
    // Load and validate configuration from environment
    let config = match DdnsConfig::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return DdnsExitCode::ConfigError.into();
        }
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(tracing_level(config.log_level))
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return DdnsExitCode::ConfigError.into();
    }

    info!("Starting ddnsd");

    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DdnsExitCode::RuntimeError.into();
        }
    };

    rt.block_on(run_daemon(config)).into()
}

/// Build components and run the configured schedule
async fn run_daemon(config: DdnsConfig) -> DdnsExitCode {
    let (reconciler, ip_source) = match build_components(&config) {
        Ok(parts) => parts,
        Err(e) => {
            error!("Startup error: {:#}", e);
            return DdnsExitCode::ConfigError;
        }
    };

    let policy = match load_policy(&config) {
        Ok(policy) => policy,
        Err(e) => {
            error!("{:#}", e);
            return DdnsExitCode::ConfigError;
        }
    };

    match config.run_interval {
        None => run_pass(&reconciler, ip_source.as_ref(), &policy).await,
        Some(interval) => run_periodic(&config, &reconciler, ip_source.as_ref(), policy, interval).await,
    }
}

fn build_components(config: &DdnsConfig) -> Result<(Reconciler, Box<dyn IpSource>)> {
    let provider = build_provider(config)?;
    info!("DNS provider: {}", provider.provider_name());

    let ip_source = build_ip_source(config)?;
    Ok((Reconciler::new(provider), ip_source))
}

#[cfg(feature = "cloudflare")]
fn build_provider(config: &DdnsConfig) -> Result<Box<dyn DnsProvider>> {
    let provider = ddns_provider_cloudflare::CloudflareProvider::new(
        config.credentials.clone(),
        config.dry_run,
    )
    .context("Failed to create Cloudflare provider")?;
    Ok(Box::new(provider))
}

#[cfg(not(feature = "cloudflare"))]
fn build_provider(_config: &DdnsConfig) -> Result<Box<dyn DnsProvider>> {
    anyhow::bail!("No DNS provider compiled in. Rebuild with --features cloudflare")
}

#[cfg(feature = "http")]
fn build_ip_source(config: &DdnsConfig) -> Result<Box<dyn IpSource>> {
    if config.ip_source_url.starts_with("http://") {
        warn!("DDNS_IP_SOURCE_URL uses HTTP (not HTTPS); the reported address can be spoofed");
    }
    let source = ddns_ip_http::HttpIpSource::new(config.ip_source_url.clone())
        .context("Failed to create HTTP IP source")?;
    Ok(Box::new(source))
}

#[cfg(not(feature = "http"))]
fn build_ip_source(_config: &DdnsConfig) -> Result<Box<dyn IpSource>> {
    anyhow::bail!("No IP source compiled in. Rebuild with --features http")
}

fn load_policy(config: &DdnsConfig) -> Result<RunPolicy> {
    RunPolicy::load(&config.config_dir, config.zone_ids.clone()).with_context(|| {
        format!("Failed to load policy from {}", config.config_dir.display())
    })
}

/// Run one reconciliation pass and report it
async fn run_pass(reconciler: &Reconciler, ip_source: &dyn IpSource, policy: &RunPolicy) -> DdnsExitCode {
    match reconciler.run(ip_source, policy).await {
        Ok(report) => {
            log_report(&report);
            if report.is_clean() {
                DdnsExitCode::Clean
            } else {
                DdnsExitCode::PartialFailure
            }
        }
        Err(e) => {
            error!("Run aborted: {}", e);
            DdnsExitCode::RuntimeError
        }
    }
}

/// Repeat passes on `interval` until SIGINT/SIGTERM
///
/// Returns the worst exit code seen across all passes.
/// The policy files are re-read before every pass after the first; if they
/// stop parsing, the last good policy is kept.
async fn run_periodic(
    config: &DdnsConfig,
    reconciler: &Reconciler,
    ip_source: &dyn IpSource,
    mut policy: RunPolicy,
    interval: Duration,
) -> DdnsExitCode {
    info!("Running every {:?}", interval);

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    let shutdown = wait_for_shutdown();
    tokio::pin!(shutdown);

    let mut first = true;
    let mut outcome = DdnsExitCode::Clean;
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if !first {
                    match load_policy(config) {
                        Ok(fresh) => policy = fresh,
                        Err(e) => warn!("{:#}; keeping previous policy", e),
                    }
                }
                first = false;
                outcome = outcome.worst(run_pass(reconciler, ip_source, &policy).await);
            }

            signal = &mut shutdown => {
                return match signal {
                    Ok(name) => {
                        info!("Received {}, shutting down", name);
                        outcome
                    }
                    Err(e) => {
                        error!("Shutdown error: {}", e);
                        outcome.worst(DdnsExitCode::RuntimeError)
                    }
                };
            }
        }
    }
}

fn log_report(report: &RunReport) {
    for zone in &report.zones {
        for name in &zone.excluded {
            info!("Zone {}: {} is ignored", zone.zone_id, name);
        }
        for conflict in &zone.conflicts {
            warn!(
                "Zone {}: {} is {} but should be {}",
                zone.zone_id, conflict.name, conflict.current_ip, conflict.desired_ip
            );
        }
        for failure in &zone.failures {
            if failure.auth {
                error!(
                    "Zone {}: {} was rejected, check the API credentials: {}",
                    zone.zone_id, failure.name, failure.error
                );
            } else {
                error!("Zone {}: {} failed: {}", zone.zone_id, failure.name, failure.error);
            }
        }
        if let ZoneStatus::Failed(reason) = &zone.status {
            error!("Zone {} skipped: {}", zone.zone_id, reason);
        }
    }

    info!(
        "Run finished in {}ms: {} zone(s), {} record(s) updated, {} failed zone(s), {} failed record(s)",
        (report.finished_at - report.started_at).num_milliseconds(),
        report.zones.len(),
        report.updated_records(),
        report.failed_zones(),
        report.failed_records()
    );
}

/// Wait for shutdown signals (SIGTERM, SIGINT)
///
/// Returns the name of the signal received.
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}

/// Wait for shutdown signals (SIGINT only)
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}
