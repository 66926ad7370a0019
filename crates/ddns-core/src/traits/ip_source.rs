// # IP Source Trait
//
// Defines the interface for looking up the machine's public address.
//
// ## Implementations
//
// - HTTP echo service: `ddns-ip-http` crate
//
// ## Usage
//
// ```rust,ignore
// use ddns_core::IpSource;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let source = /* IpSource implementation */;
//     let ip = source.current().await?;
//     println!("public IP: {ip}");
//     Ok(())
// }
// ```

use async_trait::async_trait;
use std::net::IpAddr;

/// Trait for public IP lookups
///
/// A failed lookup is fatal for the run: without an observed address no zone
/// can be reconciled.
#[async_trait]
pub trait IpSource: Send + Sync {
    /// Get the current public IP address
    async fn current(&self) -> Result<IpAddr, crate::Error>;

    /// Source name (for logging/debugging)
    fn source_name(&self) -> &'static str {
        "unknown"
    }
}
