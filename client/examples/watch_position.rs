//! Watch a deployed liquidation probe until its position becomes liquidatable.
//!
//! Reads network settings from `STELLAR_NETWORK` / `HORIZON_URL` /
//! `SOROBAN_RPC_URL`, the probe from `PROBE_CONTRACT`, and the simulated
//! `get_health_factor` envelope from `HEALTH_QUERY_XDR`. When
//! `PROBE_START_LEDGER` is set, the probe's own on-chain history is fetched
//! and printed as well.
//!
//! ```text
//! RUST_LOG=info cargo run --example watch_position
//! ```

use anyhow::Context;
use liquidation_harness_client::{
    HarnessClient, HarnessConfig, PositionAction, PositionConfig, WatchOutcome,
};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Arc::new(HarnessConfig::from_env().context("loading network config")?);
    let position = PositionConfig::from_env().context("loading position config")?;
    let query_xdr =
        std::env::var("HEALTH_QUERY_XDR").context("HEALTH_QUERY_XDR must be set")?;

    let client = HarnessClient::new(config)?;
    client.health_check().await?;

    let mut tracker = client.track_position(position.position_id(), query_xdr);
    let first = tracker.observe(PositionAction::Poll).await?;
    println!(
        "Position {} starts at {} ({})",
        tracker.position(),
        first.health_factor(),
        first.status
    );

    match client.watch(&mut tracker).await? {
        WatchOutcome::AtRisk(report) => println!(
            "At risk at ledger {} with health factor {}",
            report.observation.block_height(),
            report.health_factor()
        ),
        WatchOutcome::Timeout { polls, elapsed } => {
            println!("Still healthy after {} polls ({:?})", polls, elapsed)
        }
    }

    println!("{}", serde_json::to_string_pretty(&tracker.report())?);

    if let Ok(start) = std::env::var("PROBE_START_LEDGER") {
        let start: u64 = start.parse().context("PROBE_START_LEDGER must be a ledger number")?;
        let onchain = client.onchain_history(&position, start).await?;
        println!("{}", serde_json::to_string_pretty(&onchain)?);
    }
    Ok(())
}
