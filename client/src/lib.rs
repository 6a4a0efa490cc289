//! StellarLend Liquidation Harness Client
//!
//! Off-chain side of the liquidation test harness. It follows a lending
//! position through supply, borrow, collateral price crash and withdraw,
//! recording the pool's health factor after each step into a
//! [`health_history::HealthHistory`] so assertions can check when the position
//! became liquidatable.
//!
//! # Features
//!
//! - **Ledger clock**: block height and close time from Horizon's latest ledger
//! - **Health reads**: simulate the probe's `get_health_factor` over Soroban RPC
//! - **Position tracking**: one append-only history per position, with status transitions logged
//! - **Watching**: poll a position until it is at risk or a timeout elapses
//! - **On-chain history**: rebuild the probe's own history from its `HealthRecordedEvent`s
//! - **Retry Logic**: Exponential backoff for transient network errors
//! - **Network Support**: Testnet, Mainnet, Futurenet, and custom networks
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use liquidation_harness_client::{HarnessClient, HarnessConfig, PositionAction, PositionConfig};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     tracing_subscriber::fmt::init();
//!
//!     let client = HarnessClient::new(Arc::new(HarnessConfig::from_env()?))?;
//!     client.health_check().await?;
//!
//!     let position = PositionConfig::from_env()?;
//!     let query_xdr = std::env::var("HEALTH_QUERY_XDR")?;
//!     let mut tracker = client.track_position(position.position_id(), query_xdr);
//!
//!     let report = tracker.observe(PositionAction::Poll).await?;
//!     println!("{}: {}", report.status, report.health_factor());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::broken_intra_doc_links)]

pub mod config;
pub mod error;
pub mod horizon;
pub mod monitor;
pub mod onchain;
pub mod retry;
pub mod scval;
pub mod soroban_rpc;
pub mod source;
pub mod tracker;
pub mod types;

pub use config::{HarnessConfig, Network, PositionConfig};
pub use error::{HarnessError, Result};
pub use horizon::HorizonClient;
pub use monitor::{PositionMonitor, WatchOptions, WatchOutcome};
pub use onchain::{rebuild_history, RecordedHealth};
pub use retry::RetryStrategy;
pub use soroban_rpc::{ContractEvent, SimulateTransactionResult, SorobanRpcClient};
pub use source::{HealthSource, HorizonLedgerClock, LedgerClock, SimulatedHealthSource};
pub use tracker::PositionTracker;
pub use types::{HistoryReport, LedgerStamp, ObservationReport, PositionAction, PositionId};

use health_history::HealthHistory;
use std::sync::Arc;
use tracing::info;

/// Most events requested per `getEvents` call
const EVENT_PAGE_LIMIT: u32 = 1000;

/// Entry point combining Horizon and Soroban RPC access with position tracking
#[derive(Clone)]
pub struct HarnessClient {
    horizon: HorizonClient,
    soroban_rpc: SorobanRpcClient,
    config: Arc<HarnessConfig>,
}

impl HarnessClient {
    /// Create a new harness client
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use liquidation_harness_client::{HarnessClient, HarnessConfig};
    /// use std::sync::Arc;
    ///
    /// let client = HarnessClient::new(Arc::new(HarnessConfig::testnet())).unwrap();
    /// ```
    pub fn new(config: Arc<HarnessConfig>) -> Result<Self> {
        config.validate()?;

        info!(
            "Initializing harness client for network: {:?}",
            config.network
        );

        Ok(Self {
            horizon: HorizonClient::new(config.clone())?,
            soroban_rpc: SorobanRpcClient::new(config.clone())?,
            config,
        })
    }

    /// Get the Horizon client
    pub fn horizon(&self) -> &HorizonClient {
        &self.horizon
    }

    /// Get the Soroban RPC client
    pub fn soroban_rpc(&self) -> &SorobanRpcClient {
        &self.soroban_rpc
    }

    /// Get configuration
    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Most recently closed ledger
    pub async fn latest_ledger(&self) -> Result<LedgerStamp> {
        self.horizon.latest_ledger().await
    }

    /// Health check - verify connectivity to Horizon and Soroban RPC
    pub async fn health_check(&self) -> Result<bool> {
        let (horizon, rpc) =
            tokio::try_join!(self.horizon.health_check(), self.soroban_rpc.health_check())?;
        Ok(horizon && rpc)
    }

    /// Start tracking `position`, reading its health by simulating `query_xdr`.
    ///
    /// `query_xdr` is a base64 transaction envelope invoking the probe's
    /// `get_health_factor`.
    pub fn track_position(
        &self,
        position: PositionId,
        query_xdr: impl Into<String>,
    ) -> PositionTracker {
        info!("Tracking position {}", position);

        let source = SimulatedHealthSource::new(self.soroban_rpc.clone())
            .with_query(position.clone(), query_xdr);
        let clock = HorizonLedgerClock::new(self.horizon.clone());
        PositionTracker::new(position, Arc::new(source), Arc::new(clock))
    }

    /// Rebuild the probe's on-chain health history from its events.
    ///
    /// `start_ledger` must not be later than the probe's first record.
    pub async fn onchain_history(
        &self,
        position: &PositionConfig,
        start_ledger: u64,
    ) -> Result<HealthHistory> {
        let events = self
            .soroban_rpc
            .get_events(
                start_ledger,
                std::slice::from_ref(&position.probe_contract),
                &[onchain::health_recorded_topic()?],
                EVENT_PAGE_LIMIT,
            )
            .await?;

        let records = events
            .iter()
            .map(RecordedHealth::from_event)
            .collect::<Result<Vec<_>>>()?;
        let history = rebuild_history(records)?;

        info!(
            "Rebuilt {} on-chain records for {}",
            history.len(),
            position.probe_contract
        );
        Ok(history)
    }

    /// Watch a tracked position using the configured poll interval and timeout
    pub async fn watch(&self, tracker: &mut PositionTracker) -> Result<WatchOutcome> {
        PositionMonitor::new()
            .watch(tracker, WatchOptions::from_config(&self.config))
            .await
    }
}
