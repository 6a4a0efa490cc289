//! Where health factors and ledger stamps come from.
//!
//! The tracker only sees these two traits, so tests can drive it with scripted
//! values while the harness binary plugs in the network adapters below.

use crate::error::{HarnessError, Result};
use crate::horizon::HorizonClient;
use crate::scval;
use crate::soroban_rpc::SorobanRpcClient;
use crate::types::{LedgerStamp, PositionId};
use async_trait::async_trait;
use health_history::HealthFactor;
use std::collections::HashMap;
use tracing::debug;

/// Reads a position's current health factor from the lending pool
#[async_trait]
pub trait HealthSource: Send + Sync {
    /// Current health factor of `position`
    async fn current_health_factor(&self, position: &PositionId) -> Result<HealthFactor>;
}

/// Reads the current block height and time
#[async_trait]
pub trait LedgerClock: Send + Sync {
    /// Most recently closed ledger
    async fn now(&self) -> Result<LedgerStamp>;
}

/// Health source that simulates a pre-built `get_health_factor` invocation.
///
/// Each position maps to a base64 transaction envelope invoking the probe's
/// `get_health_factor`; building and signing that envelope is left to the
/// deployment tooling.
#[derive(Clone)]
pub struct SimulatedHealthSource {
    rpc: SorobanRpcClient,
    queries: HashMap<PositionId, String>,
}

impl SimulatedHealthSource {
    /// Create a source with no registered positions
    pub fn new(rpc: SorobanRpcClient) -> Self {
        Self {
            rpc,
            queries: HashMap::new(),
        }
    }

    /// Register the query envelope for `position`, replacing any previous one
    pub fn register(&mut self, position: PositionId, query_xdr: impl Into<String>) {
        self.queries.insert(position, query_xdr.into());
    }

    /// Builder form of [`SimulatedHealthSource::register`]
    pub fn with_query(mut self, position: PositionId, query_xdr: impl Into<String>) -> Self {
        self.register(position, query_xdr);
        self
    }
}

#[async_trait]
impl HealthSource for SimulatedHealthSource {
    async fn current_health_factor(&self, position: &PositionId) -> Result<HealthFactor> {
        let query = self
            .queries
            .get(position)
            .ok_or_else(|| HarnessError::UnknownPosition(position.to_string()))?;

        let result_xdr = self
            .rpc
            .simulate_transaction(query)
            .await?
            .into_result_xdr()?;
        let factor = HealthFactor::from_raw(scval::to_u128(&scval::decode(&result_xdr)?)?);

        debug!("Position {} health factor: {}", position, factor);
        Ok(factor)
    }
}

/// Ledger clock backed by Horizon's latest closed ledger
#[derive(Clone)]
pub struct HorizonLedgerClock {
    horizon: HorizonClient,
}

impl HorizonLedgerClock {
    /// Wrap a Horizon client
    pub fn new(horizon: HorizonClient) -> Self {
        Self { horizon }
    }
}

#[async_trait]
impl LedgerClock for HorizonLedgerClock {
    async fn now(&self) -> Result<LedgerStamp> {
        self.horizon.latest_ledger().await
    }
}
