//! Common types used across the harness.
//!
//! This module defines ledger stamps, position identifiers and the reports
//! the tracker hands back to assertion code.

use chrono::{DateTime, Utc};
use health_history::{HealthFactor, HealthObservation, HealthStatus, StatusTransition};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Ledger sequence and close time of the most recent closed ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerStamp {
    /// Ledger sequence number (the block height)
    pub sequence: u64,
    /// Ledger close time
    pub closed_at: DateTime<Utc>,
}

impl LedgerStamp {
    /// Close time in seconds since the Unix epoch; pre-epoch times clamp to 0
    pub fn timestamp(&self) -> u64 {
        u64::try_from(self.closed_at.timestamp()).unwrap_or(0)
    }
}

/// Identifier of a tracked position (normally the probe contract id)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PositionId(String);

impl PositionId {
    /// Create a position id
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PositionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PositionId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for PositionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Interaction that preceded an observation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PositionAction {
    /// Collateral supplied to the pool
    Supply,
    /// Debt drawn from the pool
    Borrow,
    /// Collateral price feed changed
    PriceUpdate,
    /// Collateral withdrawn from the pool
    Withdraw,
    /// Periodic read with no interaction
    Poll,
}

impl fmt::Display for PositionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PositionAction::Supply => write!(f, "SUPPLY"),
            PositionAction::Borrow => write!(f, "BORROW"),
            PositionAction::PriceUpdate => write!(f, "PRICE_UPDATE"),
            PositionAction::Withdraw => write!(f, "WITHDRAW"),
            PositionAction::Poll => write!(f, "POLL"),
        }
    }
}

/// Result of one tracker observation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservationReport {
    /// Position the observation belongs to
    pub position: PositionId,
    /// Interaction that triggered the observation
    pub action: PositionAction,
    /// Recorded observation
    pub observation: HealthObservation,
    /// Classification of the observation
    pub status: HealthStatus,
    /// Status of the previous observation, if there was one
    pub previous_status: Option<HealthStatus>,
}

impl ObservationReport {
    /// Health factor of the recorded observation
    pub fn health_factor(&self) -> HealthFactor {
        self.observation.health_factor()
    }

    /// Whether this observation moved the position from healthy to at risk
    pub fn entered_at_risk(&self) -> bool {
        self.status == HealthStatus::AtRisk && self.previous_status != Some(HealthStatus::AtRisk)
    }
}

/// Serialisable summary of a position's full history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryReport {
    /// Position the history belongs to
    pub position: PositionId,
    /// Every observation in recording order
    pub observations: Vec<HealthObservation>,
    /// Most recent health factor
    pub latest_health_factor: Option<HealthFactor>,
    /// First observation classified as at risk
    pub first_at_risk: Option<HealthObservation>,
    /// Observation with the lowest health factor
    pub lowest: Option<HealthObservation>,
    /// Classification changes between adjacent observations
    pub transitions: Vec<StatusTransition>,
}
