//! Per-position health tracking.
//!
//! A [`PositionTracker`] exclusively owns the [`HealthHistory`] of one
//! position. Call [`PositionTracker::observe`] after every state-changing
//! interaction with the pool; it stamps the read with the current ledger,
//! appends it and classifies it.

use crate::error::Result;
use crate::source::{HealthSource, LedgerClock};
use crate::types::{HistoryReport, ObservationReport, PositionAction, PositionId};
use health_history::{HealthHistory, HealthStatus};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Records the health of a single position over time
pub struct PositionTracker {
    position: PositionId,
    history: HealthHistory,
    source: Arc<dyn HealthSource>,
    clock: Arc<dyn LedgerClock>,
}

impl PositionTracker {
    /// Create a tracker with an empty history
    pub fn new(
        position: PositionId,
        source: Arc<dyn HealthSource>,
        clock: Arc<dyn LedgerClock>,
    ) -> Self {
        Self {
            position,
            history: HealthHistory::new(),
            source,
            clock,
        }
    }

    /// Tracked position
    pub fn position(&self) -> &PositionId {
        &self.position
    }

    /// Recorded history
    pub fn history(&self) -> &HealthHistory {
        &self.history
    }

    /// Read, record and classify the position's current health.
    ///
    /// A failed read or a rejected record leaves the history unchanged.
    pub async fn observe(&mut self, action: PositionAction) -> Result<ObservationReport> {
        let stamp = self.clock.now().await?;
        let health_factor = self.source.current_health_factor(&self.position).await?;

        let previous_status = self.history.latest().map(|obs| obs.status());
        let index = self
            .history
            .record(stamp.sequence, stamp.timestamp(), health_factor)?;
        let observation = self.history.at(index)?;

        let report = ObservationReport {
            position: self.position.clone(),
            action,
            observation,
            status: observation.status(),
            previous_status,
        };

        if report.entered_at_risk() {
            warn!(
                "Position {} is at risk of liquidation after {} (health factor: {}, ledger: {})",
                self.position, action, health_factor, stamp.sequence
            );
        } else if previous_status == Some(HealthStatus::AtRisk)
            && report.status == HealthStatus::Healthy
        {
            info!(
                "Position {} recovered after {} (health factor: {})",
                self.position, action, health_factor
            );
        } else {
            debug!(
                "Position {} after {}: {} ({})",
                self.position, action, health_factor, report.status
            );
        }

        Ok(report)
    }

    /// Summary of everything recorded so far
    pub fn report(&self) -> HistoryReport {
        for observation in &self.history {
            info!(
                "Health history #{}: ledger {}, time {}, health factor {}",
                observation.sequence_index(),
                observation.block_height(),
                observation.timestamp(),
                observation.health_factor()
            );
        }

        HistoryReport {
            position: self.position.clone(),
            observations: self.history.iter().copied().collect(),
            latest_health_factor: self.history.latest_health_factor(),
            first_at_risk: self.history.first_at_risk().copied(),
            lowest: self.history.lowest().copied(),
            transitions: self.history.transitions(),
        }
    }
}
