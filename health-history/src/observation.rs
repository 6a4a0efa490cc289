//! Single health factor snapshot.

use crate::factor::{HealthFactor, HealthStatus};
use serde::{Deserialize, Serialize};

/// One block-stamped, timestamped health factor snapshot.
///
/// Observations are only created by [`crate::HealthHistory::record`] and are
/// never mutated afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HealthObservation {
    sequence_index: usize,
    block_height: u64,
    timestamp: u64,
    health_factor: HealthFactor,
}

impl HealthObservation {
    pub(crate) fn new(
        sequence_index: usize,
        block_height: u64,
        timestamp: u64,
        health_factor: HealthFactor,
    ) -> Self {
        Self {
            sequence_index,
            block_height,
            timestamp,
            health_factor,
        }
    }

    /// Position of this observation in its history
    pub fn sequence_index(&self) -> usize {
        self.sequence_index
    }

    /// Block height (ledger sequence) at observation time
    pub fn block_height(&self) -> u64 {
        self.block_height
    }

    /// Seconds since the Unix epoch at observation time
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    /// Observed health factor
    pub fn health_factor(&self) -> HealthFactor {
        self.health_factor
    }

    /// Classification of the observed health factor
    pub fn status(&self) -> HealthStatus {
        self.health_factor.status()
    }
}

/// Classify an observation as healthy or at risk of liquidation
pub fn classify(observation: &HealthObservation) -> HealthStatus {
    observation.status()
}
