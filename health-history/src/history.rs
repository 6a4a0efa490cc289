//! Append-only health factor history for a single tracked position.
//!
//! A [`HealthHistory`] is owned by exactly one position. It is appended to
//! after every state-changing interaction with the lending pool and read back
//! by assertion code. The recorder itself does no locking; callers sharing a
//! history across tasks must serialize access themselves.
//!
//! ## Invariants
//! - Length only grows; recorded observations are never mutated or removed.
//! - Sequence indices are contiguous from 0.
//! - Block height and timestamp are non-decreasing between adjacent entries.
//! - A failed `record` leaves the history untouched.

use crate::error::{HistoryError, Result, StampField};
use crate::factor::{HealthFactor, HealthStatus};
use crate::observation::HealthObservation;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Change in classification between two adjacent observations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusTransition {
    /// Sequence index of the observation that changed status
    pub at: usize,
    /// Status of the preceding observation
    pub from: HealthStatus,
    /// Status of the observation at `at`
    pub to: HealthStatus,
}

/// Ordered, append-only sequence of [`HealthObservation`]s
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<HealthObservation>", into = "Vec<HealthObservation>")]
pub struct HealthHistory {
    observations: Vec<HealthObservation>,
}

impl HealthHistory {
    /// Create an empty history
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an observation and return its sequence index.
    ///
    /// # Errors
    ///
    /// * `InvalidStamp` - block height or timestamp is zero
    /// * `OrderingViolation` - block height or timestamp is earlier than the last entry
    pub fn record(
        &mut self,
        block_height: u64,
        timestamp: u64,
        health_factor: impl Into<HealthFactor>,
    ) -> Result<usize> {
        let health_factor = health_factor.into();

        if let Err(err) = self.check_stamp(block_height, timestamp) {
            warn!("Rejected health observation: {}", err);
            return Err(err);
        }

        let index = self.observations.len();
        self.observations.push(HealthObservation::new(
            index,
            block_height,
            timestamp,
            health_factor,
        ));

        debug!(
            "Recorded health observation #{} (block: {}, timestamp: {}, health factor: {})",
            index, block_height, timestamp, health_factor
        );

        Ok(index)
    }

    /// Number of recorded observations
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    /// Whether nothing has been recorded yet
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Observation at `index`
    ///
    /// # Errors
    ///
    /// * `IndexOutOfRange` - `index >= len()`
    pub fn at(&self, index: usize) -> Result<HealthObservation> {
        self.observations
            .get(index)
            .copied()
            .ok_or(HistoryError::IndexOutOfRange {
                index,
                len: self.observations.len(),
            })
    }

    /// Most recent observation, if any
    pub fn latest(&self) -> Option<&HealthObservation> {
        self.observations.last()
    }

    /// Most recent observation, or `EmptyHistory`
    pub fn require_latest(&self) -> Result<&HealthObservation> {
        self.latest().ok_or(HistoryError::EmptyHistory)
    }

    /// Health factor of the most recent observation; `None` before the first record
    pub fn latest_health_factor(&self) -> Option<HealthFactor> {
        self.latest().map(HealthObservation::health_factor)
    }

    /// Iterate observations in recording order
    pub fn iter(&self) -> std::slice::Iter<'_, HealthObservation> {
        self.observations.iter()
    }

    /// First observation classified as at risk
    pub fn first_at_risk(&self) -> Option<&HealthObservation> {
        self.observations
            .iter()
            .find(|obs| obs.status() == HealthStatus::AtRisk)
    }

    /// Observation with the lowest health factor (earliest on ties)
    pub fn lowest(&self) -> Option<&HealthObservation> {
        self.observations
            .iter()
            .reduce(|lowest, obs| {
                if obs.health_factor() < lowest.health_factor() {
                    obs
                } else {
                    lowest
                }
            })
    }

    /// Every point where the classification differs from the previous entry
    pub fn transitions(&self) -> Vec<StatusTransition> {
        self.observations
            .windows(2)
            .filter_map(|pair| {
                let (from, to) = (pair[0].status(), pair[1].status());
                (from != to).then_some(StatusTransition {
                    at: pair[1].sequence_index(),
                    from,
                    to,
                })
            })
            .collect()
    }

    /// Re-check all history invariants.
    ///
    /// Always succeeds for histories built through [`HealthHistory::record`];
    /// useful after receiving observations from elsewhere.
    pub fn verify(&self) -> Result<()> {
        let mut rebuilt = HealthHistory::new();
        for observation in &self.observations {
            rebuilt.push_existing(*observation)?;
        }
        Ok(())
    }

    fn push_existing(&mut self, observation: HealthObservation) -> Result<()> {
        let expected = self.observations.len();
        if observation.sequence_index() != expected {
            return Err(HistoryError::NonContiguousIndex {
                expected,
                found: observation.sequence_index(),
            });
        }
        self.check_stamp(observation.block_height(), observation.timestamp())?;
        self.observations.push(observation);
        Ok(())
    }

    fn check_stamp(&self, block_height: u64, timestamp: u64) -> Result<()> {
        if block_height == 0 {
            return Err(HistoryError::InvalidStamp {
                field: StampField::BlockHeight,
            });
        }
        if timestamp == 0 {
            return Err(HistoryError::InvalidStamp {
                field: StampField::Timestamp,
            });
        }

        if let Some(last) = self.observations.last() {
            if block_height < last.block_height() {
                return Err(HistoryError::OrderingViolation {
                    field: StampField::BlockHeight,
                    previous: last.block_height(),
                    attempted: block_height,
                });
            }
            if timestamp < last.timestamp() {
                return Err(HistoryError::OrderingViolation {
                    field: StampField::Timestamp,
                    previous: last.timestamp(),
                    attempted: timestamp,
                });
            }
        }

        Ok(())
    }
}

impl TryFrom<Vec<HealthObservation>> for HealthHistory {
    type Error = HistoryError;

    fn try_from(observations: Vec<HealthObservation>) -> Result<Self> {
        let mut history = HealthHistory::new();
        for observation in observations {
            history.push_existing(observation)?;
        }
        Ok(history)
    }
}

impl From<HealthHistory> for Vec<HealthObservation> {
    fn from(history: HealthHistory) -> Self {
        history.observations
    }
}

impl<'a> IntoIterator for &'a HealthHistory {
    type Item = &'a HealthObservation;
    type IntoIter = std::slice::Iter<'a, HealthObservation>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
