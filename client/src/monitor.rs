//! Polling a tracked position until it becomes liquidatable.
//!
//! Used after a price crash: the pool's view of the position may lag the
//! oracle update by a few ledgers, so the watcher keeps recording `Poll`
//! observations until one classifies as at risk or the timeout elapses.

use crate::config::HarnessConfig;
use crate::error::{HarnessError, Result};
use crate::retry::RetryStrategy;
use crate::tracker::PositionTracker;
use crate::types::{ObservationReport, PositionAction};
use health_history::HealthStatus;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Watch options
#[derive(Debug, Clone)]
pub struct WatchOptions {
    /// Delay between polls
    pub poll_interval: Duration,
    /// Give up after this long
    pub timeout: Duration,
}

impl WatchOptions {
    /// Create from harness config
    pub fn from_config(config: &HarnessConfig) -> Self {
        Self {
            poll_interval: Duration::from_millis(config.watch_poll_interval_ms),
            timeout: Duration::from_secs(config.watch_timeout_secs),
        }
    }

    /// Set custom poll interval
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set custom timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// How a watch ended
#[derive(Debug, Clone)]
pub enum WatchOutcome {
    /// The position was classified as at risk
    AtRisk(ObservationReport),
    /// The timeout elapsed first
    Timeout {
        /// Observations recorded while watching
        polls: usize,
        /// Time spent watching
        elapsed: Duration,
    },
}

impl WatchOutcome {
    /// The at-risk observation, or `WatchTimeout`
    pub fn into_at_risk(self) -> Result<ObservationReport> {
        match self {
            WatchOutcome::AtRisk(report) => Ok(report),
            WatchOutcome::Timeout { elapsed, .. } => {
                Err(HarnessError::WatchTimeout(elapsed.as_secs()))
            }
        }
    }
}

/// Polls positions until they become liquidatable
#[derive(Debug, Default, Clone, Copy)]
pub struct PositionMonitor;

impl PositionMonitor {
    /// Create a monitor
    pub fn new() -> Self {
        Self
    }

    /// Record `Poll` observations until the position is at risk or `options.timeout` elapses.
    ///
    /// Transient read failures are logged and polling continues; anything
    /// else, including a rejected observation, ends the watch with an error.
    pub async fn watch(
        &self,
        tracker: &mut PositionTracker,
        options: WatchOptions,
    ) -> Result<WatchOutcome> {
        info!(
            "Watching position {} (timeout: {:?})",
            tracker.position(),
            options.timeout
        );

        let start = Instant::now();
        let mut polls = 0;

        loop {
            match tracker.observe(PositionAction::Poll).await {
                Ok(report) if report.status == HealthStatus::AtRisk => {
                    info!(
                        "Position {} at risk after {} polls (health factor: {})",
                        tracker.position(),
                        polls + 1,
                        report.health_factor()
                    );
                    return Ok(WatchOutcome::AtRisk(report));
                }
                Ok(report) => {
                    polls += 1;
                    debug!(
                        "Position {} still healthy (health factor: {})",
                        tracker.position(),
                        report.health_factor()
                    );
                }
                Err(e) if RetryStrategy::is_retryable(&e) => {
                    warn!("Poll of {} failed: {}", tracker.position(), e);
                }
                Err(e) => return Err(e),
            }

            let elapsed = start.elapsed();
            if elapsed >= options.timeout {
                warn!(
                    "Watch of {} timed out after {} polls",
                    tracker.position(),
                    polls
                );
                return Ok(WatchOutcome::Timeout { polls, elapsed });
            }

            sleep(options.poll_interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::tests::{ScriptedClock, ScriptedSource, HF_0_9, HF_2_5};
    use crate::types::PositionId;
    use assert_matches::assert_matches;
    use health_history::HistoryError;
    use std::sync::Arc;

    fn fast_options() -> WatchOptions {
        WatchOptions::from_config(&HarnessConfig::testnet())
            .with_poll_interval(Duration::from_millis(5))
            .with_timeout(Duration::from_millis(60))
    }

    fn tracker(source: ScriptedSource, clock: ScriptedClock) -> PositionTracker {
        PositionTracker::new(PositionId::from("CPROBE"), Arc::new(source), Arc::new(clock))
    }

    #[test]
    fn test_watch_options_from_config() {
        let config = HarnessConfig::testnet().with_watch_config(2000, 30);
        let options = WatchOptions::from_config(&config);
        assert_eq!(options.poll_interval, Duration::from_millis(2000));
        assert_eq!(options.timeout, Duration::from_secs(30));
    }

    #[tokio::test]
    async fn test_watch_stops_when_at_risk() {
        let mut tracker = tracker(
            ScriptedSource::new([HF_2_5, HF_2_5, HF_0_9]),
            ScriptedClock::ticking(3),
        );

        let outcome = PositionMonitor::new()
            .watch(&mut tracker, fast_options())
            .await
            .unwrap();

        let report = outcome.into_at_risk().unwrap();
        assert_eq!(report.observation.sequence_index(), 2);
        assert_eq!(tracker.history().len(), 3);
    }

    #[tokio::test]
    async fn test_watch_times_out_while_healthy() {
        let mut tracker = tracker(
            ScriptedSource::new(std::iter::repeat(HF_2_5).take(1000)),
            ScriptedClock::ticking(1000),
        );

        let outcome = PositionMonitor::new()
            .watch(&mut tracker, fast_options())
            .await
            .unwrap();

        assert_matches!(outcome, WatchOutcome::Timeout { polls, .. } if polls > 0);
        assert_eq!(tracker.history().transitions().len(), 0);
        assert_matches!(
            outcome.into_at_risk(),
            Err(HarnessError::WatchTimeout(_))
        );
    }

    #[tokio::test]
    async fn test_watch_skips_transient_failures() {
        let source = ScriptedSource::from_results(vec![
            Ok(HF_2_5),
            Err(HarnessError::RateLimitExceeded(1)),
            Ok(HF_0_9),
        ]);
        let mut tracker = tracker(source, ScriptedClock::ticking(3));

        let report = PositionMonitor::new()
            .watch(&mut tracker, fast_options())
            .await
            .unwrap()
            .into_at_risk()
            .unwrap();

        assert_eq!(report.observation.sequence_index(), 1);
        assert_eq!(report.observation.block_height(), 102);
    }

    #[tokio::test]
    async fn test_watch_ends_on_ordering_violation() {
        let mut tracker = tracker(
            ScriptedSource::new([HF_2_5, HF_2_5]),
            ScriptedClock::new([(50, 1_700_000_000), (49, 1_700_000_005)]),
        );

        assert_matches!(
            PositionMonitor::new().watch(&mut tracker, fast_options()).await,
            Err(HarnessError::History(HistoryError::OrderingViolation { .. }))
        );
        assert_eq!(tracker.history().len(), 1);
    }
}
