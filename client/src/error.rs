//! Error types for the liquidation harness client.
//!
//! This module defines all error types that can occur while talking to the
//! network, decoding contract results, or recording a position's health.

use health_history::HistoryError;
use thiserror::Error;

/// Main error type for harness operations
#[derive(Error, Debug)]
pub enum HarnessError {
    /// Error communicating with Horizon API
    #[error("Horizon API error: {0}")]
    HorizonError(String),

    /// Error communicating with Soroban RPC
    #[error("Soroban RPC error: {0}")]
    SorobanRpcError(String),

    /// Network communication error
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// Contract call simulation reported a failure
    #[error("Simulation failed: {0}")]
    SimulationFailed(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// Invalid network
    #[error("Invalid network: {0}")]
    InvalidNetwork(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded, retry after {0} seconds")]
    RateLimitExceeded(u64),

    /// Max retries exceeded
    #[error("Max retries ({0}) exceeded")]
    MaxRetriesExceeded(usize),

    /// Invalid response from server
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Contract value decoded but had an unexpected shape
    #[error("XDR decode error: {0}")]
    XdrDecodeError(String),

    /// Malformed base64 XDR payload
    #[error("XDR error: {0}")]
    Xdr(#[from] stellar_xdr::curr::Error),

    /// URL parse error
    #[error("URL parse error: {0}")]
    UrlParseError(#[from] url::ParseError),

    /// Position never became at risk while being watched
    #[error("Watch timed out after {0} seconds")]
    WatchTimeout(u64),

    /// No health query registered for the position
    #[error("Unknown position: {0}")]
    UnknownPosition(String),

    /// Health history rejected an observation or query
    #[error("Health history error: {0}")]
    History(#[from] HistoryError),
}

/// Result type alias for harness operations
pub type Result<T> = std::result::Result<T, HarnessError>;

/// Error context for retryable operations
#[derive(Debug, Clone)]
pub struct RetryContext {
    /// Number of attempts made
    pub attempts: usize,
    /// Last error encountered
    pub last_error: String,
    /// Total time spent retrying (in milliseconds)
    pub total_time_ms: u64,
}

impl RetryContext {
    /// Create a new retry context
    pub fn new() -> Self {
        Self {
            attempts: 0,
            last_error: String::new(),
            total_time_ms: 0,
        }
    }

    /// Record an attempt
    pub fn record_attempt(&mut self, error: &str, duration_ms: u64) {
        self.attempts += 1;
        self.last_error = error.to_string();
        self.total_time_ms += duration_ms;
    }
}

impl Default for RetryContext {
    fn default() -> Self {
        Self::new()
    }
}
