//! Health Factor History
//!
//! Records a lending position's health factor after every state-changing
//! interaction (supply, borrow, collateral price update, withdraw) and exposes
//! read and classification queries for assertion layers.
//!
//! # Features
//!
//! - **Append-only history**: contiguous sequence indices, no mutation after append
//! - **Ordering checks**: block height and timestamp must never go backwards
//! - **No-debt sentinel**: the pool's `u128::MAX` value is a distinct [`HealthFactor::NoDebt`] variant
//! - **Classification**: strictly above 1.0 is healthy, at or below 1.0 is at risk
//!
//! # Quick Start
//!
//! ```rust
//! use health_history::{classify, HealthFactor, HealthHistory, HealthStatus, NO_DEBT_SENTINEL};
//!
//! let mut history = HealthHistory::new();
//! history.record(100, 1000, NO_DEBT_SENTINEL)?;
//! history.record(101, 1010, 2_500_000_000_000_000_000u128)?;
//! let index = history.record(105, 1200, 900_000_000_000_000_000u128)?;
//!
//! let crashed = history.at(index)?;
//! assert_eq!(classify(&crashed), HealthStatus::AtRisk);
//! assert_eq!(
//!     history.latest_health_factor(),
//!     Some(HealthFactor::Ratio(900_000_000_000_000_000))
//! );
//! # Ok::<(), health_history::HistoryError>(())
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::broken_intra_doc_links)]

pub mod error;
pub mod factor;
pub mod history;
pub mod observation;

pub use error::{HistoryError, Result, StampField};
pub use factor::{
    HealthFactor, HealthStatus, HEALTH_FACTOR_DECIMALS, HEALTH_FACTOR_ONE, NO_DEBT_SENTINEL,
};
pub use history::{HealthHistory, StatusTransition};
pub use observation::{classify, HealthObservation};
