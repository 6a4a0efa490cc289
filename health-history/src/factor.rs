//! Fixed-point health factor values and their classification.
//!
//! Lending pools report health factors as unsigned integers with 18 fractional
//! digits, reserving the maximum integer for positions that carry no debt.
//! [`HealthFactor`] keeps that sentinel as its own variant so it can never be
//! mistaken for a computed ratio, while still converting losslessly to and
//! from the wire integer.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

/// Number of fractional decimal digits in a raw health factor
pub const HEALTH_FACTOR_DECIMALS: u32 = 18;

/// Raw value representing a health factor of exactly 1.0
pub const HEALTH_FACTOR_ONE: u128 = 1_000_000_000_000_000_000;

/// Raw sentinel reported for positions with no open debt
pub const NO_DEBT_SENTINEL: u128 = u128::MAX;

/// Digits shown after the decimal point when displaying a ratio
const DISPLAY_DECIMALS: u32 = 4;

/// Health factor of a borrowing position.
///
/// `Ratio` orders below `NoDebt`, so the minimum over a history is always the
/// riskiest observation.
///
/// Serialises as the raw wire integer in decimal string form. JSON numbers
/// cannot carry the full `u128` range, and the sentinel is `u128::MAX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum HealthFactor {
    /// Collateral-to-debt ratio scaled by 10^18
    Ratio(u128),
    /// No open debt; the health factor is unbounded
    NoDebt,
}

impl HealthFactor {
    /// Interpret a raw wire value, mapping the sentinel to [`HealthFactor::NoDebt`]
    pub fn from_raw(raw: u128) -> Self {
        if raw == NO_DEBT_SENTINEL {
            HealthFactor::NoDebt
        } else {
            HealthFactor::Ratio(raw)
        }
    }

    /// Raw wire value, with [`HealthFactor::NoDebt`] mapped back to the sentinel
    pub fn raw(&self) -> u128 {
        match self {
            HealthFactor::Ratio(value) => *value,
            HealthFactor::NoDebt => NO_DEBT_SENTINEL,
        }
    }

    /// Whether this is the no-debt sentinel
    pub fn is_no_debt(&self) -> bool {
        matches!(self, HealthFactor::NoDebt)
    }

    /// Classify this health factor.
    ///
    /// Exactly 1.0 is treated as at risk: pools in this family allow
    /// liquidation at or below 1.0.
    pub fn status(&self) -> HealthStatus {
        match self {
            HealthFactor::NoDebt => HealthStatus::Healthy,
            HealthFactor::Ratio(value) if *value > HEALTH_FACTOR_ONE => HealthStatus::Healthy,
            HealthFactor::Ratio(_) => HealthStatus::AtRisk,
        }
    }
}

impl From<u128> for HealthFactor {
    fn from(raw: u128) -> Self {
        HealthFactor::from_raw(raw)
    }
}

impl From<HealthFactor> for u128 {
    fn from(factor: HealthFactor) -> Self {
        factor.raw()
    }
}

impl FromStr for HealthFactor {
    type Err = ParseIntError;

    /// Parse a raw wire value written as a decimal integer
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        s.parse::<u128>().map(HealthFactor::from_raw)
    }
}

impl TryFrom<String> for HealthFactor {
    type Error = ParseIntError;

    fn try_from(raw: String) -> std::result::Result<Self, Self::Error> {
        raw.parse()
    }
}

impl From<HealthFactor> for String {
    fn from(factor: HealthFactor) -> Self {
        factor.raw().to_string()
    }
}

impl fmt::Display for HealthFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HealthFactor::NoDebt => write!(f, "no debt"),
            HealthFactor::Ratio(value) => {
                let whole = value / HEALTH_FACTOR_ONE;
                let divisor = 10u128.pow(HEALTH_FACTOR_DECIMALS - DISPLAY_DECIMALS);
                let fraction = (value % HEALTH_FACTOR_ONE) / divisor;
                write!(
                    f,
                    "{}.{:0width$}",
                    whole,
                    fraction,
                    width = DISPLAY_DECIMALS as usize
                )
            }
        }
    }
}

/// Liquidation-risk classification of a health factor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    /// Strictly above 1.0, or no debt
    Healthy,
    /// At or below 1.0; eligible for liquidation
    AtRisk,
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HealthStatus::Healthy => write!(f, "HEALTHY"),
            HealthStatus::AtRisk => write!(f, "AT_RISK"),
        }
    }
}
