//! # On-chain health history
//!
//! Append-only list of the pool's health factor for this probe, written
//! after every state-changing entry point.
//!
//! ## Invariants
//! - Entries are never modified or removed.
//! - Indices are contiguous from 0.
//! - `block_number` and `timestamp` never decrease between adjacent entries.

use soroban_sdk::{contracttype, Env};

use crate::events::HealthRecordedEvent;
use crate::pool;
use crate::storage::{get_config, ProbeDataKey, ProbeError};

/// Health factor reported for positions with no debt
pub const NO_DEBT_HEALTH_FACTOR: u128 = u128::MAX;

/// Interaction that triggered a record
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProbeAction {
    Supply,
    Borrow,
    PriceUpdate,
    Withdraw,
}

/// One history entry
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct HealthRecord {
    /// Ledger sequence at record time
    pub block_number: u32,
    /// Ledger close time, seconds since the Unix epoch
    pub timestamp: u64,
    /// Pool health factor, 18 decimals; `u128::MAX` when there is no debt
    pub health_factor: u128,
    pub action: ProbeAction,
}

pub fn len(env: &Env) -> u32 {
    env.storage()
        .persistent()
        .get(&ProbeDataKey::HistoryLen)
        .unwrap_or(0)
}

pub fn get(env: &Env, index: u32) -> Result<HealthRecord, ProbeError> {
    if index >= len(env) {
        return Err(ProbeError::IndexOutOfRange);
    }
    env.storage()
        .persistent()
        .get(&ProbeDataKey::HistoryEntry(index))
        .ok_or(ProbeError::IndexOutOfRange)
}

pub fn latest(env: &Env) -> Option<HealthRecord> {
    match len(env) {
        0 => None,
        n => get(env, n - 1).ok(),
    }
}

/// Read the probe's current health factor from the pool and append it.
///
/// Returns the index of the new record.
pub fn record(env: &Env, action: ProbeAction) -> Result<u32, ProbeError> {
    let config = get_config(env)?;
    let health_factor =
        pool::get_health_factor(env, &config.pool, &env.current_contract_address());

    let entry = HealthRecord {
        block_number: env.ledger().sequence(),
        timestamp: env.ledger().timestamp(),
        health_factor,
        action,
    };

    if let Some(last) = latest(env) {
        if entry.block_number < last.block_number || entry.timestamp < last.timestamp {
            return Err(ProbeError::OrderingViolation);
        }
    }

    let index = len(env);
    env.storage()
        .persistent()
        .set(&ProbeDataKey::HistoryEntry(index), &entry);
    env.storage()
        .persistent()
        .set(&ProbeDataKey::HistoryLen, &(index + 1));

    HealthRecordedEvent {
        index,
        block_number: entry.block_number,
        timestamp: entry.timestamp,
        health_factor: entry.health_factor,
        action,
    }
    .publish(env);

    Ok(index)
}
