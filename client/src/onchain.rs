//! Rebuild a probe's health history from its `HealthRecordedEvent`s.
//!
//! The probe publishes one event per history append, with a symbol-keyed map
//! payload `{ action, block_number, health_factor, index, timestamp }`. Replaying
//! those events through [`HealthHistory::record`] re-checks ordering, so a
//! rebuilt history satisfies the same invariants as one recorded live.

use crate::error::{HarnessError, Result};
use crate::scval;
use crate::soroban_rpc::ContractEvent;
use crate::types::PositionAction;
use health_history::{HealthFactor, HealthHistory, HistoryError};
use serde::{Deserialize, Serialize};
use stellar_xdr::curr::ScVal;

/// First topic of every health record event
pub const HEALTH_RECORDED_EVENT: &str = "health_recorded_event";

/// One decoded `HealthRecordedEvent`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedHealth {
    /// Index of the on-chain history entry
    pub index: u32,
    /// Ledger sequence at record time
    pub block_number: u32,
    /// Ledger close time
    pub timestamp: u64,
    /// Health factor read from the pool
    pub health_factor: HealthFactor,
    /// Probe entry point that produced the record
    pub action: PositionAction,
}

impl RecordedHealth {
    /// Decode the data payload of a `HealthRecordedEvent`
    pub fn from_event(event: &ContractEvent) -> Result<Self> {
        let data = scval::decode(&event.value)?;

        let action = match scval::enum_variant(scval::map_field(&data, "action")?)?.as_str() {
            "Supply" => PositionAction::Supply,
            "Borrow" => PositionAction::Borrow,
            "PriceUpdate" => PositionAction::PriceUpdate,
            "Withdraw" => PositionAction::Withdraw,
            other => {
                return Err(HarnessError::XdrDecodeError(format!(
                    "Unknown probe action {}",
                    other
                )))
            }
        };

        Ok(Self {
            index: field_u32(&data, "index")?,
            block_number: field_u32(&data, "block_number")?,
            timestamp: u64::try_from(scval::to_u128(scval::map_field(&data, "timestamp")?)?)
                .map_err(|_| HarnessError::XdrDecodeError("timestamp overflows u64".to_string()))?,
            health_factor: HealthFactor::from_raw(scval::to_u128(scval::map_field(
                &data,
                "health_factor",
            )?)?),
            action,
        })
    }
}

fn field_u32(data: &ScVal, name: &str) -> Result<u32> {
    u32::try_from(scval::to_u128(scval::map_field(data, name)?)?)
        .map_err(|_| HarnessError::XdrDecodeError(format!("{} overflows u32", name)))
}

/// Topic filter selecting health record events, for `getEvents`
pub fn health_recorded_topic() -> Result<Vec<String>> {
    Ok(vec![scval::encode(&scval::symbol(HEALTH_RECORDED_EVENT)?)?])
}

/// Replay decoded records, in index order, into a fresh history.
///
/// Records must cover indices `0..n` without gaps; fetching from a ledger after
/// the probe's first record yields `NonContiguousIndex`.
pub fn rebuild_history(records: impl IntoIterator<Item = RecordedHealth>) -> Result<HealthHistory> {
    let mut records: Vec<RecordedHealth> = records.into_iter().collect();
    records.sort_by_key(|record| record.index);

    let mut history = HealthHistory::new();
    for record in records {
        let expected = history.len();
        let found = record.index as usize;
        if found != expected {
            return Err(HistoryError::NonContiguousIndex { expected, found }.into());
        }
        history.record(
            u64::from(record.block_number),
            record.timestamp,
            record.health_factor,
        )?;
    }
    Ok(history)
}
