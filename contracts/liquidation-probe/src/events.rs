//! Events published by the probe.
//!
//! Each state-changing entry point publishes its own action event followed by
//! a `HealthRecordedEvent` for the history entry it appended. Off-chain
//! trackers can rebuild the full history from the latter alone.

use soroban_sdk::{contractevent, Address};

use crate::history::ProbeAction;

#[contractevent]
#[derive(Clone, Debug)]
pub struct SuppliedEvent {
    #[topic]
    pub asset: Address,
    pub amount: i128,
}

#[contractevent]
#[derive(Clone, Debug)]
pub struct BorrowedEvent {
    #[topic]
    pub asset: Address,
    pub amount: i128,
    pub rate_mode: u32,
}

#[contractevent]
#[derive(Clone, Debug)]
pub struct PriceUpdatedEvent {
    #[topic]
    pub asset: Address,
    pub new_price: i128,
}

#[contractevent]
#[derive(Clone, Debug)]
pub struct WithdrawnEvent {
    #[topic]
    pub asset: Address,
    pub amount: i128,
}

/// Emitted after every history append.
#[contractevent]
#[derive(Clone, Debug)]
pub struct HealthRecordedEvent {
    pub index: u32,
    pub block_number: u32,
    pub timestamp: u64,
    pub health_factor: u128,
    pub action: ProbeAction,
}
