//! Probe configuration storage and access control.

use soroban_sdk::{contracterror, contracttype, Address, Env};

/// Errors returned by the liquidation probe.
#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum ProbeError {
    /// `initialize` has already been called
    AlreadyInitialized = 1,
    /// `initialize` has not been called yet
    NotInitialized = 2,
    /// Amount is zero or negative
    InvalidAmount = 3,
    /// Interest rate mode is neither stable (1) nor variable (2)
    InvalidRateMode = 4,
    /// Price is zero or negative
    InvalidPrice = 5,
    /// History index is past the last record
    IndexOutOfRange = 6,
    /// Ledger sequence or timestamp went backwards since the last record
    OrderingViolation = 7,
    /// Asset is not the collateral or debt asset the probe was wired with
    UnsupportedAsset = 8,
}

/// Storage keys for probe data.
#[contracttype]
#[derive(Clone)]
pub enum ProbeDataKey {
    /// Wiring set once at initialization
    Config,
    /// Number of health records
    HistoryLen,
    /// Health record by index
    HistoryEntry(u32),
}

/// Contracts the probe talks to, plus its owner.
#[contracttype]
#[derive(Clone, Debug, PartialEq)]
pub struct ProbeConfig {
    pub owner: Address,
    pub pool: Address,
    pub oracle: Address,
    pub collateral_asset: Address,
    pub debt_asset: Address,
}

pub fn is_initialized(env: &Env) -> bool {
    env.storage().persistent().has(&ProbeDataKey::Config)
}

pub fn set_config(env: &Env, config: &ProbeConfig) {
    env.storage().persistent().set(&ProbeDataKey::Config, config);
}

pub fn get_config(env: &Env) -> Result<ProbeConfig, ProbeError> {
    env.storage()
        .persistent()
        .get(&ProbeDataKey::Config)
        .ok_or(ProbeError::NotInitialized)
}

/// Load the config and require the owner's authorization.
pub fn require_owner(env: &Env) -> Result<ProbeConfig, ProbeError> {
    let config = get_config(env)?;
    config.owner.require_auth();
    Ok(config)
}
