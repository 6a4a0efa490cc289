//! # Mock Price Oracle
//!
//! Owner-controlled price feed used by the liquidation harness to move
//! collateral prices on demand. Prices use 8 decimals (`100_000_000` = 1.0 USD),
//! the same scale the lending pool reads.
//!
//! Unset assets report a price of 0 rather than failing, so a pool reading
//! an unknown asset values it at nothing.

#![no_std]
use soroban_sdk::{contract, contracterror, contractevent, contractimpl, contracttype, Address, Env};

/// Decimals of every price returned by this oracle
pub const PRICE_DECIMALS: u32 = 8;

/// Errors returned by the mock oracle
#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum OracleError {
    AlreadyInitialized = 1,
    NotInitialized = 2,
    InvalidPrice = 3,
}

/// Storage keys for oracle data
#[contracttype]
#[derive(Clone)]
pub enum OracleDataKey {
    Owner,
    Price(Address),
}

/// Stored price with the ledger time it was set
#[contracttype]
#[derive(Clone, Debug, PartialEq)]
pub struct PriceData {
    pub price: i128,
    pub updated_at: u64,
}

/// Emitted whenever the owner sets a price
#[contractevent]
#[derive(Clone, Debug)]
pub struct PriceSetEvent {
    #[topic]
    pub asset: Address,
    pub price: i128,
    pub timestamp: u64,
}

#[contract]
pub struct MockOracle;

#[contractimpl]
impl MockOracle {
    /// Initialize the oracle with its owner
    ///
    /// # Errors
    /// - `AlreadyInitialized` - An owner has already been set
    pub fn initialize(env: Env, owner: Address) -> Result<(), OracleError> {
        if env.storage().persistent().has(&OracleDataKey::Owner) {
            return Err(OracleError::AlreadyInitialized);
        }
        owner.require_auth();
        env.storage().persistent().set(&OracleDataKey::Owner, &owner);
        Ok(())
    }

    /// Owner allowed to set prices
    pub fn owner(env: Env) -> Result<Address, OracleError> {
        get_owner(&env)
    }

    /// Set the price of `asset` (owner only)
    ///
    /// # Arguments
    /// * `asset` - The priced asset
    /// * `price` - USD price with 8 decimals, must be positive
    ///
    /// # Errors
    /// - `NotInitialized` - No owner set
    /// - `InvalidPrice` - Price is zero or negative
    pub fn set_price(env: Env, asset: Address, price: i128) -> Result<(), OracleError> {
        let owner = get_owner(&env)?;
        owner.require_auth();

        if price <= 0 {
            return Err(OracleError::InvalidPrice);
        }

        let timestamp = env.ledger().timestamp();
        env.storage().persistent().set(
            &OracleDataKey::Price(asset.clone()),
            &PriceData {
                price,
                updated_at: timestamp,
            },
        );

        PriceSetEvent {
            asset,
            price,
            timestamp,
        }
        .publish(&env);
        Ok(())
    }

    /// Current price of `asset`; 0 if never set
    pub fn get_price(env: Env, asset: Address) -> i128 {
        get_price_data(&env, &asset).map_or(0, |data| data.price)
    }

    /// Ledger time the price of `asset` was last set
    pub fn last_updated(env: Env, asset: Address) -> Option<u64> {
        get_price_data(&env, &asset).map(|data| data.updated_at)
    }

    /// Price decimals
    pub fn decimals(_env: Env) -> u32 {
        PRICE_DECIMALS
    }
}

fn get_owner(env: &Env) -> Result<Address, OracleError> {
    env.storage()
        .persistent()
        .get(&OracleDataKey::Owner)
        .ok_or(OracleError::NotInitialized)
}

fn get_price_data(env: &Env, asset: &Address) -> Option<PriceData> {
    env.storage()
        .persistent()
        .get(&OracleDataKey::Price(asset.clone()))
}
