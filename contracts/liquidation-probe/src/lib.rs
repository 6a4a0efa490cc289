//! # Liquidation Probe
//!
//! Test contract that drives a single position through a lending pool and
//! records the pool's health factor after every interaction. The recorded
//! history shows when the position crosses the liquidation threshold.
//!
//! The probe itself is the borrower: it deposits collateral, holds borrowed
//! funds, and receives withdrawals. The owner funds it and pushes oracle
//! prices through it so price moves land in the same history.

#![no_std]
use soroban_sdk::{contract, contractimpl, token, Address, Env};

mod events;
mod history;
mod pool;
mod storage;

pub use history::{HealthRecord, ProbeAction, NO_DEBT_HEALTH_FACTOR};
pub use storage::{ProbeConfig, ProbeError};

use events::{BorrowedEvent, PriceUpdatedEvent, SuppliedEvent, WithdrawnEvent};
use storage::{get_config, is_initialized, require_owner, set_config};

/// Stable interest rate mode accepted by `borrow`
pub const RATE_MODE_STABLE: u32 = 1;
/// Variable interest rate mode accepted by `borrow`
pub const RATE_MODE_VARIABLE: u32 = 2;


#[contract]
pub struct LiquidationProbe;

#[contractimpl]
impl LiquidationProbe {
    /// Wire the probe to a pool, an oracle and the two assets under test
    ///
    /// # Arguments
    /// * `owner` - Account allowed to drive the probe (must authorize)
    /// * `pool` - Lending pool the probe borrows from
    /// * `oracle` - Price oracle the pool reads
    /// * `collateral_asset` - Asset supplied as collateral
    /// * `debt_asset` - Asset borrowed against it
    ///
    /// # Errors
    /// - `AlreadyInitialized` - The probe was already wired
    pub fn initialize(
        env: Env,
        owner: Address,
        pool: Address,
        oracle: Address,
        collateral_asset: Address,
        debt_asset: Address,
    ) -> Result<(), ProbeError> {
        if is_initialized(&env) {
            return Err(ProbeError::AlreadyInitialized);
        }
        owner.require_auth();

        set_config(
            &env,
            &ProbeConfig {
                owner,
                pool,
                oracle,
                collateral_asset,
                debt_asset,
            },
        );
        Ok(())
    }

    /// Supply collateral to the pool on behalf of the probe
    ///
    /// Pulls `amount` of `asset` from the owner, deposits it into the pool
    /// and records the resulting health factor.
    ///
    /// # Returns
    /// Index of the new history record
    ///
    /// # Errors
    /// - `NotInitialized` - The probe has not been wired
    /// - `InvalidAmount` - Amount is zero or negative
    /// - `UnsupportedAsset` - `asset` is not the configured collateral asset
    /// - `OrderingViolation` - Ledger went backwards since the last record
    pub fn supply(env: Env, asset: Address, amount: i128) -> Result<u32, ProbeError> {
        let config = require_owner(&env)?;
        if amount <= 0 {
            return Err(ProbeError::InvalidAmount);
        }
        if asset != config.collateral_asset {
            return Err(ProbeError::UnsupportedAsset);
        }

        let probe = env.current_contract_address();
        token::Client::new(&env, &asset).transfer(&config.owner, &probe, &amount);
        pool::deposit(&env, &config.pool, &asset, amount);

        SuppliedEvent {
            asset,
            amount,
        }
        .publish(&env);

        history::record(&env, ProbeAction::Supply)
    }

    /// Borrow from the pool against the supplied collateral
    ///
    /// Borrowed funds stay in the probe.
    ///
    /// # Arguments
    /// * `asset` - Asset to borrow
    /// * `amount` - Amount to borrow
    /// * `rate_mode` - `RATE_MODE_STABLE` or `RATE_MODE_VARIABLE`
    ///
    /// # Returns
    /// Index of the new history record
    ///
    /// # Errors
    /// - `NotInitialized` - The probe has not been wired
    /// - `InvalidAmount` - Amount is zero or negative
    /// - `InvalidRateMode` - Unknown interest rate mode
    /// - `UnsupportedAsset` - `asset` is not the configured debt asset
    /// - `OrderingViolation` - Ledger went backwards since the last record
    pub fn borrow(
        env: Env,
        asset: Address,
        amount: i128,
        rate_mode: u32,
    ) -> Result<u32, ProbeError> {
        let config = require_owner(&env)?;
        if amount <= 0 {
            return Err(ProbeError::InvalidAmount);
        }
        if rate_mode != RATE_MODE_STABLE && rate_mode != RATE_MODE_VARIABLE {
            return Err(ProbeError::InvalidRateMode);
        }
        if asset != config.debt_asset {
            return Err(ProbeError::UnsupportedAsset);
        }

        pool::borrow(&env, &config.pool, &asset, amount, rate_mode);

        BorrowedEvent {
            asset,
            amount,
            rate_mode,
        }
        .publish(&env);

        history::record(&env, ProbeAction::Borrow)
    }

    /// Push a new price to the oracle and record the health factor it produces
    ///
    /// # Arguments
    /// * `asset` - Asset to reprice, either the collateral or the debt asset
    /// * `price` - New price, 8 decimals
    ///
    /// # Returns
    /// Index of the new history record
    ///
    /// # Errors
    /// - `NotInitialized` - The probe has not been wired
    /// - `InvalidPrice` - Price is zero or negative
    /// - `UnsupportedAsset` - `asset` is neither configured asset
    /// - `OrderingViolation` - Ledger went backwards since the last record
    pub fn set_price_feed_value(
        env: Env,
        asset: Address,
        price: i128,
    ) -> Result<u32, ProbeError> {
        let config = require_owner(&env)?;
        if price <= 0 {
            return Err(ProbeError::InvalidPrice);
        }
        if asset != config.collateral_asset && asset != config.debt_asset {
            return Err(ProbeError::UnsupportedAsset);
        }

        pool::set_oracle_price(&env, &config.oracle, &asset, price);

        PriceUpdatedEvent {
            asset,
            new_price: price,
        }
        .publish(&env);

        history::record(&env, ProbeAction::PriceUpdate)
    }

    /// Withdraw collateral from the pool and forward it to the owner
    ///
    /// The pool refuses withdrawals that would leave the position unhealthy;
    /// in that case the whole call fails and nothing is recorded.
    ///
    /// # Returns
    /// Index of the new history record
    ///
    /// # Errors
    /// - `NotInitialized` - The probe has not been wired
    /// - `InvalidAmount` - Amount is zero or negative
    /// - `UnsupportedAsset` - `asset` is not the configured collateral asset
    /// - `OrderingViolation` - Ledger went backwards since the last record
    pub fn withdraw(env: Env, asset: Address, amount: i128) -> Result<u32, ProbeError> {
        let config = require_owner(&env)?;
        if amount <= 0 {
            return Err(ProbeError::InvalidAmount);
        }
        if asset != config.collateral_asset {
            return Err(ProbeError::UnsupportedAsset);
        }

        let withdrawn = pool::withdraw(&env, &config.pool, &asset, amount);
        let probe = env.current_contract_address();
        token::Client::new(&env, &asset).transfer(&probe, &config.owner, &withdrawn);

        WithdrawnEvent {
            asset,
            amount: withdrawn,
        }
        .publish(&env);

        history::record(&env, ProbeAction::Withdraw)
    }

    /// Live health factor from the pool, 18 decimals
    pub fn get_health_factor(env: Env) -> Result<u128, ProbeError> {
        let config = get_config(&env)?;
        Ok(pool::get_health_factor(
            &env,
            &config.pool,
            &env.current_contract_address(),
        ))
    }

    /// Number of records in the history
    pub fn get_health_history_length(env: Env) -> u32 {
        history::len(&env)
    }

    /// Record at `index`
    ///
    /// # Errors
    /// - `IndexOutOfRange` - `index` is not below the history length
    pub fn get_health_history(env: Env, index: u32) -> Result<HealthRecord, ProbeError> {
        history::get(&env, index)
    }

    /// Health factor of the most recent record, `None` while the history is empty
    pub fn get_latest_health_factor(env: Env) -> Option<u128> {
        history::latest(&env).map(|record| record.health_factor)
    }

    /// Account allowed to drive the probe
    ///
    /// # Errors
    /// - `NotInitialized` - The probe has not been wired
    pub fn owner(env: Env) -> Result<Address, ProbeError> {
        Ok(get_config(&env)?.owner)
    }

    /// Lending pool the probe borrows from
    ///
    /// # Errors
    /// - `NotInitialized` - The probe has not been wired
    pub fn pool(env: Env) -> Result<Address, ProbeError> {
        Ok(get_config(&env)?.pool)
    }

    /// Price oracle repriced by `set_price_feed_value`
    ///
    /// # Errors
    /// - `NotInitialized` - The probe has not been wired
    pub fn oracle(env: Env) -> Result<Address, ProbeError> {
        Ok(get_config(&env)?.oracle)
    }

    /// Only asset accepted by `supply` and `withdraw`
    ///
    /// # Errors
    /// - `NotInitialized` - The probe has not been wired
    pub fn collateral_asset(env: Env) -> Result<Address, ProbeError> {
        Ok(get_config(&env)?.collateral_asset)
    }

    /// Only asset accepted by `borrow`
    ///
    /// # Errors
    /// - `NotInitialized` - The probe has not been wired
    pub fn debt_asset(env: Env) -> Result<Address, ProbeError> {
        Ok(get_config(&env)?.debt_asset)
    }
}
