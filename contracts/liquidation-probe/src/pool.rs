//! Calls into the external lending pool and price oracle.
//!
//! The pool is addressed by function name only. It must expose:
//! - `deposit(on_behalf_of, asset, amount)`, pulling `amount` of `asset` from `on_behalf_of`
//! - `borrow(on_behalf_of, asset, amount, rate_mode)`, sending `amount` to `on_behalf_of`
//! - `withdraw(on_behalf_of, asset, amount) -> i128`, sending the withdrawn amount to `on_behalf_of`
//! - `get_health_factor(user) -> u128` with 18 decimals, `u128::MAX` meaning no debt
//!
//! A pool rejection aborts the whole probe call, so nothing is recorded.

use soroban_sdk::{
    auth::{ContractContext, InvokerContractAuthEntry, SubContractInvocation},
    vec, Address, Env, IntoVal, Symbol, Val, Vec,
};

pub fn deposit(env: &Env, pool: &Address, asset: &Address, amount: i128) {
    let probe = env.current_contract_address();

    // The pool pulls the tokens from the probe, one call below us.
    let transfer_args: Vec<Val> = (probe.clone(), pool.clone(), amount).into_val(env);
    env.authorize_as_current_contract(vec![
        env,
        InvokerContractAuthEntry::Contract(SubContractInvocation {
            context: ContractContext {
                contract: asset.clone(),
                fn_name: Symbol::new(env, "transfer"),
                args: transfer_args,
            },
            sub_invocations: Vec::new(env),
        }),
    ]);

    env.invoke_contract::<()>(
        pool,
        &Symbol::new(env, "deposit"),
        (probe, asset.clone(), amount).into_val(env),
    );
}

pub fn borrow(env: &Env, pool: &Address, asset: &Address, amount: i128, rate_mode: u32) {
    env.invoke_contract::<()>(
        pool,
        &Symbol::new(env, "borrow"),
        (env.current_contract_address(), asset.clone(), amount, rate_mode).into_val(env),
    );
}

pub fn withdraw(env: &Env, pool: &Address, asset: &Address, amount: i128) -> i128 {
    env.invoke_contract(
        pool,
        &Symbol::new(env, "withdraw"),
        (env.current_contract_address(), asset.clone(), amount).into_val(env),
    )
}

pub fn get_health_factor(env: &Env, pool: &Address, user: &Address) -> u128 {
    env.invoke_contract(
        pool,
        &Symbol::new(env, "get_health_factor"),
        (user.clone(),).into_val(env),
    )
}

pub fn set_oracle_price(env: &Env, oracle: &Address, asset: &Address, price: i128) {
    env.invoke_contract::<()>(
        oracle,
        &Symbol::new(env, "set_price"),
        (asset.clone(), price).into_val(env),
    );
}
