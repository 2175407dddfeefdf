#![no_std]
use soroban_sdk::{
    contract, contracterror, contractimpl, panic_with_error, symbol_short, token, Address, Env,
    Symbol, TryFromVal, Val,
};


/// Flat 30-day month. Rental periods and rent windows are counted in these.
pub const SECONDS_PER_MONTH: u64 = 30 * 24 * 60 * 60;

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum Error {
    NotInitialized = 1,
    AlreadyInitialized = 2,
    InvalidTerms = 3,
    AlreadyActive = 4,
    NotActive = 5,
    WrongAmount = 6,
    PeriodEnded = 7,
    PeriodNotElapsed = 8,
    Unauthorized = 9,
}

/// End of a rental that started at `start` and runs `period` months.
pub fn expected_end_time(start: u64, period: u32) -> u64 {
    start.saturating_add((period as u64).saturating_mul(SECONDS_PER_MONTH))
}

#[contract]
pub struct RentalAgreement;

#[contractimpl]
impl RentalAgreement {
    // instance storage keys
    fn k_landlord() -> Symbol { symbol_short!("landlord") }
    fn k_tenant()   -> Symbol { symbol_short!("tenant") }
    fn k_token()    -> Symbol { symbol_short!("token") }
    fn k_rent()     -> Symbol { symbol_short!("rent") }
    fn k_deposit()  -> Symbol { symbol_short!("deposit") }
    fn k_period()   -> Symbol { symbol_short!("period") }
    fn k_active()   -> Symbol { symbol_short!("active") }
    fn k_start()    -> Symbol { symbol_short!("start") }
    fn k_paid()     -> Symbol { symbol_short!("last_pay") }

    /// One-time initializer. Terms are fixed for the life of the contract.
    pub fn init(
        e: Env,
        landlord: Address,
        token: Address,
        monthly_rent: i128,
        security_deposit: i128,
        rental_period: u32,
    ) -> Result<(), Error> {
        if e.storage().instance().has(&Self::k_landlord()) {
            return Err(Error::AlreadyInitialized);
        }
        if monthly_rent < 0 || security_deposit < 0 || rental_period == 0 {
            return Err(Error::InvalidTerms);
        }
        landlord.require_auth();

        e.storage().instance().set(&Self::k_landlord(), &landlord);
        e.storage().instance().set(&Self::k_token(),    &token);
        e.storage().instance().set(&Self::k_rent(),     &monthly_rent);
        e.storage().instance().set(&Self::k_deposit(),  &security_deposit);
        e.storage().instance().set(&Self::k_period(),   &rental_period);
        e.storage().instance().set(&Self::k_active(),   &false);
        e.storage().instance().set(&Self::k_start(),    &0u64);
        e.storage().instance().set(&Self::k_paid(),     &0u64);
        Ok(())
    }

    /// Tenant activates the rental by paying exactly the security deposit
    /// into the contract.
    pub fn start_rental(e: Env, tenant: Address, amount: i128) -> Result<(), Error> {
        require_init(&e)?;
        tenant.require_auth();

        if Self::is_active(e.clone()) { return Err(Error::AlreadyActive); }
        if amount != Self::security_deposit(e.clone()) { return Err(Error::WrongAmount); }

        // the token contract enforces tenant.require_auth() on the transfer itself
        let token = token::Client::new(&e, &Self::token(e.clone()));
        token.transfer(&tenant, &e.current_contract_address(), &amount);

        let now = e.ledger().timestamp();
        e.storage().instance().set(&Self::k_tenant(), &tenant);
        e.storage().instance().set(&Self::k_active(), &true);
        e.storage().instance().set(&Self::k_start(),  &now);
        e.storage().instance().set(&Self::k_paid(),   &now);

        e.events().publish((symbol_short!("started"), tenant), (amount, now));
        Ok(())
    }

    /// Recorded tenant pays one month of rent straight to the landlord.
    pub fn pay_rent(e: Env, tenant: Address, amount: i128) -> Result<(), Error> {
        require_init(&e)?;
        tenant.require_auth();

        if !Self::is_active(e.clone()) { return Err(Error::NotActive); }
        if Self::tenant(e.clone()) != Some(tenant.clone()) { return Err(Error::Unauthorized); }

        let now = e.ledger().timestamp();
        let end = expected_end_time(Self::start_timestamp(e.clone()), Self::rental_period(e.clone()));
        if now >= end { return Err(Error::PeriodEnded); }
        if amount != Self::monthly_rent(e.clone()) { return Err(Error::WrongAmount); }

        let token = token::Client::new(&e, &Self::token(e.clone()));
        token.transfer(&tenant, &Self::landlord(e.clone()), &amount);

        e.storage().instance().set(&Self::k_paid(), &now);

        e.events().publish((symbol_short!("rent"), tenant), (amount, now));
        Ok(())
    }

    /// Landlord or tenant closes an elapsed rental; the deposit goes back
    /// to the tenant.
    pub fn end_rental(e: Env, caller: Address) -> Result<(), Error> {
        require_init(&e)?;
        caller.require_auth();

        if !Self::is_active(e.clone()) { return Err(Error::NotActive); }
        let tenant = match Self::tenant(e.clone()) {
            Some(t) => t,
            None => return Err(Error::NotActive),
        };
        if caller != tenant && caller != Self::landlord(e.clone()) {
            return Err(Error::Unauthorized);
        }

        let now = e.ledger().timestamp();
        let end = expected_end_time(Self::start_timestamp(e.clone()), Self::rental_period(e.clone()));
        if now < end { return Err(Error::PeriodNotElapsed); }

        let deposit = Self::security_deposit(e.clone());
        let token = token::Client::new(&e, &Self::token(e.clone()));
        token.transfer(&e.current_contract_address(), &tenant, &deposit);

        e.storage().instance().set(&Self::k_active(), &false);

        e.events().publish((symbol_short!("ended"), tenant), (deposit, now));
        Ok(())
    }

    pub fn is_active(e: Env) -> bool {
        read(&e, &Self::k_active())
    }

    pub fn landlord(e: Env) -> Address {
        read(&e, &Self::k_landlord())
    }

    /// `None` until the first rental starts.
    pub fn tenant(e: Env) -> Option<Address> {
        require_init(&e).unwrap_or_else(|err| panic_with_error!(&e, err));
        e.storage().instance().get(&Self::k_tenant())
    }

    pub fn token(e: Env) -> Address {
        read(&e, &Self::k_token())
    }

    pub fn monthly_rent(e: Env) -> i128 {
        read(&e, &Self::k_rent())
    }

    pub fn security_deposit(e: Env) -> i128 {
        read(&e, &Self::k_deposit())
    }

    /// Months.
    pub fn rental_period(e: Env) -> u32 {
        read(&e, &Self::k_period())
    }

    /// Ledger time of the most recent start; stale once the rental ends.
    pub fn start_timestamp(e: Env) -> u64 {
        read(&e, &Self::k_start())
    }

    /// Ledger time of the most recent rent payment, or of the start when
    /// no rent has been paid since.
    pub fn last_payment(e: Env) -> u64 {
        read(&e, &Self::k_paid())
    }
}

fn require_init(e: &Env) -> Result<(), Error> {
    if e.storage().instance().has(&RentalAgreement::k_landlord()) {
        Ok(())
    } else {
        Err(Error::NotInitialized)
    }
}

fn read<V: TryFromVal<Env, Val>>(e: &Env, key: &Symbol) -> V {
    e.storage()
        .instance()
        .get(key)
        .unwrap_or_else(|| panic_with_error!(e, Error::NotInitialized))
}
