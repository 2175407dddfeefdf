//! A local ledger: the `rental_agreement` contract running in-process on
//! a Soroban test environment, with a Stellar asset for deposits and rent.
//!
//! Every confirmed submission closes one ledger. Time only moves when a
//! ledger closes or when [`SandboxLedger::advance`] is called.

use std::fmt::Debug;
use std::time::{Duration, Instant};

use rental_agreement::{RentalAgreement, RentalAgreementClient};
use soroban_sdk::testutils::{Address as _, Ledger};
use soroban_sdk::token::{Client as TokenClient, StellarAssetClient};
use soroban_sdk::{Address, Env};
use tracing::{debug, info, warn};

use crate::config::{LeaseTerms, LedgerConfig};
use crate::error::{QueryError, SubmissionError};
use crate::ledger::{Clock, Confirmation, LeaseLedger};
use crate::Amount;

pub struct SandboxLedger {
    env: Env,
    contract: Address,
    token: Address,
    landlord: Address,
    tenant: Address,
    close_secs: u64,
}

impl SandboxLedger {
    /// Deploys a token and the rental contract, funds the tenant and
    /// initialises the agreement with `terms`.
    pub fn deploy(terms: &LeaseTerms, ledger: &LedgerConfig) -> Result<Self, SubmissionError> {
        let env = Env::default();
        env.mock_all_auths();
        env.ledger().with_mut(|li| li.timestamp = terms.genesis_timestamp);

        let issuer = Address::generate(&env);
        let landlord = Address::generate(&env);
        let tenant = Address::generate(&env);

        let sac = env.register_stellar_asset_contract_v2(issuer);
        let token = sac.address();
        StellarAssetClient::new(&env, &token).mint(&tenant, &Amount::from(terms.tenant_funds));

        let contract = env.register(RentalAgreement, ());
        let this = Self {
            env,
            contract,
            token,
            landlord,
            tenant,
            close_secs: ledger.ledger_close_secs,
        };

        let res = this.client().try_init(
            &this.landlord,
            &this.token,
            &Amount::from(terms.monthly_rent),
            &Amount::from(terms.security_deposit),
            &terms.rental_period,
        );
        outcome(res).map_err(|cause| SubmissionError::Reverted { call: "init", cause })?;
        this.close_ledger();

        info!(
            contract = ?this.contract,
            landlord = ?this.landlord,
            tenant = ?this.tenant,
            "rental agreement deployed"
        );
        Ok(this)
    }

    pub fn env(&self) -> &Env {
        &self.env
    }

    pub fn contract(&self) -> &Address {
        &self.contract
    }

    /// The account the controller signs with.
    pub fn tenant_account(&self) -> &Address {
        &self.tenant
    }

    pub fn landlord_account(&self) -> &Address {
        &self.landlord
    }

    pub fn balance(&self, who: &Address) -> Amount {
        TokenClient::new(&self.env, &self.token).balance(who)
    }

    /// Moves ledger time forward without closing a ledger.
    pub fn advance(&self, secs: u64) {
        self.env
            .ledger()
            .with_mut(|li| li.timestamp = li.timestamp.saturating_add(secs));
        debug!(secs, now = self.env.ledger().timestamp(), "ledger time advanced");
    }

    fn client(&self) -> RentalAgreementClient<'_> {
        RentalAgreementClient::new(&self.env, &self.contract)
    }

    fn close_ledger(&self) {
        let close = self.close_secs;
        self.env.ledger().with_mut(|li| {
            li.sequence_number += 1;
            li.timestamp = li.timestamp.saturating_add(close);
        });
    }

    /// Sends one call signed by the tenant with `value` attached.
    ///
    /// The tenant's balance is checked before sending, the way a node
    /// simulates a transaction before accepting it.
    fn submit<F>(
        &self,
        call: &'static str,
        value: Amount,
        wait: Duration,
        send: F,
    ) -> Result<Confirmation, SubmissionError>
    where
        F: FnOnce(&RentalAgreementClient<'_>) -> Result<(), String>,
    {
        let funds = self.balance(&self.tenant);
        if funds < value {
            warn!(call, funds = %funds, value = %value, "not sent");
            return Err(SubmissionError::Transport {
                call,
                cause: format!("insufficient balance: {funds} available, {value} attached"),
            });
        }

        let sent = Instant::now();
        let receipt = Confirmation {
            ledger: self.env.ledger().sequence(),
            timestamp: self.env.ledger().timestamp(),
        };
        send(&self.client()).map_err(|cause| SubmissionError::Reverted { call, cause })?;
        self.close_ledger();

        if sent.elapsed() > wait {
            warn!(call, ?wait, "confirmation wait exceeded");
            return Err(SubmissionError::Timeout { call, wait });
        }
        Ok(receipt)
    }
}

impl LeaseLedger for SandboxLedger {
    type Identity = Address;

    fn is_active(&self) -> Result<bool, QueryError> {
        query("is_active", self.client().try_is_active())
    }

    fn landlord(&self) -> Result<Address, QueryError> {
        query("landlord", self.client().try_landlord())
    }

    fn tenant(&self) -> Result<Option<Address>, QueryError> {
        query("tenant", self.client().try_tenant())
    }

    fn monthly_rent(&self) -> Result<Amount, QueryError> {
        query("monthly_rent", self.client().try_monthly_rent())
    }

    fn security_deposit(&self) -> Result<Amount, QueryError> {
        query("security_deposit", self.client().try_security_deposit())
    }

    fn rental_period(&self) -> Result<u32, QueryError> {
        query("rental_period", self.client().try_rental_period())
    }

    fn start_timestamp(&self) -> Result<u64, QueryError> {
        query("start_timestamp", self.client().try_start_timestamp())
    }

    fn last_payment(&self) -> Result<u64, QueryError> {
        query("last_payment", self.client().try_last_payment())
    }

    fn start_lease(&self, value: Amount, wait: Duration) -> Result<Confirmation, SubmissionError> {
        self.submit("start_rental", value, wait, |c| outcome(c.try_start_rental(&self.tenant, &value)))
    }

    fn pay_rent(&self, value: Amount, wait: Duration) -> Result<Confirmation, SubmissionError> {
        self.submit("pay_rent", value, wait, |c| outcome(c.try_pay_rent(&self.tenant, &value)))
    }

    fn end_lease(&self, wait: Duration) -> Result<Confirmation, SubmissionError> {
        self.submit("end_rental", 0, wait, |c| outcome(c.try_end_rental(&self.tenant)))
    }
}

impl Clock for SandboxLedger {
    fn now(&self) -> Result<u64, QueryError> {
        Ok(self.env.ledger().timestamp())
    }
}

/// Flattens a `try_*` client result: the outer layer is the invocation,
/// the inner one the decoding of the return value.
fn outcome<T, C, E, I>(res: Result<Result<T, C>, Result<E, I>>) -> Result<T, String>
where
    C: Debug,
    E: Debug,
    I: Debug,
{
    match res {
        Ok(Ok(v)) => Ok(v),
        Ok(Err(conv)) => Err(format!("undecodable return value: {conv:?}")),
        Err(Ok(err)) => Err(format!("{err:?}")),
        Err(Err(invoke)) => Err(format!("invocation aborted: {invoke:?}")),
    }
}

fn query<T, C, E, I>(call: &'static str, res: Result<Result<T, C>, Result<E, I>>) -> Result<T, QueryError>
where
    C: Debug,
    E: Debug,
    I: Debug,
{
    outcome(res).map_err(|cause| QueryError::new(call, cause))
}
