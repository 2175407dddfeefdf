//! The lease lifecycle controller.
//!
//! Holds no lease state of its own. Every action re-reads the ledger,
//! evaluates the guards in [`crate::policy`], and submits at most one call.
//! Nothing is retried here; after a failed submission the caller should
//! re-query before trying again.

use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::error::{ControllerError, Rejection, SubmissionError};
use crate::ledger::{Clock, Confirmation, LeaseLedger};
use crate::policy::{self, ActiveLease, LeaseState, RentWindow};
use crate::Amount;

pub const DEFAULT_CONFIRMATION_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionRequest {
    StartLease,
    PayRent,
    EndLease,
    QueryInfo,
}

impl ActionRequest {
    pub fn name(&self) -> &'static str {
        match self {
            ActionRequest::StartLease => "start_lease",
            ActionRequest::PayRent => "pay_rent",
            ActionRequest::EndLease => "end_lease",
            ActionRequest::QueryInfo => "query_info",
        }
    }
}

/// A submitted and confirmed action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Accepted {
    pub receipt: Confirmation,
    /// Value attached to the call; zero for `end_lease`.
    pub amount: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaseInfo<Id> {
    pub landlord: Id,
    pub tenant: Option<Id>,
    pub monthly_rent: Amount,
    pub security_deposit: Amount,
    pub rental_period: u32,
    pub is_active: bool,
}

/// Result of [`LeaseController::execute`]. Guard rejections are expected
/// and land here; transport and ledger failures stay errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome<Id> {
    Started(Accepted),
    RentPaid(Accepted),
    Ended(Accepted),
    Info(LeaseInfo<Id>),
    Rejected(Rejection),
}

pub struct LeaseController<L> {
    ledger: L,
    rent_window: RentWindow,
    confirmation_timeout: Duration,
}

impl<L> LeaseController<L>
where
    L: LeaseLedger + Clock,
{
    pub fn new(ledger: L) -> Self {
        Self {
            ledger,
            rent_window: RentWindow::default(),
            confirmation_timeout: DEFAULT_CONFIRMATION_TIMEOUT,
        }
    }

    pub fn with_rent_window(mut self, rent_window: RentWindow) -> Self {
        self.rent_window = rent_window;
        self
    }

    pub fn with_confirmation_timeout(mut self, timeout: Duration) -> Self {
        self.confirmation_timeout = timeout;
        self
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn rent_window(&self) -> RentWindow {
        self.rent_window
    }

    pub fn execute(&self, request: ActionRequest) -> Result<ActionOutcome<L::Identity>, ControllerError> {
        let res = match request {
            ActionRequest::StartLease => self.start_lease().map(ActionOutcome::Started),
            ActionRequest::PayRent => self.pay_rent().map(ActionOutcome::RentPaid),
            ActionRequest::EndLease => self.end_lease().map(ActionOutcome::Ended),
            ActionRequest::QueryInfo => self.query_info().map(ActionOutcome::Info),
        };
        match res {
            Err(ControllerError::Rejected(reason)) => Ok(ActionOutcome::Rejected(reason)),
            other => other,
        }
    }

    /// Pays the security deposit and activates the rental.
    pub fn start_lease(&self) -> Result<Accepted, ControllerError> {
        let action = ActionRequest::StartLease;
        let is_active = self.ledger.is_active()?;
        policy::check_start(is_active).map_err(|r| rejected(action, r))?;

        let deposit = self.ledger.security_deposit()?;
        info!(action = action.name(), amount = %deposit, "submitting");
        let receipt = self
            .ledger
            .start_lease(deposit, self.confirmation_timeout)
            .map_err(|e| failed(action, e))?;
        info!(action = action.name(), %receipt, "confirmed");
        Ok(Accepted { receipt, amount: deposit })
    }

    /// Pays one month of rent if the current window is still unpaid.
    pub fn pay_rent(&self) -> Result<Accepted, ControllerError> {
        let action = ActionRequest::PayRent;
        let state = self.observe()?;
        let lease = policy::require_active(&state).map_err(|r| rejected(action, r))?;

        let now = self.ledger.now()?;
        let window_start = match self.rent_window {
            RentWindow::FromStart => lease.start_timestamp,
            RentWindow::FromLastPayment => self.ledger.last_payment()?,
        };
        debug!(
            action = action.name(),
            now,
            start = lease.start_timestamp,
            end = lease.expected_end_time(),
            window_start,
            "evaluating guards"
        );
        policy::check_pay(lease, window_start, now).map_err(|r| rejected(action, r))?;

        let rent = self.ledger.monthly_rent()?;
        info!(action = action.name(), amount = %rent, "submitting");
        let receipt = self
            .ledger
            .pay_rent(rent, self.confirmation_timeout)
            .map_err(|e| failed(action, e))?;
        info!(action = action.name(), %receipt, "confirmed");
        Ok(Accepted { receipt, amount: rent })
    }

    /// Closes the rental once its full period has elapsed.
    pub fn end_lease(&self) -> Result<Accepted, ControllerError> {
        let action = ActionRequest::EndLease;
        let state = self.observe()?;
        let lease = policy::require_active(&state).map_err(|r| rejected(action, r))?;

        let now = self.ledger.now()?;
        debug!(action = action.name(), now, end = lease.expected_end_time(), "evaluating guards");
        policy::check_end(lease, now).map_err(|r| rejected(action, r))?;

        info!(action = action.name(), "submitting");
        let receipt = self
            .ledger
            .end_lease(self.confirmation_timeout)
            .map_err(|e| failed(action, e))?;
        info!(action = action.name(), %receipt, "confirmed");
        Ok(Accepted { receipt, amount: 0 })
    }

    pub fn query_info(&self) -> Result<LeaseInfo<L::Identity>, ControllerError> {
        Ok(LeaseInfo {
            landlord: self.ledger.landlord()?,
            tenant: self.ledger.tenant()?,
            monthly_rent: self.ledger.monthly_rent()?,
            security_deposit: self.ledger.security_deposit()?,
            rental_period: self.ledger.rental_period()?,
            is_active: self.ledger.is_active()?,
        })
    }

    fn observe(&self) -> Result<LeaseState, ControllerError> {
        if !self.ledger.is_active()? {
            return Ok(LeaseState::Inactive);
        }
        Ok(LeaseState::Active(ActiveLease {
            start_timestamp: self.ledger.start_timestamp()?,
            rental_period: self.ledger.rental_period()?,
        }))
    }
}

fn rejected(action: ActionRequest, reason: Rejection) -> ControllerError {
    warn!(action = action.name(), %reason, "rejected");
    ControllerError::Rejected(reason)
}

fn failed(action: ActionRequest, err: SubmissionError) -> ControllerError {
    error!(action = action.name(), error = %err, "submission failed");
    ControllerError::SubmissionFailed(err)
}
