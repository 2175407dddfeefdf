//! The two collaborators the controller talks to: the rental contract on
//! the ledger, and the ledger's clock.

use std::fmt;
use std::time::Duration;

use crate::error::{QueryError, SubmissionError};
use crate::Amount;

/// Reads and state-changing calls against one rental agreement.
///
/// Reads are independent: two reads may observe different ledger states if
/// another party submits in between. Writes block until confirmed or until
/// `wait` runs out.
pub trait LeaseLedger {
    type Identity: Clone + fmt::Debug + PartialEq;

    fn is_active(&self) -> Result<bool, QueryError>;
    fn landlord(&self) -> Result<Self::Identity, QueryError>;
    /// `None` until a rental has been started.
    fn tenant(&self) -> Result<Option<Self::Identity>, QueryError>;
    fn monthly_rent(&self) -> Result<Amount, QueryError>;
    fn security_deposit(&self) -> Result<Amount, QueryError>;
    /// Months.
    fn rental_period(&self) -> Result<u32, QueryError>;
    fn start_timestamp(&self) -> Result<u64, QueryError>;
    fn last_payment(&self) -> Result<u64, QueryError>;

    fn start_lease(&self, value: Amount, wait: Duration) -> Result<Confirmation, SubmissionError>;
    fn pay_rent(&self, value: Amount, wait: Duration) -> Result<Confirmation, SubmissionError>;
    fn end_lease(&self, wait: Duration) -> Result<Confirmation, SubmissionError>;
}

/// Current confirmed ledger time, in seconds since the epoch.
pub trait Clock {
    fn now(&self) -> Result<u64, QueryError>;
}

/// Receipt for a confirmed submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Confirmation {
    /// Sequence number of the ledger that included the call.
    pub ledger: u32,
    /// Close time of that ledger.
    pub timestamp: u64,
}

impl fmt::Display for Confirmation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ledger #{} @ {}", self.ledger, self.timestamp)
    }
}
