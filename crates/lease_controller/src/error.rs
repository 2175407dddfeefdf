use std::time::Duration;

/// A guard condition refused the action. Nothing was sent to the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("Rental is already active. Please end the current rental first.")]
    AlreadyActive,
    #[error("Rental is not active.")]
    NotActive,
    #[error("Rental period has ended. You cannot pay rent.")]
    PeriodEnded,
    #[error("Cannot end rental before the rental period.")]
    PeriodNotElapsed,
    #[error("Rent for the current month has already been paid.")]
    AlreadyPaidThisPeriod,
}

/// A read from the ledger or its clock did not complete.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("`{call}` query failed: {cause}")]
pub struct QueryError {
    pub call: &'static str,
    pub cause: String,
}

impl QueryError {
    pub fn new(call: &'static str, cause: impl Into<String>) -> Self {
        Self { call, cause: cause.into() }
    }
}

/// A state-changing call was sent but not confirmed. The ledger-side state
/// must be re-queried before anything is retried.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmissionError {
    #[error("`{call}` reverted: {cause}")]
    Reverted { call: &'static str, cause: String },

    #[error("`{call}` was not confirmed within {wait:?}; its outcome is unknown")]
    Timeout { call: &'static str, wait: Duration },

    /// Refused before reaching the contract; the ledger is unchanged.
    #[error("`{call}` could not be sent: {cause}")]
    Transport { call: &'static str, cause: String },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ControllerError {
    #[error(transparent)]
    Rejected(#[from] Rejection),

    #[error(transparent)]
    QueryFailed(#[from] QueryError),

    #[error(transparent)]
    SubmissionFailed(#[from] SubmissionError),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}
