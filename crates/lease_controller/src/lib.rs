//! Client for a `rental_agreement` contract.
//!
//! [`LeaseController`] decides whether starting a rental, paying rent or
//! ending a rental is currently allowed, using only values read fresh from
//! the ledger, and submits the call with the right amount attached.
//! [`SandboxLedger`] runs the contract locally so the controller has a
//! ledger to talk to.

pub mod config;
pub mod controller;
pub mod error;
pub mod ledger;
pub mod policy;
pub mod sandbox;
pub mod shell;

pub use config::Config;
pub use controller::{Accepted, ActionOutcome, ActionRequest, LeaseController, LeaseInfo};
pub use error::{ControllerError, QueryError, Rejection, SubmissionError};
pub use ledger::{Clock, Confirmation, LeaseLedger};
pub use policy::{RentWindow, SECONDS_PER_MONTH};
pub use sandbox::SandboxLedger;

/// Token amount in the asset's smallest unit.
pub type Amount = i128;
