//! Line-oriented command loop over a controller bound to the local ledger.

use std::io::{self, BufRead, Write};
use std::str::FromStr;

use tracing::debug;

use crate::controller::{ActionOutcome, ActionRequest, LeaseController};
use crate::error::Rejection;
use crate::ledger::Clock;
use crate::sandbox::SandboxLedger;

pub const PROMPT: &str = "Enter 'start' to start rental, 'pay' to pay rent, 'end' to end rental, \
                          'info' to get rental info (or 'exit' to quit): ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Action(ActionRequest),
    /// Local ledger only: move ledger time forward.
    Advance(u64),
    Exit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Invalid command. Please try again.")]
pub struct InvalidCommand;

impl FromStr for Command {
    type Err = InvalidCommand;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut words = s.split_whitespace();
        let verb = words.next().ok_or(InvalidCommand)?.to_ascii_lowercase();
        let command = match verb.as_str() {
            "start" => Command::Action(ActionRequest::StartLease),
            "pay" => Command::Action(ActionRequest::PayRent),
            "end" => Command::Action(ActionRequest::EndLease),
            "info" => Command::Action(ActionRequest::QueryInfo),
            "exit" => Command::Exit,
            "advance" => {
                let secs = words.next().and_then(|w| w.parse().ok()).ok_or(InvalidCommand)?;
                Command::Advance(secs)
            }
            _ => return Err(InvalidCommand),
        };
        if words.next().is_some() {
            return Err(InvalidCommand);
        }
        Ok(command)
    }
}

/// Prompts, reads one command per line and reports the result, until
/// `exit` or end of input.
pub fn run<R, W>(controller: &LeaseController<SandboxLedger>, input: R, mut out: W) -> io::Result<()>
where
    R: BufRead,
    W: Write,
{
    let mut lines = input.lines();
    loop {
        write!(out, "{PROMPT}")?;
        out.flush()?;

        let line = match lines.next() {
            Some(line) => line?,
            None => {
                writeln!(out)?;
                return Ok(());
            }
        };
        debug!(input = %line.trim(), "command");

        match line.parse::<Command>() {
            Ok(Command::Exit) => {
                writeln!(out, "Exiting...")?;
                return Ok(());
            }
            Ok(Command::Advance(secs)) => {
                controller.ledger().advance(secs);
                match controller.ledger().now() {
                    Ok(now) => writeln!(out, "Ledger time is now {now}.")?,
                    Err(e) => writeln!(out, "Error: {e}")?,
                }
            }
            Ok(Command::Action(request)) => report(controller, request, &mut out)?,
            Err(e) => writeln!(out, "{e}")?,
        }
    }
}

fn report<W: Write>(
    controller: &LeaseController<SandboxLedger>,
    request: ActionRequest,
    out: &mut W,
) -> io::Result<()> {
    match controller.execute(request) {
        Ok(ActionOutcome::Started(accepted)) => writeln!(
            out,
            "Rental started successfully. Deposit: {}. Transaction: {}",
            accepted.amount, accepted.receipt
        ),
        Ok(ActionOutcome::RentPaid(accepted)) => writeln!(
            out,
            "Rent paid successfully: {}. Transaction: {}",
            accepted.amount, accepted.receipt
        ),
        Ok(ActionOutcome::Ended(accepted)) => {
            writeln!(out, "Rental ended successfully. Transaction: {}", accepted.receipt)
        }
        Ok(ActionOutcome::Info(info)) => {
            writeln!(out, "Expected Security Deposit: {}", info.security_deposit)?;
            writeln!(out, "Landlord: {:?}", info.landlord)?;
            match &info.tenant {
                Some(tenant) => writeln!(out, "Tenant: {tenant:?}")?,
                None => writeln!(out, "Tenant: none")?,
            }
            writeln!(out, "Monthly Rent: {}", info.monthly_rent)?;
            writeln!(out, "Rental Period: {} months", info.rental_period)?;
            writeln!(out, "Is Active: {}", info.is_active)
        }
        Ok(ActionOutcome::Rejected(reason)) => match hint(request, reason) {
            Some(hint) => writeln!(out, "Error: {reason} {hint}"),
            None => writeln!(out, "Error: {reason}"),
        },
        Err(e) => writeln!(out, "Error: {e}"),
    }
}

/// What the user can do about a rejection, where it depends on the action.
fn hint(request: ActionRequest, reason: Rejection) -> Option<&'static str> {
    match (request, reason) {
        (ActionRequest::PayRent, Rejection::NotActive) => Some("Please start a rental first."),
        (ActionRequest::EndLease, Rejection::NotActive) => {
            Some("You cannot end a rental that has not started.")
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LeaseTerms, LedgerConfig};
    use crate::ledger::LeaseLedger;
    use crate::policy::SECONDS_PER_MONTH;

    fn controller() -> LeaseController<SandboxLedger> {
        let terms = LeaseTerms { rental_period: 2, ..LeaseTerms::default() };
        LeaseController::new(SandboxLedger::deploy(&terms, &LedgerConfig::default()).unwrap())
    }

    fn session(controller: &LeaseController<SandboxLedger>, input: &str) -> String {
        let mut out = Vec::new();
        run(controller, input.as_bytes(), &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn parses_verbs() {
        assert_eq!("start".parse::<Command>(), Ok(Command::Action(ActionRequest::StartLease)));
        assert_eq!(" PAY ".parse::<Command>(), Ok(Command::Action(ActionRequest::PayRent)));
        assert_eq!("End".parse::<Command>(), Ok(Command::Action(ActionRequest::EndLease)));
        assert_eq!("info".parse::<Command>(), Ok(Command::Action(ActionRequest::QueryInfo)));
        assert_eq!("exit".parse::<Command>(), Ok(Command::Exit));
        assert_eq!("advance 60".parse::<Command>(), Ok(Command::Advance(60)));
    }

    #[test]
    fn rejects_unknown_input() {
        assert_eq!("".parse::<Command>(), Err(InvalidCommand));
        assert_eq!("stop".parse::<Command>(), Err(InvalidCommand));
        assert_eq!("start now".parse::<Command>(), Err(InvalidCommand));
        assert_eq!("advance".parse::<Command>(), Err(InvalidCommand));
        assert_eq!("advance -1".parse::<Command>(), Err(InvalidCommand));
    }

    #[test]
    fn invalid_command_reprompts() {
        let c = controller();
        let out = session(&c, "hello\nexit\n");
        assert!(out.contains("Invalid command. Please try again."));
        assert!(out.ends_with("Exiting...\n"));
        assert_eq!(out.matches(PROMPT).count(), 2);
    }

    #[test]
    fn start_twice_reports_rejection() {
        let c = controller();
        let out = session(&c, "start\nstart\n");
        assert!(out.contains("Rental started successfully."));
        assert!(out.contains("Error: Rental is already active."));
        assert!(c.ledger().is_active().unwrap());
    }

    #[test]
    fn pay_after_advancing_a_month() {
        let c = controller();
        let input = format!("start\npay\nadvance {}\npay\ninfo\nexit\n", SECONDS_PER_MONTH);
        let out = session(&c, &input);

        assert!(out.contains("Error: Rent for the current month has already been paid."));
        assert!(out.contains("Rent paid successfully: 1000000."));
        assert!(out.contains("Is Active: true"));
        assert!(out.contains("Rental Period: 2 months"));
    }

    #[test]
    fn not_active_reply_depends_on_action() {
        let c = controller();
        let out = session(&c, "pay\nend\nexit\n");
        assert!(out.contains("Error: Rental is not active. Please start a rental first.\n"));
        assert!(out.contains(
            "Error: Rental is not active. You cannot end a rental that has not started.\n"
        ));
    }

    #[test]
    fn end_reports_its_own_confirmation() {
        let c = controller();
        let input = format!("start\nadvance {}\nend\nexit\n", 2 * SECONDS_PER_MONTH);
        let out = session(&c, &input);
        assert!(out.contains("Rental ended successfully. Transaction: ledger #"));
        assert!(!c.ledger().is_active().unwrap());
    }

    #[test]
    fn failed_submission_keeps_the_loop_going() {
        let terms = LeaseTerms {
            monthly_rent: 1_000,
            security_deposit: 2_000,
            rental_period: 3,
            tenant_funds: 2_000,
            ..LeaseTerms::default()
        };
        let c = LeaseController::new(SandboxLedger::deploy(&terms, &LedgerConfig::default()).unwrap());
        let input = format!("start\nadvance {}\npay\ninfo\nexit\n", SECONDS_PER_MONTH);
        let out = session(&c, &input);

        assert!(out.contains("Error: `pay_rent` could not be sent: insufficient balance"));
        assert!(out.contains("Is Active: true"));
        assert!(out.ends_with("Exiting...\n"));
    }

    #[test]
    fn end_of_input_stops_the_loop() {
        let c = controller();
        let out = session(&c, "info\n");
        assert!(out.contains("Tenant: none"));
        assert!(out.contains("Is Active: false"));
    }
}
