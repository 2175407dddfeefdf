//! Guard conditions for the rental lifecycle.
//!
//! Everything here is a pure function of values already read from the
//! ledger and its clock. The controller does the reading.

use serde::{Deserialize, Serialize};

use crate::error::Rejection;

pub use rental_agreement::{expected_end_time, SECONDS_PER_MONTH};

/// The lease as observed on the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaseState {
    Inactive,
    Active(ActiveLease),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveLease {
    pub start_timestamp: u64,
    /// Months.
    pub rental_period: u32,
}

impl ActiveLease {
    pub fn expected_end_time(&self) -> u64 {
        expected_end_time(self.start_timestamp, self.rental_period)
    }
}

/// Where the monthly rent window is anchored.
///
/// `FromStart` measures the window from the lease start, so after the first
/// month every call inside the rental period is eligible. `FromLastPayment`
/// measures it from the ledger's record of the latest payment.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum RentWindow {
    #[default]
    FromStart,
    FromLastPayment,
}

pub fn check_start(is_active: bool) -> Result<(), Rejection> {
    if is_active {
        return Err(Rejection::AlreadyActive);
    }
    Ok(())
}

pub fn require_active(state: &LeaseState) -> Result<&ActiveLease, Rejection> {
    match state {
        LeaseState::Active(lease) => Ok(lease),
        LeaseState::Inactive => Err(Rejection::NotActive),
    }
}

/// Rent is payable before the period ends and at least one month after
/// `window_start`.
pub fn check_pay(lease: &ActiveLease, window_start: u64, now: u64) -> Result<(), Rejection> {
    if now >= lease.expected_end_time() {
        return Err(Rejection::PeriodEnded);
    }
    if now < window_start.saturating_add(SECONDS_PER_MONTH) {
        return Err(Rejection::AlreadyPaidThisPeriod);
    }
    Ok(())
}

pub fn check_end(lease: &ActiveLease, now: u64) -> Result<(), Rejection> {
    if now < lease.expected_end_time() {
        return Err(Rejection::PeriodNotElapsed);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const T: u64 = 1_700_000_000;

    fn active(rental_period: u32) -> ActiveLease {
        ActiveLease { start_timestamp: T, rental_period }
    }

    #[test]
    fn month_is_thirty_days() {
        assert_eq!(SECONDS_PER_MONTH, 2_592_000);
    }

    #[test]
    fn start_only_when_inactive() {
        assert_eq!(check_start(false), Ok(()));
        assert_eq!(check_start(true), Err(Rejection::AlreadyActive));
    }

    #[test]
    fn inactive_lease_is_not_payable() {
        assert_eq!(require_active(&LeaseState::Inactive), Err(Rejection::NotActive));
    }

    // rentalPeriod = 1, right after the start
    #[test]
    fn pay_immediately_after_start() {
        assert_eq!(check_pay(&active(1), T, T), Err(Rejection::AlreadyPaidThisPeriod));
    }

    // rentalPeriod = 1, one second past the first month
    #[test]
    fn one_month_lease_past_first_month() {
        let now = T + 2_592_001;
        assert_eq!(check_pay(&active(1), T, now), Err(Rejection::PeriodEnded));
        assert_eq!(check_end(&active(1), now), Ok(()));
    }

    #[test]
    fn two_month_lease_second_month() {
        let now = T + 2_592_001;
        assert_eq!(check_pay(&active(2), T, now), Ok(()));
        assert_eq!(check_end(&active(2), now), Err(Rejection::PeriodNotElapsed));
    }

    #[test]
    fn end_exactly_at_expected_end() {
        assert_eq!(check_end(&active(3), T + 3 * SECONDS_PER_MONTH), Ok(()));
        assert_eq!(
            check_end(&active(3), T + 3 * SECONDS_PER_MONTH - 1),
            Err(Rejection::PeriodNotElapsed)
        );
    }

    #[test]
    fn period_ended_wins_over_window() {
        // a payment recorded late in the period does not mask PeriodEnded
        let lease = active(1);
        let now = lease.expected_end_time();
        assert_eq!(check_pay(&lease, now - 1, now), Err(Rejection::PeriodEnded));
    }

    #[test]
    fn huge_period_does_not_overflow() {
        let lease = ActiveLease { start_timestamp: u64::MAX - 10, rental_period: u32::MAX };
        assert_eq!(lease.expected_end_time(), u64::MAX);
        assert_eq!(check_end(&lease, u64::MAX - 1), Err(Rejection::PeriodNotElapsed));
    }

    #[test]
    fn rent_window_parses_from_toml() {
        #[derive(Deserialize)]
        struct W {
            w: RentWindow,
        }
        let w: W = toml::from_str("w = \"from_last_payment\"").unwrap();
        assert_eq!(w.w, RentWindow::FromLastPayment);
        assert_eq!(RentWindow::default(), RentWindow::FromStart);
    }

    proptest! {
        #[test]
        fn prop_pay_rejected_after_period(
            period in 1u32..120,
            past in 0u64..10 * SECONDS_PER_MONTH,
        ) {
            let lease = active(period);
            let now = lease.expected_end_time() + past;
            prop_assert_eq!(check_pay(&lease, T, now), Err(Rejection::PeriodEnded));
            prop_assert_eq!(check_end(&lease, now), Ok(()));
        }

        #[test]
        fn prop_pay_rejected_in_first_month(
            period in 2u32..120,
            offset in 0u64..SECONDS_PER_MONTH,
        ) {
            let now = T + offset;
            prop_assert_eq!(
                check_pay(&active(period), T, now),
                Err(Rejection::AlreadyPaidThisPeriod)
            );
        }

        #[test]
        fn prop_pay_eligible_inside_period(
            period in 2u32..120,
            frac in 0.0f64..1.0,
        ) {
            let lease = active(period);
            let first = T + SECONDS_PER_MONTH;
            let span = lease.expected_end_time() - first;
            let now = first + (span as f64 * frac) as u64;
            prop_assume!(now < lease.expected_end_time());
            prop_assert_eq!(check_pay(&lease, T, now), Ok(()));
            prop_assert_eq!(check_end(&lease, now), Err(Rejection::PeriodNotElapsed));
        }

        #[test]
        fn prop_end_waits_for_full_period(
            period in 1u32..120,
            early in 1u64..SECONDS_PER_MONTH,
        ) {
            let lease = active(period);
            let now = lease.expected_end_time() - early;
            prop_assert_eq!(check_end(&lease, now), Err(Rejection::PeriodNotElapsed));
        }

        #[test]
        fn prop_inactive_lease_rejects_pay_and_end(_now in any::<u64>()) {
            prop_assert_eq!(require_active(&LeaseState::Inactive), Err(Rejection::NotActive));
        }
    }
}
