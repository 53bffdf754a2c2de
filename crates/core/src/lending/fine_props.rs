//! Property-based tests for late-fine calculation.

use chrono::{Days, NaiveDate};
use proptest::prelude::*;
use rust_decimal::Decimal;

use libris_shared::FineAccrualMode;
use libris_shared::types::Currency;

use super::fine::{FinePolicy, days_overdue};
use super::types::LoanStatus;
use super::types::fixtures::{date, loan};

/// Strategy for a due date within a few years of 2026.
fn due_date() -> impl Strategy<Value = NaiveDate> {
    (0u64..1500).prop_map(|offset| date(2024, 1, 1) + Days::new(offset))
}

/// Strategy for a daily rate from 0.01 to 100.00.
fn daily_rate() -> impl Strategy<Value = Decimal> {
    (1i64..10_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

fn accrual() -> impl Strategy<Value = FineAccrualMode> {
    prop_oneof![Just(FineAccrualMode::Frozen), Just(FineAccrualMode::Accruing)]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Nothing is owed on or before the due date.
    #[test]
    fn prop_no_fine_until_due(
        due in due_date(),
        early in 0u64..400,
        rate in daily_rate(),
        mode in accrual(),
    ) {
        let fines = FinePolicy::new(rate, Currency::Inr, mode);
        let loan = loan(1, 1, due);
        let today = due - Days::new(early);

        prop_assert_eq!(days_overdue(&loan, today), 0);
        prop_assert_eq!(fines.fine_for(&loan, today), Decimal::ZERO);
    }

    /// Past the due date the fine is whole days late times the daily rate.
    #[test]
    fn prop_fine_is_days_times_rate(
        due in due_date(),
        late in 1u64..400,
        rate in daily_rate(),
        mode in accrual(),
    ) {
        let fines = FinePolicy::new(rate, Currency::Inr, mode);
        let loan = loan(1, 1, due);
        let today = due + Days::new(late);
        let days = i64::try_from(late).unwrap();

        prop_assert_eq!(days_overdue(&loan, today), days);
        prop_assert_eq!(fines.fine_for(&loan, today), rate * Decimal::from(days));
    }

    /// Once returned, the fine depends on the return date, not on today.
    #[test]
    fn prop_returned_fine_ignores_today(
        due in due_date(),
        returned_after in 0u64..60,
        later in 0u64..400,
        rate in daily_rate(),
    ) {
        let fines = FinePolicy::new(rate, Currency::Inr, FineAccrualMode::Frozen);
        let mut closed = loan(1, 1, due);
        let returned_on = due + Days::new(returned_after);
        closed.status = LoanStatus::Returned;
        closed.return_date = Some(returned_on);

        prop_assert_eq!(
            fines.fine_for(&closed, returned_on + Days::new(later)),
            fines.fine_for(&closed, returned_on)
        );
    }

    /// The fine never goes negative and never shrinks as days pass.
    #[test]
    fn prop_fine_is_monotonic(
        due in due_date(),
        first in 0u64..400,
        step in 0u64..400,
        rate in daily_rate(),
    ) {
        let fines = FinePolicy::new(rate, Currency::Inr, FineAccrualMode::Accruing);
        let loan = loan(1, 1, due);
        let earlier = fines.fine_for(&loan, due + Days::new(first));
        let later = fines.fine_for(&loan, due + Days::new(first + step));

        prop_assert!(earlier >= Decimal::ZERO);
        prop_assert!(later >= earlier);
    }
}
