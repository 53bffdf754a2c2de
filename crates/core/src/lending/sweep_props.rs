//! Property-based tests for the overdue sweep.

use chrono::{Days, NaiveDate};
use proptest::prelude::*;
use rust_decimal::Decimal;

use libris_shared::FineAccrualMode;
use libris_shared::types::{Currency, TransactionId};

use super::fine::FinePolicy;
use super::sweep::{SweepChangeKind, plan_sweep};
use super::types::fixtures::{date, loan};
use super::types::{LoanStatus, LoanTransaction};

fn today() -> NaiveDate {
    date(2026, 10, 16)
}

fn status() -> impl Strategy<Value = LoanStatus> {
    prop_oneof![
        Just(LoanStatus::Active),
        Just(LoanStatus::Overdue),
        Just(LoanStatus::Returned),
    ]
}

/// Strategy for a loan due up to 60 days either side of today.
fn loan_strategy() -> impl Strategy<Value = (LoanStatus, i64, i64, u8)> {
    (status(), -60i64..60, 1i64..6, 0u8..20)
}

fn build(specs: &[(LoanStatus, i64, i64, u8)]) -> Vec<LoanTransaction> {
    specs
        .iter()
        .zip(1i64..)
        .map(|(&(status, offset, member_id, fine), id)| {
            let due = if offset >= 0 {
                today() + Days::new(offset.unsigned_abs())
            } else {
                today() - Days::new(offset.unsigned_abs())
            };
            let mut l = loan(id, member_id, due);
            l.status = status;
            l.fine_amount = Decimal::from(fine);
            if status == LoanStatus::Returned {
                l.return_date = Some(due);
            }
            l
        })
        .collect()
}

/// Applies planned changes to a copy of `loans`.
fn apply(loans: &[LoanTransaction], fines: &FinePolicy) -> Vec<LoanTransaction> {
    let mut next = loans.to_vec();
    for change in plan_sweep(loans, today(), fines) {
        if let Some(slot) = next.iter_mut().find(|l| l.id == change.transaction.id) {
            *slot = change.transaction;
        }
    }
    next
}

fn accrual() -> impl Strategy<Value = FineAccrualMode> {
    prop_oneof![Just(FineAccrualMode::Frozen), Just(FineAccrualMode::Accruing)]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Returned loans are never part of a sweep.
    #[test]
    fn prop_returned_untouched(
        specs in prop::collection::vec(loan_strategy(), 0..30),
        mode in accrual(),
    ) {
        let loans = build(&specs);
        let fines = FinePolicy::new(Decimal::from(5), Currency::Inr, mode);
        let changes = plan_sweep(&loans, today(), &fines);

        for change in &changes {
            let original = loans.iter().find(|l| l.id == change.transaction.id).unwrap();
            prop_assert_ne!(original.status, LoanStatus::Returned);
        }
    }

    /// Exactly the past-due active loans transition, each once.
    #[test]
    fn prop_past_due_active_transition_once(
        specs in prop::collection::vec(loan_strategy(), 0..30),
        mode in accrual(),
    ) {
        let loans = build(&specs);
        let fines = FinePolicy::new(Decimal::from(5), Currency::Inr, mode);
        let changes = plan_sweep(&loans, today(), &fines);

        let mut expected: Vec<Option<TransactionId>> = loans
            .iter()
            .filter(|l| l.status == LoanStatus::Active && l.due_date.is_some_and(|d| d < today()))
            .map(|l| l.id)
            .collect();
        let mut transitioned: Vec<Option<TransactionId>> = changes
            .iter()
            .filter(|c| c.kind == SweepChangeKind::Transitioned)
            .map(|c| c.transaction.id)
            .collect();
        expected.sort();
        transitioned.sort();
        prop_assert_eq!(transitioned, expected);

        for change in changes.iter().filter(|c| c.kind == SweepChangeKind::Transitioned) {
            prop_assert_eq!(change.transaction.status, LoanStatus::Overdue);
            prop_assert_eq!(
                change.transaction.fine_amount,
                fines.fine_for(&change.transaction, today())
            );
        }
    }

    /// Overdue loans keep their status; frozen fines are never rewritten.
    #[test]
    fn prop_overdue_status_kept(
        specs in prop::collection::vec(loan_strategy(), 0..30),
        mode in accrual(),
    ) {
        let loans = build(&specs);
        let fines = FinePolicy::new(Decimal::from(5), Currency::Inr, mode);

        for change in plan_sweep(&loans, today(), &fines) {
            let original = loans.iter().find(|l| l.id == change.transaction.id).unwrap();
            if original.status == LoanStatus::Overdue {
                prop_assert_eq!(mode, FineAccrualMode::Accruing);
                prop_assert_eq!(change.kind, SweepChangeKind::Refreshed);
                prop_assert_eq!(change.transaction.status, LoanStatus::Overdue);
                prop_assert!(change.transaction.fine_amount > original.fine_amount);
            }
        }
    }

    /// A second sweep on the same day changes nothing.
    #[test]
    fn prop_second_sweep_is_empty(
        specs in prop::collection::vec(loan_strategy(), 0..30),
        mode in accrual(),
    ) {
        let fines = FinePolicy::new(Decimal::from(5), Currency::Inr, mode);
        let swept = apply(&build(&specs), &fines);

        prop_assert!(plan_sweep(&swept, today(), &fines).is_empty());
    }
}
