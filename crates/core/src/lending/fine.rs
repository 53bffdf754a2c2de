//! Late-fine calculation.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use libris_shared::FineAccrualMode;
use libris_shared::types::{Currency, Money};

use crate::lending::types::LoanTransaction;

/// Fine rate and accrual rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FinePolicy {
    /// Amount charged per whole day past the due date.
    pub daily_rate: Decimal,
    /// Currency the fine is charged in.
    pub currency: Currency,
    /// Whether sweeps keep growing the fine of overdue loans.
    pub accrual: FineAccrualMode,
}

impl FinePolicy {
    /// Creates a fine policy.
    #[must_use]
    pub const fn new(daily_rate: Decimal, currency: Currency, accrual: FineAccrualMode) -> Self {
        Self {
            daily_rate,
            currency,
            accrual,
        }
    }

    /// Fine owed on `loan` as of `today`.
    ///
    /// The loan's return date is used when present, otherwise `today`.
    /// Zero when there is no due date or the book is not late. Rounded to
    /// cents; saturates at `Decimal::MAX` instead of overflowing.
    #[must_use]
    pub fn fine_for(&self, loan: &LoanTransaction, today: NaiveDate) -> Decimal {
        self.daily_rate
            .checked_mul(Decimal::from(days_overdue(loan, today)))
            .map_or(Decimal::MAX, |fine| fine.round_dp(2))
    }

    /// Same as [`Self::fine_for`], tagged with the policy currency.
    #[must_use]
    pub fn fine_money(&self, loan: &LoanTransaction, today: NaiveDate) -> Money {
        Money::new(self.fine_for(loan, today), self.currency)
    }
}

/// Whole days between the due date and the effective return date, never negative.
#[must_use]
pub fn days_overdue(loan: &LoanTransaction, today: NaiveDate) -> i64 {
    let Some(due) = loan.due_date else {
        return 0;
    };
    whole_days_after(due, loan.return_date.unwrap_or(today))
}

fn whole_days_after(due: NaiveDate, effective: NaiveDate) -> i64 {
    (effective - due).num_days().max(0)
}
