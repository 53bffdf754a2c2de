//! Circulation policy: borrowing limit and overdue holds.
//!
//! Both checks are advisory. They report a signal and never stop a loan
//! from being issued.

use chrono::NaiveDate;
use serde::Serialize;

use libris_shared::LendingConfig;

use crate::lending::fine::FinePolicy;
use crate::lending::types::{LoanStatus, LoanTransaction, Member};

/// Policy values injected into the lending engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LendingPolicy {
    /// Fine rules.
    pub fines: FinePolicy,
    /// Unreturned loans at which a member is at the limit.
    pub max_active_borrows: u32,
    /// Loan period used by [`LoanTransaction::issue`] callers.
    pub default_loan_days: u32,
}

impl From<&LendingConfig> for LendingPolicy {
    fn from(config: &LendingConfig) -> Self {
        Self {
            fines: FinePolicy::new(config.daily_fine_rate, config.currency, config.fine_accrual),
            max_active_borrows: config.max_active_borrows,
            default_loan_days: config.default_loan_days,
        }
    }
}

impl Default for LendingPolicy {
    fn default() -> Self {
        Self::from(&LendingConfig::default())
    }
}

/// A member's loan counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MemberStanding {
    /// Loans not yet returned.
    pub active: usize,
    /// Loans with status `Overdue`.
    pub overdue: usize,
}

impl MemberStanding {
    /// Counts `member`'s loans in `loans`.
    #[must_use]
    pub fn of(member: &Member, loans: &[LoanTransaction]) -> Self {
        let mut standing = Self::default();
        for loan in loans.iter().filter(|l| l.is_held_by(member.id)) {
            if loan.status.is_open() {
                standing.active += 1;
            }
            if loan.status == LoanStatus::Overdue {
                standing.overdue += 1;
            }
        }
        standing
    }
}

/// Outcome of the borrowing-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BorrowingLimit {
    /// Member is at or above the limit.
    Reached {
        /// Unreturned loans.
        active: usize,
        /// Configured limit.
        max: u32,
    },
    /// Member is below the limit.
    Within {
        /// Unreturned loans.
        active: usize,
        /// Configured limit.
        max: u32,
    },
}

/// Counts `member`'s unreturned loans against the configured maximum.
#[must_use]
pub fn check_borrowing_limit(
    member: &Member,
    loans: &[LoanTransaction],
    max_active_borrows: u32,
) -> BorrowingLimit {
    let active = MemberStanding::of(member, loans).active;
    if active >= usize::try_from(max_active_borrows).unwrap_or(usize::MAX) {
        BorrowingLimit::Reached {
            active,
            max: max_active_borrows,
        }
    } else {
        BorrowingLimit::Within {
            active,
            max: max_active_borrows,
        }
    }
}

/// Number of `member`'s unreturned loans whose due date is before `today`.
///
/// Works from dates, not status, so loans the sweep has not reached yet count.
#[must_use]
pub fn count_overdue_holds(member: &Member, loans: &[LoanTransaction], today: NaiveDate) -> usize {
    loans
        .iter()
        .filter(|l| l.is_held_by(member.id) && l.is_past_due(today))
        .count()
}
