//! Inputs and results of the issue/return event handlers.

use serde::Serialize;
use std::fmt;

use libris_shared::types::{Money, TransactionId};

use crate::lending::audit::{IssueRecord, ReturnRecord};
use crate::lending::policy::MemberStanding;
use crate::lending::sweep::SweepReport;
use crate::lending::types::{Book, LoanTransaction, Member};

/// A loan has just been issued.
///
/// Each part is whatever the caller could resolve; a missing part makes the
/// handler skip its work and report [`Signal::NotYetAvailable`].
#[derive(Debug, Clone, Default)]
pub struct IssueEvent {
    /// The new loan.
    pub transaction: Option<LoanTransaction>,
    /// Book being lent.
    pub book: Option<Book>,
    /// Borrowing member.
    pub member: Option<Member>,
}

impl IssueEvent {
    /// Event for a loan whose book and member are the ones it carries.
    #[must_use]
    pub fn from_transaction(transaction: LoanTransaction) -> Self {
        Self {
            book: Some(transaction.book.clone()),
            member: Some(transaction.member.clone()),
            transaction: Some(transaction),
        }
    }
}

/// A loan is being returned.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReturnEvent {
    /// Id of the loan, if the caller has one.
    pub transaction_id: Option<TransactionId>,
}

impl ReturnEvent {
    /// Event for a known loan id.
    #[must_use]
    pub const fn for_id(id: TransactionId) -> Self {
        Self {
            transaction_id: Some(id),
        }
    }
}

/// Advisory signal reported to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Signal {
    /// The transaction, book, or member was not supplied.
    NotYetAvailable,
    /// No stored loan has this id.
    NotFound {
        /// Requested id.
        id: TransactionId,
    },
    /// Member has loans past their due date.
    OverdueHold {
        /// Number of such loans.
        count: usize,
    },
    /// Member is at or above the borrowing limit.
    BorrowingLimitReached {
        /// Unreturned loans.
        active: usize,
        /// Configured limit.
        max: u32,
    },
    /// Member is below the borrowing limit.
    BorrowingCapacity {
        /// Unreturned loans.
        active: usize,
        /// Configured limit.
        max: u32,
    },
}

impl Signal {
    /// Returns true for signals that flag a policy violation.
    #[must_use]
    pub fn is_violation(&self) -> bool {
        matches!(
            self,
            Self::OverdueHold { .. } | Self::BorrowingLimitReached { .. }
        )
    }
}

/// Sub-step of an event handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    /// Overdue-hold and borrowing-limit checks.
    MemberChecks,
    /// Overdue sweep.
    OverdueSweep,
    /// Loading the loan being returned.
    LoadTransaction,
    /// Member standing after a return.
    MemberStanding,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::MemberChecks => "member checks",
            Self::OverdueSweep => "overdue sweep",
            Self::LoadTransaction => "load transaction",
            Self::MemberStanding => "member standing",
        };
        f.write_str(name)
    }
}

/// A sub-step that failed without aborting its handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepFailure {
    /// Where it happened.
    pub step: Step,
    /// Loan involved, if any.
    pub transaction_id: Option<TransactionId>,
    /// Error text.
    pub message: String,
}

impl StepFailure {
    /// Records `error` against `step`.
    pub fn new(step: Step, transaction_id: Option<TransactionId>, error: &dyn fmt::Display) -> Self {
        Self {
            step,
            transaction_id,
            message: error.to_string(),
        }
    }
}

/// Result of handling an [`IssueEvent`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct IssueOutcome {
    /// Advisory signals, in the order they were raised.
    pub signals: Vec<Signal>,
    /// Audit record, absent when the event was skipped.
    pub audit: Option<IssueRecord>,
    /// Sweep run as part of the event.
    pub sweep: Option<SweepReport>,
    /// Sub-steps that failed.
    pub failures: Vec<StepFailure>,
}

/// Result of handling a [`ReturnEvent`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReturnOutcome {
    /// Advisory signals.
    pub signals: Vec<Signal>,
    /// Fine owed on the returned loan.
    pub fine: Option<Money>,
    /// Audit record, absent when the event was skipped.
    pub audit: Option<ReturnRecord>,
    /// Sweep run as part of the event.
    pub sweep: Option<SweepReport>,
    /// Member's loan counts after the sweep.
    pub standing: Option<MemberStanding>,
    /// Sub-steps that failed.
    pub failures: Vec<StepFailure>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lending::types::fixtures::{date, loan};

    #[test]
    fn test_issue_event_from_transaction() {
        let event = IssueEvent::from_transaction(loan(1, 7, date(2026, 1, 1)));
        assert_eq!(event.member.map(|m| m.member_code), Some("M-0007".to_string()));
        assert!(event.book.is_some());
        assert!(event.transaction.is_some());
    }

    #[test]
    fn test_violation_signals() {
        assert!(Signal::OverdueHold { count: 1 }.is_violation());
        assert!(Signal::BorrowingLimitReached { active: 5, max: 5 }.is_violation());
        assert!(!Signal::BorrowingCapacity { active: 1, max: 5 }.is_violation());
        assert!(!Signal::NotYetAvailable.is_violation());
    }

    #[test]
    fn test_step_failure_message() {
        let failure = StepFailure::new(Step::OverdueSweep, None, &"disk full");
        assert_eq!(failure.message, "disk full");
        assert_eq!(failure.step.to_string(), "overdue sweep");
    }
}
