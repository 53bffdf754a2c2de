//! Loan domain types.
//!
//! A `LoanTransaction` records one copy of a `Book` lent to a `Member`.
//! Status moves `Active -> Overdue -> Returned` or straight
//! `Active -> Returned`; `Returned` is terminal.

use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use libris_shared::types::{BookId, MemberId, TransactionId};

use crate::lending::error::LendingError;
use crate::lending::fine::FinePolicy;

/// Loan status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LoanStatus {
    /// Issued and not yet past its due date as far as the last sweep knows.
    #[serde(alias = "ISSUED")]
    Active,
    /// Past its due date and not returned; a fine has been assessed.
    Overdue,
    /// Book is back on the shelf (terminal).
    Returned,
}

impl LoanStatus {
    /// Returns the persisted string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Overdue => "OVERDUE",
            Self::Returned => "RETURNED",
        }
    }

    /// Parses a status from a string. `ISSUED` is accepted as `Active`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "ACTIVE" | "ISSUED" => Some(Self::Active),
            "OVERDUE" => Some(Self::Overdue),
            "RETURNED" => Some(Self::Returned),
            _ => None,
        }
    }

    /// Returns true while the book is still out.
    #[must_use]
    pub fn is_open(&self) -> bool {
        !matches!(self, Self::Returned)
    }
}

impl fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A catalogued title with its copy counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    /// Database key.
    pub id: BookId,
    /// ISBN, unique across the catalogue.
    pub isbn: String,
    /// Title.
    pub title: String,
    /// Copies owned.
    pub quantity: u32,
    /// Copies on the shelf.
    pub available_copies: u32,
}

/// A library member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    /// Database key. Loans are matched to members by this key.
    pub id: MemberId,
    /// Card number shown to staff and patrons.
    pub member_code: String,
    /// Full name.
    pub full_name: String,
}

/// One loan of a book to a member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanTransaction {
    /// Assigned by the store; `None` until persisted.
    pub id: Option<TransactionId>,
    /// Book lent.
    pub book: Book,
    /// Borrowing member.
    pub member: Member,
    /// Day the loan was issued.
    pub issue_date: Option<NaiveDate>,
    /// Day the book is due back.
    pub due_date: Option<NaiveDate>,
    /// Day the book came back.
    pub return_date: Option<NaiveDate>,
    /// Lifecycle status.
    pub status: LoanStatus,
    /// Assessed fine, never negative.
    pub fine_amount: Decimal,
}

impl LoanTransaction {
    /// Builds a fresh, unpersisted loan issued `today` and due after `loan_days`.
    #[must_use]
    pub fn issue(book: Book, member: Member, today: NaiveDate, loan_days: u32) -> Self {
        Self {
            id: None,
            book,
            member,
            issue_date: Some(today),
            due_date: today.checked_add_days(Days::new(u64::from(loan_days))),
            return_date: None,
            status: LoanStatus::Active,
            fine_amount: Decimal::ZERO,
        }
    }

    /// Returns true if this loan belongs to `member`.
    #[must_use]
    pub fn is_held_by(&self, member: MemberId) -> bool {
        self.member.id == member
    }

    /// Returns true if the loan is still out and its due date is before `today`.
    #[must_use]
    pub fn is_past_due(&self, today: NaiveDate) -> bool {
        self.status.is_open() && self.due_date.is_some_and(|due| due < today)
    }

    /// Records the return of the book on `today` and finalizes the fine.
    ///
    /// # Errors
    ///
    /// Returns `LendingError::AlreadyReturned` if the loan is closed, or
    /// `LendingError::ReturnBeforeIssue` if `today` precedes the issue date.
    pub fn mark_returned(&mut self, today: NaiveDate, fines: &FinePolicy) -> Result<(), LendingError> {
        if self.status == LoanStatus::Returned {
            return Err(LendingError::AlreadyReturned(self.id));
        }
        if let Some(issued) = self.issue_date {
            if today < issued {
                return Err(LendingError::ReturnBeforeIssue {
                    issue_date: issued,
                    return_date: today,
                });
            }
        }

        self.return_date = Some(today);
        self.fine_amount = fines.fine_for(self, today);
        self.status = LoanStatus::Returned;
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::{book, date, loan, member};
    use super::*;
    use libris_shared::types::Currency;
    use libris_shared::FineAccrualMode;
    use rust_decimal_macros::dec;

    fn fines() -> FinePolicy {
        FinePolicy::new(dec!(5), Currency::Inr, FineAccrualMode::Frozen)
    }

    #[test]
    fn test_status_round_trip_strings() {
        assert_eq!(LoanStatus::parse("issued"), Some(LoanStatus::Active));
        assert_eq!(LoanStatus::parse("ACTIVE"), Some(LoanStatus::Active));
        assert_eq!(LoanStatus::parse("Overdue"), Some(LoanStatus::Overdue));
        assert_eq!(LoanStatus::parse("returned"), Some(LoanStatus::Returned));
        assert_eq!(LoanStatus::parse("lost"), None);
        assert_eq!(LoanStatus::Overdue.to_string(), "OVERDUE");
    }

    #[test]
    fn test_only_returned_is_closed() {
        assert!(LoanStatus::Active.is_open());
        assert!(LoanStatus::Overdue.is_open());
        assert!(!LoanStatus::Returned.is_open());
    }

    #[test]
    fn test_issue_sets_dates_and_zero_fine() {
        let today = date(2026, 3, 1);
        let loan = LoanTransaction::issue(book(1), member(1), today, 14);
        assert_eq!(loan.id, None);
        assert_eq!(loan.issue_date, Some(today));
        assert_eq!(loan.due_date, Some(date(2026, 3, 15)));
        assert_eq!(loan.status, LoanStatus::Active);
        assert!(loan.fine_amount.is_zero());
    }

    #[test]
    fn test_is_past_due_is_strict() {
        let due = date(2026, 3, 10);
        let loan = loan(1, 1, due);
        assert!(!loan.is_past_due(due));
        assert!(loan.is_past_due(date(2026, 3, 11)));
    }

    #[test]
    fn test_mark_returned_late_finalizes_fine() {
        let mut loan = loan(1, 1, date(2026, 3, 10));
        loan.mark_returned(date(2026, 3, 13), &fines()).unwrap();
        assert_eq!(loan.status, LoanStatus::Returned);
        assert_eq!(loan.return_date, Some(date(2026, 3, 13)));
        assert_eq!(loan.fine_amount, dec!(15));
    }

    #[test]
    fn test_mark_returned_on_time_has_no_fine() {
        let mut loan = loan(1, 1, date(2026, 3, 10));
        loan.mark_returned(date(2026, 3, 10), &fines()).unwrap();
        assert!(loan.fine_amount.is_zero());
    }

    #[test]
    fn test_mark_returned_twice_fails() {
        let mut loan = loan(1, 1, date(2026, 3, 10));
        loan.mark_returned(date(2026, 3, 10), &fines()).unwrap();
        let err = loan.mark_returned(date(2026, 3, 11), &fines()).unwrap_err();
        assert!(matches!(err, LendingError::AlreadyReturned(_)));
    }

    #[test]
    fn test_mark_returned_before_issue_fails() {
        let mut loan = loan(1, 1, date(2026, 3, 10));
        let err = loan.mark_returned(date(2026, 2, 1), &fines()).unwrap_err();
        assert!(matches!(err, LendingError::ReturnBeforeIssue { .. }));
        assert_eq!(loan.status, LoanStatus::Active);
        assert_eq!(loan.return_date, None);
    }
}
