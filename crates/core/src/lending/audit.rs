//! Audit trail for circulation events.
//!
//! Events are plain data. Text rendering lives in the `Display` impls and is
//! only applied by sinks that want a line of text.

use std::fmt;
use std::sync::{Mutex, PoisonError};

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, warn};

use libris_shared::types::{Money, TransactionId};

use crate::lending::policy::MemberStanding;
use crate::lending::types::{Book, Member};

/// Member identity as shown in audit lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberRef {
    /// Full name.
    pub name: String,
    /// Card number.
    pub member_code: String,
}

impl From<&Member> for MemberRef {
    fn from(member: &Member) -> Self {
        Self {
            name: member.full_name.clone(),
            member_code: member.member_code.clone(),
        }
    }
}

impl fmt::Display for MemberRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.member_code)
    }
}

/// Book identity and copy counts as shown in audit lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookRef {
    /// Title.
    pub title: String,
    /// ISBN.
    pub isbn: String,
    /// Copies on the shelf.
    pub available_copies: u32,
    /// Copies owned.
    pub quantity: u32,
}

impl From<&Book> for BookRef {
    fn from(book: &Book) -> Self {
        Self {
            title: book.title.clone(),
            isbn: book.isbn.clone(),
            available_copies: book.available_copies,
            quantity: book.quantity,
        }
    }
}

/// Audit record of an issued loan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssueRecord {
    /// Loan id, 0 if the loan was not persisted yet.
    pub transaction_id: i64,
    /// Book lent.
    pub book: BookRef,
    /// Borrower.
    pub member: MemberRef,
    /// Day issued.
    pub issue_date: Option<NaiveDate>,
    /// Day due.
    pub due_date: Option<NaiveDate>,
}

/// How a return relates to the loan's stored status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReturnKind {
    /// The loan was already marked overdue.
    OverdueReturn,
    /// The loan was not marked overdue.
    OnTimeReturn,
}

impl fmt::Display for ReturnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OverdueReturn => f.write_str("OVERDUE RETURN"),
            Self::OnTimeReturn => f.write_str("ON-TIME RETURN"),
        }
    }
}

/// Audit record of a returned loan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReturnRecord {
    /// Loan id.
    pub transaction_id: TransactionId,
    /// Book returned.
    pub book: BookRef,
    /// Borrower.
    pub member: MemberRef,
    /// Day of return.
    pub return_date: NaiveDate,
    /// Whole days past due.
    pub days_overdue: i64,
    /// Fine owed.
    pub fine: Money,
    /// Overdue or on-time.
    pub kind: ReturnKind,
}

/// Severity an event is logged at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditLevel {
    /// Routine.
    Info,
    /// Policy violation.
    Warning,
}

/// Something worth recording about a circulation event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AuditEvent {
    /// A member borrowed a book.
    Borrowed {
        /// Borrower.
        member: MemberRef,
        /// Book.
        book: BookRef,
    },
    /// Loan issued.
    Issued(IssueRecord),
    /// A member brought a book back.
    ReturnReceived(ReturnRecord),
    /// Loan returned.
    Returned(ReturnRecord),
    /// Member holds overdue loans.
    OverdueHold {
        /// Member.
        member: MemberRef,
        /// Number of overdue loans.
        count: usize,
    },
    /// Member is at the borrowing limit.
    BorrowingLimitReached {
        /// Member.
        member: MemberRef,
        /// Configured limit.
        max: u32,
        /// Unreturned loans.
        active: usize,
    },
    /// Member is within the borrowing limit.
    BorrowingCapacity {
        /// Member.
        member: MemberRef,
        /// Unreturned loans.
        active: usize,
        /// Configured limit.
        max: u32,
    },
    /// The sweep moved loans to overdue.
    OverdueSweep {
        /// Number of loans moved.
        transitioned: usize,
    },
    /// Member's loan counts after a return.
    Standing {
        /// Member.
        member: MemberRef,
        /// Counts.
        standing: MemberStanding,
    },
}

impl AuditEvent {
    /// Severity for this event.
    #[must_use]
    pub fn level(&self) -> AuditLevel {
        match self {
            Self::OverdueHold { .. } | Self::BorrowingLimitReached { .. } => AuditLevel::Warning,
            _ => AuditLevel::Info,
        }
    }

    /// Short machine name of the event.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Borrowed { .. } => "borrowed",
            Self::Issued(_) => "issued",
            Self::ReturnReceived(_) => "return_received",
            Self::Returned(_) => "returned",
            Self::OverdueHold { .. } => "overdue_hold",
            Self::BorrowingLimitReached { .. } => "borrowing_limit_reached",
            Self::BorrowingCapacity { .. } => "borrowing_capacity",
            Self::OverdueSweep { .. } => "overdue_sweep",
            Self::Standing { .. } => "standing",
        }
    }
}

struct DateOrNa(Option<NaiveDate>);

impl fmt::Display for DateOrNa {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(date) => write!(f, "{}", date.format("%Y-%m-%d")),
            None => f.write_str("N/A"),
        }
    }
}

impl fmt::Display for AuditEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Borrowed { member, book } => write!(
                f,
                "BORROW EVENT: Member {member} borrowed book '{}' (ISBN: {}). Available copies: {}/{}",
                book.title, book.isbn, book.available_copies, book.quantity
            ),
            Self::Issued(r) => write!(
                f,
                "BOOK ISSUED - Transaction ID: {} | Book: {} (ISBN: {}) | Member: {} | Issue Date: {} | Due Date: {}",
                r.transaction_id,
                r.book.title,
                r.book.isbn,
                r.member,
                DateOrNa(r.issue_date),
                DateOrNa(r.due_date)
            ),
            Self::ReturnReceived(r) => write!(
                f,
                "RETURN EVENT: Member {} returned book '{}' (ISBN: {}). Days overdue: {}, Fine: {}. Available copies: {}/{}",
                r.member,
                r.book.title,
                r.book.isbn,
                r.days_overdue,
                r.fine,
                r.book.available_copies,
                r.book.quantity
            ),
            Self::Returned(r) => write!(
                f,
                "BOOK RETURNED - Transaction ID: {} | Book: {} (ISBN: {}) | Member: {} | Return Date: {} | Fine: {} | Status: {}",
                r.transaction_id,
                r.book.title,
                r.book.isbn,
                r.member,
                r.return_date.format("%Y-%m-%d"),
                r.fine,
                r.kind
            ),
            Self::OverdueHold { member, count } => write!(
                f,
                "WARNING: Member {member} has {count} overdue book(s). Please return them before borrowing new books."
            ),
            Self::BorrowingLimitReached {
                member,
                max,
                active,
            } => write!(
                f,
                "WARNING: Member {member} has reached borrowing limit ({max} books). Current active borrows: {active}"
            ),
            Self::BorrowingCapacity {
                member,
                active,
                max,
            } => write!(
                f,
                "Member {member} has {active} active borrow(s) out of {max} allowed"
            ),
            Self::OverdueSweep { transitioned } => {
                write!(f, "Updated {transitioned} transaction(s) to OVERDUE status")
            }
            Self::Standing { member, standing } => write!(
                f,
                "Member {member} currently has {} active borrow(s), {} overdue",
                standing.active, standing.overdue
            ),
        }
    }
}

/// Receives audit events.
pub trait AuditSink: Send + Sync {
    /// Records one event.
    fn record(&self, event: &AuditEvent);
}

/// Writes each event as a rendered line through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, event: &AuditEvent) {
        match event.level() {
            AuditLevel::Info => info!(target: "libris::audit", kind = event.kind(), "{event}"),
            AuditLevel::Warning => warn!(target: "libris::audit", kind = event.kind(), "{event}"),
        }
    }
}

/// Keeps events in memory.
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    events: Mutex<Vec<AuditEvent>>,
}

impl MemoryAuditSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copies out everything recorded so far.
    #[must_use]
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Rendered lines of everything recorded so far.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.events().iter().map(ToString::to_string).collect()
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(&self, event: &AuditEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lending::types::fixtures::{book, date, member};
    use libris_shared::types::Currency;
    use rust_decimal_macros::dec;

    fn return_record(kind: ReturnKind) -> ReturnRecord {
        ReturnRecord {
            transaction_id: TransactionId::new(12),
            book: BookRef::from(&book(3)),
            member: MemberRef::from(&member(4)),
            return_date: date(2026, 10, 16),
            days_overdue: 10,
            fine: Money::new(dec!(50), Currency::Inr),
            kind,
        }
    }

    #[test]
    fn test_issue_line() {
        let event = AuditEvent::Issued(IssueRecord {
            transaction_id: 0,
            book: BookRef::from(&book(3)),
            member: MemberRef::from(&member(4)),
            issue_date: Some(date(2026, 10, 2)),
            due_date: None,
        });
        assert_eq!(
            event.to_string(),
            "BOOK ISSUED - Transaction ID: 0 | Book: Book 3 (ISBN: 978-0-00-000003-0) | \
             Member: Member 4 (M-0004) | Issue Date: 2026-10-02 | Due Date: N/A"
        );
    }

    #[test]
    fn test_return_lines() {
        assert_eq!(
            AuditEvent::Returned(return_record(ReturnKind::OverdueReturn)).to_string(),
            "BOOK RETURNED - Transaction ID: 12 | Book: Book 3 (ISBN: 978-0-00-000003-0) | \
             Member: Member 4 (M-0004) | Return Date: 2026-10-16 | Fine: ₹50.00 | Status: OVERDUE RETURN"
        );
        assert_eq!(
            AuditEvent::ReturnReceived(return_record(ReturnKind::OnTimeReturn)).to_string(),
            "RETURN EVENT: Member Member 4 (M-0004) returned book 'Book 3' (ISBN: 978-0-00-000003-0). \
             Days overdue: 10, Fine: ₹50.00. Available copies: 2/3"
        );
    }

    #[test]
    fn test_policy_lines_and_levels() {
        let hold = AuditEvent::OverdueHold {
            member: MemberRef::from(&member(1)),
            count: 2,
        };
        assert_eq!(hold.level(), AuditLevel::Warning);
        assert_eq!(
            hold.to_string(),
            "WARNING: Member Member 1 (M-0001) has 2 overdue book(s). \
             Please return them before borrowing new books."
        );

        let capacity = AuditEvent::BorrowingCapacity {
            member: MemberRef::from(&member(1)),
            active: 2,
            max: 5,
        };
        assert_eq!(capacity.level(), AuditLevel::Info);
        assert_eq!(
            capacity.to_string(),
            "Member Member 1 (M-0001) has 2 active borrow(s) out of 5 allowed"
        );
    }

    #[test]
    fn test_standing_line() {
        let event = AuditEvent::Standing {
            member: MemberRef::from(&member(9)),
            standing: MemberStanding {
                active: 3,
                overdue: 1,
            },
        };
        assert_eq!(
            event.to_string(),
            "Member Member 9 (M-0009) currently has 3 active borrow(s), 1 overdue"
        );
    }

    #[test]
    fn test_memory_sink_collects() {
        let sink = MemoryAuditSink::new();
        sink.record(&AuditEvent::OverdueSweep { transitioned: 3 });
        assert_eq!(sink.events().len(), 1);
        assert_eq!(sink.lines(), vec!["Updated 3 transaction(s) to OVERDUE status"]);
    }
}
