//! Loan lifecycle management for Libris.
//!
//! This module implements the loan state machine (active → overdue →
//! returned), late-fine calculation, advisory circulation policy, and the
//! issue/return event handlers that tie them to a transaction store.
//!
//! # Modules
//!
//! - `types` - Loan, book, and member types
//! - `fine` - Late-fine calculation
//! - `policy` - Borrowing limit and overdue-hold checks
//! - `sweep` - Overdue sweep
//! - `audit` - Audit events, rendering, and sinks
//! - `store` - Transaction store and clock seams
//! - `outcome` - Event inputs, signals, and handler results
//! - `engine` - Issue/return event handlers

pub mod audit;
pub mod engine;
pub mod error;
pub mod fine;
pub mod outcome;
pub mod policy;
pub mod store;
pub mod sweep;
pub mod types;

#[cfg(test)]
mod fine_props;
#[cfg(test)]
mod sweep_props;

pub use audit::{AuditEvent, AuditSink, MemoryAuditSink, ReturnKind, TracingAuditSink};
pub use engine::LendingEngine;
pub use error::{LendingError, StoreError};
pub use fine::{FinePolicy, days_overdue};
pub use outcome::{IssueEvent, IssueOutcome, ReturnEvent, ReturnOutcome, Signal, StepFailure};
pub use policy::{LendingPolicy, MemberStanding};
pub use store::{Clock, FixedClock, MemoryTransactionStore, SystemClock, TransactionStore};
pub use sweep::SweepReport;
pub use types::{Book, LoanStatus, LoanTransaction, Member};
