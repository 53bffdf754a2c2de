//! Lending error types.

use chrono::NaiveDate;
use thiserror::Error;

use libris_shared::AppError;
use libris_shared::types::TransactionId;

/// Errors raised by a `TransactionStore` implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The record has no id, so it cannot be updated.
    #[error("Transaction has not been persisted")]
    Unpersisted,

    /// No record with this id exists.
    #[error("Transaction not found: {0}")]
    NotFound(TransactionId),

    /// A stored row could not be mapped to a domain value.
    #[error("Corrupt record {record}: {reason}")]
    Corrupt {
        /// Which row, e.g. `transaction 21` or `book 4`.
        record: String,
        /// What was wrong with it.
        reason: String,
    },

    /// The storage backend failed.
    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Lending-related errors.
#[derive(Debug, Error)]
pub enum LendingError {
    /// Loan not found.
    #[error("Transaction not found: {0}")]
    NotFound(TransactionId),

    /// Loan is already closed.
    #[error("Transaction {} is already returned", display_id(.0))]
    AlreadyReturned(Option<TransactionId>),

    /// Return date precedes the issue date.
    #[error("Return date {return_date} is before issue date {issue_date}")]
    ReturnBeforeIssue {
        /// Day the loan was issued.
        issue_date: NaiveDate,
        /// Attempted return day.
        return_date: NaiveDate,
    },

    /// Persistence failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

fn display_id(id: &Option<TransactionId>) -> String {
    id.map_or_else(|| "(unsaved)".to_string(), |id| id.to_string())
}

impl From<LendingError> for AppError {
    fn from(err: LendingError) -> Self {
        match err {
            LendingError::NotFound(_) | LendingError::Store(StoreError::NotFound(_)) => {
                Self::NotFound(err.to_string())
            }
            LendingError::AlreadyReturned(_) => Self::BusinessRule(err.to_string()),
            LendingError::ReturnBeforeIssue { .. } | LendingError::Store(StoreError::Unpersisted) => {
                Self::Validation(err.to_string())
            }
            LendingError::Store(StoreError::Backend(_) | StoreError::Corrupt { .. }) => {
                Self::Database(err.to_string())
            }
        }
    }
}
