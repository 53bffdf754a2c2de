//! Repository abstractions for data access.
//!
//! Repositories hide the `SeaORM` implementation details from the rest of
//! the application and expose the core store traits instead.

pub mod loan_transaction;

pub use loan_transaction::LoanTransactionRepository;
