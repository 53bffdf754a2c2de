//! `SeaORM` entity definitions.

pub mod books;
pub mod loan_transactions;
pub mod members;
