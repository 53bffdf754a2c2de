//! Core business logic for Libris.
//!
//! This crate contains pure circulation logic with ZERO web or database dependencies.
//! Persistence is reached only through the `TransactionStore` trait.
//!
//! # Modules
//!
//! - `lending` - Loan lifecycle, fines, and circulation policy

pub mod lending;
