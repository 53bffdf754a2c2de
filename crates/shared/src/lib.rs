//! Shared types, errors, and configuration for Libris.
//!
//! This crate provides common types used across all other crates:
//! - Money types with decimal precision
//! - Typed IDs for books, members, and loan transactions
//! - Application-wide error types
//! - Configuration management

pub mod config;
pub mod error;
pub mod types;

pub use config::{AppConfig, FineAccrualMode, LendingConfig};
pub use error::{AppError, AppResult};
