//! Application configuration management.

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::types::Currency;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Circulation policy.
    #[serde(default)]
    pub lending: LendingConfig,
    /// Log output configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// How the fine of an already-overdue loan behaves on later sweeps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FineAccrualMode {
    /// Fine is fixed when the loan first becomes overdue.
    #[default]
    Frozen,
    /// Fine is recomputed on every sweep while the loan stays overdue.
    Accruing,
}

/// Circulation policy configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LendingConfig {
    /// Fine charged per whole day past the due date.
    #[serde(default = "default_daily_fine_rate")]
    pub daily_fine_rate: Decimal,
    /// Currency fines are charged in.
    #[serde(default = "default_currency")]
    pub currency: Currency,
    /// Number of unreturned loans at which a member hits the borrowing limit.
    #[serde(default = "default_max_active_borrows")]
    pub max_active_borrows: u32,
    /// Loan period used when issuing without an explicit due date.
    #[serde(default = "default_loan_days")]
    pub default_loan_days: u32,
    /// Fine behaviour for loans that are already overdue.
    #[serde(default)]
    pub fine_accrual: FineAccrualMode,
}

/// Highest accepted daily fine rate.
pub const MAX_DAILY_FINE_RATE: Decimal = Decimal::from_parts(10_000, 0, 0, false, 0);

fn default_daily_fine_rate() -> Decimal {
    Decimal::from(5)
}

fn default_currency() -> Currency {
    Currency::Inr
}

fn default_max_active_borrows() -> u32 {
    5
}

fn default_loan_days() -> u32 {
    14
}

impl Default for LendingConfig {
    fn default() -> Self {
        Self {
            daily_fine_rate: default_daily_fine_rate(),
            currency: default_currency(),
            max_active_borrows: default_max_active_borrows(),
            default_loan_days: default_loan_days(),
            fine_accrual: FineAccrualMode::default(),
        }
    }
}

impl LendingConfig {
    /// Checks the policy values for consistency.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` for a fine rate that is negative,
    /// above [`MAX_DAILY_FINE_RATE`] or finer than whole cents, a zero
    /// borrowing limit, or a zero loan period.
    pub fn validate(&self) -> AppResult<()> {
        if self.daily_fine_rate.is_sign_negative() {
            return Err(AppError::Validation(format!(
                "lending.daily_fine_rate must not be negative, got {}",
                self.daily_fine_rate
            )));
        }
        if self.daily_fine_rate > MAX_DAILY_FINE_RATE {
            return Err(AppError::Validation(format!(
                "lending.daily_fine_rate must not exceed {MAX_DAILY_FINE_RATE}, got {}",
                self.daily_fine_rate
            )));
        }
        // Fines are stored as NUMERIC(12, 2)
        if self.daily_fine_rate.normalize().scale() > 2 {
            return Err(AppError::Validation(format!(
                "lending.daily_fine_rate must be in whole cents, got {}",
                self.daily_fine_rate
            )));
        }
        if self.max_active_borrows == 0 {
            return Err(AppError::Validation(
                "lending.max_active_borrows must be at least 1".to_string(),
            ));
        }
        if self.default_loan_days == 0 {
            return Err(AppError::Validation(
                "lending.default_loan_days must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Log output configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded or the lending
    /// policy is invalid.
    pub fn load() -> AppResult<Self> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("LIBRIS").separator("__"))
            .build()?;

        let app: Self = config.try_deserialize()?;
        app.lending.validate()?;
        Ok(app)
    }
}
