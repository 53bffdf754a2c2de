//! Libris circulation CLI.
//!
//! Fires loan events at the lending engine over the configured database and
//! prints each outcome as JSON on stdout. Logs and audit lines go to stderr.
//!
//! Usage:
//!   libris issue 42           - Handle the issue of loan 42
//!   libris return 42 --close  - Handle the return of loan 42 and close it
//!   libris sweep              - Move past-due loans to OVERDUE
//!   libris fine 42            - Preview the fine owed on loan 42
//!   libris standing 7         - Show member 7's loan counts

use std::process::ExitCode;
use std::sync::Arc;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use libris_core::lending::{
    Clock, FixedClock, IssueEvent, LendingEngine, LendingError, LendingPolicy, LoanTransaction,
    ReturnEvent, SystemClock, TracingAuditSink, TransactionStore,
};
use libris_db::{LoanTransactionRepository, connect_with};
use libris_shared::types::{MemberId, TransactionId};
use libris_shared::{AppConfig, AppError, AppResult};

#[derive(Parser)]
#[command(name = "libris")]
#[command(about = "Handle library loan events and overdue fines")]
struct Cli {
    /// Treat this date as today instead of the local date
    #[arg(long, global = true)]
    today: Option<NaiveDate>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Handle a freshly issued loan
    Issue {
        /// Loan transaction id
        transaction: TransactionId,
    },
    /// Handle a loan being returned
    Return {
        /// Loan transaction id
        transaction: TransactionId,
        /// Also mark the loan returned and store the final fine
        #[arg(long)]
        close: bool,
    },
    /// Run the overdue sweep
    Sweep,
    /// Preview the fine owed on a loan
    Fine {
        /// Loan transaction id
        transaction: TransactionId,
    },
    /// Show a member's active and overdue loan counts
    Standing {
        /// Member id
        member: MemberId,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let Some(app) = e.downcast_ref::<AppError>() else {
                error!(error = %e, "Command failed");
                eprintln!("error: {e:#}");
                return ExitCode::FAILURE;
            };
            error!(error = %app, code = app.error_code(), "Command failed");
            eprintln!("error[{}]: {app}", app.error_code());
            ExitCode::from(u8::try_from(app.exit_code()).unwrap_or(1))
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = AppConfig::load()?;
    init_tracing(config.logging.json);

    let db = connect_with(&config.database)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;
    info!("Connected to database");

    let repo = Arc::new(LoanTransactionRepository::new(db));
    let clock: Arc<dyn Clock> = match cli.today {
        Some(day) => Arc::new(FixedClock(day)),
        None => Arc::new(SystemClock),
    };
    let policy = LendingPolicy::from(&config.lending);
    let engine = LendingEngine::new(
        repo.clone(),
        clock.clone(),
        Arc::new(TracingAuditSink),
        policy,
    );

    match cli.command {
        Commands::Issue { transaction } => {
            let found = repo.find_by_id(transaction).await.map_err(domain)?;
            let event = issue_event(transaction, found)?;
            print_json(&engine.on_loan_issued(event).await)
        }
        Commands::Return { transaction, close } => {
            let outcome = engine.on_loan_returned(ReturnEvent::for_id(transaction)).await;
            print_json(&outcome)?;
            if close && outcome.audit.is_some() {
                close_loan(repo.as_ref(), transaction, clock.today(), &policy).await?;
            }
            Ok(())
        }
        Commands::Sweep => print_json(&engine.run_overdue_sweep().await),
        Commands::Fine { transaction } => {
            let fine = engine.preview_fine(transaction).await.map_err(AppError::from)?;
            print_json(&fine)
        }
        Commands::Standing { member } => {
            let member = repo
                .find_member(member)
                .await
                .map_err(domain)?
                .ok_or_else(|| AppError::NotFound(format!("member {member}")))?;
            let standing = engine.member_standing(&member).await.map_err(AppError::from)?;
            print_json(&standing)
        }
    }
}

/// Marks a loan returned and writes the final fine.
async fn close_loan(
    store: &dyn TransactionStore,
    id: TransactionId,
    today: NaiveDate,
    policy: &LendingPolicy,
) -> anyhow::Result<()> {
    let mut loan = store
        .find_by_id(id)
        .await
        .map_err(domain)?
        .ok_or(AppError::from(LendingError::NotFound(id)))?;
    loan.mark_returned(today, &policy.fines)
        .map_err(AppError::from)?;
    store.update(&loan).await.map_err(domain)?;
    info!(transaction_id = %id, fine = %loan.fine_amount, "Loan closed");
    Ok(())
}

/// Builds the issue event for a loaded loan; a missing loan is an error.
fn issue_event(id: TransactionId, found: Option<LoanTransaction>) -> AppResult<IssueEvent> {
    found
        .map(IssueEvent::from_transaction)
        .ok_or_else(|| AppError::from(LendingError::NotFound(id)))
}

fn domain(e: impl Into<LendingError>) -> AppError {
    AppError::from(e.into())
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "libris=info".into());
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
