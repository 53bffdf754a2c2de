//! Overdue sweep.
//!
//! Moves every open loan whose due date has passed from `Active` to
//! `Overdue` and assesses its fine. Loans that are already `Overdue` keep
//! their status; under `FineAccrualMode::Accruing` their fine is brought up
//! to date instead.

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, warn};

use libris_shared::FineAccrualMode;

use crate::lending::fine::FinePolicy;
use crate::lending::outcome::{Step, StepFailure};
use crate::lending::store::TransactionStore;
use crate::lending::types::{LoanStatus, LoanTransaction};

/// Kind of change the sweep makes to a loan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepChangeKind {
    /// `Active -> Overdue` with a fresh fine.
    Transitioned,
    /// Already `Overdue`, fine raised to the current amount.
    Refreshed,
}

/// A loan after the sweep has changed it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepChange {
    /// Updated record to write back.
    pub transaction: LoanTransaction,
    /// What changed.
    pub kind: SweepChangeKind,
}

/// Result of one sweep pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Loans moved to `Overdue` and persisted.
    pub transitioned: usize,
    /// Overdue loans whose fine was raised and persisted.
    pub refreshed: usize,
    /// Loads or writes that failed.
    pub failures: Vec<StepFailure>,
}

impl SweepReport {
    /// Returns true if nothing failed.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Computes the changes a sweep on `today` would make, without persisting.
#[must_use]
pub fn plan_sweep(
    transactions: &[LoanTransaction],
    today: NaiveDate,
    fines: &FinePolicy,
) -> Vec<SweepChange> {
    transactions
        .iter()
        .filter_map(|loan| match loan.status {
            LoanStatus::Active if loan.is_past_due(today) => {
                let mut updated = loan.clone();
                updated.status = LoanStatus::Overdue;
                updated.fine_amount = fines.fine_for(loan, today);
                Some(SweepChange {
                    transaction: updated,
                    kind: SweepChangeKind::Transitioned,
                })
            }
            LoanStatus::Overdue if fines.accrual == FineAccrualMode::Accruing => {
                let current = fines.fine_for(loan, today);
                (current > loan.fine_amount).then(|| {
                    let mut updated = loan.clone();
                    updated.fine_amount = current;
                    SweepChange {
                        transaction: updated,
                        kind: SweepChangeKind::Refreshed,
                    }
                })
            }
            _ => None,
        })
        .collect()
}

/// Loads every loan, applies [`plan_sweep`], and writes each change back.
///
/// A failed write is recorded and the sweep moves on to the next loan.
pub async fn run_sweep(
    store: &dyn TransactionStore,
    today: NaiveDate,
    fines: &FinePolicy,
) -> SweepReport {
    let mut report = SweepReport::default();

    let transactions = match store.find_all().await {
        Ok(transactions) => transactions,
        Err(e) => {
            warn!(error = %e, "Overdue sweep could not load transactions");
            report
                .failures
                .push(StepFailure::new(Step::OverdueSweep, None, &e));
            return report;
        }
    };

    for change in plan_sweep(&transactions, today, fines) {
        let id = change.transaction.id;
        match store.update(&change.transaction).await {
            Ok(()) => match change.kind {
                SweepChangeKind::Transitioned => report.transitioned += 1,
                SweepChangeKind::Refreshed => report.refreshed += 1,
            },
            Err(e) => {
                warn!(transaction_id = ?id, error = %e, "Failed to persist overdue status");
                report
                    .failures
                    .push(StepFailure::new(Step::OverdueSweep, id, &e));
            }
        }
    }

    debug!(
        transitioned = report.transitioned,
        refreshed = report.refreshed,
        failed = report.failures.len(),
        "Overdue sweep finished"
    );
    report
}
