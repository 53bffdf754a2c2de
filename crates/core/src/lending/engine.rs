//! Lending engine: handles loan issue and return events.
//!
//! Handlers are best-effort. They never return an error: missing inputs
//! become [`Signal`]s and failed sub-steps become [`StepFailure`]s in the
//! outcome, so the caller's issue or return action always goes ahead.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{info, instrument, warn};

use libris_shared::types::{Money, TransactionId};

use crate::lending::audit::{
    AuditEvent, AuditSink, BookRef, IssueRecord, MemberRef, ReturnKind, ReturnRecord,
};
use crate::lending::error::LendingError;
use crate::lending::fine::days_overdue;
use crate::lending::outcome::{
    IssueEvent, IssueOutcome, ReturnEvent, ReturnOutcome, Signal, Step, StepFailure,
};
use crate::lending::policy::{
    BorrowingLimit, LendingPolicy, MemberStanding, check_borrowing_limit, count_overdue_holds,
};
use crate::lending::store::{Clock, TransactionStore};
use crate::lending::sweep::{SweepReport, run_sweep};
use crate::lending::types::{LoanStatus, Member};

/// Loan lifecycle engine.
///
/// Holds an async mutex for the duration of each handler so read-compute-write
/// passes issued through one engine never interleave.
pub struct LendingEngine {
    store: Arc<dyn TransactionStore>,
    clock: Arc<dyn Clock>,
    audit: Arc<dyn AuditSink>,
    policy: LendingPolicy,
    pass: Mutex<()>,
}

impl std::fmt::Debug for LendingEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LendingEngine")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl LendingEngine {
    /// Creates an engine over `store` with the given policy.
    #[must_use]
    pub fn new(
        store: Arc<dyn TransactionStore>,
        clock: Arc<dyn Clock>,
        audit: Arc<dyn AuditSink>,
        policy: LendingPolicy,
    ) -> Self {
        Self {
            store,
            clock,
            audit,
            policy,
            pass: Mutex::new(()),
        }
    }

    /// Policy in force.
    #[must_use]
    pub fn policy(&self) -> &LendingPolicy {
        &self.policy
    }

    /// Handles a freshly issued loan.
    ///
    /// Runs the overdue-hold check, the borrowing-limit check, and the
    /// overdue sweep, then records the issue audit record.
    #[instrument(skip_all, fields(transaction_id = ?event.transaction.as_ref().and_then(|t| t.id)))]
    pub async fn on_loan_issued(&self, event: IssueEvent) -> IssueOutcome {
        let mut outcome = IssueOutcome::default();

        let (Some(transaction), Some(book), Some(member)) =
            (&event.transaction, &event.book, &event.member)
        else {
            warn!("Issue event received but transaction data not available");
            outcome.signals.push(Signal::NotYetAvailable);
            return outcome;
        };

        let _pass = self.pass.lock().await;
        let today = self.clock.today();
        let member_ref = MemberRef::from(member);

        self.audit.record(&AuditEvent::Borrowed {
            member: member_ref.clone(),
            book: BookRef::from(book),
        });

        match self.store.find_all().await {
            Ok(loans) => {
                let holds = count_overdue_holds(member, &loans, today);
                if holds > 0 {
                    outcome.signals.push(Signal::OverdueHold { count: holds });
                    self.audit.record(&AuditEvent::OverdueHold {
                        member: member_ref.clone(),
                        count: holds,
                    });
                }

                match check_borrowing_limit(member, &loans, self.policy.max_active_borrows) {
                    BorrowingLimit::Reached { active, max } => {
                        outcome
                            .signals
                            .push(Signal::BorrowingLimitReached { active, max });
                        self.audit.record(&AuditEvent::BorrowingLimitReached {
                            member: member_ref.clone(),
                            max,
                            active,
                        });
                    }
                    BorrowingLimit::Within { active, max } => {
                        outcome.signals.push(Signal::BorrowingCapacity { active, max });
                        self.audit.record(&AuditEvent::BorrowingCapacity {
                            member: member_ref.clone(),
                            active,
                            max,
                        });
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, member_id = %member.id, "Could not load loans for member checks");
                outcome
                    .failures
                    .push(StepFailure::new(Step::MemberChecks, transaction.id, &e));
            }
        }

        let sweep = self.sweep_locked(today).await;
        outcome.failures.extend(sweep.failures.iter().cloned());
        outcome.sweep = Some(sweep);

        let record = IssueRecord {
            transaction_id: transaction.id.map_or(0, TransactionId::into_inner),
            book: BookRef::from(book),
            member: member_ref,
            issue_date: transaction.issue_date,
            due_date: transaction.due_date,
        };
        self.audit.record(&AuditEvent::Issued(record.clone()));
        outcome.audit = Some(record);

        outcome
    }

    /// Handles a loan being returned.
    ///
    /// Reloads the stored loan, reports its fine, runs the overdue sweep,
    /// and reports the member's remaining loans. Does not close the loan;
    /// that is [`crate::lending::LoanTransaction::mark_returned`].
    #[instrument(skip_all, fields(transaction_id = ?event.transaction_id))]
    pub async fn on_loan_returned(&self, event: ReturnEvent) -> ReturnOutcome {
        let mut outcome = ReturnOutcome::default();

        let Some(id) = event.transaction_id else {
            warn!("Return event received but transaction data not available");
            outcome.signals.push(Signal::NotYetAvailable);
            return outcome;
        };

        let _pass = self.pass.lock().await;
        let today = self.clock.today();

        let loan = match self.store.find_by_id(id).await {
            Ok(Some(loan)) => loan,
            Ok(None) => {
                warn!("Return event received but transaction not found");
                outcome.signals.push(Signal::NotFound { id });
                return outcome;
            }
            Err(e) => {
                warn!(error = %e, "Could not load transaction for return");
                outcome
                    .failures
                    .push(StepFailure::new(Step::LoadTransaction, Some(id), &e));
                return outcome;
            }
        };

        let fine = self.policy.fines.fine_money(&loan, today);
        let kind = if loan.status == LoanStatus::Overdue {
            ReturnKind::OverdueReturn
        } else {
            ReturnKind::OnTimeReturn
        };
        let record = ReturnRecord {
            transaction_id: id,
            book: BookRef::from(&loan.book),
            member: MemberRef::from(&loan.member),
            return_date: today,
            days_overdue: days_overdue(&loan, today),
            fine,
            kind,
        };
        self.audit.record(&AuditEvent::ReturnReceived(record.clone()));
        self.audit.record(&AuditEvent::Returned(record.clone()));
        outcome.fine = Some(fine);
        outcome.audit = Some(record);

        let sweep = self.sweep_locked(today).await;
        outcome.failures.extend(sweep.failures.iter().cloned());
        outcome.sweep = Some(sweep);

        match self.standing_of(&loan.member).await {
            Ok(standing) => {
                self.audit.record(&AuditEvent::Standing {
                    member: MemberRef::from(&loan.member),
                    standing,
                });
                outcome.standing = Some(standing);
            }
            Err(e) => {
                warn!(error = %e, "Could not compute member standing");
                outcome
                    .failures
                    .push(StepFailure::new(Step::MemberStanding, Some(id), &e));
            }
        }

        outcome
    }

    /// Runs the overdue sweep on its own.
    pub async fn run_overdue_sweep(&self) -> SweepReport {
        let _pass = self.pass.lock().await;
        let today = self.clock.today();
        self.sweep_locked(today).await
    }

    /// Fine owed on a stored loan as of today. Changes nothing.
    pub async fn preview_fine(&self, id: TransactionId) -> Result<Money, LendingError> {
        let loan = self
            .store
            .find_by_id(id)
            .await?
            .ok_or(LendingError::NotFound(id))?;
        Ok(self.policy.fines.fine_money(&loan, self.clock.today()))
    }

    /// Current loan counts for `member`.
    pub async fn member_standing(&self, member: &Member) -> Result<MemberStanding, LendingError> {
        self.standing_of(member).await
    }

    async fn standing_of(&self, member: &Member) -> Result<MemberStanding, LendingError> {
        let loans = self.store.find_all().await?;
        Ok(MemberStanding::of(member, &loans))
    }

    async fn sweep_locked(&self, today: chrono::NaiveDate) -> SweepReport {
        let report = run_sweep(self.store.as_ref(), today, &self.policy.fines).await;
        if report.transitioned > 0 {
            info!(count = report.transitioned, "Loans moved to OVERDUE");
            self.audit.record(&AuditEvent::OverdueSweep {
                transitioned: report.transitioned,
            });
        }
        report
    }
}
