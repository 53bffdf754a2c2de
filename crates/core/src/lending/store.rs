//! Persistence and clock seams for the lending engine.

use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::NaiveDate;
use dashmap::DashMap;

use libris_shared::types::TransactionId;

use crate::lending::error::StoreError;
use crate::lending::types::LoanTransaction;

/// Read/update access to persisted loans.
///
/// An `update` must be visible to every later `find_by_id` and `find_all`
/// made through the same store.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Loads a single loan.
    async fn find_by_id(&self, id: TransactionId) -> Result<Option<LoanTransaction>, StoreError>;

    /// Loads every loan, ordered by id.
    async fn find_all(&self) -> Result<Vec<LoanTransaction>, StoreError>;

    /// Writes back status, dates, and fine of an existing loan.
    async fn update(&self, transaction: &LoanTransaction) -> Result<(), StoreError>;
}

/// Source of "today".
pub trait Clock: Send + Sync {
    /// The current calendar date.
    fn today(&self) -> NaiveDate;
}

/// Local wall-clock date.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        chrono::Local::now().date_naive()
    }
}

/// A clock stuck on one day.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

/// Process-local store backed by a concurrent map.
#[derive(Debug)]
pub struct MemoryTransactionStore {
    loans: DashMap<TransactionId, LoanTransaction>,
    next_id: AtomicI64,
}

impl Default for MemoryTransactionStore {
    fn default() -> Self {
        Self {
            loans: DashMap::new(),
            next_id: AtomicI64::new(1),
        }
    }
}

impl MemoryTransactionStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Persists a loan, assigning an id if it has none, and returns the stored copy.
    pub fn insert(&self, mut transaction: LoanTransaction) -> LoanTransaction {
        let id = match transaction.id {
            Some(id) => {
                self.next_id.fetch_max(id.into_inner() + 1, Ordering::SeqCst);
                id
            }
            None => TransactionId::new(self.next_id.fetch_add(1, Ordering::SeqCst)),
        };
        transaction.id = Some(id);
        self.loans.insert(id, transaction.clone());
        transaction
    }

    /// Number of stored loans.
    #[must_use]
    pub fn len(&self) -> usize {
        self.loans.len()
    }

    /// Returns true if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.loans.is_empty()
    }
}

#[async_trait]
impl TransactionStore for MemoryTransactionStore {
    async fn find_by_id(&self, id: TransactionId) -> Result<Option<LoanTransaction>, StoreError> {
        Ok(self.loans.get(&id).map(|entry| entry.value().clone()))
    }

    async fn find_all(&self) -> Result<Vec<LoanTransaction>, StoreError> {
        let mut all: Vec<LoanTransaction> =
            self.loans.iter().map(|entry| entry.value().clone()).collect();
        all.sort_by_key(|t| t.id);
        Ok(all)
    }

    async fn update(&self, transaction: &LoanTransaction) -> Result<(), StoreError> {
        let id = transaction.id.ok_or(StoreError::Unpersisted)?;
        let mut slot = self.loans.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        *slot = transaction.clone();
        Ok(())
    }
}
