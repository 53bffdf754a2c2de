//! Loan transaction repository.
//!
//! Implements the core `TransactionStore` over `PostgreSQL`. Rows are joined
//! to their book and member so the engine always sees complete loans.

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set,
};
use tracing::debug;

use libris_core::lending::{Book, LoanStatus, LoanTransaction, Member, StoreError, TransactionStore};
use libris_shared::types::{BookId, MemberId, TransactionId};

use crate::entities::{books, loan_transactions, members};

/// Loan transaction repository.
#[derive(Debug, Clone)]
pub struct LoanTransactionRepository {
    db: DatabaseConnection,
}

impl LoanTransactionRepository {
    /// Creates a new loan transaction repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds a member by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_member(&self, id: MemberId) -> Result<Option<Member>, StoreError> {
        let row = members::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(backend)?;
        Ok(row.map(member_from_model))
    }

    /// Finds a book by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails or the stored copy
    /// counts are negative.
    pub async fn find_book(&self, id: BookId) -> Result<Option<Book>, StoreError> {
        let row = books::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(backend)?;
        row.as_ref().map(book_from_model).transpose()
    }

    /// Attaches books and members to loan rows, keeping row order.
    async fn hydrate(
        &self,
        rows: Vec<loan_transactions::Model>,
    ) -> Result<Vec<LoanTransaction>, StoreError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let book_ids: BTreeSet<i64> = rows.iter().map(|r| r.book_id).collect();
        let member_ids: BTreeSet<i64> = rows.iter().map(|r| r.member_id).collect();

        let books: HashMap<i64, books::Model> = books::Entity::find()
            .filter(books::Column::Id.is_in(book_ids))
            .all(&self.db)
            .await
            .map_err(backend)?
            .into_iter()
            .map(|b| (b.id, b))
            .collect();
        let members: HashMap<i64, members::Model> = members::Entity::find()
            .filter(members::Column::Id.is_in(member_ids))
            .all(&self.db)
            .await
            .map_err(backend)?
            .into_iter()
            .map(|m| (m.id, m))
            .collect();

        rows.into_iter()
            .map(|row| {
                let record = format!("transaction {}", row.id);
                let book = books.get(&row.book_id).ok_or_else(|| {
                    corrupt(&record, format!("book {} does not exist", row.book_id))
                })?;
                let member = members.get(&row.member_id).ok_or_else(|| {
                    corrupt(&record, format!("member {} does not exist", row.member_id))
                })?;
                loan_from_parts(row, book, member.clone())
            })
            .collect()
    }
}

#[async_trait]
impl TransactionStore for LoanTransactionRepository {
    async fn find_by_id(&self, id: TransactionId) -> Result<Option<LoanTransaction>, StoreError> {
        let Some(row) = loan_transactions::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(backend)?
        else {
            return Ok(None);
        };
        Ok(self.hydrate(vec![row]).await?.pop())
    }

    async fn find_all(&self) -> Result<Vec<LoanTransaction>, StoreError> {
        let rows = loan_transactions::Entity::find()
            .order_by_asc(loan_transactions::Column::Id)
            .all(&self.db)
            .await
            .map_err(backend)?;
        debug!(count = rows.len(), "Loaded loan transactions");
        self.hydrate(rows).await
    }

    async fn update(&self, transaction: &LoanTransaction) -> Result<(), StoreError> {
        let id = transaction.id.ok_or(StoreError::Unpersisted)?;

        let model = loan_transactions::ActiveModel {
            id: Set(id.into_inner()),
            issue_date: Set(transaction.issue_date),
            due_date: Set(transaction.due_date),
            return_date: Set(transaction.return_date),
            status: Set(transaction.status.as_str().to_string()),
            fine_amount: Set(transaction.fine_amount),
            updated_at: Set(chrono::Utc::now().into()),
            ..Default::default()
        };

        match model.update(&self.db).await {
            Ok(_) => Ok(()),
            Err(DbErr::RecordNotUpdated) => Err(StoreError::NotFound(id)),
            Err(e) => Err(backend(e)),
        }
    }
}

fn backend(e: DbErr) -> StoreError {
    StoreError::Backend(e.to_string())
}

fn corrupt(record: &str, reason: String) -> StoreError {
    StoreError::Corrupt {
        record: record.to_string(),
        reason,
    }
}

fn member_from_model(model: members::Model) -> Member {
    Member {
        id: MemberId::new(model.id),
        member_code: model.member_code,
        full_name: model.full_name,
    }
}

fn book_from_model(model: &books::Model) -> Result<Book, StoreError> {
    let count = |value: i32, field: &str| {
        u32::try_from(value).map_err(|_| {
            corrupt(
                &format!("book {}", model.id),
                format!("negative {field}: {value}"),
            )
        })
    };
    Ok(Book {
        id: BookId::new(model.id),
        isbn: model.isbn.clone(),
        title: model.title.clone(),
        quantity: count(model.quantity, "quantity")?,
        available_copies: count(model.available_copies, "available_copies")?,
    })
}

fn loan_from_parts(
    row: loan_transactions::Model,
    book: &books::Model,
    member: members::Model,
) -> Result<LoanTransaction, StoreError> {
    let id = TransactionId::new(row.id);
    let status = LoanStatus::parse(&row.status).ok_or_else(|| {
        corrupt(
            &format!("transaction {id}"),
            format!("unknown status '{}'", row.status),
        )
    })?;
    let book = book_from_model(book)?;

    Ok(LoanTransaction {
        id: Some(id),
        book,
        member: member_from_model(member),
        issue_date: row.issue_date,
        due_date: row.due_date,
        return_date: row.return_date,
        status,
        fine_amount: row.fine_amount,
    })
}
