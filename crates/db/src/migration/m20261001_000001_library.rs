//! Initial library migration.
//!
//! Creates the catalogue, membership, and loan transaction tables.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: CATALOGUE & MEMBERSHIP
        // ============================================================
        db.execute_unprepared(BOOKS_SQL).await?;
        db.execute_unprepared(MEMBERS_SQL).await?;

        // ============================================================
        // PART 2: LOANS
        // ============================================================
        db.execute_unprepared(LOAN_TRANSACTIONS_SQL).await?;

        // ============================================================
        // PART 3: TRIGGERS
        // ============================================================
        db.execute_unprepared(TRIGGERS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

// ============================================================
// SQL CONSTANTS
// ============================================================

const BOOKS_SQL: &str = r"
CREATE TABLE books (
    id BIGSERIAL PRIMARY KEY,
    isbn VARCHAR(20) NOT NULL UNIQUE,
    title VARCHAR(500) NOT NULL,
    quantity INTEGER NOT NULL,
    available_copies INTEGER NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_books_quantity CHECK (quantity >= 0),
    CONSTRAINT chk_books_available CHECK (available_copies BETWEEN 0 AND quantity)
);
";

const MEMBERS_SQL: &str = r"
CREATE TABLE members (
    id BIGSERIAL PRIMARY KEY,
    member_code VARCHAR(50) NOT NULL UNIQUE,
    full_name VARCHAR(255) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
";

const LOAN_TRANSACTIONS_SQL: &str = r"
CREATE TABLE loan_transactions (
    id BIGSERIAL PRIMARY KEY,
    book_id BIGINT NOT NULL REFERENCES books(id) ON DELETE RESTRICT,
    member_id BIGINT NOT NULL REFERENCES members(id) ON DELETE RESTRICT,
    issue_date DATE,
    due_date DATE,
    return_date DATE,
    -- ISSUED is the legacy spelling of ACTIVE
    status VARCHAR(20) NOT NULL DEFAULT 'ACTIVE',
    fine_amount NUMERIC(12, 2) NOT NULL DEFAULT 0,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_loan_status CHECK (status IN ('ISSUED', 'ACTIVE', 'OVERDUE', 'RETURNED')),
    CONSTRAINT chk_loan_fine CHECK (fine_amount >= 0),
    CONSTRAINT chk_loan_return_after_issue CHECK (
        return_date IS NULL OR issue_date IS NULL OR return_date >= issue_date
    )
);

-- Member standing and limit checks
CREATE INDEX idx_loans_member ON loan_transactions(member_id) WHERE status <> 'RETURNED';

-- Overdue sweep candidates
CREATE INDEX idx_loans_open_due ON loan_transactions(due_date) WHERE status <> 'RETURNED';
";

const TRIGGERS_SQL: &str = r"
CREATE OR REPLACE FUNCTION touch_updated_at()
RETURNS TRIGGER AS $$
BEGIN
    NEW.updated_at = now();
    RETURN NEW;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_books_updated_at
BEFORE UPDATE ON books
FOR EACH ROW EXECUTE FUNCTION touch_updated_at();

CREATE TRIGGER trg_loans_updated_at
BEFORE UPDATE ON loan_transactions
FOR EACH ROW EXECUTE FUNCTION touch_updated_at();
";

const DROP_ALL_SQL: &str = r"
DROP TABLE IF EXISTS loan_transactions CASCADE;
DROP TABLE IF EXISTS members CASCADE;
DROP TABLE IF EXISTS books CASCADE;
DROP FUNCTION IF EXISTS touch_updated_at() CASCADE;
";
