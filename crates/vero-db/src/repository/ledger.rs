//! # Ledger Entry Repository
//!
//! Append-only. There is no update or delete method on purpose: a posted
//! entry is immutable, and register balances move only in the same
//! transaction that appends the entry.

use sqlx::{SqliteConnection, SqlitePool};

use crate::error::DbResult;
use vero_core::LedgerEntry;

/// Repository for ledger entry rows.
#[derive(Debug, Clone)]
pub struct LedgerRepository {
    pool: SqlitePool,
}

impl LedgerRepository {
    /// Creates a new LedgerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        LedgerRepository { pool }
    }

    /// Appends a ledger entry.
    pub async fn insert(&self, conn: &mut SqliteConnection, entry: &LedgerEntry) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO ledger_entries
                (id, register_id, memo, amount_cents, kind, direction,
                 operator_id, installment_id, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&entry.id)
        .bind(&entry.register_id)
        .bind(&entry.memo)
        .bind(entry.amount_cents)
        .bind(entry.kind)
        .bind(entry.direction)
        .bind(&entry.operator_id)
        .bind(&entry.installment_id)
        .bind(entry.created_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// All entries of a register, in posting order.
    pub async fn list_for_register(&self, register_id: &str) -> DbResult<Vec<LedgerEntry>> {
        let entries = sqlx::query_as::<_, LedgerEntry>(
            r#"
            SELECT id, register_id, memo, amount_cents, kind, direction,
                   operator_id, installment_id, created_at
            FROM ledger_entries
            WHERE register_id = ?1
            ORDER BY created_at, id
            "#,
        )
        .bind(register_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    /// Signed cent sum of all entries of a register.
    ///
    /// `balance == this sum` must hold at all times (the opening float is
    /// itself the first entry); tests verify the invariant through this
    /// query.
    pub async fn sum_signed_for_register(&self, register_id: &str) -> DbResult<i64> {
        let sum = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COALESCE(SUM(
                CASE direction WHEN 'in' THEN amount_cents ELSE -amount_cents END
            ), 0)
            FROM ledger_entries
            WHERE register_id = ?1
            "#,
        )
        .bind(register_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(sum)
    }
}
