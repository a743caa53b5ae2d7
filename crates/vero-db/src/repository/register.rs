//! # Cash Register Repository
//!
//! Register rows change balance only through `credit_balance` and
//! `debit_balance`, both called inside the service transaction that also
//! appends the matching ledger entry. The debit form is conditioned on the
//! current balance covering the movement, so a shortfall surfaces as zero
//! rows affected and the whole transaction rolls back.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{SqliteConnection, SqlitePool};

use crate::error::DbResult;
use vero_core::{CashRegister, RegisterKind};

/// Repository for cash register rows.
#[derive(Debug, Clone)]
pub struct RegisterRepository {
    pool: SqlitePool,
}

impl RegisterRepository {
    /// Creates a new RegisterRepository.
    pub fn new(pool: SqlitePool) -> Self {
        RegisterRepository { pool }
    }

    /// Inserts a register row.
    ///
    /// An open TILL trips the `uq_open_till` unique index when another till
    /// is already open; the caller translates that into the domain error.
    pub async fn insert(&self, conn: &mut SqliteConnection, register: &CashRegister) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO cash_registers
                (id, kind, description, opening_cents, balance_cents,
                 agency, account, operator_id, opened_at, closed_at, closing_cents)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&register.id)
        .bind(register.kind)
        .bind(&register.description)
        .bind(register.opening_cents)
        .bind(register.balance_cents)
        .bind(&register.agency)
        .bind(&register.account)
        .bind(&register.operator_id)
        .bind(register.opened_at)
        .bind(register.closed_at)
        .bind(register.closing_cents)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    const COLUMNS: &'static str = "id, kind, description, opening_cents, balance_cents, \
         agency, account, operator_id, opened_at, closed_at, closing_cents";

    /// Fetches a register by id.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<CashRegister>> {
        let sql = format!(
            "SELECT {} FROM cash_registers WHERE id = ?1",
            Self::COLUMNS
        );
        let register = sqlx::query_as::<_, CashRegister>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(register)
    }

    /// Fetches a register by id inside an open transaction.
    pub async fn get_by_id_on(
        &self,
        conn: &mut SqliteConnection,
        id: &str,
    ) -> DbResult<Option<CashRegister>> {
        let sql = format!(
            "SELECT {} FROM cash_registers WHERE id = ?1",
            Self::COLUMNS
        );
        let register = sqlx::query_as::<_, CashRegister>(&sql)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

        Ok(register)
    }

    /// The currently open TILL, if any.
    pub async fn open_till(&self) -> DbResult<Option<CashRegister>> {
        let sql = format!(
            "SELECT {} FROM cash_registers WHERE kind = 'till' AND closed_at IS NULL",
            Self::COLUMNS
        );
        let register = sqlx::query_as::<_, CashRegister>(&sql)
            .fetch_optional(&self.pool)
            .await?;

        Ok(register)
    }

    /// The currently open TILL inside an open transaction.
    pub async fn open_till_on(
        &self,
        conn: &mut SqliteConnection,
    ) -> DbResult<Option<CashRegister>> {
        let sql = format!(
            "SELECT {} FROM cash_registers WHERE kind = 'till' AND closed_at IS NULL",
            Self::COLUMNS
        );
        let register = sqlx::query_as::<_, CashRegister>(&sql)
            .fetch_optional(&mut *conn)
            .await?;

        Ok(register)
    }

    /// All open registers, oldest first.
    pub async fn open_registers(&self) -> DbResult<Vec<CashRegister>> {
        let sql = format!(
            "SELECT {} FROM cash_registers WHERE closed_at IS NULL ORDER BY opened_at",
            Self::COLUMNS
        );
        let registers = sqlx::query_as::<_, CashRegister>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(registers)
    }

    /// All registers of one kind, newest first.
    pub async fn by_kind(&self, kind: RegisterKind) -> DbResult<Vec<CashRegister>> {
        let sql = format!(
            "SELECT {} FROM cash_registers WHERE kind = ?1 ORDER BY opened_at DESC",
            Self::COLUMNS
        );
        let registers = sqlx::query_as::<_, CashRegister>(&sql)
            .bind(kind)
            .fetch_all(&self.pool)
            .await?;

        Ok(registers)
    }

    /// Registers of one kind opened on the given day.
    pub async fn by_kind_on_date(
        &self,
        kind: RegisterKind,
        day: NaiveDate,
    ) -> DbResult<Vec<CashRegister>> {
        let sql = format!(
            "SELECT {} FROM cash_registers \
             WHERE kind = ?1 AND date(opened_at) = ?2 ORDER BY opened_at DESC",
            Self::COLUMNS
        );
        let registers = sqlx::query_as::<_, CashRegister>(&sql)
            .bind(kind)
            .bind(day)
            .fetch_all(&self.pool)
            .await?;

        Ok(registers)
    }

    /// Closes a register: one-way, snapshots the final balance.
    ///
    /// Returns false when the register was missing or already closed.
    pub async fn close(
        &self,
        conn: &mut SqliteConnection,
        id: &str,
        closing_cents: i64,
        closed_at: DateTime<Utc>,
    ) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE cash_registers
            SET closed_at = ?2, closing_cents = ?3
            WHERE id = ?1 AND closed_at IS NULL
            "#,
        )
        .bind(id)
        .bind(closed_at)
        .bind(closing_cents)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Adds to an open register's balance.
    ///
    /// Returns false when the register was missing or closed.
    pub async fn credit_balance(
        &self,
        conn: &mut SqliteConnection,
        id: &str,
        cents: i64,
    ) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE cash_registers
            SET balance_cents = balance_cents + ?2
            WHERE id = ?1 AND closed_at IS NULL
            "#,
        )
        .bind(id)
        .bind(cents)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Subtracts from an open register's balance, only if it covers the
    /// movement. Zero rows affected means insufficient funds (or a closed
    /// register) and the enclosing transaction must roll back.
    pub async fn debit_balance(
        &self,
        conn: &mut SqliteConnection,
        id: &str,
        cents: i64,
    ) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE cash_registers
            SET balance_cents = balance_cents - ?2
            WHERE id = ?1 AND closed_at IS NULL AND balance_cents >= ?2
            "#,
        )
        .bind(id)
        .bind(cents)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
