//! # Installment Repository
//!
//! Installments hang off either a payable or a receivable document; the
//! schema enforces exactly one of the two. Settlement updates go through
//! [`InstallmentRepository::apply_settlement`], which refuses to touch an
//! installment that is already settled.

use sqlx::{SqliteConnection, SqlitePool};

use crate::error::DbResult;
use chrono::{DateTime, Utc};
use vero_core::{Installment, PayableDoc, ReceivableDoc};

/// Repository for payable/receivable documents and their installments.
#[derive(Debug, Clone)]
pub struct InstallmentRepository {
    pool: SqlitePool,
}

impl InstallmentRepository {
    const COLUMNS: &'static str = "id, payable_id, receivable_id, seq, amount_cents, \
         paid_cents, remaining_cents, discount_cents, surcharge_cents, \
         settled, issued_on, due_on, settled_at";

    /// Creates a new InstallmentRepository.
    pub fn new(pool: SqlitePool) -> Self {
        InstallmentRepository { pool }
    }

    // ========================================================================
    // Documents
    // ========================================================================

    /// Inserts a payable document.
    pub async fn insert_payable(
        &self,
        conn: &mut SqliteConnection,
        doc: &PayableDoc,
    ) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO payables (id, supplier_id, memo, amount_cents, issued_on)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&doc.id)
        .bind(&doc.supplier_id)
        .bind(&doc.memo)
        .bind(doc.amount_cents)
        .bind(doc.issued_on)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Inserts a receivable document.
    pub async fn insert_receivable(
        &self,
        conn: &mut SqliteConnection,
        doc: &ReceivableDoc,
    ) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO receivables (id, customer_id, memo, amount_cents, issued_on, sale_id)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&doc.id)
        .bind(&doc.customer_id)
        .bind(&doc.memo)
        .bind(doc.amount_cents)
        .bind(doc.issued_on)
        .bind(&doc.sale_id)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Loads a payable document by id.
    pub async fn get_payable(&self, id: &str) -> DbResult<Option<PayableDoc>> {
        let doc = sqlx::query_as::<_, PayableDoc>(
            "SELECT id, supplier_id, memo, amount_cents, issued_on FROM payables WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(doc)
    }

    /// Loads a receivable document by id.
    pub async fn get_receivable(&self, id: &str) -> DbResult<Option<ReceivableDoc>> {
        let doc = sqlx::query_as::<_, ReceivableDoc>(
            r#"
            SELECT id, customer_id, memo, amount_cents, issued_on, sale_id
            FROM receivables
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(doc)
    }

    // ========================================================================
    // Installments
    // ========================================================================

    /// Inserts an installment row.
    pub async fn insert(
        &self,
        conn: &mut SqliteConnection,
        installment: &Installment,
    ) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO installments
                (id, payable_id, receivable_id, seq, amount_cents, paid_cents,
                 remaining_cents, discount_cents, surcharge_cents, settled,
                 issued_on, due_on, settled_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
        )
        .bind(&installment.id)
        .bind(&installment.payable_id)
        .bind(&installment.receivable_id)
        .bind(installment.seq)
        .bind(installment.amount_cents)
        .bind(installment.paid_cents)
        .bind(installment.remaining_cents)
        .bind(installment.discount_cents)
        .bind(installment.surcharge_cents)
        .bind(installment.settled)
        .bind(installment.issued_on)
        .bind(installment.due_on)
        .bind(installment.settled_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Loads an installment by id.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Installment>> {
        let sql = format!(
            "SELECT {} FROM installments WHERE id = ?1",
            Self::COLUMNS
        );
        let installment = sqlx::query_as::<_, Installment>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(installment)
    }

    /// Loads an installment by id on an open transaction.
    pub async fn get_by_id_on(
        &self,
        conn: &mut SqliteConnection,
        id: &str,
    ) -> DbResult<Option<Installment>> {
        let sql = format!(
            "SELECT {} FROM installments WHERE id = ?1",
            Self::COLUMNS
        );
        let installment = sqlx::query_as::<_, Installment>(&sql)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

        Ok(installment)
    }

    /// Open installments of a receivable, oldest first.
    pub async fn open_for_receivable(&self, receivable_id: &str) -> DbResult<Vec<Installment>> {
        let sql = format!(
            "SELECT {} FROM installments \
             WHERE receivable_id = ?1 AND settled = 0 \
             ORDER BY due_on, seq",
            Self::COLUMNS
        );
        let installments = sqlx::query_as::<_, Installment>(&sql)
            .bind(receivable_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(installments)
    }

    /// Installments attached to a receipt, in settlement order.
    pub async fn for_receipt(
        &self,
        conn: &mut SqliteConnection,
        receipt_id: &str,
    ) -> DbResult<Vec<Installment>> {
        let installments = sqlx::query_as::<_, Installment>(
            "SELECT i.id, i.payable_id, i.receivable_id, i.seq, i.amount_cents, \
                    i.paid_cents, i.remaining_cents, i.discount_cents, \
                    i.surcharge_cents, i.settled, i.issued_on, i.due_on, i.settled_at \
             FROM installments i \
             JOIN receipt_installments ri ON ri.installment_id = i.id \
             WHERE ri.receipt_id = ?1 \
             ORDER BY i.due_on, i.seq",
        )
        .bind(receipt_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(installments)
    }

    /// Applies a settlement to an installment that is still open.
    ///
    /// Returns `false` when the row was already settled, so callers can
    /// detect a lost race without a prior read.
    #[allow(clippy::too_many_arguments)]
    pub async fn apply_settlement(
        &self,
        conn: &mut SqliteConnection,
        id: &str,
        paid_cents: i64,
        remaining_cents: i64,
        discount_cents: i64,
        surcharge_cents: i64,
        settled: bool,
        settled_at: Option<DateTime<Utc>>,
    ) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE installments
            SET paid_cents = ?2,
                remaining_cents = ?3,
                discount_cents = ?4,
                surcharge_cents = ?5,
                settled = ?6,
                settled_at = ?7
            WHERE id = ?1 AND settled = 0
            "#,
        )
        .bind(id)
        .bind(paid_cents)
        .bind(remaining_cents)
        .bind(discount_cents)
        .bind(surcharge_cents)
        .bind(settled)
        .bind(settled_at)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}
