//! # Receipt Repository
//!
//! A receipt groups receivable installments for one collection against a
//! customer. Until it is processed it can be deleted; afterwards it is a
//! settled document and both the delete and the process guard refuse it.

use sqlx::{SqliteConnection, SqlitePool};

use crate::error::DbResult;
use chrono::{DateTime, Utc};
use vero_core::Receipt;

/// Repository for receipt rows.
#[derive(Debug, Clone)]
pub struct ReceiptRepository {
    pool: SqlitePool,
}

impl ReceiptRepository {
    const COLUMNS: &'static str = "id, customer_id, total_cents, received_cents, discount_cents, \
         surcharge_cents, instrument_id, operator_id, opened_at, processed_at";

    /// Creates a new ReceiptRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ReceiptRepository { pool }
    }

    /// Inserts a new receipt.
    pub async fn insert(&self, conn: &mut SqliteConnection, receipt: &Receipt) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO receipts
                (id, customer_id, total_cents, received_cents, discount_cents,
                 surcharge_cents, instrument_id, operator_id, opened_at, processed_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&receipt.id)
        .bind(&receipt.customer_id)
        .bind(receipt.total_cents)
        .bind(receipt.received_cents)
        .bind(receipt.discount_cents)
        .bind(receipt.surcharge_cents)
        .bind(&receipt.instrument_id)
        .bind(&receipt.operator_id)
        .bind(receipt.opened_at)
        .bind(receipt.processed_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Attaches an installment to a receipt.
    pub async fn link_installment(
        &self,
        conn: &mut SqliteConnection,
        receipt_id: &str,
        installment_id: &str,
    ) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO receipt_installments (receipt_id, installment_id) VALUES (?1, ?2)",
        )
        .bind(receipt_id)
        .bind(installment_id)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Loads a receipt by id.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Receipt>> {
        let sql = format!("SELECT {} FROM receipts WHERE id = ?1", Self::COLUMNS);
        let receipt = sqlx::query_as::<_, Receipt>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(receipt)
    }

    /// Loads a receipt by id on an open transaction.
    pub async fn get_by_id_on(
        &self,
        conn: &mut SqliteConnection,
        id: &str,
    ) -> DbResult<Option<Receipt>> {
        let sql = format!("SELECT {} FROM receipts WHERE id = ?1", Self::COLUMNS);
        let receipt = sqlx::query_as::<_, Receipt>(&sql)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

        Ok(receipt)
    }

    /// Stamps a receipt as processed with its final figures.
    ///
    /// Returns `false` when the receipt was already processed.
    pub async fn mark_processed(
        &self,
        conn: &mut SqliteConnection,
        id: &str,
        received_cents: i64,
        discount_cents: i64,
        surcharge_cents: i64,
        instrument_id: &str,
        processed_at: DateTime<Utc>,
    ) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE receipts
            SET received_cents = ?2,
                discount_cents = ?3,
                surcharge_cents = ?4,
                instrument_id = ?5,
                processed_at = ?6
            WHERE id = ?1 AND processed_at IS NULL
            "#,
        )
        .bind(id)
        .bind(received_cents)
        .bind(discount_cents)
        .bind(surcharge_cents)
        .bind(instrument_id)
        .bind(processed_at)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Deletes an unprocessed receipt; its installment links cascade.
    pub async fn delete(&self, conn: &mut SqliteConnection, id: &str) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM receipts WHERE id = ?1 AND processed_at IS NULL")
            .bind(id)
            .execute(&mut *conn)
            .await?;

        Ok(result.rows_affected() == 1)
    }
}
