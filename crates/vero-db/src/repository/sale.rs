//! # Sale Repository
//!
//! Sales and their item lines. Every mutation carries `WHERE status = 'open'`
//! so a closed sale is immutable at the storage layer, whatever the caller
//! thought it had loaded.

use sqlx::{SqliteConnection, SqlitePool};

use crate::error::DbResult;
use chrono::{DateTime, Utc};
use vero_core::{PaymentPlan, Sale, SaleItem};

/// Repository for sale rows.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    const COLUMNS: &'static str = "id, customer_id, note, status, items_cents, discount_cents, \
         surcharge_cents, plan_id, operator_id, opened_at, closed_at";

    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    // ========================================================================
    // Sales
    // ========================================================================

    /// Inserts a new open sale.
    pub async fn insert(&self, sale: &Sale) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO sales
                (id, customer_id, note, status, items_cents, discount_cents,
                 surcharge_cents, plan_id, operator_id, opened_at, closed_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&sale.id)
        .bind(&sale.customer_id)
        .bind(&sale.note)
        .bind(sale.status)
        .bind(sale.items_cents)
        .bind(sale.discount_cents)
        .bind(sale.surcharge_cents)
        .bind(&sale.plan_id)
        .bind(&sale.operator_id)
        .bind(sale.opened_at)
        .bind(sale.closed_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Loads a sale by id.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        let sql = format!("SELECT {} FROM sales WHERE id = ?1", Self::COLUMNS);
        let sale = sqlx::query_as::<_, Sale>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(sale)
    }

    /// Loads a sale by id on an open transaction.
    pub async fn get_by_id_on(
        &self,
        conn: &mut SqliteConnection,
        id: &str,
    ) -> DbResult<Option<Sale>> {
        let sql = format!("SELECT {} FROM sales WHERE id = ?1", Self::COLUMNS);
        let sale = sqlx::query_as::<_, Sale>(&sql)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

        Ok(sale)
    }

    /// Updates customer and note of a sale that is still open.
    pub async fn update_customer_note(
        &self,
        id: &str,
        customer_id: Option<&str>,
        note: Option<&str>,
    ) -> DbResult<bool> {
        let result = sqlx::query(
            "UPDATE sales SET customer_id = ?2, note = ?3 WHERE id = ?1 AND status = 'open'",
        )
        .bind(id)
        .bind(customer_id)
        .bind(note)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Closes a sale, stamping its tender figures.
    ///
    /// Returns `false` when the sale was not open, which callers surface as
    /// an already-closed rejection.
    pub async fn close(
        &self,
        conn: &mut SqliteConnection,
        id: &str,
        discount_cents: i64,
        surcharge_cents: i64,
        plan_id: &str,
        closed_at: DateTime<Utc>,
    ) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE sales
            SET status = 'closed',
                discount_cents = ?2,
                surcharge_cents = ?3,
                plan_id = ?4,
                closed_at = ?5
            WHERE id = ?1 AND status = 'open'
            "#,
        )
        .bind(id)
        .bind(discount_cents)
        .bind(surcharge_cents)
        .bind(plan_id)
        .bind(closed_at)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    // ========================================================================
    // Items
    // ========================================================================

    /// Inserts an item line.
    pub async fn insert_item(&self, conn: &mut SqliteConnection, item: &SaleItem) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO sale_items (id, sale_id, product_id, price_cents) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&item.id)
        .bind(&item.sale_id)
        .bind(&item.product_id)
        .bind(item.price_cents)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Loads an item line on an open transaction.
    pub async fn get_item(
        &self,
        conn: &mut SqliteConnection,
        item_id: &str,
    ) -> DbResult<Option<SaleItem>> {
        let item = sqlx::query_as::<_, SaleItem>(
            "SELECT id, sale_id, product_id, price_cents FROM sale_items WHERE id = ?1",
        )
        .bind(item_id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(item)
    }

    /// Deletes an item line.
    pub async fn delete_item(&self, conn: &mut SqliteConnection, item_id: &str) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM sale_items WHERE id = ?1")
            .bind(item_id)
            .execute(&mut *conn)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    /// All item lines of a sale, in insertion order.
    pub async fn items(&self, sale_id: &str) -> DbResult<Vec<SaleItem>> {
        let items = sqlx::query_as::<_, SaleItem>(
            "SELECT id, sale_id, product_id, price_cents FROM sale_items \
             WHERE sale_id = ?1 ORDER BY rowid",
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Adjusts the running item total of an open sale by a signed delta.
    pub async fn bump_items_total(
        &self,
        conn: &mut SqliteConnection,
        sale_id: &str,
        delta_cents: i64,
    ) -> DbResult<bool> {
        let result = sqlx::query(
            "UPDATE sales SET items_cents = items_cents + ?2 WHERE id = ?1 AND status = 'open'",
        )
        .bind(sale_id)
        .bind(delta_cents)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    // ========================================================================
    // Payment plans
    // ========================================================================

    /// Loads a payment plan by id.
    pub async fn get_plan(&self, id: &str) -> DbResult<Option<PaymentPlan>> {
        let plan = sqlx::query_as::<_, PaymentPlan>(
            "SELECT id, description, code FROM payment_plans WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(plan)
    }

    /// All payment plans, by code.
    pub async fn plans(&self) -> DbResult<Vec<PaymentPlan>> {
        let plans = sqlx::query_as::<_, PaymentPlan>(
            "SELECT id, description, code FROM payment_plans ORDER BY code",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(plans)
    }
}
