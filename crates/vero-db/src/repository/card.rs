//! # Card Repository
//!
//! Tender instruments, card terminals, and the card settlement queue.
//! A card entry is written once with all its fee figures and moves through
//! `to_process -> processed` or `to_process -> anticipated` exactly once.

use sqlx::{SqliteConnection, SqlitePool};

use crate::error::DbResult;
use chrono::NaiveDate;
use vero_core::{CardClass, CardEntry, CardEntryStatus, CardTerminal, TenderInstrument};

/// Filter for listing card entries.
#[derive(Debug, Clone, Default)]
pub struct CardEntryFilter {
    /// Restrict to entries in this status.
    pub status: Option<CardEntryStatus>,
    /// Restrict to debit or credit entries.
    pub card_class: Option<CardClass>,
    /// Restrict to entries recorded on this calendar day.
    pub created_on: Option<NaiveDate>,
}

/// Repository for card-side rows.
#[derive(Debug, Clone)]
pub struct CardRepository {
    pool: SqlitePool,
}

impl CardRepository {
    const ENTRY_COLUMNS: &'static str = "id, terminal_id, card_class, status, gross_cents, \
         fee_bps, fee_cents, net_cents, anticipation_fee_bps, anticipation_fee_cents, \
         anticipated_net_cents, expected_on, operator_id, created_at";

    const TERMINAL_COLUMNS: &'static str = "id, name, debit_fee_bps, credit_fee_bps, \
         debit_lead_days, credit_lead_days, anticipation_fee_bps, bank_register_id";

    /// Creates a new CardRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CardRepository { pool }
    }

    // ========================================================================
    // Instruments and terminals
    // ========================================================================

    /// Loads a tender instrument by id.
    pub async fn get_instrument(&self, id: &str) -> DbResult<Option<TenderInstrument>> {
        let instrument = sqlx::query_as::<_, TenderInstrument>(
            "SELECT id, name, kind, terminal_id FROM tender_instruments WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(instrument)
    }

    /// Loads a tender instrument by id on an open transaction.
    pub async fn get_instrument_on(
        &self,
        conn: &mut SqliteConnection,
        id: &str,
    ) -> DbResult<Option<TenderInstrument>> {
        let instrument = sqlx::query_as::<_, TenderInstrument>(
            "SELECT id, name, kind, terminal_id FROM tender_instruments WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(instrument)
    }

    /// All tender instruments, alphabetically.
    pub async fn instruments(&self) -> DbResult<Vec<TenderInstrument>> {
        let instruments = sqlx::query_as::<_, TenderInstrument>(
            "SELECT id, name, kind, terminal_id FROM tender_instruments ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(instruments)
    }

    /// Loads a card terminal by id.
    pub async fn get_terminal(&self, id: &str) -> DbResult<Option<CardTerminal>> {
        let sql = format!(
            "SELECT {} FROM card_terminals WHERE id = ?1",
            Self::TERMINAL_COLUMNS
        );
        let terminal = sqlx::query_as::<_, CardTerminal>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(terminal)
    }

    /// Loads a card terminal by id on an open transaction.
    pub async fn get_terminal_on(
        &self,
        conn: &mut SqliteConnection,
        id: &str,
    ) -> DbResult<Option<CardTerminal>> {
        let sql = format!(
            "SELECT {} FROM card_terminals WHERE id = ?1",
            Self::TERMINAL_COLUMNS
        );
        let terminal = sqlx::query_as::<_, CardTerminal>(&sql)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

        Ok(terminal)
    }

    // ========================================================================
    // Card entries
    // ========================================================================

    /// Inserts a card entry with its precomputed fee figures.
    pub async fn insert_entry(
        &self,
        conn: &mut SqliteConnection,
        entry: &CardEntry,
    ) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO card_entries
                (id, terminal_id, card_class, status, gross_cents, fee_bps,
                 fee_cents, net_cents, anticipation_fee_bps, anticipation_fee_cents,
                 anticipated_net_cents, expected_on, operator_id, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            "#,
        )
        .bind(&entry.id)
        .bind(&entry.terminal_id)
        .bind(entry.card_class)
        .bind(entry.status)
        .bind(entry.gross_cents)
        .bind(entry.fee_bps)
        .bind(entry.fee_cents)
        .bind(entry.net_cents)
        .bind(entry.anticipation_fee_bps)
        .bind(entry.anticipation_fee_cents)
        .bind(entry.anticipated_net_cents)
        .bind(entry.expected_on)
        .bind(&entry.operator_id)
        .bind(entry.created_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Loads a card entry by id.
    pub async fn get_entry(&self, id: &str) -> DbResult<Option<CardEntry>> {
        let sql = format!(
            "SELECT {} FROM card_entries WHERE id = ?1",
            Self::ENTRY_COLUMNS
        );
        let entry = sqlx::query_as::<_, CardEntry>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(entry)
    }

    /// Loads a card entry by id on an open transaction.
    pub async fn get_entry_on(
        &self,
        conn: &mut SqliteConnection,
        id: &str,
    ) -> DbResult<Option<CardEntry>> {
        let sql = format!(
            "SELECT {} FROM card_entries WHERE id = ?1",
            Self::ENTRY_COLUMNS
        );
        let entry = sqlx::query_as::<_, CardEntry>(&sql)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

        Ok(entry)
    }

    /// Moves an entry out of the pending queue.
    ///
    /// Returns `false` when the entry was already processed or anticipated.
    pub async fn mark_status(
        &self,
        conn: &mut SqliteConnection,
        id: &str,
        status: CardEntryStatus,
    ) -> DbResult<bool> {
        let result = sqlx::query(
            "UPDATE card_entries SET status = ?2 WHERE id = ?1 AND status = 'to_process'",
        )
        .bind(id)
        .bind(status)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Lists card entries matching a filter, oldest first.
    pub async fn list(&self, filter: &CardEntryFilter) -> DbResult<Vec<CardEntry>> {
        let mut sql = format!("SELECT {} FROM card_entries WHERE 1 = 1", Self::ENTRY_COLUMNS);
        if filter.status.is_some() {
            sql.push_str(" AND status = ?");
        }
        if filter.card_class.is_some() {
            sql.push_str(" AND card_class = ?");
        }
        if filter.created_on.is_some() {
            sql.push_str(" AND date(created_at) = ?");
        }
        sql.push_str(" ORDER BY created_at, id");

        let mut query = sqlx::query_as::<_, CardEntry>(&sql);
        if let Some(status) = filter.status {
            query = query.bind(status);
        }
        if let Some(class) = filter.card_class {
            query = query.bind(class);
        }
        if let Some(day) = filter.created_on {
            query = query.bind(day);
        }

        let entries = query.fetch_all(&self.pool).await?;
        Ok(entries)
    }
}
