//! # Ledger Service
//!
//! The single path by which money enters or leaves a cash register.
//!
//! ## Posting Flow
//! ```text
//! NewLedgerEntry
//!      │  validate amount > 0, memo present
//!      ▼
//! load register ──► missing? closed? ──► domain rejection
//!      │
//!      ▼
//! balance update (guarded UPDATE)
//!      │  IN:  balance += amount  WHERE open
//!      │  OUT: balance -= amount  WHERE open AND balance >= amount
//!      ▼
//! append ledger_entries row
//! ```
//!
//! The OUT guard lives in the UPDATE itself, so two concurrent payments
//! cannot both pass a read-then-check and overdraw the register. Every
//! other service posts through [`LedgerService::post_on`] inside its own
//! transaction; nothing else writes `balance_cents`.

use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::debug;
use uuid::Uuid;
use vero_core::validation::{validate_description, validate_positive_amount};
use vero_core::{CoreError, EntryDirection, EntryKind, LedgerEntry, Money, Operator};
use vero_db::{Database, DbError};

use crate::error::{support, EngineResult};

// =============================================================================
// Input
// =============================================================================

/// A posting request against one register.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLedgerEntry {
    pub register_id: String,
    pub memo: String,
    pub amount: Money,
    pub kind: EntryKind,
    pub direction: EntryDirection,
    /// Payable installment this posting settles, when there is one.
    pub installment_id: Option<String>,
}

// =============================================================================
// LedgerService
// =============================================================================

/// Posts ledger entries and keeps register balances in lockstep with them.
#[derive(Debug, Clone)]
pub struct LedgerService {
    db: Database,
}

impl LedgerService {
    pub fn new(db: Database) -> Self {
        LedgerService { db }
    }

    /// Posts an entry in its own transaction.
    pub async fn post(&self, operator: &Operator, entry: NewLedgerEntry) -> EngineResult<LedgerEntry> {
        let mut tx = self.db.begin().await.map_err(support("post a ledger entry"))?;
        let posted = self.post_on(&mut tx, operator, entry).await?;
        tx.commit().await.map_err(DbError::from).map_err(support("post a ledger entry"))?;
        Ok(posted)
    }

    /// Posts an entry on an open transaction.
    ///
    /// This is the variant the other services call so the posting commits
    /// or rolls back with the rest of their workflow.
    pub(crate) async fn post_on(
        &self,
        conn: &mut SqliteConnection,
        operator: &Operator,
        entry: NewLedgerEntry,
    ) -> EngineResult<LedgerEntry> {
        validate_positive_amount("amount", entry.amount)?;
        validate_description("memo", &entry.memo)?;

        let registers = self.db.registers();
        let register = registers
            .get_by_id_on(conn, &entry.register_id)
            .await
            .map_err(support("load the register"))?
            .ok_or_else(|| CoreError::RegisterNotFound(entry.register_id.clone()))?;
        if !register.is_open() {
            return Err(CoreError::RegisterAlreadyClosed.into());
        }

        let moved = match entry.direction {
            EntryDirection::In => registers
                .credit_balance(conn, &register.id, entry.amount.cents())
                .await
                .map_err(support("credit the register balance"))?,
            EntryDirection::Out => registers
                .debit_balance(conn, &register.id, entry.amount.cents())
                .await
                .map_err(support("debit the register balance"))?,
        };
        if !moved {
            // The register was open a moment ago, so a failed IN means it
            // closed underneath us and a failed OUT means the balance does
            // not cover the movement.
            return Err(match entry.direction {
                EntryDirection::In => CoreError::RegisterAlreadyClosed.into(),
                EntryDirection::Out => CoreError::InsufficientRegisterBalance.into(),
            });
        }

        let posted = LedgerEntry {
            id: Uuid::new_v4().to_string(),
            register_id: register.id,
            memo: entry.memo.trim().to_string(),
            amount_cents: entry.amount.cents(),
            kind: entry.kind,
            direction: entry.direction,
            operator_id: operator.id.clone(),
            installment_id: entry.installment_id,
            created_at: Utc::now(),
        };
        self.db
            .ledger()
            .insert(conn, &posted)
            .await
            .map_err(support("append the ledger entry"))?;

        debug!(
            register = %posted.register_id,
            amount = posted.amount_cents,
            direction = ?posted.direction,
            operator = %operator.id,
            "ledger entry posted"
        );

        Ok(posted)
    }

    /// All entries of a register, oldest first.
    pub async fn entries_for_register(&self, register_id: &str) -> EngineResult<Vec<LedgerEntry>> {
        self.db
            .ledger()
            .list_for_register(register_id)
            .await
            .map_err(support("list ledger entries"))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
