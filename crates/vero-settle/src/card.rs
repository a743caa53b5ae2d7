//! # Card Service
//!
//! Records card transactions and settles them onto the terminal's bank
//! register.
//!
//! ## Entry Lifecycle
//! ```text
//! record ──► TO_PROCESS ──┬── process ────► PROCESSED    (bank += net)
//!                         └── anticipate ─► ANTICIPATED  (bank += anticipated net)
//! ```
//!
//! Both fee figures are computed once, at record time, from the terminal's
//! parameters for the entry's card class:
//!
//! ```text
//! fee             = gross × fee_bps          (half-up)
//! net             = gross − fee
//! anticipation    = gross × anticipation_bps (half-up)
//! anticipated net = gross − anticipation
//! ```
//!
//! The transition out of TO_PROCESS happens at most once; the UPDATE is
//! guarded on the current status, so a raced second settle loses cleanly.
//!
//! Recording is the one fire-and-forget write in the card path: a sale or
//! receipt that could not store its card entry still completes, with the
//! failure logged for back-office reconciliation.

use chrono::{Duration, Utc};
use sqlx::SqliteConnection;
use tracing::{error, info};
use uuid::Uuid;
use vero_core::validation::validate_positive_amount;
use vero_core::{
    CardEntry, CardEntryStatus, CoreError, EntryDirection, EntryKind, Money, Operator,
    TenderInstrument,
};
use vero_db::{CardEntryFilter, Database, DbError};

use crate::error::{support, EngineResult};
use crate::ledger::{LedgerService, NewLedgerEntry};

/// Memo on the ledger entry of a normal card settlement.
const PROCESS_MEMO: &str = "Card settlement processing";

// =============================================================================
// CardService
// =============================================================================

/// Card entry recording and settlement.
#[derive(Debug, Clone)]
pub struct CardService {
    db: Database,
    ledger: LedgerService,
}

impl CardService {
    pub fn new(db: Database) -> Self {
        CardService {
            ledger: LedgerService::new(db.clone()),
            db,
        }
    }

    // ========================================================================
    // Recording
    // ========================================================================

    /// Records a card transaction for a debit or credit instrument.
    ///
    /// Returns `Ok(None)` when the entry could not be stored; the failure
    /// is logged and the caller's workflow continues without it.
    pub async fn record(
        &self,
        operator: &Operator,
        instrument_id: &str,
        amount: Money,
    ) -> EngineResult<Option<CardEntry>> {
        let instrument = self
            .db
            .cards()
            .get_instrument(instrument_id)
            .await
            .map_err(support("load the tender instrument"))?
            .ok_or_else(|| CoreError::InstrumentNotFound(instrument_id.to_string()))?;

        let mut conn = self.db.acquire().await.map_err(support("record the card entry"))?;
        self.record_on(&mut conn, operator, &instrument, amount).await
    }

    /// Records a card transaction on an open transaction.
    ///
    /// Sale closing and receipt collection call this so the entry lands
    /// in their transaction; the fire-and-forget rule still applies.
    pub(crate) async fn record_on(
        &self,
        conn: &mut SqliteConnection,
        operator: &Operator,
        instrument: &TenderInstrument,
        amount: Money,
    ) -> EngineResult<Option<CardEntry>> {
        let class = instrument
            .kind
            .card_class()
            .ok_or_else(|| CoreError::NotACardInstrument(instrument.id.clone()))?;
        let terminal_id = instrument
            .terminal_id
            .as_deref()
            .ok_or_else(|| CoreError::NotACardInstrument(instrument.id.clone()))?;
        let terminal = self
            .db
            .cards()
            .get_terminal_on(conn, terminal_id)
            .await
            .map_err(support("load the card terminal"))?
            .ok_or_else(|| CoreError::TerminalNotFound(terminal_id.to_string()))?;

        validate_positive_amount("amount", amount)?;

        let fee_rate = terminal.fee_rate(class)?;
        let fee = amount.fee(fee_rate);
        let anticipation_rate = terminal.anticipation_rate()?;
        let anticipation_fee = amount.fee(anticipation_rate);

        let entry = CardEntry {
            id: Uuid::new_v4().to_string(),
            terminal_id: terminal.id.clone(),
            card_class: class,
            status: CardEntryStatus::ToProcess,
            gross_cents: amount.cents(),
            fee_bps: fee_rate.bps() as i64,
            fee_cents: fee.cents(),
            net_cents: (amount - fee).cents(),
            anticipation_fee_bps: anticipation_rate.bps() as i64,
            anticipation_fee_cents: anticipation_fee.cents(),
            anticipated_net_cents: (amount - anticipation_fee).cents(),
            expected_on: Utc::now().date_naive() + Duration::days(terminal.lead_days(class)),
            operator_id: operator.id.clone(),
            created_at: Utc::now(),
        };

        match self.db.cards().insert_entry(conn, &entry).await {
            Ok(()) => {
                info!(
                    entry = %entry.id,
                    terminal = %entry.terminal_id,
                    class = ?entry.card_class,
                    gross = entry.gross_cents,
                    net = entry.net_cents,
                    "card entry recorded"
                );
                Ok(Some(entry))
            }
            Err(err) => {
                error!(
                    terminal = %terminal.id,
                    gross = amount.cents(),
                    error = %err,
                    "card entry could not be stored, continuing without it"
                );
                Ok(None)
            }
        }
    }

    // ========================================================================
    // Settlement
    // ========================================================================

    /// Settles an entry at its normal net: posts `net` to the terminal's
    /// bank register and marks the entry PROCESSED.
    pub async fn process(&self, operator: &Operator, entry_id: &str) -> EngineResult<CardEntry> {
        self.settle(operator, entry_id, CardEntryStatus::Processed)
            .await
    }

    /// Settles an entry early at its anticipated net: posts
    /// `anticipated net` to the terminal's bank register and marks the
    /// entry ANTICIPATED.
    pub async fn anticipate(&self, operator: &Operator, entry_id: &str) -> EngineResult<CardEntry> {
        self.settle(operator, entry_id, CardEntryStatus::Anticipated)
            .await
    }

    async fn settle(
        &self,
        operator: &Operator,
        entry_id: &str,
        target: CardEntryStatus,
    ) -> EngineResult<CardEntry> {
        let mut tx = self.db.begin().await.map_err(support("settle the card entry"))?;

        let mut entry = self
            .db
            .cards()
            .get_entry_on(&mut tx, entry_id)
            .await
            .map_err(support("load the card entry"))?
            .ok_or_else(|| CoreError::CardEntryNotFound(entry_id.to_string()))?;
        match entry.status {
            CardEntryStatus::ToProcess => {}
            CardEntryStatus::Processed => return Err(CoreError::CardEntryAlreadyProcessed.into()),
            CardEntryStatus::Anticipated => {
                return Err(CoreError::CardEntryAlreadyAnticipated.into())
            }
        }

        let terminal = self
            .db
            .cards()
            .get_terminal_on(&mut tx, &entry.terminal_id)
            .await
            .map_err(support("load the card terminal"))?
            .ok_or_else(|| CoreError::TerminalNotFound(entry.terminal_id.clone()))?;

        let (amount, memo) = match target {
            CardEntryStatus::Anticipated => (
                entry.anticipated_net(),
                format!("Card anticipation {}", entry.id),
            ),
            _ => (entry.net(), PROCESS_MEMO.to_string()),
        };

        self.ledger
            .post_on(
                &mut tx,
                operator,
                NewLedgerEntry {
                    register_id: terminal.bank_register_id.clone(),
                    memo,
                    amount,
                    kind: EntryKind::Receipt,
                    direction: EntryDirection::In,
                    installment_id: None,
                },
            )
            .await?;

        let marked = self
            .db
            .cards()
            .mark_status(&mut tx, &entry.id, target)
            .await
            .map_err(support("mark the card entry"))?;
        if !marked {
            // Lost the race against another settle of the same entry.
            return Err(match target {
                CardEntryStatus::Anticipated => CoreError::CardEntryAlreadyAnticipated.into(),
                _ => CoreError::CardEntryAlreadyProcessed.into(),
            });
        }

        tx.commit().await.map_err(DbError::from).map_err(support("settle the card entry"))?;
        entry.status = target;

        info!(
            entry = %entry.id,
            status = ?entry.status,
            amount = amount.cents(),
            bank_register = %terminal.bank_register_id,
            operator = %operator.id,
            "card entry settled"
        );

        Ok(entry)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Card entries matching the filter, oldest first.
    pub async fn entries(&self, filter: &CardEntryFilter) -> EngineResult<Vec<CardEntry>> {
        self.db
            .cards()
            .list(filter)
            .await
            .map_err(support("list card entries"))
    }

    /// All configured tender instruments.
    pub async fn instruments(&self) -> EngineResult<Vec<TenderInstrument>> {
        self.db
            .cards()
            .instruments()
            .await
            .map_err(support("list tender instruments"))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
