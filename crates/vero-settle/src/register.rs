//! # Register Service
//!
//! Opens and closes tills, safes, and bank accounts.
//!
//! ## Opening
//! The register row is inserted with a zero balance, then the opening float
//! is posted as a normal OPENING_BALANCE/IN ledger entry in the same
//! transaction. The balance therefore equals the signed sum of the ledger
//! from the first moment, with no special case for the float.
//!
//! ## The Single-Till Rule
//! At most one TILL is open system-wide. The rule is enforced by a partial
//! unique index on the register table, not by a read-then-insert check, so
//! two simultaneous opens cannot both succeed: one insert trips the index
//! and surfaces as [`CoreError::TillAlreadyOpen`].
//!
//! ## Closing
//! Closing asks for the acting operator's password, verifies it against
//! the stored bcrypt hash, snapshots the balance into `closing_cents`, and
//! is one-way.

use chrono::{NaiveDate, Utc};
use tracing::{info, warn};
use uuid::Uuid;
use vero_core::validation::{normalize_digits, validate_description};
use vero_core::{CashRegister, CoreError, EntryDirection, EntryKind, Money, Operator, RegisterKind, ValidationError};
use vero_db::{Database, DbError};

use crate::error::{support, EngineError, EngineResult};
use crate::ledger::{LedgerService, NewLedgerEntry};

// =============================================================================
// Input
// =============================================================================

/// A register-opening request.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenRegister {
    pub kind: RegisterKind,
    /// Falls back to the kind's default description when absent.
    pub description: Option<String>,
    pub opening: Money,
    /// BANK only; stored digits-only.
    pub agency: Option<String>,
    /// BANK only; stored digits-only.
    pub account: Option<String>,
}

impl OpenRegister {
    /// A plain request with no description override and no bank fields.
    pub fn new(kind: RegisterKind, opening: Money) -> Self {
        OpenRegister {
            kind,
            description: None,
            opening,
            agency: None,
            account: None,
        }
    }
}

// =============================================================================
// RegisterService
// =============================================================================

/// Register lifecycle and lookup operations.
#[derive(Debug, Clone)]
pub struct RegisterService {
    db: Database,
    ledger: LedgerService,
}

impl RegisterService {
    pub fn new(db: Database) -> Self {
        RegisterService {
            ledger: LedgerService::new(db.clone()),
            db,
        }
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Opens a register and posts its opening float.
    pub async fn open(&self, operator: &Operator, request: OpenRegister) -> EngineResult<CashRegister> {
        if request.opening.is_negative() {
            return Err(CoreError::NegativeOpeningAmount.into());
        }

        let description = match request.description.as_deref().map(str::trim) {
            Some(text) if !text.is_empty() => {
                validate_description("description", text)?;
                text.to_string()
            }
            _ => request.kind.default_description().to_string(),
        };

        // Bank coordinates only make sense on bank accounts.
        let (agency, account) = match request.kind {
            RegisterKind::Bank => (
                request.agency.as_deref().map(normalize_digits).filter(|a| !a.is_empty()),
                request.account.as_deref().map(normalize_digits).filter(|a| !a.is_empty()),
            ),
            RegisterKind::Till | RegisterKind::Safe => (None, None),
        };

        let mut register = CashRegister {
            id: Uuid::new_v4().to_string(),
            kind: request.kind,
            description,
            opening_cents: request.opening.cents(),
            balance_cents: 0,
            agency,
            account,
            operator_id: operator.id.clone(),
            opened_at: Utc::now(),
            closed_at: None,
            closing_cents: None,
        };

        let mut tx = self.db.begin().await.map_err(support("open the register"))?;
        self.db
            .registers()
            .insert(&mut tx, &register)
            .await
            .map_err(|err| {
                if err.is_open_till_conflict() {
                    EngineError::from(CoreError::TillAlreadyOpen)
                } else {
                    support("open the register")(err)
                }
            })?;

        if request.opening.is_positive() {
            self.ledger
                .post_on(
                    &mut tx,
                    operator,
                    NewLedgerEntry {
                        register_id: register.id.clone(),
                        memo: register.kind.opening_memo().to_string(),
                        amount: request.opening,
                        kind: EntryKind::OpeningBalance,
                        direction: EntryDirection::In,
                        installment_id: None,
                    },
                )
                .await?;
            register.balance_cents = request.opening.cents();
        }

        tx.commit().await.map_err(DbError::from).map_err(support("open the register"))?;

        info!(
            register = %register.id,
            kind = ?register.kind,
            opening = register.opening_cents,
            operator = %operator.id,
            "register opened"
        );

        Ok(register)
    }

    /// Closes a register after verifying the operator's password.
    ///
    /// The final balance is snapshotted into `closing_cents`. Closing is
    /// one-way; a closed register never accepts another movement.
    pub async fn close(
        &self,
        operator: &Operator,
        register_id: &str,
        password: &str,
    ) -> EngineResult<CashRegister> {
        if password.trim().is_empty() {
            return Err(CoreError::PasswordRequired.into());
        }

        let hash = self
            .db
            .operators()
            .password_hash(&operator.id)
            .await
            .map_err(support("load the operator credential"))?
            .ok_or_else(|| {
                warn!(operator = %operator.id, "operator has no stored credential");
                EngineError::Support {
                    action: "load the operator credential",
                }
            })?;
        let verified = bcrypt::verify(password, &hash).map_err(|err| {
            warn!(operator = %operator.id, error = %err, "password verification failed");
            EngineError::Support {
                action: "verify the password",
            }
        })?;
        if !verified {
            return Err(CoreError::PasswordMismatch.into());
        }

        let mut tx = self.db.begin().await.map_err(support("close the register"))?;
        let mut register = self
            .db
            .registers()
            .get_by_id_on(&mut tx, register_id)
            .await
            .map_err(support("load the register"))?
            .ok_or_else(|| CoreError::RegisterNotFound(register_id.to_string()))?;
        if !register.is_open() {
            return Err(CoreError::RegisterAlreadyClosed.into());
        }

        let closed_at = Utc::now();
        let closed = self
            .db
            .registers()
            .close(&mut tx, &register.id, register.balance_cents, closed_at)
            .await
            .map_err(support("close the register"))?;
        if !closed {
            return Err(CoreError::RegisterAlreadyClosed.into());
        }
        tx.commit().await.map_err(DbError::from).map_err(support("close the register"))?;

        register.closed_at = Some(closed_at);
        register.closing_cents = Some(register.balance_cents);

        info!(
            register = %register.id,
            closing = register.balance_cents,
            operator = %operator.id,
            "register closed"
        );

        Ok(register)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Loads one register.
    pub async fn register(&self, register_id: &str) -> EngineResult<Option<CashRegister>> {
        self.db
            .registers()
            .get_by_id(register_id)
            .await
            .map_err(support("load the register"))
    }

    /// The open till, if there is one.
    pub async fn open_till(&self) -> EngineResult<Option<CashRegister>> {
        self.db
            .registers()
            .open_till()
            .await
            .map_err(support("look up the open till"))
    }

    /// True when a till is currently open.
    pub async fn is_till_open(&self) -> EngineResult<bool> {
        Ok(self.open_till().await?.is_some())
    }

    /// All open registers, oldest first.
    pub async fn open_registers(&self) -> EngineResult<Vec<CashRegister>> {
        self.db
            .registers()
            .open_registers()
            .await
            .map_err(support("list open registers"))
    }

    /// All registers of one kind, newest first.
    pub async fn registers_by_kind(&self, kind: RegisterKind) -> EngineResult<Vec<CashRegister>> {
        self.db
            .registers()
            .by_kind(kind)
            .await
            .map_err(support("list registers"))
    }

    /// Registers of one kind opened on a day, given as `YYYY-MM-DD` or
    /// `YYYY/MM/DD`.
    pub async fn by_kind_on_date(
        &self,
        kind: RegisterKind,
        date: &str,
    ) -> EngineResult<Vec<CashRegister>> {
        let normalized = date.trim().replace('/', "-");
        let day = NaiveDate::parse_from_str(&normalized, "%Y-%m-%d").map_err(|_| {
            EngineError::from(ValidationError::InvalidFormat {
                field: "date".to_string(),
                reason: "expected YYYY-MM-DD".to_string(),
            })
        })?;

        self.db
            .registers()
            .by_kind_on_date(kind, day)
            .await
            .map_err(support("list registers"))
    }

    /// Bank registers, newest first. Payable settlement drains one of these.
    pub async fn banks(&self) -> EngineResult<Vec<CashRegister>> {
        self.registers_by_kind(RegisterKind::Bank).await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
