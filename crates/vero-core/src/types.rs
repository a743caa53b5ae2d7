//! # Domain Types
//!
//! Core type definitions for the settlement engine.
//!
//! ## Conventions
//! - Ids are UUID v4 strings
//! - Monetary fields are `*_cents: i64` (see [`crate::money::Money`])
//! - Timestamps are `DateTime<Utc>`, due dates are `NaiveDate`
//! - Enums persist as snake_case TEXT; the `sqlx` feature adds the
//!   database derives without pulling sqlx into pure-logic builds

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;

// =============================================================================
// FeeRate
// =============================================================================

/// An acquirer fee rate in basis points (1 bps = 0.01%).
///
/// ## Example
/// ```rust
/// use vero_core::types::FeeRate;
///
/// let rate = FeeRate::from_percent(3); // 3%
/// assert_eq!(rate.bps(), 300);
/// assert_eq!(FeeRate::from_bps(250).percent(), 2.5);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeeRate(u32);

impl FeeRate {
    /// Creates a rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        FeeRate(bps)
    }

    /// Creates a rate from whole percent.
    #[inline]
    pub const fn from_percent(percent: u32) -> Self {
        FeeRate(percent * 100)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage.
    #[inline]
    pub fn percent(&self) -> f64 {
        self.0 as f64 / 100.0
    }
}

/// Conversion from stored basis-point columns, which are `i64`.
///
/// Negative or oversized values are rejected rather than wrapped.
impl TryFrom<i64> for FeeRate {
    type Error = CoreError;

    fn try_from(bps: i64) -> CoreResult<Self> {
        u32::try_from(bps)
            .map(FeeRate)
            .map_err(|_| CoreError::InvalidFeeRate(bps))
    }
}

// =============================================================================
// Enums
// =============================================================================

/// Kind of cash register.
///
/// At most one TILL may be open system-wide at any time; safes and banks
/// have no such restriction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
pub enum RegisterKind {
    Till,
    Safe,
    Bank,
}

impl RegisterKind {
    /// Human-readable description used when the caller supplies none.
    pub fn default_description(&self) -> &'static str {
        match self {
            RegisterKind::Till => "Daily till",
            RegisterKind::Safe => "Safe",
            RegisterKind::Bank => "Bank account",
        }
    }

    /// Memo stamped on the opening-float ledger entry.
    pub fn opening_memo(&self) -> &'static str {
        match self {
            RegisterKind::Till => "Till opening",
            RegisterKind::Safe => "Safe opening",
            RegisterKind::Bank => "Bank opening",
        }
    }
}

/// Movement kind of a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
pub enum EntryKind {
    OpeningBalance,
    Receipt,
    Payment,
}

/// Direction of a ledger entry relative to its register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
pub enum EntryDirection {
    In,
    Out,
}

impl EntryDirection {
    /// Signed cent contribution of an entry to its register balance.
    ///
    /// ## Example
    /// ```rust
    /// use vero_core::types::EntryDirection;
    /// use vero_core::money::Money;
    ///
    /// assert_eq!(EntryDirection::In.signed(Money::from_cents(500)), 500);
    /// assert_eq!(EntryDirection::Out.signed(Money::from_cents(500)), -500);
    /// ```
    pub fn signed(&self, amount: Money) -> i64 {
        match self {
            EntryDirection::In => amount.cents(),
            EntryDirection::Out => -amount.cents(),
        }
    }
}

/// Sale lifecycle. CLOSED is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
pub enum SaleStatus {
    Open,
    Closed,
}

/// Card transaction class. Debit and credit carry separate fee and
/// lead-time parameters on the terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
pub enum CardClass {
    Debit,
    Credit,
}

/// Card settlement entry lifecycle.
///
/// TO_PROCESS transitions exactly once, to PROCESSED or ANTICIPATED.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
pub enum CardEntryStatus {
    ToProcess,
    Processed,
    Anticipated,
}

/// Tender instrument classification.
///
/// A closed set: instruments the engine cannot route do not exist. Cash and
/// Pix settle against an open till; Debit and Credit settle through a card
/// terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
pub enum TenderKind {
    Cash,
    Pix,
    Debit,
    Credit,
}

impl TenderKind {
    /// The card class this tender maps to, if it is a card tender.
    pub fn card_class(&self) -> Option<CardClass> {
        match self {
            TenderKind::Debit => Some(CardClass::Debit),
            TenderKind::Credit => Some(CardClass::Credit),
            TenderKind::Cash | TenderKind::Pix => None,
        }
    }
}

/// Which side of the ledger an installment lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallmentSide {
    Payable,
    Receivable,
}

/// Inventory movement vocabulary for the stock collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockDirection {
    Out,
}

// =============================================================================
// Identity
// =============================================================================

/// The acting operator, threaded explicitly into every operation that
/// stamps a user. Never a process-wide singleton.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Operator {
    pub id: String,
    pub name: String,
}

// =============================================================================
// Cash Register & Ledger
// =============================================================================

/// A till, safe, or bank account with a running balance.
///
/// The balance changes only through posted ledger entries; closing snapshots
/// it into `closing_cents` and is one-way.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct CashRegister {
    pub id: String,
    pub kind: RegisterKind,
    pub description: String,
    pub opening_cents: i64,
    pub balance_cents: i64,
    /// Digits-only, BANK kind only.
    pub agency: Option<String>,
    /// Digits-only, BANK kind only.
    pub account: Option<String>,
    pub operator_id: String,
    pub opened_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    pub closing_cents: Option<i64>,
}

impl CashRegister {
    pub fn is_open(&self) -> bool {
        self.closed_at.is_none()
    }
}

/// An immutable posting against a cash register.
///
/// The amount is stored unsigned; `direction` carries the sign. The optional
/// `installment_id` back-references the payable installment a PAYMENT entry
/// settles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct LedgerEntry {
    pub id: String,
    pub register_id: String,
    pub memo: String,
    pub amount_cents: i64,
    pub kind: EntryKind,
    pub direction: EntryDirection,
    pub operator_id: String,
    pub installment_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }

    /// Signed cent contribution to the register balance.
    pub fn signed_cents(&self) -> i64 {
        self.direction.signed(self.amount())
    }
}

// =============================================================================
// Payables, Receivables & Installments
// =============================================================================

/// A payable document header (money owed to a supplier).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PayableDoc {
    pub id: String,
    pub supplier_id: String,
    pub memo: String,
    pub amount_cents: i64,
    pub issued_on: NaiveDate,
}

/// A receivable document header (money owed by a customer), optionally
/// created by closing a sale under term billing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ReceivableDoc {
    pub id: String,
    pub customer_id: String,
    pub memo: String,
    pub amount_cents: i64,
    pub issued_on: NaiveDate,
    pub sale_id: Option<String>,
}

/// The figures an installment carries after a settlement is applied.
///
/// Pure output of [`Installment::apply_payment`]; the storage layer persists
/// them verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementFigures {
    pub paid_cents: i64,
    pub remaining_cents: i64,
    pub discount_cents: i64,
    pub surcharge_cents: i64,
    pub settled: bool,
}

/// One settleable unit under a payable or receivable document.
///
/// Exactly one of `payable_id` / `receivable_id` is set. Mutated only by the
/// settlement algorithm; once remaining hits zero the settled flag freezes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Installment {
    pub id: String,
    pub payable_id: Option<String>,
    pub receivable_id: Option<String>,
    /// 1-based position inside the owning document.
    pub seq: i64,
    pub amount_cents: i64,
    pub paid_cents: i64,
    pub remaining_cents: i64,
    pub discount_cents: i64,
    pub surcharge_cents: i64,
    pub settled: bool,
    pub issued_on: NaiveDate,
    pub due_on: NaiveDate,
    pub settled_at: Option<DateTime<Utc>>,
}

impl Installment {
    pub fn side(&self) -> InstallmentSide {
        if self.payable_id.is_some() {
            InstallmentSide::Payable
        } else {
            InstallmentSide::Receivable
        }
    }

    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }

    pub fn paid(&self) -> Money {
        Money::from_cents(self.paid_cents)
    }

    pub fn remaining(&self) -> Money {
        Money::from_cents(self.remaining_cents)
    }

    pub fn discount(&self) -> Money {
        Money::from_cents(self.discount_cents)
    }

    pub fn surcharge(&self) -> Money {
        Money::from_cents(self.surcharge_cents)
    }

    /// Computes the figures this installment would carry after a payment.
    ///
    /// ```text
    /// paid'      = paid + payment + surcharge
    /// remaining' = max(0, remaining - (payment + discount))
    /// settled'   = remaining' == 0
    /// ```
    ///
    /// Surcharge counts as money collected on top; discount reduces what is
    /// still owed. Whenever the clamp does not fire, the identity
    /// `paid' + remaining' + discount' == amount + surcharge'` holds.
    ///
    /// Rejects settled installments and payments above the open remainder.
    /// Every settlement in the engine, single or batch, goes through here.
    pub fn apply_payment(
        &self,
        payment: Money,
        surcharge: Money,
        discount: Money,
    ) -> CoreResult<SettlementFigures> {
        if self.settled {
            return Err(CoreError::InstallmentAlreadySettled(self.id.clone()));
        }
        if payment > self.remaining() {
            return Err(CoreError::PaymentExceedsRemaining);
        }

        let new_paid = self.paid() + payment + surcharge;
        let new_remaining = (self.remaining() - (payment + discount)).clamp_non_negative();

        Ok(SettlementFigures {
            paid_cents: new_paid.cents(),
            remaining_cents: new_remaining.cents(),
            discount_cents: (self.discount() + discount).cents(),
            surcharge_cents: (self.surcharge() + surcharge).cents(),
            settled: new_remaining.is_zero(),
        })
    }
}

// =============================================================================
// Card Settlement
// =============================================================================

/// An acquirer terminal with per-class fee and lead-time parameters.
///
/// Processed card money lands on the terminal's bank register.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct CardTerminal {
    pub id: String,
    pub name: String,
    pub debit_fee_bps: i64,
    pub credit_fee_bps: i64,
    pub debit_lead_days: i64,
    pub credit_lead_days: i64,
    pub anticipation_fee_bps: i64,
    pub bank_register_id: String,
}

impl CardTerminal {
    /// Fee rate for the given card class.
    ///
    /// Rejects a stored rate outside the `FeeRate` range.
    pub fn fee_rate(&self, class: CardClass) -> CoreResult<FeeRate> {
        match class {
            CardClass::Debit => FeeRate::try_from(self.debit_fee_bps),
            CardClass::Credit => FeeRate::try_from(self.credit_fee_bps),
        }
    }

    /// Settlement lead time in days for the given card class.
    pub fn lead_days(&self, class: CardClass) -> i64 {
        match class {
            CardClass::Debit => self.debit_lead_days,
            CardClass::Credit => self.credit_lead_days,
        }
    }

    /// Early cash-out fee rate (same for both classes).
    pub fn anticipation_rate(&self) -> CoreResult<FeeRate> {
        FeeRate::try_from(self.anticipation_fee_bps)
    }
}

/// A tender instrument presented at settlement time.
///
/// Card tenders carry the terminal they clear through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct TenderInstrument {
    pub id: String,
    pub name: String,
    pub kind: TenderKind,
    pub terminal_id: Option<String>,
}

/// A recorded card transaction with both the normal and the anticipated
/// figures pre-computed at creation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct CardEntry {
    pub id: String,
    pub terminal_id: String,
    pub card_class: CardClass,
    pub status: CardEntryStatus,
    pub gross_cents: i64,
    pub fee_bps: i64,
    pub fee_cents: i64,
    pub net_cents: i64,
    pub anticipation_fee_bps: i64,
    pub anticipation_fee_cents: i64,
    pub anticipated_net_cents: i64,
    /// Day the acquirer is expected to pay out (creation + lead days).
    pub expected_on: NaiveDate,
    pub operator_id: String,
    pub created_at: DateTime<Utc>,
}

impl CardEntry {
    pub fn net(&self) -> Money {
        Money::from_cents(self.net_cents)
    }

    pub fn anticipated_net(&self) -> Money {
        Money::from_cents(self.anticipated_net_cents)
    }
}

// =============================================================================
// Sales
// =============================================================================

/// A point-of-sale transaction.
///
/// Mutable while OPEN (items, customer, note); closing is terminal and
/// freezes the totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Sale {
    pub id: String,
    pub customer_id: Option<String>,
    pub note: Option<String>,
    pub status: SaleStatus,
    pub items_cents: i64,
    pub discount_cents: i64,
    pub surcharge_cents: i64,
    pub plan_id: Option<String>,
    pub operator_id: String,
    pub opened_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

impl Sale {
    pub fn is_open(&self) -> bool {
        self.status == SaleStatus::Open
    }
}

/// One line item of a sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleItem {
    pub id: String,
    pub sale_id: String,
    pub product_id: String,
    pub price_cents: i64,
}

/// A stored payment plan: the code is parsed into a
/// [`crate::plan::PlanKind`] at the closing boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PaymentPlan {
    pub id: String,
    pub description: String,
    pub code: String,
}

// =============================================================================
// Receipts
// =============================================================================

/// A receivable collection document: several open installments of one
/// customer gathered for a single receive action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Receipt {
    pub id: String,
    pub customer_id: String,
    pub total_cents: i64,
    pub received_cents: Option<i64>,
    pub discount_cents: Option<i64>,
    pub surcharge_cents: Option<i64>,
    pub instrument_id: Option<String>,
    pub operator_id: String,
    pub opened_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
}

impl Receipt {
    pub fn is_processed(&self) -> bool {
        self.processed_at.is_some()
    }

    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}
