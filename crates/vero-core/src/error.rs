//! # Domain Error Types
//!
//! Error types for the settlement engine's pure logic.
//!
//! ## Error Taxonomy
//! ```text
//! ValidationError  - malformed input (empty field, bad format, bad range)
//! CoreError        - a business rule rejected the operation; the message is
//!                    user-facing and the caller may correct and retry
//! ```
//!
//! Storage failures are NOT represented here. The database layer has its own
//! `DbError`, and the service layer decides which of those surface as a
//! support-contact error.

use thiserror::Error;

use crate::money::Money;

/// Business rule rejections.
///
/// Each variant corresponds to one user-facing refusal. Messages are stable:
/// callers and tests match on the variant, UIs render the `Display` text.
#[derive(Debug, Error, PartialEq)]
pub enum CoreError {
    // -------------------------------------------------------------------------
    // Cash registers
    // -------------------------------------------------------------------------
    /// A TILL-kind register is already open somewhere in the system.
    #[error("a till from a previous day is still open, close it first")]
    TillAlreadyOpen,

    /// Opening amount was negative.
    #[error("opening amount is invalid")]
    NegativeOpeningAmount,

    /// Register id did not resolve.
    #[error("cash register not found: {0}")]
    RegisterNotFound(String),

    /// Close called on a register that is already closed.
    #[error("cash register is already closed")]
    RegisterAlreadyClosed,

    /// Close called with an empty password.
    #[error("password is required to close a register")]
    PasswordRequired,

    /// Close password did not match the operator's stored credential.
    #[error("password does not match, check and try again")]
    PasswordMismatch,

    /// An operation needed an open till and none exists.
    #[error("no open cash register")]
    NoOpenRegister,

    /// An OUT posting would take the register balance below zero.
    #[error("insufficient register balance for this movement")]
    InsufficientRegisterBalance,

    // -------------------------------------------------------------------------
    // Installments
    // -------------------------------------------------------------------------
    /// Installment id did not resolve.
    #[error("installment not found: {0}")]
    InstallmentNotFound(String),

    /// Settlement amount exceeds what is still owed.
    #[error("payment exceeds the amount owed on this installment")]
    PaymentExceedsRemaining,

    /// Installment already reached remaining == 0.
    #[error("installment {0} is already settled")]
    InstallmentAlreadySettled(String),

    /// Installment belongs to a different customer than the receipt's.
    #[error("installment {0} does not belong to the selected customer")]
    InstallmentNotOwnedByCustomer(String),

    // -------------------------------------------------------------------------
    // Receipts (receivable collection documents)
    // -------------------------------------------------------------------------
    /// Customer id did not resolve in the directory.
    #[error("customer not found: {0}")]
    CustomerNotFound(String),

    /// Receipt id did not resolve.
    #[error("receipt not found: {0}")]
    ReceiptNotFound(String),

    /// Receive called on an already-processed receipt.
    #[error("receipt is already processed")]
    ReceiptAlreadyProcessed,

    /// Receipt has no linked installments to distribute over.
    #[error("receipt has no installments")]
    ReceiptHasNoInstallments,

    /// Received amount exceeds the sum of linked remainders.
    #[error("received amount exceeds the receipt total")]
    ReceiptAmountExceedsTotal,

    /// Received amount was zero or negative.
    #[error("received amount is invalid")]
    InvalidReceiptAmount,

    /// Receive called without a tender instrument.
    #[error("select a tender instrument before receiving")]
    TenderRequired,

    /// Remove called on a processed receipt.
    #[error("a processed receipt cannot be removed")]
    ReceiptAlreadyProcessedOnRemove,

    // -------------------------------------------------------------------------
    // Card settlement
    // -------------------------------------------------------------------------
    /// Tender instrument id did not resolve.
    #[error("tender instrument not found: {0}")]
    InstrumentNotFound(String),

    /// Instrument is not debit or credit, or has no terminal attached.
    #[error("instrument {0} is not a card tender")]
    NotACardInstrument(String),

    /// Card terminal id did not resolve.
    #[error("card terminal not found: {0}")]
    TerminalNotFound(String),

    /// A stored terminal fee in basis points does not fit a `FeeRate`.
    #[error("terminal fee rate is out of range: {0}")]
    InvalidFeeRate(i64),

    /// Card entry id did not resolve.
    #[error("card entry not found: {0}")]
    CardEntryNotFound(String),

    /// Process/anticipate called after the entry was processed.
    #[error("card entry has already been processed")]
    CardEntryAlreadyProcessed,

    /// Process/anticipate called after the entry was anticipated.
    #[error("card entry has already been anticipated")]
    CardEntryAlreadyAnticipated,

    // -------------------------------------------------------------------------
    // Sales
    // -------------------------------------------------------------------------
    /// Sale id did not resolve.
    #[error("sale not found: {0}")]
    SaleNotFound(String),

    /// Mutation or close attempted on a sale that is not OPEN.
    /// Repeat attempts get the same rejection with no side effects.
    #[error("sale is already closed")]
    SaleNotOpen,

    /// Close attempted with a non-positive total.
    #[error("sale has no value")]
    SaleHasNoValue,

    /// Term billing requires a customer on the sale.
    #[error("sale has no customer")]
    SaleHasNoCustomer,

    /// Payment plan id did not resolve.
    #[error("payment plan not found: {0}")]
    PlanNotFound(String),

    /// A term installment amount was blank.
    #[error("installment without value")]
    InstallmentValueMissing,

    /// Term installment amounts do not add up to the sale total.
    #[error("installment total {got} does not match sale total {expected}")]
    InstallmentSumMismatch { expected: Money, got: Money },

    // -------------------------------------------------------------------------
    // Payables
    // -------------------------------------------------------------------------
    /// Raising a payable without a supplier.
    #[error("supplier is required")]
    SupplierRequired,

    /// Input-shape failures bubbling up from validators and parsers.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),
}

/// Input validation failures.
///
/// Field-shaped so callers can point at the offending input.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field was empty or missing.
    #[error("{field} is required")]
    Required { field: String },

    /// A text field exceeded its maximum length.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// An amount that must be strictly positive was not.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// A field failed format rules.
    #[error("{field} is invalid: {reason}")]
    InvalidFormat { field: String, reason: String },
}

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_are_user_facing() {
        let err = CoreError::TillAlreadyOpen;
        assert_eq!(
            err.to_string(),
            "a till from a previous day is still open, close it first"
        );

        let err = CoreError::InstallmentSumMismatch {
            expected: Money::from_cents(10000),
            got: Money::from_cents(9000),
        };
        assert_eq!(
            err.to_string(),
            "installment total 90.00 does not match sale total 100.00"
        );
    }

    #[test]
    fn validation_errors_convert_into_core_errors() {
        let v = ValidationError::Required {
            field: "description".into(),
        };
        let core: CoreError = v.into();
        assert_eq!(core.to_string(), "validation error: description is required");
    }
}
