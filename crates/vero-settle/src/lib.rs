//! # vero-settle: Settlement Services for Vero POS
//!
//! This crate provides the transactional service layer of the settlement
//! engine: every operation that moves money or changes a document's
//! lifecycle lives here, on top of the `vero-db` repositories and the
//! pure arithmetic in `vero-core`.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                        Settlement Services                          │
//! │                                                                     │
//! │  ┌───────────────┐      ┌───────────────┐     ┌─────────────────┐  │
//! │  │ SaleService   │      │ ReceiptService│     │SettlementService│  │
//! │  │               │      │               │     │                 │  │
//! │  │ open / items  │      │ gather open   │     │ raise payables  │  │
//! │  │ close under a │      │ installments, │     │ settle them     │  │
//! │  │ payment plan  │      │ receive once  │     │ against a       │  │
//! │  │               │      │               │     │ register        │  │
//! │  └───────┬───────┘      └───────┬───────┘     └────────┬────────┘  │
//! │          │ single-tender        │ cash/pix             │ outflow    │
//! │          │ cash, or cards       │ or cards             │            │
//! │          ▼                      ▼                      ▼            │
//! │  ┌───────────────┐      ┌─────────────────────────────────────┐    │
//! │  │ CardService   │      │            LedgerService            │    │
//! │  │               │      │                                     │    │
//! │  │ record entry  │─────►│ post IN/OUT entries, guard balance  │    │
//! │  │ process or    │      │ and register state in one statement │    │
//! │  │ anticipate    │      └─────────────────┬───────────────────┘    │
//! │  └───────────────┘                        │                        │
//! │                                           ▼                        │
//! │  ┌───────────────┐      ┌─────────────────────────────────────┐    │
//! │  │ collaborators │      │           RegisterService           │    │
//! │  │               │      │                                     │    │
//! │  │ inventory and │      │ open till/safe/bank, close with     │    │
//! │  │ customer dir  │      │ password, single-open-till rule     │    │
//! │  └───────────────┘      └─────────────────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`register`] - Cash register lifecycle (open, password close, queries)
//! - [`ledger`] - Movement posting with balance and state guards
//! - [`settlement`] - Payable documents and installment settlement
//! - [`receipt`] - Receivable collection receipts
//! - [`card`] - Card settlement entries (record, process, anticipate)
//! - [`sale`] - Sale lifecycle and the money side of closing
//! - [`collaborators`] - Inventory and customer-directory seams
//! - [`error`] - Engine error type, domain vs support split
//!
//! ## Usage
//!
//! ```rust,ignore
//! use vero_settle::{OpenRegister, RegisterService, SaleService};
//! use vero_core::{Money, RegisterKind};
//!
//! let registers = RegisterService::new(db.clone());
//! registers
//!     .open(&operator, OpenRegister::new(RegisterKind::Till, Money::from_cents(50_00)))
//!     .await?;
//!
//! let sales = SaleService::new(db);
//! let sale = sales.open_sale(&operator, None, None).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod card;
pub mod collaborators;
pub mod error;
pub mod ledger;
pub mod receipt;
pub mod register;
pub mod sale;
pub mod settlement;

#[cfg(test)]
mod testutil;

// =============================================================================
// Re-exports
// =============================================================================

pub use card::CardService;
pub use collaborators::{
    CustomerDirectory, FixedDirectory, Inventory, NullInventory, OpenDirectory, SharedDirectory,
    SharedInventory,
};
pub use error::{EngineError, EngineResult};
pub use ledger::{LedgerService, NewLedgerEntry};
pub use receipt::{ReceiptService, ReceiveReceipt};
pub use register::{OpenRegister, RegisterService};
pub use sale::{CloseSale, SaleService};
pub use settlement::{RaisePayable, SettlePayable, SettlementService};
