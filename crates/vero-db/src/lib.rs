//! # vero-db: Storage Layer for the Vero Settlement Engine
//!
//! This crate provides database access for the settlement engine.
//! It uses SQLite for local storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌────────────────────────────────────────────────────────────────────┐
//! │                     Vero Engine Data Flow                          │
//! │                                                                    │
//! │  Engine Service (vero-settle)                                      │
//! │       │                                                            │
//! │       ▼                                                            │
//! │  ┌────────────────────────────────────────────────────────────┐    │
//! │  │                   vero-db (THIS CRATE)                     │    │
//! │  │                                                            │    │
//! │  │   ┌───────────────┐   ┌────────────────┐   ┌────────────┐  │    │
//! │  │   │   Database    │   │  Repositories  │   │ Migrations │  │    │
//! │  │   │   (pool.rs)   │   │ (register.rs,  │   │ (embedded) │  │    │
//! │  │   │               │   │  ledger.rs...) │   │            │  │    │
//! │  │   │ SqlitePool    │◄──│ RegisterRepo   │   │ 001_*.sql  │  │    │
//! │  │   │ Transactions  │   │ LedgerRepo     │   │            │  │    │
//! │  │   └───────────────┘   └────────────────┘   └────────────┘  │    │
//! │  │                                                            │    │
//! │  └────────────────────────────────────────────────────────────┘    │
//! │       │                                                            │
//! │       ▼                                                            │
//! │  ┌────────────────────────────────────────────────────────────┐    │
//! │  │                     SQLite Database                        │    │
//! │  │          one file per store, WAL journal mode              │    │
//! │  └────────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations (register, ledger, etc.)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use vero_db::{Database, DbConfig};
//!
//! // Create database with default config
//! let config = DbConfig::new("path/to/db.sqlite");
//! let db = Database::new(config).await?;
//!
//! // Use repositories
//! let till = db.registers().open_till().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::card::{CardEntryFilter, CardRepository};
pub use repository::installment::InstallmentRepository;
pub use repository::ledger::LedgerRepository;
pub use repository::operator::OperatorRepository;
pub use repository::receipt::ReceiptRepository;
pub use repository::register::RegisterRepository;
pub use repository::sale::SaleRepository;
