//! # vero-core: Pure Settlement Logic for Vero POS
//!
//! The heart of the settlement engine: money arithmetic, domain types,
//! payment-plan parsing, and validation, all with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! vero-settle (services, transactions)
//!      │
//!      ▼
//! vero-db     (SQLite pool, repositories, migrations)
//!      │
//!      ▼
//! vero-core   (THIS CRATE - pure functions, no I/O)
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Integer-cent `Money` with the half-up parse boundary
//! - [`types`] - Domain types (registers, ledger entries, installments,
//!   card entries, sales, receipts)
//! - [`plan`] - Payment-plan codes decoded once into a closed union
//! - [`error`] - Domain and validation error types
//! - [`validation`] - Input validation helpers
//!
//! ## Design Principles
//!
//! 1. **Pure functions**: deterministic, no side effects
//! 2. **Integer money**: all amounts are cents (i64), never floats
//! 3. **Explicit errors**: typed rejections, never strings or panics
//! 4. **Explicit identity**: the acting [`Operator`] is an argument,
//!    never ambient state

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod plan;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError, ValidationResult};
pub use money::Money;
pub use plan::PlanKind;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum length of free-text descriptions and ledger memos.
pub const DESCRIPTION_MAX_LEN: usize = 200;

/// Maximum number of installments a term plan may encode.
///
/// Caps runaway plan codes; three years of monthly installments is beyond
/// anything the tills sell on.
pub const TERM_MAX_INSTALLMENTS: usize = 36;
