//! # Collaborator Seams
//!
//! The engine settles money; it does not own product stock or the customer
//! register. Those live behind the two traits here so deployments can plug
//! in whatever systems hold them, and tests can substitute recorders.
//!
//! Both traits are synchronous. The engine calls them at well-defined
//! points (stock after a sale commits, customer checks before documents
//! are created), never inside a held transaction.

use std::collections::HashSet;
use std::sync::Arc;

use vero_core::{CoreResult, StockDirection};

// =============================================================================
// Inventory
// =============================================================================

/// Receives stock movements for closed sales.
///
/// Called once per closed sale, after the closing transaction commits.
/// Failures are logged and do not reopen the sale.
pub trait Inventory: Send + Sync {
    /// Applies the stock movement of a sale's items.
    fn stock_movement(&self, sale_id: &str, direction: StockDirection) -> CoreResult<()>;
}

/// Inventory sink that accepts and drops every movement.
///
/// The default when no stock system is attached.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullInventory;

impl Inventory for NullInventory {
    fn stock_movement(&self, _sale_id: &str, _direction: StockDirection) -> CoreResult<()> {
        Ok(())
    }
}

// =============================================================================
// Customer Directory
// =============================================================================

/// Answers whether a customer id resolves.
///
/// Consulted before a document is tied to a customer: receivables, term
/// sales, collection receipts.
pub trait CustomerDirectory: Send + Sync {
    /// True when the id names a known customer.
    fn exists(&self, customer_id: &str) -> CoreResult<bool>;
}

/// Directory that recognizes every id.
///
/// The default for deployments that manage customers elsewhere and trust
/// the ids they pass in.
#[derive(Debug, Default, Clone, Copy)]
pub struct OpenDirectory;

impl CustomerDirectory for OpenDirectory {
    fn exists(&self, _customer_id: &str) -> CoreResult<bool> {
        Ok(true)
    }
}

/// Directory backed by a fixed id set.
///
/// Handy for embedders with a small customer file and for tests that need
/// unknown-customer rejections.
#[derive(Debug, Default, Clone)]
pub struct FixedDirectory {
    ids: HashSet<String>,
}

impl FixedDirectory {
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FixedDirectory {
            ids: ids.into_iter().map(Into::into).collect(),
        }
    }
}

impl CustomerDirectory for FixedDirectory {
    fn exists(&self, customer_id: &str) -> CoreResult<bool> {
        Ok(self.ids.contains(customer_id))
    }
}

/// Shared handle types the services store.
pub type SharedInventory = Arc<dyn Inventory>;
pub type SharedDirectory = Arc<dyn CustomerDirectory>;
