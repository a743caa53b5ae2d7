//! # Sale Service
//!
//! Sale lifecycle from an empty open sale to the money side of its close.
//!
//! ```text
//! open_sale ──► add_item / remove_item ──► close
//!                  (running total)           │
//!                              ┌─────────────┴──────────────┐
//!                              ▼                            ▼
//!                        plan "00"                   plan "30/60/..."
//!                   one tender, today            receivable + installments
//!                   cash ► open till             due at the day offsets
//!                   card ► card entry
//! ```
//!
//! Closing compares against `total - discount + surcharge`. A closed sale
//! rejects every further mutation with the same error and no side effects.
//!
//! Stock movement is a collaborator call after commit; a failure there is
//! logged and does not reopen the sale.

use chrono::Utc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;
use vero_core::validation::validate_positive_amount;
use vero_core::{
    CoreError, EntryDirection, EntryKind, Installment, Money, Operator, PaymentPlan, PlanKind,
    ReceivableDoc, Sale, SaleItem, SaleStatus, StockDirection, ValidationError,
};
use vero_db::{Database, DbError, DbResult};

use crate::card::CardService;
use crate::collaborators::{
    NullInventory, OpenDirectory, SharedDirectory, SharedInventory,
};
use crate::error::{support, EngineResult};
use crate::ledger::{LedgerService, NewLedgerEntry};

// =============================================================================
// Input
// =============================================================================

/// A request to close a sale.
#[derive(Debug, Clone, PartialEq)]
pub struct CloseSale {
    pub sale_id: String,
    pub plan_id: String,
    /// Value of the items as presented at the closing screen.
    pub total: Money,
    pub discount: Money,
    pub surcharge: Money,
    /// One amount per plan installment, as entered. The single-tender plan
    /// reads only the first.
    pub installment_amounts: Vec<String>,
    /// Tender instruments parallel to the amounts. Only the single-tender
    /// plan uses them; term installments are collected later via receipts.
    pub instrument_ids: Vec<String>,
}

/// Validated closing shape, derived from the plan code before any write.
enum Closing {
    Single { instrument_id: String },
    Term { customer_id: String, amounts: Vec<Money> },
}

/// Outcome of the item-removal transaction.
enum ItemRemoval {
    Removed,
    Missing,
    SaleClosed,
}

// =============================================================================
// SaleService
// =============================================================================

/// Sales and their closing.
#[derive(Clone)]
pub struct SaleService {
    db: Database,
    ledger: LedgerService,
    cards: CardService,
    inventory: SharedInventory,
    directory: SharedDirectory,
}

impl SaleService {
    pub fn new(db: Database) -> Self {
        SaleService {
            ledger: LedgerService::new(db.clone()),
            cards: CardService::new(db.clone()),
            inventory: std::sync::Arc::new(NullInventory),
            directory: std::sync::Arc::new(OpenDirectory),
            db,
        }
    }

    /// Replaces the inventory collaborator.
    pub fn with_inventory(mut self, inventory: SharedInventory) -> Self {
        self.inventory = inventory;
        self
    }

    /// Replaces the customer directory.
    pub fn with_directory(mut self, directory: SharedDirectory) -> Self {
        self.directory = directory;
        self
    }

    // ========================================================================
    // Opening and editing
    // ========================================================================

    /// Opens an empty sale, optionally bound to a customer.
    pub async fn open_sale(
        &self,
        operator: &Operator,
        customer_id: Option<&str>,
        note: Option<&str>,
    ) -> EngineResult<Sale> {
        let customer_id = customer_id.map(str::trim).filter(|v| !v.is_empty());
        if let Some(customer) = customer_id {
            if !self.directory.exists(customer)? {
                return Err(CoreError::CustomerNotFound(customer.to_string()).into());
            }
        }
        let note = note.map(str::trim).filter(|v| !v.is_empty());

        let sale = Sale {
            id: Uuid::new_v4().to_string(),
            customer_id: customer_id.map(str::to_string),
            note: note.map(str::to_string),
            status: SaleStatus::Open,
            items_cents: 0,
            discount_cents: 0,
            surcharge_cents: 0,
            plan_id: None,
            operator_id: operator.id.clone(),
            opened_at: Utc::now(),
            closed_at: None,
        };
        self.db
            .sales()
            .insert(&sale)
            .await
            .map_err(support("open the sale"))?;

        info!(sale = %sale.id, operator = %operator.id, "sale opened");
        Ok(sale)
    }

    /// Rebinds the customer and note of an open sale.
    pub async fn update_sale(
        &self,
        operator: &Operator,
        sale_id: &str,
        customer_id: Option<&str>,
        note: Option<&str>,
    ) -> EngineResult<Sale> {
        let mut sale = self.require_sale(sale_id).await?;
        if !sale.is_open() {
            return Err(CoreError::SaleNotOpen.into());
        }

        let customer_id = customer_id.map(str::trim).filter(|v| !v.is_empty());
        if let Some(customer) = customer_id {
            if !self.directory.exists(customer)? {
                return Err(CoreError::CustomerNotFound(customer.to_string()).into());
            }
        }
        let note = note.map(str::trim).filter(|v| !v.is_empty());

        let updated = self
            .db
            .sales()
            .update_customer_note(&sale.id, customer_id, note)
            .await
            .map_err(support("update the sale"))?;
        if !updated {
            return Err(CoreError::SaleNotOpen.into());
        }

        sale.customer_id = customer_id.map(str::to_string);
        sale.note = note.map(str::to_string);
        debug!(sale = %sale.id, operator = %operator.id, "sale updated");
        Ok(sale)
    }

    // ========================================================================
    // Items
    // ========================================================================

    /// Adds an item line and bumps the running total.
    ///
    /// Returns the new item id, or `None` when the line could not be
    /// stored; the sale keeps going either way.
    pub async fn add_item(
        &self,
        operator: &Operator,
        sale_id: &str,
        product_id: &str,
        price: Money,
    ) -> EngineResult<Option<String>> {
        validate_positive_amount("price", price)?;
        let product_id = product_id.trim();
        if product_id.is_empty() {
            return Err(ValidationError::Required {
                field: "product".to_string(),
            }
            .into());
        }

        let sale = self.require_sale(sale_id).await?;
        if !sale.is_open() {
            return Err(CoreError::SaleNotOpen.into());
        }

        let item = SaleItem {
            id: Uuid::new_v4().to_string(),
            sale_id: sale.id.clone(),
            product_id: product_id.to_string(),
            price_cents: price.cents(),
        };

        match self.store_item(&item).await {
            Ok(true) => {
                debug!(sale = %sale.id, item = %item.id, price = item.price_cents, operator = %operator.id, "item added");
                Ok(Some(item.id))
            }
            Ok(false) => Err(CoreError::SaleNotOpen.into()),
            Err(err) => {
                error!(sale = %sale.id, error = %err, "item could not be stored, continuing without it");
                Ok(None)
            }
        }
    }

    /// Removes an item line and subtracts it from the running total.
    ///
    /// An unknown item, an item of another sale, and a storage failure all
    /// come back as `false`.
    pub async fn remove_item(
        &self,
        operator: &Operator,
        sale_id: &str,
        item_id: &str,
    ) -> EngineResult<bool> {
        let sale = self.require_sale(sale_id).await?;
        if !sale.is_open() {
            return Err(CoreError::SaleNotOpen.into());
        }

        match self.remove_item_tx(&sale.id, item_id).await {
            Ok(ItemRemoval::Removed) => {
                debug!(sale = %sale.id, item = %item_id, operator = %operator.id, "item removed");
                Ok(true)
            }
            Ok(ItemRemoval::Missing) => Ok(false),
            Ok(ItemRemoval::SaleClosed) => Err(CoreError::SaleNotOpen.into()),
            Err(err) => {
                error!(sale = %sale.id, item = %item_id, error = %err, "item could not be removed, continuing");
                Ok(false)
            }
        }
    }

    async fn store_item(&self, item: &SaleItem) -> DbResult<bool> {
        let mut tx = self.db.begin().await?;
        if !self
            .db
            .sales()
            .bump_items_total(&mut tx, &item.sale_id, item.price_cents)
            .await?
        {
            return Ok(false);
        }
        self.db.sales().insert_item(&mut tx, item).await?;
        tx.commit().await?;
        Ok(true)
    }

    async fn remove_item_tx(&self, sale_id: &str, item_id: &str) -> DbResult<ItemRemoval> {
        let mut tx = self.db.begin().await?;
        let item = match self.db.sales().get_item(&mut tx, item_id).await? {
            Some(item) if item.sale_id == sale_id => item,
            _ => return Ok(ItemRemoval::Missing),
        };
        if !self
            .db
            .sales()
            .bump_items_total(&mut tx, sale_id, -item.price_cents)
            .await?
        {
            return Ok(ItemRemoval::SaleClosed);
        }
        if !self.db.sales().delete_item(&mut tx, item_id).await? {
            // Lost a race on the same line; dropping the transaction also
            // undoes the total bump.
            return Ok(ItemRemoval::Missing);
        }
        tx.commit().await?;
        Ok(ItemRemoval::Removed)
    }

    // ========================================================================
    // Closing
    // ========================================================================

    /// Closes a sale under a payment plan.
    ///
    /// Single-tender plans move the money now, cash into the open till and
    /// cards into a settlement entry. Term plans write a receivable with
    /// one installment per day offset instead; nothing hits a register
    /// until those are collected.
    pub async fn close(&self, operator: &Operator, request: CloseSale) -> EngineResult<Sale> {
        let mut sale = self.require_sale(&request.sale_id).await?;
        if !sale.is_open() {
            return Err(CoreError::SaleNotOpen.into());
        }
        if !request.total.is_positive() {
            return Err(CoreError::SaleHasNoValue.into());
        }
        for (field, amount) in [("discount", request.discount), ("surcharge", request.surcharge)] {
            if amount.is_negative() {
                return Err(ValidationError::MustBePositive {
                    field: field.to_string(),
                }
                .into());
            }
        }

        let plan = self
            .db
            .sales()
            .get_plan(&request.plan_id)
            .await
            .map_err(support("load the payment plan"))?
            .ok_or_else(|| CoreError::PlanNotFound(request.plan_id.clone()))?;
        let kind = PlanKind::parse(&plan.code)?;

        let settle_total = request.total - request.discount + request.surcharge;
        if !settle_total.is_positive() {
            return Err(CoreError::SaleHasNoValue.into());
        }

        let closing = match &kind {
            PlanKind::Single => {
                let raw = request
                    .installment_amounts
                    .first()
                    .map(|v| v.trim())
                    .unwrap_or("");
                if raw.is_empty() {
                    return Err(CoreError::InstallmentValueMissing.into());
                }
                let amount = Money::parse(raw)?;
                if amount != settle_total {
                    return Err(CoreError::InstallmentSumMismatch {
                        expected: settle_total,
                        got: amount,
                    }
                    .into());
                }

                let instrument_id = request.instrument_ids.first().map(|v| v.trim()).unwrap_or("");
                if instrument_id.is_empty() {
                    return Err(CoreError::TenderRequired.into());
                }
                Closing::Single {
                    instrument_id: instrument_id.to_string(),
                }
            }
            PlanKind::Term(offsets) => {
                let customer_id = sale
                    .customer_id
                    .clone()
                    .ok_or(CoreError::SaleHasNoCustomer)?;

                let mut amounts = Vec::with_capacity(offsets.len());
                let mut sum = Money::zero();
                for index in 0..offsets.len() {
                    let raw = request
                        .installment_amounts
                        .get(index)
                        .map(|v| v.trim())
                        .unwrap_or("");
                    if raw.is_empty() {
                        return Err(CoreError::InstallmentValueMissing.into());
                    }
                    let amount = Money::parse(raw)?;
                    validate_positive_amount("installment amount", amount)?;
                    sum += amount;
                    amounts.push(amount);
                }
                if sum != settle_total {
                    return Err(CoreError::InstallmentSumMismatch {
                        expected: settle_total,
                        got: sum,
                    }
                    .into());
                }
                Closing::Term { customer_id, amounts }
            }
        };

        let closed_at = Utc::now();
        let mut tx = self.db.begin().await.map_err(support("close the sale"))?;

        match &closing {
            Closing::Single { instrument_id } => {
                let instrument = self
                    .db
                    .cards()
                    .get_instrument_on(&mut tx, instrument_id)
                    .await
                    .map_err(support("load the tender instrument"))?
                    .ok_or_else(|| CoreError::InstrumentNotFound(instrument_id.clone()))?;
                match instrument.kind.card_class() {
                    // Card money arrives via the settlement entry.
                    Some(_) => {
                        self.cards
                            .record_on(&mut tx, operator, &instrument, settle_total)
                            .await?;
                    }
                    // Cash money needs the open till.
                    None => {
                        let till = self
                            .db
                            .registers()
                            .open_till_on(&mut tx)
                            .await
                            .map_err(support("look up the open till"))?
                            .ok_or(CoreError::NoOpenRegister)?;
                        self.ledger
                            .post_on(
                                &mut tx,
                                operator,
                                NewLedgerEntry {
                                    register_id: till.id,
                                    memo: format!("Sale {} receipt", sale.id),
                                    amount: settle_total,
                                    kind: EntryKind::Receipt,
                                    direction: EntryDirection::In,
                                    installment_id: None,
                                },
                            )
                            .await?;
                    }
                }
            }
            Closing::Term { customer_id, amounts } => {
                let today = closed_at.date_naive();
                let doc = ReceivableDoc {
                    id: Uuid::new_v4().to_string(),
                    customer_id: customer_id.clone(),
                    memo: format!("Sale {}", sale.id),
                    amount_cents: settle_total.cents(),
                    issued_on: today,
                    sale_id: Some(sale.id.clone()),
                };
                self.db
                    .installments()
                    .insert_receivable(&mut tx, &doc)
                    .await
                    .map_err(support("store the receivable"))?;
                let due = kind.due_dates(today);
                for (index, (due_on, amount)) in due.into_iter().zip(amounts).enumerate() {
                    let row = Installment {
                        id: Uuid::new_v4().to_string(),
                        payable_id: None,
                        receivable_id: Some(doc.id.clone()),
                        seq: index as i64 + 1,
                        amount_cents: amount.cents(),
                        paid_cents: 0,
                        remaining_cents: amount.cents(),
                        discount_cents: 0,
                        surcharge_cents: 0,
                        settled: false,
                        issued_on: today,
                        due_on,
                        settled_at: None,
                    };
                    self.db
                        .installments()
                        .insert(&mut tx, &row)
                        .await
                        .map_err(support("store the installments"))?;
                }
            }
        }

        let closed = self
            .db
            .sales()
            .close(
                &mut tx,
                &sale.id,
                request.discount.cents(),
                request.surcharge.cents(),
                &plan.id,
                closed_at,
            )
            .await
            .map_err(support("close the sale"))?;
        if !closed {
            return Err(CoreError::SaleNotOpen.into());
        }
        tx.commit().await.map_err(DbError::from).map_err(support("close the sale"))?;

        // The sale is closed at this point; a stock failure cannot reopen it.
        if let Err(err) = self.inventory.stock_movement(&sale.id, StockDirection::Out) {
            warn!(sale = %sale.id, error = %err, "stock movement failed after close");
        }

        sale.status = SaleStatus::Closed;
        sale.discount_cents = request.discount.cents();
        sale.surcharge_cents = request.surcharge.cents();
        sale.plan_id = Some(plan.id.clone());
        sale.closed_at = Some(closed_at);

        info!(
            sale = %sale.id,
            plan = %plan.code,
            total = settle_total.cents(),
            operator = %operator.id,
            "sale closed"
        );
        Ok(sale)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Loads a sale.
    pub async fn sale(&self, sale_id: &str) -> EngineResult<Option<Sale>> {
        self.db
            .sales()
            .get_by_id(sale_id)
            .await
            .map_err(support("load the sale"))
    }

    /// The item lines of a sale, in insertion order.
    pub async fn items(&self, sale_id: &str) -> EngineResult<Vec<SaleItem>> {
        self.db
            .sales()
            .items(sale_id)
            .await
            .map_err(support("load the sale items"))
    }

    /// All payment plans, by code.
    pub async fn plans(&self) -> EngineResult<Vec<PaymentPlan>> {
        self.db
            .sales()
            .plans()
            .await
            .map_err(support("load the payment plans"))
    }

    async fn require_sale(&self, sale_id: &str) -> EngineResult<Sale> {
        self.db
            .sales()
            .get_by_id(sale_id)
            .await
            .map_err(support("load the sale"))?
            .ok_or_else(|| CoreError::SaleNotFound(sale_id.to_string()).into())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::FixedDirectory;
    use crate::testutil::{self, RecordingInventory};
    use chrono::Duration;
    use std::sync::Arc;
    use vero_core::{CardEntryStatus, RegisterKind};
    use vero_db::CardEntryFilter;

    const SINGLE_PLAN: &str = "plan-single";

    fn close_cash(sale_id: &str, cents: i64) -> CloseSale {
        CloseSale {
            sale_id: sale_id.to_string(),
            plan_id: SINGLE_PLAN.to_string(),
            total: Money::from_cents(cents),
            discount: Money::zero(),
            surcharge: Money::zero(),
            installment_amounts: vec![Money::from_cents(cents).to_string()],
            instrument_ids: vec!["instr-cash".to_string()],
        }
    }

    #[tokio::test]
    async fn items_adjust_the_running_total() {
        let fixture = testutil::fixture().await;
        let operator = testutil::operator();
        let service = SaleService::new(fixture.db.clone());

        let sale = service.open_sale(&operator, None, None).await.unwrap();
        assert!(sale.is_open());
        assert_eq!(sale.items_cents, 0);

        let first = service
            .add_item(&operator, &sale.id, "prod-1", Money::from_cents(1_000))
            .await
            .unwrap()
            .unwrap();
        service
            .add_item(&operator, &sale.id, "prod-2", Money::from_cents(2_500))
            .await
            .unwrap()
            .unwrap();

        let reloaded = service.sale(&sale.id).await.unwrap().unwrap();
        assert_eq!(reloaded.items_cents, 3_500);
        assert_eq!(service.items(&sale.id).await.unwrap().len(), 2);

        assert!(service.remove_item(&operator, &sale.id, &first).await.unwrap());
        let reloaded = service.sale(&sale.id).await.unwrap().unwrap();
        assert_eq!(reloaded.items_cents, 2_500);
        assert_eq!(service.items(&sale.id).await.unwrap().len(), 1);

        // Unknown items and foreign items come back false, untouched total.
        assert!(!service.remove_item(&operator, &sale.id, "item-ghost").await.unwrap());
        let other = service.open_sale(&operator, None, None).await.unwrap();
        let foreign = service
            .add_item(&operator, &other.id, "prod-3", Money::from_cents(700))
            .await
            .unwrap()
            .unwrap();
        assert!(!service.remove_item(&operator, &sale.id, &foreign).await.unwrap());
        assert_eq!(service.sale(&other.id).await.unwrap().unwrap().items_cents, 700);
    }

    #[tokio::test]
    async fn customers_are_validated_against_the_directory() {
        let fixture = testutil::fixture().await;
        let operator = testutil::operator();
        let service = SaleService::new(fixture.db.clone())
            .with_directory(Arc::new(FixedDirectory::new(["cust-known"])));

        let err = service
            .open_sale(&operator, Some("cust-ghost"), None)
            .await
            .unwrap_err();
        assert_eq!(err, CoreError::CustomerNotFound("cust-ghost".into()).into());

        let sale = service
            .open_sale(&operator, Some("cust-known"), Some("walk-in"))
            .await
            .unwrap();
        assert_eq!(sale.customer_id.as_deref(), Some("cust-known"));
        assert_eq!(sale.note.as_deref(), Some("walk-in"));

        let err = service
            .update_sale(&operator, &sale.id, Some("cust-ghost"), None)
            .await
            .unwrap_err();
        assert_eq!(err, CoreError::CustomerNotFound("cust-ghost".into()).into());

        let updated = service
            .update_sale(&operator, &sale.id, None, Some("changed"))
            .await
            .unwrap();
        assert_eq!(updated.customer_id, None);
        assert_eq!(updated.note.as_deref(), Some("changed"));
    }

    #[tokio::test]
    async fn cash_close_credits_the_till_and_moves_stock() {
        let fixture = testutil::fixture().await;
        let operator = testutil::operator();
        let till = fixture.open_register(RegisterKind::Till, 0).await;
        fixture.cash_instruments().await;
        let inventory = Arc::new(RecordingInventory::default());
        let service = SaleService::new(fixture.db.clone()).with_inventory(inventory.clone());

        let sale = service.open_sale(&operator, None, None).await.unwrap();
        service
            .add_item(&operator, &sale.id, "prod-1", Money::from_cents(10_000))
            .await
            .unwrap();

        let closed = service
            .close(&operator, close_cash(&sale.id, 10_000))
            .await
            .unwrap();
        assert!(!closed.is_open());
        assert_eq!(closed.plan_id.as_deref(), Some(SINGLE_PLAN));
        assert!(closed.closed_at.is_some());

        let till = fixture.register(&till.id).await;
        assert_eq!(till.balance_cents, 10_000);
        assert_eq!(
            inventory.movements(),
            vec![(sale.id.clone(), StockDirection::Out)]
        );
    }

    #[tokio::test]
    async fn closing_twice_is_rejected_without_side_effects() {
        let fixture = testutil::fixture().await;
        let operator = testutil::operator();
        let till = fixture.open_register(RegisterKind::Till, 0).await;
        fixture.cash_instruments().await;
        let inventory = Arc::new(RecordingInventory::default());
        let service = SaleService::new(fixture.db.clone()).with_inventory(inventory.clone());

        let sale = service.open_sale(&operator, None, None).await.unwrap();
        service
            .add_item(&operator, &sale.id, "prod-1", Money::from_cents(4_000))
            .await
            .unwrap();
        service
            .close(&operator, close_cash(&sale.id, 4_000))
            .await
            .unwrap();

        let err = service
            .close(&operator, close_cash(&sale.id, 4_000))
            .await
            .unwrap_err();
        assert_eq!(err, CoreError::SaleNotOpen.into());

        // No second credit, no second stock movement, no item edits either.
        assert_eq!(fixture.register(&till.id).await.balance_cents, 4_000);
        assert_eq!(inventory.movements().len(), 1);
        let err = service
            .add_item(&operator, &sale.id, "prod-2", Money::from_cents(100))
            .await
            .unwrap_err();
        assert_eq!(err, CoreError::SaleNotOpen.into());
    }

    #[tokio::test]
    async fn card_close_records_a_settlement_entry() {
        let fixture = testutil::fixture().await;
        let operator = testutil::operator();
        let setup = fixture.card_setup().await;
        let service = SaleService::new(fixture.db.clone());

        let sale = service.open_sale(&operator, None, None).await.unwrap();
        service
            .add_item(&operator, &sale.id, "prod-1", Money::from_cents(5_000))
            .await
            .unwrap();

        // No till is open; a card close does not need one.
        service
            .close(
                &operator,
                CloseSale {
                    instrument_ids: vec![setup.credit.clone()],
                    ..close_cash(&sale.id, 5_000)
                },
            )
            .await
            .unwrap();

        let entries = fixture
            .db
            .cards()
            .list(&CardEntryFilter::default())
            .await
            .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].gross_cents, 5_000);
        assert_eq!(entries[0].status, CardEntryStatus::ToProcess);
        assert_eq!(
            fixture.register(&setup.bank_register.id).await.balance_cents,
            0
        );
    }

    #[tokio::test]
    async fn term_close_builds_the_receivable() {
        let fixture = testutil::fixture().await;
        let operator = testutil::operator();
        let plan_id = fixture.term_plan("30/60").await;
        let service = SaleService::new(fixture.db.clone());

        let sale = service
            .open_sale(&operator, Some("cust-1"), None)
            .await
            .unwrap();
        service
            .add_item(&operator, &sale.id, "prod-1", Money::from_cents(10_000))
            .await
            .unwrap();

        let closed = service
            .close(
                &operator,
                CloseSale {
                    sale_id: sale.id.clone(),
                    plan_id,
                    total: Money::from_cents(10_000),
                    discount: Money::zero(),
                    surcharge: Money::zero(),
                    installment_amounts: vec!["30.00".to_string(), "70.00".to_string()],
                    instrument_ids: Vec::new(),
                },
            )
            .await
            .unwrap();
        assert!(!closed.is_open());

        let receivable_id: String = sqlx::query_scalar("SELECT id FROM receivables WHERE sale_id = ?1")
            .bind(&sale.id)
            .fetch_one(fixture.db.pool())
            .await
            .unwrap();
        let doc = fixture
            .db
            .installments()
            .get_receivable(&receivable_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(doc.customer_id, "cust-1");
        assert_eq!(doc.amount_cents, 10_000);
        assert_eq!(doc.memo, format!("Sale {}", sale.id));

        let today = Utc::now().date_naive();
        let rows = fixture
            .db
            .installments()
            .open_for_receivable(&receivable_id)
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].seq, 1);
        assert_eq!(rows[0].amount_cents, 3_000);
        assert_eq!(rows[0].remaining_cents, 3_000);
        assert_eq!(rows[0].due_on, today + Duration::days(30));
        assert_eq!(rows[1].seq, 2);
        assert_eq!(rows[1].amount_cents, 7_000);
        assert_eq!(rows[1].due_on, today + Duration::days(60));
    }

    #[tokio::test]
    async fn term_close_checks_amounts_and_customer() {
        let fixture = testutil::fixture().await;
        let operator = testutil::operator();
        let plan_id = fixture.term_plan("30/60").await;
        let service = SaleService::new(fixture.db.clone());

        let sale = service
            .open_sale(&operator, Some("cust-1"), None)
            .await
            .unwrap();
        service
            .add_item(&operator, &sale.id, "prod-1", Money::from_cents(10_000))
            .await
            .unwrap();

        let request = CloseSale {
            sale_id: sale.id.clone(),
            plan_id: plan_id.clone(),
            total: Money::from_cents(10_000),
            discount: Money::zero(),
            surcharge: Money::zero(),
            installment_amounts: vec!["30.00".to_string(), "60.00".to_string()],
            instrument_ids: Vec::new(),
        };
        let err = service.close(&operator, request.clone()).await.unwrap_err();
        assert_eq!(
            err,
            CoreError::InstallmentSumMismatch {
                expected: Money::from_cents(10_000),
                got: Money::from_cents(9_000),
            }
            .into()
        );

        let err = service
            .close(
                &operator,
                CloseSale {
                    installment_amounts: vec!["30.00".to_string()],
                    ..request.clone()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err, CoreError::InstallmentValueMissing.into());

        // Rejections leave the sale open.
        assert!(service.sale(&sale.id).await.unwrap().unwrap().is_open());

        let no_customer = service.open_sale(&operator, None, None).await.unwrap();
        let err = service
            .close(
                &operator,
                CloseSale {
                    sale_id: no_customer.id.clone(),
                    ..request
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err, CoreError::SaleHasNoCustomer.into());
    }

    #[tokio::test]
    async fn close_rejections_leave_the_sale_open() {
        let fixture = testutil::fixture().await;
        let operator = testutil::operator();
        fixture.cash_instruments().await;
        let service = SaleService::new(fixture.db.clone());

        let sale = service.open_sale(&operator, None, None).await.unwrap();
        service
            .add_item(&operator, &sale.id, "prod-1", Money::from_cents(2_000))
            .await
            .unwrap();

        let err = service
            .close(&operator, close_cash(&sale.id, 0))
            .await
            .unwrap_err();
        assert_eq!(err, CoreError::SaleHasNoValue.into());

        let err = service
            .close(
                &operator,
                CloseSale {
                    plan_id: "plan-ghost".to_string(),
                    ..close_cash(&sale.id, 2_000)
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err, CoreError::PlanNotFound("plan-ghost".into()).into());

        let err = service
            .close(
                &operator,
                CloseSale {
                    installment_amounts: vec![String::new()],
                    ..close_cash(&sale.id, 2_000)
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err, CoreError::InstallmentValueMissing.into());

        let err = service
            .close(
                &operator,
                CloseSale {
                    instrument_ids: Vec::new(),
                    ..close_cash(&sale.id, 2_000)
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err, CoreError::TenderRequired.into());

        let err = service
            .close(
                &operator,
                CloseSale {
                    instrument_ids: vec!["instr-ghost".to_string()],
                    ..close_cash(&sale.id, 2_000)
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err, CoreError::InstrumentNotFound("instr-ghost".into()).into());

        // Cash with no open till rolls everything back.
        let err = service
            .close(&operator, close_cash(&sale.id, 2_000))
            .await
            .unwrap_err();
        assert_eq!(err, CoreError::NoOpenRegister.into());
        assert!(service.sale(&sale.id).await.unwrap().unwrap().is_open());
    }

    #[tokio::test]
    async fn discount_and_surcharge_shift_the_settle_total() {
        let fixture = testutil::fixture().await;
        let operator = testutil::operator();
        let till = fixture.open_register(RegisterKind::Till, 0).await;
        fixture.cash_instruments().await;
        let service = SaleService::new(fixture.db.clone());

        let sale = service.open_sale(&operator, None, None).await.unwrap();
        service
            .add_item(&operator, &sale.id, "prod-1", Money::from_cents(10_000))
            .await
            .unwrap();

        // 100.00 - 10.00 discount + 2.00 surcharge = 92.00 to collect.
        let err = service
            .close(
                &operator,
                CloseSale {
                    discount: Money::from_cents(1_000),
                    surcharge: Money::from_cents(200),
                    ..close_cash(&sale.id, 10_000)
                },
            )
            .await
            .unwrap_err();
        assert_eq!(
            err,
            CoreError::InstallmentSumMismatch {
                expected: Money::from_cents(9_200),
                got: Money::from_cents(10_000),
            }
            .into()
        );

        let closed = service
            .close(
                &operator,
                CloseSale {
                    discount: Money::from_cents(1_000),
                    surcharge: Money::from_cents(200),
                    installment_amounts: vec!["92.00".to_string()],
                    ..close_cash(&sale.id, 10_000)
                },
            )
            .await
            .unwrap();
        assert_eq!(closed.discount_cents, 1_000);
        assert_eq!(closed.surcharge_cents, 200);
        assert_eq!(fixture.register(&till.id).await.balance_cents, 9_200);
    }
}
