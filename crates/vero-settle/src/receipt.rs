//! # Receipt Service
//!
//! Collects several open receivable installments of one customer in a
//! single receive action.
//!
//! ## Lifecycle
//! ```text
//! open_receipt ──► receipt row + links, total = Σ remaining
//!      │
//!      ├── receive ──► distribute amount oldest-first, post the money,
//!      │               mark processed (one-way)
//!      │
//!      └── remove ───► delete while unprocessed; links cascade
//! ```
//!
//! ## Distribution
//! The received amount walks the linked installments ordered by due date
//! then sequence. Each takes `min(leftover, remaining)`; the walk stops
//! when the amount is used up, so an early installment can settle while a
//! later one is untouched. The surcharge lands on the first installment
//! the walk touches, the discount on the last.
//!
//! ## Tender Routing
//! Cash and Pix need an open till and post RECEIPT/IN of
//! `amount + surcharge` there. Debit and Credit record a card entry
//! instead; the money arrives when that entry is processed.

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;
use vero_core::{CoreError, EntryDirection, EntryKind, Installment, Money, Operator, Receipt, ValidationError};
use vero_db::{Database, DbError};

use crate::card::CardService;
use crate::collaborators::{OpenDirectory, SharedDirectory};
use crate::error::{support, EngineError, EngineResult};
use crate::ledger::{LedgerService, NewLedgerEntry};

// =============================================================================
// Input
// =============================================================================

/// A request to receive against an open receipt.
#[derive(Debug, Clone, PartialEq)]
pub struct ReceiveReceipt {
    pub receipt_id: String,
    /// Amount applied to the installments; at most the receipt total.
    pub amount: Money,
    /// Extra collected on top (interest); rides the first touched
    /// installment.
    pub surcharge: Money,
    /// Forgiven remainder; rides the last touched installment.
    pub discount: Money,
    pub instrument_id: String,
}

// =============================================================================
// ReceiptService
// =============================================================================

/// Receivable collection receipts.
#[derive(Clone)]
pub struct ReceiptService {
    db: Database,
    ledger: LedgerService,
    cards: CardService,
    directory: SharedDirectory,
}

impl ReceiptService {
    pub fn new(db: Database) -> Self {
        ReceiptService {
            ledger: LedgerService::new(db.clone()),
            cards: CardService::new(db.clone()),
            directory: std::sync::Arc::new(OpenDirectory),
            db,
        }
    }

    /// Replaces the customer directory.
    pub fn with_directory(mut self, directory: SharedDirectory) -> Self {
        self.directory = directory;
        self
    }

    // ========================================================================
    // Opening
    // ========================================================================

    /// Opens a receipt over the given installments.
    ///
    /// Every installment must be an open receivable of the given customer;
    /// the receipt total is the sum of their remainders.
    pub async fn open_receipt(
        &self,
        operator: &Operator,
        customer_id: &str,
        installment_ids: &[String],
    ) -> EngineResult<Receipt> {
        if installment_ids.is_empty() {
            return Err(ValidationError::Required {
                field: "installments".to_string(),
            }
            .into());
        }

        let repo = self.db.installments();
        let mut total = Money::zero();
        for id in installment_ids {
            let installment = repo
                .get_by_id(id)
                .await
                .map_err(support("load the installment"))?
                .ok_or_else(|| CoreError::InstallmentNotFound(id.clone()))?;
            if installment.settled {
                return Err(CoreError::InstallmentAlreadySettled(id.clone()).into());
            }
            let receivable_id = installment
                .receivable_id
                .as_deref()
                .ok_or_else(|| CoreError::InstallmentNotOwnedByCustomer(id.clone()))?;
            let doc = repo
                .get_receivable(receivable_id)
                .await
                .map_err(support("load the receivable"))?
                .ok_or_else(|| {
                    warn!(installment = %id, receivable = %receivable_id, "installment references a missing receivable");
                    EngineError::Support {
                        action: "load the receivable",
                    }
                })?;
            if doc.customer_id != customer_id {
                return Err(CoreError::InstallmentNotOwnedByCustomer(id.clone()).into());
            }
            total += installment.remaining();
        }

        if !self.directory.exists(customer_id)? {
            return Err(CoreError::CustomerNotFound(customer_id.to_string()).into());
        }

        let receipt = Receipt {
            id: Uuid::new_v4().to_string(),
            customer_id: customer_id.to_string(),
            total_cents: total.cents(),
            received_cents: None,
            discount_cents: None,
            surcharge_cents: None,
            instrument_id: None,
            operator_id: operator.id.clone(),
            opened_at: Utc::now(),
            processed_at: None,
        };

        let mut tx = self.db.begin().await.map_err(support("open the receipt"))?;
        self.db
            .receipts()
            .insert(&mut tx, &receipt)
            .await
            .map_err(support("open the receipt"))?;
        for id in installment_ids {
            self.db
                .receipts()
                .link_installment(&mut tx, &receipt.id, id)
                .await
                .map_err(support("open the receipt"))?;
        }
        tx.commit().await.map_err(DbError::from).map_err(support("open the receipt"))?;

        info!(
            receipt = %receipt.id,
            customer = %receipt.customer_id,
            total = receipt.total_cents,
            installments = installment_ids.len(),
            operator = %operator.id,
            "receipt opened"
        );

        Ok(receipt)
    }

    // ========================================================================
    // Receiving
    // ========================================================================

    /// Receives against an open receipt and marks it processed.
    pub async fn receive(
        &self,
        operator: &Operator,
        request: ReceiveReceipt,
    ) -> EngineResult<Receipt> {
        for (field, amount) in [("surcharge", request.surcharge), ("discount", request.discount)] {
            if amount.is_negative() {
                return Err(ValidationError::MustBePositive {
                    field: field.to_string(),
                }
                .into());
            }
        }

        let mut tx = self.db.begin().await.map_err(support("receive the receipt"))?;

        let mut receipt = self
            .db
            .receipts()
            .get_by_id_on(&mut tx, &request.receipt_id)
            .await
            .map_err(support("load the receipt"))?
            .ok_or_else(|| CoreError::ReceiptNotFound(request.receipt_id.clone()))?;

        let instrument_id = request.instrument_id.trim();
        if instrument_id.is_empty() {
            return Err(CoreError::TenderRequired.into());
        }
        let instrument = self
            .db
            .cards()
            .get_instrument_on(&mut tx, instrument_id)
            .await
            .map_err(support("load the tender instrument"))?
            .ok_or(CoreError::TenderRequired)?;

        if receipt.is_processed() {
            return Err(CoreError::ReceiptAlreadyProcessed.into());
        }
        if request.amount > receipt.total() {
            return Err(CoreError::ReceiptAmountExceedsTotal.into());
        }

        let installments = self
            .db
            .installments()
            .for_receipt(&mut tx, &receipt.id)
            .await
            .map_err(support("load the receipt installments"))?;
        if installments.is_empty() {
            return Err(CoreError::ReceiptHasNoInstallments.into());
        }
        if !request.amount.is_positive() {
            return Err(CoreError::InvalidReceiptAmount.into());
        }

        // Oldest first: each takes what it can, the walk stops at zero.
        let mut leftover = request.amount;
        let mut touched: Vec<(Installment, Money)> = Vec::new();
        for installment in installments {
            if leftover.is_zero() {
                break;
            }
            let slice = leftover.min(installment.remaining());
            if slice.is_zero() {
                continue;
            }
            leftover -= slice;
            touched.push((installment, slice));
        }
        if leftover.is_positive() {
            // The linked installments no longer cover the amount; another
            // settlement got there first.
            return Err(CoreError::ReceiptAmountExceedsTotal.into());
        }

        let last = touched.len().saturating_sub(1);
        for (index, (installment, slice)) in touched.iter().enumerate() {
            let surcharge = if index == 0 { request.surcharge } else { Money::zero() };
            let discount = if index == last { request.discount } else { Money::zero() };

            let figures = installment.apply_payment(*slice, surcharge, discount)?;
            let settled_at = figures.settled.then(Utc::now);
            let applied = self
                .db
                .installments()
                .apply_settlement(
                    &mut tx,
                    &installment.id,
                    figures.paid_cents,
                    figures.remaining_cents,
                    figures.discount_cents,
                    figures.surcharge_cents,
                    figures.settled,
                    settled_at,
                )
                .await
                .map_err(support("apply the settlement"))?;
            if !applied {
                return Err(CoreError::InstallmentAlreadySettled(installment.id.clone()).into());
            }
        }

        match instrument.kind.card_class() {
            // Cash money needs an open till.
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
                            memo: format!("Receipt {} collection", receipt.id),
                            amount: request.amount + request.surcharge,
                            kind: EntryKind::Receipt,
                            direction: EntryDirection::In,
                            installment_id: None,
                        },
                    )
                    .await?;
            }
            // Card money arrives when the recorded entry is processed.
            Some(_) => {
                self.cards
                    .record_on(&mut tx, operator, &instrument, request.amount)
                    .await?;
            }
        }

        let processed_at = Utc::now();
        let marked = self
            .db
            .receipts()
            .mark_processed(
                &mut tx,
                &receipt.id,
                request.amount.cents(),
                request.discount.cents(),
                request.surcharge.cents(),
                &instrument.id,
                processed_at,
            )
            .await
            .map_err(support("mark the receipt processed"))?;
        if !marked {
            return Err(CoreError::ReceiptAlreadyProcessed.into());
        }

        tx.commit().await.map_err(DbError::from).map_err(support("receive the receipt"))?;

        receipt.received_cents = Some(request.amount.cents());
        receipt.discount_cents = Some(request.discount.cents());
        receipt.surcharge_cents = Some(request.surcharge.cents());
        receipt.instrument_id = Some(instrument.id.clone());
        receipt.processed_at = Some(processed_at);

        info!(
            receipt = %receipt.id,
            amount = request.amount.cents(),
            instrument = %instrument.id,
            operator = %operator.id,
            "receipt received"
        );

        Ok(receipt)
    }

    // ========================================================================
    // Removal
    // ========================================================================

    /// Removes an unprocessed receipt; its installment links go with it.
    pub async fn remove(&self, operator: &Operator, receipt_id: &str) -> EngineResult<()> {
        let receipt = self
            .db
            .receipts()
            .get_by_id(receipt_id)
            .await
            .map_err(support("load the receipt"))?
            .ok_or_else(|| CoreError::ReceiptNotFound(receipt_id.to_string()))?;
        if receipt.is_processed() {
            return Err(CoreError::ReceiptAlreadyProcessedOnRemove.into());
        }

        let mut conn = self.db.acquire().await.map_err(support("remove the receipt"))?;
        let deleted = self
            .db
            .receipts()
            .delete(&mut conn, receipt_id)
            .await
            .map_err(support("remove the receipt"))?;
        if !deleted {
            return Err(CoreError::ReceiptAlreadyProcessedOnRemove.into());
        }

        info!(receipt = %receipt_id, operator = %operator.id, "receipt removed");
        Ok(())
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Loads a receipt.
    pub async fn receipt(&self, receipt_id: &str) -> EngineResult<Option<Receipt>> {
        self.db
            .receipts()
            .get_by_id(receipt_id)
            .await
            .map_err(support("load the receipt"))
    }

    /// The installments linked to a receipt, in settlement order.
    pub async fn installments_for(&self, receipt_id: &str) -> EngineResult<Vec<Installment>> {
        let mut conn = self.db.acquire().await.map_err(support("load the receipt installments"))?;
        self.db
            .installments()
            .for_receipt(&mut conn, receipt_id)
            .await
            .map_err(support("load the receipt installments"))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::FixedDirectory;
    use crate::testutil;
    use chrono::Duration;
    use std::sync::Arc;
    use vero_core::{CardEntryStatus, RegisterKind};
    use vero_db::CardEntryFilter;

    const CUSTOMER: &str = "cust-1";

    fn due(days: i64) -> chrono::NaiveDate {
        Utc::now().date_naive() + Duration::days(days)
    }

    fn receive_cash(receipt_id: &str, amount_cents: i64) -> ReceiveReceipt {
        ReceiveReceipt {
            receipt_id: receipt_id.to_string(),
            amount: Money::from_cents(amount_cents),
            surcharge: Money::zero(),
            discount: Money::zero(),
            instrument_id: "instr-cash".to_string(),
        }
    }

    #[tokio::test]
    async fn opening_totals_the_open_remainders() {
        let fixture = testutil::fixture().await;
        let service = ReceiptService::new(fixture.db.clone());
        let (_, rows) = fixture
            .receivable(CUSTOMER, &[(5_000, due(30)), (5_000, due(60))])
            .await;
        let ids: Vec<String> = rows.iter().map(|r| r.id.clone()).collect();

        let receipt = service
            .open_receipt(&testutil::operator(), CUSTOMER, &ids)
            .await
            .unwrap();
        assert_eq!(receipt.total_cents, 10_000);
        assert!(!receipt.is_processed());

        let linked = service.installments_for(&receipt.id).await.unwrap();
        assert_eq!(linked.len(), 2);
    }

    #[tokio::test]
    async fn opening_rejects_foreign_and_settled_installments() {
        let fixture = testutil::fixture().await;
        let operator = testutil::operator();
        let service = ReceiptService::new(fixture.db.clone());

        // Installment of another customer.
        let (_, other_rows) = fixture.receivable("cust-other", &[(5_000, due(30))]).await;
        let err = service
            .open_receipt(&operator, CUSTOMER, &[other_rows[0].id.clone()])
            .await
            .unwrap_err();
        assert_eq!(
            err,
            CoreError::InstallmentNotOwnedByCustomer(other_rows[0].id.clone()).into()
        );

        // Already settled installment.
        let (_, rows) = fixture.receivable(CUSTOMER, &[(5_000, due(30))]).await;
        let receipt = service
            .open_receipt(&operator, CUSTOMER, &[rows[0].id.clone()])
            .await
            .unwrap();
        fixture.open_register(RegisterKind::Till, 0).await;
        fixture.cash_instruments().await;
        service
            .receive(&operator, receive_cash(&receipt.id, 5_000))
            .await
            .unwrap();
        let err = service
            .open_receipt(&operator, CUSTOMER, &[rows[0].id.clone()])
            .await
            .unwrap_err();
        assert_eq!(
            err,
            CoreError::InstallmentAlreadySettled(rows[0].id.clone()).into()
        );

        // Unknown installment.
        let err = service
            .open_receipt(&operator, CUSTOMER, &["inst-missing".to_string()])
            .await
            .unwrap_err();
        assert_eq!(err, CoreError::InstallmentNotFound("inst-missing".into()).into());
    }

    #[tokio::test]
    async fn opening_checks_the_customer_directory() {
        let fixture = testutil::fixture().await;
        let service = ReceiptService::new(fixture.db.clone())
            .with_directory(Arc::new(FixedDirectory::new(["cust-known"])));
        let (_, rows) = fixture.receivable("cust-ghost", &[(5_000, due(30))]).await;

        let err = service
            .open_receipt(&testutil::operator(), "cust-ghost", &[rows[0].id.clone()])
            .await
            .unwrap_err();
        assert_eq!(err, CoreError::CustomerNotFound("cust-ghost".into()).into());
    }

    #[tokio::test]
    async fn receiving_distributes_oldest_first_and_stops() {
        let fixture = testutil::fixture().await;
        let operator = testutil::operator();
        let till = fixture.open_register(RegisterKind::Till, 0).await;
        fixture.cash_instruments().await;
        let service = ReceiptService::new(fixture.db.clone());

        // Two 50.00 installments; receive 60.00.
        let (_, rows) = fixture
            .receivable(CUSTOMER, &[(5_000, due(30)), (5_000, due(60))])
            .await;
        let ids: Vec<String> = rows.iter().map(|r| r.id.clone()).collect();
        let receipt = service
            .open_receipt(&operator, CUSTOMER, &ids)
            .await
            .unwrap();

        let received = service
            .receive(&operator, receive_cash(&receipt.id, 6_000))
            .await
            .unwrap();
        assert!(received.is_processed());
        assert_eq!(received.received_cents, Some(6_000));

        let first = fixture.installment(&rows[0].id).await;
        assert!(first.settled);
        assert_eq!(first.paid_cents, 5_000);
        assert_eq!(first.remaining_cents, 0);

        let second = fixture.installment(&rows[1].id).await;
        assert!(!second.settled);
        assert_eq!(second.paid_cents, 1_000);
        assert_eq!(second.remaining_cents, 4_000);

        let till = fixture.register(&till.id).await;
        assert_eq!(till.balance_cents, 6_000);
    }

    #[tokio::test]
    async fn receiving_covers_exactly_the_first_installments() {
        let fixture = testutil::fixture().await;
        let operator = testutil::operator();
        fixture.open_register(RegisterKind::Till, 0).await;
        fixture.cash_instruments().await;
        let service = ReceiptService::new(fixture.db.clone());

        // Three 30.00 installments; 60.00 settles the first two exactly.
        let (_, rows) = fixture
            .receivable(CUSTOMER, &[(3_000, due(10)), (3_000, due(20)), (3_000, due(30))])
            .await;
        let ids: Vec<String> = rows.iter().map(|r| r.id.clone()).collect();
        let receipt = service
            .open_receipt(&operator, CUSTOMER, &ids)
            .await
            .unwrap();
        service
            .receive(&operator, receive_cash(&receipt.id, 6_000))
            .await
            .unwrap();

        assert!(fixture.installment(&rows[0].id).await.settled);
        assert!(fixture.installment(&rows[1].id).await.settled);
        let third = fixture.installment(&rows[2].id).await;
        assert!(!third.settled);
        assert_eq!(third.paid_cents, 0);
        assert_eq!(third.remaining_cents, 3_000);
    }

    #[tokio::test]
    async fn surcharge_rides_first_discount_rides_last() {
        let fixture = testutil::fixture().await;
        let operator = testutil::operator();
        let till = fixture.open_register(RegisterKind::Till, 0).await;
        fixture.cash_instruments().await;
        let service = ReceiptService::new(fixture.db.clone());

        let (_, rows) = fixture
            .receivable(CUSTOMER, &[(5_000, due(30)), (5_000, due(60))])
            .await;
        let ids: Vec<String> = rows.iter().map(|r| r.id.clone()).collect();
        let receipt = service
            .open_receipt(&operator, CUSTOMER, &ids)
            .await
            .unwrap();

        // Pix routes to the till exactly like cash.
        service
            .receive(
                &operator,
                ReceiveReceipt {
                    receipt_id: receipt.id.clone(),
                    amount: Money::from_cents(8_000),
                    surcharge: Money::from_cents(500),
                    discount: Money::from_cents(300),
                    instrument_id: "instr-pix".into(),
                },
            )
            .await
            .unwrap();

        let first = fixture.installment(&rows[0].id).await;
        assert_eq!(first.paid_cents, 5_500); // 50.00 + the 5.00 surcharge
        assert_eq!(first.surcharge_cents, 500);
        assert!(first.settled);

        let second = fixture.installment(&rows[1].id).await;
        assert_eq!(second.paid_cents, 3_000);
        assert_eq!(second.discount_cents, 300);
        assert_eq!(second.remaining_cents, 1_700); // 50.00 - 30.00 - 3.00

        // Conservation holds on both.
        for row in [&first, &second] {
            assert_eq!(
                row.paid_cents + row.remaining_cents + row.discount_cents,
                row.amount_cents + row.surcharge_cents
            );
        }

        // The till collected amount + surcharge.
        let till = fixture.register(&till.id).await;
        assert_eq!(till.balance_cents, 8_500);
    }

    #[tokio::test]
    async fn receive_rejections_follow_the_check_order() {
        let fixture = testutil::fixture().await;
        let operator = testutil::operator();
        fixture.open_register(RegisterKind::Till, 0).await;
        fixture.cash_instruments().await;
        let service = ReceiptService::new(fixture.db.clone());

        let (_, rows) = fixture.receivable(CUSTOMER, &[(5_000, due(30))]).await;
        let receipt = service
            .open_receipt(&operator, CUSTOMER, &[rows[0].id.clone()])
            .await
            .unwrap();

        let err = service
            .receive(
                &operator,
                ReceiveReceipt {
                    instrument_id: "  ".into(),
                    ..receive_cash(&receipt.id, 5_000)
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err, CoreError::TenderRequired.into());

        let err = service
            .receive(&operator, receive_cash(&receipt.id, 5_001))
            .await
            .unwrap_err();
        assert_eq!(err, CoreError::ReceiptAmountExceedsTotal.into());

        let err = service
            .receive(&operator, receive_cash(&receipt.id, 0))
            .await
            .unwrap_err();
        assert_eq!(err, CoreError::InvalidReceiptAmount.into());

        let err = service
            .receive(&operator, receive_cash("rcpt-missing", 1_000))
            .await
            .unwrap_err();
        assert_eq!(err, CoreError::ReceiptNotFound("rcpt-missing".into()).into());

        service
            .receive(&operator, receive_cash(&receipt.id, 5_000))
            .await
            .unwrap();
        let err = service
            .receive(&operator, receive_cash(&receipt.id, 1))
            .await
            .unwrap_err();
        assert_eq!(err, CoreError::ReceiptAlreadyProcessed.into());
    }

    #[tokio::test]
    async fn cash_receive_without_a_till_rolls_back() {
        let fixture = testutil::fixture().await;
        let operator = testutil::operator();
        fixture.cash_instruments().await;
        let service = ReceiptService::new(fixture.db.clone());

        let (_, rows) = fixture.receivable(CUSTOMER, &[(5_000, due(30))]).await;
        let receipt = service
            .open_receipt(&operator, CUSTOMER, &[rows[0].id.clone()])
            .await
            .unwrap();

        let err = service
            .receive(&operator, receive_cash(&receipt.id, 5_000))
            .await
            .unwrap_err();
        assert_eq!(err, CoreError::NoOpenRegister.into());

        // Nothing was applied.
        let row = fixture.installment(&rows[0].id).await;
        assert_eq!(row.paid_cents, 0);
        assert!(!row.settled);
        assert!(!fixture.db.receipts().get_by_id(&receipt.id).await.unwrap().unwrap().is_processed());
    }

    #[tokio::test]
    async fn card_receive_records_an_entry_instead_of_cash() {
        let fixture = testutil::fixture().await;
        let operator = testutil::operator();
        let setup = fixture.card_setup().await;
        let service = ReceiptService::new(fixture.db.clone());

        let (_, rows) = fixture.receivable(CUSTOMER, &[(5_000, due(30))]).await;
        let receipt = service
            .open_receipt(&operator, CUSTOMER, &[rows[0].id.clone()])
            .await
            .unwrap();

        // No till is open; a card tender does not need one.
        service
            .receive(
                &operator,
                ReceiveReceipt {
                    instrument_id: setup.debit.clone(),
                    ..receive_cash(&receipt.id, 5_000)
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

        // The bank register is untouched until the entry is processed.
        assert_eq!(
            fixture.register(&setup.bank_register.id).await.balance_cents,
            0
        );
        assert!(fixture.installment(&rows[0].id).await.settled);
    }

    #[tokio::test]
    async fn removal_is_for_unprocessed_receipts_only() {
        let fixture = testutil::fixture().await;
        let operator = testutil::operator();
        fixture.open_register(RegisterKind::Till, 0).await;
        fixture.cash_instruments().await;
        let service = ReceiptService::new(fixture.db.clone());

        let (_, rows) = fixture
            .receivable(CUSTOMER, &[(5_000, due(30)), (4_000, due(60))])
            .await;
        let ids: Vec<String> = rows.iter().map(|r| r.id.clone()).collect();

        let receipt = service
            .open_receipt(&operator, CUSTOMER, &ids)
            .await
            .unwrap();
        service.remove(&operator, &receipt.id).await.unwrap();
        assert!(service.receipt(&receipt.id).await.unwrap().is_none());
        assert!(service.installments_for(&receipt.id).await.unwrap().is_empty());

        // The installments themselves survive and can be gathered again.
        let receipt = service
            .open_receipt(&operator, CUSTOMER, &ids)
            .await
            .unwrap();
        service
            .receive(&operator, receive_cash(&receipt.id, 9_000))
            .await
            .unwrap();
        let err = service.remove(&operator, &receipt.id).await.unwrap_err();
        assert_eq!(err, CoreError::ReceiptAlreadyProcessedOnRemove.into());
    }
}
