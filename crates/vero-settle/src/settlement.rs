//! # Settlement Service
//!
//! Raises supplier payables and settles their installments against a cash
//! register.
//!
//! ## Settle Flow
//! ```text
//! load installment ──► compute figures (pure guards: already settled,
//!      │                overpayment)
//!      ▼
//! post PAYMENT/OUT of paid + surcharge      cash side first: an empty
//!      │                                    register rejects here and
//!      ▼                                    the installment stays open
//! apply figures  WHERE settled = 0
//!      │
//!      ▼
//! commit
//! ```
//!
//! The whole flow is one transaction. A rejected cash movement, a raced
//! concurrent settle, or a storage failure rolls everything back; the
//! installment and the register always move together.

use chrono::{NaiveDate, Utc};
use tracing::info;
use uuid::Uuid;
use vero_core::validation::{validate_description, validate_positive_amount};
use vero_core::{
    CoreError, EntryDirection, EntryKind, Installment, InstallmentSide, Money, Operator,
    PayableDoc, ValidationError,
};
use vero_db::{Database, DbError};

use crate::error::{support, EngineResult};
use crate::ledger::{LedgerService, NewLedgerEntry};

/// Memo used when a payable is raised without one.
const DEFAULT_PAYABLE_MEMO: &str = "Supplier expense";

/// Memo on the ledger entry of a payable settlement; the entry also
/// back-references the installment it settles.
const SETTLE_MEMO: &str = "Payable settlement";

// =============================================================================
// Inputs
// =============================================================================

/// A request to raise a payable document.
#[derive(Debug, Clone, PartialEq)]
pub struct RaisePayable {
    pub supplier_id: String,
    /// Falls back to a generic expense memo when absent.
    pub memo: Option<String>,
    pub amount: Money,
    pub due_on: NaiveDate,
}

/// A request to settle (part of) a payable installment.
#[derive(Debug, Clone, PartialEq)]
pub struct SettlePayable {
    pub installment_id: String,
    /// Register the money leaves from.
    pub register_id: String,
    pub paid: Money,
    /// Extra charged on top (interest, late fee); leaves the register with
    /// the payment.
    pub surcharge: Money,
    /// Forgiven remainder; reduces what is owed without moving cash.
    pub discount: Money,
}

// =============================================================================
// SettlementService
// =============================================================================

/// Payable lifecycle: raise documents, settle installments.
#[derive(Debug, Clone)]
pub struct SettlementService {
    db: Database,
    ledger: LedgerService,
}

impl SettlementService {
    pub fn new(db: Database) -> Self {
        SettlementService {
            ledger: LedgerService::new(db.clone()),
            db,
        }
    }

    /// Raises a payable: one document header plus its single open
    /// installment, due on the given day.
    pub async fn raise_payable(
        &self,
        operator: &Operator,
        request: RaisePayable,
    ) -> EngineResult<(PayableDoc, Installment)> {
        if request.supplier_id.trim().is_empty() {
            return Err(CoreError::SupplierRequired.into());
        }
        validate_positive_amount("amount", request.amount)?;

        let memo = match request.memo.as_deref().map(str::trim) {
            Some(text) if !text.is_empty() => {
                validate_description("memo", text)?;
                text.to_string()
            }
            _ => DEFAULT_PAYABLE_MEMO.to_string(),
        };

        let today = Utc::now().date_naive();
        let doc = PayableDoc {
            id: Uuid::new_v4().to_string(),
            supplier_id: request.supplier_id.trim().to_string(),
            memo,
            amount_cents: request.amount.cents(),
            issued_on: today,
        };
        let installment = Installment {
            id: Uuid::new_v4().to_string(),
            payable_id: Some(doc.id.clone()),
            receivable_id: None,
            seq: 1,
            amount_cents: request.amount.cents(),
            paid_cents: 0,
            remaining_cents: request.amount.cents(),
            discount_cents: 0,
            surcharge_cents: 0,
            settled: false,
            issued_on: today,
            due_on: request.due_on,
            settled_at: None,
        };

        let mut tx = self.db.begin().await.map_err(support("raise the payable"))?;
        self.db
            .installments()
            .insert_payable(&mut tx, &doc)
            .await
            .map_err(support("raise the payable"))?;
        self.db
            .installments()
            .insert(&mut tx, &installment)
            .await
            .map_err(support("raise the payable"))?;
        tx.commit().await.map_err(DbError::from).map_err(support("raise the payable"))?;

        info!(
            payable = %doc.id,
            supplier = %doc.supplier_id,
            amount = doc.amount_cents,
            due = %installment.due_on,
            operator = %operator.id,
            "payable raised"
        );

        Ok((doc, installment))
    }

    /// Settles part or all of a payable installment, paying out of the
    /// given register.
    ///
    /// `paid + surcharge` leaves the register; `paid + discount` comes off
    /// the remainder. A zero outflow (discount-only settlement) posts no
    /// ledger entry.
    pub async fn settle(
        &self,
        operator: &Operator,
        request: SettlePayable,
    ) -> EngineResult<Installment> {
        for (field, amount) in [
            ("paid", request.paid),
            ("surcharge", request.surcharge),
            ("discount", request.discount),
        ] {
            if amount.is_negative() {
                return Err(ValidationError::MustBePositive {
                    field: field.to_string(),
                }
                .into());
            }
        }

        let mut tx = self.db.begin().await.map_err(support("settle the installment"))?;

        let mut installment = self
            .db
            .installments()
            .get_by_id_on(&mut tx, &request.installment_id)
            .await
            .map_err(support("load the installment"))?
            .ok_or_else(|| CoreError::InstallmentNotFound(request.installment_id.clone()))?;
        if installment.side() != InstallmentSide::Payable {
            return Err(ValidationError::InvalidFormat {
                field: "installment".to_string(),
                reason: "not a payable installment".to_string(),
            }
            .into());
        }

        let figures = installment.apply_payment(request.paid, request.surcharge, request.discount)?;

        let outflow = request.paid + request.surcharge;
        if outflow.is_positive() {
            self.ledger
                .post_on(
                    &mut tx,
                    operator,
                    NewLedgerEntry {
                        register_id: request.register_id.clone(),
                        memo: SETTLE_MEMO.to_string(),
                        amount: outflow,
                        kind: EntryKind::Payment,
                        direction: EntryDirection::Out,
                        installment_id: Some(installment.id.clone()),
                    },
                )
                .await?;
        }

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

        tx.commit().await.map_err(DbError::from).map_err(support("settle the installment"))?;

        installment.paid_cents = figures.paid_cents;
        installment.remaining_cents = figures.remaining_cents;
        installment.discount_cents = figures.discount_cents;
        installment.surcharge_cents = figures.surcharge_cents;
        installment.settled = figures.settled;
        installment.settled_at = settled_at;

        info!(
            installment = %installment.id,
            paid = request.paid.cents(),
            remaining = installment.remaining_cents,
            settled = installment.settled,
            register = %request.register_id,
            operator = %operator.id,
            "payable installment settled"
        );

        Ok(installment)
    }

    /// Loads a payable document.
    pub async fn payable(&self, id: &str) -> EngineResult<Option<PayableDoc>> {
        self.db
            .installments()
            .get_payable(id)
            .await
            .map_err(support("load the payable"))
    }

    /// Loads an installment.
    pub async fn installment(&self, id: &str) -> EngineResult<Option<Installment>> {
        self.db
            .installments()
            .get_by_id(id)
            .await
            .map_err(support("load the installment"))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil;
    use chrono::Duration;
    use vero_core::RegisterKind;

    fn raise(amount_cents: i64) -> RaisePayable {
        RaisePayable {
            supplier_id: "supp-1".into(),
            memo: None,
            amount: Money::from_cents(amount_cents),
            due_on: Utc::now().date_naive() + Duration::days(30),
        }
    }

    #[tokio::test]
    async fn raising_creates_document_and_installment() {
        let fixture = testutil::fixture().await;
        let service = SettlementService::new(fixture.db.clone());

        let (doc, installment) = service
            .raise_payable(&testutil::operator(), raise(10_000))
            .await
            .unwrap();

        assert_eq!(doc.memo, "Supplier expense");
        assert_eq!(doc.amount_cents, 10_000);
        assert_eq!(installment.payable_id.as_deref(), Some(doc.id.as_str()));
        assert_eq!(installment.seq, 1);
        assert_eq!(installment.amount_cents, 10_000);
        assert_eq!(installment.remaining_cents, 10_000);
        assert_eq!(installment.paid_cents, 0);
        assert!(!installment.settled);

        let stored = fixture.installment(&installment.id).await;
        assert_eq!(stored, installment);
    }

    #[tokio::test]
    async fn raising_requires_a_supplier_and_a_positive_amount() {
        let fixture = testutil::fixture().await;
        let service = SettlementService::new(fixture.db.clone());

        let err = service
            .raise_payable(
                &testutil::operator(),
                RaisePayable {
                    supplier_id: "  ".into(),
                    ..raise(10_000)
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err, CoreError::SupplierRequired.into());

        let err = service
            .raise_payable(&testutil::operator(), raise(0))
            .await
            .unwrap_err();
        assert!(err.is_domain());
    }

    #[tokio::test]
    async fn partial_settlement_moves_cash_and_conserves_value() {
        let fixture = testutil::fixture().await;
        let operator = testutil::operator();
        let register = fixture.open_register(RegisterKind::Till, 5_000).await;
        let service = SettlementService::new(fixture.db.clone());

        let (_, installment) = service.raise_payable(&operator, raise(10_000)).await.unwrap();

        let settled = service
            .settle(
                &operator,
                SettlePayable {
                    installment_id: installment.id.clone(),
                    register_id: register.id.clone(),
                    paid: Money::from_cents(3_000),
                    surcharge: Money::from_cents(200),
                    discount: Money::from_cents(100),
                },
            )
            .await
            .unwrap();

        assert_eq!(settled.paid_cents, 3_200);
        assert_eq!(settled.remaining_cents, 6_900);
        assert_eq!(settled.discount_cents, 100);
        assert_eq!(settled.surcharge_cents, 200);
        assert!(!settled.settled);

        // paid + remaining + discount == amount + surcharge
        assert_eq!(
            settled.paid() + settled.remaining() + settled.discount(),
            settled.amount() + settled.surcharge()
        );

        let register = fixture.register(&register.id).await;
        assert_eq!(register.balance_cents, 5_000 - 3_200);

        let entries = fixture
            .db
            .ledger()
            .list_for_register(&register.id)
            .await
            .unwrap();
        let payment = entries.last().unwrap();
        assert_eq!(payment.kind, EntryKind::Payment);
        assert_eq!(payment.direction, EntryDirection::Out);
        assert_eq!(payment.amount_cents, 3_200);
        assert_eq!(payment.installment_id.as_deref(), Some(installment.id.as_str()));
    }

    #[tokio::test]
    async fn full_settlement_freezes_the_installment() {
        let fixture = testutil::fixture().await;
        let operator = testutil::operator();
        let register = fixture.open_register(RegisterKind::Till, 20_000).await;
        let service = SettlementService::new(fixture.db.clone());

        let (_, installment) = service.raise_payable(&operator, raise(10_000)).await.unwrap();
        let request = SettlePayable {
            installment_id: installment.id.clone(),
            register_id: register.id.clone(),
            paid: Money::from_cents(10_000),
            surcharge: Money::zero(),
            discount: Money::zero(),
        };

        let settled = service.settle(&operator, request.clone()).await.unwrap();
        assert!(settled.settled);
        assert_eq!(settled.remaining_cents, 0);
        assert!(settled.settled_at.is_some());

        let err = service.settle(&operator, request).await.unwrap_err();
        assert_eq!(
            err,
            CoreError::InstallmentAlreadySettled(installment.id.clone()).into()
        );
    }

    #[tokio::test]
    async fn overpayment_is_rejected_before_any_movement() {
        let fixture = testutil::fixture().await;
        let operator = testutil::operator();
        let register = fixture.open_register(RegisterKind::Till, 50_000).await;
        let service = SettlementService::new(fixture.db.clone());

        let (_, installment) = service.raise_payable(&operator, raise(10_000)).await.unwrap();

        let err = service
            .settle(
                &operator,
                SettlePayable {
                    installment_id: installment.id.clone(),
                    register_id: register.id.clone(),
                    paid: Money::from_cents(10_001),
                    surcharge: Money::zero(),
                    discount: Money::zero(),
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err, CoreError::PaymentExceedsRemaining.into());

        assert_eq!(fixture.register(&register.id).await.balance_cents, 50_000);
        assert_eq!(fixture.installment(&installment.id).await.paid_cents, 0);
    }

    #[tokio::test]
    async fn insufficient_register_funds_leave_the_installment_open() {
        let fixture = testutil::fixture().await;
        let operator = testutil::operator();
        let register = fixture.open_register(RegisterKind::Till, 1_000).await;
        let service = SettlementService::new(fixture.db.clone());

        let (_, installment) = service.raise_payable(&operator, raise(10_000)).await.unwrap();

        let err = service
            .settle(
                &operator,
                SettlePayable {
                    installment_id: installment.id.clone(),
                    register_id: register.id.clone(),
                    paid: Money::from_cents(5_000),
                    surcharge: Money::zero(),
                    discount: Money::zero(),
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err, CoreError::InsufficientRegisterBalance.into());

        // The rejection rolled everything back.
        let after = fixture.installment(&installment.id).await;
        assert_eq!(after.paid_cents, 0);
        assert_eq!(after.remaining_cents, 10_000);
        assert!(!after.settled);
        assert_eq!(fixture.register(&register.id).await.balance_cents, 1_000);
    }

    #[tokio::test]
    async fn discount_only_settlement_posts_no_cash() {
        let fixture = testutil::fixture().await;
        let operator = testutil::operator();
        let register = fixture.open_register(RegisterKind::Till, 1_000).await;
        let service = SettlementService::new(fixture.db.clone());

        let (_, installment) = service.raise_payable(&operator, raise(10_000)).await.unwrap();

        let settled = service
            .settle(
                &operator,
                SettlePayable {
                    installment_id: installment.id.clone(),
                    register_id: register.id.clone(),
                    paid: Money::zero(),
                    surcharge: Money::zero(),
                    discount: Money::from_cents(10_000),
                },
            )
            .await
            .unwrap();
        assert!(settled.settled);
        assert_eq!(settled.paid_cents, 0);
        assert_eq!(settled.discount_cents, 10_000);

        assert_eq!(fixture.register(&register.id).await.balance_cents, 1_000);
        let entries = fixture
            .db
            .ledger()
            .list_for_register(&register.id)
            .await
            .unwrap();
        assert_eq!(entries.len(), 1); // opening float only
    }

    #[tokio::test]
    async fn receivable_installments_are_not_settled_here() {
        let fixture = testutil::fixture().await;
        let operator = testutil::operator();
        let register = fixture.open_register(RegisterKind::Till, 10_000).await;
        let service = SettlementService::new(fixture.db.clone());

        let due = Utc::now().date_naive() + Duration::days(30);
        let (_, rows) = fixture.receivable("cust-1", &[(5_000, due)]).await;

        let err = service
            .settle(
                &operator,
                SettlePayable {
                    installment_id: rows[0].id.clone(),
                    register_id: register.id.clone(),
                    paid: Money::from_cents(1_000),
                    surcharge: Money::zero(),
                    discount: Money::zero(),
                },
            )
            .await
            .unwrap_err();
        assert!(err.is_domain());
        assert!(!err.to_string().is_empty());
    }
}
