//! Shared fixtures for the service tests.
//!
//! Each test gets its own on-disk SQLite database in a temp directory, a
//! seeded operator, and helpers for the rows the workflows need. The temp
//! directory lives as long as the fixture.

use chrono::{NaiveDate, Utc};
use uuid::Uuid;
use vero_core::{
    CardTerminal, CashRegister, CoreResult, Installment, Money, Operator, ReceivableDoc,
    RegisterKind, StockDirection,
};
use vero_db::{Database, DbConfig};

use crate::collaborators::Inventory;
use crate::register::{OpenRegister, RegisterService};

pub(crate) const OPERATOR_ID: &str = "op-test";
pub(crate) const OPERATOR_PASSWORD: &str = "1234";

/// The seeded acting operator.
pub(crate) fn operator() -> Operator {
    Operator {
        id: OPERATOR_ID.to_string(),
        name: "Test Operator".to_string(),
    }
}

pub(crate) struct Fixture {
    pub db: Database,
    _dir: tempfile::TempDir,
}

/// A fresh database with the schema applied and the operator seeded.
pub(crate) async fn fixture() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let config = DbConfig::new(dir.path().join("engine.db"));
    let db = Database::new(config).await.unwrap();

    // Cost 4 keeps the hash rounds cheap; production hashes use the
    // bcrypt default.
    let hash = bcrypt::hash(OPERATOR_PASSWORD, 4).unwrap();
    db.operators().insert(&operator(), &hash).await.unwrap();

    Fixture { db, _dir: dir }
}

impl Fixture {
    /// Opens a register through the real service so the opening float is
    /// posted like production does it.
    pub async fn open_register(&self, kind: RegisterKind, opening_cents: i64) -> CashRegister {
        RegisterService::new(self.db.clone())
            .open(
                &operator(),
                OpenRegister::new(kind, Money::from_cents(opening_cents)),
            )
            .await
            .unwrap()
    }

    /// Reloads a register row.
    pub async fn register(&self, id: &str) -> CashRegister {
        self.db.registers().get_by_id(id).await.unwrap().unwrap()
    }

    /// Closes a register directly at the storage layer, skipping the
    /// password ceremony.
    pub async fn close_register(&self, id: &str) {
        let register = self.register(id).await;
        let mut conn = self.db.acquire().await.unwrap();
        let closed = self
            .db
            .registers()
            .close(&mut conn, id, register.balance_cents, Utc::now())
            .await
            .unwrap();
        assert!(closed, "register {id} was already closed");
    }

    /// Reloads an installment row.
    pub async fn installment(&self, id: &str) -> Installment {
        self.db
            .installments()
            .get_by_id(id)
            .await
            .unwrap()
            .unwrap()
    }

    /// Seeds a bank register, one terminal, and the four tender
    /// instruments.
    ///
    /// Terminal parameters: debit 3% fee with 1 day lead, credit 4.5% fee
    /// with 30 days lead, 5% anticipation fee.
    pub async fn card_setup(&self) -> CardSetup {
        let bank_register = self.open_register(RegisterKind::Bank, 0).await;

        let terminal_id = "term-test".to_string();
        sqlx::query(
            r#"
            INSERT INTO card_terminals
                (id, name, debit_fee_bps, credit_fee_bps, debit_lead_days,
                 credit_lead_days, anticipation_fee_bps, bank_register_id)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&terminal_id)
        .bind("Test terminal")
        .bind(300_i64)
        .bind(450_i64)
        .bind(1_i64)
        .bind(30_i64)
        .bind(500_i64)
        .bind(&bank_register.id)
        .execute(self.db.pool())
        .await
        .unwrap();

        for (id, name, kind, terminal) in [
            ("instr-cash", "Cash", "cash", None),
            ("instr-pix", "Pix", "pix", None),
            ("instr-debit", "Debit card", "debit", Some(terminal_id.as_str())),
            ("instr-credit", "Credit card", "credit", Some(terminal_id.as_str())),
        ] {
            sqlx::query(
                "INSERT INTO tender_instruments (id, name, kind, terminal_id) VALUES (?1, ?2, ?3, ?4)",
            )
            .bind(id)
            .bind(name)
            .bind(kind)
            .bind(terminal)
            .execute(self.db.pool())
            .await
            .unwrap();
        }

        let terminal = self
            .db
            .cards()
            .get_terminal(&terminal_id)
            .await
            .unwrap()
            .unwrap();

        CardSetup {
            terminal,
            bank_register,
            cash: "instr-cash".to_string(),
            debit: "instr-debit".to_string(),
            credit: "instr-credit".to_string(),
        }
    }

    /// Seeds only the cash and pix instruments, no terminal behind them.
    pub async fn cash_instruments(&self) {
        for (id, name, kind) in [("instr-cash", "Cash", "cash"), ("instr-pix", "Pix", "pix")] {
            sqlx::query(
                "INSERT INTO tender_instruments (id, name, kind, terminal_id) VALUES (?1, ?2, ?3, NULL)",
            )
            .bind(id)
            .bind(name)
            .bind(kind)
            .execute(self.db.pool())
            .await
            .unwrap();
        }
    }

    /// Stores a term payment plan and returns its id.
    pub async fn term_plan(&self, code: &str) -> String {
        let id = format!("plan-{}", code.replace('/', "-"));
        sqlx::query("INSERT INTO payment_plans (id, description, code) VALUES (?1, ?2, ?3)")
            .bind(&id)
            .bind(format!("{code} days"))
            .bind(code)
            .execute(self.db.pool())
            .await
            .unwrap();
        id
    }

    /// Seeds a receivable document with one open installment per
    /// `(amount_cents, due_on)` pair, in sequence order.
    pub async fn receivable(
        &self,
        customer_id: &str,
        installments: &[(i64, NaiveDate)],
    ) -> (ReceivableDoc, Vec<Installment>) {
        let today = Utc::now().date_naive();
        let doc = ReceivableDoc {
            id: Uuid::new_v4().to_string(),
            customer_id: customer_id.to_string(),
            memo: "Seeded receivable".to_string(),
            amount_cents: installments.iter().map(|(cents, _)| cents).sum(),
            issued_on: today,
            sale_id: None,
        };

        let mut tx = self.db.begin().await.unwrap();
        self.db
            .installments()
            .insert_receivable(&mut tx, &doc)
            .await
            .unwrap();

        let mut rows = Vec::new();
        for (index, (cents, due_on)) in installments.iter().enumerate() {
            let row = Installment {
                id: Uuid::new_v4().to_string(),
                payable_id: None,
                receivable_id: Some(doc.id.clone()),
                seq: index as i64 + 1,
                amount_cents: *cents,
                paid_cents: 0,
                remaining_cents: *cents,
                discount_cents: 0,
                surcharge_cents: 0,
                settled: false,
                issued_on: today,
                due_on: *due_on,
                settled_at: None,
            };
            self.db.installments().insert(&mut tx, &row).await.unwrap();
            rows.push(row);
        }
        tx.commit().await.unwrap();

        (doc, rows)
    }
}

/// Ids and rows from [`Fixture::card_setup`].
pub(crate) struct CardSetup {
    pub terminal: CardTerminal,
    pub bank_register: CashRegister,
    pub cash: String,
    pub debit: String,
    pub credit: String,
}

/// Inventory stub that remembers every movement it was asked for.
#[derive(Debug, Default)]
pub(crate) struct RecordingInventory {
    movements: std::sync::Mutex<Vec<(String, StockDirection)>>,
}

impl RecordingInventory {
    pub fn movements(&self) -> Vec<(String, StockDirection)> {
        self.movements.lock().unwrap().clone()
    }
}

impl Inventory for RecordingInventory {
    fn stock_movement(&self, sale_id: &str, direction: StockDirection) -> CoreResult<()> {
        self.movements
            .lock()
            .unwrap()
            .push((sale_id.to_string(), direction));
        Ok(())
    }
}
