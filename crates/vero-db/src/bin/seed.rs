//! # Seed Data Generator
//!
//! Populates a fresh database with the fixed rows the engine expects to
//! exist before the first till is opened.
//!
//! ## Usage
//! ```bash
//! # Seed the default development database
//! cargo run -p vero-db --bin seed
//!
//! # Specify database path
//! cargo run -p vero-db --bin seed -- --db ./data/vero.db
//! ```
//!
//! ## Seeded Rows
//! - Two operators with bcrypt close credentials (dev passwords printed)
//! - A safe and a bank register, both opened at zero
//! - One card terminal wired to the bank register
//! - Tender instruments: cash, pix, debit card, credit card
//! - Term payment plans: 30, 30/60, 30/60/90

use chrono::Utc;
use std::env;
use tracing_subscriber::EnvFilter;
use vero_core::{CashRegister, Operator, RegisterKind};
use vero_db::{Database, DbConfig};

/// Operators seeded for development, with their plain close passwords.
const OPERATORS: &[(&str, &str, &str)] = &[
    ("op-ana", "Ana Souza", "1234"),
    ("op-bruno", "Bruno Lima", "4321"),
];

/// Term payment plans: id, description, installment code.
const TERM_PLANS: &[(&str, &str, &str)] = &[
    ("plan-30", "30 days", "30"),
    ("plan-30-60", "30 and 60 days", "30/60"),
    ("plan-30-60-90", "30, 60 and 90 days", "30/60/90"),
];

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,vero_db=debug,sqlx=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./vero_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Vero Engine Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./vero_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Vero Engine Seed Data Generator");
    println!("==================================");
    println!("Database: {}", db_path);
    println!();

    // Connect to database
    let config = DbConfig::new(&db_path);
    let db = Database::new(config).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    // Check for a previous run
    let existing = db.operators().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} operators", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    println!();
    println!("Seeding operators...");
    for (id, name, password) in OPERATORS {
        let hash = bcrypt::hash(password, bcrypt::DEFAULT_COST)?;
        let operator = Operator {
            id: id.to_string(),
            name: name.to_string(),
        };
        db.operators().insert(&operator, &hash).await?;
        println!("  {} ({}) password {}", name, id, password);
    }

    println!();
    println!("Seeding registers...");
    let now = Utc::now();
    let mut conn = db.pool().acquire().await?;

    let safe = CashRegister {
        id: "reg-safe".to_string(),
        kind: RegisterKind::Safe,
        description: RegisterKind::Safe.default_description().to_string(),
        opening_cents: 0,
        balance_cents: 0,
        agency: None,
        account: None,
        operator_id: "op-ana".to_string(),
        opened_at: now,
        closed_at: None,
        closing_cents: None,
    };
    db.registers().insert(&mut conn, &safe).await?;
    println!("  {} ({})", safe.description, safe.id);

    let bank = CashRegister {
        id: "reg-bank".to_string(),
        kind: RegisterKind::Bank,
        description: RegisterKind::Bank.default_description().to_string(),
        opening_cents: 0,
        balance_cents: 0,
        agency: Some("0001".to_string()),
        account: Some("1234567".to_string()),
        operator_id: "op-ana".to_string(),
        opened_at: now,
        closed_at: None,
        closing_cents: None,
    };
    db.registers().insert(&mut conn, &bank).await?;
    println!("  {} ({})", bank.description, bank.id);

    println!();
    println!("Seeding card terminal and instruments...");
    sqlx::query(
        r#"
        INSERT INTO card_terminals
            (id, name, debit_fee_bps, credit_fee_bps, debit_lead_days,
             credit_lead_days, anticipation_fee_bps, bank_register_id)
        VALUES ('term-main', 'Main terminal', 150, 300, 1, 30, 200, 'reg-bank')
        "#,
    )
    .execute(db.pool())
    .await?;
    println!("  Main terminal (term-main) -> reg-bank");

    let instruments: &[(&str, &str, &str, Option<&str>)] = &[
        ("instr-cash", "Cash", "cash", None),
        ("instr-pix", "Pix", "pix", None),
        ("instr-debit", "Debit card", "debit", Some("term-main")),
        ("instr-credit", "Credit card", "credit", Some("term-main")),
    ];
    for (id, name, kind, terminal_id) in instruments {
        sqlx::query(
            "INSERT INTO tender_instruments (id, name, kind, terminal_id) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(id)
        .bind(name)
        .bind(kind)
        .bind(terminal_id)
        .execute(db.pool())
        .await?;
        println!("  {} ({})", name, id);
    }

    println!();
    println!("Seeding payment plans...");
    for (id, description, code) in TERM_PLANS {
        sqlx::query("INSERT INTO payment_plans (id, description, code) VALUES (?1, ?2, ?3)")
            .bind(id)
            .bind(description)
            .bind(code)
            .execute(db.pool())
            .await?;
        println!("  {} ({})", description, code);
    }

    println!();
    println!("✓ Seed complete!");

    Ok(())
}
