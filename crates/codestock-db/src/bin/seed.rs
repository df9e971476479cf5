//! # Seed Data Generator
//!
//! Populates the database with a small demo catalog for development.
//!
//! ## Usage
//! ```bash
//! # Seed ./codestock_dev.db
//! cargo run -p codestock-db --bin seed
//!
//! # Specify database path
//! cargo run -p codestock-db --bin seed -- --db ./data/codestock.db
//!
//! # More log output
//! RUST_LOG=codestock_db=debug cargo run -p codestock-db --bin seed
//! ```
//!
//! ## Generated Data
//! - Two companies with a handful of products each
//! - Three categories
//! - Prices in two currencies (1 = USD, 2 = COP)
//! - One registered client and one order, printed as JSON at the end

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use std::env;
use tracing::info;
use tracing_subscriber::EnvFilter;

use codestock_core::{
    CategoryId, Company, CompanyId, CurrencyId, Money, NewCategory, OrderRequest, ProductRequest,
    RegisterUserRequest,
};
use codestock_db::{Database, DbConfig};

const USD: CurrencyId = CurrencyId::new(1);
const COP: CurrencyId = CurrencyId::new(2);

/// (company id, nit, name, products as (code, name, USD cents, COP cents, category index))
const COMPANIES: &[(i64, &str, &str, &[(&str, &str, i64, i64, usize)])] = &[
    (
        1,
        "900123456-7",
        "Acme",
        &[
            ("ACM-001", "Widget", 999, 4_000_000, 0),
            ("ACM-002", "Gadget", 2_450, 9_800_000, 0),
            ("ACM-003", "Sprocket", 375, 1_500_000, 1),
        ],
    ),
    (
        2,
        "800765432-1",
        "Globex",
        &[
            ("GLX-001", "Hammer", 1_599, 6_400_000, 1),
            ("GLX-002", "Paint Roller", 850, 3_400_000, 2),
        ],
    ),
];

const CATEGORIES: &[&str] = &["Electronics", "Tools", "Home"];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./codestock_dev.db");

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
                println!("CodeStock Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./codestock_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    info!(db = %db_path, "Seeding database");

    let db = Database::new(DbConfig::new(&db_path))
        .await
        .with_context(|| format!("opening {db_path}"))?;
    let catalog = db.catalog();
    let accounts = db.accounts();

    if !catalog.get_all_product_views().await?.is_empty() {
        println!("Database already has products; skipping seed.");
        println!("Delete the database file to regenerate.");
        return Ok(());
    }

    // Categories
    let mut category_ids: Vec<CategoryId> = Vec::with_capacity(CATEGORIES.len());
    for name in CATEGORIES {
        let category = catalog
            .create_category(NewCategory {
                name: name.to_string(),
            })
            .await?;
        category_ids.push(category.id);
    }

    // Companies and products
    let mut first_product = None;
    for (company_id, nit, name, products) in COMPANIES {
        let company = catalog
            .save_company(Company {
                id: CompanyId::new(*company_id),
                nit: nit.to_string(),
                name: name.to_string(),
                address: None,
                phone: None,
            })
            .await?;

        for (code, product_name, usd, cop, category) in products.iter() {
            let mut request = ProductRequest::new(*code, *product_name, company.id)
                .price(USD, Money::from_cents(*usd))
                .price(COP, Money::from_cents(*cop));
            if let Some(category_id) = category_ids.get(*category) {
                request = request.category(*category_id);
            }

            let view = catalog.create_or_update_product(request).await?;
            first_product.get_or_insert(view.id);
        }
        info!(company = %company.name, products = products.len(), "Company seeded");
    }

    // A client and their first order
    let account = accounts
        .register_user(RegisterUserRequest {
            name: "Ana".to_string(),
            last_name: "Gómez".to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(1990, 5, 17),
            phone: Some("3001234567".to_string()),
            gender: None,
            email: "ana@example.com".to_string(),
            password: "codestock-demo".to_string(),
        })
        .await?;

    let product_id = first_product.context("no product was seeded")?;
    let order = catalog
        .create_order(OrderRequest::new(account.client.id, Utc::now()).line_item(product_id, 2))
        .await?;

    println!("{}", serde_json::to_string_pretty(&order)?);

    db.close().await;
    Ok(())
}
