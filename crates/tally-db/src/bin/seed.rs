//! # Seed Data Generator
//!
//! Creates a demo organization to poke the API with.
//!
//! ## Usage
//! ```bash
//! cargo run -p tally-db --bin seed
//!
//! # Specify database path and organization slug
//! cargo run -p tally-db --bin seed -- --db ./data/tally.db --slug warung-demo
//! ```
//!
//! ## What Gets Created
//! - One organization
//! - One session (token printed, valid 30 days)
//! - A handful of products, one with a "10 for 90,000" bundle tier
//! - A whole-order discount and a single-product discount

use chrono::{Duration, Utc};
use serde::Serialize;
use std::env;
use tally_core::{BundleTier, Discount, DiscountScope, Money, Percentage, Product};
use tally_db::{Database, DbConfig};
use uuid::Uuid;

/// (name, price, cost, stock, bundle)
const PRODUCTS: &[(&str, i64, i64, i64, Option<(i64, i64)>)] = &[
    ("Kopi Susu", 10_000, 6_000, 200, Some((10, 90_000))),
    ("Es Teh Manis", 5_000, 1_500, 300, None),
    ("Roti Bakar", 12_000, 7_000, 80, None),
    ("Nasi Goreng", 18_000, 11_000, 60, None),
    ("Air Mineral", 4_000, 2_500, 500, Some((6, 21_000))),
];

#[derive(Debug, Serialize)]
struct SeedReport {
    organization_id: String,
    slug: String,
    token: String,
    products: Vec<String>,
    discount_codes: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./data/tally.db");
    let mut slug = String::from("warung-demo");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--slug" | "-s" => {
                if i + 1 < args.len() {
                    slug = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Tally POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>      Database file path (default: ./data/tally.db)");
                println!("  -s, --slug <SLUG>    Organization slug (default: warung-demo)");
                println!("  -h, --help           Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    if let Some(parent) = std::path::Path::new(&db_path).parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to {} (migrations applied)", db_path);

    if db.organizations().get_by_slug(&slug).await?.is_some() {
        println!("⚠ Organization '{}' already exists, nothing to do.", slug);
        println!("  Pick another --slug or delete the database file.");
        return Ok(());
    }

    let org = db.organizations().create("Warung Demo", &slug).await?;
    let session = db
        .sessions()
        .create("demo-user", Some(&org.id), Duration::days(30))
        .await?;

    let now = Utc::now();
    let mut product_ids = Vec::with_capacity(PRODUCTS.len());
    for (name, price, cost, stock, bundle) in PRODUCTS {
        let product = Product {
            id: Uuid::new_v4().to_string(),
            organization_id: org.id.clone(),
            name: name.to_string(),
            description: None,
            price: Money::from_units(*price),
            cost: Money::from_units(*cost),
            stock: *stock,
            bundle: bundle.map(|(quantity, price)| BundleTier {
                quantity,
                price: Money::from_units(price),
            }),
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        db.products().insert(&product).await?;
        product_ids.push(product.id);
    }

    let discounts = [
        ("Hemat 10%", "HEMAT10", DiscountScope::WholeOrder, 1000, None),
        (
            "Kopi Pagi",
            "KOPIPAGI",
            DiscountScope::SingleProduct,
            2000,
            product_ids.first().cloned(),
        ),
    ];
    let mut codes = Vec::new();
    for (name, code, scope, bps, product_id) in discounts {
        let discount = Discount {
            id: Uuid::new_v4().to_string(),
            organization_id: org.id.clone(),
            name: name.to_string(),
            code: code.to_string(),
            scope,
            percentage: Percentage::from_bps(bps),
            product_id,
            created_at: now,
            updated_at: now,
        };
        db.discounts().insert(&discount).await?;
        codes.push(discount.code);
    }

    let report = SeedReport {
        organization_id: org.id,
        slug: org.slug,
        token: session.token,
        products: product_ids,
        discount_codes: codes,
    };

    println!("✓ Seed complete");
    println!("{}", serde_json::to_string_pretty(&report)?);
    println!();
    println!("Try: curl -H 'Authorization: Bearer {}' localhost:8080/products", report.token);

    db.close().await;
    Ok(())
}
