//! # Seed Data Generator
//!
//! Stocks a development database with a demo shop catalog.
//!
//! ## Usage
//! ```bash
//! cargo run -p torque-db --bin seed
//!
//! # Specify database path
//! cargo run -p torque-db --bin seed -- --db ./data/torque.db
//! ```
//!
//! ## Generated Catalog
//! - Car-care products across four categories, each in two sizes or packs
//! - Two promotions: a per-product discount and a bundle kit
//! - Service types from a basic wash to full detailing
//! - A small crew of employees

use std::env;

use torque_core::{Employee, Product, Promotion, ServiceTypeTemplate};
use torque_db::{Database, DbConfig};
use tracing_subscriber::EnvFilter;

/// (category, [(name, base price cents)])
const PRODUCTS: &[(&str, &[(&str, i64)])] = &[
    (
        "Wax & Polish",
        &[
            ("Carnauba Wax", 2000),
            ("Ceramic Spray", 3500),
            ("Polishing Compound", 1800),
        ],
    ),
    (
        "Cleaning",
        &[
            ("Car Shampoo", 900),
            ("Wheel Cleaner", 1200),
            ("Glass Cleaner", 700),
        ],
    ),
    (
        "Interior",
        &[
            ("Leather Conditioner", 1500),
            ("Upholstery Foam", 1100),
            ("Air Freshener", 400),
        ],
    ),
    (
        "Accessories",
        &[
            ("Microfiber Cloth", 500),
            ("Applicator Pad", 300),
            ("Detailing Brush", 800),
        ],
    ),
];

/// (suffix, price multiplier in percent)
const LIQUID_SIZES: &[(&str, i64)] = &[("500ml", 100), ("1L", 180)];
const PACK_SIZES: &[(&str, i64)] = &[("Single", 100), ("3-Pack", 250)];

const SERVICES: &[(&str, &str, i64)] = &[
    ("svc-wash", "Basic Wash", 1500),
    ("svc-wash-wax", "Wash & Wax", 3000),
    ("svc-interior", "Interior Cleaning", 2500),
    ("svc-upholstery", "Upholstery Shampoo", 4000),
    ("svc-detail", "Full Detailing", 9000),
];

const EMPLOYEES: &[(&str, &str, &str)] = &[
    ("emp-luis", "Luis Mora", "Detailer"),
    ("emp-carla", "Carla Diaz", "Detailer"),
    ("emp-jose", "Jose Rivas", "Washer"),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let args: Vec<String> = env::args().collect();
    let mut db_path = String::from("./torque_dev.db");

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
                println!("Torque Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./torque_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Torque Seed Data Generator");
    println!("=============================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.count_products().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let products = generate_products();
    for product in &products {
        db.insert_product(product).await?;
    }
    println!("✓ {} products", products.len());

    for promotion in generate_promotions() {
        db.insert_promotion(&promotion).await?;
        println!("✓ Promotion '{}' ({} products)", promotion.name, promotion.product_ids.len());
    }

    for (id, name, price) in SERVICES {
        db.insert_service_type(&ServiceTypeTemplate {
            id: id.to_string(),
            name: name.to_string(),
            base_price_cents: *price,
            description: None,
            is_active: true,
        })
        .await?;
    }
    println!("✓ {} service types", SERVICES.len());

    for (id, name, role) in EMPLOYEES {
        db.insert_employee(&Employee {
            id: id.to_string(),
            name: name.to_string(),
            role: role.to_string(),
            is_active: true,
        })
        .await?;
    }
    println!("✓ {} employees", EMPLOYEES.len());

    println!();
    println!("✓ Seed complete!");
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,torque=debug,sqlx=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Stable slug ids (`carnauba-wax-500ml`) so promotions can reference them.
fn product_id(name: &str, size: &str) -> String {
    format!("{}-{}", name, size).to_lowercase().replace(' ', "-")
}

fn generate_products() -> Vec<Product> {
    let mut products = Vec::new();
    let mut seed = 0i64;

    for (category, items) in PRODUCTS {
        for (name, base_price) in items.iter() {
            let sizes = if *category == "Accessories" {
                PACK_SIZES
            } else {
                LIQUID_SIZES
            };
            for (size, pct) in sizes {
                let price_cents = base_price * pct / 100;
                products.push(Product {
                    id: product_id(name, size),
                    name: format!("{} {}", name, size),
                    category: category.to_string(),
                    price_cents,
                    // Cost between 55% and 70% of price
                    cost_cents: price_cents * (55 + seed % 16) / 100,
                    available_quantity: 3 + (seed * 7) % 40,
                    min_stock: 5,
                });
                seed += 1;
            }
        }
    }

    products
}

fn generate_promotions() -> Vec<Promotion> {
    vec![
        Promotion {
            id: "promo-summer-wax".to_string(),
            name: "Summer Wax".to_string(),
            discount_bps: 2000,
            product_ids: vec![
                product_id("Carnauba Wax", "500ml"),
                product_id("Carnauba Wax", "1L"),
            ],
            is_active: true,
            starts_at: None,
            ends_at: None,
        },
        Promotion {
            id: "promo-detail-kit".to_string(),
            name: "Detail Kit".to_string(),
            discount_bps: 1000,
            product_ids: vec![
                product_id("Carnauba Wax", "500ml"),
                product_id("Microfiber Cloth", "Single"),
                product_id("Applicator Pad", "Single"),
            ],
            is_active: true,
            starts_at: None,
            ends_at: None,
        },
    ]
}
