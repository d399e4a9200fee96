//! # Counter Sale Walkthrough
//!
//! Rings up one product-only sale against a seeded database and pays it in
//! cash. Handy for checking a fresh install end to end.
//!
//! ## Usage
//! ```bash
//! cargo run -p torque-db --bin seed -- --db ./torque_dev.db
//! cargo run -p torque-orders --bin counter_sale -- --db ./torque_dev.db
//! ```

use std::env;
use std::path::PathBuf;

use torque_core::{NewClient, PaymentAdjustment, PaymentMethod};
use torque_db::{CatalogRepository, Database, DbConfig};
use torque_orders::{init_tracing, Checkout, ClientMode, OrderWizard, OrdersConfig};
use tracing::info;

const WALK_IN_PHONE: &str = "00000000000";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let config = OrdersConfig::load_or_default(None);
    let db_path = db_path_arg()
        .or_else(|| config.database_path())
        .unwrap_or_else(|| PathBuf::from("./torque_dev.db"));

    println!("🧾 {} - counter sale", config.shop.name);
    println!("Database: {}", db_path.display());
    println!();

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let db = Database::new(DbConfig::new(db_path.clone())).await?;

    let products = db.list_products().await?;
    let Some(product) = products.iter().find(|p| p.available_quantity > 0) else {
        println!("⚠ No products in stock. Run the seed binary first.");
        return Ok(());
    };

    let mut wizard = OrderWizard::new(db.clone(), &config);
    wizard.choose_mode(ClientMode::ProductsOnly)?;

    let existing = wizard.search_clients(WALK_IN_PHONE).await?;
    match existing.first() {
        Some(client) => wizard.pick_client(&client.id).await?,
        None => {
            wizard
                .create_client(NewClient {
                    name: "Walk-in Customer".to_string(),
                    phone: WALK_IN_PHONE.to_string(),
                    document_number: "V-0000000".to_string(),
                    ..NewClient::default()
                })
                .await?;
        }
    }

    wizard.add_product(&product.id, 1).await?;
    wizard.review()?;
    let order = wizard.confirm().await?.clone();

    println!("✓ Order {}", order.id);
    for line in &order.lines {
        println!("  {} x{}  {}", line.name, line.quantity, line.total());
    }
    println!("  Discounts: {}", order.totals.total_discounts);
    println!("  Total:     {}", order.total());

    let record = Checkout::new(db.clone())
        .pay(&order.id, &PaymentAdjustment::plain(PaymentMethod::Cash))
        .await?;
    println!("✓ Paid {} ({:?})", record.final_total, record.method);

    info!(order_id = %order.id, "Counter sale complete");
    db.close().await;
    Ok(())
}

fn db_path_arg() -> Option<PathBuf> {
    let args: Vec<String> = env::args().collect();
    args.iter()
        .position(|a| a == "--db" || a == "-d")
        .and_then(|i| args.get(i + 1))
        .map(PathBuf::from)
}
