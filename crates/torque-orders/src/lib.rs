//! # torque-orders: Order Flows for Torque
//!
//! The operator-facing side of the shop: resolve who the order is for, build
//! it step by step, confirm it, and take payment.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Order Lifecycle                                  │
//! │                                                                         │
//! │  OrderWizard                                                            │
//! │    choose_mode ─► client ─► vehicle ─► services ─► employee ─► cart    │
//! │        │                                                        │       │
//! │        └── ProductsOnly ──────────────────────────────────────► │       │
//! │                                                                 ▼       │
//! │                                                    review ─► confirm    │
//! │                                                                 │       │
//! │                                                                 ▼       │
//! │  Checkout::pay(order_id, adjustment) ──────────► PaymentRecord          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All operations return [`CoreResult`](torque_core::CoreResult); a failed
//! operation leaves the wizard where it was.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use torque_orders::{ClientMode, OrderWizard, OrdersConfig};
//! use torque_db::{Database, DbConfig};
//!
//! let config = OrdersConfig::load_or_default(None);
//! let db = Database::new(DbConfig::new("torque.db")).await?;
//!
//! let mut wizard = OrderWizard::new(db, &config);
//! wizard.choose_mode(ClientMode::ProductsOnly)?;
//! wizard.pick_client(&client_id).await?;
//! wizard.add_product("carnauba-wax-500ml", 2).await?;
//! wizard.review()?;
//! let order = wizard.confirm().await?;
//! ```

pub mod checkout;
pub mod config;
pub mod error;
pub mod resolver;
pub mod wizard;

pub use checkout::Checkout;
pub use config::OrdersConfig;
pub use error::{ConfigError, ConfigResult};
pub use resolver::{DuplicatePolicy, PartyResolver};
pub use wizard::{ClientMode, OrderWizard, WizardStep};

use tracing_subscriber::EnvFilter;

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=torque_orders=trace` - Trace wizard internals
/// - Default: `info,torque=debug,sqlx=warn`
///
/// Safe to call more than once; later calls are ignored.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,torque=debug,sqlx=warn"));

    // Err only means a global subscriber is already installed
    if tracing_subscriber::fmt().with_env_filter(filter).try_init().is_err() {
        tracing::debug!("Tracing already initialized");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_tracing_twice() {
        init_tracing();
        init_tracing();
        tracing::info!("still logging");
    }
}
