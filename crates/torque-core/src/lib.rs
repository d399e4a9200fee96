//! # torque-core: Pure Order Logic for Torque
//!
//! Pricing, cart and checkout rules for a vehicle-service shop, as pure
//! functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Torque Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 torque-orders (Order Wizard)                    │   │
//! │  │   client ──► vehicle ──► services ──► employee ──► cart ──► ✓   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ torque-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │  catalog  │  │  pricing  │  │   cart    │  │ checkout  │  │   │
//! │  │   │  Index    │  │ promos &  │  │  merge &  │  │ discount, │  │   │
//! │  │   │ snapshot  │  │  bundles  │  │  totals   │  │ surcharge │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO CLOCK READS • PURE FUNCTIONS        │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  torque-db (Persistence Layer)                  │   │
//! │  │          SQLite repositories, in-memory store, migrations       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Promotion, Client, Order, etc.)
//! - [`money`] - Money type with integer arithmetic
//! - [`catalog`] - Lookup snapshot over one catalog read
//! - [`pricing`] - Promotion selection, line and bundle pricing, totals
//! - [`cart`] - Line merging and stock checks
//! - [`checkout`] - Final-total math and payment recording
//! - [`validation`] - Form field rules
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use torque_core::money::Money;
//!
//! let wax = Money::from_cents(2000); // $20.00
//! // 20% off, rounded half up
//! assert_eq!(wax.apply_percentage_discount(2000).cents(), 1600);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod error;
pub mod money;
pub mod pricing;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::Cart;
pub use catalog::CatalogIndex;
pub use error::{CoreError, CoreResult, Requirement, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum lines allowed in a single cart.
pub const MAX_CART_LINES: usize = 100;

/// Maximum quantity on a single line
///
/// Guards against typing 1000 instead of 10.
pub const MAX_ITEM_QUANTITY: i64 = 999;

// =============================================================================
// Test Fixtures
// =============================================================================
