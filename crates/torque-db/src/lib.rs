//! # torque-db: Persistence Layer for Torque
//!
//! Repository contracts for the order flow and the two stores that
//! implement them.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Torque Data Flow                                 │
//! │                                                                         │
//! │  OrderWizard::confirm() / Checkout::pay()                              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     torque-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │  Repository   │    │   Database    │    │ MemoryStore  │  │   │
//! │  │   │   traits      │◄───│   (SQLite)    │    │ (RwLock,     │  │   │
//! │  │   │ Catalog/Client│    │  pool.rs +    │    │  failure     │  │   │
//! │  │   │ Vehicle/Order │◄───│  migrations   │    │  injection)  │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  │   <platform data dir>/torque.db  (WAL, foreign keys)            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository traits and their SQLite implementations
//! - [`memory`] - In-memory store for tests and demos
//!
//! ## Usage
//!
//! ```rust,ignore
//! use torque_db::{CatalogRepository, Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("torque.db")).await?;
//! let products = db.list_products().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod memory;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use memory::MemoryStore;
pub use pool::{Database, DbConfig};
pub use repository::{CatalogRepository, ClientRepository, OrderRepository, VehicleRepository};
