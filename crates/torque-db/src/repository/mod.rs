//! # Repository Module
//!
//! Store contracts the order flow depends on, plus their SQLite
//! implementations on [`Database`](crate::Database).
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Seams                                     │
//! │                                                                         │
//! │  OrderWizard / Checkout                                                │
//! │       │                                                                 │
//! │       │  generic over S: CatalogRepository + ClientRepository + ...    │
//! │       ▼                                                                 │
//! │  ┌──────────────────────┐        ┌──────────────────────┐              │
//! │  │ Database (SQLite)    │        │ MemoryStore          │              │
//! │  │ catalog.rs client.rs │        │ RwLock collections   │              │
//! │  │ vehicle.rs order.rs  │        │ failure injection    │              │
//! │  └──────────────────────┘        └──────────────────────┘              │
//! │                                                                         │
//! │  Every call is atomic-or-failed; a failure never leaves half a record. │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Method names carry the entity (`get_client`, `get_vehicle`) because a
//! single store implements every trait.

use torque_core::{
    Client, Employee, NewClient, NewOrder, NewVehicle, Order, OrderPatch, Product, Promotion,
    ServiceTypeTemplate, Vehicle,
};

use crate::error::DbResult;

pub mod catalog;
pub mod client;
pub mod order;
pub mod vehicle;

/// Read access to the shop catalog.
#[allow(async_fn_in_trait)]
pub trait CatalogRepository {
    async fn list_products(&self) -> DbResult<Vec<Product>>;
    async fn list_promotions(&self) -> DbResult<Vec<Promotion>>;
    async fn list_service_types(&self) -> DbResult<Vec<ServiceTypeTemplate>>;
    async fn list_employees(&self) -> DbResult<Vec<Employee>>;
}

#[allow(async_fn_in_trait)]
pub trait ClientRepository {
    /// All clients satisfying `predicate`, oldest first.
    async fn find_clients<P>(&self, predicate: P) -> DbResult<Vec<Client>>
    where
        P: Fn(&Client) -> bool + Send;

    async fn get_client(&self, id: &str) -> DbResult<Option<Client>>;

    /// Inserts an already-validated client; the store assigns id and timestamp.
    async fn create_client(&self, client: NewClient) -> DbResult<Client>;
}

#[allow(async_fn_in_trait)]
pub trait VehicleRepository {
    async fn find_vehicles<P>(&self, predicate: P) -> DbResult<Vec<Vehicle>>
    where
        P: Fn(&Vehicle) -> bool + Send;

    async fn get_vehicle(&self, id: &str) -> DbResult<Option<Vehicle>>;

    /// Inserts an already-validated vehicle. Fails `UniqueViolation` if the
    /// plate is taken.
    async fn create_vehicle(&self, vehicle: NewVehicle) -> DbResult<Vehicle>;
}

#[allow(async_fn_in_trait)]
pub trait OrderRepository {
    async fn create_order(&self, order: NewOrder) -> DbResult<Order>;

    async fn get_order(&self, id: &str) -> DbResult<Option<Order>>;

    /// Applies `patch` and returns the stored result. Fails `NotFound` for an
    /// unknown id.
    async fn update_order(&self, id: &str, patch: OrderPatch) -> DbResult<Order>;
}
