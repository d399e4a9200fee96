//! # In-Memory Store
//!
//! A [`Database`](crate::Database) stand-in backed by `tokio::sync::RwLock`
//! collections. Used by tests and demos that do not want a SQLite file.
//!
//! ## Failure Injection
//! ```text
//! store.fail_writes(true)
//!      │
//!      ▼
//! create_client / create_vehicle / create_order / update_order
//!      │
//!      └──► Err(DbError::Unavailable) and nothing is stored
//! ```
//! Reads keep working, so callers can check that a failed write left
//! everything as it was.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{debug, warn};
use uuid::Uuid;

use torque_core::validation::normalize_plate;
use torque_core::{
    Client, Employee, NewClient, NewOrder, NewVehicle, Order, OrderPatch, Product, Promotion,
    ServiceTypeTemplate, Vehicle,
};

use crate::error::{DbError, DbResult};
use crate::repository::{
    CatalogRepository, ClientRepository, OrderRepository, VehicleRepository,
};

#[derive(Debug, Default)]
struct Catalog {
    products: Vec<Product>,
    promotions: Vec<Promotion>,
    service_types: Vec<ServiceTypeTemplate>,
    employees: Vec<Employee>,
}

#[derive(Debug, Default)]
struct Inner {
    catalog: RwLock<Catalog>,
    clients: RwLock<Vec<Client>>,
    vehicles: RwLock<Vec<Vehicle>>,
    orders: RwLock<HashMap<String, Order>>,
    fail_writes: AtomicBool,
}

/// Shared in-memory store; clones see the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    /// Store pre-loaded with a catalog.
    pub fn with_catalog(
        products: Vec<Product>,
        promotions: Vec<Promotion>,
        service_types: Vec<ServiceTypeTemplate>,
        employees: Vec<Employee>,
    ) -> Self {
        let catalog = Catalog {
            products,
            promotions,
            service_types,
            employees,
        };
        MemoryStore {
            inner: Arc::new(Inner {
                catalog: RwLock::new(catalog),
                ..Inner::default()
            }),
        }
    }

    /// Makes every subsequent write fail with `Unavailable` until reset.
    pub fn fail_writes(&self, fail: bool) {
        self.inner.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self, operation: &str) -> DbResult<()> {
        if self.inner.fail_writes.load(Ordering::SeqCst) {
            warn!(operation, "Injected write failure");
            return Err(DbError::Unavailable(format!("{operation} rejected")));
        }
        Ok(())
    }

    // =========================================================================
    // Catalog Mutation
    // =========================================================================
    // Stand-ins for other operators changing the catalog mid-order.

    /// Overwrites a product's stock level.
    pub async fn set_available_quantity(&self, product_id: &str, quantity: i64) -> DbResult<()> {
        let mut catalog = self.inner.catalog.write().await;
        let product = catalog
            .products
            .iter_mut()
            .find(|p| p.id == product_id)
            .ok_or_else(|| DbError::not_found("Product", product_id))?;
        product.available_quantity = quantity;
        Ok(())
    }

    /// Adds a promotion, or replaces the one with the same id.
    pub async fn upsert_promotion(&self, promotion: Promotion) {
        let mut catalog = self.inner.catalog.write().await;
        catalog.promotions.retain(|p| p.id != promotion.id);
        catalog.promotions.push(promotion);
    }

    pub async fn client_count(&self) -> usize {
        self.inner.clients.read().await.len()
    }

    pub async fn vehicle_count(&self) -> usize {
        self.inner.vehicles.read().await.len()
    }

    pub async fn order_count(&self) -> usize {
        self.inner.orders.read().await.len()
    }
}

impl CatalogRepository for MemoryStore {
    async fn list_products(&self) -> DbResult<Vec<Product>> {
        Ok(self.inner.catalog.read().await.products.clone())
    }

    async fn list_promotions(&self) -> DbResult<Vec<Promotion>> {
        Ok(self.inner.catalog.read().await.promotions.clone())
    }

    async fn list_service_types(&self) -> DbResult<Vec<ServiceTypeTemplate>> {
        Ok(self.inner.catalog.read().await.service_types.clone())
    }

    async fn list_employees(&self) -> DbResult<Vec<Employee>> {
        Ok(self.inner.catalog.read().await.employees.clone())
    }
}

impl ClientRepository for MemoryStore {
    async fn find_clients<P>(&self, predicate: P) -> DbResult<Vec<Client>>
    where
        P: Fn(&Client) -> bool + Send,
    {
        let clients = self.inner.clients.read().await;
        Ok(clients.iter().filter(|c| predicate(c)).cloned().collect())
    }

    async fn get_client(&self, id: &str) -> DbResult<Option<Client>> {
        let clients = self.inner.clients.read().await;
        Ok(clients.iter().find(|c| c.id == id).cloned())
    }

    async fn create_client(&self, client: NewClient) -> DbResult<Client> {
        self.check_writable("create_client")?;

        let client = Client {
            id: Uuid::new_v4().to_string(),
            name: client.name.trim().to_string(),
            phone: client.phone.trim().to_string(),
            email: client.email,
            address: client.address,
            document_number: client.document_number.trim().to_string(),
            created_at: Utc::now(),
        };

        self.inner.clients.write().await.push(client.clone());
        debug!(id = %client.id, "Client stored");
        Ok(client)
    }
}

impl VehicleRepository for MemoryStore {
    async fn find_vehicles<P>(&self, predicate: P) -> DbResult<Vec<Vehicle>>
    where
        P: Fn(&Vehicle) -> bool + Send,
    {
        let vehicles = self.inner.vehicles.read().await;
        Ok(vehicles.iter().filter(|v| predicate(v)).cloned().collect())
    }

    async fn get_vehicle(&self, id: &str) -> DbResult<Option<Vehicle>> {
        let vehicles = self.inner.vehicles.read().await;
        Ok(vehicles.iter().find(|v| v.id == id).cloned())
    }

    async fn create_vehicle(&self, vehicle: NewVehicle) -> DbResult<Vehicle> {
        self.check_writable("create_vehicle")?;

        let plate = normalize_plate(&vehicle.plate);
        let mut vehicles = self.inner.vehicles.write().await;
        if vehicles.iter().any(|v| v.plate == plate) {
            return Err(DbError::duplicate("vehicles.plate", plate));
        }

        let vehicle = Vehicle {
            id: Uuid::new_v4().to_string(),
            client_id: vehicle.client_id,
            make: vehicle.make.trim().to_string(),
            model: vehicle.model.trim().to_string(),
            year: vehicle.year,
            color: vehicle.color.trim().to_string(),
            plate,
            seat_type: vehicle.seat_type.trim().to_string(),
            created_at: Utc::now(),
        };
        vehicles.push(vehicle.clone());

        debug!(id = %vehicle.id, plate = %vehicle.plate, "Vehicle stored");
        Ok(vehicle)
    }
}

impl OrderRepository for MemoryStore {
    async fn create_order(&self, order: NewOrder) -> DbResult<Order> {
        self.check_writable("create_order")?;

        let order = order.into_order(Uuid::new_v4().to_string(), Utc::now());
        self.inner
            .orders
            .write()
            .await
            .insert(order.id.clone(), order.clone());

        debug!(id = %order.id, "Order stored");
        Ok(order)
    }

    async fn get_order(&self, id: &str) -> DbResult<Option<Order>> {
        Ok(self.inner.orders.read().await.get(id).cloned())
    }

    async fn update_order(&self, id: &str, patch: OrderPatch) -> DbResult<Order> {
        self.check_writable("update_order")?;

        let mut orders = self.inner.orders.write().await;
        let order = orders
            .get_mut(id)
            .ok_or_else(|| DbError::not_found("Order", id))?;
        if order.paid && patch.records_payment() {
            return Err(DbError::AlreadyPaid {
                order_id: order.id.clone(),
            });
        }
        patch.apply_to(order);
        Ok(order.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use torque_core::{Money, OrderKind, PaymentMethod, PaymentRecord, Totals};

    fn product(id: &str, stock: i64) -> Product {
        Product {
            id: id.into(),
            name: id.into(),
            category: "Detailing".into(),
            price_cents: 1000,
            cost_cents: 500,
            available_quantity: stock,
            min_stock: 0,
        }
    }

    fn new_vehicle(plate: &str) -> NewVehicle {
        NewVehicle {
            client_id: "c1".into(),
            make: "Ford".into(),
            model: "Fiesta".into(),
            year: 2012,
            color: "Red".into(),
            plate: plate.into(),
            seat_type: "Cloth".into(),
        }
    }

    #[tokio::test]
    async fn test_with_catalog_and_stock_change() {
        let store = MemoryStore::with_catalog(vec![product("wax", 5)], vec![], vec![], vec![]);
        assert_eq!(store.list_products().await.unwrap()[0].available_quantity, 5);

        store.set_available_quantity("wax", 1).await.unwrap();
        assert_eq!(store.list_products().await.unwrap()[0].available_quantity, 1);
        assert!(store.set_available_quantity("nope", 1).await.is_err());
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let store = MemoryStore::new();
        let other = store.clone();

        other
            .create_client(NewClient {
                name: "Ana".into(),
                ..NewClient::default()
            })
            .await
            .unwrap();

        assert_eq!(store.client_count().await, 1);
    }

    #[tokio::test]
    async fn test_duplicate_plate_rejected() {
        let store = MemoryStore::new();
        store.create_vehicle(new_vehicle(" abc123 ")).await.unwrap();

        let err = store.create_vehicle(new_vehicle("ABC123")).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
        assert_eq!(store.vehicle_count().await, 1);
    }

    #[tokio::test]
    async fn test_injected_failure_stores_nothing() {
        let store = MemoryStore::new();
        store.fail_writes(true);

        let order = NewOrder {
            kind: OrderKind::ProductSale,
            client_id: "c1".into(),
            vehicle_id: None,
            services: vec![],
            employee_id: None,
            lines: vec![],
            notes: None,
            totals: Totals::default(),
        };
        assert!(matches!(
            store.create_order(order.clone()).await,
            Err(DbError::Unavailable(_))
        ));
        assert!(store.create_vehicle(new_vehicle("XYZ1")).await.is_err());
        assert_eq!(store.order_count().await, 0);
        assert_eq!(store.vehicle_count().await, 0);

        store.fail_writes(false);
        assert!(store.create_order(order).await.is_ok());
    }

    #[tokio::test]
    async fn test_payment_written_once() {
        let store = MemoryStore::new();
        let order = store
            .create_order(NewOrder {
                kind: OrderKind::ProductSale,
                client_id: "c1".into(),
                vehicle_id: None,
                services: vec![],
                employee_id: None,
                lines: vec![],
                notes: None,
                totals: Totals::default(),
            })
            .await
            .unwrap();
        let record = |final_cents| PaymentRecord {
            order_id: order.id.clone(),
            method: PaymentMethod::Cash,
            order_total: Money::from_cents(8200),
            discount: Money::zero(),
            surcharge: Money::zero(),
            surcharge_description: None,
            final_total: Money::from_cents(final_cents),
            paid_at: Utc::now(),
        };

        let paid = store
            .update_order(&order.id, OrderPatch::payment(record(8200)))
            .await
            .unwrap();
        assert!(paid.paid);

        let err = store
            .update_order(&order.id, OrderPatch::payment(record(0)))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::AlreadyPaid { .. }));

        // Notes can still change on a paid order
        let noted = store
            .update_order(
                &order.id,
                OrderPatch {
                    notes: Some("picked up".into()),
                    ..OrderPatch::default()
                },
            )
            .await
            .unwrap();
        assert!(noted.paid);
        assert_eq!(noted.payment.map(|p| p.final_total.cents()), Some(8200));
    }

    #[tokio::test]
    async fn test_update_unknown_order() {
        let store = MemoryStore::new();
        let err = store
            .update_order("missing", OrderPatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
