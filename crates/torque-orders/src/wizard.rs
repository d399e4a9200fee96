//! # Order Wizard
//!
//! Step-by-step construction of one order by one operator.
//!
//! ## Steps
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Wizard Steps                                     │
//! │                                                                         │
//! │  ChooseClientMode ──► ResolveClient ──┬──► ResolveVehicle               │
//! │   Existing | New |                    │        │                        │
//! │   ProductsOnly                        │        ▼                        │
//! │                                       │   SelectServiceTypes (≥1)       │
//! │                                       │        │                        │
//! │                                       │        ▼                        │
//! │                                       │   AssignEmployee                │
//! │                                       │        │                        │
//! │                     ProductsOnly ─────┘        ▼                        │
//! │                                   ───────► BuildCart ──► Review         │
//! │                                                             │           │
//! │                                                 confirm()   ▼           │
//! │                                                         Confirmed       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every operation either succeeds and moves on, or fails and leaves the
//! wizard exactly where it was. Catalog-dependent operations read a fresh
//! snapshot each time and price every cart line again from it, so a promotion
//! that started, changed or lapsed since a line was added is reflected on the
//! next addition and always at confirm.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use torque_core::pricing::{price_bundle_promotion, price_product_line};
use torque_core::{
    Cart, CartLine, CatalogIndex, Client, CoreError, CoreResult, Employee, Money, NewClient,
    NewOrder, NewVehicle, Order, OrderKind, Requirement, ServiceSelection, ServiceTypeTemplate,
    Totals, Vehicle,
};
use torque_db::{CatalogRepository, ClientRepository, OrderRepository, VehicleRepository};

use crate::config::OrdersConfig;
use crate::resolver::{DuplicatePolicy, PartyResolver};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    ChooseClientMode,
    ResolveClient,
    ResolveVehicle,
    SelectServiceTypes,
    AssignEmployee,
    BuildCart,
    Review,
    Confirmed,
}

/// How the client is resolved, and which steps follow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientMode {
    /// Search and pick a client on file.
    Existing,
    /// Register a new client.
    New,
    /// Counter sale: any client, straight to the cart.
    ProductsOnly,
}

impl ClientMode {
    fn can_pick(self) -> bool {
        matches!(self, ClientMode::Existing | ClientMode::ProductsOnly)
    }

    fn can_create(self) -> bool {
        matches!(self, ClientMode::New | ClientMode::ProductsOnly)
    }

    fn duplicate_policy(self) -> DuplicatePolicy {
        match self {
            ClientMode::ProductsOnly => DuplicatePolicy::Reject,
            ClientMode::Existing | ClientMode::New => DuplicatePolicy::Allow,
        }
    }
}

/// One order under construction.
///
/// The store handle is cloned into the party resolver, so `S` is usually a
/// cheap shared handle such as [`torque_db::MemoryStore`] or
/// [`torque_db::Database`].
pub struct OrderWizard<S> {
    store: S,
    resolver: PartyResolver<S>,
    step: WizardStep,
    mode: Option<ClientMode>,
    client: Option<Client>,
    vehicle: Option<Vehicle>,
    services: Vec<ServiceSelection>,
    employee: Option<Employee>,
    cart: Cart,
    notes: Option<String>,
    order: Option<Order>,
}

impl<S> OrderWizard<S>
where
    S: CatalogRepository + ClientRepository + VehicleRepository + OrderRepository + Clone,
{
    pub fn new(store: S, config: &OrdersConfig) -> Self {
        OrderWizard {
            resolver: PartyResolver::new(store.clone(), config),
            store,
            step: WizardStep::ChooseClientMode,
            mode: None,
            client: None,
            vehicle: None,
            services: Vec::new(),
            employee: None,
            cart: Cart::new(),
            notes: None,
            order: None,
        }
    }

    // =========================================================================
    // State
    // =========================================================================

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn mode(&self) -> Option<ClientMode> {
        self.mode
    }

    pub fn client(&self) -> Option<&Client> {
        self.client.as_ref()
    }

    pub fn vehicle(&self) -> Option<&Vehicle> {
        self.vehicle.as_ref()
    }

    pub fn selected_services(&self) -> &[ServiceSelection] {
        &self.services
    }

    pub fn employee(&self) -> Option<&Employee> {
        self.employee.as_ref()
    }

    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    /// The persisted order, once confirmed.
    pub fn order(&self) -> Option<&Order> {
        self.order.as_ref()
    }

    /// Running totals for the cart and the services selected so far.
    pub fn totals(&self) -> Totals {
        self.cart.total(&self.service_prices())
    }

    fn is_products_only(&self) -> bool {
        self.mode == Some(ClientMode::ProductsOnly)
    }

    fn service_prices(&self) -> Vec<Money> {
        if self.is_products_only() {
            return Vec::new();
        }
        self.services
            .iter()
            .map(|s| Money::from_cents(s.base_price_cents))
            .collect()
    }

    fn expect_step(&self, expected: WizardStep, action: &str) -> CoreResult<()> {
        if self.step != expected {
            return Err(CoreError::invalid_step(self.step, action));
        }
        Ok(())
    }

    fn go_to(&mut self, next: WizardStep) {
        debug!(from = ?self.step, to = ?next, "Wizard transition");
        self.step = next;
    }

    async fn snapshot(&self) -> CoreResult<CatalogIndex> {
        Ok(CatalogIndex::new(
            self.store.list_products().await?,
            self.store.list_promotions().await?,
            self.store.list_service_types().await?,
            self.store.list_employees().await?,
        ))
    }

    // =========================================================================
    // Client
    // =========================================================================

    pub fn choose_mode(&mut self, mode: ClientMode) -> CoreResult<()> {
        self.expect_step(WizardStep::ChooseClientMode, "choose a client mode")?;
        self.mode = Some(mode);
        info!(?mode, "Client mode chosen");
        self.go_to(WizardStep::ResolveClient);
        Ok(())
    }

    pub async fn search_clients(&self, query: &str) -> CoreResult<Vec<Client>> {
        self.expect_step(WizardStep::ResolveClient, "search clients")?;
        self.resolver.find_client(query).await
    }

    /// Picks a client on file and moves past client resolution.
    pub async fn pick_client(&mut self, client_id: &str) -> CoreResult<()> {
        self.expect_step(WizardStep::ResolveClient, "pick a client")?;
        if !self.mode.is_some_and(ClientMode::can_pick) {
            return Err(CoreError::invalid_step(self.step, "pick a client in New mode"));
        }

        let client = self.resolver.get_client(client_id).await?;
        self.set_client(client);
        Ok(())
    }

    /// Registers a new client and moves past client resolution.
    ///
    /// Counter sales refuse a client whose name or phone is already on file;
    /// the full service flow accepts it.
    pub async fn create_client(&mut self, fields: NewClient) -> CoreResult<&Client> {
        self.expect_step(WizardStep::ResolveClient, "create a client")?;
        let mode = match self.mode {
            Some(mode) if mode.can_create() => mode,
            _ => {
                return Err(CoreError::invalid_step(
                    self.step,
                    "create a client in Existing mode",
                ))
            }
        };

        let client = self
            .resolver
            .create_client(fields, mode.duplicate_policy())
            .await?;
        Ok(self.set_client(client))
    }

    fn set_client(&mut self, client: Client) -> &Client {
        if self.client.as_ref().is_some_and(|c| c.id != client.id) {
            self.vehicle = None;
        }
        info!(client_id = %client.id, "Client resolved");

        if self.is_products_only() {
            self.go_to(WizardStep::BuildCart);
        } else {
            self.go_to(WizardStep::ResolveVehicle);
        }
        self.client.insert(client)
    }

    // =========================================================================
    // Vehicle
    // =========================================================================

    pub async fn client_vehicles(&self) -> CoreResult<Vec<Vehicle>> {
        self.expect_step(WizardStep::ResolveVehicle, "list vehicles")?;
        let client = self.require_client()?;
        self.resolver.client_vehicles(&client.id).await
    }

    /// Picks one of the client's vehicles.
    pub async fn pick_vehicle(&mut self, vehicle_id: &str) -> CoreResult<()> {
        self.expect_step(WizardStep::ResolveVehicle, "pick a vehicle")?;
        let client_id = self.require_client()?.id.clone();

        let vehicle = self.resolver.get_vehicle(vehicle_id).await?;
        if vehicle.client_id != client_id {
            return Err(CoreError::NotFound {
                entity: "Vehicle".to_string(),
                id: vehicle_id.to_string(),
            });
        }

        self.set_vehicle(vehicle);
        Ok(())
    }

    /// Registers a vehicle for the resolved client.
    pub async fn create_vehicle(&mut self, fields: NewVehicle) -> CoreResult<&Vehicle> {
        self.expect_step(WizardStep::ResolveVehicle, "create a vehicle")?;
        let client_id = self.require_client()?.id.clone();

        let vehicle = self.resolver.create_vehicle(fields, &client_id).await?;
        Ok(self.set_vehicle(vehicle))
    }

    fn set_vehicle(&mut self, vehicle: Vehicle) -> &Vehicle {
        info!(vehicle_id = %vehicle.id, plate = %vehicle.plate, "Vehicle resolved");
        self.go_to(WizardStep::SelectServiceTypes);
        self.vehicle.insert(vehicle)
    }

    fn require_client(&self) -> CoreResult<&Client> {
        self.client.as_ref().ok_or(CoreError::IncompleteOrder {
            missing: Requirement::Client,
        })
    }

    // =========================================================================
    // Services & Staff
    // =========================================================================

    /// Active service types to choose from.
    pub async fn available_service_types(&self) -> CoreResult<Vec<ServiceTypeTemplate>> {
        let mut templates = self.store.list_service_types().await?;
        templates.retain(|t| t.is_active);
        Ok(templates)
    }

    /// Selects a service type, or deselects it if already selected.
    ///
    /// Returns whether the type is selected afterwards.
    pub async fn toggle_service_type(&mut self, service_type_id: &str) -> CoreResult<bool> {
        self.expect_step(WizardStep::SelectServiceTypes, "select service types")?;

        if let Some(pos) = self
            .services
            .iter()
            .position(|s| s.service_type_id == service_type_id)
        {
            self.services.remove(pos);
            debug!(service_type_id, "Service type deselected");
            return Ok(false);
        }

        let template = self
            .available_service_types()
            .await?
            .into_iter()
            .find(|t| t.id == service_type_id)
            .ok_or_else(|| CoreError::NotFound {
                entity: "ServiceType".to_string(),
                id: service_type_id.to_string(),
            })?;

        self.services.push(ServiceSelection::from(&template));
        debug!(service_type_id, "Service type selected");
        Ok(true)
    }

    /// Leaves service selection; at least one type must be selected.
    pub fn advance(&mut self) -> CoreResult<()> {
        self.expect_step(WizardStep::SelectServiceTypes, "advance")?;
        if self.services.is_empty() {
            return Err(CoreError::IncompleteOrder {
                missing: Requirement::ServiceType,
            });
        }
        self.go_to(WizardStep::AssignEmployee);
        Ok(())
    }

    pub async fn active_employees(&self) -> CoreResult<Vec<Employee>> {
        let mut employees = self.store.list_employees().await?;
        employees.retain(|e| e.is_active);
        Ok(employees)
    }

    pub async fn assign_employee(&mut self, employee_id: &str) -> CoreResult<()> {
        self.expect_step(WizardStep::AssignEmployee, "assign an employee")?;

        let employee = self
            .active_employees()
            .await?
            .into_iter()
            .find(|e| e.id == employee_id)
            .ok_or_else(|| CoreError::NotFound {
                entity: "Employee".to_string(),
                id: employee_id.to_string(),
            })?;

        info!(employee_id = %employee.id, "Employee assigned");
        self.employee = Some(employee);
        self.go_to(WizardStep::BuildCart);
        Ok(())
    }

    // =========================================================================
    // Cart
    // =========================================================================

    /// Adds `quantity` units of a product at its best current promotion.
    ///
    /// Lines already in the cart are priced again from the same snapshot.
    pub async fn add_product(&mut self, product_id: &str, quantity: i64) -> CoreResult<()> {
        self.expect_step(WizardStep::BuildCart, "add a product")?;

        let now = Utc::now();
        let catalog = self.snapshot().await?;
        let product = catalog
            .product(product_id)
            .ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()))?;

        let line = price_product_line(product, quantity, catalog.active_promotions(now))?;
        debug!(
            product_id,
            quantity,
            unit_price_cents = line.unit_price_cents,
            "Product priced"
        );
        self.commit_line(line, &catalog, now)
    }

    /// Adds a whole promotion as one bundle line.
    pub async fn add_bundle(
        &mut self,
        promotion_id: &str,
        quantity_per_product: i64,
    ) -> CoreResult<()> {
        self.expect_step(WizardStep::BuildCart, "add a bundle")?;

        let now = Utc::now();
        let catalog = self.snapshot().await?;
        let line = price_bundle_promotion(promotion_id, &catalog, quantity_per_product, now)?;
        debug!(promotion_id, total_cents = line.total_cents, "Bundle priced");
        self.commit_line(line, &catalog, now)
    }

    /// Adds `line` and reprices the whole cart on a copy; kept only if both
    /// succeed.
    fn commit_line(
        &mut self,
        line: CartLine,
        catalog: &CatalogIndex,
        now: DateTime<Utc>,
    ) -> CoreResult<()> {
        let mut cart = self.cart.clone();
        cart.add(line, catalog)?;
        cart.reprice(catalog, now)?;
        self.cart = cart;
        Ok(())
    }

    /// Removes a line; returns whether one was removed.
    pub fn remove_line(&mut self, line_id: &str) -> CoreResult<bool> {
        self.expect_step(WizardStep::BuildCart, "remove a line")?;
        Ok(self.cart.remove(line_id))
    }

    /// Blank notes clear them.
    pub fn set_notes(&mut self, notes: &str) -> CoreResult<()> {
        self.expect_step(WizardStep::BuildCart, "set notes")?;
        let notes = notes.trim();
        self.notes = (!notes.is_empty()).then(|| notes.to_string());
        Ok(())
    }

    pub fn review(&mut self) -> CoreResult<()> {
        self.expect_step(WizardStep::BuildCart, "review")?;
        self.go_to(WizardStep::Review);
        Ok(())
    }

    // =========================================================================
    // Confirm
    // =========================================================================

    /// Persists the order.
    ///
    /// ## Checks (in order)
    /// 1. Client (always)
    /// 2. Vehicle, service type, employee (service orders only)
    /// 3. Every line priced again from a fresh catalog read
    /// 4. Combined stock demand against that same read
    ///
    /// ## Errors
    /// - `IncompleteOrder` naming the first missing requirement
    /// - `InsufficientStock` / `ProductNotFound` if the catalog moved
    /// - `UnknownPromotion` if a bundle's promotion lapsed
    /// - `Persistence` if the store fails
    ///
    /// On error the wizard stays in `Review`.
    pub async fn confirm(&mut self) -> CoreResult<&Order> {
        self.expect_step(WizardStep::Review, "confirm")?;
        let mut new_order = self.build_order()?;

        let catalog = self.snapshot().await?;
        let mut cart = self.cart.clone();
        cart.reprice(&catalog, Utc::now())?;
        for (product_id, requested) in cart.product_demand() {
            let product = catalog
                .product(&product_id)
                .ok_or_else(|| CoreError::ProductNotFound(product_id.clone()))?;
            if !product.has_stock(requested) {
                warn!(product_id = %product.id, requested, "Stock dropped before confirm");
                return Err(CoreError::InsufficientStock {
                    product: product.name.clone(),
                    requested,
                    available: product.available_quantity,
                });
            }
        }

        if cart != self.cart {
            info!("Cart repriced at confirm");
        }
        new_order.lines = cart.lines().to_vec();
        new_order.totals = cart.total(&self.service_prices());

        let order = self.store.create_order(new_order).await.map_err(|e| {
            warn!(error = %e, "Order not persisted");
            CoreError::from(e)
        })?;

        info!(
            order_id = %order.id,
            kind = ?order.kind,
            total_cents = order.total().cents(),
            lines = order.lines.len(),
            "Order confirmed"
        );
        self.cart = cart;
        self.go_to(WizardStep::Confirmed);
        Ok(&*self.order.insert(order))
    }

    fn build_order(&self) -> CoreResult<NewOrder> {
        let client = self.require_client()?;
        let incomplete = |missing| CoreError::IncompleteOrder { missing };

        if self.is_products_only() {
            return Ok(NewOrder {
                kind: OrderKind::ProductSale,
                client_id: client.id.clone(),
                vehicle_id: None,
                services: Vec::new(),
                employee_id: None,
                lines: self.cart.lines().to_vec(),
                notes: self.notes.clone(),
                totals: self.totals(),
            });
        }

        let vehicle = self
            .vehicle
            .as_ref()
            .ok_or_else(|| incomplete(Requirement::Vehicle))?;
        if self.services.is_empty() {
            return Err(incomplete(Requirement::ServiceType));
        }
        let employee = self
            .employee
            .as_ref()
            .ok_or_else(|| incomplete(Requirement::Employee))?;

        Ok(NewOrder {
            kind: OrderKind::Service,
            client_id: client.id.clone(),
            vehicle_id: Some(vehicle.id.clone()),
            services: self.services.clone(),
            employee_id: Some(employee.id.clone()),
            lines: self.cart.lines().to_vec(),
            notes: self.notes.clone(),
            totals: self.totals(),
        })
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    /// Returns to the previous step, keeping everything chosen so far.
    pub fn back(&mut self) -> CoreResult<()> {
        let previous = match self.step {
            WizardStep::ChooseClientMode | WizardStep::Confirmed => {
                return Err(CoreError::invalid_step(self.step, "go back"))
            }
            WizardStep::ResolveClient => WizardStep::ChooseClientMode,
            WizardStep::ResolveVehicle => WizardStep::ResolveClient,
            WizardStep::SelectServiceTypes => WizardStep::ResolveVehicle,
            WizardStep::AssignEmployee => WizardStep::SelectServiceTypes,
            WizardStep::BuildCart if self.is_products_only() => WizardStep::ResolveClient,
            WizardStep::BuildCart => WizardStep::AssignEmployee,
            WizardStep::Review => WizardStep::BuildCart,
        };
        self.go_to(previous);
        Ok(())
    }

    /// Discards the order in progress and starts over.
    ///
    /// Clients and vehicles already registered stay registered; a confirmed
    /// order stays persisted.
    pub fn reset(&mut self) {
        if self.step != WizardStep::ChooseClientMode {
            info!(from = ?self.step, "Wizard reset");
        }
        self.step = WizardStep::ChooseClientMode;
        self.mode = None;
        self.client = None;
        self.vehicle = None;
        self.services.clear();
        self.employee = None;
        self.cart.clear();
        self.notes = None;
        self.order = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use torque_core::{Product, Promotion};
    use torque_db::MemoryStore;

    fn product(id: &str, name: &str, price_cents: i64, stock: i64) -> Product {
        Product {
            id: id.to_string(),
            name: name.to_string(),
            category: "Wax & Polish".to_string(),
            price_cents,
            cost_cents: price_cents / 2,
            available_quantity: stock,
            min_stock: 1,
        }
    }

    fn promotion(id: &str, discount_bps: u32, product_ids: &[&str]) -> Promotion {
        Promotion {
            id: id.to_string(),
            name: format!("Promo {}", id),
            discount_bps,
            product_ids: product_ids.iter().map(|p| p.to_string()).collect(),
            is_active: true,
            starts_at: None,
            ends_at: None,
        }
    }

    fn shop() -> MemoryStore {
        MemoryStore::with_catalog(
            vec![
                product("wax", "Wax", 2000, 5),
                product("cloth", "Cloth", 500, 10),
            ],
            vec![promotion("summer", 2000, &["wax"])],
            vec![
                ServiceTypeTemplate {
                    id: "wash".into(),
                    name: "Wash".into(),
                    base_price_cents: 2000,
                    description: None,
                    is_active: true,
                },
                ServiceTypeTemplate {
                    id: "interior".into(),
                    name: "Interior".into(),
                    base_price_cents: 3000,
                    description: None,
                    is_active: true,
                },
                ServiceTypeTemplate {
                    id: "retired".into(),
                    name: "Retired".into(),
                    base_price_cents: 100,
                    description: None,
                    is_active: false,
                },
            ],
            vec![
                Employee {
                    id: "luis".into(),
                    name: "Luis".into(),
                    role: "Detailer".into(),
                    is_active: true,
                },
                Employee {
                    id: "gone".into(),
                    name: "Gone".into(),
                    role: "Washer".into(),
                    is_active: false,
                },
            ],
        )
    }

    fn wizard(store: &MemoryStore) -> OrderWizard<MemoryStore> {
        OrderWizard::new(store.clone(), &OrdersConfig::default())
    }

    fn ana() -> NewClient {
        NewClient {
            name: "Ana Perez".into(),
            phone: "04121112233".into(),
            document_number: "V-1234567".into(),
            ..NewClient::default()
        }
    }

    fn corolla(plate: &str) -> NewVehicle {
        NewVehicle {
            make: "Toyota".into(),
            model: "Corolla".into(),
            year: 2018,
            color: "White".into(),
            plate: plate.into(),
            seat_type: "Cloth".into(),
            ..NewVehicle::default()
        }
    }

    /// New client, new vehicle, wash + interior, Luis; stops at BuildCart.
    async fn full_flow_to_cart(store: &MemoryStore) -> OrderWizard<MemoryStore> {
        let mut w = wizard(store);
        w.choose_mode(ClientMode::New).unwrap();
        w.create_client(ana()).await.unwrap();
        w.create_vehicle(corolla("ABC123")).await.unwrap();
        assert!(w.toggle_service_type("wash").await.unwrap());
        assert!(w.toggle_service_type("interior").await.unwrap());
        w.advance().unwrap();
        w.assign_employee("luis").await.unwrap();
        assert_eq!(w.step(), WizardStep::BuildCart);
        w
    }

    #[tokio::test]
    async fn test_full_flow_totals() {
        let store = shop();
        let mut w = full_flow_to_cart(&store).await;

        w.add_product("wax", 2).await.unwrap();
        w.set_notes("  Pick up at 5pm ").unwrap();
        w.review().unwrap();

        let order = w.confirm().await.unwrap().clone();
        assert_eq!(w.step(), WizardStep::Confirmed);
        assert_eq!(order.kind, OrderKind::Service);
        assert_eq!(order.totals.service_subtotal, Money::from_cents(5000));
        assert_eq!(order.totals.products_subtotal, Money::from_cents(3200));
        assert_eq!(order.totals.total_discounts, Money::from_cents(800));
        assert_eq!(order.totals.subtotal, Money::from_cents(9000));
        assert_eq!(order.total(), Money::from_cents(8200));
        assert_eq!(order.services.len(), 2);
        assert_eq!(order.employee_id.as_deref(), Some("luis"));
        assert_eq!(order.notes.as_deref(), Some("Pick up at 5pm"));
        assert!(!order.paid);
        assert_eq!(store.order_count().await, 1);
    }

    #[tokio::test]
    async fn test_products_only_flow() {
        let store = shop();
        let mut w = wizard(&store);

        w.choose_mode(ClientMode::ProductsOnly).unwrap();
        w.create_client(ana()).await.unwrap();
        assert_eq!(w.step(), WizardStep::BuildCart);

        w.add_bundle("summer", 1).await.unwrap();
        w.add_product("cloth", 3).await.unwrap();
        w.review().unwrap();
        let order = w.confirm().await.unwrap();

        assert_eq!(order.kind, OrderKind::ProductSale);
        assert!(order.vehicle_id.is_none());
        assert!(order.services.is_empty());
        assert!(order.employee_id.is_none());
        // Bundle 2000 → 1600, plus 3 × 500
        assert_eq!(order.total(), Money::from_cents(3100));
        assert_eq!(order.totals.total_discounts, Money::from_cents(400));
    }

    #[tokio::test]
    async fn test_duplicate_client_rejected_only_for_counter_sales() {
        let store = shop();

        let mut first = wizard(&store);
        first.choose_mode(ClientMode::New).unwrap();
        first.create_client(ana()).await.unwrap();

        let mut again = wizard(&store);
        again.choose_mode(ClientMode::New).unwrap();
        again.create_client(ana()).await.unwrap();
        assert_eq!(store.client_count().await, 2);

        let mut counter = wizard(&store);
        counter.choose_mode(ClientMode::ProductsOnly).unwrap();
        let err = counter.create_client(ana()).await.unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
        assert_eq!(counter.step(), WizardStep::ResolveClient);
        assert_eq!(store.client_count().await, 2);
    }

    #[tokio::test]
    async fn test_existing_client_search_and_pick() {
        let store = shop();
        let mut setup = wizard(&store);
        setup.choose_mode(ClientMode::New).unwrap();
        let ana_id = setup.create_client(ana()).await.unwrap().id.clone();

        let mut w = wizard(&store);
        w.choose_mode(ClientMode::Existing).unwrap();
        assert!(w.search_clients("an").await.unwrap().is_empty());
        let found = w.search_clients("perez").await.unwrap();
        assert_eq!(found.len(), 1);

        assert!(matches!(
            w.create_client(ana()).await,
            Err(CoreError::InvalidStep { .. })
        ));
        assert!(matches!(
            w.pick_client("nobody").await,
            Err(CoreError::NotFound { .. })
        ));
        assert_eq!(w.step(), WizardStep::ResolveClient);

        w.pick_client(&ana_id).await.unwrap();
        assert_eq!(w.step(), WizardStep::ResolveVehicle);
    }

    #[tokio::test]
    async fn test_duplicate_plate_keeps_step() {
        let store = shop();
        full_flow_to_cart(&store).await;

        let mut w = wizard(&store);
        w.choose_mode(ClientMode::New).unwrap();
        w.create_client(ana()).await.unwrap();
        let err = w.create_vehicle(corolla(" abc123 ")).await.unwrap_err();

        assert!(matches!(err, CoreError::DuplicatePlate { ref plate } if plate == "ABC123"));
        assert_eq!(w.step(), WizardStep::ResolveVehicle);
        assert!(w.vehicle().is_none());
    }

    #[tokio::test]
    async fn test_pick_vehicle_of_other_client() {
        let store = shop();
        let first = full_flow_to_cart(&store).await;
        let vehicle_id = first.vehicle().unwrap().id.clone();

        let mut w = wizard(&store);
        w.choose_mode(ClientMode::New).unwrap();
        w.create_client(NewClient {
            name: "Luis Mora".into(),
            phone: "04145556677".into(),
            document_number: "E-12345678".into(),
            ..NewClient::default()
        })
        .await
        .unwrap();

        assert!(w.client_vehicles().await.unwrap().is_empty());
        assert!(matches!(
            w.pick_vehicle(&vehicle_id).await,
            Err(CoreError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_service_toggle_and_advance() {
        let store = shop();
        let mut w = wizard(&store);
        w.choose_mode(ClientMode::New).unwrap();
        w.create_client(ana()).await.unwrap();
        w.create_vehicle(corolla("XYZ789")).await.unwrap();

        assert!(matches!(
            w.advance(),
            Err(CoreError::IncompleteOrder {
                missing: Requirement::ServiceType
            })
        ));

        assert!(w.toggle_service_type("wash").await.unwrap());
        assert!(!w.toggle_service_type("wash").await.unwrap());
        assert!(w.selected_services().is_empty());

        assert!(matches!(
            w.toggle_service_type("retired").await,
            Err(CoreError::NotFound { .. })
        ));

        w.toggle_service_type("wash").await.unwrap();
        w.advance().unwrap();

        assert!(w.assign_employee("gone").await.is_err());
        assert_eq!(w.step(), WizardStep::AssignEmployee);
    }

    #[tokio::test]
    async fn test_promotion_change_between_additions() {
        let store = shop();
        let mut w = full_flow_to_cart(&store).await;

        w.add_product("wax", 1).await.unwrap();
        assert_eq!(w.cart().lines()[0].unit_price_cents, 1600);

        store
            .upsert_promotion(promotion("summer", 5000, &["wax"]))
            .await;
        w.add_product("wax", 1).await.unwrap();

        let lines = w.cart().lines();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].quantity, 2);
        assert_eq!(lines[0].unit_price_cents, 1000);
        assert_eq!(lines[0].total_cents, 2000);
    }

    #[tokio::test]
    async fn test_lapsed_promotion_reprices_earlier_line() {
        let store = shop();
        let mut w = wizard(&store);
        w.choose_mode(ClientMode::ProductsOnly).unwrap();
        w.create_client(ana()).await.unwrap();

        w.add_product("wax", 1).await.unwrap();
        let wax_line = w.cart().lines()[0].line_id.clone();
        assert_eq!(w.cart().lines()[0].unit_price_cents, 1600);

        let mut ended = promotion("summer", 2000, &["wax"]);
        ended.is_active = false;
        store.upsert_promotion(ended).await;
        w.add_product("cloth", 1).await.unwrap();

        let wax = &w.cart().lines()[0];
        assert_eq!(wax.line_id, wax_line);
        assert_eq!(wax.unit_price_cents, 2000);
        assert_eq!(w.totals().total, Money::from_cents(2500));

        w.review().unwrap();
        let order = w.confirm().await.unwrap();
        assert_eq!(order.lines[0].unit_price_cents, 2000);
        assert_eq!(order.total(), Money::from_cents(2500));
        assert_eq!(order.totals.total_discounts, Money::zero());
    }

    #[tokio::test]
    async fn test_confirm_uses_prices_at_confirm_time() {
        let store = shop();
        let mut w = full_flow_to_cart(&store).await;
        w.add_product("wax", 2).await.unwrap();
        w.review().unwrap();
        assert_eq!(w.totals().total, Money::from_cents(8200));

        store
            .upsert_promotion(promotion("summer", 5000, &["wax"]))
            .await;
        let order = w.confirm().await.unwrap().clone();

        // 5000 services + 2 × 1000
        assert_eq!(order.total(), Money::from_cents(7000));
        assert_eq!(order.lines[0].total_cents, 2000);
        assert_eq!(w.totals(), order.totals);
    }

    #[tokio::test]
    async fn test_lapsed_bundle_blocks_until_removed() {
        let store = shop();
        let mut w = wizard(&store);
        w.choose_mode(ClientMode::ProductsOnly).unwrap();
        w.create_client(ana()).await.unwrap();

        w.add_bundle("summer", 1).await.unwrap();
        let bundle_id = w.cart().lines()[0].line_id.clone();

        let mut ended = promotion("summer", 2000, &["wax"]);
        ended.is_active = false;
        store.upsert_promotion(ended).await;

        let before = w.cart().clone();
        assert!(matches!(
            w.add_product("cloth", 1).await,
            Err(CoreError::UnknownPromotion(ref id)) if id == "summer"
        ));
        assert_eq!(w.cart(), &before);

        assert!(w.remove_line(&bundle_id).unwrap());
        w.add_product("cloth", 1).await.unwrap();
        w.review().unwrap();
        assert_eq!(w.confirm().await.unwrap().total(), Money::from_cents(500));
    }

    #[tokio::test]
    async fn test_stock_dropped_before_confirm() {
        let store = shop();
        let mut w = full_flow_to_cart(&store).await;

        w.add_product("wax", 4).await.unwrap();
        w.review().unwrap();
        store.set_available_quantity("wax", 3).await.unwrap();

        let err = w.confirm().await.unwrap_err();
        assert!(matches!(
            err,
            CoreError::InsufficientStock {
                requested: 4,
                available: 3,
                ..
            }
        ));
        assert_eq!(w.step(), WizardStep::Review);
        assert_eq!(store.order_count().await, 0);
    }

    #[tokio::test]
    async fn test_bundle_and_plain_line_share_stock() {
        let store = shop();
        let mut w = full_flow_to_cart(&store).await;

        w.add_product("wax", 4).await.unwrap();
        w.add_bundle("summer", 2).await.unwrap();
        w.review().unwrap();

        assert!(matches!(
            w.confirm().await,
            Err(CoreError::InsufficientStock { requested: 6, .. })
        ));
    }

    #[tokio::test]
    async fn test_incomplete_order_names_first_missing() {
        let store = shop();
        let mut w = full_flow_to_cart(&store).await;
        w.review().unwrap();

        w.employee = None;
        assert!(matches!(
            w.confirm().await,
            Err(CoreError::IncompleteOrder {
                missing: Requirement::Employee
            })
        ));

        w.services.clear();
        assert!(matches!(
            w.confirm().await,
            Err(CoreError::IncompleteOrder {
                missing: Requirement::ServiceType
            })
        ));

        w.vehicle = None;
        assert!(matches!(
            w.confirm().await,
            Err(CoreError::IncompleteOrder {
                missing: Requirement::Vehicle
            })
        ));

        w.client = None;
        assert!(matches!(
            w.confirm().await,
            Err(CoreError::IncompleteOrder {
                missing: Requirement::Client
            })
        ));
        assert_eq!(w.step(), WizardStep::Review);
    }

    #[tokio::test]
    async fn test_persistence_failure_stays_in_review() {
        let store = shop();
        let mut w = full_flow_to_cart(&store).await;
        w.add_product("cloth", 1).await.unwrap();
        w.review().unwrap();

        store.fail_writes(true);
        let err = w.confirm().await.unwrap_err();
        assert!(matches!(err, CoreError::Persistence(_)));
        assert_eq!(w.step(), WizardStep::Review);
        assert!(w.order().is_none());
        assert_eq!(w.cart().line_count(), 1);

        // Operator retries once the store is back
        store.fail_writes(false);
        w.confirm().await.unwrap();
        assert_eq!(w.step(), WizardStep::Confirmed);
    }

    #[tokio::test]
    async fn test_wrong_step_is_rejected() {
        let store = shop();
        let mut w = wizard(&store);

        assert!(matches!(
            w.add_product("wax", 1).await,
            Err(CoreError::InvalidStep { .. })
        ));
        assert!(matches!(w.back(), Err(CoreError::InvalidStep { .. })));
        assert!(matches!(w.confirm().await, Err(CoreError::InvalidStep { .. })));
        assert_eq!(w.step(), WizardStep::ChooseClientMode);
    }

    #[tokio::test]
    async fn test_back_keeps_selections() {
        let store = shop();
        let mut w = full_flow_to_cart(&store).await;

        w.back().unwrap();
        assert_eq!(w.step(), WizardStep::AssignEmployee);
        w.back().unwrap();
        assert_eq!(w.step(), WizardStep::SelectServiceTypes);
        assert_eq!(w.selected_services().len(), 2);
        assert!(w.employee().is_some());

        let mut counter = wizard(&store);
        counter.choose_mode(ClientMode::ProductsOnly).unwrap();
        counter
            .create_client(NewClient {
                name: "Walk In".into(),
                phone: "04160000000".into(),
                document_number: "V-7654321".into(),
                ..NewClient::default()
            })
            .await
            .unwrap();
        counter.back().unwrap();
        assert_eq!(counter.step(), WizardStep::ResolveClient);
    }

    #[tokio::test]
    async fn test_reset_is_idempotent_and_keeps_records() {
        let store = shop();
        let mut w = full_flow_to_cart(&store).await;
        w.add_product("wax", 1).await.unwrap();

        w.reset();
        w.reset();

        assert_eq!(w.step(), WizardStep::ChooseClientMode);
        assert!(w.client().is_none());
        assert!(w.cart().is_empty());
        assert!(w.selected_services().is_empty());
        assert_eq!(store.client_count().await, 1);
        assert_eq!(store.vehicle_count().await, 1);
    }
}
