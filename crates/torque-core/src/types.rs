//! # Domain Types
//!
//! Core domain types used throughout Torque.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  Catalog (read-only)        Parties                 Orders              │
//! │  ─────────────────          ───────                 ──────              │
//! │  Product                    Client ◄──┐             Order               │
//! │  Promotion                  Vehicle ──┘             ├── CartLine        │
//! │  ServiceTypeTemplate                                │   └── LineKind    │
//! │  Employee                                           ├── Totals          │
//! │                                                     └── PaymentRecord   │
//! │                                                                         │
//! │  Checkout input: PaymentAdjustment { CheckoutDiscount, surcharge }     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Monetary fields stored on records are integer cents (`*_cents`); computed
//! summaries carry [`Money`] directly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Product
// =============================================================================

/// A sellable catalog item (wax, oil, air freshener, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Product {
    pub id: String,

    /// Display name shown to the operator and on the order.
    pub name: String,

    pub category: String,

    /// Unit sale price in cents.
    pub price_cents: i64,

    /// Unit cost in cents (margin reporting downstream).
    pub cost_cents: i64,

    /// Units currently on hand.
    pub available_quantity: i64,

    /// Reorder threshold; at or below it the product is low on stock.
    pub min_stock: i64,
}

impl Product {
    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Checks whether `quantity` units can be taken from stock.
    #[inline]
    pub fn has_stock(&self, quantity: i64) -> bool {
        quantity <= self.available_quantity
    }

    pub fn is_low_stock(&self) -> bool {
        self.available_quantity <= self.min_stock
    }
}

// =============================================================================
// Promotion
// =============================================================================

/// A named percentage discount over a fixed set of products.
///
/// A promotion is used two ways:
/// - per product: the best eligible promotion lowers a product line's price
/// - as a bundle: every eligible product is sold together at the discount
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Promotion {
    pub id: String,
    pub name: String,

    /// Discount in basis points (2000 = 20%), 0..=10000.
    pub discount_bps: u32,

    /// Products the discount applies to.
    pub product_ids: Vec<String>,

    pub is_active: bool,

    /// Inclusive start of the validity window; open if `None`.
    #[ts(as = "Option<String>")]
    pub starts_at: Option<DateTime<Utc>>,

    /// Inclusive end of the validity window; open if `None`.
    #[ts(as = "Option<String>")]
    pub ends_at: Option<DateTime<Utc>>,
}

impl Promotion {
    /// Checks if the promotion covers a product.
    pub fn includes(&self, product_id: &str) -> bool {
        self.product_ids.iter().any(|id| id == product_id)
    }

    /// Active flag set and `now` inside the validity window.
    pub fn is_available_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active
            && self.starts_at.map_or(true, |start| start <= now)
            && self.ends_at.map_or(true, |end| now <= end)
    }
}

// =============================================================================
// Service Types & Staff
// =============================================================================

/// A service the shop performs (wash, polish, upholstery cleaning, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ServiceTypeTemplate {
    pub id: String,
    pub name: String,
    pub base_price_cents: i64,
    pub description: Option<String>,
    pub is_active: bool,
}

impl ServiceTypeTemplate {
    #[inline]
    pub fn base_price(&self) -> Money {
        Money::from_cents(self.base_price_cents)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Employee {
    pub id: String,
    pub name: String,
    pub role: String,
    pub is_active: bool,
}

// =============================================================================
// Client & Vehicle
// =============================================================================

/// A shop customer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Client {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub address: Option<String>,

    /// National id, `V-` (citizen) or `E-` (foreigner) plus 7-8 digits.
    pub document_number: String,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Client {
    /// Case-insensitive substring on name, substring on phone.
    ///
    /// An exact phone number is a substring of itself, so exact lookups match.
    pub fn matches_query(&self, query: &str) -> bool {
        let query = query.trim();
        if query.is_empty() {
            return false;
        }
        self.name.to_lowercase().contains(&query.to_lowercase()) || self.phone.contains(query)
    }
}

/// Client fields as typed in the creation form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewClient {
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub address: Option<String>,
    pub document_number: String,
}

/// A vehicle owned by a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Vehicle {
    pub id: String,
    pub client_id: String,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub color: String,

    /// Normalized plate (trimmed, uppercase); unique across all vehicles.
    pub plate: String,

    /// Seat / upholstery material, drives interior service choices.
    pub seat_type: String,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Vehicle fields as typed in the creation form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewVehicle {
    pub client_id: String,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub color: String,
    pub plate: String,
    pub seat_type: String,
}

// =============================================================================
// Cart Line
// =============================================================================

/// One priced entry in a cart or order.
///
/// ## Invariant
/// `total_cents == quantity * unit_price_cents`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartLine {
    /// Stable key for removal; unique per line.
    pub line_id: String,

    pub name: String,
    pub quantity: i64,

    /// Charged unit price after any promotion.
    pub unit_price_cents: i64,

    pub total_cents: i64,

    pub kind: LineKind,
}

/// What a line sells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LineKind {
    /// A single catalog product, possibly discounted by its best promotion.
    Product {
        product_id: String,
        /// Catalog price before the promotion.
        regular_unit_price_cents: i64,
        promotion_id: Option<String>,
    },
    /// A whole promotion sold as one bundle.
    Bundle {
        promotion_id: String,
        /// Constituent products at full price, for sales attribution.
        included_products: Vec<IncludedProduct>,
    },
}

/// A constituent of a bundle line, priced at full catalog price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct IncludedProduct {
    pub product_id: String,
    pub name: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub total_cents: i64,
}

impl CartLine {
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    /// True for bundle lines.
    pub fn is_promotion(&self) -> bool {
        matches!(self.kind, LineKind::Bundle { .. })
    }

    /// The product sold by a plain line; `None` for bundles.
    pub fn product_id(&self) -> Option<&str> {
        match &self.kind {
            LineKind::Product { product_id, .. } => Some(product_id),
            LineKind::Bundle { .. } => None,
        }
    }

    /// What the line would cost with no promotion applied.
    pub fn full_price_total(&self) -> Money {
        match &self.kind {
            LineKind::Product {
                regular_unit_price_cents,
                ..
            } => Money::from_cents(*regular_unit_price_cents).multiply_quantity(self.quantity),
            LineKind::Bundle {
                included_products, ..
            } => included_products
                .iter()
                .map(|p| Money::from_cents(p.total_cents))
                .sum(),
        }
    }

    /// Full-price equivalent minus charged total.
    pub fn discount(&self) -> Money {
        self.full_price_total() - self.total()
    }

    /// Sets quantity and recomputes the total.
    pub(crate) fn set_quantity(&mut self, quantity: i64) {
        self.quantity = quantity;
        self.total_cents = self.unit_price_cents * quantity;
    }
}

// =============================================================================
// Totals
// =============================================================================

/// Aggregated amounts for a set of lines plus selected services.
///
/// `subtotal` is the pre-discount figure shown to the client;
/// `total` is what is owed before checkout adjustments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Totals {
    pub service_subtotal: Money,
    pub products_subtotal: Money,
    pub total_discounts: Money,
    pub subtotal: Money,
    pub total: Money,
}

// =============================================================================
// Order
// =============================================================================

/// Whether an order carries a vehicle service or is a counter sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum OrderKind {
    /// Vehicle, service types and employee present.
    Service,
    /// Products only; no vehicle, services or employee.
    ProductSale,
}

/// Snapshot of a service type chosen for an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ServiceSelection {
    pub service_type_id: String,
    pub name: String,
    pub base_price_cents: i64,
}

impl From<&ServiceTypeTemplate> for ServiceSelection {
    fn from(template: &ServiceTypeTemplate) -> Self {
        ServiceSelection {
            service_type_id: template.id.clone(),
            name: template.name.clone(),
            base_price_cents: template.base_price_cents,
        }
    }
}

/// A confirmed order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Order {
    pub id: String,
    pub kind: OrderKind,
    pub client_id: String,
    pub vehicle_id: Option<String>,
    pub services: Vec<ServiceSelection>,
    pub employee_id: Option<String>,
    pub lines: Vec<CartLine>,
    pub notes: Option<String>,
    pub totals: Totals,

    /// Only [`crate::checkout::apply_payment`] sets this.
    pub paid: bool,

    pub payment: Option<PaymentRecord>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Amount owed before checkout adjustments.
    #[inline]
    pub fn total(&self) -> Money {
        self.totals.total
    }
}

/// An order as handed to the store; the store assigns id and timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewOrder {
    pub kind: OrderKind,
    pub client_id: String,
    pub vehicle_id: Option<String>,
    pub services: Vec<ServiceSelection>,
    pub employee_id: Option<String>,
    pub lines: Vec<CartLine>,
    pub notes: Option<String>,
    pub totals: Totals,
}

impl NewOrder {
    /// Materializes the persisted record.
    pub fn into_order(self, id: String, created_at: DateTime<Utc>) -> Order {
        Order {
            id,
            kind: self.kind,
            client_id: self.client_id,
            vehicle_id: self.vehicle_id,
            services: self.services,
            employee_id: self.employee_id,
            lines: self.lines,
            notes: self.notes,
            totals: self.totals,
            paid: false,
            payment: None,
            created_at,
        }
    }
}

/// Partial update for a stored order.
///
/// There is no way to clear a payment or set `paid` directly: the flag
/// follows `payment`, and stores refuse a payment for an order that already
/// has one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderPatch {
    pub payment: Option<PaymentRecord>,
    pub notes: Option<String>,
}

impl OrderPatch {
    /// Patch recording a completed payment.
    pub fn payment(record: PaymentRecord) -> Self {
        OrderPatch {
            payment: Some(record),
            notes: None,
        }
    }

    pub fn records_payment(&self) -> bool {
        self.payment.is_some()
    }

    /// Callers check [`records_payment`](Self::records_payment) against
    /// `order.paid` first.
    pub fn apply_to(self, order: &mut Order) {
        if let Some(payment) = self.payment {
            order.paid = true;
            order.payment = Some(payment);
        }
        if let Some(notes) = self.notes {
            order.notes = Some(notes);
        }
    }
}

// =============================================================================
// Checkout
// =============================================================================

#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    BankTransfer,
    MobilePayment,
}

/// One-time discount applied at checkout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CheckoutDiscount {
    #[default]
    None,
    /// Percentage of the order total, in basis points (1000 = 10%).
    Percentage { bps: u32 },
    /// Flat amount off, in cents.
    Fixed { amount_cents: i64 },
}

/// Operator input at payment time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PaymentAdjustment {
    pub discount: CheckoutDiscount,
    pub surcharge_cents: i64,
    pub surcharge_description: Option<String>,
    pub method: PaymentMethod,
}

impl PaymentAdjustment {
    /// Plain payment with no discount or surcharge.
    pub fn plain(method: PaymentMethod) -> Self {
        PaymentAdjustment {
            discount: CheckoutDiscount::None,
            surcharge_cents: 0,
            surcharge_description: None,
            method,
        }
    }
}

/// Immutable receipt of a payment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PaymentRecord {
    pub order_id: String,
    pub method: PaymentMethod,
    pub order_total: Money,
    pub discount: Money,
    pub surcharge: Money,
    pub surcharge_description: Option<String>,

    /// Never negative.
    pub final_total: Money,

    #[ts(as = "String")]
    pub paid_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================
