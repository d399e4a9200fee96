//! # Cart
//!
//! Ordered collection of priced lines for the order being built.
//!
//! ## Cart Operations
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Operations                                      │
//! │                                                                         │
//! │  add(product line) ──► same product already present?                    │
//! │                          ├── yes: merge quantities, re-check stock      │
//! │                          └── no:  append                                │
//! │                                                                         │
//! │  add(bundle line) ───► always append (bundles never merge)              │
//! │                                                                         │
//! │  remove(line_id) ────► drop the line, no-op if absent                   │
//! │                                                                         │
//! │  reprice(catalog) ───► every line priced again, all or nothing          │
//! │                                                                         │
//! │  total(services) ────► pricing::aggregate                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invariants
//! - At most one plain line per product
//! - Every line satisfies `total == quantity × unit_price`
//! - A failed `add` leaves the cart exactly as it was

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::catalog::CatalogIndex;
use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::pricing::{aggregate, reprice_line};
use crate::types::{CartLine, LineKind, Totals};
use crate::validation::validate_quantity;
use crate::MAX_CART_LINES;

/// The lines of an order under construction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// Creates a new empty cart.
    pub fn new() -> Self {
        Cart::default()
    }

    /// Adds a priced line.
    ///
    /// A plain product line merges into the existing line for that product:
    /// quantities are summed and the total recomputed at the incoming unit
    /// price, since the incoming line was priced from the newer snapshot.
    ///
    /// ## Errors
    /// - `InsufficientStock` if the merged quantity exceeds stock
    /// - `ProductNotFound` if the product vanished from the catalog
    /// - `CartTooLarge` when appending past [`MAX_CART_LINES`]
    pub fn add(&mut self, line: CartLine, catalog: &CatalogIndex) -> CoreResult<()> {
        if let Some(product_id) = line.product_id() {
            if let Some(existing) = self
                .lines
                .iter_mut()
                .find(|l| l.product_id() == Some(product_id))
            {
                let merged_qty = existing.quantity + line.quantity;
                validate_quantity(merged_qty)?;

                let product = catalog
                    .product(product_id)
                    .ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()))?;
                if !product.has_stock(merged_qty) {
                    return Err(CoreError::InsufficientStock {
                        product: product.name.clone(),
                        requested: merged_qty,
                        available: product.available_quantity,
                    });
                }

                existing.unit_price_cents = line.unit_price_cents;
                existing.kind = line.kind;
                existing.set_quantity(merged_qty);
                return Ok(());
            }
        }

        if self.lines.len() >= MAX_CART_LINES {
            return Err(CoreError::CartTooLarge {
                max: MAX_CART_LINES,
            });
        }

        self.lines.push(line);
        Ok(())
    }

    /// Prices every line again from `catalog` at `now`.
    ///
    /// Line ids, order and quantities are kept. If any line fails (product
    /// gone, promotion lapsed for a bundle, stock short) the cart is left as
    /// it was.
    pub fn reprice(&mut self, catalog: &CatalogIndex, now: DateTime<Utc>) -> CoreResult<()> {
        let repriced = self
            .lines
            .iter()
            .map(|line| reprice_line(line, catalog, now))
            .collect::<CoreResult<Vec<_>>>()?;
        self.lines = repriced;
        Ok(())
    }

    /// Removes the line with `line_id`. Returns whether anything was removed.
    pub fn remove(&mut self, line_id: &str) -> bool {
        let before = self.lines.len();
        self.lines.retain(|l| l.line_id != line_id);
        self.lines.len() != before
    }

    /// Totals for the cart plus the selected services' base prices.
    pub fn total(&self, service_base_prices: &[Money]) -> Totals {
        aggregate(&self.lines, service_base_prices)
    }

    /// Units requested per product across plain and bundle lines.
    pub fn product_demand(&self) -> BTreeMap<String, i64> {
        let mut demand = BTreeMap::new();
        for line in &self.lines {
            match &line.kind {
                LineKind::Product { product_id, .. } => {
                    *demand.entry(product_id.clone()).or_insert(0) += line.quantity;
                }
                LineKind::Bundle {
                    included_products, ..
                } => {
                    for included in included_products {
                        *demand.entry(included.product_id.clone()).or_insert(0) +=
                            included.quantity * line.quantity;
                    }
                }
            }
        }
        demand
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn into_lines(self) -> Vec<CartLine> {
        self.lines
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
