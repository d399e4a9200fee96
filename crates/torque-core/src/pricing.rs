//! # Pricing Engine
//!
//! Pure functions that price a single line and aggregate lines into totals.
//!
//! ## Pricing Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Product + qty ──► best eligible promotion ──► CartLine (Product)       │
//! │                    (max discount, id asc)                               │
//! │                                                                         │
//! │  Promotion + qty per product ──► all eligible products at full price    │
//! │                                  ──► subtotal × (1 − discount)          │
//! │                                  ──► CartLine (Bundle, qty 1)           │
//! │                                                                         │
//! │  [CartLine] + [service base price] ──► aggregate() ──► Totals           │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing here caches: callers reprice from a fresh catalog snapshot on
//! every mutation, and the same inputs always give the same line.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::catalog::CatalogIndex;
use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{CartLine, IncludedProduct, LineKind, Product, Promotion, Totals};
use crate::validation::{validate_discount_bps, validate_quantity};

// =============================================================================
// Promotion Selection
// =============================================================================

/// Picks the promotion that gives `product_id` the largest discount.
///
/// Only active promotions that list the product are considered. Equal
/// discounts go to the lowest promotion id.
pub fn best_promotion_for<'a, I>(product_id: &str, promotions: I) -> Option<&'a Promotion>
where
    I: IntoIterator<Item = &'a Promotion>,
{
    promotions
        .into_iter()
        .filter(|p| p.is_active && p.includes(product_id))
        .min_by(|a, b| {
            b.discount_bps
                .cmp(&a.discount_bps)
                .then_with(|| a.id.cmp(&b.id))
        })
}

// =============================================================================
// Line Pricing
// =============================================================================

/// Prices `quantity` units of one product.
///
/// ## Errors
/// - `Validation` if quantity is not within 1..=999
/// - `InsufficientStock` if `quantity` exceeds the product's available stock
///
/// ## Example
/// ```text
/// Wax $20.00 (stock 5), Summer 20% includes Wax, qty 2
///   → unit_price 16.00, total 32.00, discount 8.00
/// ```
pub fn price_product_line<'a, I>(
    product: &Product,
    quantity: i64,
    active_promotions: I,
) -> CoreResult<CartLine>
where
    I: IntoIterator<Item = &'a Promotion>,
{
    validate_quantity(quantity)?;
    ensure_stock(product, quantity)?;

    let promotion = best_promotion_for(&product.id, active_promotions);
    let unit_price = match promotion {
        Some(promo) => product.price().apply_percentage_discount(promo.discount_bps),
        None => product.price(),
    };

    Ok(CartLine {
        line_id: Uuid::new_v4().to_string(),
        name: product.name.clone(),
        quantity,
        unit_price_cents: unit_price.cents(),
        total_cents: unit_price.multiply_quantity(quantity).cents(),
        kind: LineKind::Product {
            product_id: product.id.clone(),
            regular_unit_price_cents: product.price_cents,
            promotion_id: promotion.map(|p| p.id.clone()),
        },
    })
}

/// Prices a whole promotion as one bundle line.
///
/// Every eligible product is included `quantity_per_product` times at full
/// price; the discount is applied once to the combined subtotal. The line has
/// quantity 1 and its unit price is the charged total.
///
/// ## Errors
/// - `UnknownPromotion` if the id is not in the catalog, the promotion is not
///   available at `now`, or it names a product the catalog does not have
/// - `InsufficientStock` if any constituent lacks `quantity_per_product` units
pub fn price_bundle_promotion(
    promotion_id: &str,
    catalog: &CatalogIndex,
    quantity_per_product: i64,
    now: DateTime<Utc>,
) -> CoreResult<CartLine> {
    validate_quantity(quantity_per_product)?;

    let promotion = catalog
        .promotion(promotion_id)
        .filter(|p| p.is_available_at(now))
        .ok_or_else(|| CoreError::UnknownPromotion(promotion_id.to_string()))?;
    validate_discount_bps("discount", promotion.discount_bps)?;

    let mut included = Vec::with_capacity(promotion.product_ids.len());
    for product_id in &promotion.product_ids {
        let product = catalog
            .product(product_id)
            .ok_or_else(|| CoreError::UnknownPromotion(promotion_id.to_string()))?;
        ensure_stock(product, quantity_per_product)?;

        included.push(IncludedProduct {
            product_id: product.id.clone(),
            name: product.name.clone(),
            quantity: quantity_per_product,
            unit_price_cents: product.price_cents,
            total_cents: product.price().multiply_quantity(quantity_per_product).cents(),
        });
    }

    if included.is_empty() {
        return Err(CoreError::UnknownPromotion(promotion_id.to_string()));
    }

    let subtotal: Money = included.iter().map(|p| Money::from_cents(p.total_cents)).sum();
    let charged = subtotal.apply_percentage_discount(promotion.discount_bps);

    Ok(CartLine {
        line_id: Uuid::new_v4().to_string(),
        name: promotion.name.clone(),
        quantity: 1,
        unit_price_cents: charged.cents(),
        total_cents: charged.cents(),
        kind: LineKind::Bundle {
            promotion_id: promotion.id.clone(),
            included_products: included,
        },
    })
}

/// Prices an existing cart line again from `catalog` at `now`.
///
/// The line keeps its `line_id` and quantity; everything else (best
/// promotion, unit price, bundle constituents) is recomputed as if the line
/// were added now. Fails the same way a fresh add would, so a bundle whose
/// promotion lapsed reports `UnknownPromotion`.
pub fn reprice_line(
    line: &CartLine,
    catalog: &CatalogIndex,
    now: DateTime<Utc>,
) -> CoreResult<CartLine> {
    let mut repriced = match &line.kind {
        LineKind::Product { product_id, .. } => {
            let product = catalog
                .product(product_id)
                .ok_or_else(|| CoreError::ProductNotFound(product_id.clone()))?;
            price_product_line(product, line.quantity, catalog.active_promotions(now))?
        }
        LineKind::Bundle {
            promotion_id,
            included_products,
        } => {
            let per_product = included_products.first().map_or(1, |p| p.quantity);
            price_bundle_promotion(promotion_id, catalog, per_product, now)?
        }
    };
    repriced.line_id = line.line_id.clone();
    Ok(repriced)
}

fn ensure_stock(product: &Product, quantity: i64) -> CoreResult<()> {
    if !product.has_stock(quantity) {
        return Err(CoreError::InsufficientStock {
            product: product.name.clone(),
            requested: quantity,
            available: product.available_quantity,
        });
    }
    Ok(())
}

// =============================================================================
// Aggregation
// =============================================================================

/// Sums lines and selected services into order totals.
///
/// ```text
/// service_subtotal  = Σ service base prices
/// products_subtotal = Σ line totals
/// total_discounts   = Σ (full-price equivalent − line total)
/// subtotal          = service_subtotal + products_subtotal + total_discounts
/// total             = service_subtotal + products_subtotal
/// ```
pub fn aggregate<'a, L>(lines: L, service_base_prices: &[Money]) -> Totals
where
    L: IntoIterator<Item = &'a CartLine>,
{
    let service_subtotal: Money = service_base_prices.iter().sum();

    let mut products_subtotal = Money::zero();
    let mut total_discounts = Money::zero();
    for line in lines {
        products_subtotal += line.total();
        total_discounts += line.discount();
    }

    Totals {
        service_subtotal,
        products_subtotal,
        total_discounts,
        subtotal: service_subtotal + products_subtotal + total_discounts,
        total: service_subtotal + products_subtotal,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{product, promotion};

    fn no_promos() -> Vec<Promotion> {
        Vec::new()
    }

    #[test]
    fn test_plain_line_uses_list_price() {
        let wax = product("wax", "Wax", 2000, 5);
        for qty in 1..=5 {
            let line = price_product_line(&wax, qty, &no_promos()).unwrap();
            assert_eq!(line.unit_price_cents, 2000);
            assert_eq!(line.total_cents, 2000 * qty);
            assert!(line.discount().is_zero());
            assert!(!line.is_promotion());
        }
    }

    #[test]
    fn test_summer_wax_scenario() {
        let wax = product("wax", "Wax", 2000, 5);
        let promos = vec![promotion("summer", 2000, &["wax"])];

        let line = price_product_line(&wax, 2, &promos).unwrap();

        assert_eq!(line.unit_price_cents, 1600);
        assert_eq!(line.total_cents, 3200);
        assert_eq!(line.discount().cents(), 800);
        assert!(matches!(
            &line.kind,
            LineKind::Product { promotion_id: Some(id), .. } if id == "summer"
        ));
    }

    #[test]
    fn test_best_promotion_is_strictly_greatest() {
        let promos = vec![
            promotion("b", 1000, &["wax"]),
            promotion("c", 3000, &["wax"]),
            promotion("a", 2500, &["wax", "oil"]),
            promotion("d", 9000, &["oil"]),
        ];
        assert_eq!(best_promotion_for("wax", &promos).unwrap().id, "c");
        assert_eq!(best_promotion_for("oil", &promos).unwrap().id, "d");
        assert!(best_promotion_for("soap", &promos).is_none());
    }

    #[test]
    fn test_best_promotion_tie_breaks_on_id() {
        let promos = vec![
            promotion("zeta", 2000, &["wax"]),
            promotion("alpha", 2000, &["wax"]),
        ];
        assert_eq!(best_promotion_for("wax", &promos).unwrap().id, "alpha");
    }

    #[test]
    fn test_inactive_promotion_ignored() {
        let mut off = promotion("big", 9000, &["wax"]);
        off.is_active = false;
        let promos = vec![off, promotion("small", 1000, &["wax"])];
        assert_eq!(best_promotion_for("wax", &promos).unwrap().id, "small");
    }

    #[test]
    fn test_product_line_insufficient_stock() {
        let wax = product("wax", "Wax", 2000, 5);
        let err = price_product_line(&wax, 6, &no_promos()).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InsufficientStock { requested: 6, available: 5, .. }
        ));
    }

    #[test]
    fn test_product_line_rejects_zero_quantity() {
        let wax = product("wax", "Wax", 2000, 5);
        assert!(matches!(
            price_product_line(&wax, 0, &no_promos()),
            Err(CoreError::Validation(_))
        ));
    }

    fn bundle_catalog() -> CatalogIndex {
        CatalogIndex::new(
            vec![
                product("wax", "Wax", 2000, 5),
                product("cloth", "Microfiber", 500, 1),
            ],
            vec![promotion("kit", 1000, &["wax", "cloth"])],
            vec![],
            vec![],
        )
    }

    #[test]
    fn test_bundle_pricing() {
        let line = price_bundle_promotion("kit", &bundle_catalog(), 1, Utc::now()).unwrap();

        // (2000 + 500) × 90% = 2250
        assert_eq!(line.total_cents, 2250);
        assert_eq!(line.quantity, 1);
        assert_eq!(line.unit_price_cents, 2250);
        assert!(line.is_promotion());
        assert_eq!(line.full_price_total().cents(), 2500);

        // The bundle's attributed discount equals what aggregate reports.
        let totals = aggregate([&line], &[]);
        assert_eq!(totals.total_discounts, line.full_price_total() - line.total());
        assert_eq!(totals.total_discounts.cents(), 250);
    }

    #[test]
    fn test_bundle_constituent_out_of_stock() {
        let err = price_bundle_promotion("kit", &bundle_catalog(), 2, Utc::now()).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InsufficientStock { ref product, requested: 2, available: 1 } if product == "Microfiber"
        ));
    }

    #[test]
    fn test_bundle_unknown_promotion() {
        assert!(matches!(
            price_bundle_promotion("nope", &bundle_catalog(), 1, Utc::now()),
            Err(CoreError::UnknownPromotion(id)) if id == "nope"
        ));

        let dangling = CatalogIndex::new(
            vec![product("wax", "Wax", 2000, 5)],
            vec![promotion("kit", 1000, &["wax", "ghost"])],
            vec![],
            vec![],
        );
        assert!(matches!(
            price_bundle_promotion("kit", &dangling, 1, Utc::now()),
            Err(CoreError::UnknownPromotion(_))
        ));
    }

    #[test]
    fn test_reprice_drops_lapsed_promotion() {
        let wax = product("wax", "Wax", 2000, 5);
        let mut summer = promotion("summer", 2000, &["wax"]);
        let line = price_product_line(&wax, 2, [&summer]).unwrap();
        assert_eq!(line.unit_price_cents, 1600);

        summer.is_active = false;
        let catalog = CatalogIndex::new(vec![wax], vec![summer], vec![], vec![]);
        let repriced = reprice_line(&line, &catalog, Utc::now()).unwrap();

        assert_eq!(repriced.line_id, line.line_id);
        assert_eq!(repriced.quantity, 2);
        assert_eq!(repriced.unit_price_cents, 2000);
        assert_eq!(repriced.total_cents, 4000);
        assert!(matches!(
            repriced.kind,
            LineKind::Product { promotion_id: None, .. }
        ));
    }

    #[test]
    fn test_reprice_bundle_follows_catalog() {
        let line = price_bundle_promotion("kit", &bundle_catalog(), 1, Utc::now()).unwrap();

        let richer = CatalogIndex::new(
            bundle_catalog().products().to_vec(),
            vec![promotion("kit", 2000, &["wax", "cloth"])],
            vec![],
            vec![],
        );
        let repriced = reprice_line(&line, &richer, Utc::now()).unwrap();
        assert_eq!(repriced.line_id, line.line_id);
        assert_eq!(repriced.total_cents, 2000);

        let mut lapsed = promotion("kit", 1000, &["wax", "cloth"]);
        lapsed.is_active = false;
        let without = CatalogIndex::new(richer.products().to_vec(), vec![lapsed], vec![], vec![]);
        assert!(matches!(
            reprice_line(&line, &without, Utc::now()),
            Err(CoreError::UnknownPromotion(id)) if id == "kit"
        ));
    }

    #[test]
    fn test_aggregate_services_and_products() {
        let wax = product("wax", "Wax", 2000, 5);
        let promos = vec![promotion("summer", 2000, &["wax"])];
        let line = price_product_line(&wax, 2, &promos).unwrap();

        let totals = aggregate([&line], &[Money::from_cents(5000)]);

        assert_eq!(totals.service_subtotal.cents(), 5000);
        assert_eq!(totals.products_subtotal.cents(), 3200);
        assert_eq!(totals.total_discounts.cents(), 800);
        assert_eq!(totals.subtotal.cents(), 9000);
        assert_eq!(totals.total.cents(), 8200);
    }

    #[test]
    fn test_aggregate_empty() {
        let totals = aggregate(std::iter::empty::<&CartLine>(), &[]);
        assert_eq!(totals, Totals::default());
    }
}
