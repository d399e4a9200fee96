//! # Checkout
//!
//! Final-total math and the single place an order becomes paid.
//!
//! ## Checkout Flow
//! ```text
//! Order.total ($82.00)
//!      │
//!      ├── discount: 10%        → −$8.20
//!      ├── surcharge: $5.00     → +$5.00
//!      ▼
//! final_total = max(0, 82.00 − 8.20 + 5.00) = $78.80
//!      │
//!      ▼
//! apply_payment() → Order.paid = true, PaymentRecord stored
//! ```

use chrono::{DateTime, Utc};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{CheckoutDiscount, Order, PaymentAdjustment, PaymentRecord};
use crate::validation::validate_payment_adjustment;

/// Amount taken off `total` by a checkout discount.
pub fn discount_amount(total: Money, discount: CheckoutDiscount) -> Money {
    match discount {
        CheckoutDiscount::None => Money::zero(),
        CheckoutDiscount::Percentage { bps } => total.percentage(bps),
        CheckoutDiscount::Fixed { amount_cents } => Money::from_cents(amount_cents),
    }
}

/// Computes what the client pays.
///
/// Starts from the order total, subtracts the discount, adds the surcharge,
/// and clamps at zero. Never negative and never overflows, whatever the
/// inputs; unvalidated extremes saturate.
pub fn compute_final_total(total: Money, adjustment: &PaymentAdjustment) -> Money {
    total
        .saturating_sub(discount_amount(total, adjustment.discount))
        .saturating_add(Money::from_cents(adjustment.surcharge_cents))
        .clamp_non_negative()
}

/// Marks `order` paid and returns its payment record.
///
/// ## Errors
/// - `AlreadyPaid` if the order already has a payment; the existing record
///   is left untouched
/// - `Validation` if the adjustment is out of bounds
pub fn apply_payment(
    order: &mut Order,
    adjustment: &PaymentAdjustment,
    paid_at: DateTime<Utc>,
) -> CoreResult<PaymentRecord> {
    if order.paid {
        return Err(CoreError::AlreadyPaid {
            order_id: order.id.clone(),
        });
    }
    validate_payment_adjustment(adjustment)?;

    let record = build_record(order, adjustment, paid_at);
    order.paid = true;
    order.payment = Some(record.clone());
    Ok(record)
}

fn build_record(
    order: &Order,
    adjustment: &PaymentAdjustment,
    paid_at: DateTime<Utc>,
) -> PaymentRecord {
    let total = order.total();
    PaymentRecord {
        order_id: order.id.clone(),
        method: adjustment.method,
        order_total: total,
        discount: discount_amount(total, adjustment.discount),
        surcharge: Money::from_cents(adjustment.surcharge_cents),
        surcharge_description: adjustment
            .surcharge_description
            .as_ref()
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty()),
        final_total: compute_final_total(total, adjustment),
        paid_at,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
