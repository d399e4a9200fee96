//! # Checkout Service
//!
//! Takes payment for a confirmed order and persists the receipt.
//!
//! ```text
//! pay(order_id, adjustment)
//!   ├── store.get_order          → NotFound if missing
//!   ├── checkout::apply_payment  → AlreadyPaid / Validation
//!   └── store.update_order       → AlreadyPaid if another payment landed first,
//!                                  Persistence otherwise; nothing recorded
//! ```

use chrono::Utc;
use tracing::{info, warn};

use torque_core::checkout::{apply_payment, compute_final_total};
use torque_core::{
    CoreError, CoreResult, Money, Order, OrderPatch, PaymentAdjustment, PaymentRecord,
};
use torque_db::OrderRepository;

/// Payment front for stored orders.
#[derive(Debug, Clone)]
pub struct Checkout<S> {
    store: S,
}

impl<S: OrderRepository> Checkout<S> {
    pub fn new(store: S) -> Self {
        Checkout { store }
    }

    async fn load(&self, order_id: &str) -> CoreResult<Order> {
        self.store
            .get_order(order_id)
            .await?
            .ok_or_else(|| CoreError::NotFound {
                entity: "Order".to_string(),
                id: order_id.to_string(),
            })
    }

    /// What the client would pay under `adjustment`, without paying.
    pub async fn preview(
        &self,
        order_id: &str,
        adjustment: &PaymentAdjustment,
    ) -> CoreResult<Money> {
        let order = self.load(order_id).await?;
        Ok(compute_final_total(order.total(), adjustment))
    }

    /// Pays an order once.
    ///
    /// ## Errors
    /// - `NotFound` if the order does not exist
    /// - `AlreadyPaid` if it carries a payment; that record is kept
    /// - `Validation` if the adjustment is out of bounds
    /// - `Persistence` if the receipt could not be stored; the order stays
    ///   unpaid
    pub async fn pay(
        &self,
        order_id: &str,
        adjustment: &PaymentAdjustment,
    ) -> CoreResult<PaymentRecord> {
        let mut order = self.load(order_id).await?;
        let record = apply_payment(&mut order, adjustment, Utc::now())?;

        self.store
            .update_order(order_id, OrderPatch::payment(record.clone()))
            .await
            .map_err(|e| {
                warn!(order_id, error = %e, "Payment not recorded");
                CoreError::from(e)
            })?;

        info!(
            order_id,
            method = ?record.method,
            final_total_cents = record.final_total.cents(),
            "Order paid"
        );
        Ok(record)
    }
}
