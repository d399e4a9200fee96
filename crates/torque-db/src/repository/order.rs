//! # Order Repository
//!
//! SQLite storage for confirmed orders.
//!
//! ## Snapshot Pattern
//! Lines, selected services and the payment record are written as JSON
//! snapshots. A later price or promotion change never rewrites an order
//! that was already confirmed.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │ orders                                                           │
//! │  id │ kind │ client_id │ ... │ lines_json │ totals_json │ paid   │
//! │                              [CartLine..]  Totals        0/1     │
//! └──────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use tracing::{debug, info};
use uuid::Uuid;

use torque_core::{NewOrder, Order, OrderKind, OrderPatch};

use crate::error::{DbError, DbResult};
use crate::pool::Database;
use crate::repository::OrderRepository;

#[derive(FromRow)]
struct OrderRow {
    id: String,
    kind: OrderKind,
    client_id: String,
    vehicle_id: Option<String>,
    employee_id: Option<String>,
    services_json: String,
    lines_json: String,
    totals_json: String,
    notes: Option<String>,
    paid: bool,
    payment_json: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = DbError;

    fn try_from(row: OrderRow) -> DbResult<Self> {
        Ok(Order {
            id: row.id,
            kind: row.kind,
            client_id: row.client_id,
            vehicle_id: row.vehicle_id,
            services: serde_json::from_str(&row.services_json)?,
            employee_id: row.employee_id,
            lines: serde_json::from_str(&row.lines_json)?,
            notes: row.notes,
            totals: serde_json::from_str(&row.totals_json)?,
            paid: row.paid,
            payment: row
                .payment_json
                .as_deref()
                .map(serde_json::from_str)
                .transpose()?,
            created_at: row.created_at,
        })
    }
}

const SELECT_ORDER: &str = r#"
    SELECT id, kind, client_id, vehicle_id, employee_id,
           services_json, lines_json, totals_json, notes,
           paid, payment_json, created_at
    FROM orders
    WHERE id = ?1
"#;

impl OrderRepository for Database {
    async fn create_order(&self, order: NewOrder) -> DbResult<Order> {
        let order = order.into_order(Uuid::new_v4().to_string(), Utc::now());

        // Encode before touching the database so a bad snapshot writes nothing
        let services_json = serde_json::to_string(&order.services)?;
        let lines_json = serde_json::to_string(&order.lines)?;
        let totals_json = serde_json::to_string(&order.totals)?;

        debug!(id = %order.id, lines = order.lines.len(), "Inserting order");

        sqlx::query(
            r#"
            INSERT INTO orders (
                id, kind, client_id, vehicle_id, employee_id,
                services_json, lines_json, totals_json, total_cents,
                notes, paid, payment_json, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, 0, NULL, ?11)
            "#,
        )
        .bind(&order.id)
        .bind(order.kind)
        .bind(&order.client_id)
        .bind(&order.vehicle_id)
        .bind(&order.employee_id)
        .bind(services_json)
        .bind(lines_json)
        .bind(totals_json)
        .bind(order.total().cents())
        .bind(&order.notes)
        .bind(order.created_at)
        .execute(self.pool())
        .await?;

        info!(
            id = %order.id,
            kind = ?order.kind,
            total = %order.total(),
            "Order created"
        );
        Ok(order)
    }

    async fn get_order(&self, id: &str) -> DbResult<Option<Order>> {
        let row: Option<OrderRow> = sqlx::query_as(SELECT_ORDER)
            .bind(id)
            .fetch_optional(self.pool())
            .await?;

        row.map(Order::try_from).transpose()
    }

    async fn update_order(&self, id: &str, patch: OrderPatch) -> DbResult<Order> {
        let mut tx = self.pool().begin().await?;

        let row: Option<OrderRow> = sqlx::query_as(SELECT_ORDER)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        let mut order = row
            .map(Order::try_from)
            .transpose()?
            .ok_or_else(|| DbError::not_found("Order", id))?;

        let records_payment = patch.records_payment();
        if order.paid && records_payment {
            return Err(DbError::AlreadyPaid { order_id: order.id });
        }

        patch.apply_to(&mut order);
        let payment_json = order
            .payment
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        // The paid guard also catches a payment committed since the read
        let updated = sqlx::query(
            r#"
            UPDATE orders
            SET paid = ?1, payment_json = ?2, notes = ?3
            WHERE id = ?4 AND (?5 = 0 OR paid = 0)
            "#,
        )
        .bind(order.paid)
        .bind(payment_json)
        .bind(&order.notes)
        .bind(&order.id)
        .bind(records_payment)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(DbError::AlreadyPaid { order_id: order.id });
        }
        tx.commit().await?;

        info!(id = %order.id, paid = order.paid, "Order updated");
        Ok(order)
    }
}
