//! # Catalog Repository
//!
//! Catalog reads for the order wizard, plus the insert helpers the `seed`
//! binary uses to stock a development database.
//!
//! ## Promotion Storage
//! ```text
//! promotions                       promotion_products
//! ┌────────┬────────────┬─────┐    ┌──────────┬────────────┬──────────┐
//! │ id     │ name       │ bps │    │ promo_id │ product_id │ position │
//! ├────────┼────────────┼─────┤    ├──────────┼────────────┼──────────┤
//! │ summer │ Summer Wax │2000 │◄───│ summer   │ wax-500    │ 0        │
//! └────────┴────────────┴─────┘    │ summer   │ cloth-xl   │ 1        │
//!                                  └──────────┴────────────┴──────────┘
//! ```
//! Product ids are read back in `position` order so a bundle lists its
//! contents the way the promotion was defined.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use tracing::debug;

use torque_core::{Employee, Product, Promotion, ServiceTypeTemplate};

use crate::error::{DbError, DbResult};
use crate::pool::Database;
use crate::repository::CatalogRepository;

#[derive(FromRow)]
struct ProductRow {
    id: String,
    name: String,
    category: String,
    price_cents: i64,
    cost_cents: i64,
    available_quantity: i64,
    min_stock: i64,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.id,
            name: row.name,
            category: row.category,
            price_cents: row.price_cents,
            cost_cents: row.cost_cents,
            available_quantity: row.available_quantity,
            min_stock: row.min_stock,
        }
    }
}

#[derive(FromRow)]
struct PromotionRow {
    id: String,
    name: String,
    discount_bps: i64,
    is_active: bool,
    starts_at: Option<DateTime<Utc>>,
    ends_at: Option<DateTime<Utc>>,
}

#[derive(FromRow)]
struct ServiceTypeRow {
    id: String,
    name: String,
    base_price_cents: i64,
    description: Option<String>,
    is_active: bool,
}

#[derive(FromRow)]
struct EmployeeRow {
    id: String,
    name: String,
    role: String,
    is_active: bool,
}

impl CatalogRepository for Database {
    async fn list_products(&self) -> DbResult<Vec<Product>> {
        let rows: Vec<ProductRow> = sqlx::query_as(
            r#"
            SELECT id, name, category, price_cents, cost_cents,
                   available_quantity, min_stock
            FROM products
            ORDER BY name
            "#,
        )
        .fetch_all(self.pool())
        .await?;

        debug!(count = rows.len(), "Loaded products");
        Ok(rows.into_iter().map(Product::from).collect())
    }

    async fn list_promotions(&self) -> DbResult<Vec<Promotion>> {
        let rows: Vec<PromotionRow> = sqlx::query_as(
            r#"
            SELECT id, name, discount_bps, is_active, starts_at, ends_at
            FROM promotions
            ORDER BY id
            "#,
        )
        .fetch_all(self.pool())
        .await?;

        let links: Vec<(String, String)> = sqlx::query_as(
            r#"
            SELECT promotion_id, product_id
            FROM promotion_products
            ORDER BY promotion_id, position
            "#,
        )
        .fetch_all(self.pool())
        .await?;

        let mut products_by_promo: HashMap<String, Vec<String>> = HashMap::new();
        for (promotion_id, product_id) in links {
            products_by_promo
                .entry(promotion_id)
                .or_default()
                .push(product_id);
        }

        let promotions = rows
            .into_iter()
            .map(|row| Promotion {
                product_ids: products_by_promo.remove(&row.id).unwrap_or_default(),
                id: row.id,
                name: row.name,
                // CHECK constraint keeps this within 0..=10000
                discount_bps: row.discount_bps.clamp(0, 10_000) as u32,
                is_active: row.is_active,
                starts_at: row.starts_at,
                ends_at: row.ends_at,
            })
            .collect::<Vec<_>>();

        debug!(count = promotions.len(), "Loaded promotions");
        Ok(promotions)
    }

    async fn list_service_types(&self) -> DbResult<Vec<ServiceTypeTemplate>> {
        let rows: Vec<ServiceTypeRow> = sqlx::query_as(
            r#"
            SELECT id, name, base_price_cents, description, is_active
            FROM service_types
            ORDER BY name
            "#,
        )
        .fetch_all(self.pool())
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| ServiceTypeTemplate {
                id: row.id,
                name: row.name,
                base_price_cents: row.base_price_cents,
                description: row.description,
                is_active: row.is_active,
            })
            .collect())
    }

    async fn list_employees(&self) -> DbResult<Vec<Employee>> {
        let rows: Vec<EmployeeRow> = sqlx::query_as(
            r#"
            SELECT id, name, role, is_active
            FROM employees
            ORDER BY name
            "#,
        )
        .fetch_all(self.pool())
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| Employee {
                id: row.id,
                name: row.name,
                role: row.role,
                is_active: row.is_active,
            })
            .collect())
    }
}

// =============================================================================
// Seeding Helpers
// =============================================================================

impl Database {
    pub async fn insert_product(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, name = %product.name, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, category, price_cents, cost_cents,
                available_quantity, min_stock
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.category)
        .bind(product.price_cents)
        .bind(product.cost_cents)
        .bind(product.available_quantity)
        .bind(product.min_stock)
        .execute(self.pool())
        .await?;

        Ok(())
    }

    /// Inserts a promotion and its product links in one transaction.
    pub async fn insert_promotion(&self, promotion: &Promotion) -> DbResult<()> {
        debug!(id = %promotion.id, products = promotion.product_ids.len(), "Inserting promotion");

        let mut tx = self.pool().begin().await?;

        sqlx::query(
            r#"
            INSERT INTO promotions (id, name, discount_bps, is_active, starts_at, ends_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&promotion.id)
        .bind(&promotion.name)
        .bind(promotion.discount_bps as i64)
        .bind(promotion.is_active)
        .bind(promotion.starts_at)
        .bind(promotion.ends_at)
        .execute(&mut *tx)
        .await?;

        for (position, product_id) in promotion.product_ids.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO promotion_products (promotion_id, product_id, position)
                VALUES (?1, ?2, ?3)
                "#,
            )
            .bind(&promotion.id)
            .bind(product_id)
            .bind(position as i64)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    pub async fn insert_service_type(&self, service: &ServiceTypeTemplate) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO service_types (id, name, base_price_cents, description, is_active)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&service.id)
        .bind(&service.name)
        .bind(service.base_price_cents)
        .bind(&service.description)
        .bind(service.is_active)
        .execute(self.pool())
        .await?;

        Ok(())
    }

    pub async fn insert_employee(&self, employee: &Employee) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO employees (id, name, role, is_active)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(&employee.id)
        .bind(&employee.name)
        .bind(&employee.role)
        .bind(employee.is_active)
        .execute(self.pool())
        .await?;

        Ok(())
    }

    /// Number of products; the seed binary skips a stocked database.
    pub async fn count_products(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(self.pool())
            .await?;
        Ok(count)
    }

    /// Overwrites a product's stock level.
    pub async fn set_available_quantity(&self, product_id: &str, quantity: i64) -> DbResult<()> {
        let result = sqlx::query("UPDATE products SET available_quantity = ?1 WHERE id = ?2")
            .bind(quantity)
            .bind(product_id)
            .execute(self.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", product_id));
        }
        Ok(())
    }
}
