//! # Catalog Index
//!
//! Read-only snapshot of everything an order can reference: products,
//! promotions, service-type templates and staff.
//!
//! A snapshot is built from repository reads and thrown away after each
//! mutation, so promotion and stock changes made by other operators are
//! always seen by the next pricing call.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::types::{Employee, Product, Promotion, ServiceTypeTemplate};

/// Lookup tables over one catalog read.
#[derive(Debug, Clone, Default)]
pub struct CatalogIndex {
    products: Vec<Product>,
    promotions: Vec<Promotion>,
    service_types: Vec<ServiceTypeTemplate>,
    employees: Vec<Employee>,
    product_pos: HashMap<String, usize>,
}

impl CatalogIndex {
    pub fn new(
        products: Vec<Product>,
        promotions: Vec<Promotion>,
        service_types: Vec<ServiceTypeTemplate>,
        employees: Vec<Employee>,
    ) -> Self {
        let product_pos = products
            .iter()
            .enumerate()
            .map(|(i, p)| (p.id.clone(), i))
            .collect();

        CatalogIndex {
            products,
            promotions,
            service_types,
            employees,
            product_pos,
        }
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    pub fn product(&self, id: &str) -> Option<&Product> {
        self.product_pos.get(id).map(|&i| &self.products[i])
    }

    pub fn promotion(&self, id: &str) -> Option<&Promotion> {
        self.promotions.iter().find(|p| p.id == id)
    }

    pub fn service_type(&self, id: &str) -> Option<&ServiceTypeTemplate> {
        self.service_types.iter().find(|s| s.id == id)
    }

    pub fn employee(&self, id: &str) -> Option<&Employee> {
        self.employees.iter().find(|e| e.id == id)
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    // =========================================================================
    // Filtered Views
    // =========================================================================

    /// Promotions whose active flag is set and whose window contains `now`.
    pub fn active_promotions(&self, now: DateTime<Utc>) -> Vec<&Promotion> {
        self.promotions
            .iter()
            .filter(|p| p.is_available_at(now))
            .collect()
    }

    /// Active service templates, sorted by name.
    pub fn active_service_types(&self) -> Vec<&ServiceTypeTemplate> {
        let mut active: Vec<_> = self.service_types.iter().filter(|s| s.is_active).collect();
        active.sort_by(|a, b| a.name.cmp(&b.name));
        active
    }

    /// Active employees, sorted by name.
    pub fn active_employees(&self) -> Vec<&Employee> {
        let mut active: Vec<_> = self.employees.iter().filter(|e| e.is_active).collect();
        active.sort_by(|a, b| a.name.cmp(&b.name));
        active
    }

    /// Case-insensitive substring search over product name and category.
    pub fn search_products(&self, query: &str) -> Vec<&Product> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return self.products.iter().collect();
        }
        self.products
            .iter()
            .filter(|p| {
                p.name.to_lowercase().contains(&query) || p.category.to_lowercase().contains(&query)
            })
            .collect()
    }

    /// Products at or below their reorder threshold.
    pub fn low_stock_products(&self) -> Vec<&Product> {
        self.products.iter().filter(|p| p.is_low_stock()).collect()
    }
}
