use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// A catalog product document. The cache layer never looks inside this;
/// it only ever sees the serialized payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    pub brand: String,
    pub price_cents: u64,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// Fields accepted when creating a product
#[derive(Debug, Clone, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub category: String,
    pub brand: String,
    pub price_cents: u64,
}

/// Fields accepted when updating a product; absent fields keep their
/// current value
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub price_cents: Option<u64>,
}

/// Distinct categories and brands, the source of the cached dropdown
/// aggregate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DropdownData {
    pub categories: Vec<String>,
    pub brands: Vec<String>,
}

/// Handler invocation counters, used by tests to assert that a response
/// served from cache never reached the store
#[derive(Debug, Default, Clone, Serialize)]
pub struct CatalogCounters {
    pub list_calls: u64,
    pub get_calls: u64,
    pub write_calls: u64,
    pub dropdown_calls: u64,
}

/// In-memory stand-in for the document store behind the domain handlers.
/// The cache subsystem treats it as an opaque collaborator.
#[derive(Clone, Default)]
pub struct CatalogStore {
    products: Arc<RwLock<HashMap<Uuid, Product>>>,
    counters: Arc<RwLock<CatalogCounters>>,
}

impl CatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// List products, newest first, optionally filtered by category.
    /// Returns the page plus the total match count.
    pub fn list(&self, category: Option<&str>, page: usize, limit: usize) -> (Vec<Product>, usize) {
        self.counters.write().list_calls += 1;

        let products = self.products.read();
        let mut matched: Vec<Product> = products
            .values()
            .filter(|p| category.is_none_or(|c| p.category == c))
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));

        let total = matched.len();
        let page = page.max(1);
        let start = (page - 1).saturating_mul(limit);
        let items = matched.into_iter().skip(start).take(limit).collect();

        debug!("Catalog LIST category={:?} page={} total={}", category, page, total);
        (items, total)
    }

    pub fn get(&self, id: Uuid) -> Option<Product> {
        self.counters.write().get_calls += 1;
        self.products.read().get(&id).cloned()
    }

    pub fn insert(&self, new: NewProduct) -> Product {
        self.counters.write().write_calls += 1;

        let product = Product {
            id: Uuid::new_v4(),
            name: new.name,
            category: new.category,
            brand: new.brand,
            price_cents: new.price_cents,
            active: true,
            created_at: Utc::now(),
        };
        self.products.write().insert(product.id, product.clone());
        debug!("Catalog INSERT id={}", product.id);
        product
    }

    pub fn update(&self, id: Uuid, update: ProductUpdate) -> Option<Product> {
        self.counters.write().write_calls += 1;

        let mut products = self.products.write();
        let product = products.get_mut(&id)?;
        if let Some(name) = update.name {
            product.name = name;
        }
        if let Some(category) = update.category {
            product.category = category;
        }
        if let Some(brand) = update.brand {
            product.brand = brand;
        }
        if let Some(price_cents) = update.price_cents {
            product.price_cents = price_cents;
        }
        debug!("Catalog UPDATE id={}", id);
        Some(product.clone())
    }

    pub fn delete(&self, id: Uuid) -> bool {
        self.counters.write().write_calls += 1;
        let removed = self.products.write().remove(&id).is_some();
        debug!("Catalog DELETE id={} removed={}", id, removed);
        removed
    }

    /// Flip the active flag; returns the updated product.
    pub fn set_active(&self, id: Uuid, active: bool) -> Option<Product> {
        self.counters.write().write_calls += 1;

        let mut products = self.products.write();
        let product = products.get_mut(&id)?;
        product.active = active;
        Some(product.clone())
    }

    /// Distinct categories and brands across the catalog, sorted.
    pub fn dropdown_data(&self) -> DropdownData {
        self.counters.write().dropdown_calls += 1;

        let products = self.products.read();
        let mut categories: Vec<String> = products.values().map(|p| p.category.clone()).collect();
        let mut brands: Vec<String> = products.values().map(|p| p.brand.clone()).collect();
        categories.sort();
        categories.dedup();
        brands.sort();
        brands.dedup();

        DropdownData { categories, brands }
    }

    /// Sorted distinct category names (reference data endpoint).
    pub fn categories(&self) -> Vec<String> {
        self.dropdown_data().categories
    }

    pub fn counters(&self) -> CatalogCounters {
        self.counters.read().clone()
    }
}
