//! In-Memory Document Store
//!
//! Backing store for development and tests, with the same depth-resolution
//! semantics a real collection store provides.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;

use crate::error::Result;
use crate::model::{FileAsset, Order, Product, Ref, User};
use crate::store::{
    DocumentStore, FileFilter, NewFileAsset, NewOrder, OrderFilter, ProductFilter, UserFilter,
};

/// In-memory store (for development)
pub struct MemoryStore {
    users: RwLock<HashMap<String, User>>,
    products: RwLock<HashMap<String, Product>>,
    files: RwLock<HashMap<String, FileAsset>>,
    orders: RwLock<HashMap<String, Order>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
            products: RwLock::new(HashMap::new()),
            files: RwLock::new(HashMap::new()),
            orders: RwLock::new(HashMap::new()),
        }
    }

    /// Seed a user (tests and dev bootstrap)
    pub fn insert_user(&self, user: User) {
        self.users.write().unwrap().insert(user.id.clone(), user);
    }

    /// Seed a product
    pub fn insert_product(&self, product: Product) {
        self.products
            .write()
            .unwrap()
            .insert(product.id.clone(), product);
    }

    /// Seed a file asset
    pub fn insert_file(&self, file: FileAsset) {
        self.files.write().unwrap().insert(file.id.clone(), file);
    }

    /// Seed an order, bypassing the unpaid-at-creation rule (tests only)
    pub fn insert_order(&self, order: Order) {
        self.orders.write().unwrap().insert(order.id.clone(), order);
    }

    /// Expand a product's relationships in place.
    ///
    /// `depth` is the remaining hop count at the product level: 1 or more
    /// resolves the product's files and owner.
    fn resolve_product(&self, product: &mut Product, depth: u8) {
        if depth == 0 {
            return;
        }
        let files = self.files.read().unwrap();
        for file_ref in &mut product.product_files {
            if let Ref::Id(id) = file_ref {
                if let Some(file) = files.get(id.as_str()) {
                    *file_ref = Ref::Resolved(Box::new(file.clone()));
                }
                // Missing target: left bare, callers tolerate it.
            }
        }
        if product.user.is_bare() {
            let users = self.users.read().unwrap();
            if let Some(user) = users.get(product.user.id()) {
                product.user = Ref::Resolved(Box::new(user.clone()));
            }
        }
    }

    fn resolve_order(&self, order: &mut Order, depth: u8) {
        if depth == 0 {
            return;
        }
        {
            let products = self.products.read().unwrap();
            for product_ref in &mut order.products {
                if let Ref::Id(id) = product_ref {
                    if let Some(product) = products.get(id.as_str()) {
                        *product_ref = Ref::Resolved(Box::new(product.clone()));
                    }
                }
            }
        }
        for product_ref in &mut order.products {
            if let Ref::Resolved(product) = product_ref {
                self.resolve_product(product, depth - 1);
            }
        }
        if order.user.is_bare() {
            let users = self.users.read().unwrap();
            if let Some(user) = users.get(order.user.id()) {
                order.user = Ref::Resolved(Box::new(user.clone()));
            }
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn find_users(&self, filter: UserFilter) -> Result<Vec<User>> {
        let users = self.users.read().unwrap();
        Ok(users
            .values()
            .filter(|u| filter.id.as_deref().is_none_or(|id| u.id == id))
            .filter(|u| filter.email.as_deref().is_none_or(|e| u.email == e))
            .cloned()
            .collect())
    }

    async fn find_files(&self, filter: FileFilter) -> Result<Vec<FileAsset>> {
        let files = self.files.read().unwrap();
        Ok(files
            .values()
            .filter(|f| filter.id.as_deref().is_none_or(|id| f.id == id))
            .filter(|f| filter.user.as_deref().is_none_or(|u| f.user.id() == u))
            .cloned()
            .collect())
    }

    async fn find_products(&self, filter: ProductFilter, depth: u8) -> Result<Vec<Product>> {
        let mut matched: Vec<Product> = {
            let products = self.products.read().unwrap();
            products
                .values()
                .filter(|p| {
                    filter
                        .id_in
                        .as_ref()
                        .is_none_or(|ids| ids.iter().any(|id| *id == p.id))
                })
                .filter(|p| filter.user.as_deref().is_none_or(|u| p.user.id() == u))
                .cloned()
                .collect()
        };
        for product in &mut matched {
            self.resolve_product(product, depth);
        }
        Ok(matched)
    }

    async fn find_orders(&self, filter: OrderFilter, depth: u8) -> Result<Vec<Order>> {
        let mut matched: Vec<Order> = {
            let orders = self.orders.read().unwrap();
            orders
                .values()
                .filter(|o| filter.id.as_deref().is_none_or(|id| o.id == id))
                .filter(|o| filter.user.as_deref().is_none_or(|u| o.user.id() == u))
                .filter(|o| filter.is_paid.is_none_or(|paid| o.is_paid == paid))
                .cloned()
                .collect()
        };
        for order in &mut matched {
            self.resolve_order(order, depth);
        }
        Ok(matched)
    }

    async fn create_file(&self, file: NewFileAsset, owner_id: &str) -> Result<FileAsset> {
        let created = FileAsset {
            id: uuid::Uuid::new_v4().to_string(),
            filename: file.filename,
            mime_type: file.mime_type,
            size_bytes: file.size_bytes,
            user: Ref::Id(owner_id.to_string()),
            created_at: Utc::now(),
        };
        self.files
            .write()
            .unwrap()
            .insert(created.id.clone(), created.clone());
        Ok(created)
    }

    async fn create_order(&self, order: NewOrder) -> Result<Order> {
        let created = Order {
            id: uuid::Uuid::new_v4().to_string(),
            user: Ref::Id(order.user_id),
            products: order.product_ids.into_iter().map(Ref::Id).collect(),
            is_paid: false,
            created_at: Utc::now(),
        };
        self.orders
            .write()
            .unwrap()
            .insert(created.id.clone(), created.clone());
        Ok(created)
    }

    async fn mark_order_paid(&self, order_id: &str) -> Result<u64> {
        let mut orders = self.orders.write().unwrap();
        match orders.get_mut(order_id) {
            Some(order) => {
                // Unconditional write: true→true re-application is a no-op.
                order.is_paid = true;
                Ok(1)
            }
            None => {
                tracing::debug!(order_id, "paid flag update matched no order");
                Ok(0)
            }
        }
    }
}
