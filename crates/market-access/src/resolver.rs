//! Entitlement Resolver
//!
//! Computes, for a requesting user, the set of file identifiers they may
//! read, as a filter the storage layer applies to file queries.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;

use market_core::{DocumentStore, OrderFilter, ProductFilter, User};

use crate::error::Result;

/// Set-membership filter over file identifiers
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AccessFilter {
    /// Universal access (admins)
    All,

    /// No access (anonymous requesters)
    Nothing,

    /// Access to exactly these file identifiers
    FileIds(HashSet<String>),
}

impl AccessFilter {
    /// Whether this filter admits the given file identifier
    pub fn allows(&self, file_id: &str) -> bool {
        match self {
            AccessFilter::All => true,
            AccessFilter::Nothing => false,
            AccessFilter::FileIds(ids) => ids.contains(file_id),
        }
    }
}

/// Authorization seam between the storage layer and entitlement logic.
///
/// Invoked by the file-read path before executing a query; the returned
/// filter is intersected with the request.
#[async_trait]
pub trait Authorizer: Send + Sync {
    async fn can_read(&self, requester: Option<&User>) -> Result<AccessFilter>;
}

/// Resolves entitlements from product ownership and paid orders.
///
/// Purchased access requires `is_paid = true` on the order; an order that
/// was never paid grants nothing.
pub struct EntitlementResolver<S> {
    store: Arc<S>,
}

impl<S: DocumentStore> EntitlementResolver<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Files bundled by products the user sells.
    ///
    /// Depth 0 is enough: bare file identifiers are all we need.
    async fn owned_file_ids(&self, user: &User) -> Result<HashSet<String>> {
        let products = self
            .store
            .find_products(ProductFilter::owned_by(&user.id), 0)
            .await?;

        Ok(products
            .into_iter()
            .flat_map(|product| product.product_files)
            .map(|file_ref| file_ref.id().to_string())
            .collect())
    }

    /// Files bundled by products inside the user's paid orders.
    ///
    /// One depth-2 query reads through order→product→file. A product entry
    /// the store left as a bare identifier cannot yield its files; the
    /// anomaly is logged and that entry contributes nothing, without
    /// aborting the rest of the resolution.
    async fn purchased_file_ids(&self, user: &User) -> Result<HashSet<String>> {
        let orders = self
            .store
            .find_orders(OrderFilter::for_user(&user.id).paid(true), 2)
            .await?;

        let mut file_ids = HashSet::new();
        for order in orders {
            for product_ref in &order.products {
                let Some(product) = product_ref.resolved() else {
                    tracing::warn!(
                        order_id = %order.id,
                        product_id = %product_ref.id(),
                        "resolution depth insufficient to read purchased file ids"
                    );
                    continue;
                };
                for file_ref in &product.product_files {
                    file_ids.insert(file_ref.id().to_string());
                }
            }
        }
        Ok(file_ids)
    }
}

#[async_trait]
impl<S: DocumentStore> Authorizer for EntitlementResolver<S> {
    async fn can_read(&self, requester: Option<&User>) -> Result<AccessFilter> {
        let Some(user) = requester else {
            return Ok(AccessFilter::Nothing);
        };
        if user.is_admin() {
            return Ok(AccessFilter::All);
        }

        let mut file_ids = self.owned_file_ids(user).await?;
        file_ids.extend(self.purchased_file_ids(user).await?);

        Ok(AccessFilter::FileIds(file_ids))
    }
}
