//! Document Store Contract
//!
//! Filtered find, create, and update-by-filter over the marketplace
//! collections, with relationship fields resolvable to a caller-chosen
//! depth. Queries either return the full matching set or fail; there are no
//! partial results.

use async_trait::async_trait;

use crate::error::Result;
use crate::model::{FileAsset, Order, Product, User};

/// Filter over the users collection
#[derive(Clone, Debug, Default)]
pub struct UserFilter {
    pub id: Option<String>,
    pub email: Option<String>,
}

impl UserFilter {
    /// Match a single user by identifier
    pub fn id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    pub fn email(email: impl Into<String>) -> Self {
        Self {
            email: Some(email.into()),
            ..Self::default()
        }
    }
}

/// Filter over the products collection
#[derive(Clone, Debug, Default)]
pub struct ProductFilter {
    pub id_in: Option<Vec<String>>,
    pub user: Option<String>,
}

impl ProductFilter {
    /// Match products whose id is in the given set
    pub fn id_in(ids: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            id_in: Some(ids.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    /// Match products owned by the given user
    pub fn owned_by(user_id: impl Into<String>) -> Self {
        Self {
            user: Some(user_id.into()),
            ..Self::default()
        }
    }
}

/// Filter over the files collection
#[derive(Clone, Debug, Default)]
pub struct FileFilter {
    pub id: Option<String>,
    pub user: Option<String>,
}

impl FileFilter {
    pub fn id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }
}

/// Filter over the orders collection
#[derive(Clone, Debug, Default)]
pub struct OrderFilter {
    pub id: Option<String>,
    pub user: Option<String>,
    pub is_paid: Option<bool>,
}

impl OrderFilter {
    pub fn id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    /// Match orders belonging to the given buyer
    pub fn for_user(user_id: impl Into<String>) -> Self {
        Self {
            user: Some(user_id.into()),
            ..Self::default()
        }
    }

    /// Additionally require a paid flag value
    pub fn paid(mut self, is_paid: bool) -> Self {
        self.is_paid = Some(is_paid);
        self
    }
}

/// Data for creating a file asset. The owner comes from the authenticated
/// uploader, passed separately so callers cannot spoof it.
#[derive(Clone, Debug)]
pub struct NewFileAsset {
    pub filename: String,
    pub mime_type: String,
    pub size_bytes: u64,
}

/// Data for creating an order. Always unpaid at creation.
#[derive(Clone, Debug)]
pub struct NewOrder {
    pub user_id: String,
    pub product_ids: Vec<String>,
}

/// Generic collection store for the marketplace.
///
/// `depth` controls relationship expansion: 0 leaves every relationship as a
/// bare [`crate::Ref::Id`], 1 resolves one hop (order→product,
/// product→file), 2 resolves two hops (order→product→file). A referenced
/// document that no longer exists stays bare rather than failing the query.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn find_users(&self, filter: UserFilter) -> Result<Vec<User>>;

    async fn find_files(&self, filter: FileFilter) -> Result<Vec<FileAsset>>;

    async fn find_products(&self, filter: ProductFilter, depth: u8) -> Result<Vec<Product>>;

    async fn find_orders(&self, filter: OrderFilter, depth: u8) -> Result<Vec<Order>>;

    /// Create a file asset owned by `owner_id`
    async fn create_file(&self, file: NewFileAsset, owner_id: &str) -> Result<FileAsset>;

    /// Create an unpaid order
    async fn create_order(&self, order: NewOrder) -> Result<Order>;

    /// Update-by-filter setting `is_paid = true` on the matching order.
    ///
    /// Returns the number of matched documents. The write is idempotent by
    /// construction of the flag: re-applying `true` is a no-op, so duplicate
    /// deliveries need no locking.
    async fn mark_order_paid(&self, order_id: &str) -> Result<u64>;
}
