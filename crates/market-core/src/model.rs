//! Marketplace Domain Model
//!
//! Entities mirror the storefront's collections: users, products, uploaded
//! file assets, and orders. Relationship fields are [`Ref`]s, so a record
//! carries either a bare identifier or an embedded document depending on the
//! resolution depth of the query that produced it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Entities addressable by a stable string identifier
pub trait HasId {
    fn id(&self) -> &str;
}

/// A relationship field: bare identifier or resolved document.
///
/// Replaces per-call-site shape sniffing with a single normalization
/// surface. Deserializes from either a JSON string or an embedded object.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Ref<T> {
    /// Relationship left unresolved by the query depth
    Id(String),

    /// Relationship expanded inline
    Resolved(Box<T>),
}

impl<T> Ref<T> {
    /// The embedded document, if this reference was resolved
    pub fn resolved(&self) -> Option<&T> {
        match self {
            Ref::Id(_) => None,
            Ref::Resolved(doc) => Some(doc),
        }
    }

    /// True when the query depth left this as a bare identifier
    pub fn is_bare(&self) -> bool {
        matches!(self, Ref::Id(_))
    }
}

impl<T: HasId> Ref<T> {
    /// The identifier, regardless of resolution state
    pub fn id(&self) -> &str {
        match self {
            Ref::Id(id) => id,
            Ref::Resolved(doc) => doc.id(),
        }
    }
}

/// User role
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Customer,
}

/// A marketplace account
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl HasId for User {
    fn id(&self) -> &str {
        &self.id
    }
}

/// An uploaded binary asset
///
/// The owner is set by the store at creation from the authenticated
/// uploader; it is never taken from caller-supplied data. A file never
/// records which products bundle it; that edge lives on [`Product`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FileAsset {
    pub id: String,
    pub filename: String,
    pub mime_type: String,
    pub size_bytes: u64,
    pub user: Ref<User>,
    pub created_at: DateTime<Utc>,
}

impl HasId for FileAsset {
    fn id(&self) -> &str {
        &self.id
    }
}

/// A sellable listing bundling one or more file assets
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,

    /// Price in whole major currency units. `None` means not purchasable.
    #[serde(default)]
    pub price: Option<u64>,

    /// Owning seller
    pub user: Ref<User>,

    /// Files delivered on purchase
    #[serde(default)]
    pub product_files: Vec<Ref<FileAsset>>,

    pub created_at: DateTime<Utc>,
}

impl HasId for Product {
    fn id(&self) -> &str {
        &self.id
    }
}

/// A purchase attempt, paid or unpaid.
///
/// Created unpaid before the provider is contacted, flipped to paid exactly
/// once by the webhook processor, read-only thereafter. The product list and
/// the total it produced are never recomputed.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub user: Ref<User>,
    pub products: Vec<Ref<Product>>,
    pub is_paid: bool,
    pub created_at: DateTime<Utc>,
}

impl HasId for Order {
    fn id(&self) -> &str {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ref_deserializes_bare_id() {
        let r: Ref<User> = serde_json::from_str("\"user-1\"").unwrap();
        assert!(r.is_bare());
        assert_eq!(r.id(), "user-1");
        assert!(r.resolved().is_none());
    }

    #[test]
    fn test_ref_deserializes_resolved_document() {
        let json = serde_json::json!({
            "id": "user-1",
            "email": "seller@example.com",
            "role": "customer",
            "created_at": "2026-01-01T00:00:00Z",
        });
        let r: Ref<User> = serde_json::from_value(json).unwrap();
        assert!(!r.is_bare());
        assert_eq!(r.id(), "user-1");
        assert_eq!(r.resolved().unwrap().email, "seller@example.com");
    }

    #[test]
    fn test_ref_serializes_bare_id_as_string() {
        let r: Ref<User> = Ref::Id("user-9".into());
        assert_eq!(serde_json::to_string(&r).unwrap(), "\"user-9\"");
    }
}
