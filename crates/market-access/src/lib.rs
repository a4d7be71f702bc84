//! # market-access
//!
//! File entitlement resolution: who may read which uploaded asset.
//!
//! A user may read a file when they own it (it is bundled by one of their
//! own products) or when they purchased it (it is bundled by a product
//! inside one of their paid orders). Admins read everything; anonymous
//! requesters read nothing.
//!
//! The storage read path consults [`Authorizer::can_read`] before executing
//! a file query and intersects the returned [`AccessFilter`] with the
//! request, keeping entitlement a pure, independently testable function
//! rather than a framework lifecycle hook.

pub mod error;
pub mod resolver;

pub use error::{AccessError, Result};
pub use resolver::{AccessFilter, Authorizer, EntitlementResolver};
