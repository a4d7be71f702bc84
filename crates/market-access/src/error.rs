//! Entitlement Error Types

use thiserror::Error;

/// Result type alias for entitlement resolution
pub type Result<T> = std::result::Result<T, AccessError>;

/// Entitlement resolution errors.
///
/// Malformed or under-resolved relationship data is never an error here; it
/// is logged and skipped so the rest of the request stays resolvable. Only
/// store failures abort resolution.
#[derive(Error, Debug)]
pub enum AccessError {
    /// The backing store failed
    #[error(transparent)]
    Store(#[from] market_core::StoreError),
}
