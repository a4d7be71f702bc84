//! Store Error Types

use thiserror::Error;

/// Result type alias for store operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// Document-store errors
///
/// A store failure is fatal to the operation that issued it and propagates
/// unmodified; callers never see partial result sets.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Store unreachable or query failed
    #[error("store unavailable: {0}")]
    Unavailable(String),
}
