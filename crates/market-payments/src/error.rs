//! Payment Error Types

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, PaymentError>;

/// Payment-related errors
#[derive(Error, Debug)]
pub enum PaymentError {
    /// Empty or malformed caller input
    #[error("invalid request: {0}")]
    InvalidRequest(&'static str),

    /// Malformed webhook body
    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    /// Unknown user or order
    #[error("no such {0} exists")]
    NotFound(&'static str),

    /// Payment provider call failed
    #[error("provider error: {0}")]
    Provider(String),

    /// Receipt delivery failed; prior state changes stand
    #[error("delivery error: {0}")]
    Delivery(String),

    /// Backing store failure, fatal to the current operation
    #[error(transparent)]
    Store(#[from] market_core::StoreError),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

impl PaymentError {
    /// Get user-friendly message
    pub fn user_message(&self) -> &str {
        match self {
            PaymentError::InvalidRequest(_) => "Your cart could not be processed.",
            PaymentError::InvalidPayload(_) => "Invalid webhook data.",
            PaymentError::NotFound("user") => "No such user exists.",
            PaymentError::NotFound(_) => "No such order exists.",
            PaymentError::Provider(_) => "Payment could not be started. Please try again.",
            PaymentError::Delivery(_) => "Your receipt could not be sent.",
            PaymentError::Config(_) => "Service configuration error.",
            PaymentError::Store(_) => "An error occurred processing your request.",
        }
    }
}
