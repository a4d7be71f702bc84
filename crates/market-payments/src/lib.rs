//! # market-payments
//!
//! Payment session initiation and webhook reconciliation for the
//! marketplace.
//!
//! ## Flow
//!
//! ```text
//! ┌─────────────┐     ┌──────────────────┐     ┌─────────────┐
//! │   Client    │────▶│  CheckoutService │────▶│   Provider  │
//! │   (cart)    │     │  (pending order) │     │   (hosted)  │
//! └─────────────┘     └──────────────────┘     └──────┬──────┘
//!                                                     │ async push
//! ┌─────────────┐     ┌──────────────────┐     ┌──────▼──────┐
//! │   Client    │◀────│ poll_order_status│     │   Webhook   │
//! │  (waiting)  │     │   (read-only)    │◀────│  Processor  │
//! └─────────────┘     └──────────────────┘     └─────────────┘
//! ```
//!
//! The pending order is created **before** the provider is contacted, so a
//! provider outage leaves an auditable record instead of losing the
//! purchase. The webhook processor correlates the asynchronous
//! `charge.success` push back to that order through the session metadata and
//! flips `is_paid` exactly once; the flag write is idempotent, so the
//! provider's retry behavior needs no locking on our side.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use market_payments::{CheckoutService, PaystackClient};
//!
//! let provider = Arc::new(PaystackClient::from_env()?);
//! let checkout = CheckoutService::new(store, provider);
//!
//! let session = checkout
//!     .create_session(&user, &product_ids, "https://shop.example/thank-you")
//!     .await?;
//!
//! // Redirect the buyer to session.outcome.url(), or report that payment
//! // could not be started when the provider was unavailable.
//! ```

pub mod checkout;
pub mod email;
pub mod error;
pub mod provider;
pub mod receipt;
pub mod status;
pub mod webhook;

pub use checkout::{CheckoutService, CheckoutSession, SessionOutcome, MINOR_UNIT_FACTOR};
pub use email::{Mailer, MemoryMailer, OutboundMail, ResendMailer};
pub use error::{PaymentError, Result};
pub use provider::{
    InitializeTransaction, PaymentProvider, PaystackClient, TransactionMetadata,
};
pub use status::{poll_order_status, OrderStatus};
pub use webhook::{EventData, EventMetadata, ProviderEvent, WebhookOutcome, WebhookProcessor};
