//! Application State

use std::sync::Arc;

use market_access::Authorizer;
use market_core::MemoryStore;
use market_payments::{Mailer, PaystackClient};

/// Shared application state
///
/// Every handle is constructed in `main` and passed in; nothing here is an
/// ambient singleton.
#[derive(Clone)]
pub struct AppState {
    /// Document store backing all collections
    pub store: Arc<MemoryStore>,

    /// Payment provider client (None if not configured)
    pub paystack: Option<Arc<PaystackClient>>,

    /// Receipt mailer
    pub mailer: Arc<dyn Mailer>,

    /// Entitlement authority consulted by the file-read path
    pub authorizer: Arc<dyn Authorizer>,

    /// Browser redirect target passed to the provider at checkout
    pub callback_url: String,
}
