//! Paystack Provider Client
//!
//! Speaks the provider's hosted-transaction API: initialize a transaction,
//! get back a checkout URL to redirect the buyer to, and verify the
//! HMAC-SHA512 signature the provider attaches to webhook pushes.

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha512;

use crate::error::{PaymentError, Result};

type HmacSha512 = Hmac<Sha512>;

const DEFAULT_BASE_URL: &str = "https://api.paystack.co";

/// Metadata attached to a transaction so the asynchronous callback can be
/// correlated back to the pending order
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TransactionMetadata {
    #[serde(rename = "orderId")]
    pub order_id: String,

    #[serde(rename = "userId")]
    pub user_id: String,
}

/// Request to open a hosted payment session
#[derive(Clone, Debug, Serialize)]
pub struct InitializeTransaction {
    /// Buyer email
    pub email: String,

    /// Amount in minor currency units (kobo/cents)
    pub amount: u64,

    /// Correlation metadata echoed back by the webhook
    pub metadata: TransactionMetadata,

    /// Browser redirect target after payment
    pub callback_url: String,
}

#[derive(Debug, Deserialize)]
struct InitializeResponse {
    data: InitializeData,
}

#[derive(Debug, Deserialize)]
struct InitializeData {
    authorization_url: String,
}

/// Outbound payment API seam.
///
/// The checkout service depends on this trait, not the concrete client, so
/// tests can exercise the degraded-provider path without a network.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Open a hosted payment session; returns the checkout URL
    async fn initialize_transaction(&self, request: InitializeTransaction) -> Result<String>;
}

/// Paystack client wrapper
pub struct PaystackClient {
    http: reqwest::Client,
    secret_key: String,
    base_url: String,
}

impl PaystackClient {
    /// Create a new client against the production gateway
    pub fn new(secret_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            secret_key: secret_key.into(),
            base_url: DEFAULT_BASE_URL.into(),
        }
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        let secret_key = std::env::var("PAYSTACK_SECRET_KEY")
            .map_err(|_| PaymentError::Config("PAYSTACK_SECRET_KEY not set".into()))?;
        Ok(Self::new(secret_key))
    }

    /// Point the client at a different gateway (tests)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Verify the `x-paystack-signature` header against the raw body.
    ///
    /// The provider signs with HMAC-SHA512 of the secret key; comparison is
    /// constant-time via `Mac::verify_slice`.
    pub fn verify_signature(&self, payload: &[u8], signature: &str) -> bool {
        let Ok(expected) = hex::decode(signature) else {
            return false;
        };
        let mut mac = HmacSha512::new_from_slice(self.secret_key.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(payload);
        mac.verify_slice(&expected).is_ok()
    }

    /// Compute the signature for a payload (test fixture helper)
    pub fn sign(&self, payload: &[u8]) -> String {
        let mut mac = HmacSha512::new_from_slice(self.secret_key.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(payload);
        hex::encode(mac.finalize().into_bytes())
    }
}

#[async_trait]
impl PaymentProvider for PaystackClient {
    async fn initialize_transaction(&self, request: InitializeTransaction) -> Result<String> {
        let url = format!("{}/transaction/initialize", self.base_url);

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.secret_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| PaymentError::Provider(e.to_string()))?;

        if !response.status().is_success() {
            return Err(PaymentError::Provider(format!(
                "transaction initialize returned {}",
                response.status()
            )));
        }

        let body: InitializeResponse = response
            .json()
            .await
            .map_err(|e| PaymentError::Provider(e.to_string()))?;

        Ok(body.data.authorization_url)
    }
}
