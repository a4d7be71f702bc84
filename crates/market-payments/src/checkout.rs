//! Payment Session Initiation
//!
//! Validates a cart, records a pending order, and opens a hosted payment
//! session with the provider. The order is created before the provider is
//! contacted so an externally-caused failure never loses the monetary
//! record.

use std::sync::Arc;

use market_core::{DocumentStore, NewOrder, Product, ProductFilter, User};

use crate::error::{PaymentError, Result};
use crate::provider::{InitializeTransaction, PaymentProvider, TransactionMetadata};

/// Minor currency units per major unit (naira→kobo, dollar→cent)
pub const MINOR_UNIT_FACTOR: u64 = 100;

/// Outcome of opening a hosted session.
///
/// `ProviderUnavailable` is a degraded result, not an error: the pending
/// order exists and can be retried or reconciled later. Callers must decide
/// what to show the buyer in that case.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionOutcome {
    /// Redirect the buyer to this hosted checkout URL
    Redirect(String),

    /// The provider call failed; no checkout URL is available
    ProviderUnavailable,
}

impl SessionOutcome {
    /// The checkout URL, if payment could be started
    pub fn url(&self) -> Option<&str> {
        match self {
            SessionOutcome::Redirect(url) => Some(url),
            SessionOutcome::ProviderUnavailable => None,
        }
    }
}

/// Result of initiating a payment session
#[derive(Clone, Debug)]
pub struct CheckoutSession {
    /// The pending order recorded for this cart
    pub order_id: String,

    /// Whether a hosted session could be opened
    pub outcome: SessionOutcome,
}

/// Payment session initiator
pub struct CheckoutService<S, P> {
    store: Arc<S>,
    provider: Arc<P>,
}

impl<S: DocumentStore, P: PaymentProvider> CheckoutService<S, P> {
    pub fn new(store: Arc<S>, provider: Arc<P>) -> Self {
        Self { store, provider }
    }

    /// Initiate a payment session for a cart of products.
    ///
    /// Products with no price set are not purchasable and are dropped
    /// rather than failing the whole request. The total is computed in
    /// major units and passed downstream in minor units.
    pub async fn create_session(
        &self,
        user: &User,
        product_ids: &[String],
        callback_url: &str,
    ) -> Result<CheckoutSession> {
        if product_ids.is_empty() {
            return Err(PaymentError::InvalidRequest("product list is empty"));
        }

        let mut products = self
            .store
            .find_products(ProductFilter::id_in(product_ids.iter().cloned()), 0)
            .await?;
        products.sort_by_key(|p| product_ids.iter().position(|id| *id == p.id));

        let purchasable: Vec<Product> =
            products.into_iter().filter(|p| p.price.is_some()).collect();
        if purchasable.is_empty() {
            return Err(PaymentError::InvalidRequest(
                "no purchasable products in cart",
            ));
        }

        let total: u64 = purchasable.iter().filter_map(|p| p.price).sum();

        // Pending order first: a provider failure below must still leave an
        // auditable record.
        let order = self
            .store
            .create_order(NewOrder {
                user_id: user.id.clone(),
                product_ids: purchasable.into_iter().map(|p| p.id).collect(),
            })
            .await?;

        let request = InitializeTransaction {
            email: user.email.clone(),
            amount: total * MINOR_UNIT_FACTOR,
            metadata: TransactionMetadata {
                order_id: order.id.clone(),
                user_id: user.id.clone(),
            },
            callback_url: callback_url.to_string(),
        };

        match self.provider.initialize_transaction(request).await {
            Ok(url) => {
                tracing::info!(order_id = %order.id, "hosted payment session opened");
                Ok(CheckoutSession {
                    order_id: order.id,
                    outcome: SessionOutcome::Redirect(url),
                })
            }
            Err(e) => {
                tracing::error!(
                    order_id = %order.id,
                    error = %e,
                    "provider call failed; pending order kept for reconciliation"
                );
                Ok(CheckoutSession {
                    order_id: order.id,
                    outcome: SessionOutcome::ProviderUnavailable,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use market_core::{MemoryStore, OrderFilter, Ref, Role};
    use std::sync::Mutex;

    /// Records initialize requests and returns a fixed checkout URL
    struct StubProvider {
        requests: Mutex<Vec<InitializeTransaction>>,
    }

    impl StubProvider {
        fn new() -> Self {
            Self {
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl PaymentProvider for StubProvider {
        async fn initialize_transaction(&self, request: InitializeTransaction) -> Result<String> {
            self.requests.lock().unwrap().push(request);
            Ok("https://checkout.example/session-1".into())
        }
    }

    /// Always fails, simulating an unreachable provider
    struct DownProvider;

    #[async_trait]
    impl PaymentProvider for DownProvider {
        async fn initialize_transaction(&self, _request: InitializeTransaction) -> Result<String> {
            Err(PaymentError::Provider("connection refused".into()))
        }
    }

    fn buyer() -> User {
        User {
            id: "buyer".into(),
            email: "buyer@example.com".into(),
            role: Role::Customer,
            created_at: Utc::now(),
        }
    }

    fn seeded() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        store.insert_product(market_core::Product {
            id: "p1".into(),
            name: "Icon pack".into(),
            description: None,
            price: Some(500),
            user: Ref::Id("seller".into()),
            product_files: vec![Ref::Id("f1".into())],
            created_at: Utc::now(),
        });
        store.insert_product(market_core::Product {
            id: "p2".into(),
            name: "Unpriced draft".into(),
            description: None,
            price: None,
            user: Ref::Id("seller".into()),
            product_files: vec![],
            created_at: Utc::now(),
        });
        store
    }

    #[tokio::test]
    async fn test_empty_cart_is_rejected_without_an_order() {
        let store = seeded();
        let service = CheckoutService::new(store.clone(), Arc::new(StubProvider::new()));

        let err = service
            .create_session(&buyer(), &[], "https://shop.example/thank-you")
            .await
            .unwrap_err();
        assert!(matches!(err, PaymentError::InvalidRequest(_)));

        let orders = store.find_orders(OrderFilter::default(), 0).await.unwrap();
        assert!(orders.is_empty());
    }

    #[tokio::test]
    async fn test_unpriced_products_are_dropped_and_total_is_minor_units() {
        let store = seeded();
        let provider = Arc::new(StubProvider::new());
        let service = CheckoutService::new(store.clone(), provider.clone());

        let session = service
            .create_session(
                &buyer(),
                &["p1".into(), "p2".into()],
                "https://shop.example/thank-you",
            )
            .await
            .unwrap();

        assert_eq!(
            session.outcome.url(),
            Some("https://checkout.example/session-1")
        );

        let orders = store
            .find_orders(OrderFilter::id(&session.order_id), 0)
            .await
            .unwrap();
        let order = &orders[0];
        assert!(!order.is_paid);
        assert_eq!(order.products.len(), 1);
        assert_eq!(order.products[0].id(), "p1");

        let requests = provider.requests.lock().unwrap();
        assert_eq!(requests[0].amount, 500 * MINOR_UNIT_FACTOR);
        assert_eq!(requests[0].email, "buyer@example.com");
        assert_eq!(requests[0].metadata.order_id, session.order_id);
        assert_eq!(requests[0].metadata.user_id, "buyer");
    }

    #[tokio::test]
    async fn test_cart_of_only_unpriced_products_is_rejected() {
        let store = seeded();
        let service = CheckoutService::new(store.clone(), Arc::new(StubProvider::new()));

        let err = service
            .create_session(&buyer(), &["p2".into()], "https://shop.example/thank-you")
            .await
            .unwrap_err();
        assert!(matches!(err, PaymentError::InvalidRequest(_)));

        let orders = store.find_orders(OrderFilter::default(), 0).await.unwrap();
        assert!(orders.is_empty());
    }

    #[tokio::test]
    async fn test_provider_failure_degrades_but_keeps_pending_order() {
        let store = seeded();
        let service = CheckoutService::new(store.clone(), Arc::new(DownProvider));

        let session = service
            .create_session(&buyer(), &["p1".into()], "https://shop.example/thank-you")
            .await
            .unwrap();

        assert_eq!(session.outcome, SessionOutcome::ProviderUnavailable);
        assert_eq!(session.outcome.url(), None);

        let orders = store
            .find_orders(OrderFilter::id(&session.order_id), 0)
            .await
            .unwrap();
        assert_eq!(orders.len(), 1);
        assert!(!orders[0].is_paid);
    }
}
