//! Payment Webhook Processing
//!
//! Consumes provider-pushed payment events. Only `charge.success` changes
//! state: the matching order's paid flag is flipped and a receipt goes out.
//! Everything else is acknowledged so the provider does not retry it.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use market_core::{DocumentStore, OrderFilter, UserFilter};

use crate::email::Mailer;
use crate::error::{PaymentError, Result};
use crate::receipt::receipt_email;

/// The only event type that triggers a state change
pub const CHARGE_SUCCESS: &str = "charge.success";

/// Resolution depth exposing order→product→file for receipt composition
const RECEIPT_DEPTH: u8 = 2;

/// A provider-pushed event, as received.
///
/// Everything is optional at the parse layer; the processor validates and
/// answers `InvalidPayload` for missing pieces rather than failing to parse.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProviderEvent {
    /// Event-type discriminator, e.g. `charge.success`
    #[serde(default)]
    pub event: Option<String>,

    #[serde(default)]
    pub data: Option<EventData>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EventData {
    #[serde(default)]
    pub metadata: Option<EventMetadata>,
}

/// Correlation metadata echoed back from session initiation
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EventMetadata {
    #[serde(rename = "orderId", default)]
    pub order_id: Option<String>,

    #[serde(rename = "userId", default)]
    pub user_id: Option<String>,
}

/// What processing an event amounted to
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// Event type carries no state change; acknowledged
    Ignored,

    /// Duplicate delivery for an order already paid; no receipt re-sent
    AlreadyPaid { order_id: String },

    /// Order marked paid and receipt delivered
    ReceiptSent { order_id: String, message_id: String },

    /// Order marked paid but the receipt could not be delivered.
    /// The paid transition stands; reporting this upstream lets the
    /// provider retry the webhook, which re-attempts only the mail.
    ReceiptFailed { order_id: String, error: String },
}

/// Payment callback processor
pub struct WebhookProcessor<S, M: ?Sized> {
    store: Arc<S>,
    mailer: Arc<M>,
}

impl<S: DocumentStore, M: Mailer + ?Sized> WebhookProcessor<S, M> {
    pub fn new(store: Arc<S>, mailer: Arc<M>) -> Self {
        Self { store, mailer }
    }

    /// Process a single provider event.
    ///
    /// Safe under duplicate delivery: the paid write is idempotent and an
    /// already-paid order short-circuits before the receipt is re-sent.
    pub async fn process(&self, event: ProviderEvent) -> Result<WebhookOutcome> {
        let Some(event_type) = event.event.as_deref().filter(|e| !e.is_empty()) else {
            return Err(PaymentError::InvalidPayload("missing event type".into()));
        };

        if event_type != CHARGE_SUCCESS {
            tracing::debug!(event_type, "ignoring provider event");
            return Ok(WebhookOutcome::Ignored);
        }

        let metadata = event
            .data
            .and_then(|d| d.metadata)
            .ok_or_else(|| PaymentError::InvalidPayload("no metadata in event".into()))?;
        let (Some(order_id), Some(user_id)) = (metadata.order_id, metadata.user_id) else {
            return Err(PaymentError::InvalidPayload(
                "no user or order in metadata".into(),
            ));
        };

        let users = self.store.find_users(UserFilter::id(&user_id)).await?;
        let Some(user) = users.into_iter().next() else {
            return Err(PaymentError::NotFound("user"));
        };

        let orders = self
            .store
            .find_orders(OrderFilter::id(&order_id), RECEIPT_DEPTH)
            .await?;
        let Some(order) = orders.into_iter().next() else {
            return Err(PaymentError::NotFound("order"));
        };

        if order.is_paid {
            tracing::info!(order_id = %order.id, "duplicate delivery for already-paid order");
            return Ok(WebhookOutcome::AlreadyPaid { order_id: order.id });
        }

        self.store.mark_order_paid(&order.id).await?;
        tracing::info!(order_id = %order.id, user_id = %user.id, "order marked paid");

        // Paid state is durable from here; mail failure must not undo it.
        let mail = receipt_email(&order, &user, Utc::now());
        match self.mailer.send(mail).await {
            Ok(message_id) => Ok(WebhookOutcome::ReceiptSent {
                order_id: order.id,
                message_id,
            }),
            Err(e) => {
                tracing::error!(order_id = %order.id, error = %e, "receipt delivery failed");
                Ok(WebhookOutcome::ReceiptFailed {
                    order_id: order.id,
                    error: e.to_string(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::email::MemoryMailer;
    use chrono::Utc;
    use market_core::{MemoryStore, Order, Product, Ref, Role, User};

    fn seeded() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        store.insert_user(User {
            id: "buyer".into(),
            email: "buyer@example.com".into(),
            role: Role::Customer,
            created_at: Utc::now(),
        });
        store.insert_product(Product {
            id: "p1".into(),
            name: "Icon pack".into(),
            description: None,
            price: Some(500),
            user: Ref::Id("seller".into()),
            product_files: vec![Ref::Id("f1".into())],
            created_at: Utc::now(),
        });
        store.insert_order(Order {
            id: "o1".into(),
            user: Ref::Id("buyer".into()),
            products: vec![Ref::Id("p1".into())],
            is_paid: false,
            created_at: Utc::now(),
        });
        store
    }

    fn success_event(order_id: Option<&str>, user_id: Option<&str>) -> ProviderEvent {
        ProviderEvent {
            event: Some(CHARGE_SUCCESS.into()),
            data: Some(EventData {
                metadata: Some(EventMetadata {
                    order_id: order_id.map(Into::into),
                    user_id: user_id.map(Into::into),
                }),
            }),
        }
    }

    async fn order_is_paid(store: &MemoryStore, order_id: &str) -> bool {
        store
            .find_orders(OrderFilter::id(order_id), 0)
            .await
            .unwrap()[0]
            .is_paid
    }

    #[tokio::test]
    async fn test_charge_success_marks_paid_and_sends_receipt() {
        let store = seeded();
        let mailer = Arc::new(MemoryMailer::new());
        let processor = WebhookProcessor::new(store.clone(), mailer.clone());

        let outcome = processor
            .process(success_event(Some("o1"), Some("buyer")))
            .await
            .unwrap();

        assert!(matches!(outcome, WebhookOutcome::ReceiptSent { .. }));
        assert!(order_is_paid(&store, "o1").await);

        let sent = mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "buyer@example.com");
        assert!(sent[0].html.contains("o1"));
        assert!(sent[0].html.contains("Icon pack"));
    }

    #[tokio::test]
    async fn test_duplicate_delivery_is_noop_and_sends_no_second_receipt() {
        let store = seeded();
        let mailer = Arc::new(MemoryMailer::new());
        let processor = WebhookProcessor::new(store.clone(), mailer.clone());

        let first = processor
            .process(success_event(Some("o1"), Some("buyer")))
            .await
            .unwrap();
        let second = processor
            .process(success_event(Some("o1"), Some("buyer")))
            .await
            .unwrap();

        assert!(matches!(first, WebhookOutcome::ReceiptSent { .. }));
        assert_eq!(
            second,
            WebhookOutcome::AlreadyPaid {
                order_id: "o1".into()
            }
        );
        assert!(order_is_paid(&store, "o1").await);
        assert_eq!(mailer.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_other_event_types_are_ignored_without_mutation() {
        let store = seeded();
        let processor = WebhookProcessor::new(store.clone(), Arc::new(MemoryMailer::new()));

        let outcome = processor
            .process(ProviderEvent {
                event: Some("charge.failed".into()),
                data: None,
            })
            .await
            .unwrap();

        assert_eq!(outcome, WebhookOutcome::Ignored);
        assert!(!order_is_paid(&store, "o1").await);
    }

    #[tokio::test]
    async fn test_missing_event_type_is_invalid_payload() {
        let store = seeded();
        let processor = WebhookProcessor::new(store.clone(), Arc::new(MemoryMailer::new()));

        let err = processor
            .process(ProviderEvent {
                event: None,
                data: None,
            })
            .await
            .unwrap_err();

        assert!(matches!(err, PaymentError::InvalidPayload(_)));
        assert!(!order_is_paid(&store, "o1").await);
    }

    #[tokio::test]
    async fn test_missing_order_id_is_invalid_payload_without_mutation() {
        let store = seeded();
        let processor = WebhookProcessor::new(store.clone(), Arc::new(MemoryMailer::new()));

        let err = processor
            .process(success_event(None, Some("buyer")))
            .await
            .unwrap_err();

        assert!(matches!(err, PaymentError::InvalidPayload(_)));
        assert!(!order_is_paid(&store, "o1").await);
    }

    #[tokio::test]
    async fn test_unknown_user_is_not_found() {
        let store = seeded();
        let processor = WebhookProcessor::new(store, Arc::new(MemoryMailer::new()));

        let err = processor
            .process(success_event(Some("o1"), Some("ghost")))
            .await
            .unwrap_err();
        assert!(matches!(err, PaymentError::NotFound("user")));
    }

    #[tokio::test]
    async fn test_unknown_order_is_not_found() {
        let store = seeded();
        let processor = WebhookProcessor::new(store, Arc::new(MemoryMailer::new()));

        let err = processor
            .process(success_event(Some("ghost"), Some("buyer")))
            .await
            .unwrap_err();
        assert!(matches!(err, PaymentError::NotFound("order")));
    }

    #[tokio::test]
    async fn test_mail_failure_keeps_paid_state() {
        let store = seeded();
        let processor = WebhookProcessor::new(store.clone(), Arc::new(MemoryMailer::failing()));

        let outcome = processor
            .process(success_event(Some("o1"), Some("buyer")))
            .await
            .unwrap();

        assert!(matches!(outcome, WebhookOutcome::ReceiptFailed { .. }));
        assert!(order_is_paid(&store, "o1").await);
    }

    #[test]
    fn test_event_parses_provider_json_shape() {
        let json = r#"{
            "event": "charge.success",
            "data": {"metadata": {"orderId": "o1", "userId": "u1"}}
        }"#;
        let event: ProviderEvent = serde_json::from_str(json).unwrap();
        let metadata = event.data.unwrap().metadata.unwrap();
        assert_eq!(event.event.as_deref(), Some("charge.success"));
        assert_eq!(metadata.order_id.as_deref(), Some("o1"));
        assert_eq!(metadata.user_id.as_deref(), Some("u1"));
    }
}
