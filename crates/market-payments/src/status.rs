//! Order Status Polling
//!
//! Read-only lookup of an order's paid flag, safe to call repeatedly from a
//! client waiting for the asynchronous payment confirmation to land.

use serde::Serialize;

use market_core::{DocumentStore, OrderFilter};

use crate::error::{PaymentError, Result};

/// Current payment state of an order
#[derive(Clone, Debug, Serialize)]
pub struct OrderStatus {
    pub order_id: String,
    pub is_paid: bool,
}

/// Look up whether an order has been paid
pub async fn poll_order_status<S: DocumentStore>(store: &S, order_id: &str) -> Result<OrderStatus> {
    let orders = store.find_orders(OrderFilter::id(order_id), 0).await?;
    let Some(order) = orders.into_iter().next() else {
        return Err(PaymentError::NotFound("order"));
    };

    Ok(OrderStatus {
        order_id: order.id,
        is_paid: order.is_paid,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use market_core::{MemoryStore, Order, Ref};

    #[tokio::test]
    async fn test_unknown_order_is_not_found() {
        let store = MemoryStore::new();
        let err = poll_order_status(&store, "ghost").await.unwrap_err();
        assert!(matches!(err, PaymentError::NotFound("order")));
    }

    #[tokio::test]
    async fn test_reports_current_paid_flag() {
        let store = MemoryStore::new();
        store.insert_order(Order {
            id: "o1".into(),
            user: Ref::Id("buyer".into()),
            products: vec![Ref::Id("p1".into())],
            is_paid: false,
            created_at: Utc::now(),
        });

        let status = poll_order_status(&store, "o1").await.unwrap();
        assert!(!status.is_paid);

        store.mark_order_paid("o1").await.unwrap();
        let status = poll_order_status(&store, "o1").await.unwrap();
        assert!(status.is_paid);
    }
}
