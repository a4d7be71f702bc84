//! Receipt Composition
//!
//! Builds the order-confirmation mail from the paid order: order id, date,
//! buyer email, and the product list. Product entries the store left as
//! bare identifiers are listed by id without a price.

use chrono::{DateTime, Utc};

use market_core::{Order, User};

use crate::email::OutboundMail;

const RECEIPT_FROM: &str = "Storefront Support <support@rust-market.dev>";
const RECEIPT_SUBJECT: &str = "Thanks for your order! This is your receipt.";

/// Compose the receipt mail for a paid order
pub fn receipt_email(order: &Order, buyer: &User, date: DateTime<Utc>) -> OutboundMail {
    let mut rows = String::new();
    for product_ref in &order.products {
        match product_ref.resolved() {
            Some(product) => {
                let price = product
                    .price
                    .map_or_else(|| "—".to_string(), |p| p.to_string());
                rows.push_str(&format!(
                    "<tr><td>{}</td><td>{}</td></tr>",
                    product.name, price
                ));
            }
            None => {
                rows.push_str(&format!(
                    "<tr><td>{}</td><td>—</td></tr>",
                    product_ref.id()
                ));
            }
        }
    }

    let html = format!(
        "<h1>Your receipt</h1>\
         <p>Order <strong>{order_id}</strong> placed on {date}.</p>\
         <table><tr><th>Product</th><th>Price</th></tr>{rows}</table>\
         <p>Files from this order are now available in your library.</p>",
        order_id = order.id,
        date = date.format("%Y-%m-%d"),
    );

    OutboundMail {
        from: RECEIPT_FROM.into(),
        to: buyer.email.clone(),
        subject: RECEIPT_SUBJECT.into(),
        html,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use market_core::{Product, Ref, Role};

    #[test]
    fn test_receipt_lists_products_and_order_id() {
        let buyer = User {
            id: "buyer".into(),
            email: "buyer@example.com".into(),
            role: Role::Customer,
            created_at: Utc::now(),
        };
        let product = Product {
            id: "p1".into(),
            name: "Icon pack".into(),
            description: None,
            price: Some(500),
            user: Ref::Id("seller".into()),
            product_files: vec![],
            created_at: Utc::now(),
        };
        let order = Order {
            id: "o1".into(),
            user: Ref::Id("buyer".into()),
            products: vec![Ref::Resolved(Box::new(product)), Ref::Id("p-gone".into())],
            is_paid: true,
            created_at: Utc::now(),
        };

        let mail = receipt_email(&order, &buyer, Utc::now());
        assert_eq!(mail.to, "buyer@example.com");
        assert!(mail.html.contains("o1"));
        assert!(mail.html.contains("Icon pack"));
        assert!(mail.html.contains("500"));
        // Bare entries are listed by id rather than dropped.
        assert!(mail.html.contains("p-gone"));
    }
}
