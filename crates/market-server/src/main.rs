//! rust-market HTTP Server
//!
//! Axum-based server for the digital-goods storefront: checkout initiation,
//! payment webhook reconciliation, order polling, and entitlement-gated
//! file reads.

mod auth;
mod handlers;
mod state;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use chrono::Utc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use market_access::EntitlementResolver;
use market_core::{FileAsset, MemoryStore, Product, Ref, Role, User};
use market_payments::{Mailer, MemoryMailer, PaystackClient, ResendMailer};

use crate::handlers::{
    create_checkout, get_file, health_check, order_status, paystack_webhook, upload_file,
};
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment
    dotenvy::dotenv().ok();

    // Document store; all shared state lives here
    let store = Arc::new(MemoryStore::new());
    if std::env::var("DEMO_SEED").is_ok() {
        seed_demo_data(&store);
        tracing::info!("✓ Demo data seeded (users: admin, seller, buyer)");
    }

    // Payment provider
    let paystack = PaystackClient::from_env().ok().map(Arc::new);
    if paystack.is_some() {
        tracing::info!("✓ Paystack configured");
    } else {
        tracing::warn!("⚠ Paystack not configured - payments disabled");
        tracing::warn!("  Set PAYSTACK_SECRET_KEY in .env");
    }

    // Receipt mailer; falls back to the in-memory mailer in development
    let mailer: Arc<dyn Mailer> = match ResendMailer::from_env() {
        Ok(resend) => {
            tracing::info!("✓ Resend configured");
            Arc::new(resend)
        }
        Err(_) => {
            tracing::warn!("⚠ Resend not configured - receipts kept in memory");
            tracing::warn!("  Set RESEND_API_KEY in .env");
            Arc::new(MemoryMailer::new())
        }
    };

    // Entitlement authority for the file-read path
    let authorizer = Arc::new(EntitlementResolver::new(store.clone()));

    let callback_url = std::env::var("CHECKOUT_CALLBACK_URL")
        .unwrap_or_else(|_| "http://localhost:3000/thank-you".into());

    // Build application state
    let state = AppState {
        store,
        paystack,
        mailer,
        authorizer,
        callback_url,
    };

    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build router
    let app = Router::new()
        // Health & info
        .route("/health", get(health_check))
        // Storefront API
        .route("/api/checkout", post(create_checkout))
        .route("/api/orders/{id}/status", get(order_status))
        .route("/api/files", post(upload_file))
        .route("/api/files/{id}", get(get_file))
        // Provider callback
        .route("/api/webhooks/paystack", post(paystack_webhook))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("rust-market server running on http://{}", addr);
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health                 - Health check");
    tracing::info!("  POST /api/checkout           - Start a payment session");
    tracing::info!("  GET  /api/orders/:id/status  - Poll an order's paid flag");
    tracing::info!("  POST /api/files              - Register an uploaded file");
    tracing::info!("  GET  /api/files/:id          - Read file metadata (entitlement-gated)");
    tracing::info!("  POST /api/webhooks/paystack  - Provider payment callback");

    axum::serve(listener, app).await?;

    Ok(())
}

/// Seed a minimal catalog so the API can be exercised out of the box
fn seed_demo_data(store: &MemoryStore) {
    let now = Utc::now();
    for (id, role) in [
        ("admin", Role::Admin),
        ("seller", Role::Customer),
        ("buyer", Role::Customer),
    ] {
        store.insert_user(User {
            id: id.into(),
            email: format!("{id}@example.com"),
            role,
            created_at: now,
        });
    }
    store.insert_file(FileAsset {
        id: "file-icons".into(),
        filename: "icons.zip".into(),
        mime_type: "application/zip".into(),
        size_bytes: 1_048_576,
        user: Ref::Id("seller".into()),
        created_at: now,
    });
    store.insert_product(Product {
        id: "product-icons".into(),
        name: "Vector icon pack".into(),
        description: Some("420 hand-drawn vector icons".into()),
        price: Some(500),
        user: Ref::Id("seller".into()),
        product_files: vec![Ref::Id("file-icons".into())],
        created_at: now,
    });
}
