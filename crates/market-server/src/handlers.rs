//! HTTP Handlers

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use market_core::{DocumentStore, FileAsset, FileFilter, NewFileAsset};
use market_payments::{
    poll_order_status, CheckoutService, OrderStatus, PaymentError, ProviderEvent, WebhookOutcome,
    WebhookProcessor,
};

use crate::auth::Requester;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub paystack_configured: bool,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub product_ids: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub order_id: String,

    /// Hosted checkout URL; null when the provider was unavailable and
    /// payment could not be started
    pub checkout_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UploadFileRequest {
    pub filename: String,
    pub mime_type: String,
    pub size_bytes: u64,
}

type HandlerError = (StatusCode, Json<ErrorResponse>);

fn error_response(status: StatusCode, code: &str, message: impl Into<String>) -> HandlerError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
            code: code.into(),
        }),
    )
}

fn unauthenticated() -> HandlerError {
    error_response(
        StatusCode::UNAUTHORIZED,
        "UNAUTHENTICATED",
        "Sign in to continue.",
    )
}

fn payment_error(e: &PaymentError) -> HandlerError {
    let (status, code) = match e {
        PaymentError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST"),
        PaymentError::InvalidPayload(_) => (StatusCode::BAD_REQUEST, "INVALID_PAYLOAD"),
        PaymentError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
        PaymentError::Provider(_) => (StatusCode::BAD_GATEWAY, "PROVIDER_ERROR"),
        PaymentError::Delivery(_) => (StatusCode::INTERNAL_SERVER_ERROR, "DELIVERY_ERROR"),
        PaymentError::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, "STORE_ERROR"),
        PaymentError::Config(_) => (StatusCode::SERVICE_UNAVAILABLE, "CONFIG_ERROR"),
    };
    error_response(status, code, e.user_message())
}

fn store_error(e: &market_core::StoreError) -> HandlerError {
    tracing::error!(error = %e, "store failure");
    error_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        "STORE_ERROR",
        "An error occurred processing your request.",
    )
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        paystack_configured: state.paystack.is_some(),
    })
}

/// Initiate a payment session for the authenticated user's cart
pub async fn create_checkout(
    State(state): State<AppState>,
    Requester(user): Requester,
    Json(payload): Json<CheckoutRequest>,
) -> Result<(StatusCode, Json<CheckoutResponse>), HandlerError> {
    let Some(user) = user else {
        return Err(unauthenticated());
    };
    let Some(paystack) = state.paystack.clone() else {
        return Err(error_response(
            StatusCode::SERVICE_UNAVAILABLE,
            "PAYMENTS_DISABLED",
            "Payments not configured",
        ));
    };

    let service = CheckoutService::new(state.store.clone(), paystack);
    let session = service
        .create_session(&user, &payload.product_ids, &state.callback_url)
        .await
        .map_err(|e| payment_error(&e))?;

    Ok((
        StatusCode::CREATED,
        Json(CheckoutResponse {
            checkout_url: session.outcome.url().map(Into::into),
            order_id: session.order_id,
        }),
    ))
}

/// Poll an order's paid flag
pub async fn order_status(
    State(state): State<AppState>,
    Requester(user): Requester,
    Path(order_id): Path<String>,
) -> Result<Json<OrderStatus>, HandlerError> {
    if user.is_none() {
        return Err(unauthenticated());
    }

    let status = poll_order_status(state.store.as_ref(), &order_id)
        .await
        .map_err(|e| payment_error(&e))?;

    Ok(Json(status))
}

/// Paystack webhook handler
pub async fn paystack_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Response {
    let Some(paystack) = state.paystack.as_ref() else {
        return error_response(
            StatusCode::SERVICE_UNAVAILABLE,
            "PAYMENTS_DISABLED",
            "Payments not configured",
        )
        .into_response();
    };

    let signature = headers
        .get("x-paystack-signature")
        .and_then(|v| v.to_str().ok());
    let verified = signature.is_some_and(|sig| paystack.verify_signature(body.as_bytes(), sig));
    if !verified {
        tracing::warn!("webhook rejected: missing or invalid signature");
        return error_response(
            StatusCode::UNAUTHORIZED,
            "INVALID_SIGNATURE",
            "Invalid signature",
        )
        .into_response();
    }

    let event: ProviderEvent = match serde_json::from_str(&body) {
        Ok(event) => event,
        Err(e) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                "INVALID_PAYLOAD",
                format!("Invalid webhook data: {e}"),
            )
            .into_response();
        }
    };

    let processor = WebhookProcessor::new(state.store.clone(), state.mailer.clone());
    match processor.process(event).await {
        Ok(WebhookOutcome::ReceiptSent {
            order_id,
            message_id,
        }) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "data": {"order_id": order_id, "message_id": message_id}
            })),
        )
            .into_response(),

        // Paid state already stands; a non-2xx tells the provider to retry,
        // which re-attempts only the mail.
        Ok(WebhookOutcome::ReceiptFailed { error, .. }) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({"error": error})),
        )
            .into_response(),

        Ok(WebhookOutcome::Ignored | WebhookOutcome::AlreadyPaid { .. }) => {
            StatusCode::OK.into_response()
        }

        Err(e) => payment_error(&e).into_response(),
    }
}

/// Register an uploaded file; the owner is always the authenticated
/// uploader, never caller-supplied data
pub async fn upload_file(
    State(state): State<AppState>,
    Requester(user): Requester,
    Json(payload): Json<UploadFileRequest>,
) -> Result<(StatusCode, Json<FileAsset>), HandlerError> {
    let Some(user) = user else {
        return Err(unauthenticated());
    };

    let created = state
        .store
        .create_file(
            NewFileAsset {
                filename: payload.filename,
                mime_type: payload.mime_type,
                size_bytes: payload.size_bytes,
            },
            &user.id,
        )
        .await
        .map_err(|e| store_error(&e))?;

    Ok((StatusCode::CREATED, Json(created)))
}

/// Read file metadata, gated by the entitlement filter.
///
/// A file outside the requester's filter answers 404, the same as a file
/// that does not exist.
pub async fn get_file(
    State(state): State<AppState>,
    Requester(user): Requester,
    Path(file_id): Path<String>,
) -> Result<Json<FileAsset>, HandlerError> {
    let filter = state
        .authorizer
        .can_read(user.as_ref())
        .await
        .map_err(|e| match e {
            market_access::AccessError::Store(inner) => store_error(&inner),
        })?;

    if !filter.allows(&file_id) {
        return Err(error_response(
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "No such file exists.",
        ));
    }

    let files = state
        .store
        .find_files(FileFilter::id(&file_id))
        .await
        .map_err(|e| store_error(&e))?;

    match files.into_iter().next() {
        Some(file) => Ok(Json(file)),
        None => Err(error_response(
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "No such file exists.",
        )),
    }
}
