//! Request Authentication
//!
//! Resolves the bearer token to a marketplace user. Session machinery lives
//! outside this service; tokens are user identifiers resolved against the
//! users collection, and an absent or unknown token yields an anonymous
//! requester rather than a rejection. Individual handlers decide whether
//! anonymity is acceptable.

use axum::{extract::FromRequestParts, http::request::Parts, http::StatusCode, Json};

use market_core::{DocumentStore, User, UserFilter};

use crate::handlers::ErrorResponse;
use crate::state::AppState;

/// The authenticated user behind a request, if any
pub struct Requester(pub Option<User>);

impl FromRequestParts<AppState> for Requester {
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = bearer_token(parts) else {
            return Ok(Self(None));
        };

        let users = state
            .store
            .find_users(UserFilter::id(token))
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "user lookup failed during authentication");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse {
                        error: "An error occurred processing your request.".into(),
                        code: "STORE_ERROR".into(),
                    }),
                )
            })?;

        Ok(Self(users.into_iter().next()))
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(axum::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}
