//! Authenticated principal extraction.
//!
//! Every request reaches this service with an owner identity already
//! resolved by the gateway (JWT validation happens there, not here).
//! The identity crosses the trust boundary exactly once, through this
//! extractor; no component downstream re-derives it from raw headers.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::ApiError;

/// Header the gateway sets after validating the caller's token.
pub const PRINCIPAL_HEADER: &str = "x-principal-id";

/// A verified principal. The id is opaque to this service.
#[derive(Debug, Clone)]
pub struct AuthedUser {
    pub id: String,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(PRINCIPAL_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(|id| AuthedUser { id: id.to_string() })
            .ok_or_else(|| {
                ApiError::Unauthorized("request carries no resolved principal".to_string())
            })
    }
}
