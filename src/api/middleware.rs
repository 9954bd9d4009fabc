use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use std::sync::Arc;

use crate::api::response::ApiError;
use crate::identity::IdentityError;
use crate::AppState;

/// Access token of the authenticated request, available to handlers as an extension.
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

/// Reject requests without a resolvable `Authorization: Bearer <token>` header.
///
/// Header shape is checked before the identity provider is consulted. On success
/// the resolved [`crate::identity::UserHandle`] and the [`BearerToken`] are
/// attached to the request extensions.
pub async fn require_bearer(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(request.headers())?;

    let user = state
        .identity
        .get_user(&token)
        .await
        .map_err(|e| match e {
            IdentityError::Backend(_) => ApiError::from(e),
            _ => ApiError::unauthorized("Invalid token"),
        })?;

    tracing::trace!(user_id = %user.id, "Authenticated request");
    request.extensions_mut().insert(user);
    request.extensions_mut().insert(BearerToken(token));
    Ok(next.run(request).await)
}

/// Extract the token from an `Authorization` header of exactly the form `Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Result<String, ApiError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| ApiError::unauthorized("Authorization header is required"))?
        .to_str()
        .map_err(|_| ApiError::unauthorized("Invalid authorization header format"))?;

    match value.split(' ').collect::<Vec<_>>().as_slice() {
        ["Bearer", token] if !token.is_empty() => Ok(token.to_string()),
        _ => Err(ApiError::unauthorized("Invalid authorization header format")),
    }
}
