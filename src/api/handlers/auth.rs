use axum::extract::State;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::api::middleware::BearerToken;
use crate::api::response::{ApiError, AppJson};
use crate::AppState;

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct SignUpRequest {
    pub username: String,
    pub password: String,
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct ConfirmRequest {
    pub username: String,
    #[serde(default)]
    pub code: String,
}

#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct SignUpResponse {
    pub message: String,
    pub user_id: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct SignInResponse {
    pub access_token: String,
    pub id_token: String,
}

// ============================================================================
// Handlers
// ============================================================================

pub async fn sign_up(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<SignUpRequest>,
) -> Result<Json<SignUpResponse>, ApiError> {
    if req.username.trim().is_empty() || req.password.is_empty() || req.email.trim().is_empty() {
        return Err(ApiError::bad_request(
            "username, password and email must not be empty",
        ));
    }

    let user = state
        .identity
        .sign_up(&req.username, &req.password, &req.email)
        .await?;

    Ok(Json(SignUpResponse {
        message: "User registered successfully. Please check your email for confirmation code."
            .to_string(),
        user_id: user.username,
    }))
}

pub async fn confirm_sign_up(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<ConfirmRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    state
        .identity
        .confirm_sign_up(&req.username, &req.code)
        .await?;

    Ok(Json(MessageResponse {
        message: "Email confirmed successfully. You can now sign in.".to_string(),
    }))
}

pub async fn sign_in(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<SignInRequest>,
) -> Result<Json<SignInResponse>, ApiError> {
    let tokens = state
        .identity
        .sign_in(&req.username, &req.password)
        .await
        .map_err(|e| {
            tracing::debug!(username = %req.username, error = %e, "Sign-in rejected");
            ApiError::from(e)
        })?;

    Ok(Json(SignInResponse {
        access_token: tokens.access_token,
        id_token: tokens.id_token,
    }))
}

pub async fn sign_out(
    State(state): State<Arc<AppState>>,
    Extension(BearerToken(token)): Extension<BearerToken>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.identity.sign_out(&token).await?;

    Ok(Json(MessageResponse {
        message: "Signed out successfully.".to_string(),
    }))
}
