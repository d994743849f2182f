//! Access token refresh.
//!
//! - POST `/refresh` - Exchange the refresh cookie for a new access cookie

use axum::{
    Json, Router,
    extract::State,
    response::{IntoResponse, Response},
    routing::post,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info};

use super::error::ApiError;
use crate::auth::{RefreshAuth, cookie};
use crate::impl_has_auth_backend;
use crate::jwt::{JwtConfig, TokenClass};

#[derive(Clone)]
pub struct SessionState {
    pub jwt: Arc<JwtConfig>,
    pub secure_cookies: bool,
}

impl_has_auth_backend!(SessionState);

pub fn router(state: SessionState) -> Router {
    Router::new()
        .route("/refresh", post(refresh))
        .with_state(state)
}

#[derive(Serialize)]
struct RefreshResponse {
    msg: &'static str,
}

/// Mint a new access token from the identity in the refresh token.
/// The refresh token itself is not rotated, and the identity is not
/// re-checked against the store.
async fn refresh(
    State(state): State<SessionState>,
    RefreshAuth(user): RefreshAuth,
) -> Result<Response, ApiError> {
    let access = state
        .jwt
        .mint(user.session_identity(), TokenClass::Access)
        .map_err(|e| {
            error!(error = %e, "Failed to mint access token");
            ApiError::internal("Failed to generate token")
        })?;

    info!(user_id = user.id, role = %user.role, "Access token refreshed");

    let mut response = Json(RefreshResponse {
        msg: "Access token refreshed",
    })
    .into_response();
    cookie::attach_access(response.headers_mut(), &access.token, state.secure_cookies);
    Ok(response)
}
