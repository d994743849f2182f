//! Authentication error types.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Serialize;

use crate::db::Role;
use crate::flash::Flash;

/// Outcome of a rejected request, as seen by the gate.
/// Token failure details collapse into `Unauthenticated`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthErrorKind {
    /// Missing, malformed, forged, expired, or wrong-class token
    Unauthenticated,
    /// Valid token, wrong role. Carries the caller's actual role.
    Forbidden { role: Role },
}

/// Rejection for page routes: always a redirect, never an error page.
#[derive(Debug)]
pub struct PageAuthError {
    pub kind: AuthErrorKind,
    /// Role the route requires; its login page receives unauthenticated callers.
    pub required: Role,
}

impl IntoResponse for PageAuthError {
    fn into_response(self) -> Response {
        match self.kind {
            AuthErrorKind::Unauthenticated => Redirect::to(self.required.login_path()).into_response(),
            AuthErrorKind::Forbidden { role } => {
                Flash::AccessDenied.redirect(role.dashboard_path()).into_response()
            }
        }
    }
}

/// Rejection for the refresh endpoint (JSON body). Refresh has no role
/// check, so the only failure is an unusable token.
#[derive(Debug)]
pub struct ApiAuthError;

impl IntoResponse for ApiAuthError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            error: &'static str,
        }

        (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse {
                error: "Not authenticated",
            }),
        )
            .into_response()
    }
}
