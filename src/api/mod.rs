mod accounts;
mod error;
mod lecturer;
mod session;
mod student;

use axum::Router;
use std::sync::Arc;

use crate::accounts::Authenticator;
use crate::db::{Database, Role};
use crate::jwt::JwtConfig;
use crate::rate_limit::RateLimitConfig;

pub use error::ApiError;
pub use lecturer::STUDENTS_PER_PAGE;

/// Create the portal router: per-role account, view and record routes
/// plus the shared refresh endpoint.
pub fn create_router(
    db: Database,
    authenticator: Authenticator,
    jwt: Arc<JwtConfig>,
    secure_cookies: bool,
    rate_limit: Arc<RateLimitConfig>,
) -> Router {
    let accounts_state = |role| accounts::AccountsState {
        role,
        authenticator: authenticator.clone(),
        jwt: jwt.clone(),
        secure_cookies,
    };

    let student_routes = accounts::router(accounts_state(Role::Student), rate_limit.clone())
        .merge(student::router(student::StudentState {
            db: db.clone(),
            jwt: jwt.clone(),
        }));

    let lecturer_routes = accounts::router(accounts_state(Role::Lecturer), rate_limit)
        .merge(lecturer::router(lecturer::LecturerState {
            db,
            jwt: jwt.clone(),
        }));

    let session_state = session::SessionState {
        jwt,
        secure_cookies,
    };

    Router::new()
        .nest(Role::Student.path_prefix(), student_routes)
        .nest(Role::Lecturer.path_prefix(), lecturer_routes)
        .merge(session::router(session_state))
}
