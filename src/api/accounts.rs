//! Signup, login and logout, mounted once per role.
//!
//! - GET `/signup` - Describe the signup form, echoing any flash code
//! - POST `/signup` - Create an account for an allow-listed external ID
//! - GET `/login` - Describe the login form, echoing any flash code
//! - POST `/login` - Check credentials and issue both session cookies
//! - GET `/logout` - Clear both session cookies
//!
//! The external ID field is named after the role: `student_id` or
//! `lecturer_id`.

use axum::{
    Form, Json, Router,
    extract::{Query, State},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;

use super::error::{ApiError, validate_text};
use crate::accounts::{AccountError, Authenticator};
use crate::auth::cookie;
use crate::db::Role;
use crate::flash::Flash;
use crate::jwt::{JwtConfig, SessionIdentity, TokenClass};
use crate::rate_limit::{RateLimitConfig, rate_limit_auth};

const MAX_EXTERNAL_ID_LEN: usize = 50;
const MAX_USERNAME_LEN: usize = 50;
const MAX_PASSWORD_LEN: usize = 1024;

#[derive(Clone)]
pub struct AccountsState {
    pub role: Role,
    pub authenticator: Authenticator,
    pub jwt: Arc<JwtConfig>,
    pub secure_cookies: bool,
}

pub fn router(state: AccountsState, rate_limit: Arc<RateLimitConfig>) -> Router {
    // Only credential submissions count against the limit.
    let limit = middleware::from_fn_with_state(rate_limit, rate_limit_auth);

    Router::new()
        .route(
            "/signup",
            get(signup_page).merge(post(signup).layer(limit.clone())),
        )
        .route("/login", get(login_page).merge(post(login).layer(limit)))
        .route("/logout", get(logout))
        .with_state(state)
}

#[derive(Deserialize)]
struct FormPageQuery {
    flash: Option<String>,
}

/// What a renderer needs to draw a form.
#[derive(Serialize)]
struct FormPage {
    role: Role,
    action: &'static str,
    fields: Vec<&'static str>,
    flash: Option<String>,
}

async fn signup_page(
    State(state): State<AccountsState>,
    Query(query): Query<FormPageQuery>,
) -> Json<FormPage> {
    let role = state.role;
    Json(FormPage {
        role,
        action: role.signup_path(),
        fields: vec![role.id_field(), "username", "password"],
        flash: query.flash,
    })
}

async fn login_page(
    State(state): State<AccountsState>,
    Query(query): Query<FormPageQuery>,
) -> Json<FormPage> {
    let role = state.role;
    Json(FormPage {
        role,
        action: role.login_path(),
        fields: vec![role.id_field(), "password"],
        flash: query.flash,
    })
}

#[derive(Deserialize)]
struct SignupForm {
    student_id: Option<String>,
    lecturer_id: Option<String>,
    username: String,
    password: String,
}

#[derive(Deserialize)]
struct LoginForm {
    student_id: Option<String>,
    lecturer_id: Option<String>,
    password: String,
}

/// The external ID from the field named after `role`. The other role's
/// field is ignored.
fn role_external_id<'a>(
    role: Role,
    student_id: &'a Option<String>,
    lecturer_id: &'a Option<String>,
) -> Result<&'a str, ApiError> {
    let value = match role {
        Role::Student => student_id,
        Role::Lecturer => lecturer_id,
    };
    let value = value.as_deref().unwrap_or_default().trim();
    validate_text(role.id_field(), value, MAX_EXTERNAL_ID_LEN)?;
    Ok(value)
}

fn validate_password(password: &str) -> Result<(), ApiError> {
    if password.is_empty() {
        return Err(ApiError::bad_request("Password cannot be empty"));
    }
    if password.len() > MAX_PASSWORD_LEN {
        return Err(ApiError::bad_request("Password is too long"));
    }
    Ok(())
}

async fn signup(
    State(state): State<AccountsState>,
    Form(form): Form<SignupForm>,
) -> Result<Response, ApiError> {
    let role = state.role;
    let external_id = role_external_id(role, &form.student_id, &form.lecturer_id)?;
    let username = form.username.trim();
    validate_text("Username", username, MAX_USERNAME_LEN)?;
    validate_password(&form.password)?;

    match state
        .authenticator
        .signup(external_id, role, username, &form.password)
        .await
    {
        Ok(_) => Ok(Flash::SignupSuccessful.redirect(role.login_path()).into_response()),
        Err(AccountError::InvalidExternalId) => {
            Ok(Flash::InvalidExternalId.redirect(role.signup_path()).into_response())
        }
        Err(AccountError::DuplicateAccount) => {
            Ok(Flash::AccountExists.redirect(role.signup_path()).into_response())
        }
        Err(AccountError::Store(e)) => Err(ApiError::db_error("Failed to create account", e)),
        Err(e) => {
            error!(error = %e, "Failed to create account");
            Err(ApiError::internal("Failed to create account"))
        }
    }
}

async fn login(
    State(state): State<AccountsState>,
    Form(form): Form<LoginForm>,
) -> Result<Response, ApiError> {
    let role = state.role;
    let external_id = role_external_id(role, &form.student_id, &form.lecturer_id)?;
    validate_password(&form.password)?;

    let identity = match state
        .authenticator
        .login(external_id, role, &form.password)
        .await
    {
        Ok(identity) => identity,
        Err(AccountError::InvalidCredentials) => {
            return Ok(Flash::InvalidCredentials.redirect(role.login_path()).into_response());
        }
        Err(AccountError::Store(e)) => {
            return Err(ApiError::db_error("Failed to check credentials", e));
        }
        Err(e) => {
            error!(error = %e, "Failed to check credentials");
            return Err(ApiError::internal("Failed to check credentials"));
        }
    };

    let session = SessionIdentity {
        id: identity.id,
        role: identity.role,
    };
    let mint = |class| {
        state.jwt.mint(session, class).map_err(|e| {
            error!(error = %e, "Failed to mint session token");
            ApiError::internal("Failed to generate token")
        })
    };
    let access = mint(TokenClass::Access)?;
    let refresh = mint(TokenClass::Refresh)?;

    let mut response = Flash::LoginSuccessful
        .redirect(role.dashboard_path())
        .into_response();
    cookie::attach(
        response.headers_mut(),
        &access.token,
        &refresh.token,
        state.secure_cookies,
    );
    Ok(response)
}

/// Logout only clears the client's cookies. Tokens already issued stay valid
/// until they expire.
async fn logout(State(state): State<AccountsState>) -> Response {
    let mut response = Flash::LoggedOut
        .redirect(state.role.login_path())
        .into_response();
    cookie::clear(response.headers_mut(), state.secure_cookies);
    response
}
