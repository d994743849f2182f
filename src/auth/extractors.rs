//! Axum extractors implementing the authorization gate.
//!
//! Every protected request is verified from scratch: extract the cookie for
//! the required token class, verify and decode it, check the class, then
//! (for role-restricted routes) check the role. Nothing is kept server-side.

use std::marker::PhantomData;

use axum::{extract::FromRequestParts, http::HeaderMap, http::request::Parts};
use tracing::debug;

use super::cookie;
use super::errors::{ApiAuthError, AuthErrorKind, PageAuthError};
use super::state::HasAuthBackend;
use super::types::AuthenticatedIdentity;
use crate::db::Role;
use crate::jwt::{JwtConfig, SessionAssertion, TokenClass};

/// Extract and verify the token of the given class.
pub fn authenticate(
    headers: &HeaderMap,
    jwt: &JwtConfig,
    class: TokenClass,
) -> Result<SessionAssertion, AuthErrorKind> {
    let Some(token) = cookie::extract(headers, class) else {
        debug!(class = class.as_str(), "No session cookie");
        return Err(AuthErrorKind::Unauthenticated);
    };

    let assertion = jwt.verify_and_decode(token).map_err(|e| {
        debug!(class = class.as_str(), error = %e, "Rejected session token");
        AuthErrorKind::Unauthenticated
    })?;

    if assertion.class != class {
        debug!(
            expected = class.as_str(),
            found = assertion.class.as_str(),
            "Session token of wrong class"
        );
        return Err(AuthErrorKind::Unauthenticated);
    }

    Ok(assertion)
}

/// Check the role of a verified assertion.
pub fn authorize(
    assertion: SessionAssertion,
    required: Role,
) -> Result<AuthenticatedIdentity, AuthErrorKind> {
    if assertion.role != required {
        debug!(
            user_id = assertion.id,
            role = %assertion.role,
            required = %required,
            "Role mismatch"
        );
        return Err(AuthErrorKind::Forbidden {
            role: assertion.role,
        });
    }
    Ok(AuthenticatedIdentity::from(assertion))
}

/// Role a page route requires.
pub trait RoleConstraint {
    const REQUIRED: Role;
}

/// Only students are admitted.
pub struct StudentOnly;

impl RoleConstraint for StudentOnly {
    const REQUIRED: Role = Role::Student;
}

/// Only lecturers are admitted.
pub struct LecturerOnly;

impl RoleConstraint for LecturerOnly {
    const REQUIRED: Role = Role::Lecturer;
}

/// Extractor for role-restricted page routes.
/// Requires a valid access token whose role matches `R`.
/// Unauthenticated callers are redirected to the login page for `R`,
/// callers with another role to their own dashboard.
pub struct Auth<R: RoleConstraint>(pub AuthenticatedIdentity, pub PhantomData<R>);

impl<S, R> FromRequestParts<S> for Auth<R>
where
    S: HasAuthBackend + Send + Sync,
    R: RoleConstraint + Send,
{
    type Rejection = PageAuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        authenticate(&parts.headers, state.jwt(), TokenClass::Access)
            .and_then(|assertion| authorize(assertion, R::REQUIRED))
            .map(|user| Auth(user, PhantomData))
            .map_err(|kind| PageAuthError {
                kind,
                required: R::REQUIRED,
            })
    }
}

/// Extractor for the refresh endpoint.
/// Requires a valid refresh token of any role. Returns JSON errors.
pub struct RefreshAuth(pub AuthenticatedIdentity);

impl<S> FromRequestParts<S> for RefreshAuth
where
    S: HasAuthBackend + Send + Sync,
{
    type Rejection = ApiAuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        authenticate(&parts.headers, state.jwt(), TokenClass::Refresh)
            .map(|assertion| RefreshAuth(AuthenticatedIdentity::from(assertion)))
            .map_err(|_| ApiAuthError)
    }
}
