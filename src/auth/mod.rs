//! Cookie-carried JWT sessions with role-based access control.
//!
//! Dual-token system: short-lived access tokens sent with every request and
//! long-lived refresh tokens sent only to the refresh endpoint. Both are
//! stateless; there is no server-side revocation.

pub mod cookie;
mod errors;
mod extractors;
mod ip;
mod state;
mod types;

pub use cookie::{
    ACCESS_COOKIE_NAME, ACCESS_COOKIE_PATH, REFRESH_COOKIE_NAME, REFRESH_COOKIE_PATH, get_cookie,
};
pub use errors::{ApiAuthError, AuthErrorKind, PageAuthError};
pub use extractors::{
    Auth, LecturerOnly, RefreshAuth, RoleConstraint, StudentOnly, authenticate, authorize,
};
pub use ip::extract_client_ip;
pub use state::HasAuthBackend;
pub use types::AuthenticatedIdentity;
