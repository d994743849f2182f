//! Authentication identity types.

use crate::db::Role;
use crate::jwt::{SessionAssertion, SessionIdentity};

/// Verified identity handed to admitted handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedIdentity {
    /// Identity ID from the token
    pub id: i64,
    /// Role from the token
    pub role: Role,
    /// The full decoded token
    pub assertion: SessionAssertion,
}

impl AuthenticatedIdentity {
    pub fn session_identity(&self) -> SessionIdentity {
        self.assertion.identity()
    }
}

impl From<SessionAssertion> for AuthenticatedIdentity {
    fn from(assertion: SessionAssertion) -> Self {
        Self {
            id: assertion.id,
            role: assertion.role,
            assertion,
        }
    }
}
