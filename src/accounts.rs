//! Signup and login against the credential store.

use std::sync::Arc;

use tracing::{info, warn};

use crate::db::{Database, Identity, Role, is_unique_violation};
use crate::password::{PasswordError, hash_password, verify_absent, verify_password};
use crate::roster::Roster;

/// Errors from signup and login.
#[derive(Debug)]
pub enum AccountError {
    /// External ID is not on the allow-list for the requested role
    InvalidExternalId,
    /// External ID already has an account
    DuplicateAccount,
    /// Unknown external ID for this role, or wrong password
    InvalidCredentials,
    /// Credential store failure
    Store(sqlx::Error),
    /// Password hashing failure
    Hashing(PasswordError),
    /// The blocking hash task did not complete
    Task(tokio::task::JoinError),
}

impl std::fmt::Display for AccountError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AccountError::InvalidExternalId => write!(f, "External ID not allowed for this role"),
            AccountError::DuplicateAccount => write!(f, "Account already exists"),
            AccountError::InvalidCredentials => write!(f, "Invalid credentials"),
            AccountError::Store(e) => write!(f, "Credential store error: {}", e),
            AccountError::Hashing(e) => write!(f, "{}", e),
            AccountError::Task(e) => write!(f, "Password task failed: {}", e),
        }
    }
}

impl std::error::Error for AccountError {}

impl From<sqlx::Error> for AccountError {
    fn from(e: sqlx::Error) -> Self {
        AccountError::Store(e)
    }
}

/// Verifies credentials against the credential store.
#[derive(Clone)]
pub struct Authenticator {
    db: Database,
    roster: Arc<Roster>,
}

impl Authenticator {
    pub fn new(db: Database, roster: Arc<Roster>) -> Self {
        Self { db, roster }
    }

    /// Create an account for an allow-listed external ID.
    pub async fn signup(
        &self,
        external_id: &str,
        role: Role,
        username: &str,
        password: &str,
    ) -> Result<Identity, AccountError> {
        if !self.roster.allows(role, external_id) {
            return Err(AccountError::InvalidExternalId);
        }

        if self.db.users().external_id_exists(external_id).await? {
            return Err(AccountError::DuplicateAccount);
        }

        let password = password.to_owned();
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(AccountError::Task)?
            .map_err(AccountError::Hashing)?;

        // Two signups for the same ID can both pass the check above.
        let id = self
            .db
            .users()
            .create(external_id, role, username, &password_hash)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AccountError::DuplicateAccount
                } else {
                    AccountError::Store(e)
                }
            })?;

        info!(user_id = id, role = %role, "Account created");

        Ok(Identity {
            id,
            external_id: external_id.to_string(),
            role,
            username: username.to_string(),
        })
    }

    /// Check an external ID and password for the given role.
    /// An account registered under the other role never matches.
    pub async fn login(
        &self,
        external_id: &str,
        role: Role,
        password: &str,
    ) -> Result<Identity, AccountError> {
        let credentials = self.db.users().get_credentials(external_id, role).await?;

        // A miss pays for a hash check too, so timing does not reveal which
        // IDs have accounts.
        let password = password.to_owned();
        let stored_hash = credentials.as_ref().map(|c| c.password_hash.clone());
        let matches = tokio::task::spawn_blocking(move || match stored_hash {
            Some(hash) => verify_password(&password, &hash),
            None => verify_absent(&password),
        })
        .await
        .map_err(AccountError::Task)?;

        let Some(credentials) = credentials else {
            warn!(role = %role, "Login failed: no such account");
            return Err(AccountError::InvalidCredentials);
        };

        if !matches {
            warn!(user_id = credentials.identity.id, role = %role, "Login failed: wrong password");
            return Err(AccountError::InvalidCredentials);
        }

        info!(user_id = credentials.identity.id, role = %role, "Login succeeded");
        Ok(credentials.identity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn authenticator() -> Authenticator {
        let db = Database::open(":memory:").await.unwrap();
        let roster = Roster::new(["S1001", "S1002", "X1"], ["L2001", "X1"]);
        Authenticator::new(db, Arc::new(roster))
    }

    #[tokio::test]
    async fn test_signup_then_login() {
        let auth = authenticator().await;

        let created = auth
            .signup("S1001", Role::Student, "alice", "pw1")
            .await
            .unwrap();
        assert_eq!(created.id, 1);
        assert_eq!(created.role, Role::Student);

        let identity = auth.login("S1001", Role::Student, "pw1").await.unwrap();
        assert_eq!(identity, created);
    }

    #[tokio::test]
    async fn test_signup_rejects_id_from_other_roles_list() {
        let auth = authenticator().await;

        let err = auth
            .signup("L2001", Role::Student, "mallory", "pw")
            .await
            .unwrap_err();
        assert!(matches!(err, AccountError::InvalidExternalId));

        let err = auth
            .signup("S9999", Role::Student, "mallory", "pw")
            .await
            .unwrap_err();
        assert!(matches!(err, AccountError::InvalidExternalId));
    }

    #[tokio::test]
    async fn test_signup_duplicate() {
        let auth = authenticator().await;

        auth.signup("S1001", Role::Student, "alice", "pw1")
            .await
            .unwrap();
        let err = auth
            .signup("S1001", Role::Student, "alice2", "pw2")
            .await
            .unwrap_err();
        assert!(matches!(err, AccountError::DuplicateAccount));
    }

    #[tokio::test]
    async fn test_duplicate_across_roles() {
        let auth = authenticator().await;

        auth.signup("X1", Role::Student, "alice", "pw1")
            .await
            .unwrap();
        let err = auth
            .signup("X1", Role::Lecturer, "bob", "pw2")
            .await
            .unwrap_err();
        assert!(matches!(err, AccountError::DuplicateAccount));
    }

    #[tokio::test]
    async fn test_login_wrong_role_fails() {
        let auth = authenticator().await;

        auth.signup("X1", Role::Student, "alice", "pw1")
            .await
            .unwrap();

        let err = auth.login("X1", Role::Lecturer, "pw1").await.unwrap_err();
        assert!(matches!(err, AccountError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_login_wrong_password_fails() {
        let auth = authenticator().await;

        auth.signup("L2001", Role::Lecturer, "bob", "secret")
            .await
            .unwrap();

        let err = auth
            .login("L2001", Role::Lecturer, "Secret")
            .await
            .unwrap_err();
        assert!(matches!(err, AccountError::InvalidCredentials));

        let err = auth
            .login("L2002", Role::Lecturer, "secret")
            .await
            .unwrap_err();
        assert!(matches!(err, AccountError::InvalidCredentials));
    }
}
