use sqlx::sqlite::SqlitePool;

use super::Page;

#[derive(Clone)]
pub struct UserStore {
    pool: SqlitePool,
}

/// Portal role. Fixed at signup, never changed afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Lecturer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Lecturer => "lecturer",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "student" => Some(Role::Student),
            "lecturer" => Some(Role::Lecturer),
            _ => None,
        }
    }

    /// Name of the form field carrying the external ID.
    pub fn id_field(&self) -> &'static str {
        match self {
            Role::Student => "student_id",
            Role::Lecturer => "lecturer_id",
        }
    }

    /// Path the role's routes are nested under.
    pub fn path_prefix(&self) -> &'static str {
        match self {
            Role::Student => "/student",
            Role::Lecturer => "/lecturer",
        }
    }

    pub fn signup_path(&self) -> &'static str {
        match self {
            Role::Student => "/student/signup",
            Role::Lecturer => "/lecturer/signup",
        }
    }

    /// Path of the role's login page.
    pub fn login_path(&self) -> &'static str {
        match self {
            Role::Student => "/student/login",
            Role::Lecturer => "/lecturer/login",
        }
    }

    /// Landing page after login, and the target of wrong-role redirects.
    pub fn dashboard_path(&self) -> &'static str {
        match self {
            Role::Student => "/student/dashboard",
            Role::Lecturer => "/lecturer/dashboard",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Identity {
    pub id: i64,
    pub external_id: String,
    pub role: Role,
    pub username: String,
}

/// Identity plus its password hash. Only the authenticator reads this.
pub struct StoredCredentials {
    pub identity: Identity,
    pub password_hash: String,
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    external_id: String,
    role: String,
    username: String,
}

impl TryFrom<UserRow> for Identity {
    type Error = sqlx::Error;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = Role::parse(&row.role)
            .ok_or_else(|| sqlx::Error::Decode(format!("unknown role: {}", row.role).into()))?;
        Ok(Self {
            id: row.id,
            external_id: row.external_id,
            role,
            username: row.username,
        })
    }
}

#[derive(sqlx::FromRow)]
struct CredentialsRow {
    id: i64,
    external_id: String,
    role: String,
    username: String,
    password_hash: String,
}

impl UserStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new identity. Returns the assigned ID.
    /// Fails with a unique violation if the external ID is already taken.
    pub async fn create(
        &self,
        external_id: &str,
        role: Role,
        username: &str,
        password_hash: &str,
    ) -> Result<i64, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO users (external_id, role, username, password_hash) VALUES (?, ?, ?, ?)",
        )
        .bind(external_id)
        .bind(role.as_str())
        .bind(username)
        .bind(password_hash)
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    /// Check whether an external ID is used by any identity, regardless of role.
    pub async fn external_id_exists(&self, external_id: &str) -> Result<bool, sqlx::Error> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE external_id = ?")
            .bind(external_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count.0 > 0)
    }

    /// Get credentials for login. Filters on both external ID and role.
    pub async fn get_credentials(
        &self,
        external_id: &str,
        role: Role,
    ) -> Result<Option<StoredCredentials>, sqlx::Error> {
        let row: Option<CredentialsRow> = sqlx::query_as(
            "SELECT id, external_id, role, username, password_hash FROM users WHERE external_id = ? AND role = ?",
        )
        .bind(external_id)
        .bind(role.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| {
            let password_hash = row.password_hash;
            let identity = Identity::try_from(UserRow {
                id: row.id,
                external_id: row.external_id,
                role: row.role,
                username: row.username,
            })?;
            Ok(StoredCredentials {
                identity,
                password_hash,
            })
        })
        .transpose()
    }

    /// Get an identity by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Identity>, sqlx::Error> {
        let row: Option<UserRow> =
            sqlx::query_as("SELECT id, external_id, role, username FROM users WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        row.map(Identity::try_from).transpose()
    }

    /// Get an identity by ID, only if it has the given role.
    pub async fn get_by_id_and_role(
        &self,
        id: i64,
        role: Role,
    ) -> Result<Option<Identity>, sqlx::Error> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT id, external_id, role, username FROM users WHERE id = ? AND role = ?",
        )
        .bind(id)
        .bind(role.as_str())
        .fetch_optional(&self.pool)
        .await?;
        row.map(Identity::try_from).transpose()
    }

    /// List identities with the given role, ordered by ID. `page` is 1-based.
    pub async fn list_by_role(
        &self,
        role: Role,
        page: u32,
        per_page: u32,
    ) -> Result<Page<Identity>, sqlx::Error> {
        let page = page.max(1);
        let per_page = per_page.max(1);

        let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE role = ?")
            .bind(role.as_str())
            .fetch_one(&self.pool)
            .await?;

        let rows: Vec<UserRow> = sqlx::query_as(
            "SELECT id, external_id, role, username FROM users WHERE role = ? ORDER BY id LIMIT ? OFFSET ?",
        )
        .bind(role.as_str())
        .bind(i64::from(per_page))
        .bind(i64::from(page - 1) * i64::from(per_page))
        .fetch_all(&self.pool)
        .await?;

        let items = rows
            .into_iter()
            .map(Identity::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page::new(items, page, per_page, total.0.max(0) as u64))
    }

    /// Delete an identity by ID. Tokens already minted for it stay valid.
    pub async fn delete(&self, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// Whether a store error is a unique-constraint violation.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.is_unique_violation(),
        _ => false,
    }
}
