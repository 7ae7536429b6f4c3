// Credential store: users, roles, user-role links and refresh tokens

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use sqlx::{PgConnection, PgPool};

use crate::auth::{
    error::AuthError,
    models::{RefreshToken, RoleName, SystemRole, User, UserRole},
};

/// Hash a refresh token using SHA-256; only digests are persisted
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Persistence operations needed by the account service.
///
/// Implementations must enforce uniqueness of user email (case-insensitive),
/// role name, one role link per user and one refresh token per user.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Find a user by email (case-insensitive)
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AuthError>;

    async fn find_user_by_id(&self, id: i32) -> Result<Option<User>, AuthError>;

    /// Insert a user and link it to its default role as one unit.
    ///
    /// The role is Admin while no Admin role exists, otherwise User (created
    /// on first use). Either everything is stored or nothing is. A taken
    /// email yields `AuthError::EmailAlreadyExists`.
    async fn create_account(
        &self,
        full_name: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<(User, RoleName), AuthError>;

    /// The role link owned by a user
    async fn find_user_role(&self, user_id: i32) -> Result<Option<UserRole>, AuthError>;

    async fn find_role_by_id(&self, id: i32) -> Result<Option<SystemRole>, AuthError>;

    /// Find the record whose token matches the presented value
    async fn find_refresh_token(&self, token: &str) -> Result<Option<RefreshToken>, AuthError>;

    /// Insert the user's refresh token or overwrite the existing one
    async fn upsert_refresh_token(&self, user_id: i32, token: &str) -> Result<(), AuthError>;

    /// Overwrite the user's existing refresh token.
    /// Returns false when the user has no record to overwrite.
    async fn rotate_refresh_token(&self, user_id: i32, token: &str) -> Result<bool, AuthError>;
}

/// PostgreSQL-backed credential store
#[derive(Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

async fn find_role_by_name(
    conn: &mut PgConnection,
    name: &str,
) -> Result<Option<SystemRole>, sqlx::Error> {
    sqlx::query_as::<_, SystemRole>("SELECT id, name FROM system_roles WHERE name = $1")
        .bind(name)
        .fetch_optional(conn)
        .await
}

async fn insert_role(conn: &mut PgConnection, name: &str) -> Result<SystemRole, sqlx::Error> {
    sqlx::query_as::<_, SystemRole>("INSERT INTO system_roles (name) VALUES ($1) RETURNING id, name")
        .bind(name)
        .fetch_one(conn)
        .await
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AuthError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, full_name, email, password_hash, created_at FROM users WHERE LOWER(email) = LOWER($1)",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_user_by_id(&self, id: i32) -> Result<Option<User>, AuthError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, full_name, email, password_hash, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn create_account(
        &self,
        full_name: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<(User, RoleName), AuthError> {
        // Dropping the transaction on any early return rolls everything back
        let mut tx = self.pool.begin().await?;

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (full_name, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, full_name, email, password_hash, created_at
            "#,
        )
        .bind(full_name)
        .bind(email)
        .bind(password_hash)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AuthError::EmailAlreadyExists;
                }
            }
            AuthError::DatabaseError(e)
        })?;

        let (role, role_name) = match find_role_by_name(&mut *tx, RoleName::Admin.as_str()).await? {
            None => (
                insert_role(&mut *tx, RoleName::Admin.as_str()).await?,
                RoleName::Admin,
            ),
            Some(_) => match find_role_by_name(&mut *tx, RoleName::User.as_str()).await? {
                Some(role) => (role, RoleName::User),
                None => (
                    insert_role(&mut *tx, RoleName::User.as_str()).await?,
                    RoleName::User,
                ),
            },
        };

        sqlx::query("INSERT INTO user_roles (user_id, role_id) VALUES ($1, $2)")
            .bind(user.id)
            .bind(role.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok((user, role_name))
    }

    async fn find_user_role(&self, user_id: i32) -> Result<Option<UserRole>, AuthError> {
        let link = sqlx::query_as::<_, UserRole>(
            "SELECT id, user_id, role_id FROM user_roles WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(link)
    }

    async fn find_role_by_id(&self, id: i32) -> Result<Option<SystemRole>, AuthError> {
        let role = sqlx::query_as::<_, SystemRole>("SELECT id, name FROM system_roles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(role)
    }

    async fn find_refresh_token(&self, token: &str) -> Result<Option<RefreshToken>, AuthError> {
        let record = sqlx::query_as::<_, RefreshToken>(
            r#"
            SELECT id, user_id, token_hash, created_at, updated_at
            FROM refresh_tokens
            WHERE token_hash = $1
            "#,
        )
        .bind(hash_token(token))
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn upsert_refresh_token(&self, user_id: i32, token: &str) -> Result<(), AuthError> {
        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (user_id, token_hash)
            VALUES ($1, $2)
            ON CONFLICT (user_id)
            DO UPDATE SET
                token_hash = EXCLUDED.token_hash,
                updated_at = NOW()
            "#,
        )
        .bind(user_id)
        .bind(hash_token(token))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn rotate_refresh_token(&self, user_id: i32, token: &str) -> Result<bool, AuthError> {
        let result = sqlx::query(
            "UPDATE refresh_tokens SET token_hash = $1, updated_at = NOW() WHERE user_id = $2",
        )
        .bind(hash_token(token))
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_token_is_sha256_hex() {
        assert_eq!(
            hash_token("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_ne!(hash_token("abc"), hash_token("abd"));
    }
}
