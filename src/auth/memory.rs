// In-memory credential store used by the service and HTTP tests

use async_trait::async_trait;
use chrono::Utc;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Mutex, MutexGuard,
};

use crate::auth::{
    error::AuthError,
    models::{RefreshToken, RoleName, SystemRole, User, UserRole},
    repository::{hash_token, CredentialStore},
};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    roles: Vec<SystemRole>,
    user_roles: Vec<UserRole>,
    refresh_tokens: Vec<RefreshToken>,
}

/// Credential store keeping every table in a `Vec` behind a mutex.
/// Mirrors the uniqueness constraints of the PostgreSQL schema.
#[derive(Default)]
pub struct InMemoryCredentialStore {
    tables: Mutex<Tables>,
    fail_next_role_link: AtomicBool,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        // A poisoned lock only means another test thread panicked mid-write
        self.tables.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn roles(&self) -> Vec<SystemRole> {
        self.tables().roles.clone()
    }

    pub fn user_roles(&self) -> Vec<UserRole> {
        self.tables().user_roles.clone()
    }

    pub fn refresh_tokens(&self) -> Vec<RefreshToken> {
        self.tables().refresh_tokens.clone()
    }

    /// Remove a role definition, leaving dangling links behind
    pub fn delete_role(&self, name: &str) {
        self.tables().roles.retain(|role| role.name != name);
    }

    /// Remove a user, leaving their links and tokens behind
    pub fn delete_user(&self, user_id: i32) {
        self.tables().users.retain(|u| u.id != user_id);
    }

    /// Remove a user's refresh token, as a logout would
    pub fn delete_refresh_token_for_user(&self, user_id: i32) {
        self.tables().refresh_tokens.retain(|t| t.user_id != user_id);
    }

    pub fn users(&self) -> Vec<User> {
        self.tables().users.clone()
    }

    /// Insert a user with no role link
    pub fn insert_user_without_role(&self, full_name: &str, email: &str, password_hash: &str) {
        let mut tables = self.tables();
        let user = User {
            id: next_id(tables.users.iter().map(|u| u.id).max()),
            full_name: full_name.to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            created_at: Utc::now(),
        };
        tables.users.push(user);
    }

    /// Make the next `create_account` fail at the role-link step
    pub fn fail_next_role_link(&self) {
        self.fail_next_role_link.store(true, Ordering::SeqCst);
    }
}

fn unique_violation(what: &str) -> AuthError {
    AuthError::DatabaseError(sqlx::Error::Protocol(format!(
        "duplicate key value violates unique constraint on {}",
        what
    )))
}

fn next_id(max: Option<i32>) -> i32 {
    max.unwrap_or(0) + 1
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AuthError> {
        let tables = self.tables();
        Ok(tables
            .users
            .iter()
            .find(|u| u.email.to_lowercase() == email.to_lowercase())
            .cloned())
    }

    async fn find_user_by_id(&self, id: i32) -> Result<Option<User>, AuthError> {
        Ok(self.tables().users.iter().find(|u| u.id == id).cloned())
    }

    async fn create_account(
        &self,
        full_name: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<(User, RoleName), AuthError> {
        // One lock for the whole unit; every check runs before anything is written
        let mut tables = self.tables();
        if tables
            .users
            .iter()
            .any(|u| u.email.to_lowercase() == email.to_lowercase())
        {
            return Err(AuthError::EmailAlreadyExists);
        }

        let role_name = if tables.roles.iter().any(|r| r.name == RoleName::Admin.as_str()) {
            RoleName::User
        } else {
            RoleName::Admin
        };

        if self.fail_next_role_link.swap(false, Ordering::SeqCst) {
            return Err(unique_violation("user_roles.user_id"));
        }

        let user = User {
            id: next_id(tables.users.iter().map(|u| u.id).max()),
            full_name: full_name.to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            created_at: Utc::now(),
        };
        tables.users.push(user.clone());

        let role_id = match tables.roles.iter().find(|r| r.name == role_name.as_str()) {
            Some(role) => role.id,
            None => {
                let role = SystemRole {
                    id: next_id(tables.roles.iter().map(|r| r.id).max()),
                    name: role_name.as_str().to_string(),
                };
                let id = role.id;
                tables.roles.push(role);
                id
            }
        };

        let link = UserRole {
            id: next_id(tables.user_roles.iter().map(|l| l.id).max()),
            user_id: user.id,
            role_id,
        };
        tables.user_roles.push(link);

        Ok((user, role_name))
    }

    async fn find_role_by_id(&self, id: i32) -> Result<Option<SystemRole>, AuthError> {
        Ok(self.tables().roles.iter().find(|r| r.id == id).cloned())
    }

    async fn find_user_role(&self, user_id: i32) -> Result<Option<UserRole>, AuthError> {
        Ok(self
            .tables()
            .user_roles
            .iter()
            .find(|link| link.user_id == user_id)
            .cloned())
    }

    async fn find_refresh_token(&self, token: &str) -> Result<Option<RefreshToken>, AuthError> {
        let token_hash = hash_token(token);
        Ok(self
            .tables()
            .refresh_tokens
            .iter()
            .find(|t| t.token_hash == token_hash)
            .cloned())
    }

    async fn upsert_refresh_token(&self, user_id: i32, token: &str) -> Result<(), AuthError> {
        let mut tables = self.tables();
        let now = Utc::now();
        let token_hash = hash_token(token);

        if let Some(record) = tables.refresh_tokens.iter_mut().find(|t| t.user_id == user_id) {
            record.token_hash = token_hash;
            record.updated_at = now;
            return Ok(());
        }

        if tables.refresh_tokens.iter().any(|t| t.token_hash == token_hash) {
            return Err(unique_violation("refresh_tokens.token_hash"));
        }

        let record = RefreshToken {
            id: next_id(tables.refresh_tokens.iter().map(|t| t.id).max()),
            user_id,
            token_hash,
            created_at: now,
            updated_at: now,
        };
        tables.refresh_tokens.push(record);
        Ok(())
    }

    async fn rotate_refresh_token(&self, user_id: i32, token: &str) -> Result<bool, AuthError> {
        let mut tables = self.tables();
        match tables.refresh_tokens.iter_mut().find(|t| t.user_id == user_id) {
            Some(record) => {
                record.token_hash = hash_token(token);
                record.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
