// Account service - registration, login and refresh token rotation

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::auth::{
    error::AuthError,
    models::{AccountFailure, GeneralResponse, LoginResponse},
    password::PasswordService,
    repository::CredentialStore,
    token::TokenService,
};

/// Orchestrates account operations over a credential store.
///
/// Expected failures come back as a response with `flag == false`; only
/// store, hashing and signing failures are returned as `Err`.
pub struct AccountService {
    store: Arc<dyn CredentialStore>,
    password_service: PasswordService,
    token_service: Arc<TokenService>,
}

impl AccountService {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        password_service: PasswordService,
        token_service: Arc<TokenService>,
    ) -> Self {
        Self {
            store,
            password_service,
            token_service,
        }
    }

    /// Register a new account and assign its role.
    ///
    /// The first account ever registered becomes Admin; every later one
    /// becomes User. No tokens are issued here.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> Result<GeneralResponse, AuthError> {
        if self.store.find_user_by_email(email).await?.is_some() {
            debug!("Registration rejected, email already in use");
            return Ok(GeneralResponse::failure(AccountFailure::DuplicateAccount));
        }

        let password_hash = self.password_service.hash(password).await?;
        let (user, role) = match self
            .store
            .create_account(full_name, email, &password_hash)
            .await
        {
            Ok(created) => created,
            Err(AuthError::EmailAlreadyExists) => {
                warn!("Concurrent registration lost the race for an email");
                return Ok(GeneralResponse::failure(AccountFailure::DuplicateAccount));
            }
            Err(e) => return Err(e),
        };
        info!("Account created: user_id={}, role={}", user.id, role);

        Ok(GeneralResponse::success("Account created!"))
    }

    /// Verify credentials and issue an access/refresh token pair
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, AuthError> {
        let Some(user) = self.store.find_user_by_email(email).await? else {
            debug!("Login for unknown email");
            return Ok(LoginResponse::failure(AccountFailure::NotFound));
        };

        if !self
            .password_service
            .verify(password, &user.password_hash)
            .await?
        {
            warn!("Invalid password for user_id={}", user.id);
            return Ok(LoginResponse::failure(AccountFailure::InvalidCredential));
        }

        let role_name = match self.resolve_role_name(user.id).await? {
            Ok(name) => name,
            Err(failure) => return Ok(LoginResponse::failure(failure)),
        };

        let access_token = self.token_service.issue_access_token(&user, &role_name)?;
        let refresh_token = self.token_service.issue_refresh_token();

        self.store
            .upsert_refresh_token(user.id, &refresh_token)
            .await?;

        info!("Login succeeded: user_id={}, role={}", user.id, role_name);
        Ok(LoginResponse::success(
            "Login successfully",
            access_token,
            refresh_token,
        ))
    }

    /// Exchange a refresh token for a new token pair, rotating the stored value
    pub async fn refresh_token(&self, presented: &str) -> Result<LoginResponse, AuthError> {
        let Some(record) = self.store.find_refresh_token(presented).await? else {
            warn!("Refresh attempted with an unknown token");
            return Ok(LoginResponse::failure(AccountFailure::InvalidToken));
        };

        let Some(user) = self.store.find_user_by_id(record.user_id).await? else {
            warn!("Refresh token owner user_id={} no longer exists", record.user_id);
            return Ok(LoginResponse::failure(AccountFailure::UserNotFound));
        };

        let role_name = match self.resolve_role_name(user.id).await? {
            Ok(name) => name,
            Err(failure) => return Ok(LoginResponse::failure(failure)),
        };

        let access_token = self.token_service.issue_access_token(&user, &role_name)?;
        let refresh_token = self.token_service.issue_refresh_token();

        // The record must come from a prior login; never create one here
        if !self
            .store
            .rotate_refresh_token(user.id, &refresh_token)
            .await?
        {
            warn!("No session left to rotate for user_id={}", user.id);
            return Ok(LoginResponse::failure(AccountFailure::NoPriorSession));
        }

        info!("Token refreshed: user_id={}", user.id);
        Ok(LoginResponse::success(
            "Token refreshed successfully",
            access_token,
            refresh_token,
        ))
    }

    /// Two-step lookup: the user's role link, then the role it points to
    async fn resolve_role_name(
        &self,
        user_id: i32,
    ) -> Result<Result<String, AccountFailure>, AuthError> {
        let Some(link) = self.store.find_user_role(user_id).await? else {
            warn!("No role link for user_id={}", user_id);
            return Ok(Err(AccountFailure::UserRoleMissing));
        };

        match self.store.find_role_by_id(link.role_id).await? {
            Some(role) => Ok(Ok(role.name)),
            None => {
                warn!("Role id={} linked to user_id={} does not exist", link.role_id, user_id);
                Ok(Err(AccountFailure::SystemRoleMissing))
            }
        }
    }
}
