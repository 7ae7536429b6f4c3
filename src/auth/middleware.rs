// Bearer token extraction for routes that require a signed-in user

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use std::sync::Arc;
use tracing::debug;

use crate::auth::{error::AuthError, token::TokenService};

/// Identity verified from the request's access token
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: i32,
    pub name: String,
    pub email: String,
    pub role: String,
}

/// Pull the token out of an `Authorization: Bearer <token>` header
fn bearer_token(parts: &Parts) -> Result<&str, AuthError> {
    let auth_header = parts
        .headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingToken)?
        .to_str()
        .map_err(|_| AuthError::InvalidToken)?;

    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(AuthError::InvalidToken)
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    Arc<TokenService>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        let token_service = Arc::<TokenService>::from_ref(state);
        let claims = token_service.validate_access_token(token)?;

        debug!("Authenticated request: user_id={}", claims.name_identifier);
        Ok(AuthenticatedUser {
            user_id: claims.user_id()?,
            name: claims.name,
            email: claims.email,
            role: claims.role,
        })
    }
}
