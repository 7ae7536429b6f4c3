// HTTP handlers for authentication endpoints

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::auth::{
    error::AuthError,
    middleware::AuthenticatedUser,
    models::{
        CurrentUserResponse, GeneralResponse, LoginRequest, LoginResponse, RefreshRequest,
        RegisterRequest,
    },
    service::AccountService,
};
use crate::validation::ValidatedJson;

/// Register a new account
#[utoipa::path(
    post,
    path = "/api/authentication/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Registration outcome", body = GeneralResponse),
        (status = 400, description = "Invalid input data"),
        (status = 500, description = "Internal server error")
    ),
    tag = "authentication"
)]
pub async fn register_handler(
    State(service): State<Arc<AccountService>>,
    ValidatedJson(request): ValidatedJson<RegisterRequest>,
) -> Result<Json<GeneralResponse>, AuthError> {
    let response = service
        .register(&request.email, &request.password, &request.full_name)
        .await?;
    Ok(Json(response))
}

/// Sign in and receive an access token and refresh token
#[utoipa::path(
    post,
    path = "/api/authentication/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login outcome", body = LoginResponse),
        (status = 400, description = "Invalid input data"),
        (status = 500, description = "Internal server error")
    ),
    tag = "authentication"
)]
pub async fn login_handler(
    State(service): State<Arc<AccountService>>,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AuthError> {
    let response = service.login(&request.email, &request.password).await?;
    Ok(Json(response))
}

/// Rotate a refresh token
#[utoipa::path(
    post,
    path = "/api/authentication/refresh-token",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "Refresh outcome", body = LoginResponse),
        (status = 400, description = "Invalid input data"),
        (status = 500, description = "Internal server error")
    ),
    tag = "authentication"
)]
pub async fn refresh_handler(
    State(service): State<Arc<AccountService>>,
    ValidatedJson(request): ValidatedJson<RefreshRequest>,
) -> Result<Json<LoginResponse>, AuthError> {
    let response = service.refresh_token(&request.token).await?;
    Ok(Json(response))
}

/// Identity carried by the presented access token
#[utoipa::path(
    get,
    path = "/api/authentication/me",
    responses(
        (status = 200, description = "Verified token identity", body = CurrentUserResponse),
        (status = 401, description = "Missing, invalid or expired token")
    ),
    security(("bearer_auth" = [])),
    tag = "authentication"
)]
pub async fn me_handler(user: AuthenticatedUser) -> Json<CurrentUserResponse> {
    Json(CurrentUserResponse {
        user_id: user.user_id,
        name: user.name,
        email: user.email,
        role: user.role,
    })
}
