pub mod auth;
pub mod config;
pub mod db;
pub mod validation;

use axum::{
    extract::FromRef,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use auth::{
    AccountService, CurrentUserResponse, GeneralResponse, LoginRequest, LoginResponse,
    RefreshRequest, RegisterRequest, TokenService,
};

/// OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    paths(
        auth::handlers::register_handler,
        auth::handlers::login_handler,
        auth::handlers::refresh_handler,
        auth::handlers::me_handler,
    ),
    components(
        schemas(
            RegisterRequest,
            LoginRequest,
            RefreshRequest,
            GeneralResponse,
            LoginResponse,
            CurrentUserResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "authentication", description = "Account registration, login and token refresh")
    ),
    info(
        title = "Employee Management Authentication API",
        version = "1.0.0",
        description = "Registration, login and JWT refresh token issuance"
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub account_service: Arc<AccountService>,
    pub token_service: Arc<TokenService>,
}

impl FromRef<AppState> for Arc<AccountService> {
    fn from_ref(state: &AppState) -> Self {
        state.account_service.clone()
    }
}

impl FromRef<AppState> for Arc<TokenService> {
    fn from_ref(state: &AppState) -> Self {
        state.token_service.clone()
    }
}

/// Authentication routes, without documentation or middleware layers
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/api/authentication/register", post(auth::register_handler))
        .route("/api/authentication/login", post(auth::login_handler))
        .route("/api/authentication/refresh-token", post(auth::refresh_handler))
        .route("/api/authentication/me", get(auth::me_handler))
}

/// Creates and configures the application router
/// Adds Swagger UI, request tracing and CORS
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(auth_routes())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
