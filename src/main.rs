use std::sync::Arc;

use employee_auth::{
    auth::{AccountService, PasswordService, PgCredentialStore, TokenService},
    config::AppConfig,
    create_router, db, AppState,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("employee_auth=info,tower_http=info")),
        )
        .with_target(false)
        .with_level(true)
        .init();

    tracing::info!("Employee Management Auth API - Starting...");

    let config = AppConfig::from_env().expect("Invalid configuration");

    tracing::info!("Connecting to database...");
    let db_pool = db::create_pool(&config.database_url)
        .await
        .expect("Failed to create database pool");

    db::run_migrations(&db_pool)
        .await
        .expect("Failed to run database migrations");

    let token_service = Arc::new(TokenService::new(config.jwt.clone()));
    let account_service = Arc::new(AccountService::new(
        Arc::new(PgCredentialStore::new(db_pool)),
        PasswordService::default(),
        token_service.clone(),
    ));

    let app = create_router(AppState {
        account_service,
        token_service,
    });

    let addr = config.bind_address();
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Auth API is running on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui", addr);

    axum::serve(listener, app).await.expect("Server error");
}
