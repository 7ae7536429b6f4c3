// Authentication module
// Registration, login and refresh token rotation backed by a credential store

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod password;
pub mod repository;
pub mod service;
pub mod token;

#[cfg(test)]
pub mod memory;

pub use error::AuthError;
pub use handlers::{login_handler, me_handler, refresh_handler, register_handler};
pub use middleware::AuthenticatedUser;
pub use models::{
    AccountFailure, CurrentUserResponse, GeneralResponse, LoginRequest, LoginResponse,
    RefreshRequest, RegisterRequest, RoleName,
};
pub use password::PasswordService;
pub use repository::{CredentialStore, PgCredentialStore};
pub use service::AccountService;
pub use token::{Claims, TokenService};
