// Authentication data models, request DTOs and response DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use utoipa::ToSchema;
use validator::Validate;

use crate::validation::validate_not_blank;

/// Names of the built-in roles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleName {
    Admin,
    User,
}

impl RoleName {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoleName::Admin => "Admin",
            RoleName::User => "User",
        }
    }
}

impl fmt::Display for RoleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User database model
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i32,
    pub full_name: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Role definition (`system_roles`)
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct SystemRole {
    pub id: i32,
    pub name: String,
}

/// Link between a user and their role (`user_roles`)
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct UserRole {
    pub id: i32,
    pub user_id: i32,
    pub role_id: i32,
}

/// Stored refresh token; only the SHA-256 digest of the token is kept
#[derive(Debug, Clone, FromRow)]
pub struct RefreshToken {
    pub id: i32,
    pub user_id: i32,
    pub token_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Registration request DTO
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(email(message = "Email address is not valid"))]
    #[schema(example = "alice@example.com")]
    pub email: String,

    #[validate(custom = "validate_not_blank")]
    #[schema(example = "Secret123!")]
    pub password: String,

    #[validate(must_match(other = "password", message = "Passwords do not match"))]
    #[schema(example = "Secret123!")]
    pub confirm_password: String,

    #[validate(
        length(min = 5, max = 100, message = "Full name must be 5 to 100 characters"),
        custom = "validate_not_blank"
    )]
    #[schema(example = "Alice Smith")]
    pub full_name: String,
}

/// Login request DTO
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[validate(email(message = "Email address is not valid"))]
    #[schema(example = "alice@example.com")]
    pub email: String,

    #[validate(custom = "validate_not_blank")]
    #[schema(example = "Secret123!")]
    pub password: String,
}

/// Token refresh request DTO
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    #[validate(custom = "validate_not_blank")]
    pub token: String,
}

/// Expected, recoverable outcomes of an account operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountFailure {
    DuplicateAccount,
    NotFound,
    InvalidCredential,
    UserRoleMissing,
    SystemRoleMissing,
    InvalidToken,
    UserNotFound,
    NoPriorSession,
}

impl AccountFailure {
    pub fn message(&self) -> &'static str {
        match self {
            AccountFailure::DuplicateAccount => "User registered already",
            AccountFailure::NotFound => "User not found",
            AccountFailure::InvalidCredential => "Password not valid",
            AccountFailure::UserRoleMissing => "User role not found",
            AccountFailure::SystemRoleMissing => "System role not found",
            AccountFailure::InvalidToken => "Refresh token is required",
            AccountFailure::UserNotFound => {
                "Refresh token could not be generated because user not found"
            }
            AccountFailure::NoPriorSession => {
                "Refresh token could not be generated because user has not signed in"
            }
        }
    }
}

impl fmt::Display for AccountFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Result of registration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct GeneralResponse {
    pub flag: bool,
    #[schema(example = "Account created!")]
    pub message: String,
}

impl GeneralResponse {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            flag: true,
            message: message.into(),
        }
    }

    pub fn failure(failure: AccountFailure) -> Self {
        Self {
            flag: false,
            message: failure.message().to_string(),
        }
    }
}

/// Result of login and token refresh; tokens are absent on failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub flag: bool,
    #[schema(example = "Login successfully")]
    pub message: String,
    pub token: Option<String>,
    pub refresh_token: Option<String>,
}

impl LoginResponse {
    pub fn success(message: impl Into<String>, token: String, refresh_token: String) -> Self {
        Self {
            flag: true,
            message: message.into(),
            token: Some(token),
            refresh_token: Some(refresh_token),
        }
    }

    pub fn failure(failure: AccountFailure) -> Self {
        Self {
            flag: false,
            message: failure.message().to_string(),
            token: None,
            refresh_token: None,
        }
    }
}

/// Verified identity returned by the `me` endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUserResponse {
    pub user_id: i32,
    pub name: String,
    pub email: String,
    #[schema(example = "Admin")]
    pub role: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register_request() -> RegisterRequest {
        RegisterRequest {
            email: "a@x.com".to_string(),
            password: "Secret123!".to_string(),
            confirm_password: "Secret123!".to_string(),
            full_name: "Alice Smith".to_string(),
        }
    }

    #[test]
    fn test_valid_register_request() {
        assert!(register_request().validate().is_ok());
    }

    #[test]
    fn test_register_password_mismatch() {
        let mut request = register_request();
        request.confirm_password = "Secret124!".to_string();
        let errors = request.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("confirm_password"));
    }

    #[test]
    fn test_register_full_name_bounds() {
        let mut request = register_request();
        request.full_name = "Ali".to_string();
        assert!(request.validate().unwrap_err().field_errors().contains_key("full_name"));

        request.full_name = "A".repeat(101);
        assert!(request.validate().is_err());

        request.full_name = "A".repeat(100);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_register_whitespace_full_name() {
        let mut request = register_request();
        request.full_name = "      ".to_string();
        let errors = request.validate().unwrap_err();
        let full_name = &errors.field_errors()["full_name"];
        assert!(full_name.iter().any(|e| e.code == "required"));
    }

    #[test]
    fn test_register_invalid_email() {
        let mut request = register_request();
        request.email = "not-an-email".to_string();
        assert!(request.validate().unwrap_err().field_errors().contains_key("email"));
    }

    #[test]
    fn test_blank_password_and_token_rejected() {
        let login = LoginRequest {
            email: "a@x.com".to_string(),
            password: "   ".to_string(),
        };
        assert!(login.validate().is_err());

        let refresh = RefreshRequest { token: String::new() };
        assert!(refresh.validate().is_err());
    }

    #[test]
    fn test_wire_field_names() {
        let json = serde_json::json!({
            "email": "a@x.com",
            "password": "Secret123!",
            "confirmPassword": "Secret123!",
            "fullName": "Alice Smith"
        });
        let request: RegisterRequest = serde_json::from_value(json).unwrap();
        assert_eq!(request.full_name, "Alice Smith");

        let body = serde_json::to_value(LoginResponse::failure(AccountFailure::NotFound)).unwrap();
        assert_eq!(body["flag"], false);
        assert_eq!(body["message"], "User not found");
        assert!(body["refreshToken"].is_null());
    }
}
