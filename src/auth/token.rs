// JWT access token issuing/validation and opaque refresh token generation

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};

use crate::auth::{error::AuthError, models::User};
use crate::config::JwtSettings;

/// Random bytes in a refresh token before encoding
pub const REFRESH_TOKEN_BYTES: usize = 64;

/// Access token claims. Identity claims use the WS-* claim type URIs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/nameidentifier")]
    pub name_identifier: String,
    #[serde(rename = "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/name")]
    pub name: String,
    #[serde(rename = "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/emailaddress")]
    pub email: String,
    #[serde(rename = "http://schemas.microsoft.com/ws/2008/06/identity/claims/role")]
    pub role: String,
    pub iss: String,
    pub aud: String,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    /// Numeric user id from the name-identifier claim
    pub fn user_id(&self) -> Result<i32, AuthError> {
        self.name_identifier.parse().map_err(|_| AuthError::InvalidToken)
    }
}

/// Issues and validates tokens
pub struct TokenService {
    settings: JwtSettings,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl TokenService {
    pub fn new(settings: JwtSettings) -> Self {
        let encoding_key = EncodingKey::from_secret(settings.key.as_bytes());
        let decoding_key = DecodingKey::from_secret(settings.key.as_bytes());
        Self {
            settings,
            encoding_key,
            decoding_key,
        }
    }

    /// Sign an HS256 access token for the user with the given role
    pub fn issue_access_token(&self, user: &User, role_name: &str) -> Result<String, AuthError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            name_identifier: user.id.to_string(),
            name: user.full_name.clone(),
            email: user.email.clone(),
            role: role_name.to_string(),
            iss: self.settings.issuer.clone(),
            aud: self.settings.audience.clone(),
            iat: now,
            exp: now + self.settings.lifetime.num_seconds(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::TokenGenerationError(e.to_string()))
    }

    /// Generate an opaque refresh token: 64 random bytes, Base64 encoded
    pub fn issue_refresh_token(&self) -> String {
        let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
        OsRng.fill_bytes(&mut bytes);
        STANDARD.encode(bytes)
    }

    /// Verify signature, issuer, audience and expiry of an access token
    pub fn validate_access_token(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.settings.issuer]);
        validation.set_audience(&[&self.settings.audience]);
        validation.leeway = 0;

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
                _ => AuthError::InvalidToken,
            })
    }
}

#[cfg(test)]
pub(crate) fn test_jwt_settings() -> JwtSettings {
    JwtSettings::new(
        "test_secret_key_for_testing_purposes_only",
        "https://issuer.test",
        "https://audience.test",
    )
}
