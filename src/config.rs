// Application configuration
// Settings are read from the environment (a .env file is loaded first by main)

use chrono::Duration;
use thiserror::Error;

/// Minimum HS256 signing key length in bytes
pub const MIN_SIGNING_KEY_LEN: usize = 32;

/// Default access token lifetime in hours
pub const DEFAULT_TOKEN_LIFETIME_HOURS: i64 = 24;

/// Configuration loading errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set in environment")]
    Missing(&'static str),

    #[error("{name} has an invalid value: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// JWT signing settings shared by the token issuer and any relying party
#[derive(Debug, Clone)]
pub struct JwtSettings {
    pub key: String,
    pub issuer: String,
    pub audience: String,
    pub lifetime: Duration,
}

impl JwtSettings {
    /// Create settings with the default 24 hour lifetime
    pub fn new(key: impl Into<String>, issuer: impl Into<String>, audience: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            issuer: issuer.into(),
            audience: audience.into(),
            lifetime: Duration::hours(DEFAULT_TOKEN_LIFETIME_HOURS),
        }
    }
}

/// Top-level application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt: JwtSettings,
}

impl AppConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| -> Result<String, ConfigError> {
            lookup(name)
                .filter(|value| !value.trim().is_empty())
                .ok_or(ConfigError::Missing(name))
        };

        let database_url = required("DATABASE_URL")?;
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = match lookup("PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|e| ConfigError::Invalid {
                name: "PORT",
                reason: e.to_string(),
            })?,
            None => 8080,
        };

        let key = required("JWT_KEY")?;
        if key.len() < MIN_SIGNING_KEY_LEN {
            return Err(ConfigError::Invalid {
                name: "JWT_KEY",
                reason: format!("must be at least {} bytes", MIN_SIGNING_KEY_LEN),
            });
        }

        let lifetime_hours = match lookup("JWT_LIFETIME_HOURS") {
            Some(raw) => match raw.parse::<i64>() {
                Ok(hours) if hours > 0 => hours,
                Ok(_) => {
                    return Err(ConfigError::Invalid {
                        name: "JWT_LIFETIME_HOURS",
                        reason: "must be positive".to_string(),
                    })
                }
                Err(e) => {
                    return Err(ConfigError::Invalid {
                        name: "JWT_LIFETIME_HOURS",
                        reason: e.to_string(),
                    })
                }
            },
            None => DEFAULT_TOKEN_LIFETIME_HOURS,
        };

        let jwt = JwtSettings {
            key,
            issuer: required("JWT_ISSUER")?,
            audience: required("JWT_AUDIENCE")?,
            lifetime: Duration::hours(lifetime_hours),
        };

        Ok(Self {
            database_url,
            host,
            port,
            jwt,
        })
    }

    /// Socket address string for the listener
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
