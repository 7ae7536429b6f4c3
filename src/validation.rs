// Validation utilities module
// Custom rules used by the request DTOs alongside the built-in validator attributes,
// and the extractor that runs them on incoming JSON bodies

use axum::{
    async_trait,
    extract::{FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationError};

use crate::auth::error::AuthError;

/// JSON body that has been deserialized and validated.
///
/// Both a body that does not deserialize (missing field, bad JSON, wrong
/// content type) and one that fails its `Validate` rules reject with a
/// 400 `VALIDATION_ERROR`.
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        value.validate()?;
        Ok(ValidatedJson(value))
    }
}

/// Rejects empty or whitespace-only values
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("required");
        error.message = Some("This field is required".into());
        Err(error)
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_blank() {
        assert!(validate_not_blank("Secret123!").is_ok());
        assert!(validate_not_blank(" x ").is_ok());
        assert_eq!(validate_not_blank("").unwrap_err().code, "required");
        assert!(validate_not_blank(" \t\n").is_err());
    }
}
