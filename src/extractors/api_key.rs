//! Extract the write API key from the `X-Authorization` header.

use crate::error::AppError;
use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};
use subtle::ConstantTimeEq;

pub const API_KEY_HEADER: &str = "X-Authorization";

/// Key presented by the client, if any.
#[derive(Clone, Debug)]
pub struct ApiKey(pub Option<String>);

impl ApiKey {
    /// Constant-time check against the configured secret. No secret configured means no access.
    pub fn verify(&self, expected: Option<&str>) -> Result<(), AppError> {
        match (self.0.as_deref(), expected) {
            (Some(given), Some(expected)) if bool::from(given.as_bytes().ct_eq(expected.as_bytes())) => Ok(()),
            _ => Err(AppError::Forbidden),
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for ApiKey
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(API_KEY_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        Ok(ApiKey(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_the_exact_key_passes() {
        assert!(ApiKey(Some("s3cret".into())).verify(Some("s3cret")).is_ok());
        assert!(ApiKey(Some("s3cre".into())).verify(Some("s3cret")).is_err());
        assert!(ApiKey(Some("S3CRET".into())).verify(Some("s3cret")).is_err());
        assert!(ApiKey(None).verify(Some("s3cret")).is_err());
    }

    #[test]
    fn nothing_passes_without_a_configured_key() {
        assert!(ApiKey(Some("anything".into())).verify(None).is_err());
        assert!(ApiKey(None).verify(None).is_err());
    }
}
