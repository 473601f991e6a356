use std::sync::LazyLock;

use axum::{async_trait, extract::FromRequestParts, RequestPartsExt};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use chrono::Utc;
use http::request::Parts;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use super::AuthError;
use crate::error::AppError;

static KEYS: LazyLock<Keys> = LazyLock::new(|| {
    let secret = std::env::var("JWT_SECRET").expect("JWT_SECRET must be set");
    Keys::new(&secret)
});

const ISSUER: &str = "autocrm.io";

pub const SESSION_TTL: usize = 24 * 60 * 60; // 24 hours

#[cfg(debug_assertions)]
pub fn generate_dev_token(email: &str, name: &str) -> Result<String, AuthError> {
    let claims = Claims {
        sub: email.to_string(),
        email: email.to_string(),
        name: Some(name.to_string()),
        iss: ISSUER.to_string(),
        exp: Utc::now().timestamp() as usize + SESSION_TTL,
    };

    jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &KEYS.encoding)
        .map_err(|_| AuthError::TokenCreation)
}

struct Keys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl Keys {
    fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject assigned by the identity provider.
    pub sub: String,
    pub email: String,
    pub name: Option<String>,
    pub iss: String,
    pub exp: usize,
}

/// Decodes a bearer token and checks the expiry claim.
pub fn decode_claims(token: &str) -> Result<Claims, AuthError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_aud = false;

    jsonwebtoken::decode::<Claims>(token, &KEYS.decoding, &validation)
        .map(|data| data.claims)
        .map_err(|e| {
            tracing::debug!("Error decoding token: {:?}", e);
            AuthError::InvalidToken
        })
}

#[async_trait]
impl<S> FromRequestParts<S> for Claims
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|_| AuthError::MissingCredentials)?;

        Ok(decode_claims(bearer.token())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_round_trip() {
        std::env::set_var("JWT_SECRET", "test-secret-used-only-in-tests");
        let token = generate_dev_token("agent@autocrm.io", "Test Agent").unwrap();

        let claims = decode_claims(&token).unwrap();
        assert_eq!(claims.email, "agent@autocrm.io");
        assert_eq!(claims.name.as_deref(), Some("Test Agent"));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        std::env::set_var("JWT_SECRET", "test-secret-used-only-in-tests");
        assert!(matches!(
            decode_claims("not-a-token"),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn test_decode_rejects_expired_token() {
        std::env::set_var("JWT_SECRET", "test-secret-used-only-in-tests");
        let claims = Claims {
            sub: "agent@autocrm.io".to_string(),
            email: "agent@autocrm.io".to_string(),
            name: None,
            iss: ISSUER.to_string(),
            exp: Utc::now().timestamp() as usize - 3600,
        };
        let token =
            jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &KEYS.encoding).unwrap();

        assert!(matches!(
            decode_claims(&token),
            Err(AuthError::InvalidToken)
        ));
    }
}
