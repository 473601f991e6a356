pub mod jwt;

use axum::{async_trait, extract::FromRequestParts, http::HeaderMap};
use http::request::Parts;
use subtle::ConstantTimeEq;

use crate::{error::AppError, server_config::cfg};

pub const API_KEY_HEADER: &str = "x-api-key";

#[derive(Debug)]
pub enum AuthError {
    WrongCredentials,
    MissingCredentials,
    TokenCreation,
    InvalidToken,
}

/// Identity attached to an authenticated request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Principal {
    /// A signed-in human, identified by the email claim of their token.
    Agent { email: String },
    /// The upstream email-receiving service, authenticated by static key.
    Service,
}

/// Uniform outcome of a single authenticator attempt.
#[derive(Debug)]
pub enum AuthAttempt {
    Authenticated(Principal),
    /// This authenticator's credential is absent; the next one may apply.
    NoCredentials,
    /// The credential was present but wrong. Terminal.
    Denied(String),
}

pub trait Authenticator {
    fn name(&self) -> &'static str;
    fn authenticate(&self, headers: &HeaderMap) -> AuthAttempt;
}

/// Decodes and validates a bearer JWT from the Authorization header.
pub struct TokenAuthenticator;

impl Authenticator for TokenAuthenticator {
    fn name(&self) -> &'static str {
        "bearer-token"
    }

    fn authenticate(&self, headers: &HeaderMap) -> AuthAttempt {
        let Some(value) = headers.get(http::header::AUTHORIZATION) else {
            return AuthAttempt::NoCredentials;
        };
        let Ok(value) = value.to_str() else {
            return AuthAttempt::Denied("Invalid Authorization header".to_string());
        };
        let Some(token) = value.strip_prefix("Bearer ") else {
            return AuthAttempt::Denied(
                "Authorization header must use the Bearer scheme".to_string(),
            );
        };

        match jwt::decode_claims(token) {
            Ok(claims) => AuthAttempt::Authenticated(Principal::Agent {
                email: claims.email,
            }),
            Err(_) => AuthAttempt::Denied("Invalid token".to_string()),
        }
    }
}

/// Compares the x-api-key header against the configured service key.
pub struct ApiKeyAuthenticator;

impl Authenticator for ApiKeyAuthenticator {
    fn name(&self) -> &'static str {
        "api-key"
    }

    fn authenticate(&self, headers: &HeaderMap) -> AuthAttempt {
        let Some(value) = headers.get(API_KEY_HEADER) else {
            return AuthAttempt::NoCredentials;
        };
        let Ok(presented) = value.to_str() else {
            return AuthAttempt::Denied("Invalid x-api-key header".to_string());
        };

        let matches: bool = presented
            .as_bytes()
            .ct_eq(cfg.ingest.api_key.as_bytes())
            .into();
        if matches {
            AuthAttempt::Authenticated(Principal::Service)
        } else {
            AuthAttempt::Denied("Invalid API key".to_string())
        }
    }
}

/// Tries each authenticator in a fixed order. The first one that finds its
/// credential decides the outcome; a request with no credentials at all is
/// denied.
pub fn authenticate_request(headers: &HeaderMap) -> Result<Principal, AppError> {
    let authenticators: [&dyn Authenticator; 2] = [&TokenAuthenticator, &ApiKeyAuthenticator];

    for authenticator in authenticators {
        match authenticator.authenticate(headers) {
            AuthAttempt::Authenticated(principal) => {
                tracing::debug!("Request authenticated via {}", authenticator.name());
                return Ok(principal);
            }
            AuthAttempt::NoCredentials => continue,
            AuthAttempt::Denied(reason) => return Err(AppError::Unauthorized(reason)),
        }
    }

    Err(AppError::Unauthorized("Missing credentials".to_string()))
}

/// Extractor for routes callable by the upstream email-receiving service.
/// Rejection happens before the handler body runs, so a denied request
/// performs no storage or database access.
pub struct ServiceCaller(pub Principal);

#[async_trait]
impl<S> FromRequestParts<S> for ServiceCaller
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let principal = authenticate_request(&parts.headers)?;
        Ok(ServiceCaller(principal))
    }
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn headers_with(name: &'static str, value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(name, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_api_key_authenticator_accepts_configured_key() {
        let headers = headers_with(API_KEY_HEADER, &cfg.ingest.api_key);
        let attempt = ApiKeyAuthenticator.authenticate(&headers);
        assert!(matches!(
            attempt,
            AuthAttempt::Authenticated(Principal::Service)
        ));
    }

    #[test]
    fn test_api_key_authenticator_denies_wrong_key() {
        let headers = headers_with(API_KEY_HEADER, "not-the-key");
        let attempt = ApiKeyAuthenticator.authenticate(&headers);
        assert!(matches!(attempt, AuthAttempt::Denied(_)));
    }

    #[test]
    fn test_api_key_authenticator_skips_when_header_absent() {
        let attempt = ApiKeyAuthenticator.authenticate(&HeaderMap::new());
        assert!(matches!(attempt, AuthAttempt::NoCredentials));
    }

    #[test]
    fn test_authenticate_request_without_credentials_is_unauthorized() {
        let result = authenticate_request(&HeaderMap::new());
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }

    #[test]
    fn test_authenticate_request_with_malformed_bearer_is_terminal() {
        // A present-but-wrong Authorization header must not fall through
        // to the API key check.
        let headers = headers_with("authorization", "Basic abc123");
        let result = authenticate_request(&headers);
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }

    #[test]
    fn test_authenticate_request_with_valid_token() {
        std::env::set_var("JWT_SECRET", "test-secret-used-only-in-tests");
        let token = jwt::generate_dev_token("agent@autocrm.io", "Test Agent").unwrap();
        let headers = headers_with("authorization", &format!("Bearer {}", token));

        let principal = authenticate_request(&headers).unwrap();
        assert_eq!(
            principal,
            Principal::Agent {
                email: "agent@autocrm.io".to_string()
            }
        );
    }
}
