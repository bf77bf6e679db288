// Axum extractors for authenticated requests
//
// Route modules keep an `AuthVerifier` in their state and derive
// `FromRef<State> for AuthVerifier`, which lets handlers take `AuthUser`
// (required) or `OptionalAuthUser` (viewer-aware listings) as arguments.

use axum::async_trait;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use std::sync::Arc;
use uuid::Uuid;

use super::config::JwtConfig;
use super::jwt::{self, TokenKind};
use crate::error::ApiError;

/// Shared token verifier, cheap to clone into every route state
#[derive(Clone)]
pub struct AuthVerifier {
    config: Arc<JwtConfig>,
}

impl AuthVerifier {
    pub fn new(config: JwtConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    fn verify_bearer(&self, parts: &Parts) -> Result<Uuid, ApiError> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::unauthorized("Missing authorization header"))?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| ApiError::unauthorized("Invalid authorization header"))?;

        let claims = jwt::verify(&self.config, token, TokenKind::Access)?;
        Ok(claims.sub)
    }
}

/// Authenticated user id, required
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    AuthVerifier: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let verifier = AuthVerifier::from_ref(state);
        Ok(AuthUser(verifier.verify_bearer(parts)?))
    }
}

/// Authenticated user id when a valid token is present, `None` otherwise.
/// Never rejects; anonymous requests see public data only.
#[derive(Debug, Clone, Copy)]
pub struct OptionalAuthUser(pub Option<Uuid>);

#[async_trait]
impl<S> FromRequestParts<S> for OptionalAuthUser
where
    AuthVerifier: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let verifier = AuthVerifier::from_ref(state);
        Ok(OptionalAuthUser(verifier.verify_bearer(parts).ok()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;
    use std::time::Duration;

    fn verifier() -> AuthVerifier {
        AuthVerifier::new(JwtConfig {
            secret: "test-secret".to_string(),
            access_token_lifetime: Duration::from_secs(900),
            refresh_token_lifetime: Duration::from_secs(3600),
        })
    }

    fn parts_with_header(value: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/");
        if let Some(value) = value {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_valid_bearer_token() {
        let verifier = verifier();
        let user_id = Uuid::now_v7();
        let pair = jwt::issue_pair(&verifier.config, user_id).unwrap();

        let parts = parts_with_header(Some(&format!("Bearer {}", pair.access_token)));
        assert_eq!(verifier.verify_bearer(&parts).unwrap(), user_id);
    }

    #[test]
    fn test_missing_header_rejected() {
        let parts = parts_with_header(None);
        assert!(verifier().verify_bearer(&parts).is_err());
    }

    #[test]
    fn test_refresh_token_not_accepted_as_access() {
        let verifier = verifier();
        let pair = jwt::issue_pair(&verifier.config, Uuid::now_v7()).unwrap();

        let parts = parts_with_header(Some(&format!("Bearer {}", pair.refresh_token)));
        assert!(verifier.verify_bearer(&parts).is_err());
    }

    #[test]
    fn test_non_bearer_scheme_rejected() {
        let parts = parts_with_header(Some("Basic dXNlcjpwYXNz"));
        assert!(verifier().verify_bearer(&parts).is_err());
    }
}
