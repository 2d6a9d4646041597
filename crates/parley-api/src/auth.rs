//! JWT bearer authentication.
//!
//! Tokens are HS256 with `{id, email, exp}` claims. Two extractors cover the
//! route families: [`MaybeUser`] for routes that also serve anonymous
//! callers and [`RequiredUser`] for routes that need a live account.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub id: String,
    pub email: String,
    pub exp: i64,
}

#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl JwtKeys {
    pub fn new(secret: &str, ttl_secs: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::seconds(ttl_secs),
        }
    }

    pub fn issue(&self, id: &str, email: &str) -> ApiResult<String> {
        let claims = Claims {
            id: id.to_string(),
            email: email.to_string(),
            exp: (Utc::now() + self.ttl).timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding).map_err(ApiError::internal)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        decode::<Claims>(token, &self.decoding, &Validation::default()).map(|data| data.claims)
    }
}

/// Second word of the Authorization header, whatever the scheme
fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .split_whitespace()
        .nth(1)
}

/// Claims of the caller if a token was sent, `None` for anonymous callers
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<Claims>);

impl MaybeUser {
    pub fn id(&self) -> Option<&str> {
        self.0.as_ref().map(|claims| claims.id.as_str())
    }
}

#[async_trait]
impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> ApiResult<Self> {
        let Some(token) = bearer_token(parts) else {
            return Ok(Self(None));
        };
        match state.keys.verify(token) {
            Ok(claims) => Ok(Self(Some(claims))),
            Err(e) => {
                tracing::debug!(error = %e, "rejected bearer token");
                Err(ApiError::Forbidden("Invalid token"))
            }
        }
    }
}

/// An authenticated caller whose account still exists
#[derive(Debug, Clone)]
pub struct RequiredUser {
    pub id: String,
    pub email: String,
}

#[async_trait]
impl FromRequestParts<AppState> for RequiredUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> ApiResult<Self> {
        let token = bearer_token(parts).ok_or(ApiError::Unauthorized("Authentication required"))?;
        let claims = state
            .keys
            .verify(token)
            .map_err(|_| ApiError::Forbidden("Invalid or expired token"))?;

        let user = state
            .engine
            .users()
            .find_by_id(&claims.id)
            .await?
            .ok_or(ApiError::Unauthorized("User not found"))?;

        Ok(Self {
            id: user.id,
            email: user.email,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_token_round_trips() {
        let keys = JwtKeys::new("secret", 3600);
        let token = keys.issue("u1", "a@example.com").unwrap();
        let claims = keys.verify(&token).unwrap();
        assert_eq!(claims.id, "u1");
        assert_eq!(claims.email, "a@example.com");
        assert!(claims.exp > Utc::now().timestamp());
    }

    #[test]
    fn token_from_another_key_is_rejected() {
        let token = JwtKeys::new("one", 3600).issue("u1", "a@example.com").unwrap();
        assert!(JwtKeys::new("two", 3600).verify(&token).is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        // Past the default validation leeway
        let keys = JwtKeys::new("secret", -600);
        let token = keys.issue("u1", "a@example.com").unwrap();
        assert!(keys.verify(&token).is_err());
    }
}
