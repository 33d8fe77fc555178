use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use subtle::ConstantTimeEq;
use thiserror::Error;

use crate::config::AuthConfig;
use crate::error::AppError;

const TOKEN_LIFETIME_HOURS: i64 = 24;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iss: String,
    pub aud: String,
    pub iat: usize,
    pub exp: usize,
}

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Missing bearer token")]
    MissingToken,
    #[error("Invalid or expired token")]
    InvalidToken,
    #[error("Failed to generate token")]
    GenerationFail,
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::GenerationFail => AppError::Internal(err.to_string()),
            _ => AppError::Unauthorized(err.to_string()),
        }
    }
}

/// Requires a valid JWT; the decoded claims are handed to the handler as an
/// extension.
pub async fn auth_middleware(
    State(auth): State<Arc<AuthConfig>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(req.headers()).ok_or(AuthError::MissingToken)?;
    let claims = validate_token(&auth, token)?;

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

/// Requires the static token shared with trusted back-office callers.
pub async fn shared_token_middleware(
    State(auth): State<Arc<AuthConfig>>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(req.headers()).ok_or(AuthError::MissingToken)?;
    if !shared_token_matches(token, &auth.shared_token) {
        return Err(AuthError::InvalidToken.into());
    }

    Ok(next.run(req).await)
}

fn shared_token_matches(token: &str, expected: &str) -> bool {
    token.as_bytes().ct_eq(expected.as_bytes()).into()
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

pub fn generate_token(auth: &AuthConfig, username: &str) -> Result<String, AuthError> {
    let now = Utc::now();
    let exp = now
        .checked_add_signed(Duration::hours(TOKEN_LIFETIME_HOURS))
        .ok_or(AuthError::GenerationFail)?;

    let claims = Claims {
        sub: username.to_string(),
        iss: auth.issuer.clone(),
        aud: auth.audience.clone(),
        iat: now.timestamp() as usize,
        exp: exp.timestamp() as usize,
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(auth.jwt_key.as_bytes()),
    )
    .map_err(|_| AuthError::GenerationFail)
}

pub fn validate_token(auth: &AuthConfig, token: &str) -> Result<Claims, AuthError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    validation.set_issuer(&[&auth.issuer]);
    validation.set_audience(&[&auth.audience]);

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(auth.jwt_key.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|_| AuthError::InvalidToken)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(audience: &str) -> AuthConfig {
        AuthConfig {
            jwt_key: "test-key".into(),
            issuer: "catalog".into(),
            audience: audience.into(),
            shared_token: "shared".into(),
        }
    }

    #[test]
    fn token_roundtrip() {
        let auth = config("apps");
        let token = generate_token(&auth, "alice").unwrap();

        let claims = validate_token(&auth, &token).unwrap();
        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.iss, "catalog");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn wrong_audience_is_rejected() {
        let token = generate_token(&config("apps"), "alice").unwrap();

        assert!(matches!(
            validate_token(&config("other"), &token),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn bearer_prefix_is_required() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, "Token abc".parse().unwrap());
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, "Bearer abc".parse().unwrap());
        assert_eq!(bearer_token(&headers), Some("abc"));
    }

    #[test]
    fn shared_token_must_match_exactly() {
        assert!(shared_token_matches("shared", "shared"));
        assert!(!shared_token_matches("sharex", "shared"));
        assert!(!shared_token_matches("share", "shared"));
        assert!(!shared_token_matches("", "shared"));
    }
}
