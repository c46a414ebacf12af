// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! JWT authentication middleware.
//!
//! Tokens are self-contained: the middleware trusts the signed role and
//! session ID and does not touch Firestore.

use crate::error::AppError;
use crate::models::Role;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Cookie the frontend may use instead of the `Authorization` header.
pub const SESSION_COOKIE: &str = "talenthub_token";

/// JWT claims structure.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    pub email: String,
    pub role: Role,
    /// Session ID (`user_sessions` document)
    pub sid: String,
    /// Expiration time (Unix timestamp)
    pub exp: usize,
    /// Issued at (Unix timestamp)
    pub iat: usize,
}

/// Authenticated user extracted from JWT.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
    pub email: String,
    pub role: Role,
    pub session_id: String,
}

impl AuthUser {
    /// Reject callers whose role is not in `allowed`.
    pub fn require_role(&self, allowed: &[Role]) -> Result<(), AppError> {
        if allowed.contains(&self.role) {
            return Ok(());
        }
        let names: Vec<&str> = allowed.iter().map(|r| r.as_str()).collect();
        Err(AppError::Forbidden(format!(
            "This action requires role: {}",
            names.join(" or ")
        )))
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        self.require_role(&[Role::Admin])
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

fn bearer_token(request: &Request) -> Option<String> {
    request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
}

/// Validate a token and return its claims.
pub fn decode_jwt(token: &str, signing_key: &[u8]) -> Result<Claims, AppError> {
    let key = DecodingKey::from_secret(signing_key);
    let validation = Validation::new(Algorithm::HS256);
    decode::<Claims>(token, &key, &validation)
        .map(|data| data.claims)
        .map_err(|_| AppError::InvalidToken)
}

/// Middleware that requires valid JWT authentication.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    // Header first (what the SPA sends), then cookie
    let token = match bearer_token(&request) {
        Some(token) => token,
        None => jar
            .get(SESSION_COOKIE)
            .map(|c| c.value().to_string())
            .ok_or(AppError::Unauthorized)?,
    };

    let claims = decode_jwt(&token, &state.config.jwt_signing_key)?;

    request.extensions_mut().insert(AuthUser {
        user_id: claims.sub,
        email: claims.email,
        role: claims.role,
        session_id: claims.sid,
    });

    Ok(next.run(request).await)
}

/// Issued session token.
pub struct SessionToken {
    pub token: String,
    /// Lifetime in seconds
    pub expires_in: i64,
}

/// Create a JWT for a user session.
pub fn create_jwt(
    user_id: &str,
    email: &str,
    role: Role,
    session_id: &str,
    ttl_days: i64,
    signing_key: &[u8],
) -> anyhow::Result<SessionToken> {
    use jsonwebtoken::{encode, EncodingKey, Header};
    use std::time::{SystemTime, UNIX_EPOCH};

    let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs() as usize;
    let expires_in = ttl_days * 24 * 60 * 60;

    let claims = Claims {
        sub: user_id.to_string(),
        email: email.to_string(),
        role,
        sid: session_id.to_string(),
        iat: now,
        exp: now + expires_in as usize,
    };

    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(signing_key),
    )?;
    Ok(SessionToken { token, expires_in })
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &[u8] = b"unit_test_signing_key_32_bytes!!";

    #[test]
    fn test_jwt_roundtrip() {
        let issued = create_jwt("u-1", "a@example.com", Role::Employer, "s-1", 7, KEY).unwrap();
        assert_eq!(issued.expires_in, 604_800);

        let claims = decode_jwt(&issued.token, KEY).unwrap();
        assert_eq!(claims.sub, "u-1");
        assert_eq!(claims.role, Role::Employer);
        assert_eq!(claims.sid, "s-1");
        assert_eq!(claims.exp - claims.iat, 604_800);
    }

    #[test]
    fn test_wrong_key_rejected() {
        let issued = create_jwt("u-1", "a@example.com", Role::Admin, "s-1", 7, KEY).unwrap();
        assert!(matches!(
            decode_jwt(&issued.token, b"another_key_entirely_32_bytes!!!"),
            Err(AppError::InvalidToken)
        ));
    }

    #[test]
    fn test_require_role() {
        let user = AuthUser {
            user_id: "u".into(),
            email: "e".into(),
            role: Role::JobSeeker,
            session_id: "s".into(),
        };
        assert!(user.require_role(&[Role::JobSeeker, Role::Interviewer]).is_ok());
        assert!(matches!(
            user.require_admin(),
            Err(AppError::Forbidden(msg)) if msg.contains("admin")
        ));
    }
}
