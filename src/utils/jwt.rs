// src/utils/jwt.rs

use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request, StatusCode, header},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::{error::AppError, state::AppState};

/// JWT Claims structure.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Claims {
    /// Subject - the owning user's id (as string).
    pub sub: String,
    /// Expiration time as Unix timestamp.
    pub exp: usize,
}

impl Claims {
    pub fn user_id(&self) -> Result<i64, AppError> {
        self.sub
            .parse::<i64>()
            .map_err(|_| AppError::AuthError("Invalid token subject".to_string()))
    }
}

fn expiry(expiration_seconds: u64) -> Result<usize, AppError> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| AppError::InternalServerError(e.to_string()))?
        .as_secs();
    Ok((now + expiration_seconds) as usize)
}

/// Signs a new JWT for the user.
pub fn sign_jwt(id: i64, secret: &str, expiration_seconds: u64) -> Result<String, AppError> {
    let claims = Claims {
        sub: id.to_string(),
        exp: expiry(expiration_seconds)?,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::InternalServerError(e.to_string()))
}

/// Verifies and decodes a JWT string.
pub fn verify_jwt(token: &str, secret: &str) -> Result<Claims, AppError> {
    let token_data = decode(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AppError::AuthError("Invalid token".to_string()))?;

    Ok(token_data.claims)
}

/// Name of the cookie login sets for the owner's HTML pages.
pub const TOKEN_COOKIE: &str = "token";

/// Builds the `Set-Cookie` value that carries a fresh token.
pub fn token_cookie(token: &str, max_age_seconds: u64) -> String {
    format!("{TOKEN_COOKIE}={token}; Max-Age={max_age_seconds}; Path=/; HttpOnly; SameSite=Strict")
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
}

fn cookie_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == TOKEN_COOKIE)
        .map(|(_, token)| token)
}

async fn authorize(
    state: AppState,
    mut req: Request<Body>,
    next: Next,
    accept_cookie: bool,
) -> Result<Response, StatusCode> {
    if let Some(owner) = state.local_owner {
        let claims = Claims {
            sub: owner.to_string(),
            exp: expiry(state.config.jwt_expiration).map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?,
        };
        req.extensions_mut().insert(claims);
        return Ok(next.run(req).await);
    }

    let headers = req.headers();
    let token = match bearer_token(headers) {
        Some(token) => token,
        None if accept_cookie => cookie_token(headers).ok_or(StatusCode::UNAUTHORIZED)?,
        None => return Err(StatusCode::UNAUTHORIZED),
    };

    match verify_jwt(token, &state.config.jwt_secret) {
        Ok(claims) => {
            req.extensions_mut().insert(claims);
            Ok(next.run(req).await)
        }
        Err(_) => Err(StatusCode::UNAUTHORIZED),
    }
}

/// Axum Middleware: Authentication.
///
/// In single-tenant mode every request acts as the local owner and no header
/// is needed. Otherwise validates `Authorization: Bearer <token>` and injects
/// the `Claims` into the request extensions, or returns 401.
pub async fn auth_middleware(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    authorize(state, req, next, false).await
}

/// Like [`auth_middleware`], but also accepts the login cookie so a browser
/// can open the owner's read-only HTML pages.
pub async fn page_auth_middleware(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    authorize(state, req, next, true).await
}
