//! Session credential issuance and the two route-protection stages.
//!
//! A session is a self-contained signed token (HS256) carrying the identity
//! id, email, role, and a fixed expiry set at mint time. Verification is a
//! pure function of the signature and the embedded expiry; no database lookup
//! happens on the request path, so the role is trusted as of issuance.
//!
//! Route protection composes two independent middleware stages:
//! `verify_session` (authentication: who you are) and `role_gate`
//! (authorization: what you may do). The gate is always layered inside the
//! verifier and never substitutes for it.

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use super::{role::Role, state::AuthState, state::SessionKeys};
use crate::api::error::Error;

/// Claims embedded in a session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

/// Authenticated identity context attached to the request by `verify_session`.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.sub,
            email: claims.email,
            role: claims.role,
        }
    }
}

/// Mint a session token for an authenticated identity.
///
/// # Errors
/// Returns `Internal` if signing fails.
pub fn mint_session(
    keys: &SessionKeys,
    id: Uuid,
    email: &str,
    role: Role,
    ttl_seconds: i64,
) -> Result<String, Error> {
    mint_session_at(keys, id, email, role, ttl_seconds, Utc::now().timestamp())
}

/// Mint with an explicit issue time; expiry is fixed at `iat + ttl` and is
/// not refreshable.
pub(crate) fn mint_session_at(
    keys: &SessionKeys,
    id: Uuid,
    email: &str,
    role: Role,
    ttl_seconds: i64,
    iat: i64,
) -> Result<String, Error> {
    let claims = Claims {
        sub: id,
        email: email.to_string(),
        role,
        iat,
        exp: iat.saturating_add(ttl_seconds),
    };
    encode(&Header::default(), &claims, keys.encoding())
        .map_err(|err| Error::Internal(anyhow::anyhow!("failed to sign session token: {err}")))
}

/// Decode and validate a session token.
///
/// Signature failures, malformed tokens, and expired tokens all map to the
/// same `Unauthorized` response.
pub fn decode_session(keys: &SessionKeys, token: &str) -> Result<Claims, Error> {
    // Zero leeway: a token is rejected the second its embedded expiry passes.
    let mut validation = Validation::default();
    validation.leeway = 0;

    decode::<Claims>(token, keys.decoding(), &validation)
        .map(|data| data.claims)
        .map_err(|_| Error::Unauthorized("Invalid or expired token".to_string()))
}

/// Pull the bearer token out of the Authorization header.
pub(crate) fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let trimmed = value.trim();
    let token = trimmed
        .strip_prefix("Bearer ")
        .or_else(|| trimmed.strip_prefix("bearer "))?
        .trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

/// Authentication stage: validate the bearer credential and attach the
/// decoded identity to the request.
///
/// # Errors
/// `Unauthorized` when the header is absent or the token is invalid/expired.
pub async fn verify_session(
    State(state): State<Arc<AuthState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, Error> {
    let token = extract_bearer_token(request.headers())
        .ok_or_else(|| Error::Unauthorized("No token provided".to_string()))?;
    let claims = decode_session(state.keys(), &token)?;
    request.extensions_mut().insert(AuthUser::from(claims));
    Ok(next.run(request).await)
}

/// Authorization stage: compare the authenticated role to the route's
/// required role.
///
/// Applied with `middleware::from_fn_with_state(required_role, role_gate)`,
/// layered inside `verify_session`. A request that somehow reaches the gate
/// without an authenticated identity is rejected as unauthenticated.
///
/// # Errors
/// `Forbidden` on role mismatch; `Unauthorized` if no identity was attached.
pub async fn role_gate(
    State(required): State<Role>,
    request: Request,
    next: Next,
) -> Result<Response, Error> {
    let user = request
        .extensions()
        .get::<AuthUser>()
        .ok_or_else(|| Error::Unauthorized("No token provided".to_string()))?;
    if user.role != required {
        return Err(Error::access_denied());
    }
    Ok(next.run(request).await)
}
