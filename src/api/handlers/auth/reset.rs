//! Password-reset token life cycle: issue, verify, consume.
//!
//! A token moves NoToken -> Issued (hash + expiry persisted) -> Consumed
//! (both fields cleared on successful reset). Expiry is not a stored state;
//! it is a validity predicate applied when candidates are fetched. A new
//! request while a token is live overwrites the pair in place and restarts
//! the clock, so the previous token simply stops matching.

use axum::{
    extract::{Extension, Path},
    Json,
};
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use super::{
    password::{hash_secret, verify_secret},
    state::AuthState,
    storage::{
        complete_reset, find_by_email, live_reset_candidates, store_reset_token, ResetCandidate,
    },
    types::{AckResponse, CompleteResetRequest, ResetRequest, VerifyResetResponse},
    utils::{generate_reset_token, normalize_token},
};
use crate::api::email::{build_reset_url, EmailMessage};
use crate::api::error::Error;

/// Scan the live candidates for one whose stored hash matches the plaintext
/// token. Returns the first match.
///
/// The caller fetches only unexpired, non-null candidates, so "never
/// existed", "expired", and "already consumed" are all the same non-match.
pub(super) fn match_reset_token(token: &str, candidates: &[ResetCandidate]) -> Option<Uuid> {
    candidates
        .iter()
        .find(|candidate| verify_secret(token, &candidate.token_hash))
        .map(|candidate| candidate.user_id)
}

#[utoipa::path(
    post,
    path = "/api/auth/request-reset",
    request_body = ResetRequest,
    responses(
        (status = 200, description = "Reset email dispatched", body = AckResponse),
        (status = 400, description = "Missing email"),
        (status = 404, description = "Unknown email"),
    ),
    tag = "auth"
)]
#[instrument(skip(pool, auth_state, payload))]
pub async fn request_reset(
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<ResetRequest>>,
) -> Result<Json<AckResponse>, Error> {
    let Some(Json(request)) = payload else {
        return Err(Error::Validation("Email is required".to_string()));
    };
    if request.email.is_empty() {
        return Err(Error::Validation("Email is required".to_string()));
    }
    // A malformed address can never match a stored identity; reject before
    // the lookup.
    if !crate::api::handlers::valid_email(&request.email) {
        return Err(Error::Validation("A valid email is required".to_string()));
    }

    let identity = find_by_email(&pool, &request.email)
        .await?
        .ok_or(Error::NotFound("User"))?;

    // Mint the plaintext token, persist only its hash, and hand the link to
    // the dispatcher. The plaintext is never stored or logged.
    let token = generate_reset_token()?;
    let token_hash = hash_secret(&token)?;
    store_reset_token(
        &pool,
        identity.id,
        &token_hash,
        auth_state.config().reset_token_ttl_seconds(),
    )
    .await?;

    let reset_url = build_reset_url(auth_state.config().client_base_url(), &token);
    let payload_json = serde_json::to_string(&json!({
        "email": identity.email,
        "reset_url": reset_url,
    }))
    .map_err(|err| Error::Internal(err.into()))?;

    auth_state.email_sender().send(&EmailMessage {
        to_email: identity.email.clone(),
        template: "reset_password".to_string(),
        payload_json,
    })?;

    info!(user_id = %identity.id, "password reset token issued");

    Ok(Json(AckResponse {
        message: "Password reset email sent successfully".to_string(),
    }))
}

#[utoipa::path(
    get,
    path = "/api/auth/verify-reset/{token}",
    params(("token" = String, Path, description = "Plaintext reset token from the emailed link")),
    responses(
        (status = 200, description = "Token is valid", body = VerifyResetResponse),
        (status = 400, description = "Missing, invalid, or expired token"),
    ),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn verify_reset_token(
    pool: Extension<PgPool>,
    Path(token): Path<String>,
) -> Result<Json<VerifyResetResponse>, Error> {
    let token = normalize_token(&token);
    if token.is_empty() {
        return Err(Error::Validation("Reset token is required".to_string()));
    }

    let candidates = live_reset_candidates(&pool).await?;
    let user_id = match_reset_token(token, &candidates).ok_or_else(Error::invalid_reset_token)?;

    Ok(Json(VerifyResetResponse {
        message: "Token is valid".to_string(),
        user_id,
    }))
}

#[utoipa::path(
    post,
    path = "/api/auth/reset-password",
    request_body = CompleteResetRequest,
    responses(
        (status = 200, description = "Password reset successful", body = AckResponse),
        (status = 400, description = "Missing fields or invalid/expired token"),
    ),
    tag = "auth"
)]
#[instrument(skip(pool, payload))]
pub async fn reset_password(
    pool: Extension<PgPool>,
    payload: Option<Json<CompleteResetRequest>>,
) -> Result<Json<AckResponse>, Error> {
    let Some(Json(request)) = payload else {
        return Err(Error::Validation(
            "Token and new password are required".to_string(),
        ));
    };
    let token = normalize_token(&request.token);
    if token.is_empty() || request.new_password.is_empty() {
        return Err(Error::Validation(
            "Token and new password are required".to_string(),
        ));
    }

    let candidates = live_reset_candidates(&pool).await?;
    let user_id = match_reset_token(token, &candidates).ok_or_else(Error::invalid_reset_token)?;

    // Write the new hash and clear the token pair in one update; the token
    // must never stay valid once the password changes.
    let password_hash = hash_secret(&request.new_password)?;
    complete_reset(&pool, user_id, &password_hash).await?;

    info!(user_id = %user_id, "password reset completed");

    Ok(Json(AckResponse {
        message: "Password reset successful".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    fn candidate(token: &str) -> Result<ResetCandidate> {
        Ok(ResetCandidate {
            user_id: Uuid::new_v4(),
            token_hash: hash_secret(token)?,
        })
    }

    #[test]
    fn matching_scan_finds_live_token() -> Result<()> {
        let wanted = candidate("token-one")?;
        let other = candidate("token-two")?;
        let candidates = vec![other, wanted.clone()];

        assert_eq!(
            match_reset_token("token-one", &candidates),
            Some(wanted.user_id)
        );
        assert_eq!(
            match_reset_token("token-two", &candidates),
            Some(candidates[0].user_id)
        );
        Ok(())
    }

    #[test]
    fn unknown_token_does_not_match() -> Result<()> {
        let candidates = vec![candidate("token-one")?];
        assert_eq!(match_reset_token("token-three", &candidates), None);
        Ok(())
    }

    #[test]
    fn superseded_token_stops_matching() -> Result<()> {
        // A second request overwrote the stored hash in place: the candidate
        // set now only contains the hash of the newer token.
        let user_id = Uuid::new_v4();
        let second = ResetCandidate {
            user_id,
            token_hash: hash_secret("token-second")?,
        };
        let candidates = vec![second];

        assert_eq!(match_reset_token("token-first", &candidates), None);
        assert_eq!(match_reset_token("token-second", &candidates), Some(user_id));
        Ok(())
    }

    #[test]
    fn consumed_token_is_absent_from_candidates() -> Result<()> {
        // After a successful reset both fields are cleared, so the scan sees
        // no candidate at all for that identity.
        let candidates: Vec<ResetCandidate> = Vec::new();
        assert_eq!(match_reset_token("token-one", &candidates), None);
        Ok(())
    }
}
