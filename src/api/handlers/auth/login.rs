//! Credential verification and session issuance.

use axum::{extract::Extension, http::HeaderMap, Json};
use sqlx::PgPool;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, instrument};

use super::{
    password::verify_secret,
    role::Role,
    session::{extract_bearer_token, mint_session},
    state::AuthState,
    storage::{find_by_email, Identity},
    types::{LoginRequest, LoginResponse, LogoutResponse},
};
use crate::api::error::Error;

/// Decide whether a stored identity admits the presented credentials.
///
/// A login is admitted iff the claimed role equals the stored role and the
/// password verifies against a non-null stored hash. Every failure returns
/// the same `Unauthorized` so callers cannot tell which check rejected.
pub(super) fn check_credentials(
    identity: &Identity,
    password: &str,
    claimed_role: Option<&str>,
) -> Result<(), Error> {
    // An unparsable claimed role is just another mismatch.
    let claimed = claimed_role.and_then(|value| Role::from_str(value).ok());
    if claimed != Some(identity.role) {
        debug!(email = %identity.email, "claimed role does not match stored role");
        return Err(Error::invalid_credentials());
    }

    // A null hash means the account has no password yet and cannot log in.
    let verified = identity
        .password_hash
        .as_deref()
        .is_some_and(|hash| verify_secret(password, hash));
    if !verified {
        return Err(Error::invalid_credentials());
    }

    Ok(())
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "Missing email or password"),
        (status = 401, description = "Invalid credentials"),
    ),
    tag = "auth"
)]
#[instrument(skip(pool, auth_state, payload))]
pub async fn login(
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<LoginRequest>>,
) -> Result<Json<LoginResponse>, Error> {
    let Some(Json(request)) = payload else {
        return Err(Error::Validation(
            "Email and password are required.".to_string(),
        ));
    };
    if request.email.is_empty() || request.password.is_empty() {
        return Err(Error::Validation(
            "Email and password are required.".to_string(),
        ));
    }

    let identity = find_by_email(&pool, &request.email)
        .await?
        .ok_or_else(Error::invalid_credentials)?;

    check_credentials(&identity, &request.password, request.role.as_deref())?;

    let token = mint_session(
        auth_state.keys(),
        identity.id,
        &identity.email,
        identity.role,
        auth_state.config().session_ttl_seconds(),
    )?;

    Ok(Json(LoginResponse {
        message: "Login successful".to_string(),
        token,
        data: identity.into(),
    }))
}

#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 200, description = "Logout acknowledged", body = LogoutResponse),
        (status = 400, description = "Missing credential"),
    ),
    tag = "auth"
)]
pub async fn logout(headers: HeaderMap) -> Result<Json<LogoutResponse>, Error> {
    // Sessions are self-contained and carry no server-side state; the client
    // discards the token. There is no revocation list in this design.
    if extract_bearer_token(&headers).is_none() {
        return Err(Error::Validation("No token provided".to_string()));
    }

    Ok(Json(LogoutResponse {
        message: "Logout successful".to_string(),
        success: true,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::handlers::auth::password::hash_secret;
    use anyhow::Result;
    use uuid::Uuid;

    fn identity(password_hash: Option<String>) -> Identity {
        Identity {
            id: Uuid::new_v4(),
            name: "Alice".to_string(),
            email: "a@x.com".to_string(),
            role: Role::Student,
            password_hash,
        }
    }

    #[test]
    fn matching_credentials_are_admitted() -> Result<()> {
        let identity = identity(Some(hash_secret("secret1")?));
        assert!(check_credentials(&identity, "secret1", Some("student")).is_ok());
        Ok(())
    }

    #[test]
    fn wrong_password_is_rejected_uniformly() -> Result<()> {
        let identity = identity(Some(hash_secret("secret1")?));
        let err = check_credentials(&identity, "secret2", Some("student"))
            .expect_err("wrong password must be rejected");
        assert_eq!(err.to_string(), "Invalid credentials.");
        Ok(())
    }

    #[test]
    fn role_mismatch_is_rejected_uniformly() -> Result<()> {
        let identity = identity(Some(hash_secret("secret1")?));

        let err = check_credentials(&identity, "secret1", Some("faculty"))
            .expect_err("mismatched role must be rejected");
        assert_eq!(err.to_string(), "Invalid credentials.");

        // Unparsable and missing claimed roles read the same as a mismatch.
        let err = check_credentials(&identity, "secret1", Some("janitor"))
            .expect_err("unknown role must be rejected");
        assert_eq!(err.to_string(), "Invalid credentials.");

        let err = check_credentials(&identity, "secret1", None)
            .expect_err("missing role must be rejected");
        assert_eq!(err.to_string(), "Invalid credentials.");
        Ok(())
    }

    #[test]
    fn null_password_hash_is_rejected_uniformly() {
        let identity = identity(None);
        let err = check_credentials(&identity, "secret1", Some("student"))
            .expect_err("passwordless account must be rejected");
        assert_eq!(err.to_string(), "Invalid credentials.");
    }
}
