//! Admin-only identity listing.
//!
//! The one portal route that lives behind both protection stages: the
//! session verifier attaches the identity and the role gate requires
//! `admin`. Returns only fields safe to show; credential and reset state
//! never leave the storage layer.

use axum::{extract::Extension, Json};
use sqlx::PgPool;
use tracing::instrument;

use super::auth::{storage::list_identities, types::IdentityResponse, AuthUser};
use crate::api::error::Error;

#[utoipa::path(
    get,
    path = "/api/auth/users",
    responses(
        (status = 200, description = "All identities", body = [IdentityResponse]),
        (status = 401, description = "No or invalid session credential"),
        (status = 403, description = "Authenticated but not an admin"),
    ),
    security(("bearer" = [])),
    tag = "users"
)]
#[instrument(skip(pool, user))]
pub async fn list_users(
    pool: Extension<PgPool>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<IdentityResponse>>, Error> {
    tracing::debug!(admin = %user.email, "listing identities");
    let identities = list_identities(&pool).await?;
    Ok(Json(
        identities.into_iter().map(IdentityResponse::from).collect(),
    ))
}
