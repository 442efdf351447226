//! HTTP server wiring: pool, shared state, router, and tower layers.

use crate::cli::globals::GlobalArgs;
use anyhow::{anyhow, Context, Result};
use axum::{
    body::Body,
    extract::MatchedPath,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderName, HeaderValue, Method, Request,
    },
    middleware,
    routing::{get, post},
    Extension, Router,
};
use sqlx::postgres::PgPoolOptions;
use std::{sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::PropagateRequestIdLayer,
    set_header::SetRequestHeaderLayer,
    trace::TraceLayer,
};
use tracing::{info, info_span, Span};
use ulid::Ulid;
use url::Url;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod email;
pub mod error;
pub mod handlers;
mod openapi;

use email::LogEmailSender;
use handlers::auth::{self, role_gate, verify_session, AuthConfig, AuthState, Role, SessionKeys};
use handlers::{health, users};

/// Start the server
/// # Errors
/// Return error if failed to start the server
pub async fn serve(port: u16, dsn: String, globals: &GlobalArgs) -> Result<()> {
    // Connect to database
    let pool = PgPoolOptions::new()
        .min_connections(1)
        .max_connections(5)
        .max_lifetime(Duration::from_secs(60 * 2))
        .test_before_acquire(true)
        .connect(&dsn)
        .await
        .context("Failed to connect to database")?;

    let auth_state = Arc::new(AuthState::new(
        AuthConfig::new(globals.client_base_url.clone()),
        SessionKeys::from_secret(&globals.token_secret),
        Arc::new(LogEmailSender),
    ));

    let origin = client_origin(auth_state.config().client_base_url())?;
    let cors = CorsLayer::new()
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_methods([Method::GET, Method::POST])
        .allow_origin(AllowOrigin::exact(origin))
        .allow_credentials(true);

    let app = router(auth_state)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(cors),
        )
        .layer(Extension(pool));

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Gracefully shutdown");
        })
        .await?;

    Ok(())
}

/// Build the application router.
///
/// The users route sits behind both protection stages: `verify_session`
/// (outer) authenticates, `role_gate` (inner) authorizes. `route_layer`
/// ordering makes the last-added layer run first.
pub fn router(auth_state: Arc<AuthState>) -> Router {
    let protected = Router::new()
        .route("/api/auth/users", get(users::list_users))
        .route_layer(middleware::from_fn_with_state(Role::Admin, role_gate))
        .route_layer(middleware::from_fn_with_state(
            auth_state.clone(),
            verify_session,
        ));

    Router::new()
        .route("/health", get(health::health))
        .route("/api/auth/login", post(auth::login::login))
        .route("/api/auth/logout", post(auth::login::logout))
        .route("/api/auth/request-reset", post(auth::reset::request_reset))
        .route(
            "/api/auth/verify-reset/:token",
            get(auth::reset::verify_reset_token),
        )
        .route("/api/auth/reset-password", post(auth::reset::reset_password))
        .merge(protected)
        .merge(
            SwaggerUi::new("/docs").url("/api-docs/openapi.json", openapi::ApiDoc::openapi()),
        )
        .layer(Extension(auth_state))
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}

fn client_origin(client_base_url: &str) -> Result<HeaderValue> {
    let parsed = Url::parse(client_base_url)
        .with_context(|| format!("Invalid client base URL: {client_base_url}"))?;
    let host = parsed
        .host_str()
        .ok_or_else(|| anyhow!("Client base URL must include a valid host: {client_base_url}"))?;
    let port = parsed
        .port()
        .map_or_else(String::new, |port| format!(":{port}"));
    let origin = format!("{}://{}{}", parsed.scheme(), host, port);
    HeaderValue::from_str(&origin).context("Failed to build client origin header")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_origin_strips_path() -> Result<()> {
        let origin = client_origin("http://localhost:5173/app/")?;
        assert_eq!(origin, HeaderValue::from_static("http://localhost:5173"));
        Ok(())
    }

    #[test]
    fn client_origin_rejects_garbage() {
        assert!(client_origin("not a url").is_err());
    }
}
