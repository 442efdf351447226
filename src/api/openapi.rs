//! OpenAPI document for the portal API.

use utoipa::OpenApi;

use super::handlers::auth::types::{
    AckResponse, CompleteResetRequest, IdentityResponse, LoginRequest, LoginResponse,
    LogoutResponse, ResetRequest, VerifyResetResponse,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        super::handlers::health::health,
        super::handlers::auth::login::login,
        super::handlers::auth::login::logout,
        super::handlers::auth::reset::request_reset,
        super::handlers::auth::reset::verify_reset_token,
        super::handlers::auth::reset::reset_password,
        super::handlers::users::list_users,
    ),
    components(schemas(
        LoginRequest,
        LoginResponse,
        LogoutResponse,
        IdentityResponse,
        ResetRequest,
        AckResponse,
        VerifyResetResponse,
        CompleteResetRequest,
    )),
    tags(
        (name = "auth", description = "Login, logout, and password reset"),
        (name = "users", description = "Identity listing"),
        (name = "health", description = "Service health"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_auth_paths() {
        let doc = ApiDoc::openapi();
        let paths = doc.paths.paths;
        assert!(paths.contains_key("/api/auth/login"));
        assert!(paths.contains_key("/api/auth/request-reset"));
        assert!(paths.contains_key("/api/auth/verify-reset/{token}"));
        assert!(paths.contains_key("/api/auth/reset-password"));
        assert!(paths.contains_key("/api/auth/users"));
        assert!(paths.contains_key("/health"));
    }
}
