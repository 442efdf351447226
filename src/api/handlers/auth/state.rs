//! Auth state and configuration shared across handlers.

use jsonwebtoken::{DecodingKey, EncodingKey};
use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;

use crate::api::email::EmailSender;

const DEFAULT_SESSION_TTL_SECONDS: i64 = 10 * 60 * 60;
const DEFAULT_RESET_TOKEN_TTL_SECONDS: i64 = 60 * 60;

#[derive(Clone, Debug)]
pub struct AuthConfig {
    client_base_url: String,
    session_ttl_seconds: i64,
    reset_token_ttl_seconds: i64,
}

impl AuthConfig {
    #[must_use]
    pub fn new(client_base_url: String) -> Self {
        Self {
            client_base_url,
            session_ttl_seconds: DEFAULT_SESSION_TTL_SECONDS,
            reset_token_ttl_seconds: DEFAULT_RESET_TOKEN_TTL_SECONDS,
        }
    }

    #[must_use]
    pub fn with_session_ttl_seconds(mut self, seconds: i64) -> Self {
        self.session_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_reset_token_ttl_seconds(mut self, seconds: i64) -> Self {
        self.reset_token_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn client_base_url(&self) -> &str {
        &self.client_base_url
    }

    #[must_use]
    pub fn session_ttl_seconds(&self) -> i64 {
        self.session_ttl_seconds
    }

    #[must_use]
    pub fn reset_token_ttl_seconds(&self) -> i64 {
        self.reset_token_ttl_seconds
    }
}

/// HMAC key pair for signing and validating session tokens.
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl SessionKeys {
    #[must_use]
    pub fn from_secret(secret: &SecretString) -> Self {
        let bytes = secret.expose_secret().as_bytes();
        Self {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
        }
    }

    pub(crate) fn encoding(&self) -> &EncodingKey {
        &self.encoding
    }

    pub(crate) fn decoding(&self) -> &DecodingKey {
        &self.decoding
    }
}

pub struct AuthState {
    config: AuthConfig,
    keys: SessionKeys,
    email_sender: Arc<dyn EmailSender>,
}

impl AuthState {
    #[must_use]
    pub fn new(config: AuthConfig, keys: SessionKeys, email_sender: Arc<dyn EmailSender>) -> Self {
        Self {
            config,
            keys,
            email_sender,
        }
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    #[must_use]
    pub fn keys(&self) -> &SessionKeys {
        &self.keys
    }

    pub(crate) fn email_sender(&self) -> &dyn EmailSender {
        self.email_sender.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::email::LogEmailSender;

    #[test]
    fn auth_config_defaults_and_overrides() {
        let config = AuthConfig::new("http://localhost:5173".to_string());

        assert_eq!(config.client_base_url(), "http://localhost:5173");
        assert_eq!(config.session_ttl_seconds(), 36_000);
        assert_eq!(config.reset_token_ttl_seconds(), 3_600);

        let config = config
            .with_session_ttl_seconds(120)
            .with_reset_token_ttl_seconds(30);

        assert_eq!(config.session_ttl_seconds(), 120);
        assert_eq!(config.reset_token_ttl_seconds(), 30);
    }

    #[test]
    fn auth_state_constructs_with_log_sender() {
        let config = AuthConfig::new("http://localhost:5173".to_string());
        let keys = SessionKeys::from_secret(&SecretString::from("sekret"));
        let state = AuthState::new(config, keys, Arc::new(LogEmailSender));
        assert_eq!(state.config().client_base_url(), "http://localhost:5173");
    }
}
