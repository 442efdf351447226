//! Email delivery abstraction for password-reset links.
//!
//! The auth core only constructs the reset link and hands it to an
//! `EmailSender`; how the message leaves the building (SMTP, provider API)
//! is the sender implementation's concern. The default sender for local dev
//! is `LogEmailSender`, which logs the recipient and returns `Ok(())`.

use anyhow::Result;
use tracing::info;

#[derive(Clone, Debug)]
pub struct EmailMessage {
    pub to_email: String,
    pub template: String,
    pub payload_json: String,
}

/// Email delivery abstraction used by the reset flow.
pub trait EmailSender: Send + Sync {
    /// Deliver a message or return an error so the handler can report failure.
    fn send(&self, message: &EmailMessage) -> Result<()>;
}

/// Local dev sender that logs instead of sending real email.
///
/// The payload carries the reset link with the plaintext token, so only the
/// recipient and template are logged.
#[derive(Clone, Debug)]
pub struct LogEmailSender;

impl EmailSender for LogEmailSender {
    fn send(&self, message: &EmailMessage) -> Result<()> {
        info!(
            to_email = %message.to_email,
            template = %message.template,
            "email send stub"
        );
        Ok(())
    }
}

/// Build the front-end reset link included in outbound emails.
///
/// The plaintext token rides as a path segment appended to the client base
/// URL; expiry is enforced server-side only.
pub(crate) fn build_reset_url(client_base_url: &str, token: &str) -> String {
    let base = client_base_url.trim_end_matches('/');
    format!("{base}/reset-password/{token}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_reset_url_trims_trailing_slash() {
        let url = build_reset_url("http://localhost:5173/", "abc123");
        assert_eq!(url, "http://localhost:5173/reset-password/abc123");
    }

    #[test]
    fn build_reset_url_keeps_plain_base() {
        let url = build_reset_url("https://portal.example.edu", "abc123");
        assert_eq!(url, "https://portal.example.edu/reset-password/abc123");
    }

    #[test]
    fn log_sender_accepts_messages() -> Result<()> {
        let message = EmailMessage {
            to_email: "a@x.com".to_string(),
            template: "reset_password".to_string(),
            payload_json: "{}".to_string(),
        };
        LogEmailSender.send(&message)
    }
}
