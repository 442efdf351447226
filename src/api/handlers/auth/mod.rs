//! Authentication and password-reset core.
//!
//! Composed of credential verification (`login`), session issuance and
//! verification (`session`), the per-route role gate, and the reset-token
//! life cycle (`reset`). Everything else in the portal sits behind these
//! stages.

pub mod login;
pub mod password;
pub mod reset;
pub mod role;
pub mod session;
pub mod state;
pub mod storage;
pub mod types;

mod utils;

pub use role::Role;
pub use session::{role_gate, verify_session, AuthUser};
pub use state::{AuthConfig, AuthState, SessionKeys};
