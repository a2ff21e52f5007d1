//! Unified error model for the session core.
//! One serializable enum crosses the transport, extraction, and persistence
//! layers so embedding applications get a single failure surface, along with
//! the mapping to the message a user should actually see.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthError {
    /// Network or HTTP-layer failure; the service never answered usefully.
    Transport { code: String, message: String },
    /// The service answered with a body we cannot parse.
    Protocol { code: String, message: String },
    /// The service claimed success but the payload was missing the token or
    /// the user record.
    IncompleteCredentials { code: String, message: String },
    /// The service explicitly rejected the attempt; `message` is the
    /// server-supplied reason.
    Rejected { code: String, message: String },
    /// Local persistence failure (recovered internally, rarely surfaced).
    Storage { code: String, message: String },
    /// Another authentication attempt is already in flight.
    Busy { code: String, message: String },
    /// Invalid base URL or endpoint configuration.
    Config { code: String, message: String },
}

impl AuthError {
    pub fn code_str(&self) -> &str {
        match self {
            AuthError::Transport { code, .. }
            | AuthError::Protocol { code, .. }
            | AuthError::IncompleteCredentials { code, .. }
            | AuthError::Rejected { code, .. }
            | AuthError::Storage { code, .. }
            | AuthError::Busy { code, .. }
            | AuthError::Config { code, .. } => code.as_str(),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            AuthError::Transport { message, .. }
            | AuthError::Protocol { message, .. }
            | AuthError::IncompleteCredentials { message, .. }
            | AuthError::Rejected { message, .. }
            | AuthError::Storage { message, .. }
            | AuthError::Busy { message, .. }
            | AuthError::Config { message, .. } => message.as_str(),
        }
    }

    pub fn transport(code: impl Into<String>, msg: impl Into<String>) -> Self { AuthError::Transport { code: code.into(), message: msg.into() } }
    pub fn protocol(code: impl Into<String>, msg: impl Into<String>) -> Self { AuthError::Protocol { code: code.into(), message: msg.into() } }
    pub fn incomplete(code: impl Into<String>, msg: impl Into<String>) -> Self { AuthError::IncompleteCredentials { code: code.into(), message: msg.into() } }
    pub fn rejected(code: impl Into<String>, msg: impl Into<String>) -> Self { AuthError::Rejected { code: code.into(), message: msg.into() } }
    pub fn storage(code: impl Into<String>, msg: impl Into<String>) -> Self { AuthError::Storage { code: code.into(), message: msg.into() } }
    pub fn busy(code: impl Into<String>, msg: impl Into<String>) -> Self { AuthError::Busy { code: code.into(), message: msg.into() } }
    pub fn config(code: impl Into<String>, msg: impl Into<String>) -> Self { AuthError::Config { code: code.into(), message: msg.into() } }

    /// Map to the string shown to the end user. Server rejections keep the
    /// server's own wording; everything else gets a fixed phrase.
    pub fn user_message(&self) -> &str {
        match self {
            AuthError::Transport { .. } => "unable to reach the authentication service",
            AuthError::Protocol { .. } => "invalid response from the authentication service",
            AuthError::IncompleteCredentials { .. } => "invalid response: missing token or user data",
            AuthError::Rejected { message, .. } => message.as_str(),
            AuthError::Storage { .. } => "session storage is unavailable",
            AuthError::Busy { .. } => "another sign-in attempt is already in progress",
            AuthError::Config { message, .. } => message.as_str(),
        }
    }
}

impl Display for AuthError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code_str(), self.message())
    }
}

impl std::error::Error for AuthError {}

pub type AuthResult<T> = Result<T, AuthError>;

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        // Default mapping: treat as Transport unless classified elsewhere
        AuthError::Transport { code: "transport_error".into(), message: err.to_string() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_message_mapping() {
        assert_eq!(
            AuthError::transport("connect_failed", "tcp refused").user_message(),
            "unable to reach the authentication service"
        );
        assert_eq!(
            AuthError::protocol("invalid_body", "not json").user_message(),
            "invalid response from the authentication service"
        );
        assert_eq!(
            AuthError::incomplete("missing_credentials", "no token").user_message(),
            "invalid response: missing token or user data"
        );
        assert_eq!(
            AuthError::rejected("server_rejected", "Invalid email or password").user_message(),
            "Invalid email or password"
        );
        assert_eq!(
            AuthError::busy("login_inflight", "pending").user_message(),
            "another sign-in attempt is already in progress"
        );
    }

    #[test]
    fn serializes_with_type_tag() {
        let err = AuthError::rejected("server_rejected", "nope");
        let v = serde_json::to_value(&err).unwrap();
        assert_eq!(v["type"], "rejected");
        assert_eq!(v["code"], "server_rejected");
        assert_eq!(v["message"], "nope");
    }
}
