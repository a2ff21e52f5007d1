use serde::{Deserialize, Serialize};

use super::profile::UserProfile;

pub const DEFAULT_TOKEN_TYPE: &str = "Bearer";

/// Access/refresh credential pair plus its type tag. `access_token` is
/// `Some` exactly when the session is authenticated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TokenSet {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub token_type: String,
}

impl Default for TokenSet {
    fn default() -> Self {
        Self {
            access_token: None,
            refresh_token: None,
            token_type: DEFAULT_TOKEN_TYPE.to_string(),
        }
    }
}

/// In-memory session snapshot. `user` and `tokens.access_token` are set and
/// cleared together, never independently.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub user: Option<UserProfile>,
    pub tokens: TokenSet,
    pub bootstrapping: bool,
}

impl SessionState {
    pub fn authenticated(&self) -> bool {
        self.tokens.access_token.is_some() && self.user.is_some()
    }
}
