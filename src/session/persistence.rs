//! Write-through, read-reconcile persistence for the session record.
//! Backends are ordered, preferred first. Writes fan out to every backend
//! independently (no cross-backend transaction); the reconciliation step in
//! `read_session` is the sole repair mechanism for a half-written pair.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use super::profile::UserProfile;
use super::state::{TokenSet, DEFAULT_TOKEN_TYPE};
use crate::store::StorageBackend;

pub const KEY_ACCESS_TOKEN: &str = "access_token";
pub const KEY_REFRESH_TOKEN: &str = "refresh_token";
pub const KEY_TOKEN_TYPE: &str = "token_type";
pub const KEY_USER: &str = "auth_user";

const SESSION_KEYS: [&str; 4] = [KEY_ACCESS_TOKEN, KEY_REFRESH_TOKEN, KEY_TOKEN_TYPE, KEY_USER];

pub struct SessionPersistence {
    backends: Vec<Arc<dyn StorageBackend>>,
    ttl: Duration,
}

impl SessionPersistence {
    pub fn new(backends: Vec<Arc<dyn StorageBackend>>, ttl: Duration) -> Self {
        Self { backends, ttl }
    }

    /// Serialize the four session fields and write each through every
    /// backend. An absent refresh token removes any stale stored one.
    pub fn write_session(&self, tokens: &TokenSet, user: &UserProfile) {
        let user_json = match serde_json::to_string(user) {
            Ok(s) => s,
            Err(e) => {
                warn!("session write skipped: profile not serializable: {}", e);
                return;
            }
        };
        for b in &self.backends {
            match tokens.access_token.as_deref() {
                Some(t) => b.set(KEY_ACCESS_TOKEN, t, Some(self.ttl)),
                None => b.remove(KEY_ACCESS_TOKEN),
            }
            match tokens.refresh_token.as_deref() {
                Some(t) => b.set(KEY_REFRESH_TOKEN, t, Some(self.ttl)),
                None => b.remove(KEY_REFRESH_TOKEN),
            }
            b.set(KEY_TOKEN_TYPE, &tokens.token_type, Some(self.ttl));
            b.set(KEY_USER, &user_json, Some(self.ttl));
        }
    }

    fn read_from(&self, b: &Arc<dyn StorageBackend>) -> Option<(TokenSet, UserProfile)> {
        let access = b.get(KEY_ACCESS_TOKEN)?;
        let raw_user = b.get(KEY_USER)?;
        let user: UserProfile = match serde_json::from_str(&raw_user) {
            Ok(u) => u,
            Err(e) => {
                warn!("stored profile in {} store is corrupt, discarding: {}", b.name(), e);
                b.remove(KEY_USER);
                return None;
            }
        };
        let tokens = TokenSet {
            access_token: Some(access),
            refresh_token: b.get(KEY_REFRESH_TOKEN),
            token_type: b.get(KEY_TOKEN_TYPE).unwrap_or_else(|| DEFAULT_TOKEN_TYPE.to_string()),
        };
        Some((tokens, user))
    }

    /// First backend holding a complete record (access token AND readable
    /// profile) wins. A hit on a fallback is re-written through every backend
    /// so the preferred store heals itself.
    pub fn read_session(&self) -> Option<(TokenSet, UserProfile)> {
        for (i, b) in self.backends.iter().enumerate() {
            if let Some((tokens, user)) = self.read_from(b) {
                if i > 0 {
                    debug!("session recovered from {} store, reconciling", b.name());
                    self.write_session(&tokens, &user);
                }
                return Some((tokens, user));
            }
        }
        None
    }

    /// Remove every session key from every backend. Safe to call repeatedly.
    pub fn clear_session(&self) {
        for b in &self.backends {
            for k in SESSION_KEYS {
                b.remove(k);
            }
        }
    }
}
