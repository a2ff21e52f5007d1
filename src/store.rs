//! Pluggable key/value stores for the persisted session record.
//! Two backends with different lifetime and encoding characteristics sit
//! behind one trait so the persistence layer can treat them interchangeably.
//! A storage outage must never take the session manager down: every
//! underlying failure is logged and degrades to "absent".

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use base64::Engine;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::warn;

pub trait StorageBackend: Send + Sync {
    /// Store `value` under `key`; `ttl` bounds its lifetime when given.
    fn set(&self, key: &str, value: &str, ttl: Option<Duration>);
    /// Fetch the live value for `key`, dropping it if expired.
    fn get(&self, key: &str) -> Option<String>;
    fn remove(&self, key: &str);
    /// Short tag used in log lines.
    fn name(&self) -> &'static str;
}

/// Process-local store. Fast, preferred on read, gone on restart.
#[derive(Default)]
pub struct MemoryBackend {
    entries: RwLock<HashMap<String, (String, Option<Instant>)>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageBackend for MemoryBackend {
    fn set(&self, key: &str, value: &str, ttl: Option<Duration>) {
        let expires = ttl.map(|t| Instant::now() + t);
        self.entries.write().insert(key.to_string(), (value.to_string(), expires));
    }

    fn get(&self, key: &str) -> Option<String> {
        // prune lazily on read
        let mut drop_key = false;
        let out = {
            let map = self.entries.read();
            match map.get(key) {
                Some((v, exp)) => {
                    if exp.map(|e| e > Instant::now()).unwrap_or(true) {
                        Some(v.clone())
                    } else {
                        drop_key = true;
                        None
                    }
                }
                None => None,
            }
        };
        if drop_key {
            self.entries.write().remove(key);
        }
        out
    }

    fn remove(&self, key: &str) {
        self.entries.write().remove(key);
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[derive(Debug, thiserror::Error)]
enum StoreError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("envelope: {0}")]
    Envelope(#[from] serde_json::Error),
    #[error("encoding: {0}")]
    Encoding(#[from] base64::DecodeError),
    #[error("value is not utf-8")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// On-disk envelope: cookie-style encoded value plus an absolute expiry.
#[derive(Serialize, Deserialize)]
struct Envelope {
    value: String,
    #[serde(default)]
    expires_at: Option<DateTime<Utc>>,
}

/// Durable store surviving restarts. Values are base64url-encoded (no
/// padding) the way a cookie jar would hold them; expiry is an absolute
/// timestamp so it holds across processes.
pub struct CookieFileBackend {
    root: PathBuf,
}

impl CookieFileBackend {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.ck"))
    }

    fn write_envelope(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), StoreError> {
        fs::create_dir_all(&self.root)?;
        let encoded = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(value.as_bytes());
        let expires_at = ttl
            .and_then(|t| chrono::Duration::from_std(t).ok())
            .map(|d| Utc::now() + d);
        let env = Envelope { value: encoded, expires_at };
        fs::write(self.path_for(key), serde_json::to_vec(&env)?)?;
        Ok(())
    }

    fn read_envelope(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        let raw = fs::read(&path)?;
        let env: Envelope = serde_json::from_slice(&raw)?;
        if let Some(exp) = env.expires_at {
            if exp <= Utc::now() {
                let _ = fs::remove_file(&path);
                return Ok(None);
            }
        }
        let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD.decode(env.value.as_bytes())?;
        Ok(Some(String::from_utf8(bytes)?))
    }
}

impl StorageBackend for CookieFileBackend {
    fn set(&self, key: &str, value: &str, ttl: Option<Duration>) {
        if let Err(e) = self.write_envelope(key, value, ttl) {
            warn!("store.set failed backend={} key={} err={}", self.name(), key, e);
        }
    }

    fn get(&self, key: &str) -> Option<String> {
        match self.read_envelope(key) {
            Ok(v) => v,
            Err(e) => {
                warn!("store.get failed backend={} key={} err={}", self.name(), key, e);
                // an unreadable envelope stays unreadable; drop it
                let _ = fs::remove_file(self.path_for(key));
                None
            }
        }
    }

    fn remove(&self, key: &str) {
        let _ = fs::remove_file(self.path_for(key));
    }

    fn name(&self) -> &'static str {
        "cookie"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_set_get_remove() {
        let m = MemoryBackend::new();
        assert_eq!(m.get("k"), None);
        m.set("k", "v", None);
        assert_eq!(m.get("k").as_deref(), Some("v"));
        m.remove("k");
        assert_eq!(m.get("k"), None);
    }

    #[test]
    fn memory_expiry_prunes_on_read() {
        let m = MemoryBackend::new();
        m.set("k", "v", Some(Duration::from_millis(1)));
        std::thread::sleep(Duration::from_millis(10));
        assert_eq!(m.get("k"), None);
        // entry really dropped, not just hidden
        assert!(m.entries.read().get("k").is_none());
    }

    #[test]
    fn cookie_round_trip_and_encoding() {
        let dir = tempfile::tempdir().unwrap();
        let c = CookieFileBackend::new(dir.path());
        c.set("access_token", "abc.def.ghi", None);
        assert_eq!(c.get("access_token").as_deref(), Some("abc.def.ghi"));
        // the raw file must not hold the plaintext value
        let raw = fs::read_to_string(dir.path().join("access_token.ck")).unwrap();
        assert!(!raw.contains("abc.def.ghi"));
    }

    #[test]
    fn cookie_expired_value_is_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let c = CookieFileBackend::new(dir.path());
        c.set("k", "v", Some(Duration::from_millis(1)));
        std::thread::sleep(Duration::from_millis(10));
        assert_eq!(c.get("k"), None);
        assert!(!dir.path().join("k.ck").exists());
    }

    #[test]
    fn cookie_garbage_envelope_is_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let c = CookieFileBackend::new(dir.path());
        fs::write(dir.path().join("k.ck"), b"{{{ not an envelope").unwrap();
        assert_eq!(c.get("k"), None);
        assert!(!dir.path().join("k.ck").exists());
    }

    #[test]
    fn cookie_write_failure_is_swallowed() {
        // root is a file, so create_dir_all fails; set must not panic
        let dir = tempfile::tempdir().unwrap();
        let blocked = dir.path().join("blocked");
        fs::write(&blocked, b"x").unwrap();
        let c = CookieFileBackend::new(&blocked);
        c.set("k", "v", None);
        assert_eq!(c.get("k"), None);
    }
}
