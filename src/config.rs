//! Runtime configuration: where the auth service lives and how long the
//! persisted session record may outlive the process.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Url;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:7878";
pub const DEFAULT_API_SEGMENT: &str = "api/v1";
pub const DEFAULT_SESSION_TTL_SECS: u64 = 7 * 24 * 60 * 60;

#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Origin of the remote auth service.
    pub base_url: Url,
    /// Fixed version segment prefixed to every endpoint path.
    pub api_segment: String,
    /// Lifetime handed to the persistence backends on every write.
    pub session_ttl: Duration,
}

impl AuthConfig {
    pub fn new(base: &str) -> Result<Self> {
        let base_url = Url::parse(base).context("invalid base URL")?;
        Ok(Self {
            base_url,
            api_segment: DEFAULT_API_SEGMENT.to_string(),
            session_ttl: Duration::from_secs(DEFAULT_SESSION_TTL_SECS),
        })
    }

    /// Environment-driven construction with inline defaults.
    pub fn from_env() -> Result<Self> {
        let base = std::env::var("SESSIONKIT_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let mut cfg = Self::new(&base)?;
        if let Ok(seg) = std::env::var("SESSIONKIT_API_SEGMENT") {
            cfg.api_segment = seg;
        }
        if let Ok(secs) = std::env::var("SESSIONKIT_SESSION_TTL_SECS") {
            if let Ok(n) = secs.parse::<u64>() {
                cfg.session_ttl = Duration::from_secs(n);
            }
        }
        Ok(cfg)
    }

    /// Absolute URL for an operation path, e.g. `auth/login`.
    pub fn endpoint(&self, path: &str) -> Result<Url> {
        let joined = format!(
            "/{}/{}",
            self.api_segment.trim_matches('/'),
            path.trim_start_matches('/')
        );
        self.base_url.join(&joined).context("invalid endpoint path")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_version_segment() {
        let cfg = AuthConfig::new("http://127.0.0.1:9000").unwrap();
        let url = cfg.endpoint("auth/login").unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:9000/api/v1/auth/login");
    }

    #[test]
    fn endpoint_tolerates_stray_slashes() {
        let mut cfg = AuthConfig::new("http://host").unwrap();
        cfg.api_segment = "/api/v2/".into();
        let url = cfg.endpoint("/auth/register").unwrap();
        assert_eq!(url.as_str(), "http://host/api/v2/auth/register");
    }

    #[test]
    fn rejects_garbage_base_url() {
        assert!(AuthConfig::new("not a url").is_err());
    }
}
