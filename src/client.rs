//! HTTP transport for the remote authentication service.
//! Owns the reqwest client and the endpoint layout; classifies failures into
//! the transport/protocol halves of the error taxonomy and leaves everything
//! above the wire (success flags, payload shapes) to the session manager.

use reqwest::StatusCode;
use serde_json::Value;
use tracing::debug;

use crate::config::AuthConfig;
use crate::error::AuthError;

/// What came back over the wire. `body` is `None` when the response was not
/// JSON at all.
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: Option<Value>,
}

pub struct AuthClient {
    cfg: AuthConfig,
    client: reqwest::Client,
}

impl AuthClient {
    pub fn new(cfg: AuthConfig) -> Result<Self, AuthError> {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .build()
            .map_err(|e| AuthError::config("client_init", e.to_string()))?;
        Ok(Self { cfg, client })
    }

    pub fn config(&self) -> &AuthConfig {
        &self.cfg
    }

    async fn post_json(&self, path: &str, body: &Value) -> Result<ApiResponse, AuthError> {
        let url = self
            .cfg
            .endpoint(path)
            .map_err(|e| AuthError::config("bad_endpoint", e.to_string()))?;
        let resp = self.client.post(url).json(body).send().await.map_err(|e| {
            debug!("auth.post {} transport failure: {}", path, e);
            AuthError::transport("connect_failed", e.to_string())
        })?;
        let status = resp.status();
        let body = resp.json::<Value>().await.ok();
        Ok(ApiResponse { status, body })
    }

    pub async fn login(&self, identifier: &str, secret: &str) -> Result<ApiResponse, AuthError> {
        self.post_json(
            "auth/login",
            &serde_json::json!({"identifier": identifier, "secret": secret}),
        )
        .await
    }

    pub async fn register(&self, profile: &Value) -> Result<ApiResponse, AuthError> {
        self.post_json("auth/register", profile).await
    }
}
