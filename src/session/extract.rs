//! Normalization of auth-service response payloads.
//! The service has shipped several incompatible response layouts over time;
//! rather than probing ad hoc, classification names each known layout and
//! tries them in a fixed priority order, first match wins. Extraction then
//! maps the matched layout onto one canonical token/user result.

use serde_json::Value;

use super::state::DEFAULT_TOKEN_TYPE;

/// Known response layouts, in match priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadShape {
    /// `data` object carrying `accessToken` directly.
    DataWithAccessToken,
    /// `data` object carrying a bare `token`; no distinguishable refresh
    /// token in this layout.
    DataWithToken,
    /// `data` object that is itself the user record; token fields ride on it
    /// under their snake_case names.
    DataAsUser,
    /// Token at the root, `user` (or `data`) as the profile.
    RootToken,
}

/// Canonical extraction result. Token and user fields may all be absent;
/// that is the extraction-failure signal callers must check for.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub token_type: String,
    pub user: Option<Value>,
}

impl Default for Extraction {
    fn default() -> Self {
        Self {
            access_token: None,
            refresh_token: None,
            token_type: DEFAULT_TOKEN_TYPE.to_string(),
            user: None,
        }
    }
}

fn str_field(v: &Value, key: &str) -> Option<String> {
    v.get(key).and_then(|x| x.as_str()).map(|s| s.to_string())
}

fn looks_like_user(v: &Value) -> bool {
    v.is_object() && (v.get("id").is_some() || v.get("email").is_some())
}

/// Decide which layout a payload follows, if any.
pub fn classify(payload: &Value) -> Option<PayloadShape> {
    if let Some(data) = payload.get("data").filter(|d| d.is_object()) {
        if data.get("accessToken").and_then(|t| t.as_str()).is_some() {
            return Some(PayloadShape::DataWithAccessToken);
        }
        if data.get("token").and_then(|t| t.as_str()).is_some() {
            return Some(PayloadShape::DataWithToken);
        }
        if looks_like_user(data) {
            return Some(PayloadShape::DataAsUser);
        }
    }
    if payload.get("accessToken").and_then(|t| t.as_str()).is_some()
        || payload.get("token").and_then(|t| t.as_str()).is_some()
    {
        return Some(PayloadShape::RootToken);
    }
    None
}

// Profile for the nested-container layouts: an explicit `user` wins, else the
// container itself when it reads as a user record.
fn container_profile(data: &Value) -> Option<Value> {
    if let Some(u) = data.get("user").filter(|u| u.is_object()) {
        return Some(u.clone());
    }
    if looks_like_user(data) {
        return Some(data.clone());
    }
    None
}

/// Normalize a payload. No recognized layout yields the all-absent result;
/// callers must treat that as a failure, not authenticate on it.
pub fn extract(payload: &Value) -> Extraction {
    let Some(shape) = classify(payload) else {
        return Extraction::default();
    };
    match shape {
        PayloadShape::DataWithAccessToken => {
            let data = &payload["data"];
            Extraction {
                access_token: str_field(data, "accessToken"),
                refresh_token: str_field(data, "refreshToken"),
                token_type: str_field(data, "tokenType").unwrap_or_else(|| DEFAULT_TOKEN_TYPE.to_string()),
                user: container_profile(data),
            }
        }
        PayloadShape::DataWithToken => {
            let data = &payload["data"];
            Extraction {
                access_token: str_field(data, "token"),
                refresh_token: None,
                token_type: str_field(data, "tokenType").unwrap_or_else(|| DEFAULT_TOKEN_TYPE.to_string()),
                user: container_profile(data),
            }
        }
        PayloadShape::DataAsUser => {
            let data = &payload["data"];
            Extraction {
                access_token: str_field(data, "access_token"),
                refresh_token: str_field(data, "refresh_token"),
                token_type: str_field(data, "token_type").unwrap_or_else(|| DEFAULT_TOKEN_TYPE.to_string()),
                user: Some(data.clone()),
            }
        }
        PayloadShape::RootToken => Extraction {
            access_token: str_field(payload, "accessToken").or_else(|| str_field(payload, "token")),
            refresh_token: str_field(payload, "refreshToken"),
            token_type: str_field(payload, "tokenType").unwrap_or_else(|| DEFAULT_TOKEN_TYPE.to_string()),
            user: payload
                .get("user")
                .filter(|u| u.is_object())
                .cloned()
                .or_else(|| payload.get("data").filter(|d| d.is_object()).cloned()),
        },
    }
}
