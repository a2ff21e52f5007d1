use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Role identifiers as issued by the auth service.
pub const ROLE_ADMIN: i64 = 1;
pub const ROLE_STANDARD: i64 = 2;

/// The user record as the auth service describes it. Only the fields the
/// session core actually consults are named; everything else rides along in
/// `extra` and round-trips through persistence untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, rename = "roleId", alias = "role_id")]
    pub role_id: Option<i64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl UserProfile {
    pub fn is_admin(&self) -> bool {
        self.role_id == Some(ROLE_ADMIN)
    }
}
