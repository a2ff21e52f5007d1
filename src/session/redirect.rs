use super::profile::{UserProfile, ROLE_ADMIN};

pub const ADMIN_HOME: &str = "/admin";
pub const MEMBER_HOME: &str = "/dashboard";
pub const LOGIN_PATH: &str = "/login";

/// Post-auth landing path for a profile. Unknown or missing roles land on
/// the member view, never the admin view.
pub fn resolve(user: Option<&UserProfile>) -> &'static str {
    match user {
        Some(u) if u.role_id == Some(ROLE_ADMIN) => ADMIN_HOME,
        _ => MEMBER_HOME,
    }
}
