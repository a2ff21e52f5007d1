//! Orchestrates bootstrap, login, registration and logout, and owns the
//! authoritative in-memory session state. The manager is an explicit,
//! injectable value; callers hold an `Arc` and subscribe for change
//! notification instead of reaching for a shared global.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::RwLock;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::extract::{self, Extraction};
use super::persistence::SessionPersistence;
use super::profile::UserProfile;
use super::redirect;
use super::state::{SessionState, TokenSet};
use crate::client::{ApiResponse, AuthClient};
use crate::error::AuthError;

pub type SubscriptionId = usize;

type Listener = Box<dyn Fn(&SessionState) + Send + Sync>;

/// Successful login outcome handed back to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginSuccess {
    pub redirect_to: &'static str,
}

/// Outcomes of a registration the server accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegisterOutcome {
    /// Account created; the caller should send the user to the login view.
    Registered { message: String, redirect_to: &'static str },
    /// The server handed back credentials; the new account is signed in.
    Authenticated { redirect_to: &'static str },
}

/// Registration input. Extra fields pass through to the service untouched.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RegisterRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub email: String,
    pub password: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

// Releases the in-flight flag when the login attempt settles, on every path.
struct InflightGuard<'a>(&'a AtomicBool);

impl<'a> InflightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InflightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct SessionManager {
    client: AuthClient,
    persistence: SessionPersistence,
    state: RwLock<SessionState>,
    listeners: RwLock<Vec<(SubscriptionId, Listener)>>,
    next_sub: AtomicUsize,
    login_inflight: AtomicBool,
}

impl SessionManager {
    pub fn new(client: AuthClient, persistence: SessionPersistence) -> Self {
        Self {
            client,
            persistence,
            state: RwLock::new(SessionState { bootstrapping: true, ..SessionState::default() }),
            listeners: RwLock::new(Vec::new()),
            next_sub: AtomicUsize::new(1),
            login_inflight: AtomicBool::new(false),
        }
    }

    /// Register a callback invoked with a state snapshot after every
    /// transition. Returns the handle for `unsubscribe`.
    pub fn subscribe(&self, f: impl Fn(&SessionState) + Send + Sync + 'static) -> SubscriptionId {
        let id = self.next_sub.fetch_add(1, Ordering::Relaxed);
        self.listeners.write().push((id, Box::new(f)));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.listeners.write().retain(|(sid, _)| *sid != id);
    }

    fn notify(&self) {
        let snapshot = self.state.read().clone();
        for (_, f) in self.listeners.read().iter() {
            f(&snapshot);
        }
    }

    /// Clone of the current in-memory state.
    pub fn current(&self) -> SessionState {
        self.state.read().clone()
    }

    /// In-memory check only; never re-reads persistence.
    pub fn is_authenticated(&self) -> bool {
        self.state.read().authenticated()
    }

    /// One-shot startup restore. Never fails: anything unexpected degrades to
    /// an unauthenticated session, and the bootstrapping flag always clears.
    pub fn bootstrap(&self) {
        let restored = self.persistence.read_session();
        {
            let mut st = self.state.write();
            match restored {
                Some((tokens, user)) => {
                    info!("session restored user={}", user.email.as_deref().unwrap_or("<unknown>"));
                    st.tokens = tokens;
                    st.user = Some(user);
                }
                None => {
                    debug!("no persisted session found");
                    st.tokens = TokenSet::default();
                    st.user = None;
                }
            }
            st.bootstrapping = false;
        }
        self.notify();
    }

    pub async fn login(&self, identifier: &str, secret: &str) -> Result<LoginSuccess, AuthError> {
        let _guard = InflightGuard::acquire(&self.login_inflight)
            .ok_or_else(|| AuthError::busy("login_inflight", "a sign-in attempt is already in progress"))?;

        let resp = self.client.login(identifier, secret).await?;
        let body = expect_success_body(resp, "login")?;
        let (tokens, user) = complete_credentials(extract::extract(&body))?;

        let redirect_to = redirect::resolve(Some(&user));
        self.install_session(tokens, user);
        info!("login succeeded redirect={}", redirect_to);
        Ok(LoginSuccess { redirect_to })
    }

    pub async fn register(&self, request: &RegisterRequest) -> Result<RegisterOutcome, AuthError> {
        let profile = serde_json::to_value(request)
            .map_err(|e| AuthError::protocol("bad_request", e.to_string()))?;
        let resp = self.client.register(&profile).await?;
        let body = expect_success_body(resp, "register")?;

        // Some deployments hand credentials straight back; treat that exactly
        // like a login success. A message-only acknowledgement stays signed out.
        if let Ok((tokens, user)) = complete_credentials(extract::extract(&body)) {
            let redirect_to = redirect::resolve(Some(&user));
            self.install_session(tokens, user);
            info!("registration auto-authenticated redirect={}", redirect_to);
            return Ok(RegisterOutcome::Authenticated { redirect_to });
        }
        let message = body
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("account created")
            .to_string();
        info!("registration accepted: {}", message);
        Ok(RegisterOutcome::Registered { message, redirect_to: redirect::LOGIN_PATH })
    }

    /// Clear persistence and memory unconditionally. Idempotent.
    pub fn logout(&self) {
        self.persistence.clear_session();
        {
            let mut st = self.state.write();
            st.user = None;
            st.tokens = TokenSet::default();
        }
        info!("session cleared");
        self.notify();
    }

    // All-or-nothing swap to Authenticated: persistence first, then the
    // in-memory pair together, then subscribers.
    fn install_session(&self, tokens: TokenSet, user: UserProfile) {
        self.persistence.write_session(&tokens, &user);
        {
            let mut st = self.state.write();
            st.user = Some(user);
            st.tokens = tokens;
        }
        self.notify();
    }
}

fn expect_success_body(resp: ApiResponse, op: &str) -> Result<Value, AuthError> {
    let ApiResponse { status, body } = resp;
    if !status.is_success() {
        let msg = body
            .as_ref()
            .and_then(|b| b.get("message"))
            .and_then(|m| m.as_str());
        warn!("{} failed: HTTP {} message={:?}", op, status, msg);
        return Err(match msg {
            Some(m) => AuthError::rejected("server_rejected", m),
            None => AuthError::transport(
                "http_status",
                format!("authentication service returned HTTP {}", status.as_u16()),
            ),
        });
    }
    let Some(body) = body else {
        warn!("{} failed: response body is not JSON", op);
        return Err(AuthError::protocol("invalid_body", "response body is not valid JSON"));
    };
    if body.get("success").and_then(|s| s.as_bool()) != Some(true) {
        let msg = body
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("authentication rejected");
        info!("{} rejected by server: {}", op, msg);
        return Err(AuthError::rejected("server_rejected", msg));
    }
    Ok(body)
}

fn complete_credentials(ext: Extraction) -> Result<(TokenSet, UserProfile), AuthError> {
    let (Some(access), Some(user_val)) = (ext.access_token, ext.user) else {
        return Err(AuthError::incomplete(
            "missing_credentials",
            "invalid response: missing token or user data",
        ));
    };
    let user: UserProfile = serde_json::from_value(user_val).map_err(|_| {
        AuthError::incomplete("missing_credentials", "invalid response: missing token or user data")
    })?;
    let tokens = TokenSet {
        access_token: Some(access),
        refresh_token: ext.refresh_token,
        token_type: ext.token_type,
    };
    Ok((tokens, user))
}
