/*
[INPUT]:  Bearer tokens and fetched user profiles
[OUTPUT]: Token retrieval, role checks and expiration status
[POS]:    Auth layer - session state shared by all requests
[UPDATE]: When adding token refresh or changing cached session fields
*/

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use base64::{
    Engine as _,
    engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD},
};
use chrono::{DateTime, Utc};

use crate::types::AppUser;

#[derive(Debug, Default)]
struct SessionState {
    token: Option<String>,
    user: Option<AppUser>,
}

/// Thread-safe holder for the bearer token and cached user
#[derive(Debug, Clone, Default)]
pub struct Session {
    state: Arc<RwLock<SessionState>>,
}

impl Session {
    /// Create a new empty session
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, SessionState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, SessionState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store a new token; an empty token clears it
    pub fn set_token(&self, token: impl Into<String>) {
        let token = token.into();
        self.write().token = (!token.is_empty()).then_some(token);
    }

    /// Get the current token if available
    pub fn token(&self) -> Option<String> {
        self.read().token.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.read().token.is_some()
    }

    pub fn set_user(&self, user: AppUser) {
        self.write().user = Some(user);
    }

    /// Cached user profile, if one was fetched
    pub fn user(&self) -> Option<AppUser> {
        self.read().user.clone()
    }

    /// Data of the cached user, empty without one
    pub(crate) fn user_data(&self) -> crate::types::JsonObject {
        self.read()
            .user
            .as_ref()
            .map(|user| user.data.clone())
            .unwrap_or_default()
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.read()
            .user
            .as_ref()
            .is_some_and(|user| user.has_role(role))
    }

    /// Expiry read from the token's `exp` claim
    ///
    /// `None` when no token is held or it is not a decodable JWT.
    pub fn token_expires_at(&self) -> Option<DateTime<Utc>> {
        self.read().token.as_deref().and_then(jwt_expiry)
    }

    /// True when the token carries an `exp` claim in the past
    pub fn is_token_expired(&self) -> bool {
        self.token_expires_at()
            .is_some_and(|expires_at| Utc::now() >= expires_at)
    }

    /// Drop token and user
    pub fn clear(&self) {
        let mut guard = self.write();
        guard.token = None;
        guard.user = None;
    }
}

fn jwt_expiry(token: &str) -> Option<DateTime<Utc>> {
    let payload_b64 = token.trim().split('.').nth(1)?;
    let payload_bytes = URL_SAFE_NO_PAD
        .decode(payload_b64)
        .or_else(|_| URL_SAFE.decode(payload_b64))
        .ok()?;
    let payload: serde_json::Value = serde_json::from_slice(&payload_bytes).ok()?;
    let exp = payload.get("exp")?.as_i64()?;
    DateTime::from_timestamp(exp, 0)
}
