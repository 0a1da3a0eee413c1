use serde::{Deserialize, Serialize};

/// Lifetime of a session record: 24 hours in milliseconds.
pub const SESSION_TTL_MS: i64 = 24 * 60 * 60 * 1000;

/// Persisted proof of authentication.
///
/// Serialized as `{"email":..,"isAuthenticated":..,"loginTime":..}` under a
/// single storage key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    /// Authenticated identity.
    pub email: String,
    /// Flag written at login. Never trusted on its own; see [`SessionRecord::is_valid_at`].
    pub is_authenticated: bool,
    /// Issue time in epoch milliseconds.
    pub login_time: i64,
}

impl SessionRecord {
    /// Create an authenticated record issued at `now_ms`.
    pub fn issue(email: impl Into<String>, now_ms: i64) -> Self {
        Self {
            email: email.into(),
            is_authenticated: true,
            login_time: now_ms,
        }
    }

    /// `now - loginTime > TTL`.
    pub fn is_expired_at(&self, now_ms: i64) -> bool {
        now_ms.saturating_sub(self.login_time) > SESSION_TTL_MS
    }

    /// A record authenticates only while it is unexpired and carries the flag.
    pub fn is_valid_at(&self, now_ms: i64) -> bool {
        self.is_authenticated && !self.is_expired_at(now_ms)
    }
}
