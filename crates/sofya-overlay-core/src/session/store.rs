use crate::{
    CoreResult, OverlayError,
    session::{Clock, KeyValueStorage, SessionRecord},
};

use std::{panic::Location, sync::Arc};

use error_location::ErrorLocation;
use tracing::{debug, info, instrument, warn};

/// Storage key of the single session record.
pub const SESSION_KEY: &str = "sofya_auth";

/// Sole source of truth for authentication state.
///
/// Holds at most one [`SessionRecord`]. Readers never trust the stored flag
/// alone: a record past its TTL reads as absent and is removed on the spot.
/// Writes are last-write-wins.
#[derive(Clone)]
pub struct SessionStore {
    storage: Arc<dyn KeyValueStorage>,
    clock: Arc<dyn Clock>,
}

impl SessionStore {
    /// Create a store over a storage backend and a clock.
    pub fn new(storage: Arc<dyn KeyValueStorage>, clock: Arc<dyn Clock>) -> Self {
        Self { storage, clock }
    }

    /// Current time according to the store's clock.
    pub fn now_ms(&self) -> i64 {
        self.clock.now_ms()
    }

    /// Read the live record.
    ///
    /// Returns `None` when nothing is stored, when the stored value does not
    /// parse, or when the record has expired (in which case it is removed).
    #[instrument(skip(self))]
    pub fn get(&self) -> CoreResult<Option<SessionRecord>> {
        let Some(raw) = self.storage.get(SESSION_KEY)? else {
            return Ok(None);
        };

        let record: SessionRecord = match serde_json::from_str(&raw) {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, "Stored session record is unreadable, treating as absent");
                return Ok(None);
            }
        };

        if record.is_expired_at(self.now_ms()) {
            info!(email = %record.email, "Session record expired, removing");
            self.storage.remove(SESSION_KEY)?;
            return Ok(None);
        }

        Ok(Some(record))
    }

    /// Overwrite the record.
    #[instrument(skip(self, record), fields(email = %record.email))]
    pub fn set(&self, record: &SessionRecord) -> CoreResult<()> {
        let json = serde_json::to_string(record)?;
        self.storage.set(SESSION_KEY, &json)?;
        debug!("Session record written");
        Ok(())
    }

    /// Remove the record.
    #[instrument(skip(self))]
    pub fn clear(&self) -> CoreResult<()> {
        self.storage.remove(SESSION_KEY)?;
        debug!("Session record cleared");
        Ok(())
    }

    /// Validate `email`, then write a fresh record issued now.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn login(&self, email: &str) -> CoreResult<SessionRecord> {
        let email = email.trim();
        if !is_plausible_email(email) {
            return Err(OverlayError::InvalidIdentity {
                identity: email.to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let record = SessionRecord::issue(email, self.now_ms());
        self.set(&record)?;
        info!(email = %record.email, "Logged in");
        Ok(record)
    }

    /// Page-local auth check (pull path).
    ///
    /// `present(record) && now - loginTime <= TTL && isAuthenticated`. Any
    /// storage failure reads as unauthenticated.
    #[instrument(skip(self))]
    pub fn is_authenticated(&self) -> bool {
        match self.get() {
            Ok(Some(record)) => record.is_valid_at(self.now_ms()),
            Ok(None) => false,
            Err(e) => {
                warn!(error = ?e, "Auth check failed, treating as logged out");
                false
            }
        }
    }
}

fn is_plausible_email(email: &str) -> bool {
    !email.is_empty() && email.contains('@') && email.contains('.')
}
