use crate::{Command, CoreResult, PageHost, SessionRecord, SessionStore};

use std::sync::Arc;

use tracing::{debug, info, instrument};

/// Outcome of one best-effort broadcast.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Pages whose overlay accepted the message.
    pub delivered: usize,
    /// Pages with no listening overlay, or that refused the message.
    pub unreachable: usize,
}

/// Session authority: owns login/logout and pushes the result to every page.
///
/// The push is a latency optimization only. Overlays installed after a login
/// find the record through their own local auth check.
pub struct SessionBroadcaster {
    store: SessionStore,
    host: Arc<dyn PageHost>,
}

impl SessionBroadcaster {
    /// Create a broadcaster writing to `store` and notifying pages in `host`.
    pub fn new(store: SessionStore, host: Arc<dyn PageHost>) -> Self {
        Self { store, host }
    }

    /// Write a fresh record for `email`, then tell every page.
    ///
    /// Nothing is written or sent when the identity is rejected.
    #[instrument(skip(self))]
    pub async fn login(&self, email: &str) -> CoreResult<(SessionRecord, BroadcastReport)> {
        let record = self.store.login(email)?;
        let report = self.broadcast(true).await;
        Ok((record, report))
    }

    /// Remove the record, then tell every page.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> CoreResult<BroadcastReport> {
        self.store.clear()?;
        info!("Logged out");
        Ok(self.broadcast(false).await)
    }

    /// Current live record, if any.
    pub fn current_user(&self) -> CoreResult<Option<SessionRecord>> {
        self.store.get()
    }

    /// Send `auth-status` to every known page. A failure for one page never
    /// stops the others.
    #[instrument(skip(self))]
    pub async fn broadcast(&self, authenticated: bool) -> BroadcastReport {
        let mut report = BroadcastReport::default();

        for page in self.host.pages().await {
            match self
                .host
                .send(page.id, Command::AuthStatus { authenticated })
                .await
            {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    debug!(page_id = %page.id, error = %e, "Auth status not delivered");
                    report.unreachable += 1;
                }
            }
        }

        info!(
            authenticated,
            delivered = report.delivered,
            unreachable = report.unreachable,
            "Auth status broadcast"
        );
        report
    }
}
