//! The control surface (popup): the boundary where coordinator and session
//! errors are recovered and turned into user notifications.

use crate::{
    BroadcastReport, CoreResult, Delivery, InjectionCoordinator, Notifier, OverlayError,
    SessionBroadcaster, SessionRecord,
};

use std::sync::Arc;

use tracing::{error, instrument};

/// User-facing entry points of the control surface.
pub struct ControlSurface {
    coordinator: InjectionCoordinator,
    broadcaster: SessionBroadcaster,
    notifier: Arc<dyn Notifier>,
}

impl ControlSurface {
    /// Assemble the surface from its collaborators.
    pub fn new(
        coordinator: InjectionCoordinator,
        broadcaster: SessionBroadcaster,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            coordinator,
            broadcaster,
            notifier,
        }
    }

    /// Show the overlay in the active page.
    #[instrument(skip(self))]
    pub async fn show_overlay(&self) -> CoreResult<Delivery> {
        let result = self.coordinator.show_in_active_page().await;
        self.surface(result)
    }

    /// Log in and push the new status to every page.
    #[instrument(skip(self))]
    pub async fn login(&self, email: &str) -> CoreResult<(SessionRecord, BroadcastReport)> {
        let result = self.broadcaster.login(email).await;
        self.surface(result)
    }

    /// Log out and push the new status to every page.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> CoreResult<BroadcastReport> {
        let result = self.broadcaster.logout().await;
        self.surface(result)
    }

    /// The logged-in user, if the session is live.
    pub fn current_user(&self) -> Option<SessionRecord> {
        match self.broadcaster.current_user() {
            Ok(user) => user,
            Err(e) => {
                error!(error = ?e, "Failed to read session");
                None
            }
        }
    }

    /// Show a message to the user.
    pub fn notify(&self, message: &str) {
        self.notifier.notify(message);
    }

    /// Log the failure and show it to the user; the error is passed through.
    fn surface<T>(&self, result: CoreResult<T>) -> CoreResult<T> {
        if let Err(e) = &result {
            report(self.notifier.as_ref(), e);
        }
        result
    }
}

fn report(notifier: &dyn Notifier, e: &OverlayError) {
    error!(error = ?e, "Control surface action failed");
    notifier.notify(&e.user_message());
}
