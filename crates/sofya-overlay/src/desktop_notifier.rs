use crate::{AppError, AppResult};

use std::panic::Location;

use error_location::ErrorLocation;
use notify_rust::Notification;
use sofya_overlay_core::Notifier;
use tracing::{info, warn};

const SUMMARY: &str = "Sofya";

/// Shows user-facing messages as desktop notifications.
///
/// Every message is logged as well; a notification that cannot be shown is
/// only logged.
pub struct DesktopNotifier;

impl DesktopNotifier {
    #[track_caller]
    fn show(message: &str) -> AppResult<()> {
        Notification::new()
            .summary(SUMMARY)
            .body(message)
            .show()
            .map(|_| ())
            .map_err(|e| AppError::NotificationFailed {
                reason: e.to_string(),
                location: ErrorLocation::from(Location::caller()),
            })
    }
}

impl Notifier for DesktopNotifier {
    fn notify(&self, message: &str) {
        info!(notification = message, "Notifying user");
        if let Err(e) = Self::show(message) {
            warn!(error = ?e, "Desktop notification failed");
        }
    }
}
