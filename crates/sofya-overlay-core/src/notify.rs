use tracing::warn;

/// Shows messages to the user.
pub trait Notifier: Send + Sync {
    /// Display `message`. Must not fail; delivery problems are the
    /// implementation's to log.
    fn notify(&self, message: &str);
}

/// Notifier that only writes to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, message: &str) {
        warn!(notification = message, "User notification");
    }
}
