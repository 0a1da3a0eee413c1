use crate::{
    ControlSurface, InjectionCoordinator, OverlayError, PageId, PageTarget, RetryPolicy,
    SessionBroadcaster, TargetPolicy,
    tests::support::{RecordingNotifier, ScriptedHost, memory_store},
};

use std::sync::Arc;

fn surface(host: Arc<ScriptedHost>, notifier: Arc<RecordingNotifier>) -> ControlSurface {
    let (store, _clock) = memory_store();
    ControlSurface::new(
        InjectionCoordinator::new(host.clone(), TargetPolicy::default(), RetryPolicy::default()),
        SessionBroadcaster::new(store, host),
        notifier,
    )
}

/// WHAT: Showing on a restricted page notifies the user with a clear message
/// WHY: Failures at the control surface are never silent
#[tokio::test(start_paused = true)]
async fn given_restricted_active_page_when_showing_then_user_notified() {
    // Given
    let host = Arc::new(ScriptedHost::new(vec![PageTarget::new(
        PageId(1),
        "chrome://newtab",
    )]));
    let notifier = Arc::new(RecordingNotifier::default());
    let control = surface(host, notifier.clone());

    // When
    let result = control.show_overlay().await;

    // Then
    assert!(matches!(result, Err(OverlayError::RestrictedTarget { .. })));
    assert_eq!(
        notifier.messages(),
        ["Transcription does not work on this page. Navigate to a website to use the extension."]
    );
}

/// WHAT: A delivery failure after the retry is reported to the user
/// WHY: The user must know to reload the page
#[tokio::test(start_paused = true)]
async fn given_unreachable_page_when_showing_then_reload_hint_shown() {
    let host = Arc::new(ScriptedHost::new(vec![PageTarget::new(
        PageId(1),
        "https://example.com",
    )]));
    let notifier = Arc::new(RecordingNotifier::default());
    let control = surface(host, notifier.clone());

    let result = control.show_overlay().await;

    assert!(matches!(result, Err(OverlayError::DeliveryFailure { .. })));
    assert_eq!(
        notifier.messages(),
        ["Could not start transcription. Reload the page and try again."]
    );
}

/// WHAT: A successful login shows no notification and exposes the current user
/// WHY: Notifications are reserved for failures and explicit messages
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_valid_login_when_logging_in_then_current_user_set_and_no_notification() {
    let host = Arc::new(ScriptedHost::new(vec![]).with_fallback(Ok(())));
    let notifier = Arc::new(RecordingNotifier::default());
    let control = surface(host, notifier.clone());

    control.login("doctor@sofya.com").await.unwrap();

    assert_eq!(control.current_user().unwrap().email, "doctor@sofya.com");
    assert!(notifier.messages().is_empty());

    control.logout().await.unwrap();
    assert!(control.current_user().is_none());
}

/// WHAT: An invalid email is reported to the user
/// WHY: The login form relies on the notification for feedback
#[tokio::test]
async fn given_invalid_email_when_logging_in_then_user_notified() {
    let host = Arc::new(ScriptedHost::new(vec![]));
    let notifier = Arc::new(RecordingNotifier::default());
    let control = surface(host, notifier.clone());

    let result = control.login("nobody").await;

    assert!(result.is_err());
    assert_eq!(notifier.messages(), ["Please enter a valid email."]);
}
