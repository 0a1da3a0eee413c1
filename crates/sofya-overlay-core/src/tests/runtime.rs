use crate::{
    Command, Gesture, InjectError, InjectionCoordinator, OverlayEvent, OverlayState, PageHost,
    RetryPolicy, SendError, SessionBroadcaster, SessionRecord, TargetPolicy,
    tests::support::{Browser, NOW_MS},
};

use std::time::Duration;

const RECORDING: OverlayState = OverlayState::Expanded {
    recording: true,
    paused: false,
};

/// WHAT: Login reaches both open pages by broadcast and a third page by its own check
/// WHY: Push is only a shortcut; the pull path alone must converge late pages
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_two_open_pages_when_logging_in_then_all_pages_converge_including_later_ones() {
    // Given: Two pages open while logged out
    let browser = Browser::new(true);
    let a = browser.host.open_page("https://a.example").await;
    let b = browser.host.open_page("https://b.example").await;
    let broadcaster = SessionBroadcaster::new(browser.store.clone(), browser.host.clone());

    // When: Logging in
    let (_, report) = broadcaster.login("doctor@sofya.com").await.unwrap();

    // Then: Both pages received the push and mounted
    assert_eq!(report.delivered, 2);
    assert_eq!(
        browser.wait_for(a.id, |s| *s == OverlayState::Collapsed).await,
        Some(OverlayState::Collapsed)
    );
    assert_eq!(
        browser.wait_for(b.id, |s| *s == OverlayState::Collapsed).await,
        Some(OverlayState::Collapsed)
    );

    // When: A third page opens after the broadcast
    let c = browser.host.open_page("https://c.example").await;

    // Then: It mounts through the local auth check alone
    assert_eq!(
        browser.wait_for(c.id, |s| *s == OverlayState::Collapsed).await,
        Some(OverlayState::Collapsed)
    );
}

/// WHAT: Logout tears down every overlay, including one that is recording
/// WHY: No page may keep a microphone or transcript after logout
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_recording_page_when_logging_out_then_all_overlays_absent_and_capture_released() {
    // Given: Logged in, one page recording
    let browser = Browser::new(true);
    browser
        .store
        .set(&SessionRecord::issue("doctor@sofya.com", NOW_MS))
        .unwrap();
    let a = browser.host.open_page("https://a.example").await;
    let b = browser.host.open_page("https://b.example").await;
    browser.wait_for(a.id, |s| s.is_present()).await.unwrap();

    browser.host.gesture(a.id, Gesture::Activate).await.unwrap();
    browser.host.gesture(a.id, Gesture::Start).await.unwrap();
    browser.wait_for(a.id, |s| *s == RECORDING).await.unwrap();
    assert_eq!(browser.media.active_streams(), 1);

    // When
    let broadcaster = SessionBroadcaster::new(browser.store.clone(), browser.host.clone());
    broadcaster.logout().await.unwrap();

    // Then
    for page in [a.id, b.id] {
        assert_eq!(
            browser.wait_for(page, |s| *s == OverlayState::Absent).await,
            Some(OverlayState::Absent)
        );
    }
    assert_eq!(browser.media.active_streams(), 0);
}

/// WHAT: With auto-inject off, show injects the overlay and the retried send expands it
/// WHY: Pages opened before installation still get an overlay on demand
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_page_without_overlay_when_showing_then_injected_and_expanded() {
    // Given: Logged in, page opened with no overlay
    let browser = Browser::new(false);
    browser
        .store
        .set(&SessionRecord::issue("doctor@sofya.com", NOW_MS))
        .unwrap();
    let page = browser.host.open_page("https://a.example").await;
    assert_eq!(
        browser.host.send(page.id, Command::Show).await,
        Err(SendError::NoReceiver)
    );

    // When
    let coordinator = InjectionCoordinator::new(
        browser.host.clone(),
        TargetPolicy::default(),
        RetryPolicy::default(),
    );
    coordinator.show_in_active_page().await.unwrap();

    // Then
    assert_eq!(
        browser
            .wait_for(page.id, |s| matches!(s, OverlayState::Expanded { .. }))
            .await,
        Some(OverlayState::Expanded {
            recording: false,
            paused: false
        })
    );
}

/// WHAT: Injecting twice into the same page keeps the first overlay
/// WHY: Script installation is idempotent per page
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_live_overlay_when_injecting_again_then_same_overlay_kept() {
    // Given
    let browser = Browser::new(false);
    let page = browser.host.open_page("https://a.example").await;
    browser.host.inject_overlay(page.id).await.unwrap();
    let mut first = browser.host.subscribe(page.id).await.unwrap();

    // When
    browser.host.inject_overlay(page.id).await.unwrap();
    browser
        .host
        .send(page.id, Command::AuthStatus { authenticated: true })
        .await
        .unwrap();

    // Then: The first subscription sees the update
    let state = first
        .wait_for(|s| *s == OverlayState::Collapsed)
        .await
        .map(|s| *s)
        .unwrap();
    assert_eq!(state, OverlayState::Collapsed);
    assert!(browser.engines.feed(page.id).is_some());
}

/// WHAT: The host refuses to inject into restricted pages
/// WHY: Privileged pages never run the overlay script
#[tokio::test]
async fn given_restricted_page_when_injecting_then_blocked() {
    let browser = Browser::new(true);
    let page = browser.host.open_page("chrome://settings").await;

    let result = browser.host.inject_overlay(page.id).await;

    assert_eq!(
        result,
        Err(InjectError::Blocked {
            url: "chrome://settings".to_string()
        })
    );
    assert!(browser.host.overlay_state(page.id).await.is_none());
}

/// WHAT: Closing a recording page releases the capture, the engine and ends the session
/// WHY: Page unload must not leak the microphone or the page's engine
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_recording_page_when_closed_then_capture_released_and_recording_ended() {
    // Given
    let mut browser = Browser::new(true);
    browser
        .store
        .set(&SessionRecord::issue("doctor@sofya.com", NOW_MS))
        .unwrap();
    let page = browser.host.open_page("https://a.example").await;
    browser.wait_for(page.id, |s| s.is_present()).await.unwrap();
    browser.host.gesture(page.id, Gesture::Activate).await.unwrap();
    browser.host.gesture(page.id, Gesture::Start).await.unwrap();
    browser.wait_for(page.id, |s| *s == RECORDING).await.unwrap();

    let feed = browser.engines.feed(page.id).unwrap();
    assert!(feed.final_text("até logo"));
    let relayed = tokio::time::timeout(Duration::from_secs(2), async {
        while let Some(event) = browser.events.recv().await {
            if matches!(&event, OverlayEvent::Transcript { text, .. } if text == "até logo") {
                return true;
            }
        }
        false
    })
    .await
    .unwrap();
    assert!(relayed);

    // When
    assert!(browser.host.close_page(page.id).await);

    // Then
    assert_eq!(browser.media.active_streams(), 0);
    assert!(!feed.is_listening());
    assert!(browser.engines.feed(page.id).is_none());
    assert!(browser.host.active_page().await.is_none());

    let mut ended = None;
    while let Ok(event) = browser.events.try_recv() {
        if let OverlayEvent::RecordingEnded { transcript, .. } = event {
            ended = Some(transcript);
        }
    }
    assert_eq!(ended.as_deref(), Some("até logo"));
}

/// WHAT: An expired session keeps new pages logged out
/// WHY: The local check enforces the TTL even without a logout broadcast
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_expired_session_when_opening_page_then_overlay_stays_absent() {
    // Given
    let browser = Browser::new(true);
    browser
        .store
        .set(&SessionRecord::issue("doctor@sofya.com", NOW_MS))
        .unwrap();
    browser.clock.advance(crate::SESSION_TTL_MS + 1);

    // When
    let page = browser.host.open_page("https://a.example").await;
    browser
        .host
        .gesture(page.id, Gesture::Activate)
        .await
        .unwrap();

    // Then: The overlay task handled the gesture and is still absent
    tokio::task::yield_now().await;
    assert_eq!(
        browser.host.overlay_state(page.id).await,
        Some(OverlayState::Absent)
    );
    assert!(browser.store.get().unwrap().is_none());
}
