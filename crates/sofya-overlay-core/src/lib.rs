//! Sofya Overlay Core Library
//!
//! Keeps a page-attached transcription overlay present, reachable and in sync
//! with the login session, and reconciles live recognition output into one
//! growing transcript.
//!
//! # Example
//!
//! ```no_run
//! use sofya_overlay_core::{
//!     ControlSurface, CoreResult, InjectionCoordinator, LocalPageHost, LogNotifier,
//!     ManualEngineFactory, MemoryStorage, RetryPolicy, RuntimeInstaller, SessionBroadcaster,
//!     SessionStore, SystemClock, TargetPolicy, VirtualMediaSource,
//! };
//!
//! use std::sync::Arc;
//!
//! use tokio::sync::mpsc;
//!
//! #[tokio::main]
//! async fn main() -> CoreResult<()> {
//!     let store = SessionStore::new(Arc::new(MemoryStorage::new()), Arc::new(SystemClock));
//!     let (events_tx, _events_rx) = mpsc::channel(32);
//!     let installer = RuntimeInstaller::new(
//!         store.clone(),
//!         Arc::new(VirtualMediaSource::new()),
//!         Arc::new(ManualEngineFactory::new()),
//!         events_tx,
//!     );
//!     let host = Arc::new(LocalPageHost::new(Arc::new(installer), TargetPolicy::default(), true));
//!     host.open_page("https://example.com").await;
//!
//!     let control = ControlSurface::new(
//!         InjectionCoordinator::new(host.clone(), TargetPolicy::default(), RetryPolicy::default()),
//!         SessionBroadcaster::new(store, host.clone()),
//!         Arc::new(LogNotifier),
//!     );
//!
//!     control.login("demo@sofya.com").await?;
//!     control.show_overlay().await?;
//!     Ok(())
//! }
//! ```

mod broadcast;
mod control;
mod coordinator;
mod error;
mod host;
mod media;
mod message;
mod notify;
mod overlay;
mod recognition;
mod session;
mod target;
mod transcript;

pub use {
    broadcast::{BroadcastReport, SessionBroadcaster},
    control::ControlSurface,
    coordinator::{DEFAULT_SETTLE_DELAY, Delivery, InjectionCoordinator, RetryPolicy},
    error::{OverlayError, Result as CoreResult},
    host::{InjectError, LocalPageHost, OverlayInstaller, PageHost, SendError},
    media::{MediaSource, MediaStream, VirtualMediaSource},
    message::{Command, Gesture, OverlayEvent},
    notify::{LogNotifier, Notifier},
    overlay::{Overlay, OverlayHandle, OverlayInput, OverlayRuntime, OverlayState, RuntimeInstaller},
    recognition::{
        EngineFactory, ManualEngine, ManualEngineFactory, ManualFeed, RecognitionEngine,
        RecognitionEvent,
    },
    session::{
        Clock, FileStorage, KeyValueStorage, ManualClock, MemoryStorage, SESSION_KEY,
        SESSION_TTL_MS, SessionRecord, SessionStore, SystemClock,
    },
    target::{DEFAULT_RESTRICTED_SCHEMES, PageId, PageTarget, TargetPolicy},
    transcript::TranscriptReconciler,
};

#[cfg(test)]
mod tests;
