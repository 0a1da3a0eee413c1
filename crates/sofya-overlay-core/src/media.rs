use crate::{CoreResult, OverlayError};

use std::{
    panic::Location,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};

use error_location::ErrorLocation;
use tracing::debug;
use uuid::Uuid;

/// Source of audio-capture handles.
pub trait MediaSource: Send + Sync {
    /// Acquire a capture handle. Dropping the handle releases the device.
    fn acquire(&self) -> CoreResult<MediaStream>;
}

/// RAII guard over an acquired audio-capture handle.
///
/// The release hook runs exactly once: on [`MediaStream::release`] or on drop,
/// whichever comes first.
pub struct MediaStream {
    id: Uuid,
    release: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl MediaStream {
    /// Wrap a capture handle with the hook that frees it.
    pub fn new(release: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            id: Uuid::new_v4(),
            release: Some(Box::new(release)),
        }
    }

    /// Handle identifier for log correlation.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Release the capture device now.
    pub fn release(mut self) {
        self.run_release();
    }

    fn run_release(&mut self) {
        if let Some(release) = self.release.take() {
            release();
            debug!(stream_id = %self.id, "Capture handle released");
        }
    }
}

impl Drop for MediaStream {
    fn drop(&mut self) {
        self.run_release();
    }
}

impl std::fmt::Debug for MediaStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaStream")
            .field("id", &self.id)
            .field("released", &self.release.is_none())
            .finish()
    }
}

/// Capture source with no device behind it; counts live handles.
#[derive(Debug, Clone)]
pub struct VirtualMediaSource {
    active: Arc<AtomicUsize>,
    acquired: Arc<AtomicUsize>,
    denied: Arc<AtomicBool>,
}

impl VirtualMediaSource {
    /// Create a source with no handles out.
    pub fn new() -> Self {
        Self {
            active: Arc::new(AtomicUsize::new(0)),
            acquired: Arc::new(AtomicUsize::new(0)),
            denied: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Simulate the user denying (or granting again) microphone access.
    pub fn set_denied(&self, denied: bool) {
        self.denied.store(denied, Ordering::Release);
    }

    /// Handles acquired and not yet released.
    pub fn active_streams(&self) -> usize {
        self.active.load(Ordering::Acquire)
    }

    /// Handles acquired over the source's lifetime.
    pub fn total_acquired(&self) -> usize {
        self.acquired.load(Ordering::Acquire)
    }
}

impl Default for VirtualMediaSource {
    fn default() -> Self {
        Self::new()
    }
}

impl MediaSource for VirtualMediaSource {
    #[track_caller]
    fn acquire(&self) -> CoreResult<MediaStream> {
        if self.denied.load(Ordering::Acquire) {
            return Err(OverlayError::CaptureUnavailable {
                reason: "microphone access denied".to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        self.active.fetch_add(1, Ordering::AcqRel);
        self.acquired.fetch_add(1, Ordering::AcqRel);

        let active = Arc::clone(&self.active);
        Ok(MediaStream::new(move || {
            active.fetch_sub(1, Ordering::AcqRel);
        }))
    }
}
