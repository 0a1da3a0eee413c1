use crate::{
    CoreResult, MediaStream, PageId,
    recognition::{EngineFactory, RecognitionEngine, RecognitionEvent},
};

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
};

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

const EVENT_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Default)]
struct ManualState {
    events: Option<mpsc::Sender<RecognitionEvent>>,
    paused: bool,
}

fn lock(state: &Mutex<ManualState>) -> MutexGuard<'_, ManualState> {
    state.lock().unwrap_or_else(|e| {
        error!("Manual engine lock poisoned, recovering: {}", e);
        e.into_inner()
    })
}

/// Engine whose recognition output is pushed by hand through a [`ManualFeed`].
///
/// Stands in for a real recognizer: the console types what was "heard", tests
/// script exact event sequences.
#[derive(Debug)]
pub struct ManualEngine {
    state: Arc<Mutex<ManualState>>,
}

impl ManualEngine {
    /// Create an engine and the feed that drives it.
    pub fn new() -> (Self, ManualFeed) {
        let state = Arc::new(Mutex::new(ManualState::default()));
        (
            Self {
                state: Arc::clone(&state),
            },
            ManualFeed { state },
        )
    }
}

#[async_trait]
impl RecognitionEngine for ManualEngine {
    async fn start(
        &mut self,
        stream: &MediaStream,
    ) -> CoreResult<mpsc::Receiver<RecognitionEvent>> {
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        // Capacity is fresh, Ready always fits.
        let _ = tx.try_send(RecognitionEvent::Ready);

        let mut state = lock(&self.state);
        state.events = Some(tx);
        state.paused = false;

        debug!(stream_id = %stream.id(), "Manual engine started");
        Ok(rx)
    }

    async fn pause(&mut self) -> CoreResult<()> {
        lock(&self.state).paused = true;
        Ok(())
    }

    async fn resume(&mut self) -> CoreResult<()> {
        lock(&self.state).paused = false;
        Ok(())
    }

    async fn stop(&mut self) -> CoreResult<()> {
        let mut state = lock(&self.state);
        state.events = None;
        state.paused = false;
        Ok(())
    }
}

/// Pushes recognition output into a [`ManualEngine`].
#[derive(Debug, Clone)]
pub struct ManualFeed {
    state: Arc<Mutex<ManualState>>,
}

impl ManualFeed {
    /// Emit provisional text. Dropped while paused or stopped.
    pub fn interim(&self, text: &str) -> bool {
        self.speech(RecognitionEvent::Recognizing(text.to_string()))
    }

    /// Emit final text. Dropped while paused or stopped.
    pub fn final_text(&self, text: &str) -> bool {
        self.speech(RecognitionEvent::Recognized(text.to_string()))
    }

    /// Emit an engine failure. Delivered even while paused.
    pub fn error(&self, reason: &str) -> bool {
        let state = lock(&self.state);
        Self::deliver(&state, RecognitionEvent::Error(reason.to_string()))
    }

    /// Whether a session is running.
    pub fn is_listening(&self) -> bool {
        lock(&self.state).events.is_some()
    }

    fn speech(&self, event: RecognitionEvent) -> bool {
        let state = lock(&self.state);
        if state.paused {
            debug!("Engine paused, dropping speech");
            return false;
        }
        Self::deliver(&state, event)
    }

    fn deliver(state: &ManualState, event: RecognitionEvent) -> bool {
        let Some(events) = state.events.as_ref() else {
            debug!("Engine not started, dropping event");
            return false;
        };

        match events.try_send(event) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Recognition event not delivered");
                false
            }
        }
    }
}

/// Hands out one [`ManualEngine`] per page and keeps the feeds reachable.
#[derive(Debug, Default)]
pub struct ManualEngineFactory {
    feeds: Mutex<HashMap<PageId, ManualFeed>>,
}

impl ManualEngineFactory {
    /// Create a factory with no engines.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed of the engine created for `page`.
    pub fn feed(&self, page: PageId) -> Option<ManualFeed> {
        self.feeds
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&page)
            .cloned()
    }
}

impl EngineFactory for ManualEngineFactory {
    fn create(&self, page: PageId) -> Box<dyn RecognitionEngine> {
        let (engine, feed) = ManualEngine::new();
        self.feeds
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(page, feed);
        Box::new(engine)
    }

    fn release(&self, page: PageId) {
        if self
            .feeds
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&page)
            .is_some()
        {
            debug!(page_id = %page, "Manual feed released");
        }
    }
}
