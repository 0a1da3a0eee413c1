use crate::{
    Command, CoreResult, Gesture, MediaSource, MediaStream, OverlayError, OverlayEvent,
    OverlayInput, OverlayState, PageId, RecognitionEngine, RecognitionEvent, SessionStore,
    TranscriptReconciler,
};

use std::{panic::Location, sync::Arc, time::Instant};

use error_location::ErrorLocation;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

/// Resources held while a recording session runs.
struct RecordingSession {
    id: Uuid,
    started_at: Instant,
    stream: MediaStream,
    events: mpsc::Receiver<RecognitionEvent>,
}

/// One page's overlay: state machine, transcript and recording resources.
///
/// Constructed explicitly per page and owned by that page's runtime task; it
/// is never shared. All state changes go through [`Overlay::apply`], which
/// runs the pure transition and then performs the side effects implied by the
/// difference between the old and new state.
pub struct Overlay {
    page: PageId,
    state: OverlayState,
    transcript: TranscriptReconciler,
    engine: Box<dyn RecognitionEngine>,
    media: Arc<dyn MediaSource>,
    session: Option<RecordingSession>,
    events: mpsc::Sender<OverlayEvent>,
    state_tx: watch::Sender<OverlayState>,
}

impl Overlay {
    /// Create an overlay for `page` in the `Absent` state.
    pub fn new(
        page: PageId,
        engine: Box<dyn RecognitionEngine>,
        media: Arc<dyn MediaSource>,
        events: mpsc::Sender<OverlayEvent>,
    ) -> Self {
        let (state_tx, _) = watch::channel(OverlayState::Absent);
        Self {
            page,
            state: OverlayState::Absent,
            transcript: TranscriptReconciler::new(),
            engine,
            media,
            session: None,
            events,
            state_tx,
        }
    }

    /// Page this overlay belongs to.
    pub fn page(&self) -> PageId {
        self.page
    }

    /// Current state.
    pub fn state(&self) -> OverlayState {
        self.state
    }

    /// Watch state changes.
    pub fn subscribe(&self) -> watch::Receiver<OverlayState> {
        self.state_tx.subscribe()
    }

    /// Current reconciled display text.
    pub fn display(&self) -> String {
        self.transcript.display().into_owned()
    }

    /// Run the page-local auth check and leave `Absent` if it passes.
    #[instrument(skip(self, store), fields(page_id = %self.page))]
    pub async fn initialize(&mut self, store: &SessionStore) {
        let authenticated = store.is_authenticated();
        debug!(authenticated, "Local auth check");
        self.apply(OverlayInput::Initialized { authenticated }).await;
    }

    /// Dispatch a command from another context.
    pub async fn handle_command(&mut self, command: Command) {
        let input = match command {
            Command::Show => OverlayInput::Show,
            Command::AuthStatus { authenticated } => OverlayInput::AuthStatus { authenticated },
        };
        self.apply(input).await;
    }

    /// Dispatch a user gesture.
    pub async fn handle_gesture(&mut self, gesture: Gesture) {
        let input = match gesture {
            Gesture::Activate => OverlayInput::Activate,
            Gesture::TogglePause => OverlayInput::TogglePause,
            Gesture::Start => OverlayInput::StartRecording,
            Gesture::End => OverlayInput::EndRecording,
            Gesture::OutsideClick => OverlayInput::OutsideInteraction,
        };
        self.apply(input).await;
    }

    /// Next event of the running recording session.
    ///
    /// Pends forever when no session runs. `None` means the engine closed its
    /// stream. Cancel-safe.
    pub async fn next_recognition_event(&mut self) -> Option<RecognitionEvent> {
        match self.session.as_mut() {
            Some(session) => session.events.recv().await,
            None => std::future::pending().await,
        }
    }

    /// Feed one recognition event (or the end of the stream) into the overlay.
    #[instrument(skip(self), fields(page_id = %self.page))]
    pub async fn handle_recognition_event(&mut self, event: Option<RecognitionEvent>) {
        match event {
            Some(RecognitionEvent::Ready) => debug!("Recognition engine ready"),
            Some(RecognitionEvent::Recognizing(text)) => {
                if self.transcript.interim_update(&text) {
                    self.publish_transcript();
                }
            }
            Some(RecognitionEvent::Recognized(text)) => {
                if self.transcript.finalize(&text) {
                    self.publish_transcript();
                }
            }
            Some(RecognitionEvent::Error(reason)) => self.fail_recording(reason).await,
            None => self.fail_recording("recognition stream closed".to_string()).await,
        }
    }

    /// Page unload: release everything and end in `Absent`.
    #[instrument(skip(self), fields(page_id = %self.page))]
    pub async fn shutdown(&mut self) {
        self.apply(OverlayInput::AuthStatus {
            authenticated: false,
        })
        .await;
        info!("Overlay unloaded");
    }

    /// Apply one input and perform its side effects.
    #[instrument(skip(self), fields(page_id = %self.page))]
    pub async fn apply(&mut self, input: OverlayInput) {
        let before = self.state;
        let mut after = before.next(input);

        if after == before {
            debug!(state = ?before, "No transition");
            return;
        }

        if before.is_recording() && !after.is_recording() {
            self.finish_session().await;
        }

        if !before.is_recording() && after.is_recording() {
            if let Err(e) = self.begin_session().await {
                error!(error = ?e, "Failed to start recording");
                self.report(&e);
                after = OverlayState::Expanded {
                    recording: false,
                    paused: false,
                };
            }
        } else if before.is_recording() && after.is_recording() {
            let toggled = if after.is_paused() {
                self.engine.pause().await
            } else {
                self.engine.resume().await
            };
            if let Err(e) = toggled {
                error!(error = ?e, "Engine rejected pause/resume");
                self.report(&e);
                self.finish_session().await;
                after = after.next(OverlayInput::RecordingFailed);
            }
        }

        if !before.is_present() && after.is_present() {
            info!("Overlay mounted");
        } else if before.is_present() && !after.is_present() {
            self.transcript.reset();
            info!("Overlay torn down");
        }

        self.set_state(after);
    }

    #[instrument(skip(self), fields(page_id = %self.page))]
    async fn begin_session(&mut self) -> CoreResult<()> {
        let stream = self.media.acquire()?;

        // On failure the stream drops here and releases the device; the
        // previous transcript is kept.
        let events = self.engine.start(&stream).await?;
        self.transcript.reset();

        let id = Uuid::new_v4();
        info!(session_id = %id, stream_id = %stream.id(), "Recording started");

        self.session = Some(RecordingSession {
            id,
            started_at: Instant::now(),
            stream,
            events,
        });

        Ok(())
    }

    /// Release the capture handle first, then wait for the engine to stop.
    /// Interim text is discarded, never promoted.
    #[instrument(skip(self), fields(page_id = %self.page))]
    async fn finish_session(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };

        let RecordingSession {
            id,
            started_at,
            stream,
            events,
        } = session;

        stream.release();
        drop(events);

        if let Err(e) = self.engine.stop().await {
            warn!(session_id = %id, error = ?e, "Engine did not stop cleanly");
        }

        self.transcript.discard_interim();

        info!(
            session_id = %id,
            duration_ms = started_at.elapsed().as_millis(),
            text_len = self.transcript.confirmed().len(),
            "Recording stopped"
        );

        self.emit(OverlayEvent::RecordingEnded {
            page: self.page,
            transcript: self.transcript.confirmed().to_string(),
        });
    }

    async fn fail_recording(&mut self, reason: String) {
        let e = OverlayError::RecognitionEngine {
            reason,
            location: ErrorLocation::from(Location::caller()),
        };
        error!(page_id = %self.page, error = ?e, "Recognition failed, ending session");
        self.report(&e);
        self.apply(OverlayInput::RecordingFailed).await;
    }

    fn set_state(&mut self, state: OverlayState) {
        debug!(page_id = %self.page, from = ?self.state, to = ?state, "Overlay transition");
        self.state = state;
        self.state_tx.send_replace(state);
        self.emit(OverlayEvent::StateChanged {
            page: self.page,
            state,
        });
    }

    fn publish_transcript(&self) {
        self.emit(OverlayEvent::Transcript {
            page: self.page,
            text: self.display(),
        });
    }

    fn report(&self, e: &OverlayError) {
        self.emit(OverlayEvent::Error {
            page: self.page,
            message: e.user_message(),
        });
    }

    fn emit(&self, event: OverlayEvent) {
        if let Err(e) = self.events.try_send(event) {
            let event = e.into_inner();
            if let OverlayEvent::Error { message, .. } = &event {
                warn!(
                    page_id = %self.page,
                    user_message = %message,
                    "User-facing error dropped"
                );
            } else {
                debug!(page_id = %self.page, ?event, "Overlay event dropped");
            }
        }
    }
}
