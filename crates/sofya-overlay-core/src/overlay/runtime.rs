use crate::{
    Command, EngineFactory, Gesture, MediaSource, Overlay, OverlayEvent, OverlayInstaller,
    OverlayState, PageId, PageTarget, SendError, SessionStore,
};

use std::{sync::Arc, time::Duration};

use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
};
use tracing::{debug, info, instrument, warn};

const INBOX_CAPACITY: usize = 32;

/// How long an unloading page waits for its overlay task to finish.
const UNLOAD_TIMEOUT: Duration = Duration::from_secs(1);

/// The page side of an installed overlay: its inboxes and state feed.
///
/// Dropping the handle unloads the overlay; its task tears down and exits.
#[derive(Debug)]
pub struct OverlayHandle {
    page: PageId,
    commands: mpsc::Sender<Command>,
    gestures: mpsc::Sender<Gesture>,
    state: watch::Receiver<OverlayState>,
    task: JoinHandle<()>,
}

impl OverlayHandle {
    /// Page the overlay lives in.
    pub fn page(&self) -> PageId {
        self.page
    }

    /// Whether the overlay task is still listening.
    pub fn is_alive(&self) -> bool {
        !self.commands.is_closed()
    }

    /// Deliver a command without waiting. Fire-and-forget.
    pub fn send(&self, command: Command) -> Result<(), SendError> {
        self.commands.try_send(command).map_err(|e| match e {
            mpsc::error::TrySendError::Closed(_) => SendError::NoReceiver,
            mpsc::error::TrySendError::Full(_) => SendError::Rejected {
                reason: "overlay inbox full".to_string(),
            },
        })
    }

    /// Deliver a user gesture.
    pub fn gesture(&self, gesture: Gesture) -> Result<(), SendError> {
        self.gestures.try_send(gesture).map_err(|e| match e {
            mpsc::error::TrySendError::Closed(_) => SendError::NoReceiver,
            mpsc::error::TrySendError::Full(_) => SendError::Rejected {
                reason: "overlay gesture queue full".to_string(),
            },
        })
    }

    /// Last published state.
    pub fn state(&self) -> OverlayState {
        *self.state.borrow()
    }

    /// Watch state changes.
    pub fn subscribe(&self) -> watch::Receiver<OverlayState> {
        self.state.clone()
    }

    /// Unload the page: close the inboxes and wait for teardown.
    #[instrument(skip(self), fields(page_id = %self.page))]
    pub async fn unload(self) {
        let Self {
            commands,
            gestures,
            task,
            ..
        } = self;
        drop(commands);
        drop(gestures);

        match tokio::time::timeout(UNLOAD_TIMEOUT, task).await {
            Ok(Ok(())) => debug!("Overlay task stopped cleanly"),
            Ok(Err(e)) => warn!(error = ?e, "Overlay task panicked"),
            Err(_) => warn!("Overlay task did not stop within timeout"),
        }
    }
}

/// Event loop of one page's overlay.
pub struct OverlayRuntime;

impl OverlayRuntime {
    /// Spawn the overlay task for a page.
    ///
    /// The task first runs the page-local auth check against `store`, then
    /// serves commands, gestures and recognition events until the page
    /// unloads (both inboxes closed). The page's engine is released through
    /// `engines` before the inboxes close.
    pub fn spawn(
        overlay: Overlay,
        store: SessionStore,
        engines: Arc<dyn EngineFactory>,
    ) -> OverlayHandle {
        let page = overlay.page();
        let (command_tx, command_rx) = mpsc::channel(INBOX_CAPACITY);
        let (gesture_tx, gesture_rx) = mpsc::channel(INBOX_CAPACITY);
        let state = overlay.subscribe();

        let task = tokio::spawn(Self::run(overlay, store, engines, command_rx, gesture_rx));

        OverlayHandle {
            page,
            commands: command_tx,
            gestures: gesture_tx,
            state,
            task,
        }
    }

    #[instrument(skip_all, fields(page_id = %overlay.page()))]
    async fn run(
        mut overlay: Overlay,
        store: SessionStore,
        engines: Arc<dyn EngineFactory>,
        mut commands: mpsc::Receiver<Command>,
        mut gestures: mpsc::Receiver<Gesture>,
    ) {
        overlay.initialize(&store).await;
        info!(state = ?overlay.state(), "Overlay installed");

        loop {
            tokio::select! {
                command = commands.recv() => {
                    match command {
                        Some(command) => {
                            debug!(?command, "Command received");
                            overlay.handle_command(command).await;
                        }
                        None => {
                            debug!("Command inbox closed");
                            break;
                        }
                    }
                }

                Some(gesture) = gestures.recv() => {
                    debug!(?gesture, "Gesture received");
                    overlay.handle_gesture(gesture).await;
                }

                event = overlay.next_recognition_event() => {
                    overlay.handle_recognition_event(event).await;
                }
            }
        }

        overlay.shutdown().await;
        engines.release(overlay.page());
    }
}

/// Installs overlays backed by [`OverlayRuntime`] tasks.
pub struct RuntimeInstaller {
    store: SessionStore,
    media: Arc<dyn MediaSource>,
    engines: Arc<dyn EngineFactory>,
    events: mpsc::Sender<OverlayEvent>,
}

impl RuntimeInstaller {
    /// Create an installer sharing one session store, capture source and
    /// engine factory across pages. Overlay events go to `events`.
    pub fn new(
        store: SessionStore,
        media: Arc<dyn MediaSource>,
        engines: Arc<dyn EngineFactory>,
        events: mpsc::Sender<OverlayEvent>,
    ) -> Self {
        Self {
            store,
            media,
            engines,
            events,
        }
    }
}

impl OverlayInstaller for RuntimeInstaller {
    fn install(&self, target: &PageTarget) -> OverlayHandle {
        let overlay = Overlay::new(
            target.id,
            self.engines.create(target.id),
            Arc::clone(&self.media),
            self.events.clone(),
        );
        OverlayRuntime::spawn(overlay, self.store.clone(), Arc::clone(&self.engines))
    }
}
