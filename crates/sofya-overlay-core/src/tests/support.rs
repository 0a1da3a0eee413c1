use crate::{
    Command, InjectError, LocalPageHost, ManualClock, ManualEngineFactory, MemoryStorage,
    Notifier, OverlayEvent, OverlayState, PageHost, PageId, PageTarget, RuntimeInstaller,
    SendError, SessionStore, TargetPolicy, VirtualMediaSource,
};

use std::{
    collections::{HashMap, VecDeque},
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use tokio::sync::mpsc;

/// Fixed "now" used by tests: 2023-11-14T22:13:20Z.
pub(crate) const NOW_MS: i64 = 1_700_000_000_000;

pub(crate) fn memory_store() -> (SessionStore, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(NOW_MS));
    let store = SessionStore::new(Arc::new(MemoryStorage::new()), clock.clone());
    (store, clock)
}

/// Page host whose send/inject outcomes are scripted per test.
pub(crate) struct ScriptedHost {
    pages: Vec<PageTarget>,
    active: Option<PageTarget>,
    per_page: HashMap<PageId, Result<(), SendError>>,
    queued: Mutex<VecDeque<Result<(), SendError>>>,
    fallback: Result<(), SendError>,
    inject_result: Result<(), InjectError>,
    sent: Mutex<Vec<(PageId, Command)>>,
    injections: AtomicUsize,
}

impl ScriptedHost {
    /// Every send fails with "no receiver" and injection succeeds.
    pub(crate) fn new(pages: Vec<PageTarget>) -> Self {
        Self {
            active: pages.first().cloned(),
            pages,
            per_page: HashMap::new(),
            queued: Mutex::new(VecDeque::new()),
            fallback: Err(SendError::NoReceiver),
            inject_result: Ok(()),
            sent: Mutex::new(Vec::new()),
            injections: AtomicUsize::new(0),
        }
    }

    pub(crate) fn without_active_page(mut self) -> Self {
        self.active = None;
        self
    }

    /// Outcomes for the next sends, in order, before falling back.
    pub(crate) fn with_send_outcomes(self, outcomes: Vec<Result<(), SendError>>) -> Self {
        *self.queued.lock().unwrap_or_else(|e| e.into_inner()) = outcomes.into();
        self
    }

    pub(crate) fn with_fallback(mut self, outcome: Result<(), SendError>) -> Self {
        self.fallback = outcome;
        self
    }

    /// Fixed outcome for every send to `page`.
    pub(crate) fn with_page_outcome(
        mut self,
        page: PageId,
        outcome: Result<(), SendError>,
    ) -> Self {
        self.per_page.insert(page, outcome);
        self
    }

    pub(crate) fn with_inject_result(mut self, result: Result<(), InjectError>) -> Self {
        self.inject_result = result;
        self
    }

    pub(crate) fn sent(&self) -> Vec<(PageId, Command)> {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub(crate) fn injections(&self) -> usize {
        self.injections.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageHost for ScriptedHost {
    async fn active_page(&self) -> Option<PageTarget> {
        self.active.clone()
    }

    async fn pages(&self) -> Vec<PageTarget> {
        self.pages.clone()
    }

    async fn send(&self, page: PageId, command: Command) -> Result<(), SendError> {
        self.sent
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((page, command));

        if let Some(outcome) = self.per_page.get(&page) {
            return outcome.clone();
        }

        self.queued
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone())
    }

    async fn inject_overlay(&self, _page: PageId) -> Result<(), InjectError> {
        self.injections.fetch_add(1, Ordering::SeqCst);
        self.inject_result.clone()
    }
}

/// Notifier that remembers what it was asked to show.
#[derive(Default)]
pub(crate) struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub(crate) fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, message: &str) {
        self.messages
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(message.to_string());
    }
}

/// A [`LocalPageHost`] wired to real overlay runtimes.
pub(crate) struct Browser {
    pub(crate) store: SessionStore,
    pub(crate) clock: Arc<ManualClock>,
    pub(crate) media: VirtualMediaSource,
    pub(crate) engines: Arc<ManualEngineFactory>,
    pub(crate) host: Arc<LocalPageHost>,
    pub(crate) events: mpsc::Receiver<OverlayEvent>,
}

impl Browser {
    pub(crate) fn new(auto_inject: bool) -> Self {
        let (store, clock) = memory_store();
        let media = VirtualMediaSource::new();
        let engines = Arc::new(ManualEngineFactory::new());
        let (events_tx, events) = mpsc::channel(256);

        let installer = RuntimeInstaller::new(
            store.clone(),
            Arc::new(media.clone()),
            engines.clone(),
            events_tx,
        );
        let host = Arc::new(LocalPageHost::new(
            Arc::new(installer),
            TargetPolicy::default(),
            auto_inject,
        ));

        Self {
            store,
            clock,
            media,
            engines,
            host,
            events,
        }
    }

    /// Wait (bounded) until the overlay in `page` satisfies `predicate`.
    pub(crate) async fn wait_for(
        &self,
        page: PageId,
        predicate: impl FnMut(&OverlayState) -> bool,
    ) -> Option<OverlayState> {
        let mut rx = self.host.subscribe(page).await?;
        let state = tokio::time::timeout(Duration::from_secs(2), rx.wait_for(predicate))
            .await
            .ok()?
            .ok()
            .map(|state| *state);
        state
    }
}
