//! Contract with the external speech-recognition engine.

mod manual;

pub use manual::{ManualEngine, ManualEngineFactory, ManualFeed};

use crate::{CoreResult, MediaStream, PageId};

use async_trait::async_trait;
use tokio::sync::mpsc;

/// Events emitted by a recognition engine, in emission order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionEvent {
    /// Engine is listening.
    Ready,
    /// Provisional text for the utterance in progress.
    Recognizing(String),
    /// Final text for a completed utterance.
    Recognized(String),
    /// Engine failure; the session cannot continue.
    Error(String),
}

/// A speech-recognition engine bound to one overlay.
///
/// `start` hands back the ordered event stream for the new session. The
/// stream closes once the engine stops.
#[async_trait]
pub trait RecognitionEngine: Send {
    /// Begin recognizing audio from `stream`.
    async fn start(
        &mut self,
        stream: &MediaStream,
    ) -> CoreResult<mpsc::Receiver<RecognitionEvent>>;
    /// Suspend recognition without ending the session.
    async fn pause(&mut self) -> CoreResult<()>;
    /// Resume after [`RecognitionEngine::pause`].
    async fn resume(&mut self) -> CoreResult<()>;
    /// End the session. Resolves once the engine has stopped emitting.
    async fn stop(&mut self) -> CoreResult<()>;
}

/// Builds the engine for a newly installed overlay.
pub trait EngineFactory: Send + Sync {
    /// Create an engine for `page`.
    fn create(&self, page: PageId) -> Box<dyn RecognitionEngine>;

    /// Forget the engine of an unloaded `page`.
    fn release(&self, _page: PageId) {}
}
