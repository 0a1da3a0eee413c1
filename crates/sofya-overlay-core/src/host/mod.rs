//! Seam between the coordinating contexts and the pages they address.

mod local;

pub use local::LocalPageHost;

use crate::{Command, OverlayHandle, PageId, PageTarget};

use async_trait::async_trait;
use thiserror::Error;

/// Why a send did not reach an overlay.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SendError {
    /// The page exists but no overlay is listening in it.
    #[error("no receiver in page")]
    NoReceiver,
    /// The page is gone.
    #[error("page {0} not found")]
    PageNotFound(PageId),
    /// A receiver exists but refused the message.
    #[error("message rejected: {reason}")]
    Rejected {
        /// Why the receiver refused.
        reason: String,
    },
}

/// Why the overlay script could not be installed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InjectError {
    /// The page is gone.
    #[error("page {0} not found")]
    PageNotFound(PageId),
    /// The page does not accept scripts.
    #[error("scripts are blocked on {url}")]
    Blocked {
        /// Address of the page.
        url: String,
    },
}

/// Pages reachable from the control surface and the session authority.
///
/// Sends are fire-and-forget: success means the message was handed to a
/// listening overlay, nothing more.
#[async_trait]
pub trait PageHost: Send + Sync {
    /// The page the user is looking at, if any.
    async fn active_page(&self) -> Option<PageTarget>;
    /// Every open page.
    async fn pages(&self) -> Vec<PageTarget>;
    /// Send a command to the overlay in `page`.
    async fn send(&self, page: PageId, command: Command) -> Result<(), SendError>;
    /// Install the overlay script into `page`. Installing into a page that
    /// already runs an overlay is a no-op.
    async fn inject_overlay(&self, page: PageId) -> Result<(), InjectError>;
}

/// Creates the overlay for a page when its script is installed.
pub trait OverlayInstaller: Send + Sync {
    /// Start an overlay in `target`.
    fn install(&self, target: &PageTarget) -> OverlayHandle;
}
