//! Values exchanged between the control surface, the session authority and
//! page overlays.
//!
//! Every message is an owned value; nothing shared crosses a context boundary.

use crate::{OverlayState, PageId};

use serde::{Deserialize, Serialize};

/// Commands delivered to a page's overlay.
///
/// Serialized with a `type` tag so the wire form is
/// `{"type":"show"}` / `{"type":"auth-status","authenticated":true}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Command {
    /// Ask the overlay to become visible and expanded.
    Show,
    /// Push the current authentication status to the overlay.
    AuthStatus {
        /// Whether a valid session exists.
        authenticated: bool,
    },
}

/// Direct user gestures on an overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gesture {
    /// Tap/click on the collapsed control.
    Activate,
    /// Pause/resume button.
    TogglePause,
    /// Start a recording session.
    Start,
    /// End the recording session.
    End,
    /// Click anywhere outside the overlay.
    OutsideClick,
}

/// Notifications relayed from an overlay back to the control surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverlayEvent {
    /// The overlay moved to a new state.
    StateChanged {
        /// Originating page.
        page: PageId,
        /// State after the transition.
        state: OverlayState,
    },
    /// The reconciled display text changed.
    Transcript {
        /// Originating page.
        page: PageId,
        /// Current display text.
        text: String,
    },
    /// A recording session finished; carries the confirmed text only.
    RecordingEnded {
        /// Originating page.
        page: PageId,
        /// Confirmed transcript of the finished session.
        transcript: String,
    },
    /// A failure the user must be told about.
    Error {
        /// Originating page.
        page: PageId,
        /// User-facing message.
        message: String,
    },
}
