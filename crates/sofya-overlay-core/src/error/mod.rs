use std::panic::Location;

use error_location::ErrorLocation;
use thiserror::Error;

/// Overlay, session and messaging errors with source location tracking.
#[derive(Error, Debug)]
pub enum OverlayError {
    /// Target page uses a restricted or internal scheme.
    #[error("Target page is not eligible for the overlay: {url} {location}")]
    RestrictedTarget {
        /// Address of the rejected page.
        url: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// No page context is available to receive the overlay.
    #[error("No active page found {location}")]
    NoActiveTarget {
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The overlay script could not be installed into the page.
    #[error("Overlay injection failed: {reason} {location}")]
    InjectionFailure {
        /// Description of the injection failure.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// A command was not delivered, even after the injection retry.
    #[error("Message delivery failed: {reason} {location}")]
    DeliveryFailure {
        /// Description of the delivery failure.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The external recognition engine reported a failure.
    #[error("Recognition engine error: {reason} {location}")]
    RecognitionEngine {
        /// Reason reported by the engine.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// An audio-capture handle could not be acquired.
    #[error("Audio capture unavailable: {reason} {location}")]
    CaptureUnavailable {
        /// Description of the capture failure.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Login was attempted with a malformed identity.
    #[error("Invalid identity: {identity:?} {location}")]
    InvalidIdentity {
        /// The rejected identity.
        identity: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Session storage backend failed.
    #[error("Session storage error: {reason} {location}")]
    Storage {
        /// Description of the storage failure.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Session record could not be serialized.
    #[error("Serialization error: {source} {location}")]
    Serialization {
        /// Underlying serde_json error.
        #[source]
        source: serde_json::Error,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// IO error from filesystem operations.
    #[error("IO error: {source} {location}")]
    Io {
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
        /// Source location where error occurred.
        location: ErrorLocation,
    },
}

impl OverlayError {
    /// Message shown to the user when this error reaches a boundary.
    pub fn user_message(&self) -> String {
        match self {
            OverlayError::RestrictedTarget { .. } => {
                "Transcription does not work on this page. Navigate to a website to use the extension."
                    .to_string()
            }
            OverlayError::NoActiveTarget { .. } => {
                "No open page found. Open a website and try again.".to_string()
            }
            OverlayError::InjectionFailure { .. } | OverlayError::DeliveryFailure { .. } => {
                "Could not start transcription. Reload the page and try again.".to_string()
            }
            OverlayError::RecognitionEngine { reason, .. } => {
                format!("Transcription stopped: {}", reason)
            }
            OverlayError::CaptureUnavailable { .. } => {
                "Microphone unavailable. Check permissions and try again.".to_string()
            }
            OverlayError::InvalidIdentity { .. } => "Please enter a valid email.".to_string(),
            OverlayError::Storage { .. }
            | OverlayError::Serialization { .. }
            | OverlayError::Io { .. } => "Unexpected error. Please try again.".to_string(),
        }
    }
}

impl From<std::io::Error> for OverlayError {
    #[track_caller]
    fn from(source: std::io::Error) -> Self {
        OverlayError::Io {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<serde_json::Error> for OverlayError {
    #[track_caller]
    fn from(source: serde_json::Error) -> Self {
        OverlayError::Serialization {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

/// Result type alias using [`OverlayError`].
pub type Result<T> = std::result::Result<T, OverlayError>;
