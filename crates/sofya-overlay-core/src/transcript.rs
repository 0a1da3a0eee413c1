//! Two-tier transcript reconciliation.
//!
//! Interim text is provisional and replaced wholesale by each new interim
//! event. Final text is appended to the confirmed transcript and never edited.
//! The display value is always derived from the two.

use std::borrow::Cow;

/// Merges interim/final recognition output into one growing transcript.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TranscriptReconciler {
    confirmed: String,
    interim: String,
}

impl TranscriptReconciler {
    /// Create an empty reconciler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Text committed so far in this session.
    pub fn confirmed(&self) -> &str {
        &self.confirmed
    }

    /// Provisional text not yet finalized.
    pub fn interim(&self) -> &str {
        &self.interim
    }

    /// Replace the provisional text. Returns `false` for empty input (no-op).
    pub fn interim_update(&mut self, text: &str) -> bool {
        if text.is_empty() {
            return false;
        }
        text.clone_into(&mut self.interim);
        true
    }

    /// Commit `text` after the confirmed transcript and drop any interim
    /// text. Returns `false` for empty input (no-op).
    pub fn finalize(&mut self, text: &str) -> bool {
        if text.is_empty() {
            return false;
        }
        if !self.confirmed.is_empty() {
            self.confirmed.push(' ');
        }
        self.confirmed.push_str(text);
        self.interim.clear();
        true
    }

    /// Drop uncommitted text. Interim output is never promoted on stop.
    pub fn discard_interim(&mut self) {
        self.interim.clear();
    }

    /// Start a new recording session: both tiers become empty.
    pub fn reset(&mut self) {
        self.confirmed.clear();
        self.interim.clear();
    }

    /// Confirmed text followed by the interim text, separated by one space
    /// when both are present.
    pub fn display(&self) -> Cow<'_, str> {
        match (self.confirmed.is_empty(), self.interim.is_empty()) {
            (_, true) => Cow::Borrowed(&self.confirmed),
            (true, false) => Cow::Borrowed(&self.interim),
            (false, false) => Cow::Owned(format!("{} {}", self.confirmed, self.interim)),
        }
    }
}
