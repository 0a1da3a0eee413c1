/// UI/recording state of one page's overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverlayState {
    /// Nothing rendered; the page is unauthenticated or not initialized.
    #[default]
    Absent,
    /// Small pill control.
    Collapsed,
    /// Recorder control bar.
    Expanded {
        /// A recording session is running.
        recording: bool,
        /// The session is paused.
        paused: bool,
    },
}

/// Everything that can move the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayInput {
    /// Page-local auth check finished at initialization.
    Initialized {
        /// Result of the pull check.
        authenticated: bool,
    },
    /// Auth status pushed by the session authority.
    AuthStatus {
        /// Whether a valid session exists.
        authenticated: bool,
    },
    /// `show` command from the control surface.
    Show,
    /// Tap/click on the collapsed control.
    Activate,
    /// Pause/resume button.
    TogglePause,
    /// Explicit start action.
    StartRecording,
    /// Explicit end action.
    EndRecording,
    /// Click outside the overlay.
    OutsideInteraction,
    /// The recording session died underneath the overlay (engine error).
    RecordingFailed,
}

impl OverlayState {
    /// Whether anything is rendered.
    pub fn is_present(self) -> bool {
        !matches!(self, OverlayState::Absent)
    }

    /// Whether a recording session is running (paused or not).
    pub fn is_recording(self) -> bool {
        matches!(
            self,
            OverlayState::Expanded {
                recording: true,
                ..
            }
        )
    }

    /// Whether the running session is paused.
    pub fn is_paused(self) -> bool {
        matches!(
            self,
            OverlayState::Expanded {
                recording: true,
                paused: true
            }
        )
    }

    /// Apply one input. Total and infallible; unknown combinations leave the
    /// state untouched.
    ///
    /// Auth transitions are idempotent and convergent, so a broadcast racing
    /// the page-local check ends in the same state either way.
    pub fn next(self, input: OverlayInput) -> OverlayState {
        use OverlayInput as I;
        use OverlayState as S;

        match (self, input) {
            (_, I::AuthStatus {
                authenticated: false,
            }) => S::Absent,

            (S::Absent, I::Initialized { authenticated } | I::AuthStatus { authenticated }) => {
                if authenticated {
                    S::Collapsed
                } else {
                    S::Absent
                }
            }

            (S::Collapsed, I::Activate | I::Show) => S::Expanded {
                recording: false,
                paused: false,
            },

            (S::Expanded { recording, paused }, I::TogglePause) => S::Expanded {
                recording,
                paused: !paused,
            },

            (
                S::Expanded {
                    recording: false, ..
                },
                I::StartRecording,
            ) => S::Expanded {
                recording: true,
                paused: false,
            },

            (S::Expanded { .. }, I::EndRecording) => S::Collapsed,

            // A running session keeps the control bar open.
            (
                S::Expanded {
                    recording: false, ..
                },
                I::OutsideInteraction,
            ) => S::Collapsed,

            (
                S::Expanded {
                    recording: true, ..
                },
                I::RecordingFailed,
            ) => S::Expanded {
                recording: false,
                paused: false,
            },

            (state, _) => state,
        }
    }
}
