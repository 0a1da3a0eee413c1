use crate::config::{default_auto_inject, default_desktop_notifications};

use serde::{Deserialize, Serialize};

/// Application behavior configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BehaviourConfig {
    /// Install the overlay into eligible pages as they open.
    #[serde(default = "default_auto_inject")]
    pub auto_inject: bool,
    /// Show user-facing errors as desktop notifications.
    #[serde(default = "default_desktop_notifications")]
    pub desktop_notifications: bool,
}

impl Default for BehaviourConfig {
    fn default() -> Self {
        Self {
            auto_inject: default_auto_inject(),
            desktop_notifications: default_desktop_notifications(),
        }
    }
}
