use crate::config::{default_restricted_schemes, default_settle_delay_ms};

use std::time::Duration;

use serde::{Deserialize, Serialize};
use sofya_overlay_core::{RetryPolicy, TargetPolicy};

/// Overlay injection and delivery settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InjectionConfig {
    /// Wait after injecting the overlay before retrying a send.
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
    /// Page address prefixes that never receive the overlay.
    #[serde(default = "default_restricted_schemes")]
    pub restricted_schemes: Vec<String>,
}

impl InjectionConfig {
    pub(crate) fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(Duration::from_millis(self.settle_delay_ms))
    }

    pub(crate) fn target_policy(&self) -> TargetPolicy {
        TargetPolicy::new(self.restricted_schemes.iter().cloned())
    }
}

impl Default for InjectionConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: default_settle_delay_ms(),
            restricted_schemes: default_restricted_schemes(),
        }
    }
}
