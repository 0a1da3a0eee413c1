mod behaviour_config;
#[allow(clippy::module_inception)]
mod config;
mod injection_config;
mod logging_config;
mod session_config;

pub(crate) use {
    behaviour_config::BehaviourConfig, config::Config, injection_config::InjectionConfig,
    logging_config::LoggingConfig, session_config::SessionConfig,
};

use sofya_overlay_core::DEFAULT_RESTRICTED_SCHEMES;

pub(crate) const DEFAULT_AUTO_INJECT: bool = true;
pub(crate) const DEFAULT_DESKTOP_NOTIFICATIONS: bool = true;
pub(crate) const DEFAULT_SETTLE_DELAY_MS: u64 = 500;
pub(crate) const MAX_SETTLE_DELAY_MS: u64 = 10_000;
pub(crate) const DEFAULT_LOG_FILTER: &str = "sofya_overlay=debug,sofya_overlay_core=debug";

pub(crate) fn default_auto_inject() -> bool {
    DEFAULT_AUTO_INJECT
}

pub(crate) fn default_desktop_notifications() -> bool {
    DEFAULT_DESKTOP_NOTIFICATIONS
}

pub(crate) fn default_settle_delay_ms() -> u64 {
    DEFAULT_SETTLE_DELAY_MS
}

pub(crate) fn default_restricted_schemes() -> Vec<String> {
    DEFAULT_RESTRICTED_SCHEMES
        .iter()
        .map(|s| s.to_string())
        .collect()
}

pub(crate) fn default_log_filter() -> String {
    DEFAULT_LOG_FILTER.to_string()
}
