//! Sofya Overlay: console host for the page transcription overlay.

mod app;
mod app_command;
mod config;
mod desktop_notifier;
mod error;

pub(crate) use {
    app::App,
    app_command::AppCommand,
    desktop_notifier::DesktopNotifier,
    error::{AppError, Result as AppResult},
};

use crate::config::{Config, DEFAULT_LOG_FILTER};

use tracing::error;
use tracing_subscriber::EnvFilter;

/// Application entry point.
fn main() {
    let config = Config::load();

    let filter = config
        .as_ref()
        .map(|c| c.logging.filter.clone())
        .unwrap_or_else(|_| DEFAULT_LOG_FILTER.to_string());
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .init();

    let config = match config {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to load config: {:?}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = config.validate() {
        error!("Config validation failed: {:?}", e);
        std::process::exit(1);
    }

    let app = match App::new(&config) {
        Ok(app) => app,
        Err(e) => {
            error!("Failed to create App: {:?}", e);
            std::process::exit(1);
        }
    };

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            error!("Failed to create tokio runtime: {:?}", e);
            std::process::exit(1);
        }
    };

    rt.block_on(async {
        if let Err(e) = app.run().await {
            error!(error = ?e, "App error");
        }
    });
}
