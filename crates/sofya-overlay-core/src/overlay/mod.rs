#[allow(clippy::module_inception)]
mod overlay;
mod runtime;
mod state;

pub use {
    overlay::Overlay,
    runtime::{OverlayHandle, OverlayRuntime, RuntimeInstaller},
    state::{OverlayInput, OverlayState},
};
