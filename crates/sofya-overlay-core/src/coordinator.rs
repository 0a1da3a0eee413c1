//! Makes an overlay present and reachable in a page.
//!
//! The only retry in the system lives here: when a page has no overlay
//! listening, the script is injected once, the coordinator waits a fixed
//! settle delay, and the command is sent exactly one more time.

use crate::{
    Command, CoreResult, OverlayError, PageHost, PageId, PageTarget, SendError, TargetPolicy,
};

use std::{panic::Location, sync::Arc, time::Duration};

use error_location::ErrorLocation;
use tracing::{debug, info, instrument, warn};

/// Default wait between injecting the script and the retried send.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(500);

/// Bounded retry for delivery into a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    settle_delay: Duration,
}

impl RetryPolicy {
    /// Retried sends per delivery. Fixed: one injection, one retry.
    pub const MAX_RETRIES: u32 = 1;

    /// Policy with the given settle delay.
    pub fn new(settle_delay: Duration) -> Self {
        Self { settle_delay }
    }

    /// Wait between injection and the retried send.
    pub fn settle_delay(&self) -> Duration {
        self.settle_delay
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_SETTLE_DELAY)
    }
}

/// How a command reached its overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// An overlay was already listening.
    Direct,
    /// The overlay was injected and the retried send got through.
    AfterInjection,
}

/// Injection & messaging coordinator.
pub struct InjectionCoordinator {
    host: Arc<dyn PageHost>,
    policy: TargetPolicy,
    retry: RetryPolicy,
}

impl InjectionCoordinator {
    /// Create a coordinator over `host`.
    pub fn new(host: Arc<dyn PageHost>, policy: TargetPolicy, retry: RetryPolicy) -> Self {
        Self {
            host,
            policy,
            retry,
        }
    }

    /// Make the overlay in the active page visible.
    #[instrument(skip(self))]
    pub async fn show_in_active_page(&self) -> CoreResult<Delivery> {
        let Some(target) = self.host.active_page().await else {
            return Err(OverlayError::NoActiveTarget {
                location: ErrorLocation::from(Location::caller()),
            });
        };
        self.ensure_overlay_visible(&target).await
    }

    /// Make `target`'s overlay visible and active.
    ///
    /// Restricted pages fail before anything is sent. Otherwise `show` is
    /// sent; a "no receiver" failure triggers one injection and one retried
    /// send after the settle delay.
    #[instrument(skip(self), fields(page_id = %target.id))]
    pub async fn ensure_overlay_visible(&self, target: &PageTarget) -> CoreResult<Delivery> {
        let caller = Location::caller();

        if !self.policy.is_eligible(&target.url) {
            warn!(url = %target.url, "Refusing restricted page");
            return Err(OverlayError::RestrictedTarget {
                url: target.url.clone(),
                location: ErrorLocation::from(caller),
            });
        }

        let delivery = self.deliver(target.id, Command::Show, caller).await?;
        info!(?delivery, "Overlay shown");
        Ok(delivery)
    }

    /// Send `command`, injecting and retrying once on "no receiver".
    async fn deliver(
        &self,
        page: PageId,
        command: Command,
        caller: &'static Location<'static>,
    ) -> CoreResult<Delivery> {
        match self.host.send(page, command).await {
            Ok(()) => return Ok(Delivery::Direct),
            Err(SendError::NoReceiver) => {
                debug!(page_id = %page, "No overlay listening, injecting");
            }
            Err(e) => {
                return Err(OverlayError::DeliveryFailure {
                    reason: e.to_string(),
                    location: ErrorLocation::from(caller),
                });
            }
        }

        self.host
            .inject_overlay(page)
            .await
            .map_err(|e| OverlayError::InjectionFailure {
                reason: e.to_string(),
                location: ErrorLocation::from(caller),
            })?;

        tokio::time::sleep(self.retry.settle_delay()).await;

        self.host
            .send(page, command)
            .await
            .map(|()| Delivery::AfterInjection)
            .map_err(|e| OverlayError::DeliveryFailure {
                reason: format!("{} after injection", e),
                location: ErrorLocation::from(caller),
            })
    }
}
