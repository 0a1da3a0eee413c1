use crate::{
    Command, Gesture, InjectError, OverlayHandle, OverlayInstaller, OverlayState, PageHost,
    PageId, PageTarget, SendError, TargetPolicy,
};

use std::{collections::BTreeMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::{Mutex, watch};
use tracing::{debug, info, instrument};

struct PageSlot {
    url: String,
    overlay: Option<OverlayHandle>,
}

#[derive(Default)]
struct Pages {
    slots: BTreeMap<PageId, PageSlot>,
    active: Option<PageId>,
    next_id: u64,
}

/// In-process browser: a set of pages, each optionally running an overlay.
///
/// Script installation refuses restricted pages and is idempotent per page.
/// With `auto_inject` on, eligible pages get their overlay as they open.
pub struct LocalPageHost {
    pages: Mutex<Pages>,
    installer: Arc<dyn OverlayInstaller>,
    policy: TargetPolicy,
    auto_inject: bool,
}

impl LocalPageHost {
    /// Create a host with no pages.
    pub fn new(
        installer: Arc<dyn OverlayInstaller>,
        policy: TargetPolicy,
        auto_inject: bool,
    ) -> Self {
        Self {
            pages: Mutex::new(Pages {
                next_id: 1,
                ..Pages::default()
            }),
            installer,
            policy,
            auto_inject,
        }
    }

    /// Open a page and make it the active one.
    #[instrument(skip(self))]
    pub async fn open_page(&self, url: &str) -> PageTarget {
        let mut pages = self.pages.lock().await;

        let id = PageId(pages.next_id);
        pages.next_id += 1;
        let target = PageTarget::new(id, url);

        let overlay = (self.auto_inject && self.policy.is_eligible(url))
            .then(|| self.installer.install(&target));

        info!(
            page_id = %id,
            overlay = overlay.is_some(),
            "Page opened"
        );

        pages.slots.insert(
            id,
            PageSlot {
                url: url.to_string(),
                overlay,
            },
        );
        pages.active = Some(id);

        target
    }

    /// Close a page, unloading its overlay. Returns `false` for unknown pages.
    #[instrument(skip(self))]
    pub async fn close_page(&self, page: PageId) -> bool {
        let slot = {
            let mut pages = self.pages.lock().await;
            let slot = pages.slots.remove(&page);
            if pages.active == Some(page) {
                pages.active = pages.slots.keys().next_back().copied();
            }
            slot
        };

        let Some(slot) = slot else {
            return false;
        };

        if let Some(overlay) = slot.overlay {
            overlay.unload().await;
        }
        info!(page_id = %page, "Page closed");
        true
    }

    /// Make `page` the active page.
    pub async fn focus(&self, page: PageId) -> bool {
        let mut pages = self.pages.lock().await;
        if pages.slots.contains_key(&page) {
            pages.active = Some(page);
            true
        } else {
            false
        }
    }

    /// Deliver a user gesture to the overlay in `page`.
    pub async fn gesture(&self, page: PageId, gesture: Gesture) -> Result<(), SendError> {
        let pages = self.pages.lock().await;
        let slot = pages.slots.get(&page).ok_or(SendError::PageNotFound(page))?;
        match slot.overlay.as_ref() {
            Some(overlay) => overlay.gesture(gesture),
            None => Err(SendError::NoReceiver),
        }
    }

    /// Last published overlay state of `page`; `None` when no overlay runs.
    pub async fn overlay_state(&self, page: PageId) -> Option<OverlayState> {
        let pages = self.pages.lock().await;
        pages
            .slots
            .get(&page)
            .and_then(|slot| slot.overlay.as_ref())
            .map(OverlayHandle::state)
    }

    /// Watch the overlay state of `page`.
    pub async fn subscribe(&self, page: PageId) -> Option<watch::Receiver<OverlayState>> {
        let pages = self.pages.lock().await;
        pages
            .slots
            .get(&page)
            .and_then(|slot| slot.overlay.as_ref())
            .map(OverlayHandle::subscribe)
    }
}

#[async_trait]
impl PageHost for LocalPageHost {
    async fn active_page(&self) -> Option<PageTarget> {
        let pages = self.pages.lock().await;
        let id = pages.active?;
        pages
            .slots
            .get(&id)
            .map(|slot| PageTarget::new(id, slot.url.clone()))
    }

    async fn pages(&self) -> Vec<PageTarget> {
        let pages = self.pages.lock().await;
        pages
            .slots
            .iter()
            .map(|(id, slot)| PageTarget::new(*id, slot.url.clone()))
            .collect()
    }

    async fn send(&self, page: PageId, command: Command) -> Result<(), SendError> {
        let pages = self.pages.lock().await;
        let slot = pages.slots.get(&page).ok_or(SendError::PageNotFound(page))?;
        match slot.overlay.as_ref() {
            Some(overlay) => overlay.send(command),
            None => Err(SendError::NoReceiver),
        }
    }

    #[instrument(skip(self))]
    async fn inject_overlay(&self, page: PageId) -> Result<(), InjectError> {
        let mut pages = self.pages.lock().await;
        let slot = pages
            .slots
            .get_mut(&page)
            .ok_or(InjectError::PageNotFound(page))?;

        if !self.policy.is_eligible(&slot.url) {
            return Err(InjectError::Blocked {
                url: slot.url.clone(),
            });
        }

        if slot.overlay.as_ref().is_some_and(OverlayHandle::is_alive) {
            debug!(page_id = %page, "Overlay already installed");
            return Ok(());
        }

        let target = PageTarget::new(page, slot.url.clone());
        slot.overlay = Some(self.installer.install(&target));
        info!(page_id = %page, "Overlay injected");

        Ok(())
    }
}
