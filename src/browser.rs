// src/browser.rs
use serde_json::Value;
use std::future::Future;
use std::sync::{Mutex, MutexGuard};

use crate::content_script::{ContentScript, Page};
use crate::errors::{CoachError, Result};
use crate::protocol::{PageRequest, PageResponse};

pub type TabId = u32;

/// The extension's view of the browser's tabs.
pub trait Tabs: Send + Sync {
    /// The single active tab of the current window.
    fn active_tab(&self) -> impl Future<Output = Result<TabId>> + Send;

    /// Delivers `request` to the content script of `tab`. `Ok(None)` means
    /// the script received the message but did not answer.
    fn send_message(
        &self,
        tab: TabId,
        request: &PageRequest,
    ) -> impl Future<Output = Result<Option<PageResponse>>> + Send;
}

struct LocalTab {
    id: TabId,
    page: Page,
    script: Option<ContentScript>,
}

#[derive(Default)]
struct TabStrip {
    tabs: Vec<LocalTab>,
    active: Option<TabId>,
    next_id: TabId,
}

/// In-process browser holding loaded pages. Messages cross a JSON
/// boundary on the way in and out, like real extension messaging.
#[derive(Default)]
pub struct LocalBrowser {
    script: ContentScript,
    strip: Mutex<TabStrip>,
}

impl LocalBrowser {
    pub fn new(script: ContentScript) -> Self {
        Self {
            script,
            strip: Mutex::new(TabStrip::default()),
        }
    }

    /// Opens `page` in a new tab with the content script injected and makes it active.
    pub fn open(&self, page: Page) -> TabId {
        self.insert(page, Some(self.script.clone()))
    }

    /// Opens a page the content script is not allowed to run on.
    pub fn open_without_listener(&self, page: Page) -> TabId {
        self.insert(page, None)
    }

    fn insert(&self, page: Page, script: Option<ContentScript>) -> TabId {
        let mut strip = self.lock();
        strip.next_id += 1;
        let id = strip.next_id;
        log::debug!("opening tab {} at {}", id, page.url);
        strip.tabs.push(LocalTab { id, page, script });
        strip.active = Some(id);
        id
    }

    pub fn activate(&self, tab: TabId) -> Result<()> {
        let mut strip = self.lock();
        if !strip.tabs.iter().any(|t| t.id == tab) {
            return Err(CoachError::PageUnreachable(format!("no tab with id {}", tab)));
        }
        strip.active = Some(tab);
        Ok(())
    }

    pub fn close(&self, tab: TabId) {
        let mut strip = self.lock();
        strip.tabs.retain(|t| t.id != tab);
        if strip.active == Some(tab) {
            strip.active = strip.tabs.last().map(|t| t.id);
        }
    }

    /// A snapshot of the page currently loaded in `tab`.
    pub fn page(&self, tab: TabId) -> Option<Page> {
        self.lock()
            .tabs
            .iter()
            .find(|t| t.id == tab)
            .map(|t| t.page.clone())
    }

    fn lock(&self) -> MutexGuard<'_, TabStrip> {
        self.strip.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn deliver(&self, tab: TabId, message: &Value) -> Result<Option<Value>> {
        let mut strip = self.lock();
        let target = strip
            .tabs
            .iter_mut()
            .find(|t| t.id == tab)
            .ok_or_else(|| CoachError::PageUnreachable(format!("no tab with id {}", tab)))?;
        let script = target.script.as_ref().ok_or_else(|| {
            CoachError::PageUnreachable(format!(
                "no content script is listening in tab {} ({})",
                tab, target.page.url
            ))
        })?;
        Ok(script.on_message(&mut target.page, message))
    }
}

impl Tabs for LocalBrowser {
    async fn active_tab(&self) -> Result<TabId> {
        self.lock()
            .active
            .ok_or_else(|| CoachError::PageUnreachable("no active tab".to_string()))
    }

    async fn send_message(&self, tab: TabId, request: &PageRequest) -> Result<Option<PageResponse>> {
        let message = serde_json::to_value(request)?;
        match self.deliver(tab, &message)? {
            Some(reply) => serde_json::from_value(reply.clone()).map(Some).map_err(|e| {
                CoachError::Extraction {
                    message: format!("unrecognised page response {}", reply),
                    details: Some(e.to_string()),
                }
            }),
            None => Ok(None),
        }
    }
}
