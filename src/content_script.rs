// src/content_script.rs
//! The page side of the message protocol. A content script answers
//! `getProblem` from the page's DOM and applies `pasteCode` to the
//! page's code editor.

use serde_json::Value;

use crate::extractor::Extractor;
use crate::protocol::{PageRequest, PageResponse};

/// A loaded problem page: its markup plus the contents of its code editor.
#[derive(Debug, Clone, Default)]
pub struct Page {
    pub url: String,
    pub html: String,
    pub editor: String,
}

impl Page {
    pub fn new(url: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            html: html.into(),
            editor: String::new(),
        }
    }

    /// Replaces the whole editor buffer with `code`.
    pub fn paste(&mut self, code: &str) {
        self.editor.clear();
        self.editor.push_str(code);
    }
}

#[derive(Debug, Clone, Default)]
pub struct ContentScript {
    extractor: Extractor,
}

impl ContentScript {
    pub fn new(extractor: Extractor) -> Self {
        Self { extractor }
    }

    /// Handles one message delivered to the page. Returns `None` for
    /// messages this script does not answer.
    pub fn on_message(&self, page: &mut Page, message: &Value) -> Option<Value> {
        let request: PageRequest = match serde_json::from_value(message.clone()) {
            Ok(request) => request,
            Err(e) => {
                log::debug!("ignoring message {}: {}", message, e);
                return None;
            }
        };

        let response = self.handle(page, request);
        match serde_json::to_value(&response) {
            Ok(value) => Some(value),
            Err(e) => {
                log::error!("could not encode page response: {}", e);
                None
            }
        }
    }

    pub fn handle(&self, page: &mut Page, request: PageRequest) -> PageResponse {
        match request {
            PageRequest::GetProblem => self.extractor.extract(&page.html),
            PageRequest::PasteCode { code } => {
                log::info!("pasting {} bytes of code into {}", code.len(), page.url);
                page.paste(&code);
                PageResponse::Pasted { ok: true }
            }
        }
    }
}
