// src/extractor.rs
use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};
use std::sync::LazyLock;

use crate::protocol::{EXTRACTION_FAILED, PROBLEM_ELEMENTS_NOT_FOUND, PageResponse, Problem};

pub const DEFAULT_TITLE_SELECTOR: &str = r#"[class*="text-title"]"#;
pub const DEFAULT_DESCRIPTION_SELECTOR: &str = r#"[data-track-load="description_content"]"#;

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));
static BLANK_LINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("blank line pattern is valid"));

const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "dd", "div", "dl", "dt", "figcaption",
    "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li",
    "main", "nav", "ol", "p", "pre", "section", "table", "tr", "ul",
];
const SKIPPED_ELEMENTS: &[&str] = &["script", "style", "noscript", "template", "head"];

/// Reads the problem title and description out of a problem page.
#[derive(Debug, Clone)]
pub struct Extractor {
    title_selector: String,
    description_selector: String,
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new(DEFAULT_TITLE_SELECTOR, DEFAULT_DESCRIPTION_SELECTOR)
    }
}

impl Extractor {
    pub fn new(title_selector: &str, description_selector: &str) -> Self {
        Self {
            title_selector: title_selector.to_string(),
            description_selector: description_selector.to_string(),
        }
    }

    /// Extracts the problem from `html`. Failures come back as a
    /// `PageResponse::Failure`, never as a panic or partial problem.
    pub fn extract(&self, html: &str) -> PageResponse {
        match self.try_extract(html) {
            Ok(Some(problem)) => PageResponse::Problem(problem),
            Ok(None) => {
                log::debug!("problem elements not found on page");
                PageResponse::failure(PROBLEM_ELEMENTS_NOT_FOUND)
            }
            Err(details) => {
                log::warn!("extraction failed: {}", details);
                PageResponse::Failure {
                    error: EXTRACTION_FAILED.to_string(),
                    details: Some(details),
                }
            }
        }
    }

    fn try_extract(&self, html: &str) -> Result<Option<Problem>, String> {
        let title_selector = parse_selector(&self.title_selector)?;
        let description_selector = parse_selector(&self.description_selector)?;

        let document = Html::parse_document(html);
        let title = document.select(&title_selector).next();
        let description = document.select(&description_selector).next();

        let (Some(title), Some(description)) = (title, description) else {
            return Ok(None);
        };

        Ok(Some(Problem {
            title: inner_text(title).trim().to_string(),
            description: inner_text(description).trim().to_string(),
        }))
    }
}

fn parse_selector(selector: &str) -> Result<Selector, String> {
    Selector::parse(selector).map_err(|e| format!("invalid selector `{}`: {:?}", selector, e))
}

/// Approximates a browser's `innerText`: whitespace collapses outside
/// `<pre>`, block elements and `<br>` break lines.
pub fn inner_text(element: ElementRef<'_>) -> String {
    let mut collector = TextCollector::default();
    collector.walk(element, element.value().name() == "pre");
    BLANK_LINES.replace_all(&collector.out, "\n\n").into_owned()
}

/// Renders an HTML fragment (such as panel markup) as plain text.
pub fn markup_to_text(markup: &str) -> String {
    let fragment = Html::parse_fragment(markup);
    inner_text(fragment.root_element()).trim().to_string()
}

#[derive(Default)]
struct TextCollector {
    out: String,
}

impl TextCollector {
    fn walk(&mut self, element: ElementRef<'_>, preformatted: bool) {
        for child in element.children() {
            match child.value() {
                Node::Text(text) => self.push_text(text, preformatted),
                Node::Element(el) => {
                    let name = el.name();
                    if SKIPPED_ELEMENTS.contains(&name) {
                        continue;
                    }
                    if name == "br" {
                        self.line_break();
                        continue;
                    }
                    let block = BLOCK_ELEMENTS.contains(&name);
                    if block {
                        self.line_break();
                    }
                    if let Some(child_element) = ElementRef::wrap(child) {
                        self.walk(child_element, preformatted || name == "pre");
                    }
                    if block {
                        self.line_break();
                    }
                }
                _ => {}
            }
        }
    }

    fn push_text(&mut self, text: &str, preformatted: bool) {
        if preformatted {
            self.out.push_str(text);
            return;
        }
        let collapsed = WHITESPACE.replace_all(text, " ");
        let at_boundary =
            self.out.is_empty() || self.out.ends_with('\n') || self.out.ends_with(' ');
        let collapsed: &str = if at_boundary {
            collapsed.trim_start_matches(' ')
        } else {
            &collapsed
        };
        self.out.push_str(collapsed);
    }

    fn line_break(&mut self) {
        let kept = self.out.trim_end_matches(' ').len();
        self.out.truncate(kept);
        self.out.push('\n');
    }
}
