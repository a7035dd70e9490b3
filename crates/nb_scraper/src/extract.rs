//! Article body extraction from threaded forum pages.
//!
//! Naive whole-page text pulls in reply threads and navigation rails, so
//! extraction walks an ordered selector ladder for the content container and
//! then collects lines until the first reply stop marker. Malformed or empty
//! markup never raises; zero-length output means no content was found.

use chrono::NaiveDateTime;
use ego_tree::NodeRef;
use scraper::{Html, Node, Selector};

use crate::datetime::recover_datetime;
use crate::filters::{is_navigation, is_stop_marker};

/// Ordered content container candidates, first match wins.
const CONTENT_SELECTORS: &[&str] = &[
    "div.content",
    "div#content",
    "td.content",
    "div.post",
    "div.message",
    "td[valign=\"top\"]",
    "div.main-content",
    "div.article-content",
    "td.article",
    "div.forum-content",
    "table[width=\"100%\"]",
];

/// Subtrees that never hold article text.
const SKIPPED_TAGS: &[&str] = &["script", "style", "iframe", "nav", "header", "footer"];

/// Container-scan results below this length trigger the whole-page fallback.
const MIN_BODY_CHARS: usize = 200;
/// Lines at or under this length are treated as chrome, not prose.
const MIN_LINE_CHARS: usize = 20;
/// The fallback starts collecting at the first line longer than this.
const FALLBACK_START_CHARS: usize = 30;

fn collect_text(node: NodeRef<'_, Node>, out: &mut Vec<String>) {
    match node.value() {
        Node::Text(text) => {
            let text = text.trim();
            if !text.is_empty() {
                out.push(text.to_string());
            }
        }
        Node::Element(el) => {
            if SKIPPED_TAGS.contains(&el.name()) {
                return;
            }
            for child in node.children() {
                collect_text(child, out);
            }
        }
        _ => {
            for child in node.children() {
                collect_text(child, out);
            }
        }
    }
}

/// Text lines of a subtree, script/style/navigation subtrees stripped.
fn visible_lines(node: NodeRef<'_, Node>) -> Vec<String> {
    let mut lines = Vec::new();
    collect_text(node, &mut lines);
    lines
}

/// Collect article lines from a located content container: stop at the
/// first reply marker, drop short lines and navigation chrome.
fn scan_container_lines(lines: &[String]) -> String {
    let mut kept = Vec::new();
    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if is_stop_marker(line) {
            break;
        }
        if line.chars().count() > MIN_LINE_CHARS && !is_navigation(line) {
            kept.push(line);
        }
    }
    kept.join("\n")
}

/// Whole-page fallback: same stop markers and line rules, but collection
/// only starts once a substantial line shows up past the page header.
fn scan_page_lines(lines: &[String]) -> String {
    let mut started = false;
    let mut kept = Vec::new();
    for line in lines {
        let line = line.trim();
        if line.is_empty() || is_navigation(line) {
            continue;
        }
        if !started && line.chars().count() > FALLBACK_START_CHARS {
            started = true;
        }
        if started {
            if is_stop_marker(line) {
                break;
            }
            if line.chars().count() > MIN_LINE_CHARS {
                kept.push(line);
            }
        }
    }
    kept.join("\n")
}

/// Extract `(body_text, recovered_timestamp)` from a fully fetched article
/// page.
///
/// The timestamp recovered here takes precedence over anything the listing
/// row produced. An empty body is a valid no-content result, not an error.
pub fn extract_article(document: &Html, now: NaiveDateTime) -> (String, Option<NaiveDateTime>) {
    let page_lines = visible_lines(*document.root_element());
    let page_text = page_lines.join("\n");
    let published_at = recover_datetime(&page_text, now).ok();

    let mut body = String::new();
    for raw_selector in CONTENT_SELECTORS {
        let Ok(selector) = Selector::parse(raw_selector) else {
            continue;
        };
        if let Some(container) = document.select(&selector).next() {
            let candidate = scan_container_lines(&visible_lines(*container));
            if candidate.chars().count() > MIN_BODY_CHARS {
                tracing::debug!(selector = raw_selector, "found article container");
                body = candidate;
                break;
            }
        }
    }

    if body.chars().count() <= MIN_BODY_CHARS {
        body = scan_page_lines(&page_lines);
        if !body.is_empty() {
            tracing::debug!("article body recovered via whole-page fallback");
        }
    }

    (body, published_at)
}
