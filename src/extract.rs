//! Text extraction from parsed markup.

use crate::error::ParseError;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

/// Elements whose text never belongs to an article body.
pub const NOISE_TAGS: &[&str] = &["script", "style", "noscript", "nav", "header", "footer", "aside"];

/// Elements that are never rendered as text.
pub const HIDDEN_TAGS: &[&str] = &["script", "style", "noscript", "template"];

const BLOCK_TAGS: &[&str] = &[
    "p", "div", "section", "article", "main", "li", "ul", "ol", "br", "tr", "table", "blockquote",
    "h1", "h2", "h3", "h4", "h5", "h6", "pre", "figure", "figcaption",
];

static MANY_NEWLINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());
static MANY_SPACES: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t\u{a0}]{2,}").unwrap());

pub fn selector(css: &str) -> Result<Selector, ParseError> {
    Selector::parse(css).map_err(|_| ParseError::Selector(css.to_string()))
}

/// Text under `root`, skipping subtrees rooted at any tag in `skip`.
///
/// A newline is emitted before each block-level element so paragraphs stay
/// on separate lines.
pub fn text_without(root: ElementRef<'_>, skip: &[&str]) -> String {
    let mut out = String::new();
    for node in root.descendants() {
        let skipped = node
            .ancestors()
            .chain(std::iter::once(node))
            .filter_map(|n| n.value().as_element())
            .any(|el| skip.contains(&el.name()));
        if skipped {
            continue;
        }
        if let Some(el) = node.value().as_element() {
            if BLOCK_TAGS.contains(&el.name()) {
                out.truncate(out.trim_end_matches([' ', '\t']).len());
                if !out.is_empty() && !out.ends_with('\n') {
                    out.push('\n');
                }
            }
        } else if let Some(text) = node.value().as_text() {
            out.push_str(text);
        }
    }
    out
}

/// Strip each line, collapse space runs and runs of three or more newlines.
pub fn format_text(raw: &str) -> String {
    let lines = raw
        .lines()
        .map(|l| MANY_SPACES.replace_all(l.trim(), " ").into_owned())
        .collect::<Vec<_>>()
        .join("\n");
    MANY_NEWLINES.replace_all(lines.trim(), "\n\n").into_owned()
}

/// Visible text of the whole document, whitespace collapsed.
pub fn page_text(document: &Html) -> String {
    crate::utils::collapse_whitespace(&text_without(document.root_element(), HIDDEN_TAGS))
}
