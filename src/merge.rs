//! Union of heuristic and LLM extraction results.
//!
//! Heuristic records are trusted and kept in order. LLM records only fill
//! gaps: each must carry a link not already seen (after normalisation) and
//! must pass the site's [`LinkPolicy`].

use crate::links::normalize_link;
use crate::models::{Article, NOT_AVAILABLE};
use std::collections::HashSet;
use tracing::debug;

/// Per-site predicate deciding whether an LLM-suggested link is an article.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinkPolicy {
    /// The link must contain at least one of these (empty means no requirement).
    pub require_any: &'static [&'static str],
    /// The link must contain none of these.
    pub forbid_contains: &'static [&'static str],
    /// The link, with trailing slashes removed, must not end with any of these.
    pub forbid_suffix: &'static [&'static str],
}

impl LinkPolicy {
    pub const ANY: LinkPolicy = LinkPolicy {
        require_any: &[],
        forbid_contains: &[],
        forbid_suffix: &[],
    };

    pub fn accepts(&self, link: &str) -> bool {
        let link = link.trim();
        if link.is_empty() || link == NOT_AVAILABLE {
            return false;
        }
        let lower = link.to_lowercase();
        let bare = lower.trim_end_matches('/');
        (self.require_any.is_empty() || self.require_any.iter().any(|s| lower.contains(s)))
            && !self.forbid_contains.iter().any(|s| lower.contains(s))
            && !self
                .forbid_suffix
                .iter()
                .any(|s| bare.ends_with(s.trim_end_matches('/')))
    }
}

/// Heuristic records first, then LLM records that add a new, acceptable link.
pub fn merge(heuristic: Vec<Article>, llm: Vec<Article>, policy: &LinkPolicy) -> Vec<Article> {
    let mut seen: HashSet<String> = heuristic
        .iter()
        .filter(|a| a.has_link())
        .map(|a| normalize_link(&a.link))
        .collect();

    let direct = heuristic.len();
    let mut merged = heuristic;
    for article in llm {
        if !policy.accepts(&article.link) {
            debug!(link = %article.link, "Dropping LLM article rejected by link policy");
            continue;
        }
        if seen.insert(normalize_link(&article.link)) {
            merged.push(article);
        }
    }
    debug!(direct, added = merged.len() - direct, "Merged heuristic and LLM results");
    merged
}

/// Keep the first record per normalised link. Records without a link are kept.
pub fn dedupe_by_link(articles: Vec<Article>) -> Vec<Article> {
    let mut seen = HashSet::new();
    articles
        .into_iter()
        .filter(|a| !a.has_link() || seen.insert(normalize_link(&a.link)))
        .collect()
}
