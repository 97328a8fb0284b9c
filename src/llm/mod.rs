//! Prompts and response parsing for the LLM tasks.
//!
//! - [`listing`]: pull article records out of a listing page excerpt
//! - [`summary`]: main ideas and tags for one article body
//! - [`validation`]: a pass/fail review of a stored article
//! - [`pool`]: one client per API key, leased to concurrent workers

pub mod listing;
pub mod pool;
pub mod summary;
pub mod validation;

pub use listing::{ListingRequest, extract_listing, markup_excerpt};
pub use pool::{CredentialPool, Lease};
pub use summary::{Summary, summarize};

/// Remove a surrounding markdown code fence from a model reply.
///
/// Handles a leading "```json" or bare "```" and a trailing "```".
pub fn strip_code_fences(reply: &str) -> &str {
    let mut text = reply.trim();
    if let Some(rest) = text.strip_prefix("```json") {
        text = rest;
    } else if let Some(rest) = text.strip_prefix("```") {
        text = rest;
    }
    if let Some(rest) = text.strip_suffix("```") {
        text = rest;
    }
    text.trim()
}
