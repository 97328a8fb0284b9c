//! Omdia search results (AngularJS, rendered in the browser).

use super::{CardRules, Site};
use crate::dates::DateStyle;
use crate::merge::LinkPolicy;
use crate::models::ArticleType;

const CARDS: CardRules = CardRules::new("div.search-result")
    .title("a.search-result__heading")
    .link("a.search-result__heading[href]")
    .date("time")
    .description("p.search-result__description");

pub const BLOG: Site = Site {
    id: "omdia-blog",
    vendor: "omdia",
    label: "Omdia research",
    kind: ArticleType::Blog,
    urls: &["https://omdia.tech.informa.com/search"],
    pages: 0,
    needs_browser: true,
    ready: &["div.search-result"],
    min_bytes: 5_000,
    date_style: DateStyle::Patterns,
    link_policy: LinkPolicy::ANY,
    container: &["div.search-results"],
    llm_hints: None,
    extract: |doc, ctx| CARDS.extract(doc, ctx),
};
