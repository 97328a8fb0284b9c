//! TM Forum Inform homepage articles.
//!
//! Dates are printed as `May 25`, meaning May 2025; they normalise to the
//! first of the month. Use `--since` to stop at older articles.

use super::{CardRules, Site};
use crate::dates::DateStyle;
use crate::merge::LinkPolicy;
use crate::models::ArticleType;

const CARDS: CardRules = CardRules::new("div[class*=HomepageArticles_item]")
    .title("h4.text-xl")
    .link("h4.text-xl a[href]")
    .date("span[class*=Date_articleDate]")
    .tags("div[class*=Topics_topics] a");

pub const BLOG: Site = Site {
    id: "tmforum-blog",
    vendor: "tmforum",
    label: "TM Forum Inform",
    kind: ArticleType::Blog,
    urls: &["https://inform.tmforum.org/"],
    pages: 0,
    needs_browser: true,
    ready: &["div[class*=HomepageArticles_item]"],
    min_bytes: 5_000,
    date_style: DateStyle::ShortMonthYear,
    link_policy: LinkPolicy::ANY,
    container: &["div[class*=HomepageArticles_containerArticles]"],
    llm_hints: None,
    extract: |doc, ctx| CARDS.extract(doc, ctx),
};
