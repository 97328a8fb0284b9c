//! IBM newsroom campaign listing. Heuristics only; the markup is stable.

use super::{CardRules, Site};
use crate::dates::DateStyle;
use crate::merge::LinkPolicy;
use crate::models::ArticleType;

const CARDS: CardRules = CardRules::new("ul.wd_item_list li.wd_item")
    .title("div.wd_title a")
    .link("div.wd_title a[href]")
    .date("div.wd_date")
    .description("div.wd_summary");

pub const NEWS: Site = Site {
    id: "ibm-news",
    vendor: "ibm",
    label: "IBM newsroom",
    kind: ArticleType::News,
    urls: &["https://newsroom.ibm.com/campaign"],
    pages: 0,
    needs_browser: false,
    ready: &["li.wd_item"],
    min_bytes: 2_000,
    date_style: DateStyle::Patterns,
    link_policy: LinkPolicy::ANY,
    container: &["ul.wd_item_list"],
    llm_hints: None,
    extract: |doc, ctx| CARDS.extract(doc, ctx),
};
