//! Salesforce blog, recent stories.

use super::{CardRules, Site};
use crate::dates::DateStyle;
use crate::merge::LinkPolicy;
use crate::models::ArticleType;

const CARDS: CardRules = CardRules::new("article.card.card--wide")
    .title("h2.card__title")
    .link("h2.card__title a[href]")
    .date("time.card__date")
    .description("div.card__excerpt p.body-2")
    .tags("ul.card__topics a.label-secondary");

pub const BLOG: Site = Site {
    id: "salesforce-blog",
    vendor: "salesforce",
    label: "Salesforce blog",
    kind: ArticleType::Blog,
    urls: &["https://www.salesforce.com/blog/recent-stories/"],
    pages: 0,
    needs_browser: false,
    ready: &["article.card"],
    min_bytes: 5_000,
    date_style: DateStyle::Patterns,
    link_policy: LinkPolicy::ANY,
    container: &["main"],
    llm_hints: None,
    extract: |doc, ctx| CARDS.extract(doc, ctx),
};
