//! Forrester blogs. Recent posts carry relative dates.

use super::{CardRules, Site};
use crate::dates::DateStyle;
use crate::merge::LinkPolicy;
use crate::models::ArticleType;

const CARDS: CardRules = CardRules::new("div#all-posts div[class*=post-block][class*=insight]")
    .title("h2.post-block__title")
    .link("h2.post-block__title a[href]")
    .date("div.post-block__meta span.post-block__date")
    .description("div.post-block__excerpt");

pub const BLOG: Site = Site {
    id: "forrester-blog",
    vendor: "forrester",
    label: "Forrester blogs",
    kind: ArticleType::Blog,
    urls: &["https://www.forrester.com/blogs/"],
    pages: 0,
    needs_browser: true,
    ready: &["div#all-posts"],
    min_bytes: 5_000,
    date_style: DateStyle::Relative,
    link_policy: LinkPolicy::ANY,
    container: &["div#all-posts"],
    llm_hints: None,
    extract: |doc, ctx| CARDS.extract(doc, ctx),
};
