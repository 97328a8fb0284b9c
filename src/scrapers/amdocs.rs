//! Amdocs insights.
//!
//! Each teaser is an `<article about="/insights/...">` element. The `about`
//! attribute is the canonical link; the visible anchors sometimes point at
//! category pages instead.

use super::{ExtractCtx, Site, card_text, first_text, select_all};
use crate::dates::DateStyle;
use crate::merge::{LinkPolicy, dedupe_by_link};
use crate::models::{Article, ArticleType};
use scraper::Html;

const HINTS: &str = "\
- Articles are <article> elements with an \"about\" attribute holding the article path
- Titles are in h2/h3 headings inside each article
- Use the \"about\" attribute as the link, prefixing https://www.amdocs.com when relative
- Content types include articles, videos, reports and case studies; extract all of them";

pub const BLOG: Site = Site {
    id: "amdocs-blog",
    vendor: "amdocs",
    label: "Amdocs insights",
    kind: ArticleType::Blog,
    urls: &["https://www.amdocs.com/insights"],
    pages: 0,
    needs_browser: true,
    ready: &["article[about]"],
    min_bytes: 5_000,
    date_style: DateStyle::Patterns,
    link_policy: LinkPolicy {
        require_any: &["/insights/"],
        forbid_contains: &["?"],
        forbid_suffix: &["/insights"],
    },
    container: &[
        "div[class*=views-infinite-scroll-content-wrapper]",
        "div[class*=coh-style-view-pagination]",
    ],
    llm_hints: Some(HINTS),
    extract,
};

fn extract(document: &Html, ctx: &ExtractCtx) -> Vec<Article> {
    let articles = select_all(document, "article[about]")
        .into_iter()
        .filter_map(|card| {
            let link = ctx.link(card.value().attr("about")?)?;
            let title = first_text(card, "h2, h3, h4").or_else(|| first_text(card, "a[href]"))?;
            Some(Article::new(title, ctx.date_in(&card_text(card)), link))
        })
        .collect();
    dedupe_by_link(articles)
}
