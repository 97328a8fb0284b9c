//! Ericsson blog and newsroom.
//!
//! Both listings share one card layout: `h4.card-title > a` for the headline
//! and `p.card-description span.date` for the date. News cards sometimes
//! keep the link only on the image in the surrounding row.

use super::{ExtractCtx, Site, card_text, first_attr, first_text, select_all};
use crate::dates::DateStyle;
use crate::merge::{LinkPolicy, dedupe_by_link};
use crate::models::{Article, ArticleType};
use scraper::{ElementRef, Html};

pub const BLOG: Site = Site {
    id: "ericsson-blog",
    vendor: "ericsson",
    label: "Ericsson blog",
    kind: ArticleType::Blog,
    urls: &["https://www.ericsson.com/en/blog?locs=68304"],
    pages: 0,
    needs_browser: true,
    ready: &["div.filtered-blogs div.card", "div.card"],
    min_bytes: 5_000,
    date_style: DateStyle::Patterns,
    link_policy: LinkPolicy::ANY,
    container: &["div.filtered-blogs"],
    llm_hints: None,
    extract: |doc, ctx| extract_cards(doc, ctx, "div.filtered-blogs div.card"),
};

const NEWS_HINTS: &str = "\
- News items are div.card elements inside div.news-list
- Title and link are in h4.card-title > a
- The date is in p.card-description span.date
- Article links contain /en/news/ or /en/newsroom/; skip filter links with ?typeFilters= or ?locs=
- Do not return the /newsroom, /news or /latest-news listing pages";

pub const NEWS: Site = Site {
    id: "ericsson-news",
    vendor: "ericsson",
    label: "Ericsson newsroom",
    kind: ArticleType::News,
    urls: &["https://www.ericsson.com/en/newsroom/latest-news?typeFilters=1,2,3,4&locs=68304"],
    pages: 0,
    needs_browser: true,
    ready: &["div.news-list div.card"],
    min_bytes: 5_000,
    date_style: DateStyle::Patterns,
    link_policy: LinkPolicy {
        require_any: &["/en/news/", "/newsroom/", "/news/"],
        forbid_contains: &["?typefilters=", "?locs="],
        forbid_suffix: &["/newsroom", "/news", "/latest-news"],
    },
    container: &["div.news-list"],
    llm_hints: Some(NEWS_HINTS),
    extract: |doc, ctx| extract_cards(doc, ctx, "div.news-list div.card"),
};

fn row_link(card: ElementRef<'_>) -> Option<String> {
    card.ancestors()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().has_class("row", scraper::CaseSensitivity::CaseSensitive))
        .and_then(|row| first_attr(row, "a[href]", "href"))
}

fn extract_cards(document: &Html, ctx: &ExtractCtx, css: &str) -> Vec<Article> {
    let mut cards = select_all(document, css);
    if cards.is_empty() {
        cards = select_all(document, "div.card");
    }
    let articles = cards
        .into_iter()
        .filter_map(|card| {
            let title = first_text(card, "h4.card-title")?;
            let href = first_attr(card, "h4.card-title a[href]", "href")
                .or_else(|| first_attr(card, "a[href]", "href"))
                .or_else(|| row_link(card))?;
            let link = ctx.link(&href)?;
            let date = first_text(card, "p.card-description span.date")
                .map(|d| ctx.date(&d))
                .unwrap_or_else(|| ctx.date_in(&card_text(card)));
            let description = first_text(card, "div.preamble-content");
            Some(Article::new(title, date, link).with_description(description))
        })
        .collect();
    dedupe_by_link(articles)
}
