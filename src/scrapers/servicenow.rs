//! ServiceNow product-news blog and newsroom press releases.
//!
//! Both pages render client-side and sit behind bot protection, so they are
//! always fetched through the browser.

use super::{CardRules, ExtractCtx, Site, card_text, first_attr, first_text, select_all};
use crate::dates::DateStyle;
use crate::merge::{LinkPolicy, dedupe_by_link};
use crate::models::{Article, ArticleType};
use scraper::Html;

pub const BLOG: Site = Site {
    id: "servicenow-blog",
    vendor: "servicenow",
    label: "ServiceNow product news blog",
    kind: ArticleType::Blog,
    urls: &["https://www.servicenow.com/blogs/category/product-news"],
    pages: 0,
    needs_browser: true,
    ready: &["div.blog-list-wrapper div.card", "div.card"],
    min_bytes: 5_000,
    date_style: DateStyle::Patterns,
    link_policy: LinkPolicy::ANY,
    container: &["div.blog-list-wrapper", "div.blog-list"],
    llm_hints: None,
    extract: extract_blog,
};

fn extract_blog(document: &Html, ctx: &ExtractCtx) -> Vec<Article> {
    let mut cards = select_all(document, "div.blog-list-wrapper div.card, div.blog-list div.card");
    if cards.is_empty() {
        cards = select_all(document, "div.card");
    }
    let articles = cards
        .into_iter()
        .filter_map(|card| {
            let href = first_attr(card, "div.card-thumbnail a[href]", "href")
                .or_else(|| first_attr(card, "div.card-text a[href]", "href"))
                .or_else(|| first_attr(card, "a[href]", "href"))?;
            let link = ctx.link(&href)?;
            let title = first_text(card, "div.card-text h5")
                .or_else(|| first_attr(card, "img", "alt"))
                .filter(|t| t.chars().count() >= 5)?;
            let date = first_text(card, "span.card-date")
                .map(|d| ctx.date(&d))
                .unwrap_or_else(|| ctx.date_in(&card_text(card)));
            Some(Article::new(title, date, link))
        })
        .collect();
    dedupe_by_link(articles)
}

const NEWS_CARDS: CardRules = CardRules::new("div.module_item")
    .title("div.module_headline a.module_headline-link")
    .link("div.module_headline a.module_headline-link")
    .date("div.module_date-time");

const NEWS_HINTS: &str = "\
- Press releases are div.module_item elements inside div#newsList
- The date is in div.module_date-time
- Title and link are in div.module_headline > a.module_headline-link
- Article links contain /press-releases/details/ and end with /default.aspx
- Do not return the press-releases listing page itself or in-page anchors";

pub const NEWS: Site = Site {
    id: "servicenow-news",
    vendor: "servicenow",
    label: "ServiceNow newsroom",
    kind: ArticleType::News,
    urls: &["https://newsroom.servicenow.com/press-releases/default.aspx"],
    pages: 0,
    needs_browser: true,
    ready: &["div.module_item"],
    min_bytes: 5_000,
    date_style: DateStyle::Patterns,
    link_policy: LinkPolicy {
        require_any: &["/press-releases/details/", "newsroom.servicenow.com"],
        forbid_contains: &["#"],
        forbid_suffix: &["/press-releases/default.aspx"],
    },
    container: &["div#newsList", "div[class*=module_container]"],
    llm_hints: Some(NEWS_HINTS),
    extract: |doc, ctx| NEWS_CARDS.extract(doc, ctx),
};
