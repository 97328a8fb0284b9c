//! Cisco blogs and newsroom press releases.

use super::{CardRules, ExtractCtx, Site, card_text, first_attr, first_text, select_all};
use crate::dates::DateStyle;
use crate::merge::{LinkPolicy, dedupe_by_link};
use crate::models::{Article, ArticleType};
use scraper::Html;

const BLOG_CARDS: CardRules = CardRules::new("div[class*=blog-card]")
    .title("a.card-link h4, h4")
    .link("a.card-link[href]")
    .description("p.card-paragraph");

pub const BLOG: Site = Site {
    id: "cisco-blog",
    vendor: "cisco",
    label: "Cisco blogs",
    kind: ArticleType::Blog,
    urls: &["https://blogs.cisco.com/"],
    pages: 0,
    needs_browser: false,
    ready: &["div[class*=blog-card]"],
    min_bytes: 5_000,
    date_style: DateStyle::Patterns,
    link_policy: LinkPolicy::ANY,
    container: &["div[class*=cui][class*=section]"],
    llm_hints: None,
    extract: |doc, ctx| BLOG_CARDS.extract(doc, ctx),
};

const NEWS_HINTS: &str = "\
- Press releases are div.cmp-articleitem elements inside section.cmp-articles
- The link is the a element with data-link=\"page\" and data-id=\"link\"
- The title is in h1[data-elem=short_title]; the date is in div[data-elem=date]
- Article links look like https://newsroom.cisco.com/c/r/newsroom/en/us/a/y2025/m11/slug.html";

pub const NEWS: Site = Site {
    id: "cisco-news",
    vendor: "cisco",
    label: "Cisco newsroom press releases",
    kind: ArticleType::News,
    urls: &["https://newsroom.cisco.com/c/r/newsroom/en/us/press-releases.html"],
    pages: 0,
    needs_browser: true,
    ready: &["div.cmp-articleitem"],
    min_bytes: 5_000,
    date_style: DateStyle::Patterns,
    link_policy: LinkPolicy {
        require_any: &["/a/y"],
        forbid_contains: &[],
        forbid_suffix: &[],
    },
    container: &["section.cmp-articles"],
    llm_hints: Some(NEWS_HINTS),
    extract: extract_news,
};

fn extract_news(document: &Html, ctx: &ExtractCtx) -> Vec<Article> {
    let articles = select_all(document, "div.cmp-articleitem")
        .into_iter()
        .filter_map(|item| {
            let href = first_attr(item, "a[data-link=page][data-id=link]", "href")
                .or_else(|| first_attr(item, "a[href]", "href"))?;
            let link = ctx.link(&href)?;
            let title = first_text(item, "h1[data-elem=short_title]")
                .or_else(|| first_text(item, "h1, h2, h3, h4, h5"))?;
            let date = first_text(item, "div[data-elem=date]")
                .map(|d| ctx.date(&d))
                .unwrap_or_else(|| ctx.date_in(&card_text(item)));
            let description = first_text(item, "div[data-elem=description]");
            Some(Article::new(title, date, link).with_description(description))
        })
        .collect();
    dedupe_by_link(articles)
}
