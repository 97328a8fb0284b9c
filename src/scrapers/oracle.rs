//! Oracle blogs and newsroom.

use super::{CardRules, ExtractCtx, Site, card_text, first_attr, first_text, select_all};
use crate::dates::DateStyle;
use crate::merge::{LinkPolicy, dedupe_by_link};
use crate::models::{Article, ArticleType};
use scraper::Html;

const BLOG_CARDS: CardRules = CardRules::new("section[class*=rc90] div.blogtile")
    .title("div.blogtile-w2 h3")
    .link("div.blogtile-w2 h3 a[href]");

pub const BLOG: Site = Site {
    id: "oracle-blog",
    vendor: "oracle",
    label: "Oracle blogs",
    kind: ArticleType::Blog,
    urls: &["https://blogs.oracle.com/"],
    pages: 0,
    needs_browser: true,
    ready: &["div.blogtile"],
    min_bytes: 5_000,
    date_style: DateStyle::Patterns,
    link_policy: LinkPolicy::ANY,
    container: &["section[class*=rc90]"],
    llm_hints: None,
    extract: |doc, ctx| BLOG_CARDS.extract(doc, ctx),
};

const NEWS_HINTS: &str = "\
- News items are li.rc92w3 elements inside ul.rc92w2
- The date is in div.rc92-dt
- Title and link are in div.rc92w5 > h3 > a (sometimes h5 > a)
- Links look like https://www.oracle.com/news/announcement/...
- Do not return the /news/ listing page itself";

pub const NEWS: Site = Site {
    id: "oracle-news",
    vendor: "oracle",
    label: "Oracle news",
    kind: ArticleType::News,
    urls: &["https://www.oracle.com/news/"],
    pages: 0,
    needs_browser: true,
    ready: &["li.rc92w3", "ul.rc92w2"],
    min_bytes: 5_000,
    date_style: DateStyle::Patterns,
    link_policy: LinkPolicy {
        require_any: &["/news/", "/announcement/"],
        forbid_contains: &[],
        forbid_suffix: &["/news"],
    },
    container: &["section[class*=rc92]", "ul.rc92w2"],
    llm_hints: Some(NEWS_HINTS),
    extract: extract_news,
};

fn extract_news(document: &Html, ctx: &ExtractCtx) -> Vec<Article> {
    let mut items = select_all(document, "li.rc92w3");
    if items.is_empty() {
        items = select_all(document, "ul.rc92w2 li");
    }
    let articles = items
        .into_iter()
        .filter_map(|item| {
            let href = first_attr(item, "div[class*=rc92w5] h3 a, div[class*=rc92w5] h5 a", "href")?;
            let link = ctx.link(&href)?;
            let title = first_text(item, "div[class*=rc92w5] h3, div[class*=rc92w5] h5")?;
            let date = first_text(item, "div[class*=rc92-dt]")
                .map(|d| ctx.date(&d))
                .unwrap_or_else(|| ctx.date_in(&card_text(item)));
            let description = first_text(item, "div[class*=rc92w5] p");
            Some(Article::new(title, date, link).with_description(description))
        })
        .collect();
    dedupe_by_link(articles)
}
