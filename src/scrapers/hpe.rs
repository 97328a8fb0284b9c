//! HPE community blogs and newsroom.
//!
//! The community boards print relative dates ("3 days ago", "Monday"),
//! resolved against the run date. hpe.com blocks plain HTTP clients, so the
//! newsroom always goes through the browser.

use super::{ExtractCtx, Site, card_text, first_attr, first_text, select_all};
use crate::dates::DateStyle;
use crate::merge::{LinkPolicy, dedupe_by_link};
use crate::models::{Article, ArticleType, NOT_AVAILABLE};
use scraper::Html;

pub const BLOG: Site = Site {
    id: "hpe-blog",
    vendor: "hpe",
    label: "HPE community blogs",
    kind: ArticleType::Blog,
    urls: &[
        "https://community.hpe.com/t5/the-cloud-experience-everywhere/bg-p/TransformingIT",
        "https://community.hpe.com/t5/networking/bg-p/HPE_Networking",
        "https://community.hpe.com/t5/ai-unlocked/bg-p/AI-Unlocked",
    ],
    pages: 0,
    needs_browser: true,
    ready: &["div.blog-article-teaser"],
    min_bytes: 5_000,
    date_style: DateStyle::Relative,
    link_policy: LinkPolicy::ANY,
    container: &["div.blog-articles-wrapper"],
    llm_hints: None,
    extract: extract_blog,
};

fn extract_blog(document: &Html, ctx: &ExtractCtx) -> Vec<Article> {
    let articles = select_all(document, "div.blog-article-teaser")
        .into_iter()
        .filter_map(|teaser| {
            let href = first_attr(teaser, "div.subject a.message-link[href]", "href")
                .or_else(|| first_attr(teaser, "a[href]", "href"))?;
            let link = ctx.link(&href)?;
            let title = first_text(teaser, "div.subject a.message-link")
                .filter(|t| t.chars().count() >= 5)?;
            let date = first_text(teaser, "div.post-date")
                .map(|d| ctx.date(&d))
                .unwrap_or_else(|| NOT_AVAILABLE.to_string());
            Some(Article::new(title, date, link))
        })
        .collect();
    dedupe_by_link(articles)
}

const NEWS_HINTS: &str = "\
- News items are div.item elements inside div.items-wrapper
- Each item has a card link a.uc-card-wrapper with the article href
- The title is in h5.uc-card-title
- The date is the first span in div.uc-card-label (text before \" | \")
- Article links contain /newsroom/press-release/ or /newsroom/blog-post/";

pub const NEWS: Site = Site {
    id: "hpe-news",
    vendor: "hpe",
    label: "HPE newsroom",
    kind: ArticleType::News,
    urls: &["https://www.hpe.com/us/en/newsroom/press-hub.html"],
    pages: 0,
    needs_browser: true,
    ready: &["div.items-wrapper div.item", "a.uc-card-wrapper"],
    min_bytes: 5_000,
    date_style: DateStyle::Patterns,
    link_policy: LinkPolicy {
        require_any: &["/newsroom/", "/press-release/", "/blog-post/"],
        forbid_contains: &[],
        forbid_suffix: &["/newsroom", "/press-hub.html"],
    },
    container: &["div.items-wrapper", "div.items"],
    llm_hints: Some(NEWS_HINTS),
    extract: extract_news,
};

fn extract_news(document: &Html, ctx: &ExtractCtx) -> Vec<Article> {
    let mut items = select_all(document, "div.items-wrapper div.item, div.items div.item");
    if items.is_empty() {
        items = select_all(document, "div[class*=uc-card]");
    }
    let articles = items
        .into_iter()
        .filter_map(|item| {
            let href = first_attr(item, "a.uc-card-wrapper[href]", "href")
                .or_else(|| first_attr(item, "a[href*=newsroom]", "href"))?;
            let link = ctx.link(&href)?;
            let title = first_text(item, "h5.uc-card-title")?;
            let label = first_text(item, "div.uc-card-label span")
                .map(|l| l.split(" | ").next().unwrap_or_default().trim().to_string())
                .filter(|l| l.len() >= 5);
            let date = match label {
                Some(raw) => ctx.date(&raw),
                None => ctx.date_in(&card_text(item)),
            };
            Some(Article::new(title, date, link))
        })
        .collect();
    dedupe_by_link(articles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scrapers::tests::run;

    #[test]
    fn community_teasers_resolve_relative_dates() {
        let html = r#"<div class="blog-articles-wrapper"><div class="blog-articles">
            <div class="lia-panel-message"><div class="blog-article-teaser"><div class="detail">
              <div class="headline"><div class="subject"><a class="message-link" href="/t5/networking/wifi-7/ba-p/7251">Wi-Fi 7 in the campus</a></div></div>
              <div class="post-date">3 days ago</div></div></div></div>
            <div class="lia-panel-message"><div class="blog-article-teaser"><div class="detail">
              <div class="headline"><div class="subject"><a class="message-link" href="/t5/ai/agents/ba-p/7250">Agents on GreenLake</a></div></div>
              <div class="post-date">Monday</div></div></div></div>
        </div></div>"#;
        let articles = run(&BLOG, "https://community.hpe.com/t5/networking/bg-p/HPE_Networking", html);
        assert_eq!(articles.len(), 2);
        assert_eq!(articles[0].link, "https://community.hpe.com/t5/networking/wifi-7/ba-p/7251");
        assert_eq!(articles[0].date, "2025-11-09");
        assert_eq!(articles[1].date, "2025-11-10");
    }

    #[test]
    fn newsroom_cards() {
        let html = r#"<div class="items-wrapper">
            <div class="item"><a class="uc-card-wrapper" href="/us/en/newsroom/press-release/2025/11/hpe-launches-x.html">
              <div class="uc-card-label"><span>November 10, 2025 | Press release</span></div>
              <h5 class="uc-card-title">HPE launches X</h5></a></div>
            <div class="item"><a class="uc-card-wrapper" href="/us/en/newsroom/blog-post/2025/11/y.html">
              <div class="uc-card-label"><span>Blog</span></div><h5 class="uc-card-title">Why Y matters</h5>
              <p>Posted Nov 3, 2025</p></a></div>
        </div>"#;
        let articles = run(&NEWS, "https://www.hpe.com/us/en/newsroom/press-hub.html", html);
        assert_eq!(articles.len(), 2);
        assert_eq!(articles[0].link, "https://www.hpe.com/us/en/newsroom/press-release/2025/11/hpe-launches-x.html");
        assert_eq!(articles[0].date, "2025-11-10");
        assert_eq!(articles[1].date, "2025-11-03");
    }

    #[test]
    fn newsroom_policy() {
        let p = NEWS.link_policy;
        assert!(p.accepts("https://www.hpe.com/us/en/newsroom/press-release/2025/11/x.html"));
        assert!(!p.accepts("https://www.hpe.com/us/en/newsroom/press-hub.html"));
        assert!(!p.accepts("https://www.hpe.com/us/en/newsroom"));
        assert!(!p.accepts("https://www.hpe.com/us/en/servers.html"));
    }
}
