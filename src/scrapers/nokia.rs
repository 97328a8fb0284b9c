//! Nokia blog (paged) and newsroom press releases.

use super::{ExtractCtx, Site, card_text, first_attr, first_text, select_all};
use crate::dates::DateStyle;
use crate::merge::{LinkPolicy, dedupe_by_link};
use crate::models::{Article, ArticleType};
use scraper::Html;

pub const BLOG: Site = Site {
    id: "nokia-blog",
    vendor: "nokia",
    label: "Nokia blog",
    kind: ArticleType::Blog,
    urls: &["https://www.nokia.com/blog/all-posts/"],
    pages: 10,
    needs_browser: true,
    ready: &["div.blog-post-teaser"],
    min_bytes: 5_000,
    date_style: DateStyle::Patterns,
    link_policy: LinkPolicy::ANY,
    container: &["div.blog-post-list"],
    llm_hints: None,
    extract: extract_blog,
};

fn extract_blog(document: &Html, ctx: &ExtractCtx) -> Vec<Article> {
    let articles = select_all(document, "div.blog-post-teaser")
        .into_iter()
        .filter_map(|teaser| {
            let href = first_attr(teaser, "div.author-page-card a[href]", "href")?;
            let link = ctx.link(&href)?;
            let title = first_text(teaser, "p.author-page-card-title")
                .or_else(|| first_attr(teaser, "img.author-page-card-image", "alt"))
                .filter(|t| t.chars().count() >= 5)?;
            Some(Article::new(title, ctx.date_in(&card_text(teaser)), link))
        })
        .collect();
    dedupe_by_link(articles)
}

const NEWS_HINTS: &str = "\
- Press releases are a.td_headlines links inside div.ppmodule_headlines or div.archive_item_container
- The headline is in div.pp_headline h3
- The date is split across div.pp_date_month, div.pp_date_day and div.pp_date_year inside div.pp_publishdate
- Article links contain /newsroom/; skip filter links containing ?h= or ?t=";

pub const NEWS: Site = Site {
    id: "nokia-news",
    vendor: "nokia",
    label: "Nokia newsroom",
    kind: ArticleType::News,
    urls: &["https://www.nokia.com/newsroom/?h=1&t=press%20releases&match=1"],
    pages: 0,
    needs_browser: true,
    ready: &["a.td_headlines"],
    min_bytes: 5_000,
    date_style: DateStyle::Patterns,
    link_policy: LinkPolicy {
        require_any: &["/newsroom/"],
        forbid_contains: &["?h=", "?t="],
        forbid_suffix: &[],
    },
    container: &["div[class*=ppmodule_headlines]", "div[class*=archive_item_container]", "div.div_headlines"],
    llm_hints: Some(NEWS_HINTS),
    extract: extract_news,
};

/// Headline links carry their date as three separate month/day/year blocks.
fn extract_news(document: &Html, ctx: &ExtractCtx) -> Vec<Article> {
    let articles = select_all(document, "a.td_headlines")
        .into_iter()
        .filter_map(|item| {
            let link = ctx.link(item.value().attr("href")?)?;
            let title = first_text(item, "div.pp_headline h3")
                .or_else(|| first_text(item, "div.pp_headline"))
                .unwrap_or_else(|| card_text(item));
            if title.chars().count() < 5 {
                return None;
            }
            let parts = ["div.pp_date_month", "div.pp_date_day", "div.pp_date_year"]
                .map(|css| first_text(item, css).unwrap_or_default().replace(',', ""));
            let date = if parts.iter().all(|p| !p.is_empty()) {
                ctx.date(&format!("{} {}, {}", parts[0], parts[1], parts[2]))
            } else {
                ctx.date_in(&card_text(item))
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
    fn blog_teasers() {
        let html = r#"<div class="blog-post-list">
            <div class="blog-post-teaser"><div class="author-page-card"><a href="/blog/private-wireless-ports/">
              <p class="author-page-card-title">Private wireless in ports</p></a><span>28 October 2025</span></div></div>
            <div class="blog-post-teaser"><div class="author-page-card"><a href="/blog/x/"><p class="author-page-card-title">x</p></a></div></div>
        </div>"#;
        let articles = run(&BLOG, "https://www.nokia.com/blog/all-posts/?page=1", html);
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].link, "https://www.nokia.com/blog/private-wireless-ports/");
        assert_eq!(articles[0].date, "2025-10-28");
    }

    #[test]
    fn news_dates_are_assembled() {
        let html = r#"<div class="ppmodule_headlines">
            <a class="td_headlines" href="/newsroom/nokia-and-x-sign-deal/">
              <div class="pp_publishdate"><div class="pp_date_month">November</div>
                <div class="pp_date_day">10,</div><div class="pp_date_year">2025</div></div>
              <div class="pp_headline"><h3>Nokia and X sign 5G deal</h3></div></a>
            <a class="td_headlines" href="/newsroom/?h=1&amp;t=press">Filter: press releases</a>
        </div>"#;
        let articles = run(&NEWS, "https://www.nokia.com/newsroom/?h=1&t=press%20releases&match=1", html);
        assert_eq!(articles[0].title, "Nokia and X sign 5G deal");
        assert_eq!(articles[0].date, "2025-11-10");
        assert!(!NEWS.link_policy.accepts(&articles[1].link));
    }
}
