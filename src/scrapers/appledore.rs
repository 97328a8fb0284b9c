//! Appledore Research reports.
//!
//! The details column reads `Authors: ... Pages: 24 Date: 09/10/2025`; dates
//! are day-first.

use super::{ExtractCtx, Site, card_text, first_attr, first_text, select_all};
use crate::dates::DateStyle;
use crate::merge::{LinkPolicy, dedupe_by_link};
use crate::models::{Article, ArticleType};
use scraper::Html;

pub const BLOG: Site = Site {
    id: "appledore-blog",
    vendor: "appledore",
    label: "Appledore Research reports",
    kind: ArticleType::Blog,
    urls: &[
        "https://appledoreresearch.com/all-reports/?form_submitted=1&term_module=&term_type=&term_topic=&term_status=1672&text_search=&term_tag=&term_vendor=&term_author=",
    ],
    pages: 0,
    needs_browser: false,
    ready: &["div.k-post-table__item--report"],
    min_bytes: 2_000,
    date_style: DateStyle::DayFirst,
    link_policy: LinkPolicy::ANY,
    container: &["div.k-post-table"],
    llm_hints: None,
    extract,
};

fn extract(document: &Html, ctx: &ExtractCtx) -> Vec<Article> {
    let articles = select_all(document, "div.k-post-table__item--report")
        .into_iter()
        .filter_map(|item| {
            let href = first_attr(item, "div.k-post-table__column--title a[href]", "href")?;
            let link = ctx.link(&href)?;
            let title = first_text(item, "div.k-post-table__column--title a[href]")?;
            let details = first_text(item, "div.k-post-table__column--details").unwrap_or_default();
            let date = match details.split_once("Date:") {
                Some((_, rest)) => ctx.date_in(rest),
                None => ctx.date_in(&card_text(item)),
            };
            let description = first_text(
                item,
                "div.k-post-table__column--excerpt div.k-post-table__column-inner",
            );
            Some(Article::new(title, date, link).with_description(description))
        })
        .collect();
    dedupe_by_link(articles)
}
