//! Arthur D. Little insights. Dates are month and year only.

use super::{ExtractCtx, Site, card_text, first_attr, first_text, select_all};
use crate::dates::DateStyle;
use crate::merge::{LinkPolicy, dedupe_by_link};
use crate::models::{Article, ArticleType};
use scraper::Html;

pub const BLOG: Site = Site {
    id: "adl-blog",
    vendor: "adl",
    label: "Arthur D. Little insights",
    kind: ArticleType::Blog,
    urls: &["https://www.adlittle.com/en/insights"],
    pages: 0,
    needs_browser: true,
    ready: &["div.insights-container"],
    min_bytes: 5_000,
    date_style: DateStyle::MonthYear,
    link_policy: LinkPolicy::ANY,
    container: &["div.insights-container"],
    llm_hints: None,
    extract,
};

fn extract(document: &Html, ctx: &ExtractCtx) -> Vec<Article> {
    let cards = select_all(
        document,
        "div.insights-container div[class*=col-xl-3], div.insights-container div[class*=col-xl-4], div.insights-container div[class*=col-xl-12]",
    );
    let articles = cards
        .into_iter()
        .filter_map(|card| {
            let title = first_text(card, "h5").or_else(|| first_text(card, "h3"))?;
            let href = first_attr(card, "h5 a[href], h3 a[href]", "href")
                .or_else(|| first_attr(card, "a.find-more-button[href]", "href"))
                .or_else(|| first_attr(card, "a[href]", "href"))?;
            let link = ctx.link(&href)?;
            let date = first_text(card, "div.row div.col:nth-of-type(2)")
                .map(|t| ctx.date_in(t.rsplit('•').next().unwrap_or_default()))
                .unwrap_or_else(|| ctx.date_in(&card_text(card)));
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
    fn insight_cards_use_month_year() {
        let html = r#"<div class="insights-container"><div class="row">
            <div class="col-12 col-xl-4"><div class="card">
              <h5><a href="/en/insights/viewpoint/future-telecoms">The future of telecoms</a></h5>
              <div class="row g-0"><div class="col">6 min read</div><div class="col">Viewpoint • September 2025</div></div>
            </div></div>
            <div class="col-12 col-xl-3"><div class="card"><h3>Report without a title link</h3>
              <a class="find-more-button" href="/en/insights/report/energy-2030">Find out more</a></div></div>
        </div></div>"#;
        let articles = run(&BLOG, "https://www.adlittle.com/en/insights", html);
        assert_eq!(articles.len(), 2);
        assert_eq!(articles[0].link, "https://www.adlittle.com/en/insights/viewpoint/future-telecoms");
        assert_eq!(articles[0].date, "2025-09-01");
        assert_eq!(articles[1].link, "https://www.adlittle.com/en/insights/report/energy-2030");
        assert_eq!(articles[1].date, "N/A");
    }
}
