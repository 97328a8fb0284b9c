//! Vendor listing scrapers.
//!
//! Each listing page is described by a static [`Site`]. Scraping one site
//! always follows the same steps:
//!
//! 1. **Fetching**: load every listing URL through the [`FetchRouter`]
//! 2. **Heuristics**: run the site's selector rules over the markup
//! 3. **LLM**: for sites that use it, ask the model for the same records
//! 4. **Merging**: keep heuristic records, add new LLM links that pass the
//!    site's [`LinkPolicy`], dedupe, then write the vendor's JSON file
//!
//! # Supported Sources
//!
//! | Vendor | Module | Listings | LLM |
//! |--------|--------|----------|-----|
//! | Amdocs | [`amdocs`] | insights | yes |
//! | Oracle | [`oracle`] | blog, news | news |
//! | Salesforce | [`salesforce`] | blog | no |
//! | ServiceNow | [`servicenow`] | blog, news | news |
//! | Nokia | [`nokia`] | blog (10 pages), news | news |
//! | Ericsson | [`ericsson`] | blog, news | news |
//! | IBM | [`ibm`] | news | no |
//! | Cisco | [`cisco`] | blog, news | news |
//! | HPE | [`hpe`] | community blogs, newsroom | news |
//! | TM Forum | [`tmforum`] | Inform articles | no |
//! | Forrester | [`forrester`] | blogs | no |
//! | Appledore | [`appledore`] | reports | no |
//! | Arthur D. Little | [`adl`] | insights | no |
//! | Omdia | [`omdia`] | search results | no |

pub mod adl;
pub mod amdocs;
pub mod appledore;
pub mod cisco;
pub mod ericsson;
pub mod forrester;
pub mod hpe;
pub mod ibm;
pub mod nokia;
pub mod omdia;
pub mod oracle;
pub mod salesforce;
pub mod servicenow;
pub mod tmforum;

use crate::config::Config;
use crate::dates::{DateStyle, find_date, normalize_date, parse_date};
use crate::error::{Error, Result};
use crate::extract::selector;
use crate::fetch::{FetchRouter, Readiness};
use crate::links::absolutize;
use crate::llm::{CredentialPool, ListingRequest, extract_listing, markup_excerpt};
use crate::merge::{LinkPolicy, dedupe_by_link, merge};
use crate::models::{Article, ArticleType, NOT_AVAILABLE};
use crate::outputs::json::{write_articles, write_debug};
use crate::utils::collapse_whitespace;
use chrono::NaiveDate;
use scraper::{ElementRef, Html, Selector};
use std::path::PathBuf;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Everything a heuristic extractor needs besides the markup.
#[derive(Debug, Clone)]
pub struct ExtractCtx {
    /// URL of the listing page, for resolving relative links.
    pub base: Url,
    pub today: NaiveDate,
    pub style: DateStyle,
}

impl ExtractCtx {
    pub fn link(&self, href: &str) -> Option<String> {
        absolutize(&self.base, href)
    }

    pub fn date(&self, raw: &str) -> String {
        normalize_date(raw, self.style, self.today)
    }

    /// First date found anywhere in `text`, or `"N/A"`.
    pub fn date_in(&self, text: &str) -> String {
        find_date(text, self.style, self.today).unwrap_or_else(|| NOT_AVAILABLE.to_string())
    }
}

pub type Extractor = fn(&Html, &ExtractCtx) -> Vec<Article>;

/// A listing page and how to read it.
#[derive(Debug, Clone, Copy)]
pub struct Site {
    /// Stable identifier used on the command line, e.g. `hpe-news`.
    pub id: &'static str,
    /// File stem of the output, e.g. `hpe` for `hpe_news.json`.
    pub vendor: &'static str,
    /// Human label used in prompts and logs.
    pub label: &'static str,
    pub kind: ArticleType,
    pub urls: &'static [&'static str],
    /// Number of `?page=N` pages to walk for each URL; 0 for a single page.
    pub pages: u32,
    pub needs_browser: bool,
    /// Selectors proving the listing has rendered.
    pub ready: &'static [&'static str],
    pub min_bytes: usize,
    pub date_style: DateStyle,
    pub link_policy: LinkPolicy,
    /// Selectors of the listing container, preferred for the LLM excerpt.
    pub container: &'static [&'static str],
    /// Site-specific guidance for the LLM; `None` disables LLM extraction.
    pub llm_hints: Option<&'static str>,
    pub extract: Extractor,
}

impl Site {
    pub fn uses_llm(&self) -> bool {
        self.llm_hints.is_some()
    }

    pub fn readiness(&self) -> Readiness {
        Readiness::new(self.ready, self.min_bytes)
    }

    pub fn listing_urls(&self) -> Vec<String> {
        if self.pages == 0 {
            return self.urls.iter().map(|u| u.to_string()).collect();
        }
        self.urls
            .iter()
            .flat_map(|u| (1..=self.pages).map(move |n| format!("{u}?page={n}")))
            .collect()
    }

    pub fn output_file(&self) -> String {
        format!("{}{}", self.vendor, self.kind.file_suffix())
    }
}

static CATALOG: &[Site] = &[
    amdocs::BLOG,
    oracle::BLOG,
    oracle::NEWS,
    salesforce::BLOG,
    servicenow::BLOG,
    servicenow::NEWS,
    nokia::BLOG,
    nokia::NEWS,
    ericsson::BLOG,
    ericsson::NEWS,
    ibm::NEWS,
    cisco::BLOG,
    cisco::NEWS,
    hpe::BLOG,
    hpe::NEWS,
    tmforum::BLOG,
    forrester::BLOG,
    appledore::BLOG,
    adl::BLOG,
    omdia::BLOG,
];

/// Every known listing, in pipeline order.
pub fn catalog() -> &'static [Site] {
    CATALOG
}

pub fn find_site(id: &str) -> Result<&'static Site> {
    CATALOG
        .iter()
        .find(|s| s.id.eq_ignore_ascii_case(id))
        .ok_or_else(|| Error::UnknownSite(id.to_string()))
}

// --- Extraction helpers ---------------------------------------------------

fn parse_or_warn(css: &str) -> Option<Selector> {
    match selector(css) {
        Ok(sel) => Some(sel),
        Err(e) => {
            warn!(error = %e, "Skipping rule with bad selector");
            None
        }
    }
}

/// Text of an element with whitespace collapsed. Adjacent text nodes are
/// kept apart so `<a>x</a><span>Nov 3, 2025</span>` still reads as a date.
pub fn card_text(el: ElementRef<'_>) -> String {
    collapse_whitespace(&el.text().collect::<Vec<_>>().join(" "))
}

/// Non-empty text of the first element under `root` matching `css`.
pub fn first_text(root: ElementRef<'_>, css: &str) -> Option<String> {
    let sel = parse_or_warn(css)?;
    root.select(&sel)
        .map(card_text)
        .find(|t| !t.is_empty())
}

/// Non-empty `attr` of the first element under `root` matching `css` that has it.
pub fn first_attr(root: ElementRef<'_>, css: &str, attr: &str) -> Option<String> {
    let sel = parse_or_warn(css)?;
    root.select(&sel)
        .filter_map(|el| el.value().attr(attr))
        .map(str::trim)
        .find(|v| !v.is_empty())
        .map(str::to_string)
}

/// All elements of the document matching `css`.
pub fn select_all<'a>(document: &'a Html, css: &str) -> Vec<ElementRef<'a>> {
    match parse_or_warn(css) {
        Some(sel) => document.select(&sel).collect(),
        None => Vec::new(),
    }
}

/// Declarative card extraction shared by most listings.
///
/// Selectors other than `card` are relative to each card. A missing `title`
/// selector means the link text is the title; a missing `link` selector means
/// the card itself carries the `href`.
#[derive(Debug, Clone, Copy)]
pub struct CardRules {
    pub card: &'static str,
    pub title: Option<&'static str>,
    pub link: Option<&'static str>,
    /// Date element; its `datetime` attribute wins over its text.
    pub date: Option<&'static str>,
    pub description: Option<&'static str>,
    pub tags: Option<&'static str>,
    pub min_title_len: usize,
}

impl CardRules {
    pub const fn new(card: &'static str) -> Self {
        Self {
            card,
            title: None,
            link: None,
            date: None,
            description: None,
            tags: None,
            min_title_len: 5,
        }
    }

    pub const fn title(mut self, css: &'static str) -> Self {
        self.title = Some(css);
        self
    }

    pub const fn link(mut self, css: &'static str) -> Self {
        self.link = Some(css);
        self
    }

    pub const fn date(mut self, css: &'static str) -> Self {
        self.date = Some(css);
        self
    }

    pub const fn description(mut self, css: &'static str) -> Self {
        self.description = Some(css);
        self
    }

    pub const fn tags(mut self, css: &'static str) -> Self {
        self.tags = Some(css);
        self
    }

    pub fn extract(&self, document: &Html, ctx: &ExtractCtx) -> Vec<Article> {
        let cards = select_all(document, self.card);
        let articles: Vec<Article> = cards
            .into_iter()
            .filter_map(|card| self.read_card(card, ctx))
            .collect();
        debug!(card = self.card, count = articles.len(), "Extracted cards");
        dedupe_by_link(articles)
    }

    fn read_card(&self, card: ElementRef<'_>, ctx: &ExtractCtx) -> Option<Article> {
        let href = match self.link {
            Some(css) => first_attr(card, css, "href")?,
            None => card.value().attr("href")?.to_string(),
        };
        let link = ctx.link(&href)?;

        let title = match (self.title, self.link) {
            (Some(css), _) => first_text(card, css),
            (None, Some(css)) => first_text(card, css),
            (None, None) => Some(card_text(card)),
        }?;
        if title.chars().count() < self.min_title_len {
            return None;
        }

        let date = self
            .date
            .and_then(|css| {
                first_attr(card, css, "datetime").or_else(|| first_text(card, css))
            })
            .map(|raw| ctx.date(&raw))
            .unwrap_or_else(|| ctx.date_in(&card_text(card)));

        let description = self.description.and_then(|css| first_text(card, css));
        let tags = self
            .tags
            .and_then(parse_or_warn)
            .map(|sel| {
                card.select(&sel)
                    .map(card_text)
                    .filter(|t| !t.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Some(
            Article::new(title, date, link)
                .with_description(description)
                .with_tags(tags),
        )
    }
}

// --- Running a site -------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ScrapeOptions {
    /// Dump full and excerpted markup of the first page into `debug_dir`.
    pub debug: bool,
    /// Drop articles dated before this day. Undated articles are kept.
    pub since: Option<NaiveDate>,
    pub use_llm: bool,
    pub today: NaiveDate,
}

/// Shared collaborators for a scraping run.
pub struct ScrapeDeps<'a> {
    pub config: &'a Config,
    pub fetcher: &'a FetchRouter,
    pub llm: Option<&'a CredentialPool>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeReport {
    pub site: &'static str,
    pub articles: usize,
    pub from_llm: usize,
    pub path: PathBuf,
}

/// Drop articles dated before `since`; anything without a parseable date stays.
pub fn filter_since(articles: Vec<Article>, since: NaiveDate, style: DateStyle, today: NaiveDate) -> Vec<Article> {
    let before = articles.len();
    let kept: Vec<Article> = articles
        .into_iter()
        .filter(|a| parse_date(&a.date, style, today).is_none_or(|d| d >= since))
        .collect();
    debug!(dropped = before - kept.len(), %since, "Applied stop date");
    kept
}

struct PageResult {
    heuristic: Vec<Article>,
    excerpt: Option<String>,
}

fn read_page(site: &Site, html: &str, ctx: &ExtractCtx, want_excerpt: bool) -> PageResult {
    let document = Html::parse_document(html);
    let heuristic = (site.extract)(&document, ctx);
    let excerpt = want_excerpt.then(|| markup_excerpt(html, site.container));
    PageResult { heuristic, excerpt }
}

/// Scrape one site and write its JSON file.
#[instrument(level = "info", skip_all, fields(site = site.id))]
pub async fn scrape_site(site: &Site, deps: &ScrapeDeps<'_>, options: &ScrapeOptions) -> Result<ScrapeReport> {
    let readiness = site.readiness();
    let llm = match (site.llm_hints, deps.llm) {
        (Some(hints), Some(pool)) if options.use_llm => Some((hints, pool)),
        (Some(_), None) if options.use_llm => {
            warn!("No API key configured; using heuristic extraction only");
            None
        }
        _ => None,
    };

    let mut collected = Vec::new();
    let mut from_llm = 0;

    for (index, url) in site.listing_urls().iter().enumerate() {
        let html = match deps.fetcher.fetch_with(url, &readiness, site.needs_browser).await {
            Ok(html) => html,
            Err(e) if index == 0 => return Err(e.into()),
            Err(e) => {
                warn!(%url, error = %e, "Listing page failed; keeping earlier pages");
                break;
            }
        };
        info!(%url, bytes = html.len(), "Fetched listing page");

        let base = Url::parse(url).map_err(|e| crate::error::FetchError::InvalidUrl {
            url: url.clone(),
            reason: e.to_string(),
        })?;
        let ctx = ExtractCtx {
            base,
            today: options.today,
            style: site.date_style,
        };
        let want_excerpt = llm.is_some() || (options.debug && index == 0);
        let page = read_page(site, &html, &ctx, want_excerpt);
        info!(count = page.heuristic.len(), "Heuristic extraction done");

        if options.debug && index == 0 {
            let dir = &deps.config.debug_dir;
            write_debug(&dir.join(format!("debug_{}_full_html.html", site.id)), &html).await?;
            if let Some(excerpt) = &page.excerpt {
                write_debug(&dir.join(format!("debug_{}_extracted_html.html", site.id)), excerpt).await?;
            }
        }

        let llm_articles = match (llm, &page.excerpt) {
            (Some((hints, pool)), Some(excerpt)) => {
                let request = ListingRequest {
                    label: site.label,
                    page_url: &ctx.base,
                    hints,
                    excerpt,
                };
                let client = pool.checkout().await?;
                match extract_listing(&*client, &deps.config.llm, &request).await {
                    Ok(found) => found,
                    Err(e) => {
                        warn!(error = %e, "LLM extraction failed; using heuristic results only");
                        Vec::new()
                    }
                }
            }
            _ => Vec::new(),
        };

        let direct = page.heuristic.len();
        let merged = merge(page.heuristic, llm_articles, &site.link_policy);
        from_llm += merged.len() - direct;

        if site.pages > 0 && merged.is_empty() {
            info!(%url, "Empty page; stopping pagination");
            break;
        }
        collected.extend(merged);
    }

    let mut articles = dedupe_by_link(collected);
    for article in &mut articles {
        article.date = normalize_date(&article.date, site.date_style, options.today);
    }
    if let Some(since) = options.since {
        articles = filter_since(articles, since, site.date_style, options.today);
    }

    let path = deps.config.data_dir.join(site.output_file());
    write_articles(&path, &articles).await?;
    info!(count = articles.len(), from_llm, path = %path.display(), "Scraped site");

    Ok(ScrapeReport {
        site: site.id,
        articles: articles.len(),
        from_llm,
        path,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::fetch::HttpFetcher;
    use crate::fetch::RetryPolicy;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub(crate) fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 11, 12).unwrap()
    }

    pub(crate) fn run(site: &Site, url: &str, html: &str) -> Vec<Article> {
        let ctx = ExtractCtx {
            base: Url::parse(url).unwrap(),
            today: today(),
            style: site.date_style,
        };
        (site.extract)(&Html::parse_document(html), &ctx)
    }

    #[test]
    fn catalog_ids_are_unique_and_findable() {
        let mut ids: Vec<_> = catalog().iter().map(|s| s.id).collect();
        assert_eq!(ids.len(), 20);
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 20);
        assert_eq!(find_site("HPE-News").unwrap().vendor, "hpe");
        assert!(matches!(find_site("acme-news"), Err(Error::UnknownSite(_))));
    }

    #[test]
    fn output_file_follows_kind() {
        assert_eq!(find_site("hpe-news").unwrap().output_file(), "hpe_news.json");
        assert_eq!(find_site("forrester-blog").unwrap().output_file(), "forrester_blog_articles.json");
        assert!(!find_site("ibm-news").unwrap().uses_llm());
        assert!(find_site("hpe-news").unwrap().uses_llm());
    }

    #[test]
    fn paged_sites_expand_urls() {
        let urls = find_site("nokia-blog").unwrap().listing_urls();
        assert_eq!(urls.len(), 10);
        assert_eq!(urls[0], "https://www.nokia.com/blog/all-posts/?page=1");
        assert_eq!(find_site("hpe-blog").unwrap().listing_urls().len(), 3);
    }

    #[test]
    fn card_rules_read_cards() {
        const RULES: CardRules = CardRules::new("div.card")
            .title("h3")
            .link("a")
            .date("time")
            .description("p.summary")
            .tags("a.tag");
        let html = r#"<div class="card"><h3>First story here</h3><a href="/news/1">more</a>
                <time datetime="2025-11-03">Nov 3</time><p class="summary">Short.</p>
                <a class="tag" href="/t/5g">5G</a></div>
            <div class="card"><h3>Tiny</h3><a href="/news/2">x</a></div>
            <div class="card"><h3>Second story here</h3><a href="/news/3">x</a>
                <span>Posted October 1, 2025</span></div>
            <div class="card"><h3>No link at all</h3></div>"#;
        let ctx = ExtractCtx {
            base: Url::parse("https://example.com/list").unwrap(),
            today: today(),
            style: DateStyle::Patterns,
        };
        let articles = RULES.extract(&Html::parse_document(html), &ctx);
        assert_eq!(articles.len(), 2);
        assert_eq!(articles[0].link, "https://example.com/news/1");
        assert_eq!(articles[0].date, "2025-11-03");
        assert_eq!(articles[0].description.as_deref(), Some("Short."));
        assert_eq!(articles[0].tags, ["5G"]);
        assert_eq!(articles[1].date, "2025-10-01");
    }

    #[test]
    fn stop_date_keeps_undated() {
        let articles = vec![
            Article::new("new", "2025-11-10", "a"),
            Article::new("old", "2025-01-01", "b"),
            Article::new("undated", "N/A", "c"),
        ];
        let kept = filter_since(articles, NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(), DateStyle::Patterns, today());
        let titles: Vec<_> = kept.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, ["new", "undated"]);
    }

    fn listing_site(url: &'static [&'static str]) -> Site {
        Site {
            id: "test-news",
            vendor: "test",
            label: "Test newsroom",
            kind: ArticleType::News,
            urls: url,
            pages: 0,
            needs_browser: false,
            ready: &["div.card"],
            min_bytes: 10,
            date_style: DateStyle::Patterns,
            link_policy: LinkPolicy::ANY,
            container: &["div.list"],
            llm_hints: None,
            extract: |doc, ctx| CardRules::new("div.card").title("h3").link("a").extract(doc, ctx),
        }
    }

    #[tokio::test]
    async fn scrape_site_writes_vendor_file_and_debug_dumps() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/news"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<html><body><div class="list">
                    <div class="card"><h3>Vendor launches thing</h3><a href="/news/1">x</a><span>Nov 10, 2025</span></div>
                    <div class="card"><h3>Vendor launches thing</h3><a href="/news/1/">x</a></div>
                </div></body></html>"#,
            ))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.data_dir = dir.path().join("data");
        config.debug_dir = dir.path().join("debug");
        let http = HttpFetcher::new(&config.fetch)
            .unwrap()
            .with_retry(RetryPolicy::new(1, Duration::ZERO));
        let fetcher = FetchRouter::new(http, None, Vec::new());
        let deps = ScrapeDeps {
            config: &config,
            fetcher: &fetcher,
            llm: None,
        };
        let url: &'static str = Box::leak(format!("{}/news", server.uri()).into_boxed_str());
        let urls: &'static [&'static str] = Box::leak(vec![url].into_boxed_slice());
        let site = listing_site(urls);
        let options = ScrapeOptions {
            debug: true,
            since: None,
            use_llm: true,
            today: today(),
        };

        let report = scrape_site(&site, &deps, &options).await.unwrap();
        assert_eq!(report.articles, 1);
        assert_eq!(report.from_llm, 0);
        assert!(report.path.ends_with("test_news.json"));

        let written: Vec<Article> = crate::outputs::json::read_articles(&report.path).await.unwrap();
        assert_eq!(written[0].date, "2025-11-10");
        assert!(config.debug_dir.join("debug_test-news_full_html.html").exists());
        assert!(config.debug_dir.join("debug_test-news_extracted_html.html").exists());
    }
}
