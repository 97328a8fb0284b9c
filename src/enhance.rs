//! Article enhancement: fetch each article page, summarise it, store it.
//!
//! For every combined article the enhancer:
//!
//! 1. **Checks the store**: a row with text and main ideas is reused as is;
//!    a row with text only is summarised again without fetching
//! 2. **Fetches** the article page and extracts its body text
//! 3. **Summarises** the text into main ideas and tags
//!
//! Articles run concurrently, one per leased API key, and come back in
//! input order. The batch is then written to a JSON debug copy and upserted
//! into the `articles` table.

use crate::config::Config;
use crate::error::{Error, LlmError, Result};
use crate::extract::{NOISE_TAGS, format_text, selector, text_without};
use crate::fetch::{Fetcher, Readiness};
use crate::links::on_domain;
use crate::llm::{CredentialPool, Summary, summarize};
use crate::models::{EnhancedArticle, NOT_AVAILABLE, UnifiedArticle};
use crate::outputs::json::{read_articles, write_articles};
use crate::store::{ArticleStore, UpsertOutcome};
use crate::utils::{collapse_whitespace, truncate_chars};
use futures::stream::{self, StreamExt};
use scraper::{ElementRef, Html};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};

/// Longest article text kept, in characters.
pub const ARTICLE_TEXT_LIMIT: usize = 50_000;

/// Below this many characters the extracted text is probably page chrome.
const MIN_TEXT_CHARS: usize = 100;

const CONTENT_SELECTORS: &[&str] = &[
    "article",
    "main",
    "[role=main]",
    ".article-content",
    ".post-content",
    ".entry-content",
    ".content",
    "div[class*=article]",
    "div[class*=content]",
    "div[class*=post]",
];

/// IBM newsroom campaign pages keep their text in `wd_*` widgets.
const IBM_SELECTORS: &[&str] = &[
    ".wd_item",
    ".wd_content",
    ".wd_summary",
    ".wd_description",
    "div[class*=wd_]",
    ".campaign-content",
];

const ARTICLE_READY: &[&str] = &["article", "main", "[role=main]"];

pub async fn load_articles(path: &Path) -> Result<Vec<UnifiedArticle>> {
    let articles: Vec<UnifiedArticle> = read_articles(path).await?;
    info!(count = articles.len(), path = %path.display(), "Loaded articles");
    Ok(articles)
}

/// Articles per source, sources in first-seen order.
pub fn group_by_source(articles: Vec<UnifiedArticle>) -> Vec<(String, Vec<UnifiedArticle>)> {
    let mut groups: Vec<(String, Vec<UnifiedArticle>)> = Vec::new();
    for article in articles {
        match groups.iter_mut().find(|(source, _)| *source == article.source) {
            Some((_, group)) => group.push(article),
            None => groups.push((article.source.clone(), vec![article])),
        }
    }
    groups
}

/// The first `per_vendor` articles of each source.
pub fn select_test_articles(groups: Vec<(String, Vec<UnifiedArticle>)>, per_vendor: usize) -> Vec<UnifiedArticle> {
    groups
        .into_iter()
        .flat_map(|(_, group)| group.into_iter().take(per_vendor))
        .collect()
}

fn outside_noise(el: &ElementRef<'_>) -> bool {
    !NOISE_TAGS.contains(&el.value().name())
        && !el
            .ancestors()
            .filter_map(|n| n.value().as_element())
            .any(|e| NOISE_TAGS.contains(&e.name()))
}

/// First element matching any of `selectors`, tried in order.
fn first_match<'a>(document: &'a Html, selectors: &[&str]) -> Option<ElementRef<'a>> {
    selectors
        .iter()
        .filter_map(|css| selector(css).ok())
        .find_map(|sel| document.select(&sel).find(outside_noise))
}

fn visible_len(text: &str) -> usize {
    collapse_whitespace(text).chars().count()
}

/// Body text of an article page, paragraph breaks kept.
///
/// Returns `None` when the page has no text at all.
pub fn extract_article_text(html: &str, url: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let root = first_match(&document, CONTENT_SELECTORS)
        .or_else(|| first_match(&document, &["body"]))
        .unwrap_or_else(|| document.root_element());
    let mut text = text_without(root, NOISE_TAGS);

    if visible_len(&text) < MIN_TEXT_CHARS && on_domain(url, "newsroom.ibm.com") {
        let fallback = IBM_SELECTORS
            .iter()
            .filter_map(|css| first_match(&document, &[*css]))
            .map(|el| text_without(el, NOISE_TAGS))
            .find(|t| visible_len(t) >= MIN_TEXT_CHARS);
        if let Some(found) = fallback {
            debug!(%url, "Using newsroom widget text");
            text = found;
        }
    }

    let formatted = format_text(&text);
    if formatted.is_empty() {
        return None;
    }
    if visible_len(&formatted) < MIN_TEXT_CHARS {
        warn!(%url, chars = formatted.chars().count(), "Article text is very short");
    }
    Some(truncate_chars(&formatted, ARTICLE_TEXT_LIMIT).to_string())
}

/// How one article was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Text and summary came from the store.
    Reused,
    Summarized,
    /// Text was found but the model call failed.
    SummaryFailed,
    /// No link, or the page could not be fetched.
    Failed,
}

pub struct Enhancer<'a, F> {
    config: &'a Config,
    fetcher: &'a F,
    pool: &'a CredentialPool,
    store: &'a ArticleStore,
}

impl<'a, F: Fetcher> Enhancer<'a, F> {
    pub fn new(config: &'a Config, fetcher: &'a F, pool: &'a CredentialPool, store: &'a ArticleStore) -> Self {
        Self {
            config,
            fetcher,
            pool,
            store,
        }
    }

    async fn fetch_text(&self, url: &str) -> Option<String> {
        let readiness = Readiness::new(ARTICLE_READY, self.config.fetch.min_content_bytes);
        match self.fetcher.fetch(url, &readiness).await {
            Ok(html) => extract_article_text(&html, url),
            Err(e) => {
                warn!(%url, error = %e, "Could not fetch article");
                None
            }
        }
    }

    async fn summarize_text(&self, article: &UnifiedArticle, text: &str) -> std::result::Result<Summary, LlmError> {
        let client = self.pool.checkout().await?;
        summarize(
            &*client,
            &self.config.llm,
            &article.title,
            article.description.as_deref(),
            &collapse_whitespace(text),
        )
        .await
    }

    /// Enhance one article. Failures are logged and yield empty fields.
    #[instrument(level = "info", skip_all, fields(link = %article.link))]
    pub async fn enhance_one(&self, article: UnifiedArticle) -> (EnhancedArticle, Status) {
        if article.link.trim().is_empty() || article.link == NOT_AVAILABLE {
            warn!(title = %article.title, "Skipping article without a link");
            return (EnhancedArticle::bare(article), Status::Failed);
        }

        let existing = match self.store.find_by_link(&article.link).await {
            Ok(row) => row,
            Err(e) => {
                warn!(error = %e, "Store lookup failed; treating article as new");
                None
            }
        };

        let stored_text = match existing {
            Some(row) if row.is_complete() => {
                info!("Already enhanced; reusing stored result");
                let mut enhanced = EnhancedArticle::bare(article);
                enhanced.main_ideas = row.main_ideas;
                enhanced.tags = row.tags;
                enhanced.original_text = row.original_text.unwrap_or_default();
                return (enhanced, Status::Reused);
            }
            Some(row) if row.has_text() => {
                info!("Stored text found; summarising without fetching");
                row.original_text
            }
            _ => None,
        };

        let text = match stored_text {
            Some(text) => text,
            None => match self.fetch_text(&article.link).await {
                Some(text) => {
                    info!(chars = text.chars().count(), "Fetched article text");
                    text
                }
                None => return (EnhancedArticle::bare(article), Status::Failed),
            },
        };

        let outcome = self.summarize_text(&article, &text).await;
        let mut enhanced = EnhancedArticle::bare(article);
        enhanced.original_text = text;
        match outcome {
            Ok(summary) => {
                info!(
                    main_ideas = summary.main_ideas.len(),
                    tags = summary.tags.len(),
                    "Summarised article"
                );
                enhanced.main_ideas = summary.main_ideas;
                enhanced.tags = summary.tags;
                (enhanced, Status::Summarized)
            }
            Err(e) => {
                error!(error = %e, "Summary failed; keeping text only");
                (enhanced, Status::SummaryFailed)
            }
        }
    }

    /// Enhance every article, one in flight per API key, in input order.
    pub async fn enhance_all(&self, articles: Vec<UnifiedArticle>) -> Vec<(EnhancedArticle, Status)> {
        let workers = self.pool.size().min(articles.len()).max(1);
        let total = articles.len();
        info!(workers, total, keys = self.pool.size(), "Enhancing articles");

        let mut results: Vec<(usize, (EnhancedArticle, Status))> = stream::iter(articles.into_iter().enumerate())
            .map(|(i, article)| async move {
                debug!(index = i, "Starting article");
                (i, self.enhance_one(article).await)
            })
            .buffer_unordered(workers)
            .collect()
            .await;
        results.sort_by_key(|(i, _)| *i);
        results.into_iter().map(|(_, r)| r).collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnhanceReport {
    pub total: usize,
    pub summarized: usize,
    pub reused: usize,
    pub failed: usize,
    pub inserted: usize,
    pub updated: usize,
    pub debug_copy: PathBuf,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EnhanceOptions {
    /// Only the first `per_vendor` articles of each source.
    pub test_mode: bool,
    pub per_vendor: usize,
}

/// Enhance the articles in `input` and persist them.
#[instrument(level = "info", skip_all, fields(input = %input.display()))]
pub async fn run<F: Fetcher>(
    config: &Config,
    input: &Path,
    options: EnhanceOptions,
    fetcher: &F,
    pool: &CredentialPool,
    store: &ArticleStore,
) -> Result<EnhanceReport> {
    let t0 = Instant::now();
    let articles = load_articles(input).await?;
    let groups = group_by_source(articles);
    for (source, group) in &groups {
        info!(%source, count = group.len(), "Articles per source");
    }
    let articles = if options.test_mode {
        let picked = select_test_articles(groups, options.per_vendor);
        info!(count = picked.len(), per_vendor = options.per_vendor, "Test mode selection");
        picked
    } else {
        groups.into_iter().flat_map(|(_, group)| group).collect()
    };
    if articles.is_empty() {
        return Err(Error::Config(format!("no articles to enhance in {}", input.display())));
    }

    let results = Enhancer::new(config, fetcher, pool, store)
        .enhance_all(articles)
        .await;

    let mut report = EnhanceReport {
        total: results.len(),
        debug_copy: config.enhanced_debug_copy(),
        ..EnhanceReport::default()
    };
    for (_, status) in &results {
        match status {
            Status::Reused => report.reused += 1,
            Status::Summarized => report.summarized += 1,
            Status::SummaryFailed | Status::Failed => report.failed += 1,
        }
    }

    let enhanced: Vec<EnhancedArticle> = results.into_iter().map(|(e, _)| e).collect();
    write_articles(&report.debug_copy, &enhanced).await?;

    for article in &enhanced {
        match store.upsert(article).await? {
            UpsertOutcome::Inserted => report.inserted += 1,
            UpsertOutcome::Updated => report.updated += 1,
        }
    }

    info!(
        total = report.total,
        summarized = report.summarized,
        reused = report.reused,
        failed = report.failed,
        inserted = report.inserted,
        updated = report.updated,
        elapsed_ms = t0.elapsed().as_millis() as u64,
        "Enhancement finished"
    );
    Ok(report)
}
