//! Combine per-vendor scraper files into one list.
//!
//! Every `<vendor>_news.json` and `<vendor>_blog_articles.json` in the data
//! directory is flattened into [`UnifiedArticle`]s, sorted newest first and
//! written twice: a timestamped copy in the output directory and
//! `all_scraped_articles.json` in the data directory for the enhancer.

use crate::config::Config;
use crate::dates::sort_key;
use crate::error::{Error, Result};
use crate::links::normalize_link;
use crate::models::{Article, ArticleType, UnifiedArticle};
use crate::outputs::json::{read_articles, write_articles};
use crate::utils::upcase;
use chrono::NaiveDateTime;
use itertools::Itertools;
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, instrument, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VendorCounts {
    pub news: usize,
    pub blog: usize,
}

impl VendorCounts {
    pub fn total(&self) -> usize {
        self.news + self.blog
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CombineReport {
    pub total: usize,
    /// Counts keyed by source name, e.g. `Hpe`.
    pub vendors: BTreeMap<String, VendorCounts>,
    /// Articles dropped because the reference file already had their link.
    pub excluded: usize,
    pub path: PathBuf,
    pub latest: PathBuf,
}

/// Per-vendor files in `dir`, sorted by name.
async fn vendor_files(dir: &Path) -> Result<Vec<(PathBuf, String, ArticleType)>> {
    let shown = dir.display().to_string();
    let mut entries = fs::read_dir(dir).await.map_err(|e| Error::io(shown.clone(), e))?;
    let mut names = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(|e| Error::io(shown.clone(), e))? {
        if let Some(name) = entry.file_name().to_str() {
            names.push(name.to_string());
        }
    }
    Ok(names
        .into_iter()
        .sorted()
        .filter_map(|name| {
            let (stem, kind) = ArticleType::from_file_name(&name)?;
            Some((dir.join(&name), stem.to_string(), kind))
        })
        .collect())
}

/// Normalised links of a previously combined file.
async fn reference_links(path: &Path) -> Result<HashSet<String>> {
    let articles: Vec<Article> = read_articles(path).await?;
    Ok(articles
        .iter()
        .filter(|a| a.has_link())
        .map(|a| normalize_link(&a.link))
        .collect())
}

/// Stable sort, newest first; undated articles go last.
pub fn sort_newest_first(articles: Vec<UnifiedArticle>) -> Vec<UnifiedArticle> {
    articles
        .into_iter()
        .sorted_by(|a, b| sort_key(&b.date).cmp(sort_key(&a.date)))
        .collect()
}

/// Combine every vendor file in the data directory.
///
/// Unreadable or malformed files are logged and skipped. With a
/// `reference` file, articles whose normalised link it already lists are
/// left out; a missing reference file only logs a warning.
#[instrument(level = "info", skip_all, fields(data_dir = %config.data_dir.display()))]
pub async fn combine(config: &Config, reference: Option<&Path>, now: NaiveDateTime) -> Result<CombineReport> {
    let known = match reference {
        Some(path) if !path.exists() => {
            warn!(path = %path.display(), "Reference file not found; combining without it");
            HashSet::new()
        }
        Some(path) => {
            let links = reference_links(path).await?;
            info!(path = %path.display(), links = links.len(), "Loaded reference file");
            links
        }
        None => HashSet::new(),
    };

    let mut combined = Vec::new();
    let mut vendors: BTreeMap<String, VendorCounts> = BTreeMap::new();
    let mut excluded = 0;

    for (path, stem, kind) in vendor_files(&config.data_dir).await? {
        let articles: Vec<Article> = match read_articles(&path).await {
            Ok(articles) => articles,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Skipping unreadable vendor file");
                continue;
            }
        };
        let source = upcase(&stem);
        let before = articles.len();
        let fresh: Vec<UnifiedArticle> = articles
            .into_iter()
            .filter(|a| !known.contains(&normalize_link(&a.link)))
            .map(|a| UnifiedArticle::from_article(a, &source, kind))
            .collect();
        excluded += before - fresh.len();

        let counts = vendors.entry(source.clone()).or_default();
        match kind {
            ArticleType::News => counts.news += fresh.len(),
            ArticleType::Blog => counts.blog += fresh.len(),
        }
        info!(file = %path.display(), %source, %kind, count = fresh.len(), "Loaded vendor file");
        combined.extend(fresh);
    }

    let combined = sort_newest_first(combined);

    let path = config
        .output_dir
        .join(format!("all_scraped_articles_{}.json", now.format("%Y%m%d_%H%M%S")));
    write_articles(&path, &combined).await?;
    let latest = config.latest_combined();
    write_articles(&latest, &combined).await?;

    for (source, counts) in &vendors {
        info!(%source, news = counts.news, blog = counts.blog, total = counts.total(), "Vendor summary");
    }
    info!(
        total = combined.len(),
        vendors = vendors.len(),
        excluded,
        path = %path.display(),
        "Combined articles"
    );

    Ok(CombineReport {
        total: combined.len(),
        vendors,
        excluded,
        path,
        latest,
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DedupeReport {
    pub total: usize,
    pub duplicates: usize,
    /// Written only when duplicates were found.
    pub path: Option<PathBuf>,
}

/// Normalised link of a record; `None` for records without one.
fn link_of(item: &Value) -> Option<String> {
    let link = normalize_link(item.get("link").and_then(Value::as_str).unwrap_or_default());
    (!link.is_empty() && link != "n/a").then_some(link)
}

fn date_of(item: &Value) -> &str {
    sort_key(item.get("date").and_then(Value::as_str).unwrap_or_default())
}

/// Report duplicate links in a JSON article file.
///
/// When duplicates exist, `<stem>_unique.json` is written beside the input
/// holding the first occurrence of each link, sorted newest first. Records
/// without a link are always kept. Other fields are carried through
/// untouched.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn dedupe_file(path: &Path) -> Result<DedupeReport> {
    let items: Vec<Value> = read_articles(path).await?;
    let total = items.len();

    let groups = items.iter().filter_map(link_of).counts();
    for (link, n) in groups.iter().filter(|(_, n)| **n > 1).sorted() {
        info!(%link, occurrences = n, "Duplicate link");
    }

    let mut seen = HashSet::new();
    let unique: Vec<Value> = items
        .into_iter()
        .filter(|item| link_of(item).is_none_or(|link| seen.insert(link)))
        .sorted_by(|a, b| date_of(b).cmp(date_of(a)))
        .collect();
    let duplicates = total - unique.len();
    if duplicates == 0 {
        info!(total, "No duplicate links");
        return Ok(DedupeReport {
            total,
            duplicates,
            path: None,
        });
    }

    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("articles");
    let out = path.with_file_name(format!("{stem}_unique.json"));
    write_articles(&out, &unique).await?;
    info!(total, duplicates, unique = unique.len(), path = %out.display(), "Wrote de-duplicated file");

    Ok(DedupeReport {
        total,
        duplicates,
        path: Some(out),
    })
}
