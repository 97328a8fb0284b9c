//! Data models for scraped, combined and enhanced articles.
//!
//! - [`Article`]: one record as produced by a site scraper
//! - [`UnifiedArticle`]: an article tagged with its vendor and listing type
//! - [`EnhancedArticle`]: a unified article plus fetched text and LLM output
//! - [`StoredArticle`]: a row of the `articles` table

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Placeholder used for fields a listing did not expose.
pub const NOT_AVAILABLE: &str = "N/A";

fn not_available() -> String {
    NOT_AVAILABLE.to_string()
}

/// Accepts `null` as well as a missing key, both meaning "not available".
fn string_or_na<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(not_available))
}

/// An article as scraped from a vendor listing page.
///
/// `date` keeps whatever format the listing used when it could not be
/// normalised to `YYYY-MM-DD`; `"N/A"` marks a listing without dates.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Article {
    #[serde(default = "not_available", deserialize_with = "string_or_na")]
    pub title: String,
    #[serde(default = "not_available", deserialize_with = "string_or_na")]
    pub date: String,
    #[serde(default = "not_available", deserialize_with = "string_or_na")]
    pub link: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Article {
    pub fn new(title: impl Into<String>, date: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            date: date.into(),
            link: link.into(),
            tags: Vec::new(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description.filter(|d| !d.trim().is_empty());
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn has_link(&self) -> bool {
        !self.link.is_empty() && self.link != NOT_AVAILABLE
    }
}

/// Whether a listing publishes press releases or blog-style content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArticleType {
    News,
    Blog,
}

impl ArticleType {
    /// Suffix of the per-vendor output file for this listing type.
    pub fn file_suffix(self) -> &'static str {
        match self {
            ArticleType::News => "_news.json",
            ArticleType::Blog => "_blog_articles.json",
        }
    }

    /// Classify a per-vendor file name, returning the vendor stem and type.
    pub fn from_file_name(name: &str) -> Option<(&str, ArticleType)> {
        // Check the longer suffix first: "_blog_articles.json" never ends in "_news.json".
        [ArticleType::Blog, ArticleType::News]
            .into_iter()
            .find_map(|kind| {
                name.strip_suffix(kind.file_suffix())
                    .filter(|stem| !stem.is_empty())
                    .map(|stem| (stem, kind))
            })
    }
}

impl fmt::Display for ArticleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArticleType::News => f.write_str("news"),
            ArticleType::Blog => f.write_str("blog"),
        }
    }
}

/// An article tagged with the vendor and listing type it came from.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct UnifiedArticle {
    #[serde(default = "not_available", deserialize_with = "string_or_na")]
    pub title: String,
    #[serde(default = "not_available", deserialize_with = "string_or_na")]
    pub date: String,
    #[serde(default)]
    pub link: String,
    pub source: String,
    #[serde(rename = "type")]
    pub kind: ArticleType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl UnifiedArticle {
    pub fn from_article(article: Article, source: &str, kind: ArticleType) -> Self {
        Self {
            title: article.title,
            date: article.date,
            link: article.link,
            source: source.to_string(),
            kind,
            description: article.description,
        }
    }
}

/// A unified article after its page was fetched and summarised.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct EnhancedArticle {
    #[serde(flatten)]
    pub article: UnifiedArticle,
    #[serde(default)]
    pub main_ideas: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub original_text: String,
}

impl EnhancedArticle {
    /// An article that could not be fetched or summarised.
    pub fn bare(article: UnifiedArticle) -> Self {
        Self {
            article,
            main_ideas: Vec::new(),
            tags: Vec::new(),
            original_text: String::new(),
        }
    }
}

/// A row of the `articles` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredArticle {
    pub id: i64,
    pub title: String,
    pub date: Option<String>,
    pub link: String,
    pub description: Option<String>,
    pub source: Option<String>,
    pub main_ideas: Vec<String>,
    pub tags: Vec<String>,
    pub original_text: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    /// 1 when the validator found nothing wrong, 0 otherwise, `None` before validation.
    pub validation_status: Option<i64>,
    pub validation_comment: Option<String>,
    /// Set by human reviewers only.
    pub relevance: Option<i64>,
}

impl StoredArticle {
    pub fn has_text(&self) -> bool {
        self.original_text.as_deref().is_some_and(|t| !t.trim().is_empty())
    }

    /// Text and LLM output are both present, so nothing needs redoing.
    pub fn is_complete(&self) -> bool {
        self.has_text() && !self.main_ideas.is_empty()
    }
}
