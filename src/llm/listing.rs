//! LLM extraction of article records from a listing page.

use super::strip_code_fences;
use crate::api::{AskAsync, Prompt, ask_with_backoff};
use crate::config::LlmConfig;
use crate::error::LlmError;
use crate::links::absolutize;
use crate::models::{Article, NOT_AVAILABLE};
use crate::utils::{looks_truncated, truncate_bytes, truncate_for_log};
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use serde_json::Value;
use tracing::{info, instrument, warn};
use url::Url;

/// Upper bound on the markup sent to the model.
pub const EXCERPT_LIMIT: usize = 150_000;

const SYSTEM: &str = "You are a web scraping expert that extracts ALL articles from HTML. \
You MUST find every single article on the page. Return only valid JSON arrays with all \
articles found. Be extremely thorough - typical listing pages have 10-50+ articles.";

/// What the model needs to know about one listing page.
#[derive(Debug, Clone)]
pub struct ListingRequest<'a> {
    /// Human label such as "HPE newsroom".
    pub label: &'a str,
    pub page_url: &'a Url,
    /// Site-specific description of where cards, titles, dates and links live.
    pub hints: &'a str,
    pub excerpt: &'a str,
}

impl ListingRequest<'_> {
    fn prompt(&self) -> Prompt {
        let user = format!(
            "You are analyzing HTML from the {label} page ({url}). Your task is to extract ALL articles from the page.\n\
\n\
CRITICAL INSTRUCTIONS:\n\
1. Extract ALL articles you can find on the page - be extremely thorough\n\
2. Each article should become a separate entry\n\
3. Do NOT extract filter links, navigation links, or category links\n\
4. If articles are in a list or grid, extract EVERY single one\n\
\n\
What to look for:\n\
{hints}\n\
\n\
For EACH article you find, extract:\n\
- title: The headline (required - use link text if no explicit title)\n\
- date: Publication date (format as YYYY-MM-DD if possible, otherwise keep the original text, use \"N/A\" if not found)\n\
- link: Full URL (if relative, resolve against {url}; use \"N/A\" only if absolutely no link exists)\n\
\n\
Return a JSON array of objects with keys \"title\", \"date\" and \"link\". Return ONLY valid JSON.\n\
\n\
HTML:\n\
{excerpt}",
            label = self.label,
            url = self.page_url,
            hints = self.hints,
            excerpt = self.excerpt,
        );
        Prompt {
            system: SYSTEM.to_string(),
            user,
            temperature: 0.1,
            max_tokens: 8000,
        }
    }
}

/// Trim a listing page down to what the model needs.
///
/// Script, style and noscript elements are dropped. The outer markup of the
/// first matching `containers` selector is preferred, then `main`, then the
/// parents of every link, then the whole body. The result is capped at
/// [`EXCERPT_LIMIT`] bytes.
pub fn markup_excerpt(html: &str, containers: &[&str]) -> String {
    let mut document = Html::parse_document(html);
    let hidden: Vec<_> = ["script", "style", "noscript"]
        .iter()
        .filter_map(|css| Selector::parse(css).ok())
        .flat_map(|sel| document.select(&sel).map(|el| el.id()).collect::<Vec<_>>())
        .collect();
    for id in hidden {
        if let Some(mut node) = document.tree.get_mut(id) {
            node.detach();
        }
    }

    let pick = |css: &str| -> Option<String> {
        let sel = Selector::parse(css).ok()?;
        let parts: Vec<String> = document.select(&sel).map(|el| el.html()).collect();
        (!parts.is_empty()).then(|| parts.join("\n"))
    };

    let excerpt = containers
        .iter()
        .find_map(|css| pick(css))
        .or_else(|| pick("main"))
        .or_else(|| link_contexts(&document))
        .or_else(|| pick("body"))
        .unwrap_or_else(|| document.root_element().html());

    if excerpt.len() > EXCERPT_LIMIT {
        format!("{}...", truncate_bytes(&excerpt, EXCERPT_LIMIT))
    } else {
        excerpt
    }
}

fn link_contexts(document: &Html) -> Option<String> {
    let links = Selector::parse("a[href]").ok()?;
    let mut seen = HashSet::new();
    let parts: Vec<String> = document
        .select(&links)
        .filter_map(|a| a.parent().and_then(ElementRef::wrap))
        .filter(|parent| seen.insert(parent.id()))
        .map(|parent| parent.html())
        .collect();
    (!parts.is_empty()).then(|| parts.join("\n"))
}

fn field(obj: &serde_json::Map<String, Value>, key: &str) -> String {
    obj.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(NOT_AVAILABLE)
        .to_string()
}

/// Parse a model reply into articles, resolving relative links.
///
/// Malformed JSON yields an empty list. Objects wrapping the array under an
/// `articles` key are accepted.
pub fn parse_listing_reply(reply: &str, base: &Url) -> Vec<Article> {
    let text = strip_code_fences(reply);
    let value: Value = match serde_json::from_str(text) {
        Ok(v) => v,
        Err(e) => {
            warn!(
                error = %e,
                truncated = looks_truncated(&e),
                response_preview = %truncate_for_log(text, 300),
                "Model returned non-conforming JSON; ignoring LLM results"
            );
            return Vec::new();
        }
    };
    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut obj) => match obj.remove("articles") {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    };

    items
        .iter()
        .filter_map(Value::as_object)
        .map(|obj| {
            let raw_link = field(obj, "link");
            let link = absolutize(base, &raw_link).unwrap_or(raw_link);
            Article::new(field(obj, "title"), field(obj, "date"), link)
        })
        .collect()
}

/// Ask the model for the articles on one listing page.
#[instrument(level = "info", skip_all, fields(label = %request.label))]
pub async fn extract_listing<A>(
    client: A,
    config: &LlmConfig,
    request: &ListingRequest<'_>,
) -> Result<Vec<Article>, LlmError>
where
    A: AskAsync<Response = String>,
{
    let reply = ask_with_backoff(client, &request.prompt(), config).await?;
    let articles = parse_listing_reply(&reply, request.page_url);
    info!(count = articles.len(), "LLM extracted listing articles");
    Ok(articles)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://www.hpe.com/us/en/newsroom/press-hub.html").unwrap()
    }

    #[test]
    fn reply_with_fences_and_relative_links() {
        let reply = r#"```json
[
  {"title": "HPE ships X", "date": "2025-11-10", "link": "/us/en/newsroom/press-release/2025/11/x.html"},
  {"title": "No date", "link": "https://www.hpe.com/us/en/newsroom/blog-post/y.html"},
  "not an object"
]
```"#;
        let articles = parse_listing_reply(reply, &base());
        assert_eq!(articles.len(), 2);
        assert_eq!(
            articles[0].link,
            "https://www.hpe.com/us/en/newsroom/press-release/2025/11/x.html"
        );
        assert_eq!(articles[1].date, "N/A");
    }

    #[test]
    fn malformed_reply_yields_nothing() {
        assert!(parse_listing_reply("[{\"title\": \"cut off", &base()).is_empty());
        assert!(parse_listing_reply("Sorry, I can't help", &base()).is_empty());
    }

    #[test]
    fn wrapped_array_is_accepted() {
        let reply = r#"{"articles": [{"title": "A", "date": "N/A", "link": "N/A"}]}"#;
        let articles = parse_listing_reply(reply, &base());
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].link, "N/A");
    }

    #[test]
    fn excerpt_prefers_container_and_drops_scripts() {
        let html = r#"<html><head><script>var big = 1;</script></head><body>
            <nav>menu</nav>
            <div class="items-wrapper"><div class="item"><a href="/a">A</a></div><script>x()</script></div>
            </body></html>"#;
        let excerpt = markup_excerpt(html, &["div.items-wrapper"]);
        assert!(excerpt.starts_with("<div class=\"items-wrapper\">"));
        assert!(!excerpt.contains("x()"));
        assert!(!excerpt.contains("menu"));

        let fallback = markup_excerpt(html, &["div.missing"]);
        assert_eq!(fallback, r#"<div class="item"><a href="/a">A</a></div>"#);

        let linkless = markup_excerpt("<html><head><script>var big;</script></head><body><p>menu</p></body></html>", &[]);
        assert!(linkless.contains("menu"));
        assert!(!linkless.contains("var big"));
    }

    #[test]
    fn excerpt_is_capped() {
        let html = format!("<html><body><main>{}</main></body></html>", "é".repeat(EXCERPT_LIMIT));
        let excerpt = markup_excerpt(&html, &[]);
        assert!(excerpt.len() <= EXCERPT_LIMIT + 3);
        assert!(excerpt.ends_with("..."));
    }

    #[test]
    fn prompt_carries_settings_and_hints() {
        let url = base();
        let request = ListingRequest {
            label: "HPE newsroom",
            page_url: &url,
            hints: "- Cards are div.item",
            excerpt: "<div class=\"item\"></div>",
        };
        let prompt = request.prompt();
        assert_eq!(prompt.max_tokens, 8000);
        assert!((prompt.temperature - 0.1).abs() < f32::EPSILON);
        assert!(prompt.user.contains("HPE newsroom page (https://www.hpe.com/"));
        assert!(prompt.user.contains("- Cards are div.item"));
        assert!(prompt.user.ends_with("<div class=\"item\"></div>"));
    }
}
