//! Quality check of a stored article against its own fields.

use super::strip_code_fences;
use crate::api::{AskAsync, Prompt, ask_with_backoff};
use crate::config::LlmConfig;
use crate::models::StoredArticle;
use crate::utils::{truncate_chars, truncate_for_log};
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

/// Characters of the article body shown to the model.
pub const PREVIEW_LIMIT: usize = 5_000;

const SYSTEM: &str = "You are an expert at validating scraped article data. Check ONLY for 8 specific issues: \
1) Title doesn't match content, 2) No title, 3) No date (future dates are OK), 4) Blank description \
(acceptable, don't flag), 5) No main ideas, 6) No tags, 7) No original text, 8) Error messages in original text. \
Do NOT check for any other issues. Return only valid JSON with status (0 or 1) and comment fields.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub valid: bool,
    pub comment: String,
}

impl Verdict {
    fn invalid(comment: String) -> Self {
        Verdict { valid: false, comment }
    }
}

#[derive(Deserialize)]
struct Reply {
    #[serde(default)]
    status: Option<Value>,
    #[serde(default)]
    comment: Option<String>,
}

fn listed(items: &[String]) -> String {
    if items.is_empty() {
        "None (empty array)".to_string()
    } else {
        serde_json::to_string(items).unwrap_or_default()
    }
}

pub fn validation_prompt(article: &StoredArticle) -> Prompt {
    let text = article.original_text.as_deref().unwrap_or_default();
    let preview = truncate_chars(text, PREVIEW_LIMIT);
    let preview = if preview.is_empty() { "None (empty)" } else { preview };
    let user = format!(
        r#"You are validating scraped article data. Check if all fields were scraped correctly and completely.

Article Data:
- Title: {title}
- Date: {date}
- Link: {link}
- Description: {description}
- Source: {source}
- Main Ideas: {main_ideas}
- Tags: {tags}
- Original Text (first {PREVIEW_LIMIT} chars): {preview}
- Original Text Full Length: {length} characters

IMPORTANT: Check ONLY for these 8 specific issues. Do NOT check for any other issues (like date format, URL validity, etc.).

Mark status=0 if ANY of issues 1, 2, 3, 5, 6, 7 or 8 is found:

1. Title doesn't match the article content, or is generic (like "Latest news", "News", "Article").
2. No title at all: the title is empty or only whitespace.
3. No date: the date is empty. Future dates are ACCEPTABLE and must NOT be flagged.
4. Blank description. This is ACCEPTABLE and must NOT cause status=0; mention it only if other issues are found.
5. No main ideas: the main ideas array is empty.
6. No tags: the tags array is empty.
7. No original text: the original text is empty or shorter than 100 characters.
8. The original text is an error page or unrelated content ("404 Not Found", "Access Denied", "Page not found").

Return a JSON object with this structure:
{{
  "status": 1 or 0,
  "comment": "Every issue found (1-8), or an empty string if everything is good."
}}

Return ONLY valid JSON. No explanations, no markdown, just the JSON object."#,
        title = article.title,
        date = article.date.as_deref().unwrap_or_default(),
        link = article.link,
        description = article.description.as_deref().unwrap_or_default(),
        source = article.source.as_deref().unwrap_or_default(),
        main_ideas = listed(&article.main_ideas),
        tags = listed(&article.tags),
        length = text.chars().count(),
    );
    Prompt {
        system: SYSTEM.to_string(),
        user,
        temperature: 0.3,
        max_tokens: 500,
    }
}

/// Read the model's verdict. Only a status of exactly 1 counts as valid;
/// a missing status is taken as 1.
pub fn parse_verdict(reply: &str) -> Verdict {
    let text = strip_code_fences(reply);
    match serde_json::from_str::<Reply>(text) {
        Ok(reply) => Verdict {
            valid: reply.status.is_none_or(|s| s.as_i64() == Some(1)),
            comment: reply.comment.unwrap_or_default(),
        },
        Err(e) => {
            warn!(
                error = %e,
                response_preview = %truncate_for_log(text, 200),
                "Could not parse validation reply"
            );
            Verdict::invalid(format!("Error parsing validation response: {e}"))
        }
    }
}

/// Ask the model whether `article` was scraped and enhanced correctly.
///
/// Never fails: API errors become an invalid verdict carrying the error.
pub async fn validate_article<A>(client: A, config: &LlmConfig, article: &StoredArticle) -> Verdict
where
    A: AskAsync<Response = String>,
{
    match ask_with_backoff(client, &validation_prompt(article), config).await {
        Ok(reply) => parse_verdict(&reply),
        Err(e) => {
            warn!(id = article.id, error = %e, "Validation request failed");
            Verdict::invalid(format!("Error during validation: {e}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored(id: i64, text: &str) -> StoredArticle {
        StoredArticle {
            id,
            title: "Ericsson expands 5G core".to_string(),
            date: Some("2025-11-03".to_string()),
            link: format!("https://ericsson.com/news/{id}"),
            description: None,
            source: Some("Ericsson".to_string()),
            main_ideas: vec!["Ericsson ships a new core.".to_string()],
            tags: Vec::new(),
            original_text: Some(text.to_string()),
            created_at: "2025-11-03T00:00:00Z".to_string(),
            updated_at: "2025-11-03T00:00:00Z".to_string(),
            validation_status: None,
            validation_comment: None,
            relevance: None,
        }
    }

    #[test]
    fn only_status_one_is_valid() {
        assert_eq!(
            parse_verdict("```json\n{\"status\": 1, \"comment\": \"\"}\n```"),
            Verdict { valid: true, comment: String::new() }
        );
        let verdict = parse_verdict(r#"{"status": 0, "comment": "6. No tags"}"#);
        assert!(!verdict.valid);
        assert_eq!(verdict.comment, "6. No tags");
        assert!(!parse_verdict(r#"{"status": "1"}"#).valid);
        assert!(!parse_verdict(r#"{"status": 2}"#).valid);
        assert!(parse_verdict(r#"{"comment": "fine"}"#).valid);
    }

    #[test]
    fn unreadable_reply_is_invalid() {
        let verdict = parse_verdict("Looks good to me!");
        assert!(!verdict.valid);
        assert!(verdict.comment.starts_with("Error parsing validation response:"));
    }

    #[test]
    fn prompt_previews_the_body_and_marks_empty_lists() {
        let body = "é".repeat(PREVIEW_LIMIT + 10);
        let prompt = validation_prompt(&stored(7, &body));
        assert!(prompt.user.contains(&"é".repeat(PREVIEW_LIMIT)));
        assert!(!prompt.user.contains(&"é".repeat(PREVIEW_LIMIT + 1)));
        assert!(prompt.user.contains(&format!("Full Length: {} characters", PREVIEW_LIMIT + 10)));
        assert!(prompt.user.contains("- Tags: None (empty array)"));
        assert!(prompt.user.contains(r#"- Main Ideas: ["Ericsson ships a new core."]"#));
        assert_eq!(prompt.max_tokens, 500);

        let empty = validation_prompt(&stored(8, ""));
        assert!(empty.user.contains("(first 5000 chars): None (empty)"));
    }
}
