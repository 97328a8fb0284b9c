//! Main ideas and tags for one article.

use super::strip_code_fences;
use crate::api::{AskAsync, Prompt, ask_with_backoff};
use crate::config::LlmConfig;
use crate::error::LlmError;
use crate::models::NOT_AVAILABLE;
use crate::utils::{truncate_chars, truncate_for_log};
use serde::Deserialize;
use tracing::{debug, warn};

/// Longest article body sent to the model, in characters.
pub const CONTENT_LIMIT: usize = 40_000;

const SYSTEM: &str = "You are an expert at analyzing news articles and extracting key information. \
Return only valid JSON with main_ideas and tags arrays.";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Summary {
    #[serde(default)]
    pub main_ideas: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

pub fn summary_prompt(title: &str, description: Option<&str>, content: &str) -> Prompt {
    let description = description.filter(|d| !d.trim().is_empty()).unwrap_or(NOT_AVAILABLE);
    let content = truncate_chars(content, CONTENT_LIMIT);
    let user = format!(
        r#"You are analyzing a news article to extract its main ideas and relevant tags.

Article Title: {title}
Article Description: {description}

Article Content:
{content}

Your task:
1. Extract 3-5 main ideas from the article. Each main idea should be a concise sentence (10-20 words) that captures a key point or theme.
2. Extract 5-10 relevant tags. Tags should be:
   - Single words or short phrases (1-3 words)
   - Relevant to the article's topics, technologies, industries, or themes
   - Use lowercase and separate multi-word tags with hyphens (e.g., "artificial-intelligence", "cloud-computing")
   - Include technology names, company names, industry terms, and topic keywords

Return a JSON object with this structure:
{{
  "main_ideas": ["First main idea", "Second main idea", "Third main idea"],
  "tags": ["tag1", "tag2", "tag3"]
}}

Return ONLY valid JSON. No explanations, no markdown, just the JSON object."#
    );
    Prompt {
        system: SYSTEM.to_string(),
        user,
        temperature: 0.3,
        max_tokens: 2000,
    }
}

/// Parse a model reply; anything malformed becomes an empty summary.
pub fn parse_summary(reply: &str) -> Summary {
    let text = strip_code_fences(reply);
    match serde_json::from_str::<Summary>(text) {
        Ok(mut summary) => {
            summary.main_ideas.retain(|s| !s.trim().is_empty());
            summary.tags.retain(|s| !s.trim().is_empty());
            summary
        }
        Err(e) => {
            warn!(
                error = %e,
                response_preview = %truncate_for_log(text, 200),
                "Could not parse summary reply"
            );
            Summary::default()
        }
    }
}

/// Ask the model for main ideas and tags of one article body.
pub async fn summarize<A>(
    client: A,
    config: &LlmConfig,
    title: &str,
    description: Option<&str>,
    content: &str,
) -> Result<Summary, LlmError>
where
    A: AskAsync<Response = String>,
{
    let reply = ask_with_backoff(client, &summary_prompt(title, description, content), config).await?;
    let summary = parse_summary(&reply);
    debug!(
        main_ideas = summary.main_ideas.len(),
        tags = summary.tags.len(),
        "Parsed summary"
    );
    Ok(summary)
}
