//! LLM API interaction with exponential backoff retry logic.
//!
//! This module talks to an OpenAI-compatible `/chat/completions` endpoint.
//! Transient failures (throttling, 5xx, dropped connections) are retried
//! with exponential backoff and jitter; anything else is returned at once.
//!
//! # Architecture
//!
//! - [`AskAsync`]: core trait for one prompt/response exchange
//! - [`ChatClient`]: a chat-completions client bound to one API key
//! - [`RetryAsk`]: decorator adding retries to any [`AskAsync`]
//!
//! # Retry Strategy
//!
//! ```text
//! delay = min(base_delay * 2^(attempt-1), max_delay) + random_jitter(0..250ms)
//! ```

use crate::config::LlmConfig;
use crate::error::LlmError;
use rand::{Rng, rng};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration as StdDuration, Instant};
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};

/// One system + user exchange with fixed sampling settings.
#[derive(Debug, Clone)]
pub struct Prompt {
    pub system: String,
    pub user: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Trait for async LLM interaction.
pub trait AskAsync {
    /// The type of response returned by the LLM.
    type Response;

    /// Send a prompt to the LLM and receive a response.
    async fn ask(&self, prompt: &Prompt) -> Result<Self::Response, LlmError>;
}

impl<T: AskAsync> AskAsync for &T {
    type Response = T::Response;

    async fn ask(&self, prompt: &Prompt) -> Result<Self::Response, LlmError> {
        (**self).ask(prompt).await
    }
}

/// Wrapper that adds exponential backoff retry logic to any [`AskAsync`] implementation.
///
/// Only errors for which [`LlmError::is_retryable`] holds are retried.
pub struct RetryAsk<T> {
    /// The underlying LLM client to wrap.
    inner: T,
    /// Maximum number of retry attempts before giving up.
    max_retries: usize,
    /// Initial delay between retries (doubles with each attempt).
    base_delay: StdDuration,
    /// Maximum delay cap to prevent excessive waiting.
    max_delay: StdDuration,
}

impl<T> RetryAsk<T>
where
    T: AskAsync,
{
    pub fn new(inner: T, max_retries: usize, base_delay: StdDuration) -> Self {
        Self {
            inner,
            max_retries,
            base_delay,
            max_delay: StdDuration::from_secs(30),
        }
    }
}

impl<T> fmt::Debug for RetryAsk<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryAsk")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .finish()
    }
}

impl<T> AskAsync for RetryAsk<T>
where
    T: AskAsync,
{
    type Response = T::Response;

    #[instrument(level = "debug", skip_all)]
    async fn ask(&self, prompt: &Prompt) -> Result<Self::Response, LlmError> {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            let attempt_t0 = Instant::now();
            match self.inner.ask(prompt).await {
                Ok(resp) => {
                    return Ok(resp);
                }
                Err(e) => {
                    attempt += 1;
                    let attempt_dt = attempt_t0.elapsed();
                    let total_dt = total_t0.elapsed();

                    if !e.is_retryable() || attempt > self.max_retries {
                        error!(
                            attempt,
                            max = self.max_retries,
                            elapsed_ms_attempt = attempt_dt.as_millis() as u64,
                            elapsed_ms_total = total_dt.as_millis() as u64,
                            error = %e,
                            "ask() giving up"
                        );
                        return Err(e);
                    }

                    // backoff calc
                    let mut delay = self.base_delay.saturating_mul(1 << (attempt - 1).min(16));
                    if delay > self.max_delay {
                        delay = self.max_delay;
                    }
                    let jitter_ms: u64 = if self.base_delay.is_zero() {
                        0
                    } else {
                        rng().random_range(0..=250)
                    };
                    let delay = delay + StdDuration::from_millis(jitter_ms);

                    warn!(
                        attempt,
                        max = self.max_retries,
                        elapsed_ms_attempt = attempt_dt.as_millis() as u64,
                        elapsed_ms_total = total_dt.as_millis() as u64,
                        ?delay,
                        error = %e,
                        "ask() attempt failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// Chat-completions client bound to one API key.
///
/// Cloning is cheap; clones share the connection pool.
#[derive(Clone)]
pub struct ChatClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl fmt::Debug for ChatClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatClient")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl ChatClient {
    pub fn new(api_key: &str, config: &LlmConfig) -> Result<Self, LlmError> {
        let http = reqwest::Client::builder()
            .timeout(StdDuration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self {
            http,
            api_key: api_key.to_string(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn headers(&self) -> Result<HeaderMap, LlmError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.api_key))
                .map_err(|e| LlmError::InvalidKey(e.to_string()))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }
}

impl AskAsync for ChatClient {
    type Response = String;

    #[instrument(level = "debug", skip_all, fields(model = %self.model()))]
    async fn ask(&self, prompt: &Prompt) -> Result<Self::Response, LlmError> {
        let t0 = Instant::now();
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &prompt.system,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt.user,
                },
            ],
            temperature: prompt.temperature,
            max_tokens: prompt.max_tokens,
        };

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .headers(self.headers()?)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(
                status = status.as_u16(),
                elapsed_ms = t0.elapsed().as_millis() as u64,
                "API call failed"
            );
            return Err(LlmError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response.json().await?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(LlmError::EmptyResponse)?;
        debug!(
            bytes = content.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "API call succeeded"
        );
        Ok(content)
    }
}

/// Ask with the configured retry budget.
#[instrument(level = "info", skip_all)]
pub async fn ask_with_backoff<A>(client: A, prompt: &Prompt, config: &LlmConfig) -> Result<A::Response, LlmError>
where
    A: AskAsync,
{
    let t0 = Instant::now();
    let api = RetryAsk::new(
        client,
        config.max_retries,
        StdDuration::from_millis(config.base_delay_ms),
    );
    let res = api.ask(prompt).await;
    let dt = t0.elapsed();

    match &res {
        Ok(_) => info!(
            elapsed_ms_total = dt.as_millis() as u64,
            "ask_with_backoff succeeded"
        ),
        Err(e) => {
            error!(elapsed_ms_total = dt.as_millis() as u64, error = %e, "ask_with_backoff failed")
        }
    }
    res
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::Cell;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Fails once per scripted status (0 meaning an empty reply), then answers "ok".
    struct Scripted {
        failures: Vec<u16>,
        calls: Cell<usize>,
    }

    impl AskAsync for Scripted {
        type Response = String;

        async fn ask(&self, _prompt: &Prompt) -> Result<String, LlmError> {
            let n = self.calls.get();
            self.calls.set(n + 1);
            match self.failures.get(n) {
                Some(0) => Err(LlmError::EmptyResponse),
                Some(&status) => Err(LlmError::Api {
                    status,
                    body: String::new(),
                }),
                None => Ok("ok".to_string()),
            }
        }
    }

    fn prompt() -> Prompt {
        Prompt {
            system: "sys".into(),
            user: "hello".into(),
            temperature: 0.3,
            max_tokens: 100,
        }
    }

    fn config(base_url: &str) -> LlmConfig {
        LlmConfig {
            base_url: base_url.to_string(),
            max_retries: 2,
            base_delay_ms: 0,
            ..LlmConfig::default()
        }
    }

    #[tokio::test]
    async fn retry_recovers_from_transient_errors() {
        let inner = Scripted {
            failures: vec![503, 0],
            calls: Cell::new(0),
        };
        let api = RetryAsk::new(&inner, 2, StdDuration::ZERO);
        assert_eq!(api.ask(&prompt()).await.unwrap(), "ok");
        assert_eq!(inner.calls.get(), 3);
    }

    #[tokio::test]
    async fn retry_stops_on_fatal_error() {
        let inner = Scripted {
            failures: vec![401],
            calls: Cell::new(0),
        };
        let api = RetryAsk::new(&inner, 5, StdDuration::ZERO);
        assert!(matches!(api.ask(&prompt()).await, Err(LlmError::Api { status: 401, .. })));
        assert_eq!(inner.calls.get(), 1);
    }

    #[tokio::test]
    async fn retry_gives_up_after_budget() {
        let inner = Scripted {
            failures: vec![0; 10],
            calls: Cell::new(0),
        };
        let api = RetryAsk::new(&inner, 2, StdDuration::ZERO);
        assert!(api.ask(&prompt()).await.is_err());
        assert_eq!(inner.calls.get(), 3);
    }

    #[tokio::test]
    async fn chat_client_sends_messages_and_reads_first_choice() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({
                "model": "gpt-4o-mini",
                "max_tokens": 100,
                "messages": [
                    {"role": "system", "content": "sys"},
                    {"role": "user", "content": "hello"}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": "[]"}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = ChatClient::new("sk-test", &config(&server.uri())).unwrap();
        assert_eq!(client.ask(&prompt()).await.unwrap(), "[]");
    }

    #[tokio::test]
    async fn ask_with_backoff_retries_server_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"content": "done"}}]
            })))
            .mount(&server)
            .await;

        let cfg = config(&server.uri());
        let client = ChatClient::new("sk-test", &cfg).unwrap();
        assert_eq!(ask_with_backoff(&client, &prompt(), &cfg).await.unwrap(), "done");
    }

    #[test]
    fn debug_redacts_key() {
        let client = ChatClient::new("sk-very-secret", &LlmConfig::default()).unwrap();
        assert!(!format!("{client:?}").contains("sk-very-secret"));
    }
}
