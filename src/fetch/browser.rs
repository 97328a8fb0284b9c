use super::{Fetcher, Readiness, RetryPolicy};
use crate::config::{BrowserConfig, FetchConfig};
use crate::error::FetchError;
use serde_json::json;
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument};

/// How long the service should wait for a readiness selector, in milliseconds.
const SELECTOR_WAIT_MS: u64 = 30_000;
/// Settle time used when no selector is given or the previous wait failed.
const SETTLE_MS: u64 = 3_000;

/// Renders pages in a headless browser through a Browserless-compatible
/// `/content` endpoint.
///
/// The first attempt waits for the readiness selectors. Later attempts
/// switch on stealth mode and wait a fixed settle time instead, then judge
/// whatever markup came back.
pub struct BrowserFetcher {
    client: reqwest::Client,
    endpoint: String,
    token: Option<String>,
    retry: RetryPolicy,
}

impl fmt::Debug for BrowserFetcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BrowserFetcher")
            .field("endpoint", &self.endpoint)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("retry", &self.retry)
            .finish()
    }
}

impl BrowserFetcher {
    pub fn new(
        endpoint: &str,
        token: Option<&str>,
        browser: &BrowserConfig,
        fetch: &FetchConfig,
    ) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(browser.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            token: token.map(String::from),
            retry: RetryPolicy::new(fetch.max_retries, fetch.base_delay()),
        })
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn content_url(&self, stealth: bool) -> String {
        let mut params = Vec::new();
        if let Some(token) = &self.token {
            params.push(format!("token={}", urlencoding::encode(token)));
        }
        if stealth {
            params.push("stealth=true".to_string());
        }
        if params.is_empty() {
            format!("{}/content", self.endpoint)
        } else {
            format!("{}/content?{}", self.endpoint, params.join("&"))
        }
    }

    fn request_body(url: &str, readiness: &Readiness, attempt: u32) -> serde_json::Value {
        let mut body = json!({
            "url": url,
            "gotoOptions": { "waitUntil": "networkidle2", "timeout": 60_000 },
            "bestAttempt": true,
        });
        if attempt == 1 && !readiness.selectors.is_empty() {
            body["waitForSelector"] = json!({
                "selector": readiness.selectors.join(", "),
                "timeout": SELECTOR_WAIT_MS,
            });
        } else {
            body["waitForTimeout"] = json!(SETTLE_MS);
        }
        body
    }

    async fn content_once(&self, url: &str, readiness: &Readiness, attempt: u32) -> Result<String, FetchError> {
        let t0 = Instant::now();
        let stealth = attempt > 1;
        let response = self
            .client
            .post(self.content_url(stealth))
            .json(&Self::request_body(url, readiness, attempt))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(FetchError::Browser {
                status: status.as_u16(),
                message,
            });
        }
        let html = response.text().await?;
        debug!(
            %url,
            attempt,
            stealth,
            bytes = html.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Rendered page received"
        );
        readiness.judge(url, html)
    }
}

impl Fetcher for BrowserFetcher {
    #[instrument(level = "info", skip_all, fields(%url))]
    async fn fetch(&self, url: &str, readiness: &Readiness) -> Result<String, FetchError> {
        info!(%url, "Rendering page in headless browser");
        self.retry
            .run(url, |attempt| self.content_once(url, readiness, attempt))
            .await
    }
}
