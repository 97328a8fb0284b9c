//! Page retrieval.
//!
//! Two backends implement [`Fetcher`]:
//!
//! - [`HttpFetcher`]: a plain `reqwest` client sending desktop browser headers
//! - [`BrowserFetcher`]: a headless browser behind a Browserless-style `/content` API
//!
//! [`FetchRouter`] picks one per URL and falls back from HTTP to the browser
//! when a site keeps refusing plain requests. Both backends share
//! [`RetryPolicy`] and judge each response with [`Readiness`] and
//! [`detect_access_denied`].

mod browser;
mod http;

pub use browser::BrowserFetcher;
pub use http::HttpFetcher;

use crate::config::Config;
use crate::error::FetchError;
use crate::extract::page_text;
use crate::links::on_domain;
use rand::{Rng, rng};
use scraper::{Html, Selector};
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

/// Something that can turn a URL into page markup.
pub trait Fetcher {
    async fn fetch(&self, url: &str, readiness: &Readiness) -> Result<String, FetchError>;
}

/// Phrases served by bot challenges, CDN error pages and dead hosts.
const DENIAL_MARKERS: &[&str] = &[
    "access denied",
    "access forbidden",
    "you don't have permission",
    "you do not have permission",
    "403 forbidden",
    "forbidden",
    "blocked",
    "errors.edgesuite.net",
    "reference #",
    "cloudflare",
    "checking your browser",
    "ddos protection",
    "captcha",
    "bot detection",
    "automated access",
    "please verify you are human",
    "err_http2_protocol_error",
    "this site can't be reached",
    "connection refused",
    "temporarily down",
];

/// Whether the visible text of a page looks like a block or error page.
pub fn detect_access_denied(html: &str) -> bool {
    if html.trim().is_empty() {
        return false;
    }
    let text = page_text(&Html::parse_document(html)).to_lowercase();
    DENIAL_MARKERS.iter().any(|m| text.contains(m))
}

/// When a fetched page counts as the real, rendered page.
#[derive(Debug, Clone)]
pub struct Readiness {
    /// CSS selectors of which at least one must match.
    pub selectors: Vec<&'static str>,
    /// Without a selector match, the markup must be at least this long.
    pub min_bytes: usize,
}

impl Readiness {
    pub fn new(selectors: &[&'static str], min_bytes: usize) -> Self {
        Self {
            selectors: selectors.to_vec(),
            min_bytes,
        }
    }

    /// Any markup at least `min_bytes` long.
    #[cfg(test)]
    pub fn min_bytes(min_bytes: usize) -> Self {
        Self::new(&[], min_bytes)
    }

    fn selector_matches(&self, html: &str) -> bool {
        if self.selectors.is_empty() {
            return false;
        }
        let doc = Html::parse_document(html);
        self.selectors.iter().any(|css| {
            Selector::parse(css)
                .map(|s| doc.select(&s).next().is_some())
                .unwrap_or(false)
        })
    }

    /// Accept the page, or classify why it is not usable yet.
    ///
    /// A selector match wins outright. Otherwise a page showing a denial
    /// marker is refused, and anything shorter than `min_bytes` is not ready.
    pub fn judge(&self, url: &str, html: String) -> Result<String, FetchError> {
        if self.selector_matches(&html) {
            return Ok(html);
        }
        if detect_access_denied(&html) {
            return Err(FetchError::AccessDenied {
                url: url.to_string(),
            });
        }
        if html.len() < self.min_bytes {
            return Err(FetchError::NotReady {
                url: url.to_string(),
                bytes: html.len(),
            });
        }
        Ok(html)
    }
}

/// Bounded retries with exponential backoff and up to 50% jitter.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn new(attempts: u32, base_delay: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            base_delay,
            max_delay: Duration::from_secs(60),
        }
    }

    /// Delay before attempt `attempt + 1`, where `attempt` starts at 1.
    pub fn delay(&self, attempt: u32) -> Duration {
        let exp = self
            .base_delay
            .saturating_mul(1u32 << (attempt.saturating_sub(1)).min(10))
            .min(self.max_delay);
        let jitter: f64 = rng().random_range(0.0..=0.5);
        exp + exp.mul_f64(jitter)
    }

    /// Run `op` until it succeeds, fails fatally, or runs out of attempts.
    ///
    /// `op` receives the 1-based attempt number.
    pub async fn run<T, F, Fut>(&self, url: &str, mut op: F) -> Result<T, FetchError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, FetchError>>,
    {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(err) if !err.is_retryable() => return Err(err),
                Err(err) if attempt >= self.attempts => {
                    return Err(FetchError::Exhausted {
                        url: url.to_string(),
                        attempts: attempt,
                        last: Box::new(err),
                    });
                }
                Err(err) => {
                    let delay = self.delay(attempt);
                    warn!(
                        %url,
                        attempt,
                        max = self.attempts,
                        ?delay,
                        error = %err,
                        "Fetch attempt failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}

/// Chooses between plain HTTP and the headless browser for each URL.
#[derive(Debug)]
pub struct FetchRouter {
    http: HttpFetcher,
    browser: Option<BrowserFetcher>,
    browser_domains: Vec<String>,
}

impl FetchRouter {
    pub fn new(http: HttpFetcher, browser: Option<BrowserFetcher>, browser_domains: Vec<String>) -> Self {
        Self {
            http,
            browser,
            browser_domains,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, FetchError> {
        let http = HttpFetcher::new(&config.fetch)?;
        let browser = match &config.browser.endpoint {
            Some(endpoint) => Some(BrowserFetcher::new(
                endpoint,
                config.browser.token.as_deref(),
                &config.browser,
                &config.fetch,
            )?),
            None => None,
        };
        Ok(Self::new(http, browser, config.browser.domains.clone()))
    }

    fn wants_browser(&self, url: &str) -> bool {
        self.browser_domains.iter().any(|d| on_domain(url, d))
    }

    /// Fetch `url`, going straight to the browser when `needs_browser` is set
    /// or the URL is on a configured browser domain.
    pub async fn fetch_with(
        &self,
        url: &str,
        readiness: &Readiness,
        needs_browser: bool,
    ) -> Result<String, FetchError> {
        let direct = needs_browser || self.wants_browser(url);
        match (&self.browser, direct) {
            (Some(browser), true) => return browser.fetch(url, readiness).await,
            (None, true) => {
                warn!(%url, "Page normally needs a browser but none is configured; trying plain HTTP");
            }
            _ => {}
        }

        match self.http.fetch(url, readiness).await {
            Ok(html) => Ok(html),
            Err(err) => match &self.browser {
                Some(browser) if falls_back(&err) => {
                    info!(%url, error = %err, "Plain HTTP failed; retrying through the browser");
                    browser.fetch(url, readiness).await
                }
                _ => Err(err),
            },
        }
    }
}

fn falls_back(err: &FetchError) -> bool {
    match err {
        FetchError::Exhausted { .. } => true,
        FetchError::Status { status, .. } => *status == 403 || *status == 401,
        other => other.is_retryable(),
    }
}

impl Fetcher for FetchRouter {
    async fn fetch(&self, url: &str, readiness: &Readiness) -> Result<String, FetchError> {
        self.fetch_with(url, readiness, false).await
    }
}
