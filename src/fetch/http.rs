use super::{Fetcher, Readiness, RetryPolicy};
use crate::config::FetchConfig;
use crate::error::FetchError;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, HeaderMap, HeaderValue, REFERER};
use std::fmt;
use std::time::Instant;
use tracing::{debug, instrument};

pub(crate) const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8",
        ),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("max-age=0"));
    headers.insert("upgrade-insecure-requests", HeaderValue::from_static("1"));
    headers.insert("sec-fetch-dest", HeaderValue::from_static("document"));
    headers.insert("sec-fetch-mode", HeaderValue::from_static("navigate"));
    headers.insert("sec-fetch-site", HeaderValue::from_static("none"));
    headers
}

/// Plain HTTP fetcher that presents itself as a desktop browser.
pub struct HttpFetcher {
    client: reqwest::Client,
    retry: RetryPolicy,
}

impl fmt::Debug for HttpFetcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpFetcher").field("retry", &self.retry).finish()
    }
}

impl HttpFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .default_headers(browser_headers())
            .timeout(config.timeout())
            .gzip(true)
            .brotli(true)
            .build()?;
        Ok(Self {
            client,
            retry: RetryPolicy::new(config.max_retries, config.base_delay()),
        })
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    async fn fetch_once(&self, url: &str, readiness: &Readiness, attempt: u32) -> Result<String, FetchError> {
        let t0 = Instant::now();
        let mut request = self.client.get(url);
        if attempt > 1 {
            request = request.header(REFERER, "https://www.google.com/");
        }
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        let body = response.text().await?;
        debug!(
            %url,
            attempt,
            bytes = body.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "HTTP response received"
        );
        readiness.judge(url, body)
    }
}

impl Fetcher for HttpFetcher {
    #[instrument(level = "debug", skip_all, fields(%url))]
    async fn fetch(&self, url: &str, readiness: &Readiness) -> Result<String, FetchError> {
        url::Url::parse(url).map_err(|e| FetchError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        self.retry
            .run(url, |attempt| self.fetch_once(url, readiness, attempt))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{header, header_regex, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher(attempts: u32) -> HttpFetcher {
        HttpFetcher::new(&FetchConfig::default())
            .unwrap()
            .with_retry(RetryPolicy::new(attempts, Duration::ZERO))
    }

    fn article_page() -> String {
        format!("<html><body><article>{}</article></body></html>", "text ".repeat(50))
    }

    #[tokio::test]
    async fn advertises_compressed_encodings() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/story"))
            .and(header_regex("accept-encoding", "gzip"))
            .and(header_regex("accept-encoding", "br"))
            .respond_with(ResponseTemplate::new(200).set_body_string(article_page()))
            .expect(1)
            .mount(&server)
            .await;

        let html = fetcher(1)
            .fetch(&format!("{}/story", server.uri()), &Readiness::new(&["article"], 0))
            .await
            .unwrap();
        assert!(html.contains("<article>"));
    }

    #[tokio::test]
    async fn returns_ready_page_and_sends_browser_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/story"))
            .and(header("accept-language", "en-US,en;q=0.9"))
            .respond_with(ResponseTemplate::new(200).set_body_string(article_page()))
            .expect(1)
            .mount(&server)
            .await;

        let html = fetcher(3)
            .fetch(&format!("{}/story", server.uri()), &Readiness::new(&["article"], 1000))
            .await
            .unwrap();
        assert!(html.contains("<article>"));
    }

    #[tokio::test]
    async fn retries_server_errors_then_succeeds() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(200).set_body_string(article_page()))
            .mount(&server)
            .await;

        let result = fetcher(3)
            .fetch(&format!("{}/flaky", server.uri()), &Readiness::new(&["article"], 1000))
            .await;
        assert!(result.is_ok(), "expected Ok, got: {result:?}");
    }

    #[tokio::test]
    async fn challenge_pages_exhaust_retries() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/blocked"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("<html><body>Checking your browser before accessing</body></html>"),
            )
            .expect(2)
            .mount(&server)
            .await;

        let result = fetcher(2)
            .fetch(&format!("{}/blocked", server.uri()), &Readiness::new(&["article"], 1000))
            .await;
        match result {
            Err(FetchError::Exhausted { attempts, last, .. }) => {
                assert_eq!(attempts, 2);
                assert!(matches!(*last, FetchError::AccessDenied { .. }));
            }
            other => panic!("expected Exhausted, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn not_found_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let result = fetcher(3)
            .fetch(&format!("{}/missing", server.uri()), &Readiness::min_bytes(0))
            .await;
        assert!(matches!(result, Err(FetchError::Status { status: 404, .. })));
    }

    #[tokio::test]
    async fn invalid_urls_fail_fast() {
        let result = fetcher(3).fetch("not a url", &Readiness::min_bytes(0)).await;
        assert!(matches!(result, Err(FetchError::InvalidUrl { .. })));
    }
}
