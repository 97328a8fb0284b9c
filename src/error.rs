//! Typed errors for each stage of the pipeline.
//!
//! Every stage gets its own enum so callers can tell a transient failure
//! (worth another attempt) from a fatal one. [`Error`] wraps them all for
//! the command entry points.

use thiserror::Error;

/// Failures while retrieving a page over HTTP or through the rendering service.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("access denied or bot challenge served by {url}")]
    AccessDenied { url: String },

    #[error("page at {url} never became ready ({bytes} bytes received)")]
    NotReady { url: String, bytes: usize },

    #[error("rendering service error (status {status}): {message}")]
    Browser { status: u16, message: String },

    #[error("invalid URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("gave up on {url} after {attempts} attempts: {last}")]
    Exhausted {
        url: String,
        attempts: u32,
        last: Box<FetchError>,
    },
}

impl FetchError {
    /// Whether another attempt could plausibly succeed.
    ///
    /// Transport failures, throttling, 5xx responses and bot challenges are
    /// transient. Other 4xx responses and malformed URLs are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Http(e) => {
                e.is_timeout()
                    || e.is_connect()
                    || e.is_request()
                    || e.status().is_some_and(|s| s.is_server_error())
            }
            FetchError::Status { status, .. } | FetchError::Browser { status, .. } => {
                matches!(*status, 403 | 408 | 429) || *status >= 500
            }
            FetchError::AccessDenied { .. } | FetchError::NotReady { .. } => true,
            FetchError::InvalidUrl { .. } | FetchError::Exhausted { .. } => false,
        }
    }
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("invalid CSS selector `{0}`")]
    Selector(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("expected a JSON array of articles in {0}")]
    NotAnArray(String),
}

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("LLM API error (status {status}): {body}")]
    Api { status: u16, body: String },

    #[error("LLM returned no choices")]
    EmptyResponse,

    #[error("no API credentials configured")]
    NoCredentials,

    #[error("invalid API key header: {0}")]
    InvalidKey(String),
}

impl LlmError {
    pub fn is_retryable(&self) -> bool {
        match self {
            LlmError::Http(e) => {
                e.is_timeout()
                    || e.is_connect()
                    || e.status().is_some_and(|s| s.is_server_error())
            }
            LlmError::Api { status, .. } => *status == 429 || *status >= 500,
            LlmError::EmptyResponse => true,
            LlmError::NoCredentials | LlmError::InvalidKey(_) => false,
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("could not encode column: {0}")]
    Json(#[from] serde_json::Error),

    #[error("could not prepare database location {path}: {source}")]
    Path {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Crate-level error returned by the command entry points.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("could not read config file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("{what} timed out after {secs}s")]
    Timeout { what: String, secs: u64 },

    #[error("unknown site `{0}` (run `vendor_news list`)")]
    UnknownSite(String),
}

impl Error {
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
