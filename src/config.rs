//! Runtime configuration.
//!
//! A single [`Config`] is assembled in `main` from built-in defaults, an
//! optional YAML file, the environment (after `.env` is loaded) and CLI
//! flags, in that order of precedence. Components receive it by reference.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, instrument};

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding per-vendor JSON files and the latest combined file.
    pub data_dir: PathBuf,
    /// Directory for raw and excerpted markup dumps written in debug mode.
    pub debug_dir: PathBuf,
    /// Directory for timestamped combined files.
    pub output_dir: PathBuf,
    /// SQLite database holding enhanced articles.
    pub database: PathBuf,
    pub llm: LlmConfig,
    pub browser: BrowserConfig,
    pub fetch: FetchConfig,
    pub pipeline: PipelineConfig,
    #[serde(skip)]
    pub credentials: Credentials,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            debug_dir: PathBuf::from("debug"),
            output_dir: PathBuf::from("."),
            database: PathBuf::from("articles_enhanced.db"),
            llm: LlmConfig::default(),
            browser: BrowserConfig::default(),
            fetch: FetchConfig::default(),
            pipeline: PipelineConfig::default(),
            credentials: Credentials::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    pub request_timeout_secs: u64,
    /// Extra attempts for transient API failures.
    pub max_retries: usize,
    pub base_delay_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            request_timeout_secs: 120,
            max_retries: 3,
            base_delay_ms: 1000,
        }
    }
}

/// Settings for the headless rendering service.
#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Base URL of a Browserless-compatible service exposing `/content`.
    pub endpoint: Option<String>,
    pub token: Option<String>,
    /// Article domains that block plain HTTP clients and go straight to the browser.
    pub domains: Vec<String>,
    pub timeout_secs: u64,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            token: None,
            domains: vec!["hpe.com".to_string(), "servicenow.com".to_string()],
            timeout_secs: 90,
        }
    }
}

impl fmt::Debug for BrowserConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BrowserConfig")
            .field("endpoint", &self.endpoint)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("domains", &self.domains)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FetchConfig {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub timeout_secs: u64,
    /// Pages shorter than this are treated as suspicious when no readiness selector matches.
    pub min_content_bytes: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 1000,
            timeout_secs: 30,
            min_content_bytes: 1000,
        }
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub scraper_retries: u32,
    pub scraper_timeout_secs: u64,
    pub pause_between_secs: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            scraper_retries: 3,
            scraper_timeout_secs: 600,
            pause_between_secs: 2,
        }
    }
}

/// LLM API keys, in the order they were resolved.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials(Vec<String>);

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Credentials({} key(s))", self.0.len())
    }
}

impl Credentials {
    pub fn new(keys: Vec<String>) -> Self {
        Self(
            keys.into_iter()
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty())
                .collect(),
        )
    }

    /// Resolve keys from an explicit comma list, then the environment.
    ///
    /// Lookup order: `explicit` → `OPENAI_API_KEY_1..N` (with a bare
    /// `OPENAI_API_KEY` standing in for `_1`) → `OPENAI_API_KEYS` comma list →
    /// `OPENAI_API_KEY`. The first source yielding any key wins.
    pub fn resolve<F>(explicit: Option<&str>, env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(list) = explicit {
            let keys = Self::new(list.split(',').map(str::to_string).collect());
            if !keys.is_empty() {
                return keys;
            }
        }

        let mut numbered = Vec::new();
        let mut n = 1;
        loop {
            match env(&format!("OPENAI_API_KEY_{n}")) {
                Some(k) => numbered.push(k),
                None if n == 1 => match env("OPENAI_API_KEY") {
                    Some(k) => numbered.push(k),
                    None => break,
                },
                None => break,
            }
            n += 1;
        }
        if !numbered.is_empty() {
            return Self::new(numbered);
        }

        if let Some(list) = env("OPENAI_API_KEYS") {
            let keys = Self::new(list.split(',').map(str::to_string).collect());
            if !keys.is_empty() {
                return keys;
            }
        }

        Self::new(env("OPENAI_API_KEY").into_iter().collect())
    }

    pub fn keys(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Config {
    /// Load defaults, overlaid by the YAML file at `path` when given.
    #[instrument(level = "info", skip_all, fields(path = ?path))]
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            debug!("No config file given; using defaults");
            return Ok(Self::default());
        };
        let raw = std::fs::read_to_string(path).map_err(|e| Error::io(path.display().to_string(), e))?;
        let config: Config = serde_yaml::from_str(&raw)?;
        info!(path = %path.display(), "Loaded configuration file");
        Ok(config)
    }

    /// Path of the most recent combined file, used as the enhancer's default input.
    pub fn latest_combined(&self) -> PathBuf {
        self.data_dir.join("all_scraped_articles.json")
    }

    pub fn enhanced_debug_copy(&self) -> PathBuf {
        self.data_dir.join("all_scraped_articles_enhanced.json")
    }

    pub fn has_browser(&self) -> bool {
        self.browser.endpoint.is_some()
    }
}
