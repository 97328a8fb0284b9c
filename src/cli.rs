//! Command-line interface definitions for vendor_news.
//!
//! Global options can also come from the environment (after `.env` is
//! loaded). They override the YAML config file.

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Scrape vendor and analyst newsrooms, combine the listings and enrich
/// each article with LLM main ideas and tags.
///
/// # Examples
///
/// ```sh
/// # One site, with markup dumps in ./debug
/// vendor_news scrape hpe-news --debug
///
/// # Everything, three articles per vendor in the enhancer
/// vendor_news --api-keys sk-1,sk-2 pipeline --test
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a config.yaml file
    #[arg(short, long, global = true, env = "VENDOR_NEWS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Comma-separated LLM API keys; overrides OPENAI_API_KEY* variables
    #[arg(long, global = true, env = "VENDOR_NEWS_API_KEYS", hide_env_values = true)]
    pub api_keys: Option<String>,

    /// Directory for per-vendor and combined JSON files
    #[arg(long, global = true, env = "VENDOR_NEWS_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// SQLite database for enhanced articles
    #[arg(long, global = true, env = "VENDOR_NEWS_DATABASE")]
    pub database: Option<PathBuf>,

    /// Base URL of a Browserless-compatible rendering service
    #[arg(long, global = true, env = "BROWSERLESS_URL")]
    pub browser_url: Option<String>,

    /// Token for the rendering service
    #[arg(long, global = true, env = "BROWSERLESS_TOKEN", hide_env_values = true)]
    pub browser_token: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List every known listing site
    List,
    /// Scrape one or more sites into per-vendor JSON files
    Scrape(ScrapeArgs),
    /// Combine per-vendor files into one list sorted by date
    Combine(CombineArgs),
    /// Report duplicate links in a JSON file and write a de-duplicated copy
    Dedupe {
        file: PathBuf,
    },
    /// Fetch, summarise and store combined articles
    Enhance(EnhanceArgs),
    /// Scrape every site, combine, then enhance
    Pipeline(PipelineArgs),
    /// Ask the LLM to review stored articles and record its verdicts
    Validate(ValidateArgs),
}

#[derive(Args, Debug)]
pub struct ScrapeArgs {
    /// Site ids as shown by `list`, e.g. hpe-news
    #[arg(required_unless_present = "all")]
    pub sites: Vec<String>,

    /// Scrape every site
    #[arg(long, conflicts_with = "sites")]
    pub all: bool,

    /// Write full and excerpted markup of the first page to the debug dir
    #[arg(short, long)]
    pub debug: bool,

    /// Drop articles dated before this day (YYYY-MM-DD)
    #[arg(long)]
    pub since: Option<NaiveDate>,

    /// Heuristic extraction only
    #[arg(long)]
    pub no_llm: bool,
}

#[derive(Args, Debug)]
pub struct CombineArgs {
    /// Leave out links already present in this combined file
    #[arg(long)]
    pub reference: Option<PathBuf>,
}

#[derive(Args, Debug, Clone, Copy)]
pub struct TestModeArgs {
    /// Only process the first articles of each vendor
    #[arg(long)]
    pub test: bool,

    /// Articles per vendor in test mode
    #[arg(long, default_value_t = 3)]
    pub articles_per_vendor: usize,
}

#[derive(Args, Debug)]
pub struct EnhanceArgs {
    /// Combined article file; defaults to all_scraped_articles.json in the data dir
    #[arg(long)]
    pub input: Option<PathBuf>,

    #[command(flatten)]
    pub test_mode: TestModeArgs,
}

#[derive(Args, Debug)]
pub struct PipelineArgs {
    #[command(flatten)]
    pub test_mode: TestModeArgs,

    #[arg(long)]
    pub skip_scraping: bool,

    #[arg(long)]
    pub skip_combining: bool,

    #[arg(long)]
    pub skip_enhancement: bool,

    /// Leave out links already in the previous combined file
    #[arg(long)]
    pub reference: bool,
}

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Validate a single article by database id
    #[arg(long)]
    pub id: Option<i64>,

    /// Skip articles that already have a verdict
    #[arg(long, conflicts_with = "id")]
    pub only_unvalidated: bool,

    /// Pause between LLM requests, in milliseconds
    #[arg(long, default_value_t = 1000)]
    pub delay_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scrape_parsing() {
        let cli = Cli::parse_from([
            "vendor_news",
            "--data-dir",
            "/tmp/data",
            "scrape",
            "hpe-news",
            "nokia-blog",
            "-d",
            "--since",
            "2025-10-01",
        ]);
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/data")));
        let Command::Scrape(args) = cli.command else {
            panic!("expected scrape");
        };
        assert_eq!(args.sites, ["hpe-news", "nokia-blog"]);
        assert!(args.debug);
        assert!(!args.no_llm);
        assert_eq!(args.since, NaiveDate::from_ymd_opt(2025, 10, 1));
    }

    #[test]
    fn test_scrape_requires_sites_or_all() {
        assert!(Cli::try_parse_from(["vendor_news", "scrape"]).is_err());
        assert!(Cli::try_parse_from(["vendor_news", "scrape", "--all", "hpe-news"]).is_err());
        let cli = Cli::try_parse_from(["vendor_news", "scrape", "--all"]).unwrap();
        assert!(matches!(cli.command, Command::Scrape(ScrapeArgs { all: true, .. })));
    }

    #[test]
    fn test_pipeline_flags_and_global_options_after_subcommand() {
        let cli = Cli::parse_from([
            "vendor_news",
            "pipeline",
            "--test",
            "--articles-per-vendor",
            "2",
            "--skip-scraping",
            "--api-keys",
            "k1,k2",
        ]);
        assert_eq!(cli.api_keys.as_deref(), Some("k1,k2"));
        let Command::Pipeline(args) = cli.command else {
            panic!("expected pipeline");
        };
        assert!(args.test_mode.test);
        assert_eq!(args.test_mode.articles_per_vendor, 2);
        assert!(args.skip_scraping);
        assert!(!args.skip_enhancement);
    }

    #[test]
    fn test_enhance_defaults() {
        let cli = Cli::parse_from(["vendor_news", "enhance"]);
        let Command::Enhance(args) = cli.command else {
            panic!("expected enhance");
        };
        assert_eq!(args.input, None);
        assert!(!args.test_mode.test);
        assert_eq!(args.test_mode.articles_per_vendor, 3);
    }

    #[test]
    fn test_validate_options() {
        let cli = Cli::parse_from(["vendor_news", "validate", "--only-unvalidated", "--delay-ms", "0"]);
        let Command::Validate(args) = cli.command else {
            panic!("expected validate");
        };
        assert!(args.only_unvalidated);
        assert_eq!(args.id, None);
        assert_eq!(args.delay_ms, 0);

        let cli = Cli::parse_from(["vendor_news", "validate", "--id", "42"]);
        assert!(matches!(cli.command, Command::Validate(ValidateArgs { id: Some(42), delay_ms: 1000, .. })));
        assert!(Cli::try_parse_from(["vendor_news", "validate", "--id", "4", "--only-unvalidated"]).is_err());
    }
}
