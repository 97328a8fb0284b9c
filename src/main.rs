//! # Vendor News
//!
//! Collects press releases and blog posts from telecom and IT vendor
//! newsrooms and analyst firms, merges them into one list sorted by date,
//! and enriches each article with LLM-written main ideas and tags stored
//! in SQLite.
//!
//! ## Usage
//!
//! ```sh
//! vendor_news list
//! vendor_news scrape hpe-news nokia-blog --since 2025-10-01
//! vendor_news combine
//! vendor_news enhance --test
//! vendor_news pipeline
//! vendor_news validate --only-unvalidated
//! ```
//!
//! ## Architecture
//!
//! 1. **Scraping**: each listing site is fetched (plain HTTP or a rendering
//!    service), read by CSS rules and optionally an LLM, and written to
//!    `data/<vendor>_<kind>.json`
//! 2. **Combining**: per-vendor files are merged, sorted newest first and
//!    written as `all_scraped_articles.json`
//! 3. **Enhancing**: every article page is fetched and summarised, with one
//!    worker per API key, and upserted into the `articles` table
//! 4. **Validating** (on demand): each stored row gets an LLM pass/fail
//!    verdict with a comment

use chrono::Local;
use clap::Parser;
use std::error::Error;
use std::path::PathBuf;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod cli;
mod combine;
mod config;
mod dates;
mod enhance;
mod error;
mod extract;
mod fetch;
mod links;
mod llm;
mod merge;
mod models;
mod outputs;
mod pipeline;
mod scrapers;
mod store;
mod utils;
mod validate;

use cli::{Cli, Command, TestModeArgs};
use config::{Config, Credentials};
use enhance::EnhanceOptions;
use fetch::FetchRouter;
use llm::CredentialPool;
use pipeline::PipelineOptions;
use scrapers::{ScrapeDeps, ScrapeOptions, Site};
use store::ArticleStore;
use utils::ensure_writable_dir;
use validate::ValidateOptions;

fn build_config(cli: &Cli) -> error::Result<Config> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(db) = &cli.database {
        config.database = db.clone();
    }
    if let Some(endpoint) = &cli.browser_url {
        config.browser.endpoint = Some(endpoint.clone());
    }
    if let Some(token) = &cli.browser_token {
        config.browser.token = Some(token.clone());
    }
    config.credentials = Credentials::resolve(cli.api_keys.as_deref(), |k| std::env::var(k).ok());
    Ok(config)
}

fn enhance_options(args: TestModeArgs) -> EnhanceOptions {
    EnhanceOptions {
        test_mode: args.test,
        per_vendor: args.articles_per_vendor,
    }
}

fn credential_pool(config: &Config) -> error::Result<Option<CredentialPool>> {
    if config.credentials.is_empty() {
        return Ok(None);
    }
    Ok(Some(CredentialPool::new(&config.credentials, &config.llm)?))
}

fn print_catalog() {
    for site in scrapers::catalog() {
        println!(
            "{:<22} {:<10} {:<5} {}{}{}",
            site.id,
            site.vendor,
            site.kind.to_string(),
            site.urls.first().copied().unwrap_or_default(),
            if site.needs_browser { "  [browser]" } else { "" },
            if site.uses_llm() { "  [llm]" } else { "" },
        );
    }
}

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenvy::dotenv().ok();

    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    let cli = Cli::parse();
    debug!(?cli.command, "Parsed CLI arguments");

    let config = build_config(&cli)?;
    info!(
        data_dir = %config.data_dir.display(),
        database = %config.database.display(),
        api_keys = config.credentials.len(),
        browser = config.has_browser(),
        "vendor_news starting up"
    );

    if matches!(cli.command, Command::List) {
        print_catalog();
        return Ok(());
    }

    if let Err(e) = ensure_writable_dir(&config.data_dir).await {
        error!(
            path = %config.data_dir.display(),
            error = %e,
            "Data directory is not writable (fix perms or choose a different path)"
        );
        return Err(e.into());
    }

    let now = Local::now().naive_local();
    let fetcher = FetchRouter::from_config(&config)?;
    let pool = credential_pool(&config)?;
    if pool.is_none() {
        warn!("No LLM API key found; LLM extraction and enhancement are unavailable");
    }

    match cli.command {
        Command::List => {}
        Command::Scrape(args) => {
            let sites: Vec<Site> = if args.all {
                scrapers::catalog().to_vec()
            } else {
                args.sites
                    .iter()
                    .map(|id| scrapers::find_site(id).copied())
                    .collect::<error::Result<_>>()?
            };
            let options = ScrapeOptions {
                debug: args.debug,
                since: args.since,
                use_llm: !args.no_llm,
                today: now.date(),
            };
            let deps = ScrapeDeps {
                config: &config,
                fetcher: &fetcher,
                llm: pool.as_ref(),
            };
            let mut failed = Vec::new();
            for site in &sites {
                match pipeline::scrape_with_retries(site, &deps, &options).await {
                    Ok(report) => info!(
                        site = report.site,
                        articles = report.articles,
                        from_llm = report.from_llm,
                        path = %report.path.display(),
                        "Scrape complete"
                    ),
                    Err(_) => failed.push(site.id),
                }
            }
            if !failed.is_empty() {
                return Err(format!("scraping failed for: {}", failed.join(", ")).into());
            }
        }
        Command::Combine(args) => {
            combine::combine(&config, args.reference.as_deref(), now).await?;
        }
        Command::Dedupe { file } => {
            combine::dedupe_file(&file).await?;
        }
        Command::Enhance(args) => {
            let pool = pool.ok_or_else(|| error::Error::Config("enhancement needs at least one API key".to_string()))?;
            let input: PathBuf = args.input.unwrap_or_else(|| config.latest_combined());
            let store = ArticleStore::open(&config.database).await?;
            let result = enhance::run(
                &config,
                &input,
                enhance_options(args.test_mode),
                &fetcher,
                &pool,
                &store,
            )
            .await;
            store.close().await;
            result?;
        }
        Command::Pipeline(args) => {
            let options = PipelineOptions {
                skip_scraping: args.skip_scraping,
                skip_combining: args.skip_combining,
                skip_enhancement: args.skip_enhancement,
                use_reference: args.reference,
                enhance: enhance_options(args.test_mode),
                scrape: None,
            };
            pipeline::run(&config, scrapers::catalog(), &options, &fetcher, pool.as_ref(), now).await?;
        }
        Command::Validate(args) => {
            let pool = pool.ok_or_else(|| error::Error::Config("validation needs at least one API key".to_string()))?;
            let options = ValidateOptions {
                only_unvalidated: args.only_unvalidated,
                id: args.id,
                delay: std::time::Duration::from_millis(args.delay_ms),
            };
            let store = ArticleStore::open(&config.database).await?;
            let result = validate::run(&config, &store, &pool, options).await;
            store.close().await;
            let report = result?;
            info!(
                total = report.total,
                valid = report.valid,
                invalid = report.invalid,
                "Validation summary"
            );
        }
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );
    Ok(())
}
