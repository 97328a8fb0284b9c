//! The full run: scrape every site, combine, enhance.
//!
//! Sites are scraped one after another. Each attempt is bounded by
//! `scraper_timeout_secs`, failed sites are retried with `2^attempt` second
//! backoff, and a failing site never stops the others. Combining and
//! enhancing only start once scraping is done; a failure in either one
//! fails the run.

use crate::combine::{CombineReport, combine};
use crate::config::Config;
use crate::enhance::{self, EnhanceOptions, EnhanceReport};
use crate::error::{Error, Result};
use crate::fetch::FetchRouter;
use crate::llm::CredentialPool;
use crate::scrapers::{ScrapeDeps, ScrapeOptions, ScrapeReport, Site, scrape_site};
use crate::store::ArticleStore;
use chrono::NaiveDateTime;
use std::time::{Duration, Instant};
use tokio::time::{sleep, timeout};
use tracing::{error, info, instrument, warn};

#[derive(Debug, Clone, Default)]
pub struct PipelineOptions {
    pub skip_scraping: bool,
    pub skip_combining: bool,
    pub skip_enhancement: bool,
    /// Exclude links already in the previous combined file.
    pub use_reference: bool,
    pub enhance: EnhanceOptions,
    pub scrape: Option<ScrapeOptions>,
}

#[derive(Debug, Clone, Default)]
pub struct PipelineReport {
    pub scraped: Vec<ScrapeReport>,
    pub failed_sites: Vec<&'static str>,
    pub combine: Option<CombineReport>,
    pub enhance: Option<EnhanceReport>,
    pub elapsed: Duration,
}

/// Scrape one site, retrying failures and timeouts.
#[instrument(level = "info", skip_all, fields(site = site.id))]
pub async fn scrape_with_retries(site: &Site, deps: &ScrapeDeps<'_>, options: &ScrapeOptions) -> Result<ScrapeReport> {
    let settings = &deps.config.pipeline;
    let attempts = settings.scraper_retries.max(1);
    let limit = Duration::from_secs(settings.scraper_timeout_secs);
    let mut attempt = 0;
    loop {
        attempt += 1;
        let outcome = match timeout(limit, scrape_site(site, deps, options)).await {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout {
                what: format!("scraper {}", site.id),
                secs: settings.scraper_timeout_secs,
            }),
        };
        match outcome {
            Ok(report) => return Ok(report),
            Err(e) if attempt >= attempts => {
                error!(attempt, error = %e, "Scraper failed; giving up");
                return Err(e);
            }
            Err(e) => {
                let delay = Duration::from_secs(1 << attempt.min(6));
                warn!(attempt, max = attempts, ?delay, error = %e, "Scraper failed; retrying");
                sleep(delay).await;
            }
        }
    }
}

/// Run the enabled stages in order.
#[instrument(level = "info", skip_all)]
pub async fn run(
    config: &Config,
    sites: &[Site],
    options: &PipelineOptions,
    fetcher: &FetchRouter,
    pool: Option<&CredentialPool>,
    now: NaiveDateTime,
) -> Result<PipelineReport> {
    let t0 = Instant::now();
    let mut report = PipelineReport::default();

    if options.skip_scraping && options.skip_combining && options.skip_enhancement {
        warn!("All stages skipped; nothing to do");
        return Ok(report);
    }

    if options.skip_scraping {
        info!("Skipping scraping");
    } else {
        let scrape_options = options.scrape.clone().unwrap_or_else(|| ScrapeOptions {
            debug: false,
            since: None,
            use_llm: true,
            today: now.date(),
        });
        let deps = ScrapeDeps {
            config,
            fetcher,
            llm: pool,
        };
        let pause = Duration::from_secs(config.pipeline.pause_between_secs);
        for (index, site) in sites.iter().enumerate() {
            if index > 0 && !pause.is_zero() {
                sleep(pause).await;
            }
            info!(site = site.id, step = index + 1, of = sites.len(), "Running scraper");
            match scrape_with_retries(site, &deps, &scrape_options).await {
                Ok(scraped) => report.scraped.push(scraped),
                Err(_) => report.failed_sites.push(site.id),
            }
        }
        info!(
            ok = report.scraped.len(),
            failed = report.failed_sites.len(),
            failed_sites = ?report.failed_sites,
            "Scraping finished"
        );
    }

    if options.skip_combining {
        info!("Skipping combining");
    } else {
        let latest = config.latest_combined();
        let reference = (options.use_reference && latest.exists()).then_some(latest.as_path());
        match combine(config, reference, now).await {
            Ok(combined) => report.combine = Some(combined),
            Err(e) => {
                error!(error = %e, "Combining failed");
                return Err(e);
            }
        }
    }

    if options.skip_enhancement {
        info!("Skipping enhancement");
    } else {
        let pool = pool.ok_or_else(|| Error::Config("enhancement needs at least one API key".to_string()))?;
        let store = ArticleStore::open(&config.database).await?;
        let enhanced = enhance::run(
            config,
            &config.latest_combined(),
            options.enhance,
            fetcher,
            pool,
            &store,
        )
        .await;
        store.close().await;
        match enhanced {
            Ok(enhanced) => report.enhance = Some(enhanced),
            Err(e) => {
                error!(error = %e, "Enhancement failed");
                return Err(e);
            }
        }
    }

    report.elapsed = t0.elapsed();
    info!(
        scrapers_ok = report.scraped.len(),
        scrapers_failed = report.failed_sites.len(),
        combined = report.combine.as_ref().map(|c| c.total),
        enhanced = report.enhance.as_ref().map(|e| e.total),
        elapsed_secs = report.elapsed.as_secs(),
        "Pipeline finished"
    );
    Ok(report)
}
