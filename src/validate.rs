//! Review stored articles with the LLM and record a verdict on each row.
//!
//! Rows are checked one at a time with a pause between requests. Every
//! row gets `validation_status` (1 valid, 0 not) and a comment; API and
//! parse failures are recorded as invalid so they show up for review.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::llm::CredentialPool;
use crate::llm::validation::validate_article;
use crate::store::ArticleStore;
use std::time::{Duration, Instant};
use tracing::{info, instrument, warn};

#[derive(Debug, Clone, Copy)]
pub struct ValidateOptions {
    /// Skip rows that already carry a verdict.
    pub only_unvalidated: bool,
    /// Check this row only.
    pub id: Option<i64>,
    /// Pause between two requests.
    pub delay: Duration,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ValidateReport {
    pub total: usize,
    pub valid: usize,
    pub invalid: usize,
}

#[instrument(level = "info", skip_all, fields(id = ?options.id, only_unvalidated = options.only_unvalidated))]
pub async fn run(
    config: &Config,
    store: &ArticleStore,
    pool: &CredentialPool,
    options: ValidateOptions,
) -> Result<ValidateReport> {
    let t0 = Instant::now();
    let rows = match options.id {
        Some(id) => vec![
            store
                .find_by_id(id)
                .await?
                .ok_or_else(|| Error::Config(format!("no article with id {id}")))?,
        ],
        None if options.only_unvalidated => store.unvalidated().await?,
        None => store.all().await?,
    };
    if rows.is_empty() {
        info!("No articles to validate");
        return Ok(ValidateReport::default());
    }
    info!(count = rows.len(), "Validating articles");

    let mut report = ValidateReport {
        total: rows.len(),
        ..ValidateReport::default()
    };
    for (i, row) in rows.iter().enumerate() {
        if i > 0 && !options.delay.is_zero() {
            tokio::time::sleep(options.delay).await;
        }
        let verdict = {
            let client = pool.checkout().await?;
            validate_article(&*client, &config.llm, row).await
        };
        store.set_validation(row.id, verdict.valid, &verdict.comment).await?;
        if verdict.valid {
            report.valid += 1;
            info!(id = row.id, title = %row.title, "Valid");
        } else {
            report.invalid += 1;
            warn!(id = row.id, title = %row.title, comment = %verdict.comment, "Invalid");
        }
    }

    info!(
        total = report.total,
        valid = report.valid,
        invalid = report.invalid,
        elapsed_ms = t0.elapsed().as_millis() as u64,
        "Validation complete"
    );
    Ok(report)
}
