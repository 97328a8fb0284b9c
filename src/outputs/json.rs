//! JSON files on disk.
//!
//! Every file this crate writes is a pretty-printed JSON array in UTF-8:
//! per-vendor scraper output, the combined article list, and the enhanced
//! debug copy. Files are always overwritten.

use crate::error::{Error, ParseError, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::Path;
use tokio::fs;
use tracing::{debug, error, info, instrument};

/// Write `items` as a pretty JSON array, creating the parent directory.
#[instrument(level = "info", skip_all, fields(path = %path.display(), count = items.len()))]
pub async fn write_articles<T: Serialize>(path: &Path, items: &[T]) -> Result<()> {
    let json = serde_json::to_string_pretty(items).map_err(ParseError::from)?;

    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        if let Err(e) = fs::create_dir_all(dir).await {
            error!(dir = %dir.display(), error = %e, "Failed to create output dir");
            return Err(Error::io(dir.display().to_string(), e));
        }
    }

    fs::write(path, json)
        .await
        .map_err(|e| Error::io(path.display().to_string(), e))?;
    info!("Wrote JSON file");
    Ok(())
}

/// Read a JSON array of `T`. Anything other than an array is an error.
#[instrument(level = "debug", skip_all, fields(path = %path.display()))]
pub async fn read_articles<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let shown = path.display().to_string();
    let raw = fs::read_to_string(path)
        .await
        .map_err(|e| Error::io(shown.clone(), e))?;
    let value: Value = serde_json::from_str(&raw).map_err(ParseError::from)?;
    if !value.is_array() {
        return Err(ParseError::NotAnArray(shown).into());
    }
    let items: Vec<T> = serde_json::from_value(value).map_err(ParseError::from)?;
    debug!(count = items.len(), "Read JSON file");
    Ok(items)
}

/// Write a debug dump of markup next to the other debug files.
pub async fn write_debug(path: &Path, content: &str) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)
            .await
            .map_err(|e| Error::io(dir.display().to_string(), e))?;
    }
    fs::write(path, content)
        .await
        .map_err(|e| Error::io(path.display().to_string(), e))?;
    debug!(path = %path.display(), bytes = content.len(), "Wrote debug dump");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Article;

    #[tokio::test]
    async fn writes_pretty_utf8_and_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("nokia_news.json");
        let articles = vec![Article::new("Nokia und Telefónica", "2025-11-10", "https://nokia.com/a")];

        write_articles(&path, &articles).await.unwrap();
        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("Telefónica"));
        assert!(raw.contains("\n  {"));

        let back: Vec<Article> = read_articles(&path).await.unwrap();
        assert_eq!(back, articles);
    }

    #[tokio::test]
    async fn object_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x_news.json");
        std::fs::write(&path, r#"{"title": "x"}"#).unwrap();
        let err = read_articles::<Article>(&path).await.unwrap_err();
        assert!(matches!(err, Error::Parse(ParseError::NotAnArray(_))));
    }

    #[tokio::test]
    async fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_articles::<Article>(&dir.path().join("none.json")).await.unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }
}
