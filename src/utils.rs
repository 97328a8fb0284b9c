//! Small string and filesystem helpers shared across the crate.

use crate::error::{Error, Result};
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

/// Truncate a string for logging, appending how many bytes were cut.
///
/// Cuts on a char boundary at or below `max` bytes.
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.to_string()
    } else {
        let head = truncate_bytes(s, max);
        format!("{}…(+{} bytes)", head, s.len() - head.len())
    }
}

/// Longest prefix of `s` that is at most `max` bytes and ends on a char boundary.
pub fn truncate_bytes(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// First `max` characters of `s`.
pub fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Join all whitespace runs into single spaces and trim.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Detect if a serde_json error means the input ended early.
///
/// LLM replies cut off by the token limit fail this way.
pub fn looks_truncated(e: &serde_json::Error) -> bool {
    use serde_json::error::Category;
    matches!(e.classify(), Category::Eof)
}

/// Capitalize the first character of a string.
///
/// ```ignore
/// assert_eq!(upcase("hpe"), "Hpe");
/// assert_eq!(upcase(""), "");
/// ```
pub fn upcase(s: &str) -> String {
    let mut c = s.chars();
    match c.next() {
        None => String::new(),
        Some(f) => f.to_uppercase().collect::<String>() + c.as_str(),
    }
}

/// Create `path` if needed and check that a file can be written inside it.
#[instrument(level = "debug", skip_all, fields(path = %path.display()))]
pub async fn ensure_writable_dir(path: &Path) -> Result<()> {
    let shown = path.display().to_string();
    fs::create_dir_all(path)
        .await
        .map_err(|e| Error::io(shown.clone(), e))?;
    let probe = path.join("..__probe_write__");
    fs::write(&probe, b"")
        .await
        .map_err(|e| Error::io(shown.clone(), e))?;
    let _ = fs::remove_file(&probe).await;
    info!(path = %shown, "Directory is writable");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_for_log_short_string() {
        assert_eq!(truncate_for_log("Hello, world!", 100), "Hello, world!");
    }

    #[test]
    fn test_truncate_for_log_long_string() {
        let s = "a".repeat(500);
        let result = truncate_for_log(&s, 100);
        assert!(result.starts_with(&"a".repeat(100)));
        assert!(result.contains("…(+400 bytes)"));
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        let s = "héllo";
        assert_eq!(truncate_bytes(s, 2), "h");
        assert_eq!(truncate_chars(s, 2), "hé");
        assert_eq!(truncate_chars(s, 50), "héllo");
        assert!(truncate_for_log(s, 2).starts_with("h…"));
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  a \n\t b  c "), "a b c");
        assert_eq!(collapse_whitespace("   "), "");
    }

    #[test]
    fn test_upcase() {
        assert_eq!(upcase("hpe"), "Hpe");
        assert_eq!(upcase("servicenow"), "Servicenow");
        assert_eq!(upcase(""), "");
    }

    #[test]
    fn test_looks_truncated() {
        let result: std::result::Result<serde_json::Value, _> =
            serde_json::from_str(r#"{"main_ideas": ["one""#);
        assert!(looks_truncated(&result.unwrap_err()));
        let result: std::result::Result<serde_json::Value, _> = serde_json::from_str("{]");
        assert!(!looks_truncated(&result.unwrap_err()));
    }

    #[tokio::test]
    async fn test_ensure_writable_dir_creates_nested_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a/b");
        ensure_writable_dir(&nested).await.unwrap();
        assert!(nested.is_dir());
        assert_eq!(std::fs::read_dir(&nested).unwrap().count(), 0);
    }
}
