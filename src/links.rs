//! Link normalisation and resolution.

use crate::models::NOT_AVAILABLE;
use url::Url;

/// Canonical form of a link used as the dedupe key.
///
/// Trims whitespace, lowercases, and strips every trailing `/`, so the
/// function is idempotent and `HTTPS://X.com/A/` matches `https://x.com/a`.
pub fn normalize_link(link: &str) -> String {
    link.trim().to_lowercase().trim_end_matches('/').to_string()
}

/// Resolve `href` against the listing page it was found on.
///
/// Returns `None` for empty, placeholder, fragment-only, `javascript:` and
/// `mailto:` hrefs, and for anything that is not http(s) after resolution.
pub fn absolutize(base: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href == NOT_AVAILABLE || href.starts_with('#') {
        return None;
    }
    let lower = href.to_ascii_lowercase();
    if lower.starts_with("javascript:") || lower.starts_with("mailto:") || lower.starts_with("tel:") {
        return None;
    }
    let resolved = base.join(href).ok()?;
    matches!(resolved.scheme(), "http" | "https").then(|| resolved.to_string())
}

/// Host of `link` without a leading `www.`, lowercased.
pub fn host_of(link: &str) -> Option<String> {
    let parsed = Url::parse(link.trim()).ok()?;
    let host = parsed.host_str()?.to_ascii_lowercase();
    Some(host.strip_prefix("www.").unwrap_or(&host).to_string())
}

/// Whether `link` is on `domain` or one of its subdomains.
pub fn on_domain(link: &str, domain: &str) -> bool {
    let domain = domain.trim_start_matches("www.").to_ascii_lowercase();
    host_of(link).is_some_and(|host| host == domain || host.ends_with(&format!(".{domain}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_is_case_and_slash_insensitive() {
        assert_eq!(normalize_link("HTTPS://X.com/A/"), normalize_link("https://x.com/a"));
        assert_eq!(normalize_link("  https://a.com/x//  "), "https://a.com/x");
        assert_eq!(normalize_link(""), "");
    }

    #[test]
    fn normalize_is_idempotent() {
        for link in ["https://a.com/x/", "HTTPS://A.COM/X", "/", " b/ ", "https://a.com/?q=1/"] {
            let once = normalize_link(link);
            assert_eq!(normalize_link(&once), once, "not idempotent for {link:?}");
        }
    }

    #[test]
    fn absolutize_resolves_relative_links() {
        let base = Url::parse("https://www.nokia.com/newsroom/").unwrap();
        assert_eq!(
            absolutize(&base, "/newsroom/item-1/").as_deref(),
            Some("https://www.nokia.com/newsroom/item-1/")
        );
        assert_eq!(
            absolutize(&base, "item-2").as_deref(),
            Some("https://www.nokia.com/newsroom/item-2")
        );
        assert_eq!(
            absolutize(&base, "https://other.test/a").as_deref(),
            Some("https://other.test/a")
        );
    }

    #[test]
    fn absolutize_rejects_non_links() {
        let base = Url::parse("https://example.test/").unwrap();
        for href in ["", "  ", "#top", "N/A", "javascript:void(0)", "mailto:a@b.c"] {
            assert_eq!(absolutize(&base, href), None, "accepted {href:?}");
        }
    }

    #[test]
    fn domain_matching_includes_subdomains() {
        assert!(on_domain("https://www.hpe.com/us/en/newsroom/x.html", "hpe.com"));
        assert!(on_domain("https://newsroom.servicenow.com/a", "servicenow.com"));
        assert!(!on_domain("https://nothpe.com/a", "hpe.com"));
        assert!(!on_domain("not a url", "hpe.com"));
    }
}
