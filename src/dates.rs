//! Date heuristics for listing pages.
//!
//! Listings print dates in many shapes: full and abbreviated month names,
//! ISO dates, US and European numeric dates, month-only dates, and relative
//! phrases such as "3 days ago". Each site picks a [`DateStyle`] and the
//! helpers here turn whatever was found into `YYYY-MM-DD` when possible.
//!
//! Unparseable dates are kept verbatim rather than dropped, and blank dates
//! become `"N/A"`. `today` is always passed in so relative phrases resolve
//! deterministically.

use crate::models::NOT_AVAILABLE;
use chrono::{Datelike, Days, NaiveDate};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use tracing::debug;

/// How a site prints its dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateStyle {
    /// Month names, ISO dates and `M/D/YYYY`.
    Patterns,
    /// `DD/MM/YYYY` first, then the common patterns.
    DayFirst,
    /// `September 2025`, resolved to the first of the month.
    MonthYear,
    /// `May 25` meaning May 2025, resolved to the first of the month.
    ShortMonthYear,
    /// The common patterns, then relative phrases and weekday names.
    Relative,
}

/// Sort key for date strings; blank and `"N/A"` dates sort before every real date.
pub fn sort_key(date: &str) -> &str {
    let trimmed = date.trim();
    if trimmed.is_empty() || trimmed == NOT_AVAILABLE {
        "0000-00-00"
    } else {
        trimmed
    }
}

const MONTH: &str = r"(January|February|March|April|May|June|July|August|September|October|November|December|Jan|Feb|Mar|Apr|Jun|Jul|Aug|Sept|Sep|Oct|Nov|Dec)";

/// Search order used when scanning free text for a date.
static TEXT_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)\b(January|February|March|April|May|June|July|August|September|October|November|December)\s+\d{1,2}(st|nd|rd|th)?,?\s+\d{4}\b".to_string(),
        r"(?i)\b(Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)[a-z]*\.?\s+\d{1,2},?\s+\d{4}\b".to_string(),
        r"(?i)\b\d{1,2}\s+(Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)[a-z]*\.?,?\s+\d{4}\b".to_string(),
        r"\b\d{4}-\d{2}-\d{2}\b".to_string(),
        r"\b\d{1,2}/\d{1,2}/\d{4}\b".to_string(),
        r"\b\d{1,2}-\d{1,2}-\d{4}\b".to_string(),
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static ISO: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(\d{4})-(\d{1,2})-(\d{1,2})").unwrap());
static SLASHED: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(\d{1,2})/(\d{1,2})/(\d{4})\b").unwrap());
static DASHED_US: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(\d{1,2})-(\d{1,2})-(\d{4})\b").unwrap());
static MONTH_DAY_YEAR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(?i)\b{MONTH}[a-z]*\.?\s+(\d{{1,2}})(?:st|nd|rd|th)?,?\s+(\d{{4}})\b")).unwrap()
});
static DAY_MONTH_YEAR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(?i)\b(\d{{1,2}})\s+{MONTH}[a-z]*\.?,?\s+(\d{{4}})\b")).unwrap()
});
static MONTH_YEAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"(?i)\b{MONTH}[a-z]*\.?,?\s+(\d{{4}})\b")).unwrap());
static SHORT_MONTH_YEAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"(?i)^\s*{MONTH}[a-z]*\.?\s+(\d{{1,2}})\s*$")).unwrap());
static RELATIVE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(\d+|an?)\s*(minute|min|hour|hr|day|week|month|year)s?\s+ago\b").unwrap()
});
static WEEKDAY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(monday|tuesday|wednesday|thursday|friday|saturday|sunday)\s*$").unwrap()
});
static TODAY: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(today|just now)\b").unwrap());
static YESTERDAY: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\byesterday\b").unwrap());

fn month_number(name: &str) -> Option<u32> {
    let key = name.get(..3)?.to_ascii_lowercase();
    let n = match key.as_str() {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(n)
}

fn num(caps: &Captures<'_>, i: usize) -> Option<i64> {
    caps.get(i)?.as_str().parse().ok()
}

fn ymd(y: i64, m: i64, d: i64) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(i32::try_from(y).ok()?, u32::try_from(m).ok()?, u32::try_from(d).ok()?)
}

/// Absolute dates in any of the common shapes. Numeric slashed dates are
/// read month-first unless `day_first` is set.
fn parse_absolute(text: &str, day_first: bool) -> Option<NaiveDate> {
    if let Some(c) = ISO.captures(text) {
        if let Some(d) = ymd(num(&c, 1)?, num(&c, 2)?, num(&c, 3)?) {
            return Some(d);
        }
    }
    if let Some(c) = SLASHED.captures(text) {
        let (a, b, y) = (num(&c, 1)?, num(&c, 2)?, num(&c, 3)?);
        let parsed = if day_first { ymd(y, b, a) } else { ymd(y, a, b) };
        if parsed.is_some() {
            return parsed;
        }
    }
    if let Some(c) = MONTH_DAY_YEAR.captures(text) {
        let m = month_number(c.get(1)?.as_str())?;
        if let Some(d) = ymd(num(&c, 3)?, m.into(), num(&c, 2)?) {
            return Some(d);
        }
    }
    if let Some(c) = DAY_MONTH_YEAR.captures(text) {
        let m = month_number(c.get(2)?.as_str())?;
        if let Some(d) = ymd(num(&c, 3)?, m.into(), num(&c, 1)?) {
            return Some(d);
        }
    }
    if let Some(c) = DASHED_US.captures(text) {
        return ymd(num(&c, 3)?, num(&c, 1)?, num(&c, 2)?);
    }
    None
}

/// Relative phrases: "yesterday", "3 days ago", "a week ago", weekday names.
///
/// A weekday name counts only when it is the whole string and means its
/// most recent occurrence before today; today's own weekday means a week
/// ago. Months count as 30 days. Amounts too large for a calendar date
/// yield `None`.
fn parse_relative(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    let lower = text.to_lowercase();
    if YESTERDAY.is_match(&lower) {
        return today.checked_sub_days(Days::new(1));
    }
    if TODAY.is_match(&lower) {
        return Some(today);
    }
    if let Some(c) = RELATIVE.captures(&lower) {
        let amount: u64 = match c.get(1)?.as_str() {
            "a" | "an" => 1,
            n => n.parse().ok()?,
        };
        let per_unit = match c.get(2)?.as_str() {
            "minute" | "min" | "hour" | "hr" => 0,
            "day" => 1,
            "week" => 7,
            "month" => 30,
            "year" => 365,
            _ => return None,
        };
        let days = amount.checked_mul(per_unit)?;
        return today.checked_sub_days(Days::new(days));
    }
    if let Some(c) = WEEKDAY.captures(&lower) {
        let target = match c.get(1)?.as_str() {
            "monday" => 0,
            "tuesday" => 1,
            "wednesday" => 2,
            "thursday" => 3,
            "friday" => 4,
            "saturday" => 5,
            _ => 6,
        };
        let current = today.weekday().num_days_from_monday();
        let back = match (current + 7 - target) % 7 {
            0 => 7,
            n => n,
        };
        return today.checked_sub_days(Days::new(u64::from(back)));
    }
    None
}

fn parse_month_year(text: &str) -> Option<NaiveDate> {
    let c = MONTH_YEAR.captures(text)?;
    let m = month_number(c.get(1)?.as_str())?;
    ymd(num(&c, 2)?, m.into(), 1)
}

/// `May 25` means May 2025. Dates with a full year resolve to the first of
/// their month as well.
fn parse_short_month_year(text: &str) -> Option<NaiveDate> {
    if let Some(c) = SHORT_MONTH_YEAR.captures(text) {
        let m = month_number(c.get(1)?.as_str())?;
        let y = num(&c, 2)?;
        return ymd(2000 + y, m.into(), 1);
    }
    parse_absolute(text, false)
        .and_then(|d| d.with_day(1))
        .or_else(|| parse_month_year(text))
}

/// Parse `raw` according to `style`.
pub fn parse_date(raw: &str, style: DateStyle, today: NaiveDate) -> Option<NaiveDate> {
    let text = raw.trim();
    if text.is_empty() || text == NOT_AVAILABLE {
        return None;
    }
    match style {
        DateStyle::Patterns => parse_absolute(text, false),
        DateStyle::DayFirst => parse_absolute(text, true),
        DateStyle::MonthYear => parse_month_year(text).or_else(|| parse_absolute(text, false)),
        DateStyle::ShortMonthYear => parse_short_month_year(text),
        DateStyle::Relative => parse_absolute(text, false).or_else(|| parse_relative(text, today)),
    }
}

/// Normalise a date string to `YYYY-MM-DD`, keeping unparseable input as-is.
pub fn normalize_date(raw: &str, style: DateStyle, today: NaiveDate) -> String {
    let text = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if text.is_empty() || text == NOT_AVAILABLE {
        return NOT_AVAILABLE.to_string();
    }
    match parse_date(&text, style, today) {
        Some(d) => d.format("%Y-%m-%d").to_string(),
        None => {
            debug!(raw = %text, ?style, "Keeping unparsed date");
            text
        }
    }
}

/// First date found anywhere in `text`, normalised when possible.
pub fn find_date(text: &str, style: DateStyle, today: NaiveDate) -> Option<String> {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if style == DateStyle::MonthYear {
        if let Some(m) = MONTH_YEAR.find(&flat) {
            return Some(normalize_date(m.as_str(), style, today));
        }
    }
    let absolute = TEXT_PATTERNS
        .iter()
        .find_map(|re| re.find(&flat))
        .map(|m| normalize_date(m.as_str(), style, today));
    match style {
        DateStyle::Relative => absolute.or_else(|| {
            parse_relative(&flat, today).map(|d| d.format("%Y-%m-%d").to_string())
        }),
        _ => absolute,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // A Wednesday.
    fn today() -> NaiveDate {
        day(2025, 11, 12)
    }

    #[test]
    fn absolute_formats_normalize() {
        let t = today();
        for (raw, want) in [
            ("November 13, 2025", "2025-11-13"),
            ("Nov 3 2025", "2025-11-03"),
            ("Sept. 9, 2025", "2025-09-09"),
            ("13 Nov 2025", "2025-11-13"),
            ("2025-11-13", "2025-11-13"),
            ("11/13/2025", "2025-11-13"),
            ("10-17-2025", "2025-10-17"),
        ] {
            assert_eq!(normalize_date(raw, DateStyle::Patterns, t), want, "{raw}");
        }
    }

    #[test]
    fn day_first_reads_european_dates() {
        assert_eq!(normalize_date("28/10/2025", DateStyle::DayFirst, today()), "2025-10-28");
        assert_eq!(normalize_date("Oct 28, 2025", DateStyle::DayFirst, today()), "2025-10-28");
    }

    #[test]
    fn blank_and_unparseable_dates() {
        assert_eq!(normalize_date("   ", DateStyle::Patterns, today()), "N/A");
        assert_eq!(normalize_date("N/A", DateStyle::Relative, today()), "N/A");
        assert_eq!(normalize_date("Coming  soon", DateStyle::Patterns, today()), "Coming soon");
    }

    #[test]
    fn relative_phrases_resolve_against_today() {
        let t = today();
        for (raw, want) in [
            ("yesterday", "2025-11-11"),
            ("10 hours ago", "2025-11-12"),
            ("3 days ago", "2025-11-09"),
            ("a week ago", "2025-11-05"),
            ("2 weeks ago", "2025-10-29"),
            ("1 month ago", "2025-10-13"),
            ("Monday", "2025-11-10"),
            ("Wednesday", "2025-11-05"),
            ("Thursday", "2025-11-06"),
            ("10-17-2025", "2025-10-17"),
        ] {
            assert_eq!(normalize_date(raw, DateStyle::Relative, t), want, "{raw}");
        }
    }

    #[test]
    fn huge_relative_amounts_stay_unparsed() {
        let t = today();
        assert_eq!(normalize_date("9999999 years ago", DateStyle::Relative, t), "9999999 years ago");
        assert_eq!(
            normalize_date("99999999999999999999 days ago", DateStyle::Relative, t),
            "99999999999999999999 days ago"
        );
        assert_eq!(find_date("Posted 9999999 years ago", DateStyle::Relative, t), None);
    }

    #[test]
    fn printed_dates_win_over_relative_words() {
        let t = today();
        assert_eq!(normalize_date("Tuesday, November 4, 2025", DateStyle::Relative, t), "2025-11-04");
        assert_eq!(
            find_date("Retail today: what changed  September 8, 2025", DateStyle::Relative, t).as_deref(),
            Some("2025-09-08")
        );
        assert_eq!(
            find_date("Monday motivation for network teams", DateStyle::Relative, t),
            None
        );
        assert_eq!(normalize_date("Todays news", DateStyle::Relative, t), "Todays news");
        assert_eq!(normalize_date("Published today", DateStyle::Relative, t), "2025-11-12");
    }

    #[test]
    fn short_month_year_means_two_digit_year() {
        assert_eq!(normalize_date("May 25", DateStyle::ShortMonthYear, today()), "2025-05-01");
        assert_eq!(normalize_date("Dec 24", DateStyle::ShortMonthYear, today()), "2024-12-01");
        assert_eq!(
            normalize_date("Nov 25 2025", DateStyle::ShortMonthYear, today()),
            "2025-11-01"
        );
    }

    #[test]
    fn month_year_uses_first_of_month() {
        assert_eq!(normalize_date("September 2025", DateStyle::MonthYear, today()), "2025-09-01");
        assert_eq!(
            find_date("Article • March 2024", DateStyle::MonthYear, today()).as_deref(),
            Some("2024-03-01")
        );
    }

    #[test]
    fn find_date_scans_free_text() {
        let text = "Cloud\n  Infrastructure   posted on\nOctober 7, 2025 by someone";
        assert_eq!(
            find_date(text, DateStyle::Patterns, today()).as_deref(),
            Some("2025-10-07")
        );
        assert_eq!(find_date("no dates here", DateStyle::Patterns, today()), None);
        assert_eq!(
            find_date("Posted 2 days ago", DateStyle::Relative, today()).as_deref(),
            Some("2025-11-10")
        );
    }

    #[test]
    fn not_available_sorts_after_real_dates_descending() {
        let mut dates = vec!["N/A", "2025-01-02", "", "2025-11-30"];
        dates.sort_by(|a, b| sort_key(b).cmp(sort_key(a)));
        assert_eq!(dates[..2], ["2025-11-30", "2025-01-02"]);
        assert!(dates[2..].iter().all(|d| sort_key(d) == "0000-00-00"));
    }
}
