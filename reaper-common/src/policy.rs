//! Retention policy: threshold derivation and per-index classification
//!
//! Index names carry a fixed-width, zero-padded `YYYY.MM.DD` suffix, so a
//! plain string comparison against the threshold orders the same way the
//! underlying dates do. That only holds while the suffix format is enforced,
//! which is why anything deviating from it is classified as malformed.

use crate::error::{ReaperError, Result};
use chrono::{Days, NaiveDate};
use regex::Regex;
use serde::Serialize;
use std::fmt;

/// Minimum allowed retention period
pub const MIN_RETENTION_DAYS: i64 = 7;
/// Retention period used when none is configured
pub const DEFAULT_RETENTION_DAYS: i64 = 30;
/// Prefix of the indices eligible for deletion
pub const DEFAULT_INDEX_PREFIX: &str = "logstash-";

/// Date layout of index suffixes and thresholds
pub const DATE_FORMAT: &str = "%Y.%m.%d";

/// Number of days of indices to keep
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RetentionWindow(u64);

impl RetentionWindow {
    pub fn new(days: i64) -> Result<Self> {
        if days < MIN_RETENTION_DAYS {
            return Err(ReaperError::RetentionTooShort {
                days,
                min: MIN_RETENTION_DAYS,
            });
        }
        Ok(Self(days as u64))
    }

    pub fn days(&self) -> u64 {
        self.0
    }
}

impl Default for RetentionWindow {
    fn default() -> Self {
        Self(DEFAULT_RETENTION_DAYS as u64)
    }
}

/// Cutoff date formatted as `YYYY.MM.DD`; indices dated before it expire
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ThresholdDate(String);

impl ThresholdDate {
    pub fn from_date(date: NaiveDate) -> Self {
        Self(date.format(DATE_FORMAT).to_string())
    }

    /// Parse an already formatted threshold, e.g. `2024.02.14`
    pub fn parse(s: &str) -> Option<Self> {
        if is_fixed_width_date(s) {
            Some(Self(s.to_string()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ThresholdDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Compute `today - window` as a threshold date
pub fn compute_threshold(window: RetentionWindow, today: NaiveDate) -> ThresholdDate {
    // A window reaching past the start of the calendar keeps everything
    let date = today
        .checked_sub_days(Days::new(window.days()))
        .unwrap_or(NaiveDate::MIN);
    ThresholdDate::from_date(date)
}

/// Why an index was excluded from the deletion decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MalformedReason {
    /// Name does not carry the configured prefix
    InvalidFormat,
    /// Suffix is not a zero-padded `YYYY.MM.DD` calendar date
    InvalidDate,
}

impl fmt::Display for MalformedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MalformedReason::InvalidFormat => f.write_str("Invalid format"),
            MalformedReason::InvalidDate => f.write_str("Invalid date format"),
        }
    }
}

/// Retention decision for a single index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    Delete,
    Keep,
    SkipMalformed(MalformedReason),
}

/// Compiled matcher for `<prefix><YYYY.MM.DD>` index names
#[derive(Debug, Clone)]
pub struct IndexPattern {
    prefix: String,
    name_re: Regex,
}

impl IndexPattern {
    pub fn new(prefix: &str) -> Result<Self> {
        if prefix.is_empty() {
            return Err(ReaperError::Config("index prefix must not be empty".to_string()));
        }

        let name_re = Regex::new(&format!("^{}(.+)$", regex::escape(prefix)))
            .map_err(|e| ReaperError::Config(format!("invalid index prefix: {}", e)))?;

        Ok(Self {
            prefix: prefix.to_string(),
            name_re,
        })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Cheap pre-filter applied to the raw listing
    pub fn has_prefix(&self, index_name: &str) -> bool {
        index_name.starts_with(&self.prefix)
    }

    /// Extract the date suffix, if the name carries the prefix
    pub fn suffix<'a>(&self, index_name: &'a str) -> Option<&'a str> {
        let caps = self.name_re.captures(index_name)?;
        if caps.len() != 2 {
            return None;
        }
        caps.get(1).map(|m| m.as_str())
    }
}

/// Decide whether `index_name` is expired relative to `threshold`
pub fn classify(index_name: &str, threshold: &ThresholdDate, pattern: &IndexPattern) -> Classification {
    let Some(suffix) = pattern.suffix(index_name) else {
        return Classification::SkipMalformed(MalformedReason::InvalidFormat);
    };

    if !is_valid_date(suffix) {
        return Classification::SkipMalformed(MalformedReason::InvalidDate);
    }

    if suffix < threshold.as_str() {
        Classification::Delete
    } else {
        Classification::Keep
    }
}

/// Exactly `dddd.dd.dd`; chrono alone would accept `2024.1.1`
fn is_fixed_width_date(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'.',
            _ => b.is_ascii_digit(),
        })
}

fn is_valid_date(s: &str) -> bool {
    is_fixed_width_date(s) && NaiveDate::parse_from_str(s, DATE_FORMAT).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn threshold(s: &str) -> ThresholdDate {
        ThresholdDate::parse(s).unwrap()
    }

    #[test]
    fn test_retention_floor() {
        assert!(RetentionWindow::new(7).is_ok());
        assert!(RetentionWindow::new(365).is_ok());

        for days in [-1, 0, 1, 6] {
            match RetentionWindow::new(days) {
                Err(ReaperError::RetentionTooShort { days: d, min }) => {
                    assert_eq!(d, days);
                    assert_eq!(min, MIN_RETENTION_DAYS);
                }
                other => panic!("expected RetentionTooShort, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_default_window() {
        assert_eq!(RetentionWindow::default().days(), 30);
    }

    #[test]
    fn test_compute_threshold() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let window = RetentionWindow::new(30).unwrap();
        assert_eq!(compute_threshold(window, today).as_str(), "2024.02.14");
    }

    #[test]
    fn test_compute_threshold_crosses_year() {
        let today = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
        let window = RetentionWindow::new(7).unwrap();
        assert_eq!(compute_threshold(window, today).as_str(), "2023.12.27");
    }

    #[test]
    fn test_compute_threshold_huge_window_keeps_everything() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let window = RetentionWindow::new(i64::MAX).unwrap();
        let t = compute_threshold(window, today);
        let pattern = IndexPattern::new(DEFAULT_INDEX_PREFIX).unwrap();
        assert_eq!(classify("logstash-0001.01.01", &t, &pattern), Classification::Keep);
    }

    #[test]
    fn test_classify_older_is_deleted() {
        let pattern = IndexPattern::new(DEFAULT_INDEX_PREFIX).unwrap();
        assert_eq!(
            classify("logstash-2024.01.01", &threshold("2024.02.14"), &pattern),
            Classification::Delete
        );
    }

    #[test]
    fn test_classify_newer_is_kept() {
        let pattern = IndexPattern::new(DEFAULT_INDEX_PREFIX).unwrap();
        assert_eq!(
            classify("logstash-2024.03.01", &threshold("2024.02.14"), &pattern),
            Classification::Keep
        );
    }

    #[test]
    fn test_classify_threshold_day_is_kept() {
        let pattern = IndexPattern::new(DEFAULT_INDEX_PREFIX).unwrap();
        assert_eq!(
            classify("logstash-2024.02.14", &threshold("2024.02.14"), &pattern),
            Classification::Keep
        );
    }

    #[test]
    fn test_classify_wrong_prefix() {
        let pattern = IndexPattern::new(DEFAULT_INDEX_PREFIX).unwrap();
        let t = threshold("2024.02.14");
        assert_eq!(
            classify("metrics-2024.01.01", &t, &pattern),
            Classification::SkipMalformed(MalformedReason::InvalidFormat)
        );
        // Prefix must lead the name
        assert_eq!(
            classify("old-logstash-2024.01.01", &t, &pattern),
            Classification::SkipMalformed(MalformedReason::InvalidFormat)
        );
        // Prefix alone has no suffix to capture
        assert_eq!(
            classify("logstash-", &t, &pattern),
            Classification::SkipMalformed(MalformedReason::InvalidFormat)
        );
    }

    #[test]
    fn test_classify_bad_date() {
        let pattern = IndexPattern::new(DEFAULT_INDEX_PREFIX).unwrap();
        let t = threshold("2024.02.14");
        for name in [
            "logstash-notadate",
            "logstash-2024.1.01",
            "logstash-2024.02.30",
            "logstash-2024-01-01",
            "logstash-2024.01.01-000001",
        ] {
            assert_eq!(
                classify(name, &t, &pattern),
                Classification::SkipMalformed(MalformedReason::InvalidDate),
                "{}",
                name
            );
        }
    }

    #[test]
    fn test_custom_prefix_is_escaped() {
        let pattern = IndexPattern::new("app.logs-").unwrap();
        let t = threshold("2024.02.14");
        assert_eq!(classify("app.logs-2024.01.01", &t, &pattern), Classification::Delete);
        assert_eq!(
            classify("appXlogs-2024.01.01", &t, &pattern),
            Classification::SkipMalformed(MalformedReason::InvalidFormat)
        );
    }

    #[test]
    fn test_empty_prefix_rejected() {
        assert!(matches!(IndexPattern::new(""), Err(ReaperError::Config(_))));
    }

    #[test]
    fn test_threshold_parse() {
        assert!(ThresholdDate::parse("2024.02.14").is_some());
        assert!(ThresholdDate::parse("2024.2.14").is_none());
        assert!(ThresholdDate::parse("yesterday").is_none());
    }
}
