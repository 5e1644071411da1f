//! Lenient date decoding and two-tier date fallback
//!
//! Work-item exports are noisy: date columns can hold empty strings,
//! timestamps, locale-formatted dates or outright garbage. Every such value
//! is treated as an absent date rather than an error, so downstream
//! computations only ever see `Option<NaiveDate>`.
//!
//! # Example
//!
//! ```rust
//! use chrono::NaiveDate;
//! use pmpreport_core::date::{parse_date, DateFallback, EffectiveDates};
//!
//! let planned = parse_date("not a date");
//! let original = parse_date("2026-02-20T00:00:00Z");
//!
//! let end = DateFallback::new(planned, original).resolve();
//! assert_eq!(end, NaiveDate::from_ymd_opt(2026, 2, 20));
//!
//! let dates = EffectiveDates::resolve(
//!     DateFallback::new(NaiveDate::from_ymd_opt(2026, 2, 15), None),
//!     DateFallback::new(None, end),
//! );
//! assert!(dates.range().is_some());
//! ```

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};
use std::str::FromStr;

// ============================================================================
// Parsing
// ============================================================================

/// Date-only layouts accepted in exported records, tried in order
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d"];

/// Timestamp layouts without an offset; only the date part is kept
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"];

/// Parse a calendar date from an exported field value.
///
/// Returns `None` for empty, malformed or out-of-range input; never fails.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.date_naive());
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|dt| dt.date())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        })
}

/// Interpret a boolean-like text value ("Yes", "true", "1", ...)
pub fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "true" | "yes" | "y" | "1"
    )
}

/// Signed day count `minuend - subtrahend`, absent when either side is absent
pub fn signed_days(minuend: Option<NaiveDate>, subtrahend: Option<NaiveDate>) -> Option<i64> {
    match (minuend, subtrahend) {
        (Some(a), Some(b)) => Some((a - b).num_days()),
        _ => None,
    }
}

// ============================================================================
// Two-tier fallback
// ============================================================================

/// A preferred date and the baseline date used when it is missing
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DateFallback {
    pub preferred: Option<NaiveDate>,
    pub fallback: Option<NaiveDate>,
}

impl DateFallback {
    pub const fn new(preferred: Option<NaiveDate>, fallback: Option<NaiveDate>) -> Self {
        Self {
            preferred,
            fallback,
        }
    }

    /// Build from raw field text; unparseable values count as absent
    pub fn from_raw(preferred: Option<&str>, fallback: Option<&str>) -> Self {
        Self {
            preferred: preferred.and_then(parse_date),
            fallback: fallback.and_then(parse_date),
        }
    }

    /// Preferred if present, else fallback, else absent
    pub fn resolve(&self) -> Option<NaiveDate> {
        self.preferred.or(self.fallback)
    }
}

/// Start and end dates after applying fallback to each endpoint.
///
/// The endpoints resolve independently: the start may come from the
/// preferred tier while the end comes from the fallback tier.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectiveDates {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl EffectiveDates {
    pub fn resolve(start: DateFallback, end: DateFallback) -> Self {
        Self {
            start: start.resolve(),
            end: end.resolve(),
        }
    }

    /// Both endpoints, only when both resolved
    pub fn range(&self) -> Option<(NaiveDate, NaiveDate)> {
        self.start.zip(self.end)
    }
}

// ============================================================================
// Serde helpers
// ============================================================================

/// Any JSON-ish scalar a field may carry in an export
#[derive(Deserialize)]
#[serde(untagged)]
enum RawField {
    Text(String),
    Flag(bool),
    Int(i64),
    Float(f64),
    Other(IgnoredAny),
}

/// Deserialize an optional date, mapping every bad value to `None`
pub fn deserialize_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<RawField>::deserialize(deserializer)? {
        Some(RawField::Text(text)) => parse_date(&text),
        _ => None,
    })
}

/// Deserialize a boolean-like value; anything unrecognised is `false`
pub fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<RawField>::deserialize(deserializer)? {
        Some(RawField::Flag(flag)) => flag,
        Some(RawField::Text(text)) => parse_flag(&text),
        Some(RawField::Int(n)) => n == 1,
        _ => false,
    })
}

/// Deserialize a work-item id given as either a number or a string
pub fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(deserialize_optional_id(deserializer)?.unwrap_or_default())
}

/// Deserialize an optional work-item id; blank text counts as absent
pub fn deserialize_optional_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<RawField>::deserialize(deserializer)? {
        Some(RawField::Text(text)) => {
            let text = text.trim();
            (!text.is_empty()).then(|| text.to_string())
        }
        Some(RawField::Int(n)) => Some(n.to_string()),
        Some(RawField::Float(f)) if f.fract() == 0.0 && f.is_finite() => {
            Some(format!("{}", f as i64))
        }
        _ => None,
    })
}

/// Deserialize an optional small integer such as a priority
pub fn deserialize_integer<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<RawField>::deserialize(deserializer)? {
        Some(RawField::Int(n)) => u32::try_from(n).ok(),
        Some(RawField::Float(f)) if f.fract() == 0.0 && f >= 0.0 && f <= f64::from(u32::MAX) => {
            Some(f as u32)
        }
        Some(RawField::Text(text)) => text.trim().parse().ok(),
        _ => None,
    })
}

/// Deserialize an optional decimal such as story points or effort
pub fn deserialize_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<RawField>::deserialize(deserializer)? {
        Some(RawField::Int(n)) => Some(Decimal::from(n)),
        Some(RawField::Float(f)) => Decimal::try_from(f).ok(),
        Some(RawField::Text(text)) => Decimal::from_str(text.trim()).ok(),
        _ => None,
    })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn parse_date_accepts_export_formats() {
        assert_eq!(parse_date("2026-01-15"), Some(date(2026, 1, 15)));
        assert_eq!(parse_date("2026-01-15T00:00:00Z"), Some(date(2026, 1, 15)));
        assert_eq!(parse_date("2026-01-15T23:30:00+10:00"), Some(date(2026, 1, 15)));
        assert_eq!(parse_date("2026-01-15T08:00:00"), Some(date(2026, 1, 15)));
        assert_eq!(parse_date("01/15/2026"), Some(date(2026, 1, 15)));
        assert_eq!(parse_date("  2026-01-15  "), Some(date(2026, 1, 15)));
    }

    #[test]
    fn parse_date_treats_garbage_as_absent() {
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("   "), None);
        assert_eq!(parse_date("#VALUE!"), None);
        assert_eq!(parse_date("2026-02-30"), None);
        assert_eq!(parse_date("tomorrow"), None);
    }

    #[test]
    fn parse_flag_recognises_truthy_text() {
        assert!(parse_flag("Yes"));
        assert!(parse_flag("TRUE"));
        assert!(parse_flag("1"));
        assert!(!parse_flag("No"));
        assert!(!parse_flag(""));
        assert!(!parse_flag("maybe"));
    }

    #[test]
    fn signed_days_propagates_absence() {
        assert_eq!(signed_days(Some(date(2026, 3, 10)), Some(date(2026, 3, 1))), Some(9));
        assert_eq!(signed_days(Some(date(2026, 3, 1)), Some(date(2026, 3, 10))), Some(-9));
        assert_eq!(signed_days(None, Some(date(2026, 3, 1))), None);
        assert_eq!(signed_days(Some(date(2026, 3, 1)), None), None);
    }

    #[test]
    fn fallback_prefers_preferred_tier() {
        let fallback = DateFallback::new(Some(date(2026, 2, 1)), Some(date(2026, 1, 1)));
        assert_eq!(fallback.resolve(), Some(date(2026, 2, 1)));
    }

    #[test]
    fn fallback_uses_baseline_when_preferred_missing() {
        let fallback = DateFallback::new(None, Some(date(2026, 1, 1)));
        assert_eq!(fallback.resolve(), Some(date(2026, 1, 1)));
        assert_eq!(DateFallback::new(None, None).resolve(), None);
    }

    #[test]
    fn fallback_from_raw_skips_unparseable_preferred() {
        let fallback = DateFallback::from_raw(Some("#N/A"), Some("2026-02-20"));
        assert_eq!(fallback.resolve(), Some(date(2026, 2, 20)));

        let fallback = DateFallback::from_raw(Some(""), Some("garbage"));
        assert_eq!(fallback.resolve(), None);
    }

    #[test]
    fn endpoints_resolve_from_different_tiers() {
        let dates = EffectiveDates::resolve(
            DateFallback::new(Some(date(2026, 2, 15)), Some(date(2026, 1, 1))),
            DateFallback::new(None, Some(date(2026, 2, 20))),
        );
        assert_eq!(dates.start, Some(date(2026, 2, 15)));
        assert_eq!(dates.end, Some(date(2026, 2, 20)));
        assert_eq!(dates.range(), Some((date(2026, 2, 15), date(2026, 2, 20))));
    }

    #[test]
    fn range_requires_both_endpoints() {
        let dates = EffectiveDates::resolve(
            DateFallback::new(Some(date(2026, 2, 15)), None),
            DateFallback::default(),
        );
        assert_eq!(dates.range(), None);
    }
}
