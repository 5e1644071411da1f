//! Fiscal reporting periods
//!
//! The fiscal year starts on 1 July and is named after the calendar year in
//! which it ends: FY2026 runs from 1 Jul 2025 to 30 Jun 2026.
//!
//! | Quarter | Months  |
//! |---------|---------|
//! | Q1      | Jul–Sep |
//! | Q2      | Oct–Dec |
//! | Q3      | Jan–Mar |
//! | Q4      | Apr–Jun |
//!
//! # Example
//!
//! ```rust
//! use chrono::NaiveDate;
//! use pmpreport_core::period::{FiscalYear, PeriodResolver, QuarterSelection};
//!
//! let fy: FiscalYear = "FY2026".parse().unwrap();
//! let q3: QuarterSelection = "Q3".parse().unwrap();
//! let today = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
//!
//! let period = PeriodResolver::resolve(Some(fy), Some(q3), today);
//! assert_eq!(period.start, NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());
//! assert_eq!(period.end, NaiveDate::from_ymd_opt(2026, 3, 31).unwrap());
//! ```

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// First month of the fiscal year
const FISCAL_START_MONTH: u32 = 7;

/// Supported range of fiscal years (by ending calendar year)
const MIN_FISCAL_YEAR: i32 = 1901;
const MAX_FISCAL_YEAR: i32 = 9999;

// ============================================================================
// Fiscal year
// ============================================================================

/// A fiscal year, identified by the calendar year in which it ends
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FiscalYear {
    end_year: i32,
}

impl FiscalYear {
    /// Create from the ending calendar year (FY2026 => `new(2026)`)
    pub fn new(end_year: i32) -> Result<Self, PeriodError> {
        if (MIN_FISCAL_YEAR..=MAX_FISCAL_YEAR).contains(&end_year) {
            Ok(Self { end_year })
        } else {
            Err(PeriodError::YearOutOfRange(end_year))
        }
    }

    /// The fiscal year a calendar date falls in
    pub fn containing(date: NaiveDate) -> Self {
        let end_year = if date.month() >= FISCAL_START_MONTH {
            date.year() + 1
        } else {
            date.year()
        };
        Self {
            end_year: end_year.clamp(MIN_FISCAL_YEAR, MAX_FISCAL_YEAR),
        }
    }

    pub fn end_year(&self) -> i32 {
        self.end_year
    }

    /// 1 July of the preceding calendar year
    pub fn start(&self) -> NaiveDate {
        first_of_month(self.end_year - 1, FISCAL_START_MONTH)
    }

    /// 30 June of the ending calendar year
    pub fn end(&self) -> NaiveDate {
        last_of_month(self.end_year, FISCAL_START_MONTH - 1)
    }

    /// Display label, e.g. "FY2026"
    pub fn label(&self) -> String {
        format!("FY{}", self.end_year)
    }
}

impl fmt::Display for FiscalYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FY{}", self.end_year)
    }
}

impl FromStr for FiscalYear {
    type Err = PeriodError;

    /// Accepts `FY2026`, `FY26`, `2026`, `2025-26`, `2025/26` and `2025-2026`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || PeriodError::InvalidFiscalYear(s.to_string());

        let trimmed = s.trim();
        let body = trimmed
            .get(..2)
            .filter(|prefix| prefix.eq_ignore_ascii_case("fy"))
            .map_or(trimmed, |_| &trimmed[2..])
            .trim_start_matches(|c: char| c == ' ' || c == '-' || c == '_');

        if let Some((first, second)) = body.split_once(|c: char| c == '-' || c == '/') {
            let first_year = parse_digits(first, 4).ok_or_else(invalid)?;
            let end_year = first_year + 1;
            let matches_end = match second.len() {
                2 => parse_digits(second, 2).ok_or_else(invalid)? == end_year % 100,
                4 => parse_digits(second, 4).ok_or_else(invalid)? == end_year,
                _ => false,
            };
            if !matches_end {
                return Err(invalid());
            }
            return Self::new(end_year);
        }

        match body.len() {
            4 => Self::new(parse_digits(body, 4).ok_or_else(invalid)?),
            2 => Self::new(2000 + parse_digits(body, 2).ok_or_else(invalid)?),
            _ => Err(invalid()),
        }
    }
}

impl TryFrom<String> for FiscalYear {
    type Error = PeriodError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FiscalYear> for String {
    fn from(value: FiscalYear) -> Self {
        value.label()
    }
}

fn parse_digits(text: &str, len: usize) -> Option<i32> {
    (text.len() == len && text.bytes().all(|b| b.is_ascii_digit()))
        .then(|| text.parse().ok())
        .flatten()
}

// ============================================================================
// Quarters
// ============================================================================

/// Fiscal quarter
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Quarter {
    Q1,
    Q2,
    Q3,
    Q4,
}

impl Quarter {
    pub const ALL: [Quarter; 4] = [Quarter::Q1, Quarter::Q2, Quarter::Q3, Quarter::Q4];

    /// The fiscal quarter a calendar date falls in
    pub fn containing(date: NaiveDate) -> Self {
        match date.month() {
            7..=9 => Quarter::Q1,
            10..=12 => Quarter::Q2,
            1..=3 => Quarter::Q3,
            _ => Quarter::Q4,
        }
    }

    /// (calendar-year offset from the fiscal end year, first month)
    fn first_month(self) -> (i32, u32) {
        match self {
            Quarter::Q1 => (-1, 7),
            Quarter::Q2 => (-1, 10),
            Quarter::Q3 => (0, 1),
            Quarter::Q4 => (0, 4),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Quarter::Q1 => "Q1",
            Quarter::Q2 => "Q2",
            Quarter::Q3 => "Q3",
            Quarter::Q4 => "Q4",
        }
    }
}

impl fmt::Display for Quarter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single quarter or the whole fiscal year
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum QuarterSelection {
    Quarter(Quarter),
    All,
}

impl QuarterSelection {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuarterSelection::Quarter(q) => q.as_str(),
            QuarterSelection::All => "All",
        }
    }
}

impl fmt::Display for QuarterSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<Quarter> for QuarterSelection {
    fn from(q: Quarter) -> Self {
        QuarterSelection::Quarter(q)
    }
}

impl FromStr for QuarterSelection {
    type Err = PeriodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "q1" | "1" => Ok(Quarter::Q1.into()),
            "q2" | "2" => Ok(Quarter::Q2.into()),
            "q3" | "3" => Ok(Quarter::Q3.into()),
            "q4" | "4" => Ok(Quarter::Q4.into()),
            "all" | "fy" | "year" => Ok(QuarterSelection::All),
            _ => Err(PeriodError::InvalidQuarter(s.to_string())),
        }
    }
}

impl TryFrom<String> for QuarterSelection {
    type Error = PeriodError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<QuarterSelection> for String {
    fn from(value: QuarterSelection) -> Self {
        value.as_str().to_string()
    }
}

// ============================================================================
// Reporting period
// ============================================================================

/// An inclusive calendar date range
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportingPeriod {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl ReportingPeriod {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Whether `[start, end]` shares at least one day with this period
    pub fn overlaps(&self, start: NaiveDate, end: NaiveDate) -> bool {
        start <= self.end && end >= self.start
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

impl fmt::Display for ReportingPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

/// The fiscal selection a period was resolved from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodSelection {
    pub fiscal_year: FiscalYear,
    pub quarter: QuarterSelection,
}

impl PeriodSelection {
    /// Fill in missing parts from the fiscal year and quarter containing `today`
    pub fn with_defaults(
        fiscal_year: Option<FiscalYear>,
        quarter: Option<QuarterSelection>,
        today: NaiveDate,
    ) -> Self {
        Self {
            fiscal_year: fiscal_year.unwrap_or_else(|| FiscalYear::containing(today)),
            quarter: quarter.unwrap_or_else(|| Quarter::containing(today).into()),
        }
    }

    pub fn period(&self) -> ReportingPeriod {
        let fy = self.fiscal_year;
        match self.quarter {
            QuarterSelection::All => ReportingPeriod::new(fy.start(), fy.end()),
            QuarterSelection::Quarter(q) => {
                let (offset, month) = q.first_month();
                let year = fy.end_year() + offset;
                ReportingPeriod::new(first_of_month(year, month), last_of_month(year, month + 2))
            }
        }
    }
}

impl fmt::Display for PeriodSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.fiscal_year, self.quarter)
    }
}

/// Maps a fiscal-year and quarter selection onto concrete dates
pub struct PeriodResolver;

impl PeriodResolver {
    /// Resolve a selection to a period; missing parts default from `today`
    pub fn resolve(
        fiscal_year: Option<FiscalYear>,
        quarter: Option<QuarterSelection>,
        today: NaiveDate,
    ) -> ReportingPeriod {
        PeriodSelection::with_defaults(fiscal_year, quarter, today).period()
    }
}

fn first_of_month(year: i32, month: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, 1).expect("fiscal years are range-checked on construction")
}

fn last_of_month(year: i32, month: u32) -> NaiveDate {
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    first_of_month(next_year, next_month)
        .pred_opt()
        .expect("fiscal years are range-checked on construction")
}

// ============================================================================
// Errors
// ============================================================================

/// Invalid fiscal selection input
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PeriodError {
    #[error("Invalid fiscal year label: {0:?} (expected e.g. FY2026, FY26, 2025-26)")]
    InvalidFiscalYear(String),

    #[error("Fiscal year out of range: {0}")]
    YearOutOfRange(i32),

    #[error("Invalid quarter: {0:?} (expected Q1, Q2, Q3, Q4 or all)")]
    InvalidQuarter(String),
}

// ============================================================================
// Tests
// ============================================================================
