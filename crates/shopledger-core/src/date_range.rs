//! # Date-Range Resolver
//!
//! Turns a named preset or an explicit `from`/`to` pair into an inclusive
//! `[start, end]` pair of local wall-clock instants.
//!
//! ## Presets
//! ```text
//! ┌────────────────┬──────────────────────────────┬──────────────────────────┐
//! │ key            │ start (00:00:00.000)         │ end (23:59:59.999)       │
//! ├────────────────┼──────────────────────────────┼──────────────────────────┤
//! │ today          │ today                        │ today                    │
//! │ this_week      │ Monday of this week          │ the Sunday after it      │
//! │ last_week      │ Monday of last week          │ the Sunday after it      │
//! │ this_month     │ 1st of this month            │ last day of this month   │
//! │ last_month     │ 1st of last month            │ last day of last month   │
//! │ financial_year │ Apr 1 of the FY-start year   │ Mar 31 of the next year  │
//! └────────────────┴──────────────────────────────┴──────────────────────────┘
//!
//!  FY-start year = this year if the month is April or later, else last year.
//!  Unknown or absent keys resolve as this_week.
//! ```
//!
//! ## Example
//! ```rust
//! use chrono::NaiveDate;
//! use shopledger_core::date_range::{RangeKey, RangeSelector};
//!
//! // Wednesday 2024-01-17
//! let today = NaiveDate::from_ymd_opt(2024, 1, 17).unwrap();
//! let range = RangeSelector::Preset(RangeKey::ThisWeek).resolve_at(today);
//! assert_eq!(range.start.to_string(), "2024-01-15 00:00:00");
//! assert_eq!(range.end.to_string(), "2024-01-21 23:59:59.999");
//! ```

use chrono::{Datelike, Days, Duration, Local, Months, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::validation::{parse_date, ValidationResult};

// =============================================================================
// Range Key
// =============================================================================

/// A named reporting period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeKey {
    Today,
    #[default]
    ThisWeek,
    LastWeek,
    ThisMonth,
    LastMonth,
    FinancialYear,
}

impl RangeKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            RangeKey::Today => "today",
            RangeKey::ThisWeek => "this_week",
            RangeKey::LastWeek => "last_week",
            RangeKey::ThisMonth => "this_month",
            RangeKey::LastMonth => "last_month",
            RangeKey::FinancialYear => "financial_year",
        }
    }

    /// Parses a key, accepting the short aliases older clients send
    /// (`week`, `thisweek`, `lastweek`, `month`, `fy`). Case-insensitive.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "today" => Some(RangeKey::Today),
            "this_week" | "thisweek" | "week" => Some(RangeKey::ThisWeek),
            "last_week" | "lastweek" => Some(RangeKey::LastWeek),
            "this_month" | "month" => Some(RangeKey::ThisMonth),
            "last_month" => Some(RangeKey::LastMonth),
            "financial_year" | "fy" => Some(RangeKey::FinancialYear),
            _ => None,
        }
    }

    /// Parses a key, falling back to `this_week` for anything unknown.
    pub fn parse_or_default(s: Option<&str>) -> Self {
        s.and_then(RangeKey::parse).unwrap_or_default()
    }
}

// =============================================================================
// Selector & Resolved Range
// =============================================================================

/// What the caller asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeSelector {
    Preset(RangeKey),
    Explicit { from: NaiveDate, to: NaiveDate },
}

impl Default for RangeSelector {
    fn default() -> Self {
        RangeSelector::Preset(RangeKey::default())
    }
}

/// The concrete, inclusive bounds a selector resolved to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedRange {
    /// Preset name, or `custom` for an explicit pair.
    pub label: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl ResolvedRange {
    /// Whether `at` falls inside the range (both ends inclusive).
    pub fn contains(&self, at: NaiveDateTime) -> bool {
        self.start <= at && at <= self.end
    }
}

fn start_of_day(day: NaiveDate) -> NaiveDateTime {
    day.and_time(NaiveTime::MIN)
}

/// 23:59:59.999 on `day`.
fn end_of_day(day: NaiveDate) -> NaiveDateTime {
    start_of_day(day) + Duration::days(1) - Duration::milliseconds(1)
}

fn first_of_month(day: NaiveDate) -> NaiveDate {
    day - Days::new(day.day0() as u64)
}

fn last_of_month(day: NaiveDate) -> NaiveDate {
    first_of_month(day) + Months::new(1) - Days::new(1)
}

fn monday_of(day: NaiveDate) -> NaiveDate {
    // Same as (weekday + 6) % 7 on a Sunday-first index.
    day - Days::new(day.weekday().num_days_from_monday() as u64)
}

impl RangeSelector {
    /// Builds a selector from raw request fields.
    ///
    /// When both `from` and `to` are non-blank they win and must be valid
    /// `YYYY-MM-DD` dates with `from <= to`. Otherwise `range` is parsed as a
    /// preset, and unknown or absent keys mean `this_week`.
    pub fn from_parts(
        range: Option<&str>,
        from: Option<&str>,
        to: Option<&str>,
    ) -> ValidationResult<Self> {
        let from = from.map(str::trim).filter(|s| !s.is_empty());
        let to = to.map(str::trim).filter(|s| !s.is_empty());

        match (from, to) {
            (Some(from), Some(to)) => {
                let from = parse_date("from", from)?;
                let to = parse_date("to", to)?;
                if to < from {
                    return Err(ValidationError::InvalidFormat {
                        field: "to".to_string(),
                        reason: "must not be before from".to_string(),
                    });
                }
                Ok(RangeSelector::Explicit { from, to })
            }
            _ => Ok(RangeSelector::Preset(RangeKey::parse_or_default(range))),
        }
    }

    /// Resolves against the local clock.
    pub fn resolve(&self) -> ResolvedRange {
        self.resolve_at(Local::now().date_naive())
    }

    /// Resolves against a given "today".
    pub fn resolve_at(&self, today: NaiveDate) -> ResolvedRange {
        let (label, first, last) = match *self {
            RangeSelector::Explicit { from, to } => ("custom", from, to),
            RangeSelector::Preset(key) => {
                let (first, last) = preset_days(key, today);
                (key.as_str(), first, last)
            }
        };

        ResolvedRange {
            label: label.to_string(),
            start: start_of_day(first),
            end: end_of_day(last),
        }
    }
}

/// First and last calendar day of a preset.
fn preset_days(key: RangeKey, today: NaiveDate) -> (NaiveDate, NaiveDate) {
    match key {
        RangeKey::Today => (today, today),
        RangeKey::ThisWeek => {
            let monday = monday_of(today);
            (monday, monday + Days::new(6))
        }
        RangeKey::LastWeek => {
            let monday = monday_of(today) - Days::new(7);
            (monday, monday + Days::new(6))
        }
        RangeKey::ThisMonth => (first_of_month(today), last_of_month(today)),
        RangeKey::LastMonth => {
            let first = first_of_month(today) - Months::new(1);
            (first, last_of_month(first))
        }
        RangeKey::FinancialYear => {
            // month0: Jan = 0, Apr = 3
            let months_since_april = (today.month0() + 12 - 3) % 12;
            let april_first = first_of_month(today) - Months::new(months_since_april);
            (april_first, april_first + Months::new(12) - Days::new(1))
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
