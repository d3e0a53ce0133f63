//! Calendar period granularities and the clipped period segmenter.
//!
//! A [`Period`] is the calendar bucket (month, quarter, half-year or year)
//! containing an anchor date, intersected with the schedule window.

use crate::error::{Result, ScheduleError};
use chrono::{Datelike, Duration, Months, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Granularity of the installments of a schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum PeriodType {
    /// One installment per calendar month
    #[default]
    Month,
    /// One installment per calendar quarter
    Quarter,
    /// One installment per calendar half-year
    HalfYear,
    /// One installment per calendar year
    Year,
}

impl PeriodType {
    /// Returns the calendar step between two consecutive buckets, in months.
    pub fn months(&self) -> u32 {
        match self {
            PeriodType::Month => 1,
            PeriodType::Quarter => 3,
            PeriodType::HalfYear => 6,
            PeriodType::Year => 12,
        }
    }

    /// Returns the number of buckets per calendar year.
    pub fn periods_per_year(&self) -> u32 {
        12 / self.months()
    }

    /// Returns the fraction of a year one bucket represents.
    pub fn percent_of_year(&self) -> Decimal {
        Decimal::ONE / Decimal::from(self.periods_per_year())
    }

    /// Returns the plan token for this granularity.
    pub fn token(&self) -> &'static str {
        match self {
            PeriodType::Month => "monthly",
            PeriodType::Quarter => "quarterly",
            PeriodType::HalfYear => "halfYearly",
            PeriodType::Year => "yearly",
        }
    }

    /// Returns the first and last day of the full calendar bucket containing `anchor`.
    pub fn bucket_bounds(&self, anchor: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
        let step = self.months();
        let first_month = ((anchor.month() - 1) / step) * step + 1;
        let first = NaiveDate::from_ymd_opt(anchor.year(), first_month, 1)?;
        let next = first.checked_add_months(Months::new(step))?;
        Some((first, next - Duration::days(1)))
    }

    /// Formats the bucket name: `YYYYMmm`, `YYYYQq`, `YYYYHh` or `YYYYY`.
    fn bucket_name(&self, bucket_start: NaiveDate) -> String {
        let year = bucket_start.year();
        let month = bucket_start.month();
        match self {
            PeriodType::Month => format!("{year}M{month:02}"),
            PeriodType::Quarter => format!("{year}Q{}", (month - 1) / 3 + 1),
            PeriodType::HalfYear => format!("{year}H{}", (month - 1) / 6 + 1),
            PeriodType::Year => format!("{year}Y"),
        }
    }
}

impl FromStr for PeriodType {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "monthly" => Ok(PeriodType::Month),
            "quarterly" => Ok(PeriodType::Quarter),
            "halfyearly" => Ok(PeriodType::HalfYear),
            "yearly" => Ok(PeriodType::Year),
            _ => Err(ScheduleError::UnknownPeriodType {
                token: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for PeriodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.token())
    }
}

/// Inclusive date window of a schedule, passed by value into segmentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl ScheduleWindow {
    /// Creates a window, rejecting `start >= end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start >= end {
            return Err(ScheduleError::StartIsLaterOrEqualToEnd { start, end });
        }
        Ok(ScheduleWindow { start, end })
    }

    /// Returns `true` if `date` lies within the window (inclusive).
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// One calendar bucket clipped to the schedule window.
///
/// # Invariants
///
/// - `first_day <= last_day`
/// - `first_day >= window.start` and `last_day <= window.end`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Period {
    pub name: String,
    pub period_type: PeriodType,
    pub first_day: NaiveDate,
    pub last_day: NaiveDate,
    /// Number of days in `[first_day, last_day]`.
    pub length: u32,
    /// Fraction of the full calendar bucket covered after clipping.
    pub percent_of_bucket: Decimal,
    /// Fraction of a year one full bucket represents.
    pub percent_of_year: Decimal,
    #[serde(skip)]
    bucket_start: NaiveDate,
}

impl Period {
    /// Builds the clipped bucket containing `anchor`.
    ///
    /// Returns `None` when the clipped bucket is empty, i.e. the anchor lies
    /// beyond the window and no further period fits in the schedule.
    pub fn containing(
        anchor: NaiveDate,
        window: &ScheduleWindow,
        period_type: PeriodType,
    ) -> Option<Period> {
        let (bucket_start, bucket_end) = period_type.bucket_bounds(anchor)?;
        let first_day = bucket_start.max(window.start);
        let last_day = bucket_end.min(window.end);
        if first_day > last_day {
            return None;
        }

        let length = days_between(first_day, last_day);
        let bucket_days = days_between(bucket_start, bucket_end);

        Some(Period {
            name: period_type.bucket_name(bucket_start),
            period_type,
            first_day,
            last_day,
            length,
            percent_of_bucket: Decimal::from(length) / Decimal::from(bucket_days),
            percent_of_year: period_type.percent_of_year(),
            bucket_start,
        })
    }

    /// Returns the anchor of the following calendar bucket.
    pub fn next_anchor(&self) -> Option<NaiveDate> {
        self.bucket_start
            .checked_add_months(Months::new(self.period_type.months()))
    }

    /// Returns `true` if `date` falls inside the period (inclusive).
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.first_day <= date && date <= self.last_day
    }

    /// Returns `true` if the period covers its whole calendar bucket.
    pub fn is_full(&self) -> bool {
        self.percent_of_bucket == Decimal::ONE
    }

    /// Days in the calendar year the period belongs to (365 or 366).
    pub fn days_in_year(&self) -> u32 {
        days_in_year(self.first_day.year())
    }
}

/// Number of days in `[first, last]`, both inclusive.
pub fn days_between(first: NaiveDate, last: NaiveDate) -> u32 {
    let days = last.signed_duration_since(first).num_days() + 1;
    u32::try_from(days).unwrap_or(0)
}

/// Number of days in a calendar year.
pub fn days_in_year(year: i32) -> u32 {
    if (year % 4 == 0 && year % 100 != 0) || year % 400 == 0 {
        366
    } else {
        365
    }
}
