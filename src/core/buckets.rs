//! Calendar bucketing - label axes for the charts.
//!
//! A bucket is one calendar period (day, month or year). Charts share a single
//! ordered axis of bucket labels; the monthly label format `"%b %Y"`
//! (`"Jan 2024"`) is part of the contract with the chart frontend and must not
//! change. All monthly comparisons happen on first-of-month dates.

use crate::errors::{Error, Result};
use chrono::{Datelike, Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};

/// Size of a bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    /// One bucket per day
    Daily,
    /// One bucket per calendar month
    #[default]
    Monthly,
    /// One bucket per calendar year
    Yearly,
}

impl Granularity {
    const fn format(self) -> &'static str {
        match self {
            Self::Daily => "%Y-%m-%d",
            Self::Monthly => "%b %Y",
            Self::Yearly => "%Y",
        }
    }
}

/// Number of month boundaries between `d1` and `d2`, ignoring the day.
///
/// Negative when `d2` lies in an earlier month than `d1`.
#[must_use]
#[allow(clippy::cast_possible_wrap)] // month0() is 0..=11
pub fn diff_month(d2: NaiveDate, d1: NaiveDate) -> i32 {
    (d2.year() - d1.year()) * 12 + d2.month0() as i32 - d1.month0() as i32
}

/// Number of year boundaries between `d1` and `d2`.
#[must_use]
pub fn diff_year(d2: NaiveDate, d1: NaiveDate) -> i32 {
    d2.year() - d1.year()
}

/// Number of days between `d1` and `d2`.
#[must_use]
pub fn diff_day(d2: NaiveDate, d1: NaiveDate) -> i64 {
    (d2 - d1).num_days()
}

/// Distance between two dates counted in buckets of `granularity`.
#[must_use]
pub fn diff(d2: NaiveDate, d1: NaiveDate, granularity: Granularity) -> i64 {
    match granularity {
        Granularity::Daily => diff_day(d2, d1),
        Granularity::Monthly => i64::from(diff_month(d2, d1)),
        Granularity::Yearly => i64::from(diff_year(d2, d1)),
    }
}

/// First day of the period containing `date`.
#[must_use]
pub fn period_start(date: NaiveDate, granularity: Granularity) -> NaiveDate {
    match granularity {
        Granularity::Daily => date,
        Granularity::Monthly => date - Days::new(u64::from(date.day0())),
        Granularity::Yearly => date - Days::new(u64::from(date.ordinal0())),
    }
}

/// First day of the month containing `date`.
#[must_use]
pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    period_start(date, Granularity::Monthly)
}

/// Moves `date` by `count` buckets, backwards when `count` is negative.
///
/// # Errors
/// Returns `Error::InvalidDate` when the result is outside chrono's range.
pub fn shift(date: NaiveDate, count: i32, granularity: Granularity) -> Result<NaiveDate> {
    let steps = count.unsigned_abs();
    let shifted = match (granularity, count >= 0) {
        (Granularity::Daily, true) => date.checked_add_days(Days::new(u64::from(steps))),
        (Granularity::Daily, false) => date.checked_sub_days(Days::new(u64::from(steps))),
        (Granularity::Monthly, true) => date.checked_add_months(Months::new(steps)),
        (Granularity::Monthly, false) => date.checked_sub_months(Months::new(steps)),
        (Granularity::Yearly, forward) => {
            let months = Months::new(steps.saturating_mul(12));
            if forward {
                date.checked_add_months(months)
            } else {
                date.checked_sub_months(months)
            }
        }
    };
    shifted.ok_or_else(|| Error::invalid_date(format!("{date} shifted by {count} is out of range")))
}

/// Moves `date` by `count` months.
///
/// # Errors
/// Returns `Error::InvalidDate` when the result is outside chrono's range.
pub fn add_months(date: NaiveDate, count: i32) -> Result<NaiveDate> {
    shift(date, count, Granularity::Monthly)
}

/// Restartable iterator over consecutive bucket start dates.
#[derive(Debug, Clone)]
pub struct BucketIter {
    next: Option<NaiveDate>,
    remaining: usize,
    granularity: Granularity,
}

impl BucketIter {
    /// Iterates `count` buckets starting with the bucket that contains `start`.
    #[must_use]
    pub fn new(start: NaiveDate, count: usize, granularity: Granularity) -> Self {
        Self {
            next: Some(period_start(start, granularity)),
            remaining: count,
            granularity,
        }
    }
}

impl Iterator for BucketIter {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let current = self.next?;
        self.remaining -= 1;
        self.next = shift(current, 1, self.granularity).ok();
        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining))
    }
}

/// Bucket start dates from `start`'s period up to, but excluding, `end`'s period.
///
/// With `include_end` the period containing `end` is appended. A reversed range
/// yields no enumerated periods; callers validate ranges before charging money.
#[must_use]
pub fn bucket_dates(
    start: NaiveDate,
    end: NaiveDate,
    include_end: bool,
    granularity: Granularity,
) -> Vec<NaiveDate> {
    let start = period_start(start, granularity);
    let end = period_start(end, granularity);
    let count = usize::try_from(diff(end, start, granularity)).unwrap_or(0);

    let mut dates: Vec<NaiveDate> = BucketIter::new(start, count, granularity).collect();
    if include_end {
        dates.push(end);
    }
    dates
}

/// Bucket labels for the same enumeration as [`bucket_dates`].
#[must_use]
pub fn labels(
    start: NaiveDate,
    end: NaiveDate,
    include_end: bool,
    granularity: Granularity,
) -> Vec<String> {
    bucket_dates(start, end, include_end, granularity)
        .into_iter()
        .map(|date| date_to_label(date, granularity))
        .collect()
}

/// Label of the bucket containing `date`.
#[must_use]
pub fn date_to_label(date: NaiveDate, granularity: Granularity) -> String {
    period_start(date, granularity)
        .format(granularity.format())
        .to_string()
}

/// Parses a bucket label back to the first day of its period.
///
/// # Errors
/// Returns `Error::InvalidDate` when the label does not match the granularity's format.
pub fn label_to_date(label: &str, granularity: Granularity) -> Result<NaiveDate> {
    let parsed = match granularity {
        Granularity::Daily => NaiveDate::parse_from_str(label, "%Y-%m-%d").ok(),
        Granularity::Monthly => NaiveDate::parse_from_str(&format!("01 {label}"), "%d %b %Y").ok(),
        Granularity::Yearly => label
            .parse::<i32>()
            .ok()
            .and_then(|year| NaiveDate::from_ymd_opt(year, 1, 1)),
    };
    parsed.ok_or_else(|| Error::invalid_date(format!("cannot parse bucket label '{label}'")))
}

/// Parses a whole axis of labels.
///
/// # Errors
/// Returns `Error::InvalidDate` for the first label that cannot be parsed.
pub fn labels_to_dates(labels: &[String], granularity: Granularity) -> Result<Vec<NaiveDate>> {
    labels
        .iter()
        .map(|label| label_to_date(label, granularity))
        .collect()
}
