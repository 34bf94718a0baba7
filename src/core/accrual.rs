//! Interval accrual - spreads recurring entries over calendar buckets.
//!
//! An entry valid over `[start_date, end_date]` charges its full `amount` once in
//! every bucket it covers (flat recurring charge, `total_amount` is never split).
//! Everything here is pure; the store-backed callers live in
//! [`crate::core::overview`].

use crate::{
    core::{
        buckets::{self, Granularity},
        series::{ChartSeries, LabeledValue, cumulative},
    },
    entities::account_entry,
    errors::{Error, Result},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Which side of the ledger a breakdown looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Flow {
    /// Entries with a negative amount, reported as positive magnitudes
    Expenses,
    /// Entries with a positive amount
    Income,
}

impl Flow {
    /// Contribution of `entry` to this flow, zero when it belongs to the other side.
    fn contribution(self, entry: &account_entry::Model) -> f64 {
        match self {
            Self::Expenses if entry.amount < 0.0 => -entry.amount,
            Self::Income if entry.amount > 0.0 => entry.amount,
            _ => 0.0,
        }
    }
}

/// Whether the entry's normalized interval contains the bucket starting at `bucket_start`.
#[must_use]
pub fn covers(
    entry: &account_entry::Model,
    bucket_start: NaiveDate,
    granularity: Granularity,
) -> bool {
    let bucket = buckets::period_start(bucket_start, granularity);
    buckets::period_start(entry.start_date, granularity) <= bucket
        && bucket <= buckets::period_start(entry.end_date, granularity)
}

/// Sums `value(entry)` over the entries covering each bucket.
fn per_bucket<F>(
    entries: &[account_entry::Model],
    dates: &[NaiveDate],
    granularity: Granularity,
    value: F,
) -> Vec<f64>
where
    F: Fn(&account_entry::Model) -> f64,
{
    dates
        .iter()
        .map(|&bucket| {
            entries
                .iter()
                .filter(|entry| covers(entry, bucket, granularity))
                .map(&value)
                .sum()
        })
        .collect()
}

/// Signed amount attributable to every label of the axis.
///
/// Every requested label is present in the result, zero when nothing covers it.
///
/// # Errors
/// Returns `Error::InvalidDate` when a label cannot be parsed.
pub fn spread(
    entries: &[account_entry::Model],
    labels: &[String],
    granularity: Granularity,
) -> Result<HashMap<String, f64>> {
    let dates = buckets::labels_to_dates(labels, granularity)?;
    let values = per_bucket(entries, &dates, granularity, |entry| entry.amount);
    Ok(labels.iter().cloned().zip(values).collect())
}

/// One series per tag for the given flow, sorted by tag.
///
/// Tags without any entry on the requested side are left out.
///
/// # Errors
/// Returns `Error::InvalidDate` when a label cannot be parsed.
pub fn tag_breakdown(
    entries: &[account_entry::Model],
    labels: &[String],
    granularity: Granularity,
    flow: Flow,
) -> Result<Vec<ChartSeries>> {
    let dates = buckets::labels_to_dates(labels, granularity)?;

    let mut by_tag: BTreeMap<&str, Vec<account_entry::Model>> = BTreeMap::new();
    for entry in entries.iter().filter(|e| flow.contribution(e) != 0.0) {
        by_tag.entry(entry.tag.as_str()).or_default().push(entry.clone());
    }

    Ok(by_tag
        .into_iter()
        .map(|(tag, tagged)| {
            let data = per_bucket(&tagged, &dates, granularity, |e| flow.contribution(e));
            ChartSeries::new(tag, data)
        })
        .collect())
}

/// Independent running-sum switches for the cash flow series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CumulativeToggles {
    /// Sum income over time
    pub income: bool,
    /// Sum expenses over time
    pub expenses: bool,
    /// Sum savings over time
    pub savings: bool,
}

impl Default for CumulativeToggles {
    fn default() -> Self {
        Self {
            income: true,
            expenses: true,
            savings: true,
        }
    }
}

/// Income, expenses and savings per bucket, all aligned to one axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashFlow {
    /// Income per bucket
    pub income: Vec<f64>,
    /// Positive magnitudes
    pub expenses: Vec<f64>,
    /// Income minus expenses per bucket
    pub savings: Vec<f64>,
}

impl CashFlow {
    /// Applies the running sums selected in `toggles`.
    #[must_use]
    pub fn accumulate(mut self, toggles: CumulativeToggles) -> Self {
        if toggles.income {
            self.income = cumulative(&self.income);
        }
        if toggles.expenses {
            self.expenses = cumulative(&self.expenses);
        }
        if toggles.savings {
            self.savings = cumulative(&self.savings);
        }
        self
    }

    /// Drops the first `skip` buckets of every series.
    #[must_use]
    pub fn skip(mut self, skip: usize) -> Self {
        for values in [&mut self.income, &mut self.expenses, &mut self.savings] {
            values.drain(..skip.min(values.len()));
        }
        self
    }
}

/// Income, expenses and savings for every label of the axis.
///
/// A bucket without income reports income 0 and savings equal to the negated
/// expenses; income from other buckets is never mixed in.
///
/// # Errors
/// Returns `Error::InvalidDate` when a label cannot be parsed.
pub fn cash_flow(
    entries: &[account_entry::Model],
    labels: &[String],
    granularity: Granularity,
) -> Result<CashFlow> {
    let dates = buckets::labels_to_dates(labels, granularity)?;
    let income = per_bucket(entries, &dates, granularity, |e| {
        Flow::Income.contribution(e)
    });
    let expenses = per_bucket(entries, &dates, granularity, |e| {
        Flow::Expenses.contribution(e)
    });
    let savings = income
        .iter()
        .zip(&expenses)
        .map(|(income, expenses)| income - expenses)
        .collect();

    Ok(CashFlow {
        income,
        expenses,
        savings,
    })
}

/// Savings, expenses and income of one month as pie slices (ids 0, 1, 2).
///
/// With `keep_zeros` false, zero-valued slices are dropped.
#[must_use]
pub fn month_summary(
    entries: &[account_entry::Model],
    month: NaiveDate,
    keep_zeros: bool,
) -> Vec<LabeledValue> {
    let month = buckets::first_of_month(month);
    let covering: Vec<&account_entry::Model> = entries
        .iter()
        .filter(|entry| covers(entry, month, Granularity::Monthly))
        .collect();

    let income: f64 = covering
        .iter()
        .map(|e| Flow::Income.contribution(e))
        .sum();
    let expenses: f64 = covering
        .iter()
        .map(|e| Flow::Expenses.contribution(e))
        .sum();

    let slices = [("Savings", income - expenses), ("Expenses", expenses), ("Income", income)];
    slices
        .into_iter()
        .enumerate()
        .map(|(id, (label, value))| LabeledValue {
            id,
            value,
            label: label.to_string(),
        })
        .filter(|slice| keep_zeros || slice.value != 0.0)
        .collect()
}

/// Expense magnitude per tag for one month, sorted by tag.
#[must_use]
pub fn month_expenses_by_tag(entries: &[account_entry::Model], month: NaiveDate) -> Vec<LabeledValue> {
    let month = buckets::first_of_month(month);
    let mut by_tag: BTreeMap<&str, f64> = BTreeMap::new();
    for entry in entries
        .iter()
        .filter(|entry| entry.amount < 0.0 && covers(entry, month, Granularity::Monthly))
    {
        *by_tag.entry(entry.tag.as_str()).or_default() += -entry.amount;
    }

    by_tag
        .into_iter()
        .enumerate()
        .map(|(id, (tag, value))| LabeledValue {
            id,
            value,
            label: tag.to_string(),
        })
        .collect()
}

/// Number of months an entry spans, both ends included.
#[must_use]
pub fn months_count(start: NaiveDate, end: NaiveDate) -> i32 {
    buckets::diff_month(end, start) + 1
}

/// Checks the invariants of an entry before it is written.
///
/// # Errors
/// Returns `Error::InvalidDate` when `end` precedes `start` and
/// `Error::InvalidAmount` when `amount` is zero or not finite.
pub fn validate_entry(start: NaiveDate, end: NaiveDate, amount: f64) -> Result<()> {
    if end < start {
        return Err(Error::invalid_date(format!(
            "end date {end} is before start date {start}"
        )));
    }
    if amount == 0.0 || !amount.is_finite() {
        return Err(Error::InvalidAmount { amount });
    }
    Ok(())
}
