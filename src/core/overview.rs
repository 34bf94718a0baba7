//! Chart payloads - energy costs, expenses, savings, trends and net worth.
//!
//! Every call recomputes from the current database state. Empty inputs produce
//! well-formed empty payloads; a reversed range is always `Error::InvalidDate`,
//! whether or not the user has data.

use crate::{
    config::OverviewConfig,
    core::{
        accounts,
        accrual::{self, CumulativeToggles, Flow},
        buckets::{self, Granularity},
        energy,
        series::{
            self, ChartSeries, LabeledValue, TrendDirection, average, decrease_percentage,
            increase_percentage, round2,
        },
        users,
    },
    errors::{Error, Result},
};
use chrono::{Datelike, NaiveDate};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Month and year of the first and last bucket of a chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthSpan {
    /// Month of the first bucket
    pub start_month: u32,
    /// Year of the first bucket
    pub start_year: i32,
    /// Month of the last bucket
    pub end_month: u32,
    /// Year of the last bucket
    pub end_year: i32,
}

impl MonthSpan {
    /// Span from the months of `start` and `end`.
    #[must_use]
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start_month: start.month(),
            start_year: start.year(),
            end_month: end.month(),
            end_year: end.year(),
        }
    }
}

/// One series per counter plus "Total".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergyOverview {
    /// Month labels of the axis
    pub x_labels: Vec<String>,
    /// Cost per counter, then "Total"
    pub consumption: Vec<ChartSeries>,
    /// First and last month of the axis
    #[serde(flatten)]
    pub span: MonthSpan,
}

/// Energy cost of the last complete month against the history before it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TotalConsumption {
    /// Total energy cost of the current month
    pub total: f64,
    /// Label of the current month
    pub current_month_str: String,
    /// Month number of the current month
    pub current_month: u32,
    /// Year of the current month
    pub current_year: i32,
    /// Human readable trend
    pub message: String,
    /// Monthly average of the history
    pub average_consumption_until_previous_month: f64,
    /// Positive when consumption went down
    pub consumption_development_percentage: f64,
    /// Months the average was taken over
    #[serde(flatten)]
    pub span: MonthSpan,
}

/// One series per expense tag plus "Total".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpensesOverview {
    /// Month labels of the axis
    pub x_labels: Vec<String>,
    /// Expenses per tag, then "Total"
    pub expenses: Vec<ChartSeries>,
    /// First and last month of the axis
    #[serde(flatten)]
    pub span: MonthSpan,
}

/// Parameters of the savings chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavingsRequest {
    /// First month shown
    pub start: NaiveDate,
    /// End of the window
    pub end: NaiveDate,
    /// Whether the month of `end` is shown
    #[serde(default)]
    pub include_last_month: bool,
    /// Which series are running sums
    #[serde(default)]
    pub cumulative: CumulativeToggles,
}

/// Income, expenses and savings over the requested window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavingsOverview {
    /// Month labels of the axis
    pub x_labels: Vec<String>,
    /// Income per month
    pub income: Vec<f64>,
    /// Expenses per month, positive
    pub expenses: Vec<f64>,
    /// Income minus expenses per month
    pub savings: Vec<f64>,
    /// First and last month of the axis
    #[serde(flatten)]
    pub span: MonthSpan,
}

/// Expenses of the current month against the months before it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpensesTrend {
    /// Expenses of the current month
    pub total: f64,
    /// Label of the current month
    pub current_month_str: String,
    /// Month number of the current month
    pub current_month: u32,
    /// Year of the current month
    pub current_year: i32,
    /// Human readable trend
    pub message: String,
    /// Monthly average of the months before
    pub average_expenses_until_previous_month: f64,
    /// Positive when spending went down
    pub expenses_development_percentage: f64,
}

/// Net worth snapshot of one month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetWorth {
    /// Label of the month
    pub month_str: String,
    /// Month number
    pub month: u32,
    /// Year
    pub year: i32,
    /// Sum of all entries covering the month
    pub net_worth: f64,
    /// Monthly nets summed from the first entry through the month
    pub accumulated_net_worth: f64,
    /// Positive when the month beats the average of the months before it
    pub development_percentage: f64,
    /// Direction of `development_percentage`
    pub trend: TrendDirection,
}

/// Normalizes a range to first-of-month dates and rejects empty or reversed ones.
fn month_range(start: NaiveDate, end: NaiveDate) -> Result<(NaiveDate, NaiveDate)> {
    let start = buckets::first_of_month(start);
    let end = buckets::first_of_month(end);
    if start >= end {
        return Err(Error::invalid_date(format!(
            "start {start} is not before end {end}"
        )));
    }
    Ok((start, end))
}

/// First day after the last bucket of the axis.
fn axis_end(end: NaiveDate, include_last_month: bool) -> Result<NaiveDate> {
    if include_last_month {
        buckets::add_months(end, 1)
    } else {
        Ok(end)
    }
}

/// Last day of the month starting at `month`.
fn month_end(month: NaiveDate) -> Result<NaiveDate> {
    buckets::shift(buckets::add_months(month, 1)?, -1, Granularity::Daily)
}

/// Mean of the `history` buckets, zero when there are fewer than `min_samples`.
fn trailing_average(history: &[f64], min_samples: usize) -> f64 {
    if history.len() < min_samples.max(1) {
        return 0.0;
    }
    average(history).map_or(0.0, round2)
}

/// Cost chart of every counter of the user.
///
/// # Errors
/// * `Error::InvalidDate` when `start` is not before `end`
/// * the first error of any counter, which aborts the whole chart
pub async fn get_energy_consumption_overview(
    db: &DatabaseConnection,
    user_id: i64,
    start: NaiveDate,
    end: NaiveDate,
    include_last_month: bool,
) -> Result<EnergyOverview> {
    let (start, end) = month_range(start, end)?;
    let span = MonthSpan::new(start, end);

    let counters = energy::get_energy_counters(db, user_id).await?;
    if counters.is_empty() {
        return Ok(EnergyOverview {
            x_labels: Vec::new(),
            consumption: Vec::new(),
            span,
        });
    }

    let mut x_labels = Vec::new();
    let mut consumption = Vec::with_capacity(counters.len() + 1);
    for counter in &counters {
        let overview = energy::counter_overview(db, counter, start, end, include_last_month).await?;
        x_labels = overview.x_labels;
        consumption.push(ChartSeries::new(overview.label, overview.data));
    }
    let consumption = series::with_total(consumption, x_labels.len());

    debug!(
        "Energy overview for user {user_id}: {} counters over {} months",
        counters.len(),
        x_labels.len()
    );
    Ok(EnergyOverview {
        x_labels,
        consumption,
        span,
    })
}

/// Energy cost of the last complete month before `today`, with its trend.
///
/// The average covers every month from the earliest counter start up to, but
/// excluding, the month before the current one.
pub async fn get_total_consumption(
    db: &DatabaseConnection,
    user_id: i64,
    today: NaiveDate,
    config: OverviewConfig,
) -> Result<TotalConsumption> {
    let current = buckets::add_months(buckets::first_of_month(today), -1)?;
    let next = buckets::add_months(current, 1)?;
    let current_month_str = buckets::date_to_label(current, Granularity::Monthly);

    let counters = energy::get_energy_counters(db, user_id).await?;
    let Some(min_start) = counters.iter().map(|c| c.start_date).min() else {
        return Ok(TotalConsumption {
            total: 0.0,
            current_month_str,
            current_month: current.month(),
            current_year: current.year(),
            message: "No counters found".to_string(),
            average_consumption_until_previous_month: 0.0,
            consumption_development_percentage: 0.0,
            span: MonthSpan::new(current, next),
        });
    };

    let mut total = 0.0;
    for counter in &counters {
        let overview = energy::counter_overview(db, counter, current, next, false).await?;
        total += overview.data.iter().sum::<f64>();
    }
    let total = round2(total);

    let history_end = buckets::add_months(current, -1)?;
    let months = usize::try_from(buckets::diff_month(history_end, min_start)).unwrap_or(0);
    let average = if months == 0 || months < config.min_trend_samples {
        0.0
    } else {
        let history = get_energy_consumption_overview(db, user_id, min_start, history_end, false).await?;
        history
            .consumption
            .last()
            .map_or(0.0, |sum| trailing_average(&sum.data, config.min_trend_samples))
    };

    let percentage = decrease_percentage(total, average);
    let direction = TrendDirection::from_decrease_percentage(percentage);
    info!(
        "Energy consumption of user {user_id} in {current_month_str}: {total} ({percentage}%)"
    );

    Ok(TotalConsumption {
        total,
        current_month_str,
        current_month: current.month(),
        current_year: current.year(),
        message: format!("Energy consumption is {}", direction.as_str()),
        average_consumption_until_previous_month: average,
        consumption_development_percentage: percentage,
        span: MonthSpan::new(buckets::first_of_month(min_start), history_end),
    })
}

/// Expenses per tag over `[start, end)`, or `[start, end]` with `include_last_month`.
///
/// # Errors
/// Returns `Error::InvalidDate` when `start` is not before `end`.
pub async fn get_expenses_overview(
    db: &DatabaseConnection,
    user_id: i64,
    start: NaiveDate,
    end: NaiveDate,
    include_last_month: bool,
) -> Result<ExpensesOverview> {
    let (start, end) = month_range(start, end)?;
    let span = MonthSpan::new(start, end);

    let last_day = buckets::shift(axis_end(end, include_last_month)?, -1, Granularity::Daily)?;
    let entries = accounts::get_entries_overlapping(db, user_id, start, last_day).await?;
    if entries.is_empty() {
        return Ok(ExpensesOverview {
            x_labels: Vec::new(),
            expenses: Vec::new(),
            span,
        });
    }

    let x_labels = buckets::labels(start, end, include_last_month, Granularity::Monthly);
    let by_tag = accrual::tag_breakdown(&entries, &x_labels, Granularity::Monthly, Flow::Expenses)?
        .into_iter()
        .map(ChartSeries::rounded)
        .collect();
    let expenses = series::with_total(by_tag, x_labels.len());

    Ok(ExpensesOverview {
        x_labels,
        expenses,
        span,
    })
}

/// Income, expenses and savings over the requested window.
///
/// Running sums start at the user's first entry, so a window that begins later
/// still shows the correct cumulative values.
///
/// # Errors
/// Returns `Error::InvalidDate` when `start` is not before `end`.
pub async fn get_savings_overview(
    db: &DatabaseConnection,
    user_id: i64,
    request: SavingsRequest,
) -> Result<SavingsOverview> {
    let (start, end) = month_range(request.start, request.end)?;
    let span = MonthSpan::new(start, end);

    let first_entry = match accounts::min_entry_start(db, user_id).await {
        Ok(date) => buckets::first_of_month(date),
        Err(Error::NoEntriesFound { .. }) => {
            return Ok(SavingsOverview {
                x_labels: Vec::new(),
                income: Vec::new(),
                expenses: Vec::new(),
                savings: Vec::new(),
                span,
            });
        }
        Err(err) => return Err(err),
    };

    // Phase one: compute from the earliest bucket that carries money
    let compute_start = first_entry.min(start);
    let labels = buckets::labels(
        compute_start,
        end,
        request.include_last_month,
        Granularity::Monthly,
    );
    let entries = accounts::get_account_entries(db, user_id).await?;
    let flow = accrual::cash_flow(&entries, &labels, Granularity::Monthly)?
        .accumulate(request.cumulative);

    // Phase two: cut the display window back to the requested start
    let skip = usize::try_from(buckets::diff_month(start, compute_start)).unwrap_or(0);
    let flow = flow.skip(skip);
    let x_labels = labels.into_iter().skip(skip).collect();

    let [income, expenses, savings] = [flow.income, flow.expenses, flow.savings]
        .map(|values| values.into_iter().map(round2).collect::<Vec<f64>>());
    Ok(SavingsOverview {
        x_labels,
        income,
        expenses,
        savings,
        span,
    })
}

/// Expenses of the month containing `today` against the months since the first entry.
pub async fn get_expenses_trend(
    db: &DatabaseConnection,
    user_id: i64,
    today: NaiveDate,
    config: OverviewConfig,
) -> Result<ExpensesTrend> {
    let current = buckets::first_of_month(today);
    let current_month_str = buckets::date_to_label(current, Granularity::Monthly);

    let first_entry = match accounts::min_entry_start(db, user_id).await {
        Ok(date) => buckets::first_of_month(date).min(current),
        Err(Error::NoEntriesFound { .. }) => {
            return Ok(ExpensesTrend {
                total: 0.0,
                current_month_str,
                current_month: current.month(),
                current_year: current.year(),
                message: "No entries found".to_string(),
                average_expenses_until_previous_month: 0.0,
                expenses_development_percentage: 0.0,
            });
        }
        Err(err) => return Err(err),
    };

    let entries =
        accounts::get_entries_overlapping(db, user_id, first_entry, month_end(current)?).await?;
    let labels = buckets::labels(first_entry, current, true, Granularity::Monthly);
    let flow = accrual::cash_flow(&entries, &labels, Granularity::Monthly)?;
    let Some((total, history)) = flow.expenses.split_last() else {
        return Err(Error::invalid_date(format!("no buckets up to {current}")));
    };

    let total = round2(*total);
    let average = trailing_average(history, config.min_trend_samples);
    let percentage = decrease_percentage(total, average);
    let direction = TrendDirection::from_decrease_percentage(percentage);

    Ok(ExpensesTrend {
        total,
        current_month_str,
        current_month: current.month(),
        current_year: current.year(),
        message: format!("Expenses are {}", direction.as_str()),
        average_expenses_until_previous_month: average,
        expenses_development_percentage: percentage,
    })
}

/// Net worth of `month` with its development against the months before it.
///
/// # Errors
/// * `Error::UserNotFound` if the user does not exist
/// * `Error::NoEntriesFound` if the user has no entries
pub async fn get_net_worth(
    db: &DatabaseConnection,
    user_id: i64,
    month: NaiveDate,
    config: OverviewConfig,
) -> Result<NetWorth> {
    users::ensure_user_exists(db, user_id).await?;
    let month = buckets::first_of_month(month);
    let first_entry = buckets::first_of_month(accounts::min_entry_start(db, user_id).await?);

    let entries = accounts::get_account_entries(db, user_id).await?;
    let labels = buckets::labels(first_entry.min(month), month, true, Granularity::Monthly);
    let nets = accrual::cash_flow(&entries, &labels, Granularity::Monthly)?.savings;

    let (current, history) = nets.split_last().map_or((0.0, &[][..]), |(c, h)| (*c, h));
    let average = trailing_average(history, config.min_trend_samples);
    let percentage = increase_percentage(current, average);
    // increase_percentage reads positive as growth
    let trend = TrendDirection::from_decrease_percentage(-percentage);

    Ok(NetWorth {
        month_str: buckets::date_to_label(month, Granularity::Monthly),
        month: month.month(),
        year: month.year(),
        net_worth: round2(current),
        accumulated_net_worth: round2(nets.iter().sum()),
        development_percentage: percentage,
        trend,
    })
}

/// Savings, expenses and income slices of one month, rounded to cents.
pub async fn get_month_summary(
    db: &DatabaseConnection,
    user_id: i64,
    month: NaiveDate,
    keep_zeros: bool,
) -> Result<Vec<LabeledValue>> {
    let month = buckets::first_of_month(month);
    let entries = accounts::get_entries_overlapping(db, user_id, month, month_end(month)?).await?;
    Ok(accrual::month_summary(&entries, month, keep_zeros)
        .into_iter()
        .map(|slice| LabeledValue {
            value: round2(slice.value),
            ..slice
        })
        .collect())
}

/// Expense magnitude per tag of one month, rounded to cents.
pub async fn get_month_expenses_by_tag(
    db: &DatabaseConnection,
    user_id: i64,
    month: NaiveDate,
) -> Result<Vec<LabeledValue>> {
    let month = buckets::first_of_month(month);
    let entries = accounts::get_entries_overlapping(db, user_id, month, month_end(month)?).await?;
    Ok(accrual::month_expenses_by_tag(&entries, month)
        .into_iter()
        .map(|slice| LabeledValue {
            value: round2(slice.value),
            ..slice
        })
        .collect())
}
