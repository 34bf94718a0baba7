//! Chart primitives shared by the aggregation functions.
//!
//! Every chart is a list of [`ChartSeries`] aligned to one label axis. Values are
//! accumulated at full precision and only rounded to cents when a payload is
//! assembled.

use serde::{Deserialize, Serialize};

/// Label of the synthesized sum series.
pub const TOTAL_LABEL: &str = "Total";

/// One named series of a chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    /// Legend label
    pub label: String,
    /// One value per axis label
    pub data: Vec<f64>,
}

impl ChartSeries {
    /// Series with the given legend label and values.
    #[must_use]
    pub fn new(label: impl Into<String>, data: Vec<f64>) -> Self {
        Self {
            label: label.into(),
            data,
        }
    }

    /// Copy of the series with every value rounded to cents.
    #[must_use]
    pub fn rounded(mut self) -> Self {
        self.data = self.data.into_iter().map(round2).collect();
        self
    }
}

/// A single labelled number, used by the pie and summary views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledValue {
    /// Position in the view
    pub id: usize,
    /// The number shown
    pub value: f64,
    /// Legend label
    pub label: String,
}

/// Rounds to two decimal places.
#[must_use]
pub fn round2(value: f64) -> f64 {
    let rounded = (value * 100.0).round() / 100.0;
    // avoid "-0.0" in payloads
    if rounded == 0.0 { 0.0 } else { rounded }
}

/// Running sum of `values`.
#[must_use]
pub fn cumulative(values: &[f64]) -> Vec<f64> {
    values
        .iter()
        .scan(0.0, |acc, value| {
            *acc += value;
            Some(*acc)
        })
        .collect()
}

/// Element-wise sum of all series over an axis of `len` buckets.
#[must_use]
pub fn elementwise_total(series: &[ChartSeries], len: usize) -> Vec<f64> {
    let mut total = vec![0.0; len];
    for s in series {
        for (slot, value) in total.iter_mut().zip(&s.data) {
            *slot += value;
        }
    }
    total
}

/// Appends the rounded [`TOTAL_LABEL`] series.
#[must_use]
pub fn with_total(mut series: Vec<ChartSeries>, len: usize) -> Vec<ChartSeries> {
    let total = elementwise_total(&series, len);
    series.push(ChartSeries::new(TOTAL_LABEL, total).rounded());
    series
}

/// Arithmetic mean, `None` for an empty slice.
#[must_use]
#[allow(clippy::cast_precision_loss)] // axis lengths are a few hundred buckets
pub fn average(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Direction of a value compared with its trailing average.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    /// Below the average
    Decreasing,
    /// Equal to the average
    Stable,
    /// Above the average
    Increasing,
}

impl TrendDirection {
    /// Direction for a percentage where positive means "went down".
    #[must_use]
    pub fn from_decrease_percentage(percentage: f64) -> Self {
        if percentage > 0.0 {
            Self::Decreasing
        } else if percentage < 0.0 {
            Self::Increasing
        } else {
            Self::Stable
        }
    }

    /// Lower-case word for messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Decreasing => "decreasing",
            Self::Stable => "stable",
            Self::Increasing => "increasing",
        }
    }
}

/// Percentage by which `current` is below `average`.
///
/// Positive when consumption or spending went down, negative when it went up,
/// zero when the average is zero.
#[must_use]
pub fn decrease_percentage(current: f64, average: f64) -> f64 {
    if average == 0.0 {
        return 0.0;
    }
    round2(-((current - average) / average) * 100.0)
}

/// Percentage by which `current` is above `average`, relative to the average's magnitude.
#[must_use]
pub fn increase_percentage(current: f64, average: f64) -> f64 {
    if average == 0.0 {
        return 0.0;
    }
    round2((current - average) / average.abs() * 100.0)
}
