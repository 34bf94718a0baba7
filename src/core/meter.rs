//! Meter consumption - turns cumulative readings into per-bucket cost.
//!
//! Readings of one counter, ordered by date, form a chain. Each consecutive pair
//! is billed as `base_price + unit_price * (later - earlier)` in the month of the
//! later reading. A counter without an earlier reading starts its chain at a
//! virtual point `(first_reading, start_date)`.

use crate::{
    core::buckets::{self, Granularity},
    entities::{energy_counter, energy_counter_reading},
    errors::{Error, Result},
};
use chrono::NaiveDate;
use std::{collections::HashMap, str::FromStr};

pub use crate::entities::energy_counter::Frequency;

impl Frequency {
    /// Lower-case name as stored in the database.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
        }
    }

    /// Bucket size matching the billing frequency.
    #[must_use]
    pub const fn granularity(self) -> Granularity {
        match self {
            Self::Daily => Granularity::Daily,
            Self::Monthly => Granularity::Monthly,
            Self::Yearly => Granularity::Yearly,
        }
    }

    /// Only monthly billing has an overview implementation.
    ///
    /// # Errors
    /// Returns `Error::FeatureNotImplemented` for daily and yearly counters.
    pub fn ensure_supported(self) -> Result<()> {
        match self {
            Self::Monthly => Ok(()),
            Self::Daily | Self::Yearly => Err(Error::FeatureNotImplemented {
                feature: format!("{} energy counter overview", self.as_str()),
            }),
        }
    }
}

impl FromStr for Frequency {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "daily" => Ok(Self::Daily),
            "monthly" => Ok(Self::Monthly),
            "yearly" => Ok(Self::Yearly),
            other => Err(Error::EnergyCounterInvalidFrequency {
                frequency: other.to_string(),
            }),
        }
    }
}

/// Price model of a counter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pricing {
    /// Fixed fee per billed pair
    pub base_price: f64,
    /// Price per consumed unit
    pub unit_price: f64,
}

impl Pricing {
    /// Cost of going from reading `from` to reading `to`.
    #[must_use]
    pub fn cost(&self, from: f64, to: f64) -> f64 {
        self.unit_price.mul_add(to - from, self.base_price)
    }
}

impl From<&energy_counter::Model> for Pricing {
    fn from(counter: &energy_counter::Model) -> Self {
        Self {
            base_price: counter.base_price,
            unit_price: counter.price,
        }
    }
}

/// One link of a reading chain.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadingPoint {
    /// Stored reading id, `None` for the virtual anchor
    pub id: Option<String>,
    /// Cumulative meter value
    pub reading: f64,
    /// Day the meter was read
    pub reading_date: NaiveDate,
}

impl From<&energy_counter_reading::Model> for ReadingPoint {
    fn from(reading: &energy_counter_reading::Model) -> Self {
        Self {
            id: Some(reading.id.clone()),
            reading: reading.reading,
            reading_date: reading.reading_date,
        }
    }
}

/// The virtual first reading of a counter.
#[must_use]
pub fn anchor(counter: &energy_counter::Model) -> ReadingPoint {
    ReadingPoint {
        id: None,
        reading: counter.first_reading,
        reading_date: counter.start_date,
    }
}

/// Cost per label of an axis of the given granularity.
///
/// `chain` must be ordered by date. Pairs whose later reading falls outside the
/// axis are ignored, several pairs ending in the same bucket are summed.
///
/// # Errors
/// Returns `Error::InvalidDate` when a label cannot be parsed.
pub fn consumption_by_bucket(
    pricing: Pricing,
    chain: &[ReadingPoint],
    labels: &[String],
    granularity: Granularity,
) -> Result<Vec<f64>> {
    let index: HashMap<NaiveDate, usize> = buckets::labels_to_dates(labels, granularity)?
        .into_iter()
        .enumerate()
        .map(|(i, date)| (date, i))
        .collect();

    let mut costs = vec![0.0; labels.len()];
    for pair in chain.windows(2) {
        let (earlier, later) = (&pair[0], &pair[1]);
        let bucket = buckets::period_start(later.reading_date, granularity);
        if let Some(&slot) = index.get(&bucket) {
            costs[slot] += pricing.cost(earlier.reading, later.reading);
        }
    }
    Ok(costs)
}

/// Checks a reading before it is written.
///
/// `latest` is the most recent stored reading of the counter; without one the
/// anchor takes its place. The ordering checks are skipped when `entry_id`
/// rewrites that latest reading in place.
///
/// # Errors
/// Returns `Error::EnergyCounterInvalidReadingDate` when the date is outside the
/// counter's range or not after the latest reading, and
/// `Error::EnergyCounterInvalidReading` when the value is below it.
pub fn validate_reading(
    counter: &energy_counter::Model,
    latest: Option<&ReadingPoint>,
    entry_id: &str,
    reading: f64,
    reading_date: NaiveDate,
) -> Result<()> {
    let invalid_date = || Error::EnergyCounterInvalidReadingDate {
        counter_id: counter.counter_id.clone(),
        date: reading_date,
    };

    let after_end = counter.end_date.is_some_and(|end| reading_date > end);
    if reading_date < counter.start_date || after_end {
        return Err(invalid_date());
    }

    let previous = latest.cloned().unwrap_or_else(|| anchor(counter));
    if previous.id.as_deref() == Some(entry_id) {
        return Ok(());
    }
    if reading_date <= previous.reading_date {
        return Err(invalid_date());
    }
    if reading < previous.reading || !reading.is_finite() {
        return Err(Error::EnergyCounterInvalidReading {
            reading,
            previous: previous.reading,
        });
    }
    Ok(())
}

/// Average units consumed per day from the anchor to the last stored reading.
///
/// # Errors
/// Returns `Error::NotEnoughEnergyCounterReadings` when no stored reading lies
/// after the counter's start.
#[allow(clippy::cast_precision_loss)] // day counts stay far below 2^52
pub fn consumption_rate(counter: &energy_counter::Model, readings: &[ReadingPoint]) -> Result<f64> {
    let first = anchor(counter);
    let days = readings
        .last()
        .map(|last| (last, buckets::diff_day(last.reading_date, first.reading_date)))
        .filter(|(_, days)| *days > 0);

    match days {
        Some((last, days)) => Ok((last.reading - first.reading) / days as f64),
        None => Err(Error::NotEnoughEnergyCounterReadings {
            counter_id: counter.counter_id.clone(),
        }),
    }
}
