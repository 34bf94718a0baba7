//! Energy counter business logic - counters, readings and per-counter charts.
//!
//! The arithmetic lives in [`crate::core::meter`]; this module loads the chains
//! from the database, enforces ownership and writes inside transactions.

use crate::{
    core::{
        buckets,
        meter::{self, Frequency, Pricing, ReadingPoint},
        series::round2,
        users,
    },
    entities::{EnergyCounter, EnergyCounterReading, energy_counter, energy_counter_reading},
    errors::{Error, Result},
};
use chrono::{NaiveDate, Utc};
use sea_orm::{IntoActiveModel, QueryOrder, Set, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Fields of a counter as supplied by the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergyCounterInput {
    /// Database id chosen by the client
    pub id: String,
    /// Number printed on the meter
    pub counter_id: String,
    /// Kind of meter, e.g. "electricity"
    pub counter_type: String,
    /// Fixed fee per billing period
    pub base_price: f64,
    /// Price per unit
    pub price: f64,
    /// Unit of the readings, e.g. "kWh"
    pub energy_unit: String,
    /// One of `daily`, `monthly`, `yearly`
    pub frequency: String,
    /// Start of the contract
    pub start_date: NaiveDate,
    /// End of the contract, open when `None`
    pub end_date: Option<NaiveDate>,
    /// Meter value on `start_date`
    pub first_reading: f64,
}

/// A reading addressed by the meter's external number and type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadingInput {
    /// Client-chosen id, reused to update the reading
    pub id: String,
    /// External meter number
    pub counter_id: String,
    /// Kind of meter
    pub counter_type: String,
    /// Cumulative meter value
    pub reading: f64,
    /// Day the meter was read
    pub reading_date: NaiveDate,
}

/// A stored reading joined with the meter it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CounterReading {
    /// Reading id
    pub id: String,
    /// External meter number
    pub counter_id: String,
    /// Kind of meter
    pub counter_type: String,
    /// Cumulative meter value
    pub reading: f64,
    /// Day the meter was read
    pub reading_date: NaiveDate,
}

impl CounterReading {
    fn new(reading: energy_counter_reading::Model, counter: &energy_counter::Model) -> Self {
        Self {
            id: reading.id,
            counter_id: counter.counter_id.clone(),
            counter_type: counter.counter_type.clone(),
            reading: reading.reading,
            reading_date: reading.reading_date,
        }
    }
}

/// Monthly cost chart of a single counter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CounterOverview {
    /// Short legend label, e.g. `"ele-123"`
    pub label: String,
    /// External meter number
    pub counter_id: String,
    /// Kind of meter
    pub counter_type: String,
    /// First month of the chart
    pub start_date: NaiveDate,
    /// Last month of the chart
    pub end_date: NaiveDate,
    /// Month labels of the axis
    pub x_labels: Vec<String>,
    /// Cost per label, rounded to cents
    pub data: Vec<f64>,
}

/// Average consumption of a counter since its start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsumptionRate {
    /// External meter number
    pub counter_id: String,
    /// Unit of `per_day`
    pub energy_unit: String,
    /// Average units consumed per day
    pub per_day: f64,
    /// Start of the counter
    pub since: NaiveDate,
    /// Date of the latest reading
    pub until: NaiveDate,
}

/// Inserts or updates a counter owned by `user_id`.
///
/// # Errors
/// * `Error::EnergyCounterInvalidFrequency` for an unknown frequency
/// * `Error::UserNotFound` if the user does not exist
/// * `Error::InvalidDate` if `end_date` precedes `start_date`
/// * `Error::EnergyCounterInvalidReading` if `first_reading` is negative
/// * `Error::EntryNotFound` if the id belongs to another user
pub async fn add_energy_counter(
    db: &DatabaseConnection,
    user_id: i64,
    input: EnergyCounterInput,
) -> Result<energy_counter::Model> {
    let frequency: Frequency = input.frequency.parse()?;

    let txn = db.begin().await?;
    users::ensure_user_exists(&txn, user_id).await?;

    if input.end_date.is_some_and(|end| end < input.start_date) {
        return Err(Error::invalid_date(format!(
            "counter {} ends before it starts",
            input.counter_id
        )));
    }
    if input.first_reading < 0.0 || !input.first_reading.is_finite() {
        return Err(Error::EnergyCounterInvalidReading {
            reading: input.first_reading,
            previous: 0.0,
        });
    }

    let now = Utc::now();
    let existing = EnergyCounter::find_by_id(input.id.clone()).one(&txn).await?;
    let counter = match existing {
        Some(counter) if counter.user_id != user_id => {
            return Err(Error::EntryNotFound { id: input.id });
        }
        Some(counter) => {
            let mut active = counter.into_active_model();
            active.counter_id = Set(input.counter_id);
            active.counter_type = Set(input.counter_type);
            active.base_price = Set(input.base_price);
            active.price = Set(input.price);
            active.energy_unit = Set(input.energy_unit);
            active.frequency = Set(frequency);
            active.start_date = Set(input.start_date);
            active.end_date = Set(input.end_date);
            active.first_reading = Set(input.first_reading);
            active.updated_at = Set(now);
            active.update(&txn).await?
        }
        None => {
            energy_counter::ActiveModel {
                id: Set(input.id),
                user_id: Set(user_id),
                counter_id: Set(input.counter_id),
                counter_type: Set(input.counter_type),
                base_price: Set(input.base_price),
                price: Set(input.price),
                energy_unit: Set(input.energy_unit),
                frequency: Set(frequency),
                start_date: Set(input.start_date),
                end_date: Set(input.end_date),
                first_reading: Set(input.first_reading),
                created_at: Set(now),
                updated_at: Set(now),
            }
            .insert(&txn)
            .await?
        }
    };

    txn.commit().await?;
    info!(
        "Saved energy counter {} ({}) for user {user_id}",
        counter.id,
        counter.chart_label()
    );
    Ok(counter)
}

/// Looks up a counter by database id within the user's counters.
async fn find_counter<C>(db: &C, user_id: i64, counter_db_id: &str) -> Result<energy_counter::Model>
where
    C: ConnectionTrait,
{
    EnergyCounter::find_by_id(counter_db_id.to_string())
        .filter(energy_counter::Column::UserId.eq(user_id))
        .one(db)
        .await?
        .ok_or_else(|| Error::EnergyCounterNotFound {
            counter_id: counter_db_id.to_string(),
        })
}

/// Deletes a counter and all of its readings.
///
/// # Errors
/// Returns `Error::EntryNotFound` when no such counter belongs to the user.
pub async fn delete_energy_counter(
    db: &DatabaseConnection,
    user_id: i64,
    counter_db_id: &str,
) -> Result<energy_counter::Model> {
    let txn = db.begin().await?;
    let counter = find_counter(&txn, user_id, counter_db_id)
        .await
        .map_err(|err| match err {
            Error::EnergyCounterNotFound { .. } => Error::EntryNotFound {
                id: counter_db_id.to_string(),
            },
            other => other,
        })?;

    let readings = EnergyCounterReading::delete_many()
        .filter(energy_counter_reading::Column::CounterId.eq(counter.id.as_str()))
        .exec(&txn)
        .await?;
    EnergyCounter::delete_by_id(counter.id.clone()).exec(&txn).await?;
    txn.commit().await?;

    info!(
        "Deleted energy counter {} and {} readings",
        counter.id, readings.rows_affected
    );
    Ok(counter)
}

/// All counters of a user, ordered by type and meter number.
pub async fn get_energy_counters(
    db: &DatabaseConnection,
    user_id: i64,
) -> Result<Vec<energy_counter::Model>> {
    EnergyCounter::find()
        .filter(energy_counter::Column::UserId.eq(user_id))
        .order_by_asc(energy_counter::Column::CounterType)
        .order_by_asc(energy_counter::Column::CounterId)
        .all(db)
        .await
        .map_err(Into::into)
}

/// All readings of a user across counters, ordered by date.
pub async fn get_energy_counter_readings(
    db: &DatabaseConnection,
    user_id: i64,
) -> Result<Vec<CounterReading>> {
    let rows = EnergyCounterReading::find()
        .find_also_related(EnergyCounter)
        .filter(energy_counter::Column::UserId.eq(user_id))
        .order_by_asc(energy_counter_reading::Column::ReadingDate)
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .filter_map(|(reading, counter)| counter.map(|c| CounterReading::new(reading, &c)))
        .collect())
}

/// Most recent stored reading of a counter, optionally strictly before `before`.
async fn latest_reading<C>(
    db: &C,
    counter_db_id: &str,
    before: Option<NaiveDate>,
) -> Result<Option<energy_counter_reading::Model>>
where
    C: ConnectionTrait,
{
    let mut query = EnergyCounterReading::find()
        .filter(energy_counter_reading::Column::CounterId.eq(counter_db_id));
    if let Some(before) = before {
        query = query.filter(energy_counter_reading::Column::ReadingDate.lt(before));
    }
    query
        .order_by_desc(energy_counter_reading::Column::ReadingDate)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Inserts or updates a reading of the meter identified by number and type.
///
/// # Errors
/// * `Error::EnergyCounterNotFound` when the user has no such meter
/// * `Error::MultipleEntriesFound` when the number and type are ambiguous
/// * `Error::EnergyCounterInvalidReadingDate` / `Error::EnergyCounterInvalidReading`
///   when the reading breaks the chain ordering
/// * `Error::EntryNotFound` when the reading id belongs to another user
pub async fn add_energy_counter_reading(
    db: &DatabaseConnection,
    user_id: i64,
    input: ReadingInput,
) -> Result<CounterReading> {
    let txn = db.begin().await?;

    let mut counters = EnergyCounter::find()
        .filter(energy_counter::Column::UserId.eq(user_id))
        .filter(energy_counter::Column::CounterId.eq(input.counter_id.as_str()))
        .filter(energy_counter::Column::CounterType.eq(input.counter_type.as_str()))
        .all(&txn)
        .await?;
    let counter = match counters.len() {
        0 => {
            return Err(Error::EnergyCounterNotFound {
                counter_id: input.counter_id,
            });
        }
        1 => counters.remove(0),
        n => {
            warn!(
                "{n} counters share number {} and type {} for user {user_id}",
                input.counter_id, input.counter_type
            );
            return Err(Error::MultipleEntriesFound {
                what: format!("{} {}", input.counter_type, input.counter_id),
            });
        }
    };

    let latest = latest_reading(&txn, &counter.id, None)
        .await?
        .map(|r| ReadingPoint::from(&r));
    meter::validate_reading(
        &counter,
        latest.as_ref(),
        &input.id,
        input.reading,
        input.reading_date,
    )?;

    let now = Utc::now();
    let existing = EnergyCounterReading::find_by_id(input.id.clone())
        .one(&txn)
        .await?;
    let saved = match existing {
        Some(reading) => {
            if reading.counter_id != counter.id {
                find_counter(&txn, user_id, &reading.counter_id)
                    .await
                    .map_err(|err| match err {
                        Error::EnergyCounterNotFound { .. } => Error::EntryNotFound {
                            id: input.id.clone(),
                        },
                        other => other,
                    })?;
            }
            let mut active = reading.into_active_model();
            active.counter_id = Set(counter.id.clone());
            active.reading = Set(input.reading);
            active.reading_date = Set(input.reading_date);
            active.updated_at = Set(now);
            active.update(&txn).await?
        }
        None => {
            energy_counter_reading::ActiveModel {
                id: Set(input.id),
                counter_id: Set(counter.id.clone()),
                reading: Set(input.reading),
                reading_date: Set(input.reading_date),
                created_at: Set(now),
                updated_at: Set(now),
            }
            .insert(&txn)
            .await?
        }
    };

    txn.commit().await?;
    info!(
        "Saved reading {} of {} on {}",
        saved.id,
        counter.chart_label(),
        saved.reading_date
    );
    Ok(CounterReading::new(saved, &counter))
}

/// Deletes a reading that belongs to one of the user's counters.
///
/// # Errors
/// Returns `Error::EntryNotFound` when no such reading belongs to the user.
pub async fn delete_energy_counter_reading(
    db: &DatabaseConnection,
    user_id: i64,
    reading_id: &str,
) -> Result<CounterReading> {
    let txn = db.begin().await?;
    let (reading, counter) = EnergyCounterReading::find_by_id(reading_id.to_string())
        .find_also_related(EnergyCounter)
        .filter(energy_counter::Column::UserId.eq(user_id))
        .one(&txn)
        .await?
        .and_then(|(reading, counter)| counter.map(|c| (reading, c)))
        .ok_or_else(|| Error::EntryNotFound {
            id: reading_id.to_string(),
        })?;

    EnergyCounterReading::delete_by_id(reading.id.clone())
        .exec(&txn)
        .await?;
    txn.commit().await?;
    info!("Deleted reading {reading_id} of {}", counter.chart_label());
    Ok(CounterReading::new(reading, &counter))
}

/// Builds the monthly chart of one counter over `[start, end)` or `[start, end]`.
///
/// `start` and `end` must already be first-of-month dates with `start < end`.
pub async fn counter_overview(
    db: &DatabaseConnection,
    counter: &energy_counter::Model,
    start: NaiveDate,
    end: NaiveDate,
    include_last_month: bool,
) -> Result<CounterOverview> {
    counter.frequency.ensure_supported()?;
    let granularity = counter.frequency.granularity();

    let anchor = latest_reading(db, &counter.id, Some(start))
        .await?
        .map_or_else(|| meter::anchor(counter), |r| ReadingPoint::from(&r));

    let window_end = if include_last_month {
        buckets::add_months(end, 1)?
    } else {
        end
    };
    let window = EnergyCounterReading::find()
        .filter(energy_counter_reading::Column::CounterId.eq(counter.id.as_str()))
        .filter(energy_counter_reading::Column::ReadingDate.gte(start))
        .filter(energy_counter_reading::Column::ReadingDate.lt(window_end))
        .order_by_asc(energy_counter_reading::Column::ReadingDate)
        .all(db)
        .await?;

    let chain: Vec<ReadingPoint> = std::iter::once(anchor)
        .chain(window.iter().map(ReadingPoint::from))
        .collect();
    let x_labels = buckets::labels(start, end, include_last_month, granularity);
    let costs =
        meter::consumption_by_bucket(Pricing::from(counter), &chain, &x_labels, granularity)?;
    debug!(
        "Counter {} has {} readings in the window",
        counter.id,
        window.len()
    );

    Ok(CounterOverview {
        label: counter.chart_label(),
        counter_id: counter.counter_id.clone(),
        counter_type: counter.counter_type.clone(),
        start_date: start,
        end_date: end,
        x_labels,
        data: costs.into_iter().map(round2).collect(),
    })
}

/// Monthly cost chart of one counter.
///
/// Dates are normalized to the first of their month.
///
/// # Errors
/// * `Error::InvalidDate` when `start` is not before `end`
/// * `Error::EnergyCounterNotFound` when the user has no such counter
/// * `Error::FeatureNotImplemented` for non-monthly counters
pub async fn get_energy_consumption_overview_for_counter(
    db: &DatabaseConnection,
    user_id: i64,
    start: NaiveDate,
    end: NaiveDate,
    counter_db_id: &str,
    include_last_month: bool,
) -> Result<CounterOverview> {
    let start = buckets::first_of_month(start);
    let end = buckets::first_of_month(end);
    if start >= end {
        return Err(Error::invalid_date(format!(
            "start {start} is not before end {end}"
        )));
    }

    let counter = find_counter(db, user_id, counter_db_id).await?;
    counter_overview(db, &counter, start, end, include_last_month).await
}

/// Average daily consumption of a counter from its start to the last reading.
///
/// # Errors
/// * `Error::EnergyCounterNotFound` when the user has no such counter
/// * `Error::NotEnoughEnergyCounterReadings` when nothing was read yet
pub async fn get_consumption_rate(
    db: &DatabaseConnection,
    user_id: i64,
    counter_db_id: &str,
) -> Result<ConsumptionRate> {
    let counter = find_counter(db, user_id, counter_db_id).await?;
    let readings: Vec<ReadingPoint> = EnergyCounterReading::find()
        .filter(energy_counter_reading::Column::CounterId.eq(counter.id.as_str()))
        .order_by_asc(energy_counter_reading::Column::ReadingDate)
        .all(db)
        .await?
        .iter()
        .map(ReadingPoint::from)
        .collect();

    let per_day = meter::consumption_rate(&counter, &readings)?;
    let until = readings
        .last()
        .map_or(counter.start_date, |last| last.reading_date);

    Ok(ConsumptionRate {
        counter_id: counter.counter_id,
        energy_unit: counter.energy_unit,
        per_day: round2(per_day),
        since: counter.start_date,
        until,
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_add_energy_counter_rejects_bad_frequency() -> Result<()> {
        let db = setup_test_db().await?;
        let user = create_test_user(&db).await?;
        let mut input = counter_input("c1", "111111", date(2024, 1, 1), 0.0);
        input.frequency = "weekly".to_string();

        let err = add_energy_counter(&db, user.id, input).await.unwrap_err();
        assert!(matches!(err, Error::EnergyCounterInvalidFrequency { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_add_energy_counter_validation() -> Result<()> {
        let db = setup_test_db().await?;
        let user = create_test_user(&db).await?;

        let err = add_energy_counter(
            &db,
            user.id + 1,
            counter_input("c1", "111111", date(2024, 1, 1), 0.0),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::UserNotFound { .. }));

        let err = add_energy_counter(
            &db,
            user.id,
            counter_input("c1", "111111", date(2024, 1, 1), -1.0),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::EnergyCounterInvalidReading { .. }));

        let mut input = counter_input("c1", "111111", date(2024, 1, 1), 0.0);
        input.end_date = Some(date(2023, 1, 1));
        let err = add_energy_counter(&db, user.id, input).await.unwrap_err();
        assert!(matches!(err, Error::InvalidDate { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_add_energy_counter_upsert() -> Result<()> {
        let db = setup_test_db().await?;
        let user = create_test_user(&db).await?;
        create_test_counter(&db, user.id, "c1").await?;

        let mut input = counter_input("c1", "999999", date(2024, 1, 1), 0.0);
        input.price = 0.4;
        let updated = add_energy_counter(&db, user.id, input).await?;

        assert_eq!(updated.price, 0.4);
        assert_eq!(updated.counter_id, "999999");
        assert_eq!(get_energy_counters(&db, user.id).await?.len(), 1);

        let other = create_test_user(&db).await?;
        let err = add_energy_counter(
            &db,
            other.id,
            counter_input("c1", "1", date(2024, 1, 1), 0.0),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::EntryNotFound { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_reading_lookup_errors() -> Result<()> {
        let db = setup_test_db().await?;
        let user = create_test_user(&db).await?;

        let err = add_energy_counter_reading(
            &db,
            user.id,
            reading_input("r1", "123456", 10.0, date(2024, 2, 1)),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::EnergyCounterNotFound { .. }));

        // Two counters with the same number and type make the lookup ambiguous
        add_energy_counter(&db, user.id, counter_input("c1", "123456", date(2024, 1, 1), 0.0)).await?;
        add_energy_counter(&db, user.id, counter_input("c2", "123456", date(2024, 1, 1), 0.0)).await?;
        let err = add_energy_counter_reading(
            &db,
            user.id,
            reading_input("r1", "123456", 10.0, date(2024, 2, 1)),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::MultipleEntriesFound { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_reading_monotonicity() -> Result<()> {
        let db = setup_test_db().await?;
        let user = create_test_user(&db).await?;
        let counter = create_test_counter(&db, user.id, "c1").await?;
        create_test_reading(&db, user.id, &counter, "r1", 100.0, date(2024, 3, 1)).await?;

        let err = add_energy_counter_reading(
            &db,
            user.id,
            reading_input("r2", &counter.counter_id, 90.0, date(2024, 4, 1)),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::EnergyCounterInvalidReading { .. }));

        let err = add_energy_counter_reading(
            &db,
            user.id,
            reading_input("r2", &counter.counter_id, 150.0, date(2024, 2, 1)),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::EnergyCounterInvalidReadingDate { .. }));

        // Updating the latest reading in place is allowed
        let fixed = add_energy_counter_reading(
            &db,
            user.id,
            reading_input("r1", &counter.counter_id, 95.0, date(2024, 3, 2)),
        )
        .await?;
        assert_eq!(fixed.reading, 95.0);
        assert_eq!(get_energy_counter_readings(&db, user.id).await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_readings_are_listed_by_date_with_meter() -> Result<()> {
        let db = setup_test_db().await?;
        let user = create_test_user(&db).await?;
        let other = create_test_user(&db).await?;
        let gas = create_test_counter(&db, user.id, "gas").await?;
        let foreign = create_test_counter(&db, other.id, "foreign").await?;

        create_test_reading(&db, user.id, &gas, "g1", 1.0, date(2024, 1, 10)).await?;
        create_test_reading(&db, user.id, &gas, "g2", 2.0, date(2024, 2, 10)).await?;
        create_test_reading(&db, other.id, &foreign, "f1", 5.0, date(2024, 1, 5)).await?;

        let readings = get_energy_counter_readings(&db, user.id).await?;
        let ids: Vec<&str> = readings.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["g1", "g2"]);
        assert_eq!(readings[0].counter_id, gas.counter_id);
        assert_eq!(readings[0].counter_type, gas.counter_type);
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_counter_cascades_readings() -> Result<()> {
        let db = setup_test_db().await?;
        let user = create_test_user(&db).await?;
        let counter = create_test_counter(&db, user.id, "c1").await?;
        create_test_reading(&db, user.id, &counter, "r1", 10.0, date(2024, 2, 1)).await?;
        create_test_reading(&db, user.id, &counter, "r2", 20.0, date(2024, 3, 1)).await?;

        delete_energy_counter(&db, user.id, "c1").await?;

        assert!(get_energy_counters(&db, user.id).await?.is_empty());
        assert!(EnergyCounterReading::find().all(&db).await?.is_empty());

        let err = delete_energy_counter(&db, user.id, "c1").await.unwrap_err();
        assert!(matches!(err, Error::EntryNotFound { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_reading_checks_owner() -> Result<()> {
        let db = setup_test_db().await?;
        let owner = create_test_user(&db).await?;
        let intruder = create_test_user(&db).await?;
        let counter = create_test_counter(&db, owner.id, "c1").await?;
        create_test_reading(&db, owner.id, &counter, "r1", 10.0, date(2024, 2, 1)).await?;

        let err = delete_energy_counter_reading(&db, intruder.id, "r1")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::EntryNotFound { .. }));

        let deleted = delete_energy_counter_reading(&db, owner.id, "r1").await?;
        assert_eq!(deleted.counter_id, counter.counter_id);
        assert!(get_energy_counter_readings(&db, owner.id).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_counter_overview_pairs() -> Result<()> {
        let db = setup_test_db().await?;
        let user = create_test_user(&db).await?;
        // base price 5, unit price 2, first reading 0 on 2024-01-01
        let counter = create_test_counter(&db, user.id, "c1").await?;
        create_test_reading(&db, user.id, &counter, "r1", 100.0, date(2024, 1, 20)).await?;
        create_test_reading(&db, user.id, &counter, "r2", 150.0, date(2024, 2, 10)).await?;

        let overview = get_energy_consumption_overview_for_counter(
            &db,
            user.id,
            date(2024, 1, 1),
            date(2024, 3, 1),
            "c1",
            false,
        )
        .await?;

        assert_eq!(overview.x_labels, vec!["Jan 2024", "Feb 2024"]);
        assert_eq!(overview.data, vec![5.0 + 2.0 * 100.0, 105.0]);
        assert_eq!(overview.label, counter.chart_label());
        Ok(())
    }

    #[tokio::test]
    async fn test_counter_overview_anchor_before_window() -> Result<()> {
        let db = setup_test_db().await?;
        let user = create_test_user(&db).await?;
        let counter = create_test_counter(&db, user.id, "c1").await?;
        create_test_reading(&db, user.id, &counter, "r1", 100.0, date(2024, 1, 20)).await?;
        create_test_reading(&db, user.id, &counter, "r2", 150.0, date(2024, 2, 10)).await?;
        create_test_reading(&db, user.id, &counter, "r3", 160.0, date(2024, 3, 10)).await?;

        // The January reading anchors a window that starts in February
        let overview = get_energy_consumption_overview_for_counter(
            &db,
            user.id,
            date(2024, 2, 1),
            date(2024, 3, 15),
            "c1",
            true,
        )
        .await?;
        assert_eq!(overview.x_labels, vec!["Feb 2024", "Mar 2024"]);
        assert_eq!(overview.data, vec![105.0, 25.0]);
        Ok(())
    }

    #[tokio::test]
    async fn test_counter_overview_errors() -> Result<()> {
        let db = setup_test_db().await?;
        let user = create_test_user(&db).await?;

        let err = get_energy_consumption_overview_for_counter(
            &db,
            user.id,
            date(2024, 3, 5),
            date(2024, 3, 25),
            "c1",
            false,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::InvalidDate { .. }));

        let err = get_energy_consumption_overview_for_counter(
            &db,
            user.id,
            date(2024, 1, 1),
            date(2024, 3, 1),
            "missing",
            false,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::EnergyCounterNotFound { .. }));

        let mut input = counter_input("yearly", "222222", date(2024, 1, 1), 0.0);
        input.frequency = "yearly".to_string();
        add_energy_counter(&db, user.id, input).await?;
        let err = get_energy_consumption_overview_for_counter(
            &db,
            user.id,
            date(2024, 1, 1),
            date(2024, 3, 1),
            "yearly",
            false,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::FeatureNotImplemented { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_get_consumption_rate() -> Result<()> {
        let db = setup_test_db().await?;
        let user = create_test_user(&db).await?;
        let counter = create_test_counter(&db, user.id, "c1").await?;

        let err = get_consumption_rate(&db, user.id, "c1").await.unwrap_err();
        assert!(matches!(err, Error::NotEnoughEnergyCounterReadings { .. }));

        create_test_reading(&db, user.id, &counter, "r1", 31.0, date(2024, 2, 1)).await?;
        let rate = get_consumption_rate(&db, user.id, "c1").await?;
        assert_eq!(rate.per_day, 1.0);
        assert_eq!(rate.until, date(2024, 2, 1));
        Ok(())
    }
}
