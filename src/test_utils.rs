//! Shared test utilities for `HomeLedger`.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults.
#![allow(clippy::expect_used)]

use crate::{
    core::{
        accounts::{self, AccountEntryInput},
        energy::{self, CounterReading, EnergyCounterInput, ReadingInput},
        users,
    },
    entities,
    errors::Result,
};
use chrono::NaiveDate;
use sea_orm::DatabaseConnection;
use std::sync::atomic::{AtomicU32, Ordering};
use tracing_subscriber::EnvFilter;

static NEXT_USER: AtomicU32 = AtomicU32::new(1);

/// Routes tracing output through the test harness; later calls are no-ops.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    init_test_tracing();
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Shorthand for a calendar date in tests.
#[must_use]
pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid test date")
}

/// Creates a user with a unique email address.
pub async fn create_test_user(db: &DatabaseConnection) -> Result<entities::user::Model> {
    let n = NEXT_USER.fetch_add(1, Ordering::Relaxed);
    users::create_user(db, "John", "Doe", &format!("john{n}@example.com")).await
}

/// Entry input with the given fields and a name equal to the id.
#[must_use]
pub fn entry_input(
    id: &str,
    start_date: NaiveDate,
    end_date: NaiveDate,
    amount: f64,
    tag: &str,
) -> AccountEntryInput {
    AccountEntryInput {
        id: id.to_string(),
        start_date,
        end_date,
        amount,
        name: id.to_string(),
        tag: tag.to_string(),
    }
}

/// Creates an entry covering every month of 2024.
///
/// # Defaults
/// * tag: "general"
pub async fn create_test_entry(
    db: &DatabaseConnection,
    user_id: i64,
    id: &str,
    amount: f64,
) -> Result<entities::account_entry::Model> {
    accounts::add_account_entry(
        db,
        user_id,
        entry_input(id, date(2024, 1, 1), date(2024, 12, 31), amount, "general"),
    )
    .await
}

/// Counter input with the test price model.
///
/// # Defaults
/// * `counter_type`: "electricity"
/// * `base_price`: 5.0, `price`: 2.0
/// * frequency: "monthly", open ended
#[must_use]
pub fn counter_input(
    id: &str,
    counter_id: &str,
    start_date: NaiveDate,
    first_reading: f64,
) -> EnergyCounterInput {
    EnergyCounterInput {
        id: id.to_string(),
        counter_id: counter_id.to_string(),
        counter_type: "electricity".to_string(),
        base_price: 5.0,
        price: 2.0,
        energy_unit: "kWh".to_string(),
        frequency: "monthly".to_string(),
        start_date,
        end_date: None,
        first_reading,
    }
}

/// Creates a monthly counter starting 2024-01-01 at reading 0.
///
/// The meter number is derived from `id` so several test counters of one
/// user stay distinguishable.
pub async fn create_test_counter(
    db: &DatabaseConnection,
    user_id: i64,
    id: &str,
) -> Result<entities::energy_counter::Model> {
    energy::add_energy_counter(
        db,
        user_id,
        counter_input(id, &format!("{id}-4711"), date(2024, 1, 1), 0.0),
    )
    .await
}

/// Reading input for an electricity meter.
#[must_use]
pub fn reading_input(id: &str, counter_id: &str, reading: f64, reading_date: NaiveDate) -> ReadingInput {
    ReadingInput {
        id: id.to_string(),
        counter_id: counter_id.to_string(),
        counter_type: "electricity".to_string(),
        reading,
        reading_date,
    }
}

/// Adds a reading to `counter` through the validated write path.
pub async fn create_test_reading(
    db: &DatabaseConnection,
    user_id: i64,
    counter: &entities::energy_counter::Model,
    id: &str,
    reading: f64,
    reading_date: NaiveDate,
) -> Result<CounterReading> {
    let input = ReadingInput {
        counter_type: counter.counter_type.clone(),
        ..reading_input(id, &counter.counter_id, reading, reading_date)
    };
    energy::add_energy_counter_reading(db, user_id, input).await
}
