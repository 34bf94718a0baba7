//! User business logic - creation, lookup, verification and cascading removal.
//!
//! Authentication lives outside this crate. Every other core module receives an
//! already verified `user_id` and uses [`ensure_user_exists`] to resolve it.

use crate::{
    entities::{
        AccountEntry, EnergyCounter, EnergyCounterReading, User, account_entry, energy_counter,
        energy_counter_reading, user,
    },
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{IntoActiveModel, QuerySelect, Set, TransactionTrait, prelude::*};
use tracing::info;

/// Builds a login name from the first two letters of each name and a sequence number.
#[must_use]
pub fn generate_username(first_name: &str, last_name: &str, sequence: i64) -> String {
    let prefix: String = first_name
        .trim()
        .chars()
        .take(2)
        .chain(last_name.trim().chars().take(2))
        .collect();
    format!("{}{sequence}", prefix.to_lowercase())
}

/// Creates a new, unverified user.
///
/// The username is derived from the names and the next free id, e.g.
/// `"jodo1"` for the first "John Doe".
pub async fn create_user(
    db: &DatabaseConnection,
    first_name: &str,
    last_name: &str,
    email: &str,
) -> Result<user::Model> {
    let txn = db.begin().await?;

    let last_id = User::find()
        .select_only()
        .column_as(user::Column::Id.max(), "max_id")
        .into_tuple::<Option<i64>>()
        .one(&txn)
        .await?
        .flatten()
        .unwrap_or(0);

    let user = user::ActiveModel {
        username: Set(generate_username(first_name, last_name, last_id + 1)),
        email: Set(email.trim().to_string()),
        first_name: Set(first_name.trim().to_string()),
        last_name: Set(last_name.trim().to_string()),
        verified: Set(false),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;
    info!("Created user {} ({})", user.id, user.username);
    Ok(user)
}

/// Finds a user by id, returning None if it does not exist.
pub async fn get_user(db: &DatabaseConnection, user_id: i64) -> Result<Option<user::Model>> {
    User::find_by_id(user_id).one(db).await.map_err(Into::into)
}

/// Resolves `user_id` or fails with `Error::UserNotFound`.
///
/// Generic over the connection so writes can check ownership inside their
/// transaction.
pub async fn ensure_user_exists<C>(db: &C, user_id: i64) -> Result<user::Model>
where
    C: ConnectionTrait,
{
    User::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or(Error::UserNotFound { user_id })
}

/// Marks the user's address as confirmed.
pub async fn verify_user(db: &DatabaseConnection, user_id: i64) -> Result<user::Model> {
    let mut active = ensure_user_exists(db, user_id).await?.into_active_model();
    active.verified = Set(true);
    let user = active.update(db).await?;
    info!("Verified user {user_id}");
    Ok(user)
}

/// Deletes a user together with all entries, counters and readings.
///
/// Children are removed before their parents inside one transaction, so
/// either everything is gone or nothing changed.
pub async fn delete_user(db: &DatabaseConnection, user_id: i64) -> Result<()> {
    let txn = db.begin().await?;
    ensure_user_exists(&txn, user_id).await?;

    let counter_ids: Vec<String> = EnergyCounter::find()
        .select_only()
        .column(energy_counter::Column::Id)
        .filter(energy_counter::Column::UserId.eq(user_id))
        .into_tuple()
        .all(&txn)
        .await?;

    let readings = EnergyCounterReading::delete_many()
        .filter(energy_counter_reading::Column::CounterId.is_in(counter_ids))
        .exec(&txn)
        .await?;
    let counters = EnergyCounter::delete_many()
        .filter(energy_counter::Column::UserId.eq(user_id))
        .exec(&txn)
        .await?;
    let entries = AccountEntry::delete_many()
        .filter(account_entry::Column::UserId.eq(user_id))
        .exec(&txn)
        .await?;
    User::delete_by_id(user_id).exec(&txn).await?;

    txn.commit().await?;
    info!(
        "Deleted user {user_id} with {} entries, {} counters and {} readings",
        entries.rows_affected, counters.rows_affected, readings.rows_affected
    );
    Ok(())
}
