//! Account entry business logic - recurring income and expenses.
//!
//! Entries are written with an idempotent upsert keyed by the client supplied
//! id. `months_count` and `total_amount` are recomputed on every write.

use crate::{
    core::{accrual, users},
    entities::{AccountEntry, account_entry},
    errors::{Error, Result},
};
use chrono::{NaiveDate, Utc};
use sea_orm::{IntoActiveModel, QueryOrder, QuerySelect, Set, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Fields of an entry as supplied by the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountEntryInput {
    /// Client-chosen id, reused to update the entry
    pub id: String,
    /// First covered month
    pub start_date: NaiveDate,
    /// Last covered month (inclusive)
    pub end_date: NaiveDate,
    /// Signed amount per month
    pub amount: f64,
    /// Display name
    pub name: String,
    /// Category for the per-tag charts
    pub tag: String,
}

/// Inserts or updates an entry owned by `user_id`.
///
/// # Errors
/// * `Error::UserNotFound` if the user does not exist
/// * `Error::InvalidDate` if `end_date` precedes `start_date`
/// * `Error::InvalidAmount` if the amount is zero
/// * `Error::EntryNotFound` if the id belongs to another user
pub async fn add_account_entry(
    db: &DatabaseConnection,
    user_id: i64,
    input: AccountEntryInput,
) -> Result<account_entry::Model> {
    let txn = db.begin().await?;
    users::ensure_user_exists(&txn, user_id).await?;
    accrual::validate_entry(input.start_date, input.end_date, input.amount)?;

    let months_count = accrual::months_count(input.start_date, input.end_date);
    let total_amount = input.amount * f64::from(months_count);
    let now = Utc::now();

    let existing = AccountEntry::find_by_id(input.id.clone()).one(&txn).await?;
    let entry = match existing {
        Some(entry) if entry.user_id != user_id => {
            return Err(Error::EntryNotFound { id: input.id });
        }
        Some(entry) => {
            let mut active = entry.into_active_model();
            active.start_date = Set(input.start_date);
            active.end_date = Set(input.end_date);
            active.months_count = Set(months_count);
            active.amount = Set(input.amount);
            active.total_amount = Set(total_amount);
            active.name = Set(input.name);
            active.tag = Set(input.tag);
            active.updated_at = Set(now);
            active.update(&txn).await?
        }
        None => {
            account_entry::ActiveModel {
                id: Set(input.id),
                user_id: Set(user_id),
                start_date: Set(input.start_date),
                end_date: Set(input.end_date),
                months_count: Set(months_count),
                amount: Set(input.amount),
                total_amount: Set(total_amount),
                name: Set(input.name),
                tag: Set(input.tag),
                created_at: Set(now),
                updated_at: Set(now),
            }
            .insert(&txn)
            .await?
        }
    };

    txn.commit().await?;
    info!(
        "Saved account entry {} for user {user_id}: {} x {} months",
        entry.id, entry.amount, entry.months_count
    );
    Ok(entry)
}

/// Deletes an entry owned by `user_id` and returns it.
///
/// # Errors
/// Returns `Error::EntryNotFound` when no such entry belongs to the user.
pub async fn delete_account_entry(
    db: &DatabaseConnection,
    user_id: i64,
    entry_id: &str,
) -> Result<account_entry::Model> {
    let txn = db.begin().await?;
    let entry = AccountEntry::find_by_id(entry_id.to_string())
        .filter(account_entry::Column::UserId.eq(user_id))
        .one(&txn)
        .await?
        .ok_or_else(|| Error::EntryNotFound {
            id: entry_id.to_string(),
        })?;

    AccountEntry::delete_by_id(entry.id.clone()).exec(&txn).await?;
    txn.commit().await?;
    info!("Deleted account entry {entry_id} for user {user_id}");
    Ok(entry)
}

/// All entries of a user, ordered by start date.
pub async fn get_account_entries(
    db: &DatabaseConnection,
    user_id: i64,
) -> Result<Vec<account_entry::Model>> {
    AccountEntry::find()
        .filter(account_entry::Column::UserId.eq(user_id))
        .order_by_asc(account_entry::Column::StartDate)
        .order_by_asc(account_entry::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Entries of a user whose interval intersects `[start, end]`.
pub async fn get_entries_overlapping(
    db: &DatabaseConnection,
    user_id: i64,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<account_entry::Model>> {
    let entries = AccountEntry::find()
        .filter(account_entry::Column::UserId.eq(user_id))
        .filter(account_entry::Column::StartDate.lte(end))
        .filter(account_entry::Column::EndDate.gte(start))
        .order_by_asc(account_entry::Column::StartDate)
        .all(db)
        .await?;
    debug!(
        "Found {} entries for user {user_id} between {start} and {end}",
        entries.len()
    );
    Ok(entries)
}

/// Earliest start date over all entries of a user.
///
/// # Errors
/// Returns `Error::NoEntriesFound` when the user has no entries.
pub async fn min_entry_start(db: &DatabaseConnection, user_id: i64) -> Result<NaiveDate> {
    AccountEntry::find()
        .select_only()
        .column_as(account_entry::Column::StartDate.min(), "min_start")
        .filter(account_entry::Column::UserId.eq(user_id))
        .into_tuple::<Option<NaiveDate>>()
        .one(db)
        .await?
        .flatten()
        .ok_or(Error::NoEntriesFound { user_id })
}

/// Latest end date over all entries of a user.
///
/// # Errors
/// Returns `Error::NoEntriesFound` when the user has no entries.
pub async fn max_entry_end(db: &DatabaseConnection, user_id: i64) -> Result<NaiveDate> {
    AccountEntry::find()
        .select_only()
        .column_as(account_entry::Column::EndDate.max(), "max_end")
        .filter(account_entry::Column::UserId.eq(user_id))
        .into_tuple::<Option<NaiveDate>>()
        .one(db)
        .await?
        .flatten()
        .ok_or(Error::NoEntriesFound { user_id })
}

/// Sum of `total_amount` over all entries of a user, zero without entries.
pub async fn total_amount_sum(db: &DatabaseConnection, user_id: i64) -> Result<f64> {
    let sum = AccountEntry::find()
        .select_only()
        .column_as(account_entry::Column::TotalAmount.sum(), "total")
        .filter(account_entry::Column::UserId.eq(user_id))
        .into_tuple::<Option<f64>>()
        .one(db)
        .await?
        .flatten();
    Ok(sum.unwrap_or(0.0))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_add_account_entry_derives_totals() -> Result<()> {
        let db = setup_test_db().await?;
        let user = create_test_user(&db).await?;

        let entry = add_account_entry(
            &db,
            user.id,
            entry_input("e1", date(2024, 1, 15), date(2024, 3, 1), -100.0, "home"),
        )
        .await?;

        assert_eq!(entry.months_count, 3);
        assert_eq!(entry.total_amount, -300.0);
        assert!(!entry.is_income());
        Ok(())
    }

    #[tokio::test]
    async fn test_add_account_entry_upsert_is_idempotent() -> Result<()> {
        let db = setup_test_db().await?;
        let user = create_test_user(&db).await?;
        let input = entry_input("e1", date(2024, 1, 1), date(2024, 12, 31), 2000.0, "job");

        add_account_entry(&db, user.id, input.clone()).await?;
        add_account_entry(&db, user.id, input.clone()).await?;
        let entries = get_account_entries(&db, user.id).await?;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].total_amount, 24000.0);

        // Same id with new values updates in place
        let mut changed = input;
        changed.amount = 2500.0;
        changed.end_date = date(2024, 6, 30);
        let updated = add_account_entry(&db, user.id, changed).await?;
        assert_eq!(updated.months_count, 6);
        assert_eq!(updated.total_amount, 15000.0);
        assert_eq!(get_account_entries(&db, user.id).await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_add_account_entry_validation() -> Result<()> {
        let db = setup_test_db().await?;
        let user = create_test_user(&db).await?;

        let err = add_account_entry(
            &db,
            user.id + 100,
            entry_input("e1", date(2024, 1, 1), date(2024, 2, 1), -1.0, "x"),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::UserNotFound { .. }));

        let err = add_account_entry(
            &db,
            user.id,
            entry_input("e1", date(2024, 3, 1), date(2024, 2, 1), -1.0, "x"),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::InvalidDate { .. }));

        let err = add_account_entry(
            &db,
            user.id,
            entry_input("e1", date(2024, 1, 1), date(2024, 2, 1), 0.0, "x"),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::InvalidAmount { amount } if amount == 0.0));

        assert!(get_account_entries(&db, user.id).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_entry_of_other_user_is_not_found() -> Result<()> {
        let db = setup_test_db().await?;
        let owner = create_test_user(&db).await?;
        let intruder = create_test_user(&db).await?;
        create_test_entry(&db, owner.id, "e1", -10.0).await?;

        let err = add_account_entry(
            &db,
            intruder.id,
            entry_input("e1", date(2024, 1, 1), date(2024, 2, 1), -99.0, "x"),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::EntryNotFound { .. }));

        let err = delete_account_entry(&db, intruder.id, "e1").await.unwrap_err();
        assert!(matches!(err, Error::EntryNotFound { .. }));

        let kept = get_account_entries(&db, owner.id).await?;
        assert_eq!(kept[0].amount, -10.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_account_entry() -> Result<()> {
        let db = setup_test_db().await?;
        let user = create_test_user(&db).await?;
        create_test_entry(&db, user.id, "e1", -10.0).await?;

        let deleted = delete_account_entry(&db, user.id, "e1").await?;
        assert_eq!(deleted.id, "e1");
        assert!(get_account_entries(&db, user.id).await?.is_empty());

        let err = delete_account_entry(&db, user.id, "e1").await.unwrap_err();
        assert!(matches!(err, Error::EntryNotFound { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_aggregates() -> Result<()> {
        let db = setup_test_db().await?;
        let user = create_test_user(&db).await?;

        let err = min_entry_start(&db, user.id).await.unwrap_err();
        assert!(matches!(err, Error::NoEntriesFound { .. }));
        assert_eq!(total_amount_sum(&db, user.id).await?, 0.0);

        add_account_entry(
            &db,
            user.id,
            entry_input("a", date(2023, 5, 10), date(2023, 6, 1), -50.0, "x"),
        )
        .await?;
        add_account_entry(
            &db,
            user.id,
            entry_input("b", date(2024, 1, 1), date(2024, 12, 31), 10.0, "y"),
        )
        .await?;

        assert_eq!(min_entry_start(&db, user.id).await?, date(2023, 5, 10));
        assert_eq!(max_entry_end(&db, user.id).await?, date(2024, 12, 31));
        assert_eq!(total_amount_sum(&db, user.id).await?, -100.0 + 120.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_get_entries_overlapping() -> Result<()> {
        let db = setup_test_db().await?;
        let user = create_test_user(&db).await?;
        for (id, start, end) in [
            ("before", date(2023, 1, 1), date(2023, 12, 31)),
            ("inside", date(2024, 2, 1), date(2024, 2, 28)),
            ("spanning", date(2023, 6, 1), date(2025, 1, 1)),
            ("after", date(2024, 7, 1), date(2024, 8, 1)),
        ] {
            add_account_entry(&db, user.id, entry_input(id, start, end, -1.0, "t")).await?;
        }

        let found = get_entries_overlapping(&db, user.id, date(2024, 1, 1), date(2024, 6, 30)).await?;
        let ids: Vec<&str> = found.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["spanning", "inside"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_validation_fails_before_write() -> Result<()> {
        // Only the user lookup is answered; a write would exhaust the mock
        let user = crate::entities::user::Model {
            id: 1,
            username: "jodo1".to_string(),
            email: "john@example.com".to_string(),
            first_name: "John".to_string(),
            last_name: "Doe".to_string(),
            verified: true,
            created_at: Utc::now(),
        };
        let db = MockDatabase::new(DatabaseBackend::Sqlite)
            .append_query_results([vec![user]])
            .into_connection();

        let err = add_account_entry(
            &db,
            1,
            entry_input("e1", date(2024, 1, 1), date(2024, 1, 31), 0.0, "x"),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::InvalidAmount { .. }));
        Ok(())
    }
}
