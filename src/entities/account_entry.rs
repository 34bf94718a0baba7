//! Account entry entity - A recurring income or expense valid over a month range.
//!
//! The entry's `amount` is charged once per covered month. `months_count` and
//! `total_amount` are derived on every write and stored for the listing views.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Account entry database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "account_entries")]
pub struct Model {
    /// Identifier supplied by the client, used for idempotent upserts
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Owning user
    pub user_id: i64,
    /// First month the entry applies to
    pub start_date: Date,
    /// Last month the entry applies to (inclusive)
    pub end_date: Date,
    /// Number of covered months, `diff_month(end, start) + 1`
    pub months_count: i32,
    /// Signed amount per month (positive for income, negative for expenses)
    pub amount: f64,
    /// `amount * months_count`
    pub total_amount: f64,
    /// Display name (e.g. "Rent")
    pub name: String,
    /// Free-text category used for the per-tag charts
    pub tag: String,
    /// When the entry was first written
    pub created_at: DateTimeUtc,
    /// When the entry was last written
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between `AccountEntry` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each entry belongs to one user
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Model {
    /// Whether the entry adds money (income) rather than spending it.
    #[must_use]
    pub fn is_income(&self) -> bool {
        self.amount > 0.0
    }
}

impl ActiveModelBehavior for ActiveModel {}
