//! User entity - Owner of accrual entries and energy counters.
//!
//! Authentication is handled outside this crate; the row only carries the
//! identity fields the aggregation layer and the façade need.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// User database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// Unique identifier for the user
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Generated login name (e.g. `"jodo1"`)
    #[sea_orm(unique)]
    pub username: String,
    /// Contact address, unique per user
    #[sea_orm(unique)]
    pub email: String,
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// Set once the user confirmed their address
    pub verified: bool,
    /// When the user was created
    pub created_at: DateTimeUtc,
}

/// Defines relationships between User and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One user has many accrual entries
    #[sea_orm(has_many = "super::account_entry::Entity")]
    AccountEntries,
    /// One user has many energy counters
    #[sea_orm(has_many = "super::energy_counter::Entity")]
    EnergyCounters,
}

impl Related<super::account_entry::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AccountEntries.def()
    }
}

impl Related<super::energy_counter::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::EnergyCounters.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
