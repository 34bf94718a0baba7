//! Energy counter reading entity - One cumulative meter value at a date.
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Energy counter reading database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "energy_counter_readings")]
pub struct Model {
    /// Identifier supplied by the client, used for idempotent upserts
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Database id of the owning counter
    pub counter_id: String,
    /// Cumulative meter value, never lower than an earlier reading
    pub reading: f64,
    /// Day the meter was read
    pub reading_date: Date,
    /// When the reading was first written
    pub created_at: DateTimeUtc,
    /// When the reading was last written
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between `EnergyCounterReading` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each reading belongs to one counter
    #[sea_orm(
        belongs_to = "super::energy_counter::Entity",
        from = "Column::CounterId",
        to = "super::energy_counter::Column::Id",
        on_delete = "Cascade"
    )]
    Counter,
}

impl Related<super::energy_counter::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Counter.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
