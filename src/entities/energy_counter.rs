//! Energy counter entity - A billable utility meter with a price model.
//!
//! Readings are stored in `energy_counter_readings` and removed together
//! with their counter.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Billing frequency of a counter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    /// Billed per day
    #[sea_orm(string_value = "daily")]
    Daily,
    /// Billed per month
    #[sea_orm(string_value = "monthly")]
    Monthly,
    /// Billed per year
    #[sea_orm(string_value = "yearly")]
    Yearly,
}

/// Energy counter database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "energy_counters")]
pub struct Model {
    /// Database identifier supplied by the client
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Owning user
    pub user_id: i64,
    /// Number printed on the physical meter
    pub counter_id: String,
    /// Kind of meter (e.g. "electricity", "gas", "water")
    pub counter_type: String,
    /// Fixed fee charged per billing period
    pub base_price: f64,
    /// Price per consumed unit
    pub price: f64,
    /// Unit of the readings (e.g. "kWh")
    pub energy_unit: String,
    /// Billing period
    pub frequency: Frequency,
    /// Date the meter was installed or the contract started
    pub start_date: Date,
    /// Date the contract ended, if any
    pub end_date: Option<Date>,
    /// Meter value on `start_date`
    pub first_reading: f64,
    /// When the counter was first written
    pub created_at: DateTimeUtc,
    /// When the counter was last written
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between `EnergyCounter` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each counter belongs to one user
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
    /// One counter has many readings
    #[sea_orm(has_many = "super::energy_counter_reading::Entity")]
    Readings,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::energy_counter_reading::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Readings.def()
    }
}

impl Model {
    /// Short series label used in charts, e.g. `"ele-123"`.
    #[must_use]
    pub fn chart_label(&self) -> String {
        let kind: String = self.counter_type.chars().take(3).collect();
        let number: String = self.counter_id.chars().take(3).collect();
        format!("{kind}-{number}")
    }
}

impl ActiveModelBehavior for ActiveModel {}
