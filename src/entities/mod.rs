//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

/// Recurring income and expenses
pub mod account_entry;
/// Utility meters
pub mod energy_counter;
/// Meter readings
pub mod energy_counter_reading;
/// Users
pub mod user;

// Re-export specific types to avoid conflicts
pub use account_entry::{
    Column as AccountEntryColumn, Entity as AccountEntry, Model as AccountEntryModel,
};
pub use energy_counter::{
    Column as EnergyCounterColumn, Entity as EnergyCounter, Frequency,
    Model as EnergyCounterModel,
};
pub use energy_counter_reading::{
    Column as EnergyCounterReadingColumn, Entity as EnergyCounterReading,
    Model as EnergyCounterReadingModel,
};
pub use user::{Column as UserColumn, Entity as User, Model as UserModel};
