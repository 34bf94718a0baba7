//! Core module - Framework-agnostic business logic.
//!
//! Pure calculations (`buckets`, `series`, `accrual`, `meter`) never touch the
//! database. The store-backed modules (`users`, `accounts`, `energy`,
//! `overview`) take a `SeaORM` connection and a verified user id.

/// Accrual entry storage
pub mod accounts;
/// Spreading entries over buckets
pub mod accrual;
/// Date bucketing and axis labels
pub mod buckets;
/// Energy counter and reading storage
pub mod energy;
/// Reading chains and consumption cost
pub mod meter;
/// Dashboard payloads
pub mod overview;
/// Chart series and trend math
pub mod series;
/// User records
pub mod users;
