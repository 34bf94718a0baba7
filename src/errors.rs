//! Unified error types and result handling.
//!
//! Every business condition a caller can react to has its own variant and maps
//! to one symbolic [`ErrorCode`]. Storage, configuration and I/O faults are kept
//! as separate variants so they can be logged with detail, but they all surface
//! to callers as [`ErrorCode::InternalError`].

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

/// Symbolic error codes consumed by the HTTP layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// The referenced user id does not resolve
    UserNotFound,
    /// The referenced record does not exist or belongs to another user
    EntryNotFound,
    /// An aggregate needs at least one entry and there is none
    NoEntriesFound,
    /// Date range is empty or reversed, or a label could not be parsed
    InvalidDate,
    /// Zero or non-finite amount
    InvalidAmount,
    /// A lookup that must be unique matched several records
    MultipleEntriesFound,
    /// No energy counter matches the lookup
    EnergyCounterNotFound,
    /// Frequency is not one of `daily`, `monthly`, `yearly`
    EnergyCounterInvalidFrequency,
    /// Reading date outside the counter range or not after the latest reading
    EnergyCounterInvalidReadingDate,
    /// Reading value lower than the latest reading
    EnergyCounterInvalidReading,
    /// Valid input whose processing is not supported yet
    FeatureNotImplemented,
    /// Computation needs more readings than the counter has
    NotEnoughEnergyCounterReadings,
    /// Storage, configuration or I/O fault
    InternalError,
}

impl ErrorCode {
    /// Human readable message sent alongside the code.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::UserNotFound => "User not found",
            Self::EntryNotFound => "Entry not found",
            Self::NoEntriesFound => "No entries found",
            Self::InvalidDate => "Invalid date",
            Self::InvalidAmount => "Invalid amount",
            Self::MultipleEntriesFound => "Multiple entries found",
            Self::EnergyCounterNotFound => "Energy counter not found",
            Self::EnergyCounterInvalidFrequency => "Invalid energy counter frequency",
            Self::EnergyCounterInvalidReadingDate => "Invalid energy counter reading date",
            Self::EnergyCounterInvalidReading => "Invalid energy counter reading",
            Self::FeatureNotImplemented => "Feature not implemented",
            Self::NotEnoughEnergyCounterReadings => "Not enough energy counter readings",
            Self::InternalError => "Internal error",
        }
    }
}

/// Every failure a core operation can report.
#[derive(Debug, Error)]
pub enum Error {
    /// No user with this id
    #[error("User not found: {user_id}")]
    UserNotFound {
        /// Requested user id
        user_id: i64,
    },

    /// Missing record, or one owned by another user
    #[error("Entry not found: {id}")]
    EntryNotFound {
        /// Requested record id
        id: String,
    },

    /// The user has no account entries
    #[error("No entries found for user {user_id}")]
    NoEntriesFound {
        /// Owner that was queried
        user_id: i64,
    },

    /// Reversed or empty range, or an unparsable label
    #[error("Invalid date: {message}")]
    InvalidDate {
        /// What was wrong with the date
        message: String,
    },

    /// Zero or non-finite amount
    #[error("Invalid amount: {amount}")]
    InvalidAmount {
        /// Rejected amount
        amount: f64,
    },

    /// A unique lookup matched several records
    #[error("Multiple entries found for {what}")]
    MultipleEntriesFound {
        /// Description of the lookup
        what: String,
    },

    /// No energy counter matches
    #[error("Energy counter not found: {counter_id}")]
    EnergyCounterNotFound {
        /// Requested counter id
        counter_id: String,
    },

    /// Unknown billing frequency
    #[error("Invalid energy counter frequency: {frequency}")]
    EnergyCounterInvalidFrequency {
        /// Rejected value
        frequency: String,
    },

    /// Reading date outside the counter range or not after the latest reading
    #[error("Invalid reading date {date} for counter {counter_id}")]
    EnergyCounterInvalidReadingDate {
        /// Counter the reading was written to
        counter_id: String,
        /// Rejected date
        date: NaiveDate,
    },

    /// Reading lower than the latest reading
    #[error("Reading {reading} is lower than the previous reading {previous}")]
    EnergyCounterInvalidReading {
        /// Rejected value
        reading: f64,
        /// Latest stored value
        previous: f64,
    },

    /// Valid input that cannot be processed yet
    #[error("Feature not implemented: {feature}")]
    FeatureNotImplemented {
        /// What was asked for
        feature: String,
    },

    /// Too few readings for the computation
    #[error("Counter {counter_id} does not have enough readings")]
    NotEnoughEnergyCounterReadings {
        /// Counter that was queried
        counter_id: String,
    },

    /// Unreadable or malformed settings
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong
        message: String,
    },

    /// Bad command line arguments
    #[error("Invalid command line: {message}")]
    Usage {
        /// Expected usage
        message: String,
    },

    /// A payload could not be turned into JSON
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Storage fault
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// File system fault
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Environment variable missing or not unicode
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),
}

impl Error {
    /// Maps the error to the symbolic code callers see.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::UserNotFound { .. } => ErrorCode::UserNotFound,
            Self::EntryNotFound { .. } => ErrorCode::EntryNotFound,
            Self::NoEntriesFound { .. } => ErrorCode::NoEntriesFound,
            Self::InvalidDate { .. } => ErrorCode::InvalidDate,
            Self::InvalidAmount { .. } => ErrorCode::InvalidAmount,
            Self::MultipleEntriesFound { .. } => ErrorCode::MultipleEntriesFound,
            Self::EnergyCounterNotFound { .. } => ErrorCode::EnergyCounterNotFound,
            Self::EnergyCounterInvalidFrequency { .. } => {
                ErrorCode::EnergyCounterInvalidFrequency
            }
            Self::EnergyCounterInvalidReadingDate { .. } => {
                ErrorCode::EnergyCounterInvalidReadingDate
            }
            Self::EnergyCounterInvalidReading { .. } => ErrorCode::EnergyCounterInvalidReading,
            Self::FeatureNotImplemented { .. } => ErrorCode::FeatureNotImplemented,
            Self::NotEnoughEnergyCounterReadings { .. } => {
                ErrorCode::NotEnoughEnergyCounterReadings
            }
            Self::Config { .. }
            | Self::Usage { .. }
            | Self::Serialization(_)
            | Self::Database(_)
            | Self::Io(_)
            | Self::EnvVar(_) => ErrorCode::InternalError,
        }
    }

    /// Shorthand for an [`Error::InvalidDate`] with a formatted message.
    pub fn invalid_date(message: impl Into<String>) -> Self {
        Self::InvalidDate {
            message: message.into(),
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_faults_are_internal() {
        let err = Error::Database(sea_orm::DbErr::Custom("boom".to_string()));
        assert_eq!(err.code(), ErrorCode::InternalError);

        let err = Error::Config {
            message: "missing".to_string(),
        };
        assert_eq!(err.code(), ErrorCode::InternalError);

        let err = Error::from(serde_json::from_str::<u32>("nope").unwrap_err());
        assert!(matches!(err, Error::Serialization(_)));
        assert_eq!(err.code(), ErrorCode::InternalError);
    }

    #[test]
    fn test_code_serializes_screaming_snake_case() {
        let json = serde_json::to_string(&ErrorCode::EnergyCounterInvalidReadingDate).unwrap();
        assert_eq!(json, "\"ENERGY_COUNTER_INVALID_READING_DATE\"");
        let json = serde_json::to_string(&ErrorCode::NotEnoughEnergyCounterReadings).unwrap();
        assert_eq!(json, "\"NOT_ENOUGH_ENERGY_COUNTER_READINGS\"");
    }

    #[test]
    fn test_business_errors_keep_their_code() {
        assert_eq!(
            Error::InvalidAmount { amount: 0.0 }.code(),
            ErrorCode::InvalidAmount
        );
        assert_eq!(
            Error::invalid_date("start after end").code(),
            ErrorCode::InvalidDate
        );
        assert_eq!(ErrorCode::InvalidDate.message(), "Invalid date");
    }
}
