//! Response envelope handed to the HTTP layer.
//!
//! Every core call goes through [`respond`], which turns `Result<T>` into either
//! `{"error": false, "payload": ...}` or
//! `{"error": true, "message": ..., "code": "INVALID_DATE"}`.

use crate::errors::{Error, ErrorCode, Result};
use serde::Serialize;
use tracing::{error, warn};

/// Uniform result shape of every core operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Response<T> {
    /// The operation succeeded
    Success {
        /// Always `false`
        error: bool,
        /// Result of the operation
        payload: T,
    },
    /// The operation failed with a symbolic code
    Failure {
        /// Always `true`
        error: bool,
        /// Readable description of the failure
        message: String,
        /// Symbolic code callers branch on
        code: ErrorCode,
    },
}

impl<T> Response<T> {
    /// Wraps a successful payload.
    pub const fn success(payload: T) -> Self {
        Self::Success {
            error: false,
            payload,
        }
    }

    /// Wraps an error, hiding the details of internal faults.
    #[must_use]
    pub fn failure(err: &Error) -> Self {
        let code = err.code();
        let message = match code {
            ErrorCode::InternalError => code.message().to_string(),
            _ => err.to_string(),
        };
        Self::Failure {
            error: true,
            message,
            code,
        }
    }

    /// Whether this is a failure.
    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Failure { .. })
    }
}

/// Maps the result of a core call into the response envelope.
///
/// Internal faults are logged at `error` level with their full detail; business
/// errors are expected and only logged as warnings.
pub fn respond<T>(result: Result<T>) -> Response<T> {
    match result {
        Ok(payload) => Response::success(payload),
        Err(err) => {
            if err.code() == ErrorCode::InternalError {
                error!("Internal error: {err}");
            } else {
                warn!("Request failed with {:?}: {err}", err.code());
            }
            Response::failure(&err)
        }
    }
}
