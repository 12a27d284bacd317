use crate::error::{ErrorKind, FieldErrors, LedgerError};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::error;

/// Outcome category reported to callers of the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Code {
    InvalidArgument,
    NotFound,
    AlreadyExists,
    /// The request lost an optimistic-concurrency race and may be retried.
    Aborted,
    DeadlineExceeded,
    Cancelled,
    Internal,
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Code::InvalidArgument => "invalid argument",
            Code::NotFound => "not found",
            Code::AlreadyExists => "already exists",
            Code::Aborted => "aborted",
            Code::DeadlineExceeded => "deadline exceeded",
            Code::Cancelled => "cancelled",
            Code::Internal => "internal",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[error("{code}: {message}")]
pub struct Status {
    pub code: Code,
    pub message: String,
    /// Per-field violations, only set for rejected request shapes.
    pub violations: FieldErrors,
}

impl Status {
    pub fn new(code: Code, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            violations: FieldErrors::new(),
        }
    }

    pub fn invalid_argument(violations: FieldErrors) -> Self {
        Self {
            code: Code::InvalidArgument,
            message: "invalid input".to_string(),
            violations,
        }
    }

    pub fn internal() -> Self {
        Self::new(Code::Internal, "internal error")
    }
}

/// Domain failures keep their message. Storage and consistency failures are
/// logged here and reach the caller without detail.
impl From<LedgerError> for Status {
    fn from(err: LedgerError) -> Self {
        if let LedgerError::Validation(violations) = err {
            return Status::invalid_argument(violations);
        }
        let code = match err.kind() {
            ErrorKind::NotFound => Code::NotFound,
            ErrorKind::AlreadyExists => Code::AlreadyExists,
            ErrorKind::InvalidInput
            | ErrorKind::InsufficientBalance
            | ErrorKind::InvalidCurrency => Code::InvalidArgument,
            ErrorKind::ConcurrentModification => Code::Aborted,
            ErrorKind::Timeout => Code::DeadlineExceeded,
            ErrorKind::Cancelled => Code::Cancelled,
            ErrorKind::Database | ErrorKind::Inconsistent => {
                error!(error = %err, kind = ?err.kind(), "Internal error");
                return Status::internal();
            }
        };
        Status::new(code, err.to_string())
    }
}
