use rust_decimal::Decimal;
use std::collections::BTreeMap;
use thiserror::Error;
use uuid::Uuid;

/// Field name to message, one entry per offending request field.
pub type FieldErrors = BTreeMap<String, String>;

pub type Result<T> = std::result::Result<T, LedgerError>;

/// Coarse classification used by the request boundary to pick a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    AlreadyExists,
    InvalidInput,
    Database,
    Timeout,
    ConcurrentModification,
    InsufficientBalance,
    InvalidCurrency,
    Cancelled,
    /// The ledger is in a state that needs manual reconciliation.
    Inconsistent,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LedgerError {
    #[error("resource not found: {resource} with identifier {id}")]
    NotFound { resource: &'static str, id: String },

    #[error("resource already exists: {resource} with identifier {id}")]
    AlreadyExists { resource: &'static str, id: String },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid input: {}", describe_fields(.0))]
    Validation(FieldErrors),

    #[error("database error: {operation} operation failed: {message}")]
    Database {
        operation: &'static str,
        message: String,
    },

    #[error("operation timed out: {0}")]
    Timeout(String),

    #[error("resource was modified concurrently: {resource} with identifier {id}")]
    ConcurrentModification { resource: &'static str, id: String },

    #[error("insufficient balance: account {account_id} has balance {balance}, requires {required}")]
    InsufficientBalance {
        account_id: Uuid,
        balance: Decimal,
        required: Decimal,
    },

    #[error("invalid currency: {0}")]
    InvalidCurrency(String),

    #[error("operation cancelled: {0}")]
    Cancelled(String),

    /// A saga leg failed after another leg had committed, and every
    /// compensating transaction succeeded.
    #[error("transfer {transfer_id} failed and was rolled back: {cause}")]
    TransferRolledBack {
        transfer_id: Uuid,
        cause: Box<LedgerError>,
    },

    /// A saga leg failed and so did its compensation. Balances no longer
    /// match the journal's intent for this transfer.
    #[error("transfer {transfer_id} failed ({original}) and rollback failed: {compensation}")]
    CompensationFailed {
        transfer_id: Uuid,
        original: Box<LedgerError>,
        compensation: Box<LedgerError>,
    },
}

fn describe_fields(fields: &FieldErrors) -> String {
    fields
        .iter()
        .map(|(field, message)| format!("{field}: {message}"))
        .collect::<Vec<_>>()
        .join(", ")
}

impl LedgerError {
    pub fn not_found(resource: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            resource,
            id: id.to_string(),
        }
    }

    pub fn already_exists(resource: &'static str, id: impl ToString) -> Self {
        Self::AlreadyExists {
            resource,
            id: id.to_string(),
        }
    }

    /// Wraps a storage failure with the name of the operation that hit it.
    pub fn database(operation: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Database {
            operation,
            message: err.to_string(),
        }
    }

    pub fn concurrent_modification(resource: &'static str, id: impl ToString) -> Self {
        Self::ConcurrentModification {
            resource,
            id: id.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            Self::InvalidInput(_) | Self::Validation(_) => ErrorKind::InvalidInput,
            Self::Database { .. } => ErrorKind::Database,
            Self::Timeout(_) => ErrorKind::Timeout,
            Self::ConcurrentModification { .. } => ErrorKind::ConcurrentModification,
            Self::InsufficientBalance { .. } => ErrorKind::InsufficientBalance,
            Self::InvalidCurrency(_) => ErrorKind::InvalidCurrency,
            Self::Cancelled(_) => ErrorKind::Cancelled,
            Self::TransferRolledBack { cause, .. } => cause.kind(),
            Self::CompensationFailed { .. } => ErrorKind::Inconsistent,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    pub fn is_concurrent_modification(&self) -> bool {
        self.kind() == ErrorKind::ConcurrentModification
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rolled_back_transfer_keeps_cause_kind() {
        let err = LedgerError::TransferRolledBack {
            transfer_id: Uuid::new_v4(),
            cause: Box::new(LedgerError::not_found("bank account", "abc")),
        };
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_failed_compensation_is_inconsistent() {
        let err = LedgerError::CompensationFailed {
            transfer_id: Uuid::new_v4(),
            original: Box::new(LedgerError::database("update bank account", "disk full")),
            compensation: Box::new(LedgerError::Timeout("update bank account".into())),
        };
        assert_eq!(err.kind(), ErrorKind::Inconsistent);
        let message = err.to_string();
        assert!(message.contains("disk full"));
        assert!(message.contains("rollback failed"));
    }

    #[test]
    fn test_validation_message_lists_every_field() {
        let mut fields = FieldErrors::new();
        fields.insert("amount".into(), "must not be negative".into());
        fields.insert("currency".into(), "unsupported currency".into());
        let message = LedgerError::Validation(fields).to_string();
        assert_eq!(
            message,
            "invalid input: amount: must not be negative, currency: unsupported currency"
        );
    }
}
