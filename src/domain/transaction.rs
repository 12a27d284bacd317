use super::money::Amount;
use crate::error::LedgerError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionKind {
    Deposit,
    Withdraw,
    Transfer,
    Payment,
    Refund,
}

impl TransactionKind {
    pub const ALL: [TransactionKind; 5] = [
        TransactionKind::Deposit,
        TransactionKind::Withdraw,
        TransactionKind::Transfer,
        TransactionKind::Payment,
        TransactionKind::Refund,
    ];

    /// Deposits are the only kind that increase a balance.
    pub fn is_credit(&self) -> bool {
        matches!(self, TransactionKind::Deposit)
    }

    pub fn name(&self) -> &'static str {
        match self {
            TransactionKind::Deposit => "Deposit",
            TransactionKind::Withdraw => "Withdraw",
            TransactionKind::Transfer => "Transfer",
            TransactionKind::Payment => "Payment",
            TransactionKind::Refund => "Refund",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TransactionKind {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        TransactionKind::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| LedgerError::InvalidInput(format!("unsupported transaction type {name}")))
    }
}

/// Journal entry for one balance mutation. Never updated once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionEntry {
    pub id: Uuid,
    pub account_id: Uuid,
    /// Positive for credits, negative for debits, rounded for storage.
    pub amount: Decimal,
    pub kind: TransactionKind,
    pub note: String,
    pub timestamp: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TransactionEntry {
    pub fn record(
        account_id: Uuid,
        kind: TransactionKind,
        amount: Amount,
        note: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        let magnitude = amount.for_storage().value();
        Self {
            id: Uuid::new_v4(),
            account_id,
            amount: if kind.is_credit() { magnitude } else { -magnitude },
            kind,
            note: note.into(),
            timestamp: now,
            created_at: now,
            updated_at: now,
        }
    }
}
