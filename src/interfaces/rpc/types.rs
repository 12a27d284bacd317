//! Request and response messages of the bank boundary.
//!
//! Identifiers and enumerations arrive as strings and are parsed by the
//! handler so that every malformed field can be reported at once.

use crate::domain::account::Account;
use crate::domain::currency::Currency;
use crate::domain::money::{Amount, Balance};
use crate::domain::transaction::{TransactionEntry, TransactionKind};
use crate::domain::transfer::Transfer;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenAccountRequest {
    pub account_name: String,
    pub account_number: String,
    pub currency: String,
    pub initial_balance: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountResponse {
    pub account_id: Uuid,
    pub account_number: String,
    pub account_name: String,
    pub currency: Currency,
    pub balance: Balance,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        Self {
            account_id: account.id,
            account_number: account.number,
            account_name: account.name,
            currency: account.currency,
            balance: account.balance,
            created_at: account.created_at,
            updated_at: account.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentBalanceRequest {
    pub account_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentBalanceResponse {
    pub account_id: Uuid,
    pub currency: Currency,
    pub balance: Balance,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateTransactionRequest {
    pub account_id: String,
    pub amount: Decimal,
    pub transaction_type: String,
    pub note: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionResponse {
    pub transaction_id: Uuid,
    pub account_id: Uuid,
    /// Signed: negative for money leaving the account.
    pub amount: Decimal,
    pub transaction_type: TransactionKind,
    pub note: String,
    pub timestamp: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<TransactionEntry> for TransactionResponse {
    fn from(entry: TransactionEntry) -> Self {
        Self {
            transaction_id: entry.id,
            account_id: entry.account_id,
            amount: entry.amount,
            transaction_type: entry.kind,
            note: entry.note,
            timestamp: entry.timestamp,
            created_at: entry.created_at,
            updated_at: entry.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeRateRequest {
    pub from_currency: String,
    pub to_currency: String,
    pub amount: Decimal,
}

/// One quote: the requested amount expressed in `currency`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeRateResponse {
    pub currency: Currency,
    pub amount: Amount,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferRequest {
    pub from_account: String,
    pub to_account: String,
    pub currency: String,
    pub amount: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransferStatus {
    Success,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferResponse {
    pub transfer_id: Uuid,
    pub from_account: Uuid,
    pub to_account: Uuid,
    pub currency: Currency,
    /// As requested, before conversion.
    pub amount: Amount,
    pub time: DateTime<Utc>,
    pub status: TransferStatus,
}

impl From<Transfer> for TransferResponse {
    fn from(transfer: Transfer) -> Self {
        Self {
            transfer_id: transfer.id,
            from_account: transfer.source,
            to_account: transfer.destination,
            currency: transfer.currency,
            amount: transfer.amount,
            time: transfer.timestamp,
            status: TransferStatus::Success,
        }
    }
}
