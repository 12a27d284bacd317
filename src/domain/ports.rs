//! Ledger persistence ports.
//!
//! Each capability is its own narrow trait so services depend only on what
//! they use. Conditional updates take the `updated_at` the caller observed
//! and return `Ok(None)` when no stored record matched it; telling "gone"
//! from "changed underneath" is left to the caller.

use super::account::Account;
use super::currency::Currency;
use super::exchange_rate::ExchangeRate;
use super::transaction::TransactionEntry;
use super::transfer::Transfer;
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Fails with `AlreadyExists` when the account number is taken.
    async fn create(&self, account: Account) -> Result<Account>;
    async fn get(&self, id: Uuid) -> Result<Account>;
    async fn update(&self, account: Account, observed: DateTime<Utc>) -> Result<Option<Account>>;
}

#[async_trait]
pub trait TransactionRepository: Send + Sync {
    async fn create(&self, entry: TransactionEntry) -> Result<TransactionEntry>;
    async fn list_by_account(&self, account_id: Uuid) -> Result<Vec<TransactionEntry>>;
}

#[async_trait]
pub trait TransferRepository: Send + Sync {
    async fn create(&self, transfer: Transfer) -> Result<Transfer>;
    async fn get(&self, id: Uuid) -> Result<Transfer>;
    async fn update(&self, transfer: Transfer, observed: DateTime<Utc>)
    -> Result<Option<Transfer>>;
}

#[async_trait]
pub trait ExchangeRateRepository: Send + Sync {
    async fn create(&self, rate: ExchangeRate) -> Result<ExchangeRate>;
    /// Most recently updated rate for the ordered pair.
    async fn get_by_currencies(&self, from: Currency, to: Currency) -> Result<ExchangeRate>;
    async fn get_all(&self) -> Result<Vec<ExchangeRate>>;
    async fn update(&self, rate: ExchangeRate, observed: DateTime<Utc>)
    -> Result<Option<ExchangeRate>>;
}

pub type AccountRepositoryRef = Arc<dyn AccountRepository>;
pub type TransactionRepositoryRef = Arc<dyn TransactionRepository>;
pub type TransferRepositoryRef = Arc<dyn TransferRepository>;
pub type ExchangeRateRepositoryRef = Arc<dyn ExchangeRateRepository>;
