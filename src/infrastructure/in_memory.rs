use crate::domain::account::Account;
use crate::domain::currency::Currency;
use crate::domain::exchange_rate::ExchangeRate;
use crate::domain::ports::{
    AccountRepository, ExchangeRateRepository, TransactionRepository, TransferRepository,
};
use crate::domain::transaction::TransactionEntry;
use crate::domain::transfer::Transfer;
use crate::error::{LedgerError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Next `updated_at` for a record, strictly after the stored one so that two
/// writes landing on the same clock tick still produce distinct versions.
fn next_version(previous: DateTime<Utc>) -> DateTime<Utc> {
    let now = Utc::now();
    if now > previous {
        now
    } else {
        previous + Duration::microseconds(1)
    }
}

/// A thread-safe in-memory account table.
///
/// Uses `Arc<RwLock<HashMap<Uuid, Account>>>`; clones share the same table.
#[derive(Default, Clone)]
pub struct InMemoryAccountStore {
    accounts: Arc<RwLock<HashMap<Uuid, Account>>>,
}

impl InMemoryAccountStore {
    /// Creates a new, empty in-memory account table.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountRepository for InMemoryAccountStore {
    async fn create(&self, account: Account) -> Result<Account> {
        let mut accounts = self.accounts.write().await;
        if accounts.values().any(|a| a.number == account.number) {
            return Err(LedgerError::already_exists("bank account", &account.number));
        }
        if accounts.contains_key(&account.id) {
            return Err(LedgerError::already_exists("bank account", account.id));
        }
        accounts.insert(account.id, account.clone());
        Ok(account)
    }

    async fn get(&self, id: Uuid) -> Result<Account> {
        let accounts = self.accounts.read().await;
        accounts
            .get(&id)
            .cloned()
            .ok_or_else(|| LedgerError::not_found("bank account", id))
    }

    async fn update(&self, mut account: Account, observed: DateTime<Utc>) -> Result<Option<Account>> {
        let mut accounts = self.accounts.write().await;
        let Some(stored) = accounts.get_mut(&account.id) else {
            return Ok(None);
        };
        if stored.updated_at != observed {
            return Ok(None);
        }
        account.updated_at = next_version(stored.updated_at);
        *stored = account.clone();
        Ok(Some(account))
    }
}

/// Append-only in-memory journal.
#[derive(Default, Clone)]
pub struct InMemoryTransactionStore {
    entries: Arc<RwLock<Vec<TransactionEntry>>>,
}

impl InMemoryTransactionStore {
    /// Creates a new, empty in-memory journal.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TransactionRepository for InMemoryTransactionStore {
    async fn create(&self, entry: TransactionEntry) -> Result<TransactionEntry> {
        let mut entries = self.entries.write().await;
        if entries.iter().any(|e| e.id == entry.id) {
            return Err(LedgerError::already_exists("bank transaction", entry.id));
        }
        entries.push(entry.clone());
        Ok(entry)
    }

    async fn list_by_account(&self, account_id: Uuid) -> Result<Vec<TransactionEntry>> {
        let entries = self.entries.read().await;
        Ok(entries
            .iter()
            .filter(|e| e.account_id == account_id)
            .cloned()
            .collect())
    }
}

#[derive(Default, Clone)]
pub struct InMemoryTransferStore {
    transfers: Arc<RwLock<HashMap<Uuid, Transfer>>>,
}

impl InMemoryTransferStore {
    /// Creates a new, empty in-memory transfer table.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TransferRepository for InMemoryTransferStore {
    async fn create(&self, transfer: Transfer) -> Result<Transfer> {
        let mut transfers = self.transfers.write().await;
        if transfers.contains_key(&transfer.id) {
            return Err(LedgerError::already_exists("bank transfer", transfer.id));
        }
        transfers.insert(transfer.id, transfer.clone());
        Ok(transfer)
    }

    async fn get(&self, id: Uuid) -> Result<Transfer> {
        let transfers = self.transfers.read().await;
        transfers
            .get(&id)
            .cloned()
            .ok_or_else(|| LedgerError::not_found("bank transfer", id))
    }

    async fn update(&self, mut transfer: Transfer, observed: DateTime<Utc>) -> Result<Option<Transfer>> {
        let mut transfers = self.transfers.write().await;
        let Some(stored) = transfers.get_mut(&transfer.id) else {
            return Ok(None);
        };
        if stored.updated_at != observed {
            return Ok(None);
        }
        transfer.updated_at = next_version(stored.updated_at);
        *stored = transfer.clone();
        Ok(Some(transfer))
    }
}

#[derive(Default, Clone)]
pub struct InMemoryExchangeRateStore {
    rates: Arc<RwLock<HashMap<Uuid, ExchangeRate>>>,
}

impl InMemoryExchangeRateStore {
    /// Creates a new, empty in-memory rate table.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ExchangeRateRepository for InMemoryExchangeRateStore {
    async fn create(&self, rate: ExchangeRate) -> Result<ExchangeRate> {
        let mut rates = self.rates.write().await;
        if rates.contains_key(&rate.id) {
            return Err(LedgerError::already_exists("exchange rate", rate.id));
        }
        rates.insert(rate.id, rate.clone());
        Ok(rate)
    }

    async fn get_by_currencies(&self, from: Currency, to: Currency) -> Result<ExchangeRate> {
        let rates = self.rates.read().await;
        rates
            .values()
            .filter(|r| r.from == from && r.to == to)
            .max_by_key(|r| r.updated_at)
            .cloned()
            .ok_or_else(|| LedgerError::not_found("exchange rate", format!("{from}/{to}")))
    }

    async fn get_all(&self) -> Result<Vec<ExchangeRate>> {
        let rates = self.rates.read().await;
        Ok(rates.values().cloned().collect())
    }

    async fn update(&self, mut rate: ExchangeRate, observed: DateTime<Utc>) -> Result<Option<ExchangeRate>> {
        let mut rates = self.rates.write().await;
        let Some(stored) = rates.get_mut(&rate.id) else {
            return Ok(None);
        };
        if stored.updated_at != observed {
            return Ok(None);
        }
        rate.updated_at = next_version(stored.updated_at);
        *stored = rate.clone();
        Ok(Some(rate))
    }
}

/// All four ledger tables behind one handle.
#[derive(Default, Clone)]
pub struct InMemoryLedger {
    pub accounts: InMemoryAccountStore,
    pub transactions: InMemoryTransactionStore,
    pub transfers: InMemoryTransferStore,
    pub rates: InMemoryExchangeRateStore,
}

impl InMemoryLedger {
    /// Creates a ledger with four empty tables.
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::money::{Amount, Balance, Rate};
    use crate::domain::transaction::TransactionKind;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_in_memory_account_store() {
        let store = InMemoryAccountStore::new();
        let account = Account::open("0000000001", "Alice", Currency::Usd, Balance::new(dec!(100.0)));

        store.create(account.clone()).await.unwrap();
        let retrieved = store.get(account.id).await.unwrap();
        assert_eq!(retrieved, account);

        assert!(store.get(Uuid::new_v4()).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_duplicate_account_number_is_rejected() {
        let store = InMemoryAccountStore::new();
        let first = Account::open("0000000001", "Alice", Currency::Usd, Balance::ZERO);
        let second = Account::open("0000000001", "Bob", Currency::Eur, Balance::ZERO);

        store.create(first).await.unwrap();
        assert!(matches!(
            store.create(second).await,
            Err(LedgerError::AlreadyExists { .. })
        ));
    }

    #[tokio::test]
    async fn test_update_is_conditioned_on_observed_version() {
        let store = InMemoryAccountStore::new();
        let account = Account::open("0000000001", "Alice", Currency::Usd, Balance::ZERO);
        let observed = account.updated_at;
        store.create(account.clone()).await.unwrap();

        let mut first = account.clone();
        first.balance = Balance::new(dec!(1.00));
        let written = store.update(first, observed).await.unwrap().unwrap();
        assert!(written.updated_at > observed);

        let mut stale = account.clone();
        stale.balance = Balance::new(dec!(2.00));
        assert!(store.update(stale, observed).await.unwrap().is_none());

        let stored = store.get(account.id).await.unwrap();
        assert_eq!(stored.balance, Balance::new(dec!(1.00)));
    }

    #[tokio::test]
    async fn test_update_of_missing_account_matches_nothing() {
        let store = InMemoryAccountStore::new();
        let ghost = Account::open("0000000009", "Ghost", Currency::Usd, Balance::ZERO);
        let observed = ghost.updated_at;
        assert!(store.update(ghost, observed).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_in_memory_transaction_store() {
        let store = InMemoryTransactionStore::new();
        let account_id = Uuid::new_v4();
        let entry = TransactionEntry::record(
            account_id,
            TransactionKind::Deposit,
            Amount::new(dec!(100.0)).unwrap(),
            "salary",
        );

        store.create(entry.clone()).await.unwrap();
        assert_eq!(store.list_by_account(account_id).await.unwrap(), vec![entry]);
        assert!(store.list_by_account(Uuid::new_v4()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rate_lookup_prefers_latest_update() {
        let store = InMemoryExchangeRateStore::new();
        let validity = Duration::seconds(30);
        let old = ExchangeRate::new(Currency::Usd, Currency::Eur, Rate::new(dec!(0.9)), validity);
        store.create(old.clone()).await.unwrap();

        let mut newer = ExchangeRate::new(Currency::Usd, Currency::Eur, Rate::new(dec!(0.8)), validity);
        newer.updated_at = old.updated_at + Duration::seconds(1);
        store.create(newer).await.unwrap();

        let found = store.get_by_currencies(Currency::Usd, Currency::Eur).await.unwrap();
        assert_eq!(found.rate, Rate::new(dec!(0.8)));

        let missing = store.get_by_currencies(Currency::Eur, Currency::Usd).await;
        assert!(missing.unwrap_err().is_not_found());
    }
}
