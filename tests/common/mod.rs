#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ledgerbank::application::Services;
use ledgerbank::application::context::Context;
use ledgerbank::domain::account::Account;
use ledgerbank::domain::currency::Currency;
use ledgerbank::domain::exchange_rate::ExchangeRate;
use ledgerbank::domain::money::{Balance, Rate};
use ledgerbank::domain::ports::{
    AccountRepository, ExchangeRateRepository, TransactionRepository, TransferRepository,
};
use ledgerbank::domain::transaction::TransactionEntry;
use ledgerbank::domain::transfer::Transfer;
use ledgerbank::error::{LedgerError, Result};
use ledgerbank::infrastructure::in_memory::InMemoryLedger;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

/// Lets `skip` calls through, then fails the next `fail` calls.
#[derive(Debug, Clone, Copy)]
struct Fault {
    skip: usize,
    fail: usize,
}

impl Fault {
    fn trips(&mut self) -> bool {
        if self.skip > 0 {
            self.skip -= 1;
            false
        } else if self.fail > 0 {
            self.fail -= 1;
            true
        } else {
            false
        }
    }
}

fn injected(operation: &'static str) -> LedgerError {
    LedgerError::database(operation, "injected failure")
}

/// Account table with per-account update failures, an optional read delay
/// and an optional yield after every read.
#[derive(Clone, Default)]
pub struct FlakyAccounts {
    inner: ledgerbank::infrastructure::in_memory::InMemoryAccountStore,
    update_faults: Arc<Mutex<HashMap<Uuid, Fault>>>,
    read_delay: Arc<Mutex<Option<Duration>>>,
    yield_on_read: Arc<AtomicBool>,
}

impl FlakyAccounts {
    pub fn fail_updates(&self, id: Uuid, skip: usize, fail: usize) {
        self.update_faults
            .lock()
            .unwrap()
            .insert(id, Fault { skip, fail });
    }

    pub fn delay_reads(&self, delay: Duration) {
        *self.read_delay.lock().unwrap() = Some(delay);
    }

    pub fn yield_on_read(&self) {
        self.yield_on_read.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl AccountRepository for FlakyAccounts {
    async fn create(&self, account: Account) -> Result<Account> {
        self.inner.create(account).await
    }

    async fn get(&self, id: Uuid) -> Result<Account> {
        let delay = *self.read_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let account = self.inner.get(id).await;
        if self.yield_on_read.load(Ordering::SeqCst) {
            tokio::task::yield_now().await;
        }
        account
    }

    async fn update(&self, account: Account, observed: DateTime<Utc>) -> Result<Option<Account>> {
        let trips = self
            .update_faults
            .lock()
            .unwrap()
            .get_mut(&account.id)
            .is_some_and(Fault::trips);
        if trips {
            return Err(injected("update bank account"));
        }
        self.inner.update(account, observed).await
    }
}

#[derive(Clone, Default)]
pub struct FlakyTransactions {
    inner: ledgerbank::infrastructure::in_memory::InMemoryTransactionStore,
    fail_creates: Arc<AtomicBool>,
}

impl FlakyTransactions {
    pub fn fail_creates(&self) {
        self.fail_creates.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl TransactionRepository for FlakyTransactions {
    async fn create(&self, entry: TransactionEntry) -> Result<TransactionEntry> {
        if self.fail_creates.load(Ordering::SeqCst) {
            return Err(injected("create bank transaction"));
        }
        self.inner.create(entry).await
    }

    async fn list_by_account(&self, account_id: Uuid) -> Result<Vec<TransactionEntry>> {
        self.inner.list_by_account(account_id).await
    }
}

#[derive(Clone, Default)]
pub struct FlakyTransfers {
    inner: ledgerbank::infrastructure::in_memory::InMemoryTransferStore,
    fail_creates: Arc<AtomicBool>,
    fail_updates: Arc<AtomicBool>,
}

impl FlakyTransfers {
    pub fn fail_creates(&self) {
        self.fail_creates.store(true, Ordering::SeqCst);
    }

    pub fn fail_updates(&self) {
        self.fail_updates.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl TransferRepository for FlakyTransfers {
    async fn create(&self, transfer: Transfer) -> Result<Transfer> {
        if self.fail_creates.load(Ordering::SeqCst) {
            return Err(injected("create bank transfer"));
        }
        self.inner.create(transfer).await
    }

    async fn get(&self, id: Uuid) -> Result<Transfer> {
        self.inner.get(id).await
    }

    async fn update(&self, transfer: Transfer, observed: DateTime<Utc>) -> Result<Option<Transfer>> {
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(injected("update bank transfer"));
        }
        self.inner.update(transfer, observed).await
    }
}

/// Rate table that counts lookups.
#[derive(Clone, Default)]
pub struct CountingRates {
    inner: ledgerbank::infrastructure::in_memory::InMemoryExchangeRateStore,
    lookups: Arc<AtomicUsize>,
}

impl CountingRates {
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ExchangeRateRepository for CountingRates {
    async fn create(&self, rate: ExchangeRate) -> Result<ExchangeRate> {
        self.inner.create(rate).await
    }

    async fn get_by_currencies(&self, from: Currency, to: Currency) -> Result<ExchangeRate> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.inner.get_by_currencies(from, to).await
    }

    async fn get_all(&self) -> Result<Vec<ExchangeRate>> {
        self.inner.get_all().await
    }

    async fn update(&self, rate: ExchangeRate, observed: DateTime<Utc>) -> Result<Option<ExchangeRate>> {
        self.inner.update(rate, observed).await
    }
}

/// Services over fault-injecting tables, plus direct access to those tables.
pub struct TestBank {
    pub accounts: FlakyAccounts,
    pub transactions: FlakyTransactions,
    pub transfers: FlakyTransfers,
    pub rates: CountingRates,
    pub services: Services,
}

impl TestBank {
    pub fn new() -> Self {
        let accounts = FlakyAccounts::default();
        let transactions = FlakyTransactions::default();
        let transfers = FlakyTransfers::default();
        let rates = CountingRates::default();
        let services = Services::new(
            Arc::new(accounts.clone()),
            Arc::new(transactions.clone()),
            Arc::new(transfers.clone()),
            Arc::new(rates.clone()),
        );
        Self {
            accounts,
            transactions,
            transfers,
            rates,
            services,
        }
    }

    pub async fn open(&self, number: &str, currency: Currency, balance: Decimal) -> Account {
        self.services
            .accounts
            .open_account(&Context::default(), number, number, currency, Balance::new(balance))
            .await
            .unwrap()
    }

    pub async fn seed_rate(&self, from: Currency, to: Currency, rate: Decimal) {
        self.rates
            .create(ExchangeRate::new(from, to, Rate::new(rate), chrono::Duration::seconds(30)))
            .await
            .unwrap();
    }

    pub async fn balance(&self, id: Uuid) -> Decimal {
        self.accounts.inner.get(id).await.unwrap().balance.value()
    }

    /// Signed journal amounts for `id`, oldest first.
    pub async fn journal(&self, id: Uuid) -> Vec<Decimal> {
        self.transactions
            .list_by_account(id)
            .await
            .unwrap()
            .into_iter()
            .map(|entry| entry.amount)
            .collect()
    }
}

/// Services over plain in-memory tables.
pub fn in_memory_services() -> (InMemoryLedger, Services) {
    let ledger = InMemoryLedger::new();
    let services = Services::new(
        Arc::new(ledger.accounts.clone()),
        Arc::new(ledger.transactions.clone()),
        Arc::new(ledger.transfers.clone()),
        Arc::new(ledger.rates.clone()),
    );
    (ledger, services)
}
