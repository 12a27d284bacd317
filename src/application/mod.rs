//! Application layer: the use cases of the bank.
//!
//! Services here talk to storage only through the ports in
//! [`crate::domain::ports`] and run every ledger call under a request
//! [`context::Context`].

pub mod accounts;
pub mod balance;
pub mod context;
pub mod exchange;
pub mod journal;
pub mod sampler;
pub mod transactions;
pub mod transfers;
pub mod validator;

use crate::domain::ports::{
    AccountRepositoryRef, ExchangeRateRepositoryRef, TransactionRepositoryRef,
    TransferRepositoryRef,
};
use accounts::AccountService;
use exchange::ExchangeRateService;
use transactions::TransactionService;
use transfers::TransferService;

/// Every service wired against one set of ledger ports.
#[derive(Clone)]
pub struct Services {
    pub accounts: AccountService,
    pub transactions: TransactionService,
    pub exchange: ExchangeRateService,
    pub transfers: TransferService,
}

impl Services {
    pub fn new(
        accounts: AccountRepositoryRef,
        transactions: TransactionRepositoryRef,
        transfers: TransferRepositoryRef,
        rates: ExchangeRateRepositoryRef,
    ) -> Self {
        let account_service = AccountService::new(accounts.clone());
        let transaction_service = TransactionService::new(accounts, transactions);
        let exchange = ExchangeRateService::new(rates);
        let transfer_service = TransferService::new(
            transfers,
            account_service.clone(),
            exchange.clone(),
            transaction_service.clone(),
        );
        Self {
            accounts: account_service,
            transactions: transaction_service,
            exchange,
            transfers: transfer_service,
        }
    }
}
