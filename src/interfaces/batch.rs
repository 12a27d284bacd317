use super::csv::operation_reader::{Operation, OperationType};
use super::rpc::BankHandler;
use super::rpc::Status;
use super::rpc::types::{
    AccountResponse, CreateTransactionRequest, CurrentBalanceResponse, OpenAccountRequest,
    TransactionResponse, TransferRequest, TransferResponse,
};
use crate::application::accounts::AccountService;
use crate::application::context::Context;
use crate::client::{BankClient, ClientError};
use crate::domain::account::Account;
use crate::error::LedgerError;
use futures::StreamExt;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("{0}")]
    Rejected(#[from] Status),

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("{operation:?} requires the `{field}` column")]
    MissingField {
        operation: OperationType,
        field: &'static str,
    },

    #[error("unknown account number {0}")]
    UnknownAccount(String),
}

#[derive(Debug)]
pub enum Outcome {
    Opened(AccountResponse),
    Transaction(TransactionResponse),
    Transfer(TransferResponse),
    /// `None` when the client's breaker skipped the call.
    Balance(Option<CurrentBalanceResponse>),
}

/// Drives operations-file rows through the bank boundary.
///
/// Rows name accounts by number; the runner remembers the id the bank
/// assigned to every account it opened.
pub struct BatchRunner {
    handler: BankHandler,
    client: BankClient,
    accounts: AccountService,
    ctx: Context,
    ids: BTreeMap<String, Uuid>,
}

impl BatchRunner {
    pub fn new(handler: BankHandler, client: BankClient, accounts: AccountService, ctx: Context) -> Self {
        Self {
            handler,
            client,
            accounts,
            ctx,
            ids: BTreeMap::new(),
        }
    }

    pub async fn run(&mut self, op: Operation) -> Result<Outcome, BatchError> {
        match op.kind {
            OperationType::Open => {
                let name = required(op.kind, "counterparty", op.counterparty)?;
                let currency = required(op.kind, "currency", op.currency)?;
                let response = self
                    .handler
                    .open_account(
                        &self.ctx,
                        OpenAccountRequest {
                            account_name: name,
                            account_number: op.account.clone(),
                            currency,
                            initial_balance: op.amount.unwrap_or(Decimal::ZERO),
                        },
                    )
                    .await?;
                self.ids.insert(op.account, response.account_id);
                Ok(Outcome::Opened(response))
            }
            OperationType::Deposit
            | OperationType::Withdraw
            | OperationType::Payment
            | OperationType::Refund => {
                let account_id = self.id_of(&op.account)?;
                let amount = required(op.kind, "amount", op.amount)?;
                let response = self
                    .handler
                    .create_transaction(
                        &self.ctx,
                        CreateTransactionRequest {
                            account_id: account_id.to_string(),
                            amount,
                            transaction_type: format!("{:?}", op.kind),
                            note: op.note.unwrap_or_default(),
                        },
                    )
                    .await?;
                Ok(Outcome::Transaction(response))
            }
            OperationType::Transfer => {
                let source = self.id_of(&op.account)?;
                let destination =
                    self.id_of(&required(op.kind, "counterparty", op.counterparty)?)?;
                let request = TransferRequest {
                    from_account: source.to_string(),
                    to_account: destination.to_string(),
                    currency: required(op.kind, "currency", op.currency)?,
                    amount: required(op.kind, "amount", op.amount)?,
                };
                let mut responses = self
                    .handler
                    .transfer_money(self.ctx.clone(), futures::stream::iter([request]));
                match responses.next().await {
                    Some(response) => Ok(Outcome::Transfer(response?)),
                    None => Err(LedgerError::Cancelled("transfer".to_string()).into()),
                }
            }
            OperationType::Balance => {
                let account_id = self.id_of(&op.account)?;
                let response = self.client.current_balance(account_id).await?;
                Ok(Outcome::Balance(response))
            }
        }
    }

    /// Current state of every account opened through this runner.
    pub async fn accounts(&self) -> Result<Vec<Account>, LedgerError> {
        let mut accounts = Vec::with_capacity(self.ids.len());
        for id in self.ids.values() {
            accounts.push(self.accounts.get(&self.ctx, *id).await?);
        }
        Ok(accounts)
    }

    fn id_of(&self, number: &str) -> Result<Uuid, BatchError> {
        self.ids
            .get(number)
            .copied()
            .ok_or_else(|| BatchError::UnknownAccount(number.to_string()))
    }
}

fn required<T>(operation: OperationType, field: &'static str, value: Option<T>) -> Result<T, BatchError> {
    value.ok_or(BatchError::MissingField { operation, field })
}
