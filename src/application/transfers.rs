//! Money transfer between two accounts as a compensating saga.
//!
//! Steps, each a separate ledger write:
//!
//! 1. record the transfer intent (unsettled)
//! 2. check the destination account's currency
//! 3. resolve the conversion rate from source to destination currency
//! 4. debit the source
//! 5. credit the destination, on failure re-credit the source
//! 6. mark the transfer settled, on failure undo both legs
//!
//! A failure before step 5 leaves no balance changed. Compensation runs under
//! a detached context so that a cancelled caller cannot interrupt it halfway.

use super::accounts::AccountService;
use super::context::Context;
use super::exchange::ExchangeRateService;
use super::transactions::TransactionService;
use crate::domain::currency::Currency;
use crate::domain::money::Amount;
use crate::domain::ports::TransferRepositoryRef;
use crate::domain::transaction::TransactionKind;
use crate::domain::transfer::Transfer;
use crate::error::{LedgerError, Result};
use std::time::Instant;
use tracing::{error, info, warn};
use uuid::Uuid;

#[derive(Clone)]
pub struct TransferService {
    transfers: TransferRepositoryRef,
    accounts: AccountService,
    rates: ExchangeRateService,
    transactions: TransactionService,
}

impl TransferService {
    /// Creates a new transfer service from its collaborators.
    pub fn new(
        transfers: TransferRepositoryRef,
        accounts: AccountService,
        rates: ExchangeRateService,
        transactions: TransactionService,
    ) -> Self {
        Self {
            transfers,
            accounts,
            rates,
            transactions,
        }
    }

    /// Moves `amount` from `source` to `destination`.
    ///
    /// `currency` must be the destination account's currency. Both legs move
    /// the amount converted from the source currency into the destination
    /// currency. No retries: a concurrent writer surfaces as
    /// `ConcurrentModification`.
    pub async fn transfer_money(
        &self,
        ctx: &Context,
        source: Uuid,
        destination: Uuid,
        currency: Currency,
        amount: Amount,
    ) -> Result<Transfer> {
        let started = Instant::now();

        let transfer = ctx
            .call(
                "create bank transfer",
                self.transfers
                    .create(Transfer::initiate(source, destination, currency, amount)),
            )
            .await
            .inspect_err(|err| {
                error!(
                    source = %source,
                    destination = %destination,
                    amount = %amount,
                    error = %err,
                    "Failed to record transfer"
                );
            })?;
        let note = format!("transfer {}", transfer.id);

        let destination_account = self.accounts.get(ctx, destination).await?;
        if destination_account.currency != currency {
            warn!(
                transfer_id = %transfer.id,
                requested = %currency,
                destination_currency = %destination_account.currency,
                "Transfer currency does not match destination account"
            );
            return Err(LedgerError::InvalidCurrency(format!(
                "destination account {} holds {}, transfer requested {}",
                destination, destination_account.currency, currency
            )));
        }

        let source_account = self.accounts.get(ctx, source).await?;
        let rate = self
            .rates
            .resolve(ctx, source_account.currency, destination_account.currency)
            .await?;
        let converted = amount * rate;

        self.transactions
            .apply_transaction(ctx, source, converted, TransactionKind::Transfer, &note)
            .await
            .inspect_err(|err| {
                warn!(
                    transfer_id = %transfer.id,
                    source = %source,
                    error = %err,
                    "Transfer aborted at source debit"
                );
            })?;

        if let Err(err) = self
            .transactions
            .apply_transaction(ctx, destination, converted, TransactionKind::Deposit, &note)
            .await
        {
            let legs = [(source, TransactionKind::Deposit)];
            return Err(self.roll_back(ctx, &transfer, converted, err, &legs).await);
        }

        let settled = match self.settle(ctx, transfer.clone()).await {
            Ok(settled) => settled,
            Err(err) => {
                let legs = [
                    (source, TransactionKind::Deposit),
                    (destination, TransactionKind::Transfer),
                ];
                return Err(self.roll_back(ctx, &transfer, converted, err, &legs).await);
            }
        };

        info!(
            transfer_id = %settled.id,
            source = %source,
            destination = %destination,
            currency = %currency,
            amount = %amount,
            rate = %rate,
            converted = %converted,
            duration_ms = started.elapsed().as_millis() as u64,
            "Transfer settled"
        );
        Ok(settled)
    }

    /// Fetches a transfer record by id.
    pub async fn get(&self, ctx: &Context, transfer_id: Uuid) -> Result<Transfer> {
        ctx.call("get bank transfer", self.transfers.get(transfer_id))
            .await
    }

    async fn settle(&self, ctx: &Context, mut transfer: Transfer) -> Result<Transfer> {
        let observed = transfer.updated_at;
        let id = transfer.id;
        transfer.settle()?;

        match ctx
            .call(
                "update bank transfer",
                self.transfers.update(transfer, observed),
            )
            .await?
        {
            Some(settled) => Ok(settled),
            None => {
                self.get(ctx, id).await?;
                Err(LedgerError::concurrent_modification("bank transfer", id))
            }
        }
    }

    /// Applies each compensating leg and folds the outcome into one error.
    ///
    /// Every leg is attempted even if an earlier one failed.
    async fn roll_back(
        &self,
        ctx: &Context,
        transfer: &Transfer,
        converted: Amount,
        cause: LedgerError,
        legs: &[(Uuid, TransactionKind)],
    ) -> LedgerError {
        warn!(
            transfer_id = %transfer.id,
            error = %cause,
            legs = legs.len(),
            "Transfer failed after a committed leg, compensating"
        );

        let ctx = ctx.detached();
        let note = format!("compensation for transfer {}", transfer.id);
        let mut failure = None;
        for &(account_id, kind) in legs {
            if let Err(err) = self
                .transactions
                .apply_transaction(&ctx, account_id, converted, kind, &note)
                .await
            {
                error!(
                    transfer_id = %transfer.id,
                    account_id = %account_id,
                    transaction_type = %kind,
                    amount = %converted,
                    error = %err,
                    "Compensating transaction failed"
                );
                failure.get_or_insert(err);
            }
        }

        match failure {
            None => {
                info!(transfer_id = %transfer.id, "Transfer rolled back");
                LedgerError::TransferRolledBack {
                    transfer_id: transfer.id,
                    cause: Box::new(cause),
                }
            }
            Some(compensation) => LedgerError::CompensationFailed {
                transfer_id: transfer.id,
                original: Box::new(cause),
                compensation: Box::new(compensation),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::money::Balance;
    use crate::infrastructure::in_memory::InMemoryLedger;
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    fn service(ledger: &InMemoryLedger) -> TransferService {
        let accounts = AccountService::new(Arc::new(ledger.accounts.clone()));
        TransferService::new(
            Arc::new(ledger.transfers.clone()),
            accounts,
            ExchangeRateService::new(Arc::new(ledger.rates.clone())),
            TransactionService::new(
                Arc::new(ledger.accounts.clone()),
                Arc::new(ledger.transactions.clone()),
            ),
        )
    }

    #[tokio::test]
    async fn test_same_currency_transfer_settles() {
        let ledger = InMemoryLedger::new();
        let transfers = service(&ledger);
        let accounts = AccountService::new(Arc::new(ledger.accounts.clone()));
        let ctx = Context::default();
        let alice = accounts
            .open_account(&ctx, "0000000001", "Alice", Currency::Usd, Balance::new(dec!(100)))
            .await
            .unwrap();
        let bob = accounts
            .open_account(&ctx, "0000000002", "Bob", Currency::Usd, Balance::ZERO)
            .await
            .unwrap();

        let transfer = transfers
            .transfer_money(&ctx, alice.id, bob.id, Currency::Usd, Amount::new(dec!(40)).unwrap())
            .await
            .unwrap();

        assert!(transfer.settled);
        assert!(transfers.get(&ctx, transfer.id).await.unwrap().settled);
        assert_eq!(accounts.current_balance(&ctx, alice.id).await.unwrap().0, Balance::new(dec!(60)));
        assert_eq!(accounts.current_balance(&ctx, bob.id).await.unwrap().0, Balance::new(dec!(40)));
    }

    #[tokio::test]
    async fn test_currency_mismatch_moves_nothing() {
        let ledger = InMemoryLedger::new();
        let transfers = service(&ledger);
        let accounts = AccountService::new(Arc::new(ledger.accounts.clone()));
        let ctx = Context::default();
        let alice = accounts
            .open_account(&ctx, "0000000001", "Alice", Currency::Usd, Balance::new(dec!(100)))
            .await
            .unwrap();
        let bob = accounts
            .open_account(&ctx, "0000000002", "Bob", Currency::Eur, Balance::ZERO)
            .await
            .unwrap();

        let result = transfers
            .transfer_money(&ctx, alice.id, bob.id, Currency::Usd, Amount::new(dec!(40)).unwrap())
            .await;

        assert!(matches!(result, Err(LedgerError::InvalidCurrency(_))));
        assert_eq!(accounts.current_balance(&ctx, alice.id).await.unwrap().0, Balance::new(dec!(100)));
        assert_eq!(accounts.current_balance(&ctx, bob.id).await.unwrap().0, Balance::ZERO);
    }

    #[tokio::test]
    async fn test_overdraft_aborts_before_any_movement() {
        let ledger = InMemoryLedger::new();
        let transfers = service(&ledger);
        let accounts = AccountService::new(Arc::new(ledger.accounts.clone()));
        let ctx = Context::default();
        let alice = accounts
            .open_account(&ctx, "0000000001", "Alice", Currency::Usd, Balance::new(dec!(10)))
            .await
            .unwrap();
        let bob = accounts
            .open_account(&ctx, "0000000002", "Bob", Currency::Usd, Balance::ZERO)
            .await
            .unwrap();

        let result = transfers
            .transfer_money(&ctx, alice.id, bob.id, Currency::Usd, Amount::new(dec!(40)).unwrap())
            .await;

        assert!(matches!(result, Err(LedgerError::InsufficientBalance { .. })));
        assert_eq!(accounts.current_balance(&ctx, bob.id).await.unwrap().0, Balance::ZERO);
    }
}
