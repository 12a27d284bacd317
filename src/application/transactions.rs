use super::balance::BalanceMutator;
use super::context::Context;
use super::journal::TransactionJournal;
use crate::domain::money::Amount;
use crate::domain::ports::{AccountRepositoryRef, TransactionRepositoryRef};
use crate::domain::transaction::{TransactionEntry, TransactionKind};
use crate::error::Result;
use std::time::Instant;
use tracing::info;
use uuid::Uuid;

/// Moves money in or out of one account and journals it.
#[derive(Clone)]
pub struct TransactionService {
    mutator: BalanceMutator,
    journal: TransactionJournal,
}

impl TransactionService {
    /// Creates a new transaction service over the account and transaction tables.
    pub fn new(accounts: AccountRepositoryRef, transactions: TransactionRepositoryRef) -> Self {
        Self {
            mutator: BalanceMutator::new(accounts),
            journal: TransactionJournal::new(transactions),
        }
    }

    /// Loads the account, adjusts its balance, persists it and then appends a
    /// journal entry.
    ///
    /// The two writes are not atomic. If the journal write fails the balance
    /// change stays in place and the error is returned to the caller.
    /// `amount` must already be validated as non-negative.
    pub async fn apply_transaction(
        &self,
        ctx: &Context,
        account_id: Uuid,
        amount: Amount,
        kind: TransactionKind,
        note: &str,
    ) -> Result<TransactionEntry> {
        let started = Instant::now();

        let snapshot = self.mutator.load(ctx, account_id).await?;
        let account = self.mutator.apply(ctx, &snapshot, kind, amount).await?;
        let entry = self
            .journal
            .record(ctx, account_id, kind, amount, note)
            .await?;

        info!(
            transaction_id = %entry.id,
            account_id = %account_id,
            transaction_type = %kind,
            amount = %amount,
            new_balance = %account.balance,
            duration_ms = started.elapsed().as_millis() as u64,
            "Transaction completed"
        );
        Ok(entry)
    }

    /// Journal entries for one account, oldest first.
    pub async fn history(&self, ctx: &Context, account_id: Uuid) -> Result<Vec<TransactionEntry>> {
        self.journal.entries(ctx, account_id).await
    }
}
