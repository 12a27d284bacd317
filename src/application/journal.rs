use super::context::Context;
use crate::domain::money::Amount;
use crate::domain::ports::TransactionRepositoryRef;
use crate::domain::transaction::{TransactionEntry, TransactionKind};
use crate::error::Result;
use tracing::error;
use uuid::Uuid;

/// Append-only record of balance mutations.
#[derive(Clone)]
pub struct TransactionJournal {
    transactions: TransactionRepositoryRef,
}

impl TransactionJournal {
    /// Creates a new journal over the given transaction table.
    pub fn new(transactions: TransactionRepositoryRef) -> Self {
        Self { transactions }
    }

    /// Appends an entry for a balance change that was already persisted.
    pub async fn record(
        &self,
        ctx: &Context,
        account_id: Uuid,
        kind: TransactionKind,
        amount: Amount,
        note: &str,
    ) -> Result<TransactionEntry> {
        let entry = TransactionEntry::record(account_id, kind, amount, note);
        ctx.call("create bank transaction", self.transactions.create(entry))
            .await
            .inspect_err(|err| {
                error!(
                    account_id = %account_id,
                    transaction_type = %kind,
                    amount = %amount,
                    error = %err,
                    "Failed to create transaction record"
                );
            })
    }

    /// Entries for one account, oldest first.
    pub async fn entries(&self, ctx: &Context, account_id: Uuid) -> Result<Vec<TransactionEntry>> {
        ctx.call(
            "list bank transactions",
            self.transactions.list_by_account(account_id),
        )
        .await
    }
}
