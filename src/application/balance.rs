use super::context::Context;
use crate::domain::account::Account;
use crate::domain::money::Amount;
use crate::domain::ports::AccountRepositoryRef;
use crate::domain::transaction::TransactionKind;
use crate::error::{LedgerError, Result};
use tracing::{debug, error, warn};
use uuid::Uuid;

/// Applies signed balance changes to single accounts.
///
/// Every write is conditioned on the snapshot the change was computed from,
/// so a concurrent writer makes this one fail instead of being overwritten.
#[derive(Clone)]
pub struct BalanceMutator {
    accounts: AccountRepositoryRef,
}

impl BalanceMutator {
    /// Creates a new mutator over the given account table.
    pub fn new(accounts: AccountRepositoryRef) -> Self {
        Self { accounts }
    }

    /// Reads the snapshot a change will be computed from.
    pub async fn load(&self, ctx: &Context, account_id: Uuid) -> Result<Account> {
        ctx.call("get bank account", self.accounts.get(account_id))
            .await
    }

    /// Computes the new balance from `snapshot` and persists it.
    ///
    /// Returns the stored account. When nothing was written the account is
    /// read again: a missing account yields `NotFound`, an existing one means
    /// another writer got there first and yields `ConcurrentModification`.
    pub async fn apply(
        &self,
        ctx: &Context,
        snapshot: &Account,
        kind: TransactionKind,
        amount: Amount,
    ) -> Result<Account> {
        let mut next = snapshot.clone();
        next.apply(kind, amount).inspect_err(|err| {
            warn!(
                account_id = %snapshot.id,
                transaction_type = %kind,
                amount = %amount,
                error = %err,
                "Balance change rejected"
            );
        })?;
        let attempted_balance = next.balance;

        let written = ctx
            .call(
                "update bank account",
                self.accounts.update(next, snapshot.updated_at),
            )
            .await
            .inspect_err(|err| {
                error!(
                    account_id = %snapshot.id,
                    transaction_type = %kind,
                    amount = %amount,
                    attempted_balance = %attempted_balance,
                    error = %err,
                    "Failed to update account balance"
                );
            })?;

        match written {
            Some(account) => {
                debug!(
                    account_id = %account.id,
                    balance = %account.balance,
                    "Account balance updated"
                );
                Ok(account)
            }
            None => {
                self.load(ctx, snapshot.id).await?;
                warn!(
                    account_id = %snapshot.id,
                    updated_at = %snapshot.updated_at,
                    "Concurrent modification detected on bank account"
                );
                Err(LedgerError::concurrent_modification(
                    "bank account",
                    snapshot.id,
                ))
            }
        }
    }
}
