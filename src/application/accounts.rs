use super::context::Context;
use crate::domain::account::Account;
use crate::domain::currency::Currency;
use crate::domain::money::Balance;
use crate::domain::ports::AccountRepositoryRef;
use crate::error::Result;
use tracing::{error, info};
use uuid::Uuid;

#[derive(Clone)]
pub struct AccountService {
    accounts: AccountRepositoryRef,
}

impl AccountService {
    /// Creates a new account service over the given account table.
    pub fn new(accounts: AccountRepositoryRef) -> Self {
        Self { accounts }
    }

    /// Opens a new account. A number already in use yields `AlreadyExists`.
    pub async fn open_account(
        &self,
        ctx: &Context,
        number: &str,
        name: &str,
        currency: Currency,
        initial_balance: Balance,
    ) -> Result<Account> {
        let account = Account::open(number, name, currency, initial_balance);
        let account = ctx
            .call("create bank account", self.accounts.create(account))
            .await
            .inspect_err(|err| {
                error!(
                    account_number = number,
                    currency = %currency,
                    error = %err,
                    "Failed to open bank account"
                );
            })?;

        info!(
            account_id = %account.id,
            account_number = %account.number,
            currency = %account.currency,
            balance = %account.balance,
            "Bank account opened"
        );
        Ok(account)
    }

    /// Fetches an account by id.
    pub async fn get(&self, ctx: &Context, account_id: Uuid) -> Result<Account> {
        ctx.call("get bank account", self.accounts.get(account_id))
            .await
    }

    /// Balance and currency of an account.
    pub async fn current_balance(&self, ctx: &Context, account_id: Uuid) -> Result<(Balance, Currency)> {
        let account = self.get(ctx, account_id).await?;
        Ok((account.balance, account.currency))
    }
}
