use super::currency::Currency;
use super::money::{Amount, Balance};
use super::transaction::TransactionKind;
use crate::error::LedgerError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Length of every account number, in digits.
pub const ACCOUNT_NUMBER_LEN: usize = 10;

/// A customer account held by the ledger.
///
/// `updated_at` doubles as the optimistic-concurrency token: the ledger only
/// accepts an update that was computed from the currently stored value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    /// Unique, [`ACCOUNT_NUMBER_LEN`] ASCII digits.
    pub number: String,
    pub name: String,
    pub currency: Currency,
    pub balance: Balance,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    pub fn open(
        number: impl Into<String>,
        name: impl Into<String>,
        currency: Currency,
        initial_balance: Balance,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            number: number.into(),
            name: name.into(),
            currency,
            balance: initial_balance.for_storage(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Applies a transaction of `kind` to the balance.
    ///
    /// Only deposits add; every other kind subtracts. The amount is rounded for
    /// storage before it moves the balance, so the balance changes by exactly
    /// what the journal records. The result must not be negative.
    pub fn apply(&mut self, kind: TransactionKind, amount: Amount) -> Result<(), LedgerError> {
        let delta = Balance::from(amount.for_storage());
        let next = if kind.is_credit() {
            self.balance + delta
        } else {
            self.balance - delta
        }
        .for_storage();

        if next.is_negative() {
            return Err(LedgerError::InsufficientBalance {
                account_id: self.id,
                balance: self.balance.value(),
                required: delta.value(),
            });
        }
        self.balance = next;
        Ok(())
    }
}

pub fn is_valid_account_number(number: &str) -> bool {
    number.len() == ACCOUNT_NUMBER_LEN && number.bytes().all(|b| b.is_ascii_digit())
}
