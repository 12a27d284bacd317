use super::currency::Currency;
use super::money::Amount;
use crate::error::LedgerError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Durable intent record of a money transfer.
///
/// Written unsettled before any balance moves. An unsettled transfer that is
/// older than its request is the anchor for reconciliation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transfer {
    pub id: Uuid,
    pub source: Uuid,
    pub destination: Uuid,
    pub currency: Currency,
    /// Requested amount, before conversion.
    pub amount: Amount,
    pub timestamp: DateTime<Utc>,
    pub settled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transfer {
    pub fn initiate(source: Uuid, destination: Uuid, currency: Currency, amount: Amount) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            source,
            destination,
            currency,
            amount,
            timestamp: now,
            settled: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Flips `settled` to true. A transfer settles at most once.
    pub fn settle(&mut self) -> Result<(), LedgerError> {
        if self.settled {
            return Err(LedgerError::InvalidInput(format!(
                "transfer {} is already settled",
                self.id
            )));
        }
        self.settled = true;
        Ok(())
    }
}
