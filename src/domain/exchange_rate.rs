use super::currency::Currency;
use super::money::Rate;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stored conversion rate for an ordered currency pair.
///
/// `valid_from`/`valid_to` are kept up to date by the rate sampler but are
/// not checked when a rate is read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeRate {
    pub id: Uuid,
    pub from: Currency,
    pub to: Currency,
    pub rate: Rate,
    pub valid_from: DateTime<Utc>,
    pub valid_to: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ExchangeRate {
    pub fn new(from: Currency, to: Currency, rate: Rate, validity: Duration) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            from,
            to,
            rate: rate.for_storage(),
            valid_from: now,
            valid_to: now + validity,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn refresh_window(&mut self, now: DateTime<Utc>, validity: Duration) {
        self.valid_from = now;
        self.valid_to = now + validity;
    }
}
