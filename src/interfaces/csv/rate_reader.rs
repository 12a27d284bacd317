use crate::domain::currency::Currency;
use crate::domain::exchange_rate::ExchangeRate;
use crate::domain::money::Rate;
use crate::error::{LedgerError, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Read;

/// One `from,to,rate` row.
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct RateRecord {
    pub from: String,
    pub to: String,
    pub rate: Decimal,
}

impl RateRecord {
    /// Builds the stored rate, valid for `validity` from now.
    pub fn into_exchange_rate(self, validity: chrono::Duration) -> Result<ExchangeRate> {
        let from: Currency = self.from.parse()?;
        let to: Currency = self.to.parse()?;
        if self.rate <= Decimal::ZERO {
            return Err(LedgerError::InvalidInput(format!(
                "rate {from}/{to} must be positive, got {}",
                self.rate
            )));
        }
        Ok(ExchangeRate::new(from, to, Rate::new(self.rate), validity))
    }
}

/// Reads exchange-rate seeds from a CSV source with a `from,to,rate` header.
pub struct RateReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> RateReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    pub fn rates(self) -> impl Iterator<Item = Result<RateRecord>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(|err| LedgerError::InvalidInput(err.to_string())))
    }
}
