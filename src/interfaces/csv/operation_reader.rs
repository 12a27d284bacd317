use crate::error::{LedgerError, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Read;

#[derive(Debug, Deserialize, PartialEq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum OperationType {
    Open,
    Deposit,
    Withdraw,
    Payment,
    Refund,
    Transfer,
    Balance,
}

/// One row of an operations file.
///
/// `account` is an account number. For `open`, `counterparty` carries the
/// holder's name; for `transfer`, the destination account number.
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct Operation {
    #[serde(rename = "type")]
    pub kind: OperationType,
    pub account: String,
    pub counterparty: Option<String>,
    pub currency: Option<String>,
    pub amount: Option<Decimal>,
    pub note: Option<String>,
}

/// Reads operations from a CSV source, lazily.
pub struct OperationReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> OperationReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    pub fn operations(self) -> impl Iterator<Item = Result<Operation>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(|err| LedgerError::InvalidInput(err.to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_reader_valid_stream() {
        let data = "type, account, counterparty, currency, amount, note\n\
                    open, 0000000001, Alice, USD, 100.50,\n\
                    transfer, 0000000001, 0000000002, EUR, 10, rent\n\
                    balance, 0000000001,,,,";
        let results: Vec<Result<Operation>> = OperationReader::new(data.as_bytes()).operations().collect();

        assert_eq!(results.len(), 3);
        let open = results[0].as_ref().unwrap();
        assert_eq!(open.kind, OperationType::Open);
        assert_eq!(open.counterparty.as_deref(), Some("Alice"));
        assert_eq!(open.amount, Some(dec!(100.50)));
        assert_eq!(open.note, None);

        let transfer = results[1].as_ref().unwrap();
        assert_eq!(transfer.kind, OperationType::Transfer);
        assert_eq!(transfer.note.as_deref(), Some("rent"));

        let balance = results[2].as_ref().unwrap();
        assert_eq!(balance.amount, None);
    }

    #[test]
    fn test_reader_malformed_line() {
        let data = "type,account,counterparty,currency,amount,note\nsteal,0000000001,,,1.0,";
        let results: Vec<Result<Operation>> = OperationReader::new(data.as_bytes()).operations().collect();
        assert!(results[0].is_err());
    }
}
