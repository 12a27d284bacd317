use crate::domain::account::Account;
use std::io::Write;

/// Writes account summaries as `number,name,currency,balance` rows.
pub struct AccountWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> AccountWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    /// Accounts are written in account-number order.
    pub fn write_accounts(&mut self, mut accounts: Vec<Account>) -> csv::Result<()> {
        accounts.sort_by(|a, b| a.number.cmp(&b.number));
        self.writer
            .write_record(["number", "name", "currency", "balance"])?;
        for account in accounts {
            self.writer.write_record([
                account.number,
                account.name,
                account.currency.to_string(),
                account.balance.to_string(),
            ])?;
        }
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::currency::Currency;
    use crate::domain::money::Balance;
    use rust_decimal_macros::dec;

    #[test]
    fn test_writes_sorted_rows_with_two_decimals() {
        let accounts = vec![
            Account::open("0000000002", "Bob", Currency::Eur, Balance::new(dec!(3))),
            Account::open("0000000001", "Alice", Currency::Usd, Balance::new(dec!(10.5))),
        ];
        let mut out = Vec::new();
        AccountWriter::new(&mut out).write_accounts(accounts).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "number,name,currency,balance\n0000000001,Alice,USD,10.50\n0000000002,Bob,EUR,3.00\n"
        );
    }
}
