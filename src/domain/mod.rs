//! Entities, value objects and the ledger ports they are persisted through.

pub mod account;
pub mod currency;
pub mod exchange_rate;
pub mod money;
pub mod ports;
pub mod transaction;
pub mod transfer;
