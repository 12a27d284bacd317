//! Ledger port adapters.

pub mod in_memory;
