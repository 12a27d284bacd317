//! Client side of the bank boundary. Every outbound call goes through a
//! [`circuit_breaker::CircuitBreaker`].

pub mod circuit_breaker;
pub mod local;
pub mod service;

use crate::interfaces::rpc::Status;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClientError {
    /// Rejected by the breaker without contacting the bank.
    #[error("circuit open")]
    CircuitOpen,

    #[error("call did not complete within {0:?}")]
    Timeout(Duration),

    #[error("bank returned an error: {0}")]
    Remote(#[from] Status),

    #[error("call aborted: {0}")]
    Aborted(String),
}

pub use circuit_breaker::{CircuitBreaker, CircuitState};
pub use local::LocalBank;
pub use service::{BankClient, RemoteBank, RemoteBankRef};
