use super::ClientError;
use super::circuit_breaker::{CircuitBreaker, CircuitState};
use crate::config::BreakerConfig;
use crate::domain::currency::Currency;
use crate::interfaces::rpc::Status;
use crate::interfaces::rpc::types::{
    CurrentBalanceRequest, CurrentBalanceResponse, ExchangeRateRequest, ExchangeRateResponse,
};
use async_trait::async_trait;
use futures::stream::BoxStream;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

pub type QuoteStream = BoxStream<'static, Result<ExchangeRateResponse, Status>>;

/// Transport to a bank boundary.
#[async_trait]
pub trait RemoteBank: Send + Sync {
    async fn current_balance(
        &self,
        req: CurrentBalanceRequest,
    ) -> Result<CurrentBalanceResponse, Status>;

    async fn exchange_rate(&self, req: ExchangeRateRequest) -> Result<QuoteStream, Status>;
}

pub type RemoteBankRef = Arc<dyn RemoteBank>;

/// Bank client whose calls all pass through one circuit breaker.
///
/// Methods return `Ok(None)` when the breaker spent the call on its
/// open to half-open transition.
pub struct BankClient {
    remote: RemoteBankRef,
    breaker: CircuitBreaker,
}

impl BankClient {
    pub fn new(remote: RemoteBankRef, config: BreakerConfig) -> Self {
        Self {
            remote,
            breaker: CircuitBreaker::new(config),
        }
    }

    pub async fn breaker_state(&self) -> CircuitState {
        self.breaker.state().await
    }

    pub async fn current_balance(
        &self,
        account_id: Uuid,
    ) -> Result<Option<CurrentBalanceResponse>, ClientError> {
        let remote = self.remote.clone();
        let req = CurrentBalanceRequest {
            account_id: account_id.to_string(),
        };
        let response = self
            .breaker
            .call(move || async move { Ok(remote.current_balance(req).await?) })
            .await
            .inspect_err(|err| warn!(account_id = %account_id, error = %err, "Balance request failed"))?;
        debug!(account_id = %account_id, skipped = response.is_none(), "Balance request done");
        Ok(response)
    }

    /// Opens a quote stream. Only opening the stream is guarded; the quotes
    /// themselves arrive at the bank's pace until the stream is dropped.
    pub async fn watch_exchange_rate(
        &self,
        from: Currency,
        to: Currency,
        amount: Decimal,
    ) -> Result<Option<QuoteStream>, ClientError> {
        let remote = self.remote.clone();
        let req = ExchangeRateRequest {
            from_currency: from.to_string(),
            to_currency: to.to_string(),
            amount,
        };
        self.breaker
            .call(move || async move { Ok(remote.exchange_rate(req).await?) })
            .await
            .inspect_err(|err| {
                warn!(from = %from, to = %to, error = %err, "Exchange rate stream request failed")
            })
    }
}
