use super::service::{QuoteStream, RemoteBank};
use crate::application::context::Context;
use crate::interfaces::rpc::BankHandler;
use crate::interfaces::rpc::Status;
use crate::interfaces::rpc::types::{
    CurrentBalanceRequest, CurrentBalanceResponse, ExchangeRateRequest,
};
use async_trait::async_trait;
use std::time::Duration;

/// Reaches a [`BankHandler`] in the same process.
pub struct LocalBank {
    handler: BankHandler,
    call_ceiling: Duration,
}

impl LocalBank {
    pub fn new(handler: BankHandler, call_ceiling: Duration) -> Self {
        Self {
            handler,
            call_ceiling,
        }
    }
}

#[async_trait]
impl RemoteBank for LocalBank {
    async fn current_balance(
        &self,
        req: CurrentBalanceRequest,
    ) -> Result<CurrentBalanceResponse, Status> {
        let ctx = Context::background(self.call_ceiling);
        self.handler.get_current_balance(&ctx, req).await
    }

    async fn exchange_rate(&self, req: ExchangeRateRequest) -> Result<QuoteStream, Status> {
        let ctx = Context::background(self.call_ceiling);
        self.handler.stream_exchange_rate(ctx, req).await
    }
}
