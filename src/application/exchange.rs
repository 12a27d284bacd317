use super::context::Context;
use crate::domain::currency::Currency;
use crate::domain::exchange_rate::ExchangeRate;
use crate::domain::money::{Amount, Rate};
use crate::domain::ports::ExchangeRateRepositoryRef;
use crate::error::Result;
use tracing::debug;

/// Resolves conversion multipliers between currencies.
///
/// The stored validity window is informational; a rate is used regardless of
/// whether `now` falls inside it.
#[derive(Clone)]
pub struct ExchangeRateService {
    rates: ExchangeRateRepositoryRef,
}

impl ExchangeRateService {
    /// Creates a new exchange rate service over the given rate table.
    pub fn new(rates: ExchangeRateRepositoryRef) -> Self {
        Self { rates }
    }

    /// Multiplier turning an amount in `from` into `to`.
    ///
    /// Equal currencies resolve to exactly one without a ledger lookup.
    pub async fn resolve(&self, ctx: &Context, from: Currency, to: Currency) -> Result<Rate> {
        if from == to {
            return Ok(Rate::ONE);
        }
        let stored = ctx
            .call(
                "get exchange rate",
                self.rates.get_by_currencies(from, to),
            )
            .await?;
        debug!(from = %from, to = %to, rate = %stored.rate, "Exchange rate resolved");
        Ok(stored.rate)
    }

    /// `amount` expressed in `to`, unrounded.
    pub async fn convert(
        &self,
        ctx: &Context,
        from: Currency,
        to: Currency,
        amount: Amount,
    ) -> Result<Amount> {
        let rate = self.resolve(ctx, from, to).await?;
        Ok(amount * rate)
    }

    /// Stores a new rate.
    pub async fn seed(&self, ctx: &Context, rate: ExchangeRate) -> Result<ExchangeRate> {
        ctx.call("create exchange rate", self.rates.create(rate))
            .await
    }

    /// Every stored rate.
    pub async fn all(&self, ctx: &Context) -> Result<Vec<ExchangeRate>> {
        ctx.call("list exchange rates", self.rates.get_all()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::in_memory::InMemoryExchangeRateStore;
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_convert_keeps_full_precision() {
        let store = InMemoryExchangeRateStore::new();
        let service = ExchangeRateService::new(Arc::new(store));
        let ctx = Context::default();
        service
            .seed(
                &ctx,
                ExchangeRate::new(Currency::Usd, Currency::Eur, Rate::new(dec!(0.91234)), chrono::Duration::seconds(30)),
            )
            .await
            .unwrap();

        let converted = service
            .convert(&ctx, Currency::Usd, Currency::Eur, Amount::new(dec!(10.01)).unwrap())
            .await
            .unwrap();
        assert_eq!(converted.value(), dec!(9.1325234));
    }

    #[tokio::test]
    async fn test_missing_pair_is_not_found() {
        let service = ExchangeRateService::new(Arc::new(InMemoryExchangeRateStore::new()));
        let result = service
            .resolve(&Context::default(), Currency::Gbp, Currency::Jpy)
            .await;
        assert!(result.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_reverse_pair_is_not_inferred() {
        let service = ExchangeRateService::new(Arc::new(InMemoryExchangeRateStore::new()));
        let ctx = Context::default();
        service
            .seed(
                &ctx,
                ExchangeRate::new(Currency::Usd, Currency::Eur, Rate::new(dec!(0.9)), chrono::Duration::seconds(30)),
            )
            .await
            .unwrap();
        assert!(service.resolve(&ctx, Currency::Eur, Currency::Usd).await.is_err());
        assert_eq!(service.all(&ctx).await.unwrap().len(), 1);
    }
}
