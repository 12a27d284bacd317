use super::context::Context;
use crate::config::SamplerConfig;
use crate::domain::exchange_rate::ExchangeRate;
use crate::domain::money::{RATE_SCALE, Rate};
use crate::domain::ports::ExchangeRateRepositoryRef;
use crate::error::{LedgerError, Result};
use chrono::Utc;
use rand::Rng;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use tracing::{debug, info, warn};

/// Smallest rate the sampler will store.
const MIN_RATE: Decimal = Decimal::from_parts(1, 0, 0, false, RATE_SCALE);

/// Background task that nudges every stored exchange rate by a bounded random
/// step, simulating a market feed.
pub struct RateSampler {
    rates: ExchangeRateRepositoryRef,
    config: SamplerConfig,
}

impl RateSampler {
    /// Creates a new sampler over the given rate table.
    pub fn new(rates: ExchangeRateRepositoryRef, config: SamplerConfig) -> Self {
        Self { rates, config }
    }

    /// Samples immediately, then once per interval, until `ctx` is cancelled.
    pub async fn run(&self, ctx: &Context) {
        info!(
            interval_secs = self.config.interval_secs,
            max_step = %self.config.max_step,
            "Exchange rate sampler started"
        );
        loop {
            match self.sample_once(ctx).await {
                Ok(updated) => debug!(updated, "Exchange rates sampled"),
                Err(LedgerError::Cancelled(_)) => break,
                Err(err) => warn!(error = %err, "Exchange rate sampling failed"),
            }
            tokio::select! {
                _ = ctx.cancelled() => break,
                _ = tokio::time::sleep(self.config.interval()) => {}
            }
        }
        info!("Exchange rate sampler stopped");
    }

    /// One pass over every stored rate. Returns how many were updated.
    ///
    /// A rate changed by someone else since it was listed is skipped.
    pub async fn sample_once(&self, ctx: &Context) -> Result<usize> {
        let rates = ctx
            .call("list exchange rates", self.rates.get_all())
            .await?;

        let mut updated = 0;
        for rate in rates {
            let observed = rate.updated_at;
            let next = self.perturb(rate);
            let (id, from, to, value) = (next.id, next.from, next.to, next.rate);

            match ctx
                .call("update exchange rate", self.rates.update(next, observed))
                .await?
            {
                Some(_) => updated += 1,
                None => warn!(
                    rate_id = %id,
                    from = %from,
                    to = %to,
                    rate = %value,
                    "Exchange rate changed concurrently, sample skipped"
                ),
            }
        }
        Ok(updated)
    }

    fn perturb(&self, mut rate: ExchangeRate) -> ExchangeRate {
        let next = (rate.rate.value() + self.random_step()).max(MIN_RATE);
        rate.rate = Rate::new(next).for_storage();
        rate.refresh_window(Utc::now(), self.config.validity());
        rate
    }

    /// Uniform step in `[-max_step, max_step]` at rate precision.
    fn random_step(&self) -> Decimal {
        let bound = (self.config.max_step.abs() * Decimal::from(10i64.pow(RATE_SCALE)))
            .trunc()
            .to_i64()
            .unwrap_or(0);
        let units = rand::thread_rng().gen_range(-bound..=bound);
        Decimal::new(units, RATE_SCALE)
    }
}
