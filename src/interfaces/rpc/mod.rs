//! The bank's request boundary.
//!
//! [`BankHandler`] validates each request with a fresh
//! [`Validator`], hands it to the application services and translates the
//! outcome into a response or a [`Status`].
//!
//! Every request runs inside a span carrying a fresh `request_id`, so all
//! log lines it produces, down to the ledger calls, can be correlated.

pub mod status;
pub mod types;

use crate::application::Services;
use crate::application::context::Context;
use crate::application::validator::Validator;
use crate::domain::account::is_valid_account_number;
use crate::domain::currency::Currency;
use crate::domain::money::{Amount, Balance};
use crate::domain::transaction::TransactionKind;
use futures::stream::{self, BoxStream, Stream, StreamExt};
use rust_decimal::Decimal;
use std::time::Duration;
use tracing::{Instrument, Span, error, info, instrument};
use uuid::Uuid;

pub use status::{Code, Status};
use types::*;

#[derive(Clone)]
pub struct BankHandler {
    services: Services,
    exchange_interval: Duration,
}

fn parse_uuid(v: &mut Validator, field: &str, value: &str) -> Option<Uuid> {
    match Uuid::parse_str(value.trim()) {
        Ok(id) => Some(id),
        Err(err) => {
            v.add_error(field, err.to_string());
            None
        }
    }
}

fn parse_currency(v: &mut Validator, field: &str, value: &str) -> Option<Currency> {
    match value.parse() {
        Ok(currency) => Some(currency),
        Err(_) => {
            v.add_error(field, "unsupported currency");
            None
        }
    }
}

fn parse_amount(v: &mut Validator, field: &str, value: Decimal, message: &str) -> Option<Amount> {
    match Amount::new(value) {
        Ok(amount) => Some(amount),
        Err(_) => {
            v.add_error(field, message);
            None
        }
    }
}

fn rejected(v: &Validator) -> Status {
    error!(validation_errors = ?v.errors(), "Request validation failed");
    Status::invalid_argument(v.errors().clone())
}

impl BankHandler {
    pub fn new(services: Services, exchange_interval: Duration) -> Self {
        Self {
            services,
            exchange_interval,
        }
    }

    #[instrument(skip_all, fields(request_id = %Uuid::new_v4()))]
    pub async fn open_account(
        &self,
        ctx: &Context,
        req: OpenAccountRequest,
    ) -> Result<AccountResponse, Status> {
        info!(
            account_name = %req.account_name,
            account_number = %req.account_number,
            currency = %req.currency,
            balance = %req.initial_balance,
            "Received open account request"
        );

        let mut v = Validator::new();
        v.check(
            is_valid_account_number(&req.account_number),
            "account_number",
            "account number should be 10 digits",
        );
        let balance = parse_amount(
            &mut v,
            "account_balance",
            req.initial_balance,
            "account balance shouldn't be a negative number",
        );
        let currency = parse_currency(&mut v, "currency", &req.currency);
        let (Some(balance), Some(currency), true) = (balance, currency, v.is_valid()) else {
            return Err(rejected(&v));
        };

        let account = self
            .services
            .accounts
            .open_account(
                ctx,
                &req.account_number,
                &req.account_name,
                currency,
                Balance::from(balance),
            )
            .await?;
        Ok(account.into())
    }

    #[instrument(skip_all, fields(request_id = %Uuid::new_v4()))]
    pub async fn get_current_balance(
        &self,
        ctx: &Context,
        req: CurrentBalanceRequest,
    ) -> Result<CurrentBalanceResponse, Status> {
        info!(account_id = %req.account_id, "Received balance check request");

        let mut v = Validator::new();
        let account_id = parse_uuid(&mut v, "account_id", &req.account_id);
        let (Some(account_id), true) = (account_id, v.is_valid()) else {
            return Err(rejected(&v));
        };

        let (balance, currency) = self
            .services
            .accounts
            .current_balance(ctx, account_id)
            .await?;
        Ok(CurrentBalanceResponse {
            account_id,
            currency,
            balance,
        })
    }

    #[instrument(skip_all, fields(request_id = %Uuid::new_v4()))]
    pub async fn create_transaction(
        &self,
        ctx: &Context,
        req: CreateTransactionRequest,
    ) -> Result<TransactionResponse, Status> {
        info!(
            account_id = %req.account_id,
            amount = %req.amount,
            transaction_type = %req.transaction_type,
            "Received create transaction request"
        );

        let mut v = Validator::new();
        let amount = parse_amount(
            &mut v,
            "transaction_amount",
            req.amount,
            "transaction amount can't be negative",
        );
        let kind = match req.transaction_type.parse::<TransactionKind>() {
            Ok(kind) => Some(kind),
            Err(_) => {
                v.add_error("transaction_type", "unsupported transaction type");
                None
            }
        };
        let account_id = parse_uuid(&mut v, "account_id", &req.account_id);
        let (Some(amount), Some(kind), Some(account_id), true) =
            (amount, kind, account_id, v.is_valid())
        else {
            return Err(rejected(&v));
        };

        let entry = self
            .services
            .transactions
            .apply_transaction(ctx, account_id, amount, kind, &req.note)
            .await?;
        Ok(entry.into())
    }

    /// Quotes `amount` converted into the target currency, immediately and
    /// then once per interval, until `ctx` is cancelled.
    ///
    /// The rate is resolved again for every quote. A lookup failure ends the
    /// stream after yielding the error.
    #[instrument(skip_all, fields(request_id = %Uuid::new_v4()))]
    pub async fn stream_exchange_rate(
        &self,
        ctx: Context,
        req: ExchangeRateRequest,
    ) -> Result<BoxStream<'static, Result<ExchangeRateResponse, Status>>, Status> {
        info!(
            from_currency = %req.from_currency,
            to_currency = %req.to_currency,
            amount = %req.amount,
            "Started exchange rate stream"
        );

        let mut v = Validator::new();
        let amount = parse_amount(
            &mut v,
            "amount",
            req.amount,
            "exchange amount shouldn't be negative",
        );
        let from = parse_currency(&mut v, "from_currency", &req.from_currency);
        let to = parse_currency(&mut v, "to_currency", &req.to_currency);
        let (Some(amount), Some(from), Some(to), true) = (amount, from, to, v.is_valid()) else {
            return Err(rejected(&v));
        };

        let exchange = self.services.exchange.clone();
        let first = exchange.convert(&ctx, from, to, amount).await?;
        let interval = self.exchange_interval;
        let span = Span::current();

        let quotes = stream::unfold(
            (Some(first), false),
            move |(pending, finished)| {
                let exchange = exchange.clone();
                let ctx = ctx.clone();
                let span = span.clone();
                async move {
                    if finished {
                        return None;
                    }
                    if let Some(quote) = pending {
                        return Some((Ok(ExchangeRateResponse { currency: to, amount: quote }), (None, false)));
                    }
                    tokio::select! {
                        biased;
                        _ = ctx.cancelled() => {
                            info!("Client cancelled exchange rate stream");
                            return None;
                        }
                        _ = tokio::time::sleep(interval) => {}
                    }
                    match exchange.convert(&ctx, from, to, amount).await {
                        Ok(quote) => Some((Ok(ExchangeRateResponse { currency: to, amount: quote }), (None, false))),
                        Err(err) if ctx.is_cancelled() => {
                            info!(error = %err, "Client cancelled exchange rate stream");
                            None
                        }
                        Err(err) => {
                            error!(from = %from, to = %to, error = %err, "Failed to calculate exchange rate");
                            Some((Err(Status::from(err)), (None, true)))
                        }
                    }
                }
                .instrument(span)
            },
        );
        Ok(quotes.boxed())
    }

    /// Runs one transfer per incoming request, answering in request order.
    ///
    /// A rejected or failed request yields an error item and the stream moves
    /// on to the next request. The stream ends when the input ends or `ctx`
    /// is cancelled. Each transfer runs on its own task, so dropping the
    /// response stream never interrupts a saga halfway.
    pub fn transfer_money<S>(
        &self,
        ctx: Context,
        requests: S,
    ) -> BoxStream<'static, Result<TransferResponse, Status>>
    where
        S: Stream<Item = TransferRequest> + Send + 'static,
    {
        info!("Started transfer stream");
        let handler = self.clone();
        stream::unfold(
            (requests.boxed(), handler, ctx),
            |(mut requests, handler, ctx)| async move {
                let request = tokio::select! {
                    biased;
                    _ = ctx.cancelled() => {
                        info!("Client cancelled transfer stream");
                        return None;
                    }
                    next = requests.next() => match next {
                        Some(request) => request,
                        None => {
                            info!("Transfer stream completed");
                            return None;
                        }
                    },
                };
                let response = handler.transfer_one(&ctx, request).await;
                Some((response, (requests, handler, ctx)))
            },
        )
        .boxed()
    }

    #[instrument(skip_all, fields(request_id = %Uuid::new_v4()))]
    async fn transfer_one(
        &self,
        ctx: &Context,
        req: TransferRequest,
    ) -> Result<TransferResponse, Status> {
        info!(
            from_account = %req.from_account,
            to_account = %req.to_account,
            currency = %req.currency,
            amount = %req.amount,
            "Received transfer request"
        );

        let mut v = Validator::new();
        let amount = parse_amount(
            &mut v,
            "amount",
            req.amount,
            "transfer amount shouldn't be a negative number",
        );
        let currency = parse_currency(&mut v, "currency", &req.currency);
        let source = parse_uuid(&mut v, "from_account", &req.from_account);
        let destination = parse_uuid(&mut v, "to_account", &req.to_account);
        let (Some(amount), Some(currency), Some(source), Some(destination), true) =
            (amount, currency, source, destination, v.is_valid())
        else {
            return Err(rejected(&v));
        };

        let transfers = self.services.transfers.clone();
        let task_ctx = ctx.clone();
        let outcome = tokio::spawn(async move {
            transfers
                .transfer_money(&task_ctx, source, destination, currency, amount)
                .await
        }
        .in_current_span())
        .await;

        match outcome {
            Ok(Ok(transfer)) => Ok(transfer.into()),
            Ok(Err(err)) => {
                error!(
                    from_account = %source,
                    to_account = %destination,
                    amount = %amount,
                    error = %err,
                    "Money transfer failed"
                );
                Err(err.into())
            }
            Err(err) => {
                error!(error = %err, "Transfer task panicked");
                Err(Status::internal())
            }
        }
    }
}
