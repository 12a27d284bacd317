use clap::Parser;
use ledgerbank::application::Services;
use ledgerbank::application::context::Context;
use ledgerbank::application::sampler::RateSampler;
use ledgerbank::client::{BankClient, LocalBank};
use ledgerbank::config::AppConfig;
use ledgerbank::infrastructure::in_memory::InMemoryLedger;
use ledgerbank::interfaces::batch::{BatchRunner, Outcome};
use ledgerbank::interfaces::csv::account_writer::AccountWriter;
use ledgerbank::interfaces::csv::operation_reader::OperationReader;
use ledgerbank::interfaces::csv::rate_reader::RateReader;
use ledgerbank::interfaces::rpc::BankHandler;
use ledgerbank::logging::init_logging;
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Operations CSV file
    input: PathBuf,

    /// Exchange rates to seed the ledger with (`from,to,rate`)
    #[arg(long)]
    rates: Option<PathBuf>,

    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log filter, e.g. `info` or `ledgerbank=debug`. `RUST_LOG` takes precedence.
    #[arg(long)]
    log_level: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,

    /// Run the background exchange-rate sampler while processing
    #[arg(long)]
    sample_rates: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => AppConfig::from_file(path).into_diagnostic()?,
        None => AppConfig::default(),
    };
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    config.logging.json |= cli.json_logs;
    init_logging(&config.logging);

    let ledger = InMemoryLedger::new();
    let services = Services::new(
        Arc::new(ledger.accounts.clone()),
        Arc::new(ledger.transactions.clone()),
        Arc::new(ledger.transfers.clone()),
        Arc::new(ledger.rates.clone()),
    );
    let (ctx, cancel) = Context::with_cancel(config.ledger.call_ceiling());

    if let Some(path) = cli.rates {
        let file = File::open(path).into_diagnostic()?;
        for record in RateReader::new(file).rates() {
            let seeded = match record {
                Ok(record) => match record.into_exchange_rate(config.sampler.validity()) {
                    Ok(rate) => services.exchange.seed(&ctx, rate).await,
                    Err(e) => Err(e),
                },
                Err(e) => Err(e),
            };
            if let Err(e) = seeded {
                eprintln!("Error reading rate: {}", e);
            }
        }
    }

    let sampler = cli.sample_rates.then(|| {
        let sampler = RateSampler::new(Arc::new(ledger.rates.clone()), config.sampler.clone());
        let ctx = ctx.clone();
        tokio::spawn(async move { sampler.run(&ctx).await })
    });

    let handler = BankHandler::new(services.clone(), config.stream.exchange_interval());
    let client = BankClient::new(
        Arc::new(LocalBank::new(handler.clone(), config.ledger.call_ceiling())),
        config.breaker.clone(),
    );
    let mut runner = BatchRunner::new(handler, client, services.accounts.clone(), ctx);

    let file = File::open(cli.input).into_diagnostic()?;
    for op_result in OperationReader::new(file).operations() {
        match op_result {
            Ok(op) => {
                let account = op.account.clone();
                match runner.run(op).await {
                    Ok(Outcome::Balance(Some(balance))) => {
                        eprintln!("Balance of {}: {} {}", account, balance.balance, balance.currency);
                    }
                    Ok(_) => {}
                    Err(e) => eprintln!("Error processing operation: {}", e),
                }
            }
            Err(e) => eprintln!("Error reading operation: {}", e),
        }
    }

    let accounts = runner.accounts().await.into_diagnostic()?;

    cancel.cancel();
    if let Some(sampler) = sampler {
        sampler.await.into_diagnostic()?;
    }

    let stdout = io::stdout();
    let mut writer = AccountWriter::new(stdout.lock());
    writer.write_accounts(accounts).into_diagnostic()?;

    Ok(())
}
