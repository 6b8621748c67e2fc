use anyhow::{anyhow, Context, Result};
use clap::Parser;
use solscope::{
    aggregator::{store::ViewModelStore, types::QuerySlot, Aggregator},
    arguments::{Cli, Command},
    config::{load_config_from_path, render_config, Config},
    dashboard::{render_query_value, Dashboard},
    errors::QueryError,
    logger::{self, LogTag, LoggerConfig},
    query::QueryHandler,
    sources::{default_lookups, SolanaRpc},
};
use std::sync::Arc;
use tokio::sync::Notify;

fn main() -> Result<()> {
    let cli = Cli::parse();
    logger::init(LoggerConfig::from_flags(&cli.debug, cli.verbose, cli.quiet));

    let mut config = load_config_from_path(&cli.config)
        .map_err(|e| anyhow!(e))
        .with_context(|| format!("Failed to load config from {}", cli.config))?;
    cli.apply_overrides(&mut config);

    // Single-threaded: every task interleaves only at await points
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")?;

    runtime.block_on(run(cli.command, config))
}

async fn run(command: Command, config: Config) -> Result<()> {
    match command {
        Command::Watch { .. } => watch(config).await,
        Command::Tx { signature } => {
            let handler = lookup_handler(&config)?;
            lookup(&handler, QuerySlot::Transaction, &signature).await
        }
        Command::Wallet { address, history } => {
            let handler = lookup_handler(&config)?;
            lookup(&handler, QuerySlot::Wallet, &address).await?;
            if history {
                lookup(&handler, QuerySlot::WalletHistory, &address).await?;
            }
            Ok(())
        }
        Command::Config => {
            print!("{}", render_config(&config).map_err(|e| anyhow!(e))?);
            Ok(())
        }
    }
}

async fn watch(config: Config) -> Result<()> {
    let aggregator = Aggregator::from_config(&config).map_err(|e| anyhow!(e))?;
    let dashboard = Dashboard::new(config.dashboard.clone());
    let shutdown = Arc::new(Notify::new());

    logger::info(LogTag::System, "solscope starting, press Ctrl-C to exit");
    aggregator.start();

    let frames = dashboard.run(aggregator.subscribe(), shutdown.clone());
    tokio::pin!(frames);

    let result = tokio::select! {
        result = &mut frames => result.context("Dashboard output failed"),
        signal = tokio::signal::ctrl_c() => {
            if let Err(e) = signal {
                logger::warning(LogTag::System, &format!("Ctrl-C handler failed: {}", e));
            }
            logger::info(LogTag::System, "Shutdown requested");
            shutdown.notify_one();
            frames.await.context("Dashboard output failed")
        }
    };

    aggregator.stop().await;
    result
}

fn lookup_handler(config: &Config) -> Result<QueryHandler> {
    let rpc = SolanaRpc::from_config(&config.rpc).map_err(|e| anyhow!(e))?;
    Ok(QueryHandler::new(
        default_lookups(&rpc, config),
        ViewModelStore::new(),
    ))
}

async fn lookup(handler: &QueryHandler, kind: QuerySlot, input: &str) -> Result<()> {
    match handler.execute(kind, input).await {
        Ok(value) => {
            print!("{}", render_query_value(&value));
            Ok(())
        }
        Err(QueryError::NotFound(input)) => {
            println!("No {} found for {}", kind, input);
            Ok(())
        }
        Err(QueryError::Lookup { slot, reason }) => {
            Err(anyhow!("{}: {}", slot.failure_message(), reason))
        }
        Err(e) => Err(anyhow!(e)),
    }
}
