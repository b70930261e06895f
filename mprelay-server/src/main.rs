//! mprelay
//!
//! Polls Mercado Pago accounts for recent payments and forwards each new,
//! identified payment to its spreadsheet collector.

mod config;
mod shutdown;

use clap::{Parser, ValueEnum};
use config::ConfigLoader;
use mprelay_core::events::relay_tick_channel;
use mprelay_core::processors::{PollScheduler, Relay, RelayRunner};
use mprelay_sdk::client::{CollectorClient, PaymentsClient, format_begin_date};
use shutdown::ShutdownSignal;
use std::path::PathBuf;
use std::sync::Arc;
use time::OffsetDateTime;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Mercado Pago to spreadsheet relay
#[derive(Parser, Debug)]
#[command(name = "mprelay")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, env = "MPRELAY_CONFIG", default_value = "./mprelay.toml")]
    config: PathBuf,

    /// Log output format
    #[arg(long, env = "MPRELAY_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; the process environment may already be set
    dotenvy::dotenv().ok();

    let args = Args::parse();
    init_tracing(args.log_format);

    tracing::info!("Starting mprelay v{}", env!("CARGO_PKG_VERSION"));

    let loaded = ConfigLoader::new(&args.config).load().map_err(|e| {
        tracing::error!("Failed to load configuration: {}", e);
        e
    })?;
    tracing::info!("Configuration loaded from {:?}", args.config);

    for account in &loaded.accounts {
        tracing::info!(
            account = %account.name,
            destination = %account.destination,
            "Account configured"
        );
    }

    let payments = PaymentsClient::new(loaded.api_base_url.clone(), loaded.fetch_timeout)?;
    let collector = CollectorClient::new(loaded.deliver_timeout)?;

    let start = OffsetDateTime::now_utc();
    tracing::info!(
        watermark = %format_begin_date(start),
        interval_secs = loaded.settings.poll_interval.as_secs(),
        page_size = loaded.settings.page_size,
        watermark_mode = ?loaded.settings.watermark,
        seen_cache = ?loaded.settings.seen_cache,
        "Relay starting"
    );

    let interval = loaded.settings.poll_interval;
    let relay = Arc::new(Relay::new(
        loaded.accounts,
        loaded.settings,
        start,
        payments,
        collector,
    ));

    let signals = ShutdownSignal::install().map_err(|e| {
        tracing::error!("Failed to install signal handlers: {}", e);
        e
    })?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (tick_tx, tick_rx) = relay_tick_channel();

    let scheduler = PollScheduler::new(interval);
    let scheduler_handle = tokio::spawn(scheduler.run(shutdown_rx.clone(), tick_tx));

    let runner = RelayRunner::new(relay, tick_rx, shutdown_rx);
    let runner_handle = tokio::spawn(runner.run());

    supervise(signals.recv(), shutdown_tx, scheduler_handle, runner_handle).await?;

    tracing::info!("mprelay shutdown complete");
    Ok(())
}

/// Wait for `shutdown`, then stop the poll loop and join both tasks.
///
/// A runner that exits before shutdown is requested is an error.
async fn supervise(
    shutdown: impl Future<Output = ()>,
    shutdown_tx: watch::Sender<bool>,
    scheduler_handle: JoinHandle<()>,
    mut runner_handle: JoinHandle<()>,
) -> anyhow::Result<()> {
    let runner_exited = tokio::select! {
        _ = shutdown => false,
        result = &mut runner_handle => {
            tracing::error!(?result, "RelayRunner exited unexpectedly");
            true
        }
    };

    // Stop ticking; an in-flight cycle finishes before the runner observes this
    let _ = shutdown_tx.send(true);

    if let Err(e) = scheduler_handle.await {
        tracing::error!("PollScheduler task failed: {}", e);
    }

    if runner_exited {
        anyhow::bail!("relay runner exited before shutdown was requested");
    }
    if let Err(e) = runner_handle.await {
        tracing::error!("RelayRunner task failed: {}", e);
    }
    Ok(())
}

/// Initialize the tracing subscriber with environment-based filtering.
fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,reqwest=warn,hyper=warn"));

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().flatten_event(true))
            .init(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn until_stopped(mut rx: watch::Receiver<bool>) {
        let _ = rx.wait_for(|stop| *stop).await;
    }

    #[tokio::test]
    async fn test_signal_stops_both_tasks() {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let scheduler = tokio::spawn(until_stopped(shutdown_rx.clone()));
        let runner = tokio::spawn(until_stopped(shutdown_rx));

        let result = supervise(async {}, shutdown_tx, scheduler, runner).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_runner_exit_is_an_error() {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let scheduler = tokio::spawn(until_stopped(shutdown_rx));
        let runner = tokio::spawn(async {});

        let result = supervise(std::future::pending(), shutdown_tx, scheduler, runner).await;
        assert!(result.is_err());
    }
}
