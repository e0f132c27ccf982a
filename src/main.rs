mod bot;
mod config;
mod i18n;
mod report;
mod scheduler;
mod telegram;

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::bot::registry::ComputerRegistry;
use crate::bot::responder::Responder;
use crate::bot::BotContext;
use crate::config::Config;
use crate::i18n::Texts;
use crate::report::{ReportSource, SystemCollector};
use crate::scheduler::tasks::{self, DailyReport};
use crate::scheduler::ReportScheduler;
use crate::telegram::{TelegramClient, Transport};

#[derive(Parser)]
#[command(name = "hostwatch")]
#[command(about = "Daily and on-demand host health reports over a Telegram bot", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to the config file (.json or .toml)
    #[arg(long, default_value = "config.json")]
    config: PathBuf,

    /// Send one report immediately and exit
    #[arg(long)]
    test: bool,
}

/// Log to stderr and, when possible, append to `log_file` as well.
fn init_logging(log_file: &Path) -> Option<std::io::Error> {
    let (file_layer, open_error) = match OpenOptions::new().create(true).append(true).open(log_file) {
        Ok(file) => (
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            ),
            None,
        ),
        Err(e) => (None, Some(e)),
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,hostwatch=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .init();

    open_error
}

async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(&cli.config)
        .with_context(|| format!("Failed to load config from {}", cli.config.display()))?;

    if let Some(e) = init_logging(&config.log_file) {
        warn!(
            "Cannot open log file {}: {}; logging to stderr only",
            config.log_file.display(),
            e
        );
    }

    info!("hostwatch v{} starting...", env!("CARGO_PKG_VERSION"));
    info!("  Computer: {} ({})", config.computer_name, config.computer_id);
    info!("  Daily report at: {}", config.schedule_time);
    info!("  Language: {}", config.language);
    info!("  Polling: {}", config.enable_polling);

    let transport: Arc<dyn Transport> = Arc::new(TelegramClient::new(&config.telegram_token));
    let responder = Responder::new(transport.clone(), &config.chat_id);
    let texts = Texts::for_language(config.language);
    let reports: Arc<dyn ReportSource> =
        Arc::new(SystemCollector::new(config.monitor_all_disks, texts));

    if cli.test {
        info!("Test mode: sending one report");
        tasks::send_report(reports.as_ref(), &responder, &config.computer_name)
            .await
            .context("Test report failed")?;
        info!("Test report sent");
        return Ok(());
    }

    let daily = DailyReport::new(
        reports.clone(),
        responder.clone(),
        config.computer_name.clone(),
    );
    let scheduler = ReportScheduler::start(config.schedule_time, daily)
        .await
        .context("Failed to start the daily report scheduler")?;

    let shutdown = CancellationToken::new();
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            wait_for_shutdown_signal().await;
            info!("Shutdown signal received");
            shutdown.cancel();
        });
    }

    let scheduler_task = tokio::spawn(scheduler.run_until_cancelled(shutdown.clone()));

    if config.enable_polling {
        info!("Interactive mode enabled");
        let registry = Arc::new(ComputerRegistry::new());
        let ctx = Arc::new(BotContext::new(&config, registry, responder, reports));
        if let Err(e) = bot::run(ctx, transport, shutdown.clone()).await {
            error!("Polling stopped: {:#}", e);
            shutdown.cancel();
        }
    } else {
        info!("Polling disabled, running in scheduled mode only");
        shutdown.cancelled().await;
    }

    scheduler_task
        .await
        .context("Scheduler task panicked")??;

    info!("hostwatch stopped");
    Ok(())
}
