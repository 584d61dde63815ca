use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};

use playbill_watcher::config::AppConfig;
use playbill_watcher::logging::init_logging;
use playbill_watcher::models::{SearchOutcome, DISPLAY_TITLE_CHARS};
use playbill_watcher::notifiers::{ConsoleNotifier, Notifier, TelegramNotifier};
use playbill_watcher::scraper::ChromeSessionFactory;
use playbill_watcher::search::{SearchClient, Searcher};
use playbill_watcher::Monitor;

#[derive(Parser)]
#[command(name = "playbill-watcher", version, about = "Checks playbill search results and reports changes to Telegram")]
struct Cli {
    /// TOML configuration file (defaults to config/default.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run one monitoring pass over the configured queries (the default)
    Run {
        /// Print the message instead of sending it to Telegram
        #[arg(long)]
        dry_run: bool,
    },
    /// Search once and print what the site returns, without notifying
    Inspect {
        /// Query text; defaults to the first configured query
        #[arg(long)]
        query: Option<String>,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Send a test message to the configured Telegram chat
    TestNotify {
        #[arg(long)]
        message: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = AppConfig::from_env(cli.config.as_deref())?;
    let _guard = init_logging(&config.logging)?;

    info!("Starting playbill watcher...");

    match cli.command.unwrap_or(Command::Run { dry_run: false }) {
        Command::Run { dry_run } => run_once(&config, dry_run).await,
        Command::Inspect { query, limit } => inspect(&config, query, limit).await,
        Command::TestNotify { message } => test_notify(&config, message).await,
    }
}

fn search_client(config: &AppConfig) -> SearchClient {
    let factory = Arc::new(ChromeSessionFactory::new(config.scraper.clone()));
    SearchClient::new(factory, config.site.clone(), &config.scraper)
}

async fn run_once(config: &AppConfig, dry_run: bool) -> Result<ExitCode> {
    let queries = config.query_specs()?;

    let notifier: Arc<dyn Notifier> = if dry_run {
        Arc::new(ConsoleNotifier::new())
    } else {
        Arc::new(TelegramNotifier::new(config.telegram.clone())?)
    };
    let monitor = Monitor::new(Arc::new(search_client(config)), notifier, config.site.url.clone());

    let outcome = monitor.run(&queries).await;

    if let Some(fatal) = &outcome.fatal_error {
        error!(%fatal, "Run aborted");
        return Ok(ExitCode::FAILURE);
    }
    if outcome.delivered == Some(false) {
        error!("Deviation report could not be delivered");
    }
    info!(deviations = outcome.fragments.len(), "Run complete");
    Ok(ExitCode::SUCCESS)
}

async fn inspect(config: &AppConfig, query: Option<String>, limit: usize) -> Result<ExitCode> {
    let query = match query {
        Some(query) => query,
        None => config
            .query_specs()?
            .into_iter()
            .next()
            .map(|spec| spec.text)
            .ok_or_else(|| anyhow::anyhow!("No query configured"))?,
    };

    match search_client(config).search(&query).await {
        SearchOutcome::Rows(rows) if rows.is_empty() => {
            println!("❌ No results for '{}'", query);
        }
        SearchOutcome::Rows(rows) => {
            println!("✅ Found {} events for '{}':", rows.len(), query);
            println!("{}", "=".repeat(60));
            for (i, row) in rows.iter().take(limit).enumerate() {
                println!("{}. {} | {}", i + 1, row.display_date(), row.display_title(DISPLAY_TITLE_CHARS));
            }
        }
        SearchOutcome::Unavailable(reason) => {
            println!("❌ Error: {}", reason);
            return Ok(ExitCode::FAILURE);
        }
    }
    Ok(ExitCode::SUCCESS)
}

async fn test_notify(config: &AppConfig, message: Option<String>) -> Result<ExitCode> {
    let notifier = TelegramNotifier::new(config.telegram.clone())?;

    println!("Sending message to Telegram...");
    let delivered = match message {
        Some(text) => notifier.deliver(&text).await,
        None => notifier.send_test_message().await,
    };
    if delivered {
        println!("✅ Message sent");
        Ok(ExitCode::SUCCESS)
    } else {
        println!("❌ Sending failed, see the log for details");
        Ok(ExitCode::FAILURE)
    }
}
