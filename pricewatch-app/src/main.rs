use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use pricewatch_common::observability::{LogFormat, init_logging};
use pricewatch_config::DEFAULT_CONFIG_FILE;
use pricewatch_notify::Notifiers;
use pricewatch_tracker::{Tracker, check};
use std::path::PathBuf;
use std::process::ExitCode;
mod wiring;

#[derive(Parser, Debug)]
#[command(name = "pricewatch", version, about = "Track Best Buy product prices and stock")]
struct Cli {
    /// YAML config file (default: ./pricewatch.yaml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log encoding, overrides `logging.format`
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,

    /// Debug-level logs, mirrored to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Track every product once, alert on changes, update history (default)
    Track(TrackArgs),
    /// Print one product's current state; no history, no alerts
    Check {
        url: String,
    },
}

#[derive(Args, Debug, Default)]
struct TrackArgs {
    /// Product page URL; repeat for several. Replaces `products` from config.
    #[arg(long = "url")]
    urls: Vec<String>,

    /// History file, overrides `history_path`
    #[arg(long)]
    history: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // 1) Config (env wins over file)
    let cfg = wiring::load_config(cli.config.as_deref())?;

    // 2) Logging
    let mut log_cfg = wiring::log_config(&cfg.logging, cli.verbose);
    if let Some(format) = cli.log_format {
        log_cfg.format = format;
    }
    let log_path = init_logging(log_cfg)?;
    tracing::debug!(log=%log_path.display(), "app.logging.ready");

    let client = wiring::http_client(&cfg.http)?;
    let mut out = std::io::stdout().lock();

    match cli.command.unwrap_or(Command::Track(TrackArgs::default())) {
        Command::Track(args) => {
            let urls = if args.urls.is_empty() {
                cfg.products.clone()
            } else {
                args.urls
            };
            if urls.is_empty() {
                bail!("no products to track: list them under `products` in {DEFAULT_CONFIG_FILE} or pass --url");
            }
            let history_path = args.history.unwrap_or_else(|| cfg.history_path.clone());

            let notifiers =
                Notifiers::from_config(&cfg.notify).context("failed to set up notifications")?;
            let mut tracker = Tracker::load(client, notifiers, history_path)
                .context("failed to load price history")?;
            tracker.run(&urls, &mut out).await?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Check { url } => {
            let found = check(&client, &url, &mut out).await?;
            Ok(if found {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
    }
}
