/*
[INPUT]:  CLI arguments, YAML configuration file, OS shutdown signals
[OUTPUT]: Command results printed as JSON, streamed events for watch
[POS]:    Binary entry point
[UPDATE]: When changing CLI flags, startup flow, or shutdown handling
*/

mod commands;
mod config;
mod filter;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use cocobase::{CocobaseClient, FileStorage};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use commands::Command;
use config::CliConfig;

#[derive(Parser, Debug)]
#[command(name = "cocobase", version, about = "Cocobase command-line client")]
struct Cli {
    #[arg(long = "config", value_name = "PATH", global = true)]
    config_path: Option<PathBuf>,
    #[arg(long = "base-url", value_name = "URL", global = true)]
    base_url: Option<String>,
    #[arg(long = "api-key", value_name = "KEY", global = true)]
    api_key: Option<String>,
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info", global = true)]
    log_level: String,
    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(&args.log_level)?;

    let config = CliConfig::load(args.config_path.as_deref())
        .context("load config")?
        .apply_env(|key| std::env::var(key).ok())
        .apply_overrides(args.base_url, args.api_key);

    let session_path = config.session_path()?;
    debug!(session_file = %session_path.display(), "opening session");
    let storage = FileStorage::open(&session_path)
        .await
        .context("open session file")?;

    let client = CocobaseClient::with_storage(config.client_config(), Arc::new(storage))
        .context("create client")?;
    if let Err(err) = client.init_auth().await {
        warn!(error = %err, "stored session could not be restored");
    }

    let shutdown = CancellationToken::new();
    if args.command.is_long_running() {
        setup_signal_handlers(shutdown.clone());
    }

    if let Some(output) = commands::run(&client, args.command, shutdown).await? {
        println!("{}", serde_json::to_string_pretty(&output)?);
    }
    Ok(())
}

fn init_tracing(log_level: &str) -> Result<()> {
    let filter = EnvFilter::try_new(log_level).context("invalid log level")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow!(err))
        .context("initialize tracing subscriber")?;
    Ok(())
}

fn setup_signal_handlers(shutdown: CancellationToken) {
    let shutdown_clone = shutdown.clone();
    tokio::spawn(async move {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "failed to install SIGINT handler");
            return;
        }
        info!("received SIGINT");
        shutdown_clone.cancel();
    });

    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let shutdown_clone = shutdown.clone();
        tokio::spawn(async move {
            match signal(SignalKind::terminate()) {
                Ok(mut stream) => {
                    stream.recv().await;
                    info!("received SIGTERM");
                    shutdown_clone.cancel();
                }
                Err(err) => {
                    warn!(error = %err, "failed to install SIGTERM handler");
                }
            }
        });
    }
}
