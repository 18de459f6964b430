mod commands;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, ValueEnum};
use seller_client::{SelectionPolicy, SellerClient, SellerClientConfig};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use commands::Command;

/// Seller-side administration for the F1 shopping-cart backend
///
/// Credentials come from the config file or `F1_SELLER__APP_ID` /
/// `F1_SELLER__APP_SECRET`.
#[derive(Parser)]
#[command(name = "f1-seller", version, about, long_about = None)]
struct Cli {
    /// Path to configuration file (YAML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log verbosity level (-v info, -vv debug, -vvv trace); defaults to `RUST_LOG`
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Write logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    /// Override the configured gateway selection policy
    #[arg(long, value_enum, global = true)]
    selection: Option<Selection>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum Selection {
    SequentialFailover,
    RandomPick,
}

impl From<Selection> for SelectionPolicy {
    fn from(value: Selection) -> Self {
        match value {
            Selection::SequentialFailover => Self::SequentialFailover,
            Selection::RandomPick => Self::RandomPick,
        }
    }
}

fn init_tracing(verbose: u8, json: bool) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);
    if json {
        builder.json().init();
    } else {
        builder.compact().init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.json_logs);

    // 1) defaults -> 2) YAML (if provided) -> 3) env (F1_SELLER__*) -> 4) CLI overrides
    let mut config = SellerClientConfig::load(cli.config.as_deref())?;
    if let Some(selection) = cli.selection {
        config.rpc.selection = selection.into();
    }
    let credentials = config.credentials().context("invalid credentials")?;

    let cancel = CancellationToken::new();
    let client = SellerClient::new(credentials, config.rpc)
        .context("failed to build HTTP transport")?
        .with_cancellation_token(cancel.clone());

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupted, cancelling call");
            cancel.cancel();
        }
    });

    if let Some(output) = cli.command.execute(&client).await? {
        println!("{}", serde_json::to_string_pretty(&output)?);
    }
    Ok(())
}
