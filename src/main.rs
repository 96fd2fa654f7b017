//! Lehrer-Assistent CLI
//!
//! Starts the terminal gradebook.

use clap::Parser;
use lehrer_assistent::remote::{ApiClient, MailWriter};
use lehrer_assistent::tui::{App, AppState};
use lehrer_assistent::{AppConfig, DomainStore};
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Lehrer-Assistent - grades and parent mails in the terminal
#[derive(Parser, Debug)]
#[command(name = "lehrer-assistent")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory for the student and grade files
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Path to the config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Base URL of the school API
    #[arg(long)]
    api_base: Option<String>,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref())?.with_verbose(cli.verbose);
    if let Some(dir) = cli.data_dir {
        config = config.with_data_dir(dir);
    }
    if let Some(url) = cli.api_base {
        config = config.with_api_base_url(url);
    }

    std::fs::create_dir_all(&config.data_dir)?;
    init_logging(&config)?;

    info!("Starting Lehrer-Assistent {}", env!("CARGO_PKG_VERSION"));
    info!("Data directory: {:?}", config.data_dir);
    info!("School API: {}", config.api_base_url);

    let store = DomainStore::open(&config.data_dir).await?;
    let api = ApiClient::new(config.api_base_url.clone());
    let writer = MailWriter::new(config.ai.clone());

    let mut app = App::new(AppState::new(store, api, writer))?;
    app.run().await?;

    Ok(())
}

/// The TUI owns stdout, so logs go to a file in the data directory.
fn init_logging(config: &AppConfig) -> anyhow::Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(config.log_file())?;

    let default_level = if config.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .init();
    Ok(())
}
