//! Netmon - interactive network topology editor.
//!
//! Edits the topologies of one branch, backed by the device catalog and
//! topology storage REST service. `--demo` runs against an in-memory store.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use iced::application;

use netmon::app::{Backend, NetmonApp};
use netmon::mock::MemoryStore;
use netmon_common::{HttpClient, NetmonConfig, default_config_path, init_tracing, load_config};

/// Interactive network topology editor.
#[derive(Parser, Debug)]
#[command(name = "netmon")]
#[command(about = "Edit network topology diagrams", long_about = None)]
struct Args {
    /// Path to the configuration file (JSON5 format).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the storage service base URL.
    #[arg(long)]
    base_url: Option<String>,

    /// Override the branch whose topologies are edited.
    #[arg(long)]
    branch: Option<u64>,

    /// Override the log level.
    #[arg(long)]
    log_level: Option<String>,

    /// Use built-in sample data instead of the storage service.
    #[arg(long)]
    demo: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = load(&args)?;
    if let Some(base_url) = args.base_url {
        config.storage.base_url = base_url;
    }
    if let Some(branch) = args.branch {
        config.storage.branch_id = branch;
    }
    if let Some(level) = args.log_level {
        config.logging.level = level;
    }
    config
        .editor
        .validate()
        .context("Invalid editor configuration")?;

    init_tracing(&config.logging).context("Failed to initialize tracing")?;

    if args.demo {
        tracing::info!("Starting netmon with sample data");
        run(MemoryStore::with_sample_data(), config)
    } else {
        tracing::info!(
            base_url = %config.storage.base_url,
            branch_id = config.storage.branch_id,
            "Starting netmon"
        );
        let client = HttpClient::new(&config.storage).context("Failed to create HTTP client")?;
        run(client, config)
    }
}

/// Explicit `--config`, else the default location if it exists, else defaults.
fn load(args: &Args) -> Result<NetmonConfig> {
    if let Some(path) = &args.config {
        return load_config(path).with_context(|| format!("Failed to load config from {:?}", path));
    }
    match default_config_path() {
        Some(path) if path.exists() => {
            load_config(&path).with_context(|| format!("Failed to load config from {:?}", path))
        }
        _ => Ok(NetmonConfig::default()),
    }
}

fn run<S: Backend>(store: S, config: NetmonConfig) -> Result<()> {
    application(
        move || NetmonApp::boot(store.clone(), config.clone()),
        NetmonApp::<S>::update,
        NetmonApp::<S>::view,
    )
    .title(NetmonApp::<S>::title)
    .subscription(NetmonApp::<S>::subscription)
    .theme(NetmonApp::<S>::theme)
    .run()
    .map_err(|e| anyhow::anyhow!("Application error: {}", e))
}
