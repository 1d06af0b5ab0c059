//! gpuinfod — the gpuinfo daemon.
//!
//! Hosts the placement controller over a redb state store and an inventory
//! snapshot. While running, requests and nodes are managed through the HTTP
//! API (see [`api`]). The `apply` and `get` commands open the store directly
//! and only work while no controller holds it.
//!
//! # Usage
//!
//! ```text
//! gpuinfod --config gpuinfo.toml apply --file manifest.toml
//! gpuinfod --config gpuinfo.toml run --listen 127.0.0.1:8480
//! curl localhost:8480/api/v1/requests/ml/train
//! ```

mod api;
mod manifest;

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use gpuinfo_controller::{Controller, Reconciler};
use gpuinfo_core::GpuInfoConfig;
use gpuinfo_inventory::InMemoryInventory;
use gpuinfo_placement::SimulatedAttributeSource;
use gpuinfo_state::StateStore;
use tokio::sync::watch;
use tracing::{error, info};

use crate::manifest::Manifest;

#[derive(Parser)]
#[command(name = "gpuinfod", about = "GPU-aware placement controller")]
struct Cli {
    /// Configuration file. Built-in defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the controller and its HTTP API until interrupted.
    Run {
        /// Address the HTTP API listens on.
        #[arg(long, default_value = "127.0.0.1:8480")]
        listen: SocketAddr,
    },
    /// Write the nodes and requests of a manifest into the store.
    Apply {
        /// Manifest file (TOML).
        #[arg(long)]
        file: PathBuf,
    },
    /// Print stored requests as JSON.
    Get {
        /// `namespace/name` of a single request.
        key: Option<String>,
    },
    /// Print the effective configuration.
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new("info,gpuinfod=debug,gpuinfo=debug")
            }),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => GpuInfoConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => GpuInfoConfig::default(),
    };

    match cli.command {
        Command::Run { listen } => run(config, listen).await,
        Command::Apply { file } => apply(&config, &file),
        Command::Get { key } => get(&config, key.as_deref()),
        Command::Config => {
            print!("{}", config.to_toml_string()?);
            Ok(())
        }
    }
}

async fn run(config: GpuInfoConfig, listen: SocketAddr) -> anyhow::Result<()> {
    info!("gpuinfod starting");
    let interval = config.controller.resync_interval()?;

    let store = StateStore::open(&config.state.path)?;
    info!(path = ?config.state.path, "state store opened");

    let inventory = InMemoryInventory::load(&config.inventory.snapshot)
        .with_context(|| format!("loading inventory {}", config.inventory.snapshot.display()))?;
    info!(path = ?config.inventory.snapshot, "inventory loaded");

    let attributes = SimulatedAttributeSource::new(&config.simulation);
    info!(seed = ?attributes.seed(), "simulated accelerator attributes");

    let reconciler = Reconciler::new(store.clone(), Arc::new(inventory), Arc::new(attributes));
    let mut controller = Controller::new(reconciler, config.controller.max_concurrent_reconciles);

    // ── Shutdown signal ────────────────────────────────────────

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let controller_handle = tokio::spawn(async move {
        controller.run(interval, shutdown_rx).await;
    });

    // ── API server ─────────────────────────────────────────────

    let router = api::build_router(store);
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .with_context(|| format!("binding {listen}"))?;
    info!(addr = %listen, "API server starting");

    // Graceful shutdown on Ctrl-C.
    let server = axum::serve(listener, router).with_graceful_shutdown(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to install Ctrl-C handler");
        }
        info!("shutdown signal received");
        let _ = shutdown_tx.send(true);
    });

    server.await?;
    controller_handle.await?;
    info!("gpuinfod stopped");
    Ok(())
}

fn apply(config: &GpuInfoConfig, file: &Path) -> anyhow::Result<()> {
    let manifest =
        Manifest::load(file).with_context(|| format!("loading manifest {}", file.display()))?;
    let store = open_offline(config)?;
    let applied = manifest.apply(&store)?;
    println!(
        "applied {} node(s) and {} request(s)",
        applied.nodes, applied.requests
    );
    Ok(())
}

fn get(config: &GpuInfoConfig, key: Option<&str>) -> anyhow::Result<()> {
    let store = open_offline(config)?;
    let output = match key {
        Some(key) => {
            let request = store
                .get_request(key)?
                .with_context(|| format!("request {key} not found"))?;
            serde_json::to_string_pretty(&request)?
        }
        None => serde_json::to_string_pretty(&store.list_requests()?)?,
    };
    println!("{output}");
    Ok(())
}

/// Open the store for a one-shot command.
fn open_offline(config: &GpuInfoConfig) -> anyhow::Result<StateStore> {
    StateStore::open(&config.state.path).with_context(|| {
        format!(
            "opening {} (if gpuinfod is running, use its HTTP API instead)",
            config.state.path.display()
        )
    })
}
