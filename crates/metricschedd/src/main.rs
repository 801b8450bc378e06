//! metricschedd — places pending pods on the node with the best telemetry
//! metric.
//!
//! # Usage
//!
//! ```text
//! metricschedd --config /etc/metricsched.toml run
//! metricschedd rank ip-10-0-0-1.ec2.internal ip-10-0-0-2.ec2.internal
//! metricschedd nodes
//! ```

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use metricsched_core::SchedConfig;
use metricschedd::build_extender;
use serde_json::json;
use tokio::sync::watch;
use tracing::info;

#[derive(Parser)]
#[command(name = "metricschedd", about = "Telemetry-driven pod scheduler")]
struct Cli {
    /// Path to a TOML config file. Defaults apply to every missing key.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override `telemetry_url`.
    #[arg(long, global = true)]
    telemetry_url: Option<String>,

    /// Override `kube_url`.
    #[arg(long, global = true)]
    kube_url: Option<String>,

    /// Prefer the node with the lowest metric.
    #[arg(long, global = true)]
    lower_is_better: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Poll for pending pods and bind them until interrupted.
    Run,
    /// Rank the given nodes once and print the result as JSON.
    Rank {
        /// Node names as registered in the cluster.
        #[arg(required = true)]
        nodes: Vec<String>,
    },
    /// Print the ready node names.
    Nodes,
}

impl Cli {
    fn load_config(&self) -> anyhow::Result<SchedConfig> {
        let mut config = match &self.config {
            Some(path) => SchedConfig::from_file(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => SchedConfig::default(),
        };
        if let Some(url) = &self.telemetry_url {
            config.telemetry_url = url.clone();
        }
        if let Some(url) = &self.kube_url {
            config.kube_url = url.clone();
        }
        if self.lower_is_better {
            config.lower_is_better = true;
        }
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,metricsched=debug")),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.load_config()?;

    match cli.command {
        Command::Run => run(config).await,
        Command::Rank { nodes } => rank(config, nodes).await,
        Command::Nodes => list_nodes(config).await,
    }
}

async fn run(config: SchedConfig) -> anyhow::Result<()> {
    info!(
        telemetry = %config.telemetry_url,
        kube = %config.kube_url,
        scheduler = %config.scheduler_name,
        lower_is_better = config.lower_is_better,
        "metricsched daemon starting"
    );

    let extender = build_extender(&config)?;
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install CTRL+C handler");
            // Keep the sender alive so the loop is not stopped by its drop.
            std::future::pending::<()>().await;
        }
        info!("shutdown signal received");
        let _ = shutdown_tx.send(true);
    });

    extender.run(shutdown_rx).await;

    info!("metricsched daemon stopped");
    Ok(())
}

async fn rank(config: SchedConfig, nodes: Vec<String>) -> anyhow::Result<()> {
    let extender = build_extender(&config)?;
    let engine = extender.engine();
    let pass = engine.rank(nodes.as_slice()).await?;

    let best = pass.best(engine.options().lower_is_better);
    let report = json!({
        "lower_is_better": engine.options().lower_is_better,
        "best": best,
        "ranked": pass.ranked,
        "failed": pass.failed,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

async fn list_nodes(config: SchedConfig) -> anyhow::Result<()> {
    let extender = build_extender(&config)?;
    for name in extender.lister().ready_nodes().await {
        println!("{name}");
    }
    Ok(())
}
