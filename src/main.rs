use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use craftbridge::core::Supervisor;
use craftbridge::registry::{MemoryRegistry, RemoteServerRef, ServerAddress};
use craftbridge::sink::{ChannelId, WebhookSink};
use craftbridge::{config, context, logging};
use serde::Serialize;

#[derive(Parser)]
#[command(name = "craftbridge")]
#[command(about = "Remote game server RPC/event bridge", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, global = true, default_value = "craftbridge.toml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the bridge until interrupted.
    Run(RunArgs),
}

#[derive(Args, Serialize)]
struct RunArgs {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[arg(long)]
    sweep_interval_secs: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[arg(long)]
    rpc_timeout_secs: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[arg(long)]
    verbose: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[arg(long)]
    log_json: Option<bool>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let Commands::Run(args) = &cli.command;

    let config = config::AppConfig::load(&cli.config, Some(args))
        .with_context(|| format!("failed to load config from {}", cli.config))?;
    logging::init(logging::LogConfig {
        json: config.log_json,
        verbose: config.verbose,
    });

    let registry = Arc::new(MemoryRegistry::new());
    for entry in &config.servers {
        registry
            .add(RemoteServerRef {
                name: entry.name.clone(),
                address: ServerAddress::new(entry.host.clone(), entry.port),
                channel: ChannelId(entry.channel),
            })
            .await
            .with_context(|| format!("invalid server entry `{}`", entry.name))?;
    }

    let webhooks: HashMap<ChannelId, String> = config
        .webhooks
        .iter()
        .map(|hook| (ChannelId(hook.channel), hook.url.clone()))
        .collect();
    let sink = Arc::new(WebhookSink::new(webhooks));

    let ctx = context::AppContext::new(config, registry, sink);
    let supervisor = Supervisor::new(ctx);
    supervisor.start_monitoring();
    tracing::info!("craftbridge running, press ctrl-c to stop");

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    supervisor.stop_monitoring().await;

    Ok(())
}
