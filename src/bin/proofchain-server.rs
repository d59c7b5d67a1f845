#![forbid(unsafe_code)]
//! HTTP server for the proofchain ledger

use clap::Parser;
use proofchain::api::{run_api_server, Node};
use proofchain::blockchain::Blockchain;
use proofchain::config::{load_config, load_config_from};
use proofchain::persistence::Database;
use std::net::{SocketAddr, ToSocketAddrs};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "proofchain-server", version, about = "Serve the proofchain ledger over HTTP")]
struct Args {
    /// Path to a config.toml (defaults to ./config.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Address to bind, overrides network.host
    #[arg(long)]
    host: Option<String>,

    /// Port to bind, overrides network.api_port
    #[arg(long, short)]
    port: Option<u16>,

    /// SQLite audit log path, overrides database.path
    #[arg(long)]
    db: Option<String>,

    /// Give up a proof search after this many candidates, overrides miner.max_attempts
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    max_attempts: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    if let Some(host) = args.host {
        config.network.host = host;
    }
    if let Some(port) = args.port {
        config.network.api_port = port;
    }
    if let Some(db) = args.db {
        config.database.path = db;
    }
    if args.max_attempts.is_some() {
        config.miner.max_attempts = args.max_attempts;
    }

    let addr: SocketAddr = (config.network.host.as_str(), config.network.api_port)
        .to_socket_addrs()?
        .next()
        .ok_or_else(|| format!("Could not resolve {}:{}", config.network.host, config.network.api_port))?;

    info!(db = %config.database.path, max_attempts = ?config.miner.max_attempts, "Starting proofchain ledger");

    let db = Database::open(&config.database.path)?;
    let blockchain = Blockchain::new_with_persistence(Box::new(db))?
        .with_max_proof_attempts(config.miner.max_attempts);

    run_api_server(Arc::new(Node::new(blockchain)), addr).await?;
    Ok(())
}
