//! Wordmint API Server Binary
//!
//! Opens the backing store, wires the session and ledger cores, and serves
//! the publisher HTTP API.

use clap::Parser;
use std::sync::Arc;
use wordmint::api::handlers::AppState;
use wordmint::api::ApiServer;
use wordmint::config::{ConfigLoader, WordmintConfig};
use wordmint::directory::{StoredPublishers, StoredWords};
use wordmint::ledger::Ledger;
use wordmint::locks::LockRegistry;
use wordmint::session::SessionManager;
use wordmint::storage::Storage;

#[derive(Parser, Debug)]
#[command(name = "wordmint-api")]
#[command(about = "Wordmint Publisher API Server", long_about = None)]
struct Args {
    /// Path to a TOML configuration file
    #[arg(long)]
    config: Option<String>,

    /// API server host
    #[arg(long)]
    host: Option<String>,

    /// API server port
    #[arg(long)]
    port: Option<u16>,

    /// Database directory
    #[arg(long)]
    db_path: Option<String>,

    /// Allowed CORS origins (comma-separated, use * for all)
    #[arg(long)]
    cors_origins: Option<String>,

    /// Request timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,
}

fn load_config(args: &Args) -> Result<WordmintConfig, Box<dyn std::error::Error>> {
    let loader = match &args.config {
        Some(path) => ConfigLoader::new().with_path(path),
        None => ConfigLoader::new(),
    };
    let mut config = loader.load()?;

    // CLI flags override file and environment values.
    if let Some(host) = &args.host {
        config.api.host = host.clone();
    }
    if let Some(port) = args.port {
        config.api.port = port;
    }
    if let Some(db_path) = &args.db_path {
        config.storage.data_dir = db_path.clone();
    }
    if let Some(origins) = &args.cors_origins {
        config.api.cors_origins = origins.split(',').map(|s| s.trim().to_string()).collect();
    }
    if let Some(timeout) = args.timeout {
        config.api.request_timeout_secs = timeout;
    }

    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = load_config(&args)?;

    println!("Opening database: {}", config.storage.data_dir);
    let storage = Arc::new(Storage::new_with_config(&config.storage)?);
    println!("Database opened successfully");

    let locks = Arc::new(LockRegistry::new());
    let words = Arc::new(StoredWords::new(storage.clone()));
    let publishers = Arc::new(StoredPublishers::new(storage.clone()));

    let state = Arc::new(AppState {
        sessions: SessionManager::new(storage.clone(), words, locks.clone()),
        ledger: Ledger::new(storage, locks),
        publishers,
        version: env!("CARGO_PKG_VERSION").to_string(),
    });

    let server = ApiServer::new(config.api, state);
    server.run().await?;

    Ok(())
}
