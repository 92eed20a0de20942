//! warpcore_init - One-time world database initialization tool
//!
//! Creates a fresh world database, optionally seeded with worlds.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use warpcore::init::WorldSeed;

/// Warpcore world database initialization tool
#[derive(Parser, Debug)]
#[command(
    name = "warpcore_init",
    version,
    about = "Initialize a new warpcore world database"
)]
struct Args {
    /// Path to SQLite database file to create (must not exist)
    #[arg(short, long)]
    database: PathBuf,

    /// World to seed, as NAME[:ENVIRONMENT[:X,Y,Z]] (can be specified multiple times)
    #[arg(long = "world")]
    worlds: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warpcore=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Parse CLI arguments
    let args = Args::parse();

    let mut seeds = Vec::new();
    for raw in &args.worlds {
        seeds.push(WorldSeed::parse(raw)?);
    }

    // Initialize the store
    warpcore::init::init_store(&args.database, seeds).await?;

    Ok(())
}
