//! Market Relay
//!
//! Pulls recently active tokens and their markets from the Circular API and
//! posts each market to a local service.

use anyhow::Result;
use clap::Parser;

use market_relay::adapters::cli::{self, CliApp};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (CIRCULAR_API_KEY goes here, not in config.toml)
    dotenvy::dotenv().ok();

    let app = CliApp::parse();
    cli::execute(app).await
}
