//! CLI Command Handlers
//!
//! Implementation of all CLI commands for the market relay.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::adapters::circular::CircularClient;
use crate::adapters::forwarder::MarketForwarder;
use crate::application::{MarketPipeline, PipelineReport};
use crate::config::{load_config, Config};
use crate::domain::market::TokenId;

/// Market Relay - Circular market cache to local service relay
#[derive(Parser, Debug)]
#[command(
    name = "market-relay",
    version = env!("CARGO_PKG_VERSION"),
    author = env!("CARGO_PKG_AUTHORS"),
    about = "Relays Circular market data to a local market service",
    long_about = "Lists recently active tokens from the Circular market API, fetches the \
                  market cache for them and posts every market to a local service. \
                  With no subcommand the full relay runs once with default settings."
)]
pub struct CliApp {
    /// The command to execute (defaults to `run`)
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the full relay once: tokens -> cache -> forward
    Run(RunCmd),

    /// List market tokens only and print them as JSON
    Tokens(TokensCmd),

    /// Fetch the market cache for the given tokens and print it as JSON
    Cache(CacheCmd),
}

/// Run the full relay
#[derive(Parser, Debug, Default)]
pub struct RunCmd {
    /// Path to configuration file (defaults are used when omitted)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Only fetch Jupiter-routable markets
    #[arg(long)]
    pub only_jup: bool,

    /// Override the local forwarding endpoint
    #[arg(long, value_name = "URL")]
    pub forward_url: Option<String>,
}

/// List market tokens
#[derive(Parser, Debug)]
pub struct TokensCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

/// Fetch the market cache
#[derive(Parser, Debug)]
pub struct CacheCmd {
    /// Token mints to fetch markets for
    #[arg(value_name = "TOKEN", required = true)]
    pub tokens: Vec<String>,

    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Only fetch Jupiter-routable markets
    #[arg(long)]
    pub only_jup: bool,
}

/// Execute the CLI command
pub async fn execute(app: CliApp) -> Result<()> {
    let command = app.command.unwrap_or(Command::Run(RunCmd::default()));

    let config_path = match &command {
        Command::Run(cmd) => cmd.config.as_ref(),
        Command::Tokens(cmd) => cmd.config.as_ref(),
        Command::Cache(cmd) => cmd.config.as_ref(),
    };
    let config = resolve_config(config_path)?;

    init_logging(app.verbose, app.debug, &config.logging.level)?;

    match command {
        Command::Run(cmd) => run_command(cmd, config).await,
        Command::Tokens(_) => tokens_command(config).await,
        Command::Cache(cmd) => cache_command(cmd, config).await,
    }
}

/// Load the config file if one was given, otherwise fall back to defaults
fn resolve_config(path: Option<&PathBuf>) -> Result<Config> {
    match path {
        Some(path) => {
            let expanded = shellexpand::tilde(&path.to_string_lossy()).to_string();
            load_config(&expanded)
                .with_context(|| format!("Failed to load configuration from {}", expanded))
        }
        None => {
            let config = Config::default();
            config.validate().context("Default configuration is invalid")?;
            Ok(config)
        }
    }
}

/// Initialize logging system
fn init_logging(verbose: bool, debug: bool, config_level: &str) -> Result<()> {
    use tracing_subscriber::{fmt, EnvFilter};

    let level = if debug {
        "debug"
    } else if verbose {
        "info"
    } else {
        config_level
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

/// Handle run command
async fn run_command(cmd: RunCmd, mut config: Config) -> Result<()> {
    if let Some(url) = cmd.forward_url {
        config.forwarder.url = url;
    }
    if cmd.only_jup {
        config.cache.only_jup = true;
    }
    config.validate().context("Invalid command-line overrides")?;

    let circular = CircularClient::new(config.circular_config()?)
        .context("Failed to create Circular client")?;
    let forwarder = MarketForwarder::new(config.forwarder_config())
        .context("Failed to create market forwarder")?;
    let pipeline = MarketPipeline::new(circular, forwarder, config.pipeline_config());

    tracing::info!("Starting market relay...");
    let report = pipeline.run().await;
    log_report(&report);

    // Stage failures are reported, not turned into a failing exit code
    Ok(())
}

fn log_report(report: &PipelineReport) {
    let elapsed_ms = report.elapsed().num_milliseconds();
    match (&report.halted, &report.forward) {
        (Some(reason), _) => {
            tracing::warn!(elapsed_ms, "Relay stopped early: {}", reason);
        }
        (None, Some(summary)) => {
            tracing::info!(
                tokens = report.tokens_listed,
                markets = report.markets_fetched,
                forwarded = summary.succeeded(),
                failed = summary.failed(),
                elapsed_ms,
                "Relay finished"
            );
            for failure in summary.failures() {
                if let Err(ref e) = failure.result {
                    tracing::warn!(address = %failure.address, "Not forwarded: {}", e);
                }
            }
        }
        (None, None) => tracing::info!(elapsed_ms, "Relay finished"),
    }
}

/// Handle tokens command
async fn tokens_command(config: Config) -> Result<()> {
    let circular = CircularClient::new(config.circular_config()?)
        .context("Failed to create Circular client")?;

    let tokens = circular
        .list_market_tokens()
        .await
        .context("Failed to get market tokens")?;

    println!("{}", serde_json::to_string_pretty(&tokens)?);
    Ok(())
}

/// Handle cache command
async fn cache_command(cmd: CacheCmd, config: Config) -> Result<()> {
    let circular = CircularClient::new(config.circular_config()?)
        .context("Failed to create Circular client")?;

    let tokens: Vec<TokenId> = cmd.tokens.into_iter().map(TokenId::from).collect();
    let only_jup = cmd.only_jup || config.cache.only_jup;

    let markets = circular
        .fetch_market_cache(&tokens, only_jup)
        .await
        .context("Failed to fetch market cache")?;

    println!("{}", serde_json::to_string_pretty(&markets)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        CliApp::command().debug_assert();
    }

    #[test]
    fn test_no_subcommand_parses() {
        let app = CliApp::try_parse_from(["market-relay"]).unwrap();
        assert!(app.command.is_none());
        assert!(!app.verbose);
    }

    #[test]
    fn test_run_overrides_parse() {
        let app = CliApp::try_parse_from([
            "market-relay",
            "-v",
            "run",
            "--config",
            "relay.toml",
            "--only-jup",
            "--forward-url",
            "http://127.0.0.1:9000/add-market",
        ])
        .unwrap();

        assert!(app.verbose);
        match app.command {
            Some(Command::Run(cmd)) => {
                assert_eq!(cmd.config, Some(PathBuf::from("relay.toml")));
                assert!(cmd.only_jup);
                assert_eq!(cmd.forward_url.as_deref(), Some("http://127.0.0.1:9000/add-market"));
            }
            other => panic!("expected run, got {:?}", other),
        }
    }

    #[test]
    fn test_cache_requires_tokens() {
        assert!(CliApp::try_parse_from(["market-relay", "cache"]).is_err());

        let app = CliApp::try_parse_from(["market-relay", "cache", "TOK1", "TOK2"]).unwrap();
        match app.command {
            Some(Command::Cache(cmd)) => assert_eq!(cmd.tokens, vec!["TOK1", "TOK2"]),
            other => panic!("expected cache, got {:?}", other),
        }
    }

    #[test]
    fn test_resolve_config_defaults_without_path() {
        let config = resolve_config(None).unwrap();
        assert_eq!(config.forwarder.url, "http://localhost:8080/add-market");
    }

    #[test]
    fn test_resolve_config_missing_file() {
        let path = PathBuf::from("/nonexistent/relay.toml");
        assert!(resolve_config(Some(&path)).is_err());
    }
}
