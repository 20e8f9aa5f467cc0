//! Market Relay Pipeline
//!
//! Runs the three stages in sequence:
//! list tokens -> (pause) -> fetch market cache -> forward each market.
//! Stage failures end the run early but are never raised; the report says
//! where and why the run stopped.

use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::adapters::circular::CircularClient;
use crate::adapters::forwarder::MarketForwarder;
use crate::adapters::http::ReqwestHttp;
use crate::domain::forward::ForwardSummary;
use crate::domain::outcome::StageError;
use crate::ports::http::HttpPort;

/// Pause between listing tokens and fetching the cache
pub const DEFAULT_STAGE_DELAY: Duration = Duration::from_secs(1);

/// Why a run stopped before forwarding
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HaltReason {
    #[error("Failed to get market tokens: {0}")]
    TokenListFailed(StageError),
    #[error("Token list was empty")]
    NoTokens,
    #[error("Failed to fetch market cache: {0}")]
    CacheFailed(StageError),
    #[error("No markets data to post")]
    NoMarkets,
}

/// Pipeline settings
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub stage_delay: Duration,
    pub only_jup: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            stage_delay: DEFAULT_STAGE_DELAY,
            only_jup: false,
        }
    }
}

/// Result of one pipeline run
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub tokens_listed: usize,
    pub markets_fetched: usize,
    /// Present only when the forward stage ran
    pub forward: Option<ForwardSummary>,
    /// Present only when the run stopped early
    pub halted: Option<HaltReason>,
}

impl PipelineReport {
    fn start() -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: Utc::now(),
            tokens_listed: 0,
            markets_fetched: 0,
            forward: None,
            halted: None,
        }
    }

    fn halt(mut self, reason: HaltReason) -> Self {
        tracing::debug!("{}", reason);
        self.halted = Some(reason);
        self.finish()
    }

    fn finish(mut self) -> Self {
        self.finished_at = Utc::now();
        self
    }

    pub fn completed(&self) -> bool {
        self.halted.is_none()
    }

    pub fn elapsed(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}

/// Sequential token -> cache -> forward relay
pub struct MarketPipeline<C = ReqwestHttp, F = ReqwestHttp> {
    circular: CircularClient<C>,
    forwarder: MarketForwarder<F>,
    config: PipelineConfig,
}

impl<C: HttpPort, F: HttpPort> MarketPipeline<C, F> {
    pub fn new(
        circular: CircularClient<C>,
        forwarder: MarketForwarder<F>,
        config: PipelineConfig,
    ) -> Self {
        Self { circular, forwarder, config }
    }

    /// Run every stage once
    pub async fn run(&self) -> PipelineReport {
        let mut report = PipelineReport::start();

        tracing::info!("Listing market tokens...");
        let tokens = match self.circular.list_market_tokens().await {
            Ok(tokens) if tokens.is_empty() => return report.halt(HaltReason::NoTokens),
            Ok(tokens) => tokens,
            Err(e) => return report.halt(HaltReason::TokenListFailed(e)),
        };
        report.tokens_listed = tokens.len();

        if !self.config.stage_delay.is_zero() {
            tokio::time::sleep(self.config.stage_delay).await;
        }

        tracing::info!(tokens = tokens.len(), "Now fetching market cache for returned tokens...");
        let markets = match self
            .circular
            .fetch_market_cache(&tokens, self.config.only_jup)
            .await
        {
            Ok(markets) if markets.is_empty() => return report.halt(HaltReason::NoMarkets),
            Ok(markets) => markets,
            Err(e) => return report.halt(HaltReason::CacheFailed(e)),
        };
        report.markets_fetched = markets.len();

        let summary = self.forwarder.forward_markets(&markets).await;
        if summary.failed() > 0 {
            tracing::warn!(
                failed = summary.failed(),
                attempted = summary.attempted(),
                "Some markets were not accepted by the local service"
            );
        }
        report.forward = Some(summary);

        report.finish()
    }
}
