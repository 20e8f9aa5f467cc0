//! Market Forwarder
//!
//! Stage 3 of the relay: POST each market to the local market service, one
//! at a time and in order. A failed market is logged and recorded in the
//! summary; the loop always moves on to the next one.

use std::time::Duration;

use crate::adapters::exchange::{exchange, BodyExpectation};
use crate::adapters::http::{ReqwestHttp, DEFAULT_TIMEOUT};
use crate::domain::forward::{ForwardOutcome, ForwardSummary};
use crate::domain::market::MarketRecord;
use crate::domain::outcome::{RequestOutcome, StatusPolicy};
use crate::ports::http::{HttpPort, HttpRequest, TransportError};

/// Default local market service endpoint
pub const DEFAULT_FORWARD_URL: &str = "http://localhost:8080/add-market";

/// Forwarder configuration
#[derive(Debug, Clone)]
pub struct ForwarderConfig {
    pub url: String,
    pub timeout: Duration,
}

impl Default for ForwarderConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_FORWARD_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Posts market records to the local service
#[derive(Debug, Clone)]
pub struct MarketForwarder<H = ReqwestHttp> {
    config: ForwarderConfig,
    http: H,
}

impl MarketForwarder<ReqwestHttp> {
    pub fn new(config: ForwarderConfig) -> Result<Self, TransportError> {
        let http = ReqwestHttp::with_timeout(config.timeout)?;
        Ok(Self { config, http })
    }
}

impl<H: HttpPort> MarketForwarder<H> {
    pub fn with_http(config: ForwarderConfig, http: H) -> Self {
        Self { config, http }
    }

    pub fn url(&self) -> &str {
        &self.config.url
    }

    /// Forward every market, returning one outcome per market in input order
    pub async fn forward_markets(&self, markets: &[MarketRecord]) -> ForwardSummary {
        tracing::info!(count = markets.len(), url = %self.config.url, "Posting markets");

        let mut summary = ForwardSummary::default();
        for market in markets {
            summary.record(self.forward_one(market).await);
        }

        tracing::info!(
            attempted = summary.attempted(),
            succeeded = summary.succeeded(),
            failed = summary.failed(),
            "Finished posting markets"
        );
        summary
    }

    async fn forward_one(&self, market: &MarketRecord) -> ForwardOutcome {
        let address = market.address().to_string();
        tracing::info!(%address, "Posting market");

        let request = HttpRequest::post(self.config.url.clone())
            .header("Content-Type", "application/json")
            .json(market.as_value().clone());

        // Status alone decides success here; a non-JSON 2xx body is still a success
        let outcome = exchange(
            &self.http,
            "forward",
            request,
            StatusPolicy::RequireSuccess,
            BodyExpectation::Any,
        )
        .await;
        let result = match outcome {
            RequestOutcome::Json { status, .. } | RequestOutcome::Text { status, .. } => Ok(status),
            RequestOutcome::Failed(failure) => {
                tracing::warn!(%address, "Error posting market: {}", failure);
                Err(failure)
            }
        };

        ForwardOutcome { address, result }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::outcome::RequestFailure;
    use crate::ports::http::HttpMethod;
    use crate::ports::mocks::{LogCapture, MockHttp};
    use serde_json::json;
    use tracing::Level;

    fn forwarder(mock: &MockHttp) -> MarketForwarder<MockHttp> {
        MarketForwarder::with_http(ForwarderConfig::default(), mock.clone())
    }

    fn markets(addresses: &[&str]) -> Vec<MarketRecord> {
        addresses
            .iter()
            .map(|a| MarketRecord::new(json!({"address": a, "liquidity": 1000})))
            .collect()
    }

    #[test]
    fn test_forwarder_config_default() {
        let config = ForwarderConfig::default();
        assert_eq!(config.url, "http://localhost:8080/add-market");
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[tokio::test]
    async fn test_forwards_each_market_in_order() {
        let mock = MockHttp::new().on_post_json(DEFAULT_FORWARD_URL, 200, json!({"ok": true}));
        let input = markets(&["M1", "M2", "M3"]);

        let summary = forwarder(&mock).forward_markets(&input).await;

        let calls = mock.calls_to(DEFAULT_FORWARD_URL);
        assert_eq!(calls.len(), 3);
        for (call, market) in calls.iter().zip(&input) {
            assert_eq!(call.method, HttpMethod::Post);
            assert_eq!(call.body.as_ref(), Some(market.as_value()));
        }
        assert_eq!(summary.succeeded(), 3);
    }

    #[tokio::test]
    async fn test_failure_does_not_stop_loop() {
        let mock = MockHttp::new()
            .on_transport_error(
                HttpMethod::Post,
                DEFAULT_FORWARD_URL,
                TransportError::Connect("refused".into()),
            )
            .on_post_json(DEFAULT_FORWARD_URL, 500, json!({"error": "db"}))
            .on_post_json(DEFAULT_FORWARD_URL, 201, json!({"id": 9}));

        let summary = forwarder(&mock).forward_markets(&markets(&["M1", "M2", "M3"])).await;

        assert_eq!(mock.get_calls().len(), 3);
        assert_eq!(summary.attempted(), 3);
        assert_eq!(summary.failed(), 2);
        assert!(matches!(summary.outcomes[0].result, Err(RequestFailure::Transport(_))));
        assert_eq!(summary.outcomes[1].result.as_ref().err().and_then(|f| f.status()), Some(500));
        assert_eq!(summary.outcomes[2].result, Ok(201));
    }

    #[tokio::test]
    async fn test_non_json_success_counts_as_success() {
        let mock = MockHttp::new().on_post_text(DEFAULT_FORWARD_URL, 200, "added");
        let summary = forwarder(&mock).forward_markets(&markets(&["M1"])).await;
        assert_eq!(summary.outcomes[0].result, Ok(200));
    }

    #[tokio::test]
    async fn test_plain_text_acknowledgement_is_not_warned() {
        let mock = MockHttp::new().on_post_text(DEFAULT_FORWARD_URL, 200, "added");
        let (logs, _guard) = LogCapture::install(Level::INFO);

        let summary = forwarder(&mock).forward_markets(&markets(&["M1"])).await;

        assert_eq!(summary.succeeded(), 1);
        assert!(logs.lines_at("WARN").is_empty());
    }

    #[tokio::test]
    async fn test_error_status_with_json_is_failure() {
        let mock = MockHttp::new().on_post_json(DEFAULT_FORWARD_URL, 409, json!({"error": "exists"}));
        let summary = forwarder(&mock).forward_markets(&markets(&["M1"])).await;
        assert_eq!(summary.failed(), 1);
    }

    #[tokio::test]
    async fn test_missing_address_reported_as_unknown() {
        let mock = MockHttp::new().on_post_json(DEFAULT_FORWARD_URL, 200, json!({}));
        let summary = forwarder(&mock)
            .forward_markets(&[MarketRecord::new(json!({"pool": "x"}))])
            .await;
        assert_eq!(summary.outcomes[0].address, "unknown");
    }

    #[tokio::test]
    async fn test_empty_input_sends_nothing() {
        let mock = MockHttp::new();
        let summary = forwarder(&mock).forward_markets(&[]).await;
        assert_eq!(summary.attempted(), 0);
        assert!(mock.get_calls().is_empty());
    }

    #[tokio::test]
    async fn test_custom_url() {
        let url = "http://127.0.0.1:9000/markets";
        let mock = MockHttp::new().on_post_json(url, 200, json!({}));
        let config = ForwarderConfig { url: url.to_string(), ..Default::default() };
        let forwarder = MarketForwarder::with_http(config, mock.clone());

        forwarder.forward_markets(&markets(&["M1"])).await;
        assert_eq!(mock.calls_to(url).len(), 1);
        assert_eq!(forwarder.url(), url);
    }
}
