//! Circular Market API Client
//!
//! Stages 1 and 2 of the relay: list recently active tokens and fetch the
//! market cache for them. Each call is a single GET with an `x-api-key`
//! header; failures are logged and returned, never retried.

use std::time::Duration;

use serde::de::DeserializeOwned;

use super::query::{MarketCacheQuery, TokenListQuery};
use crate::adapters::exchange::{exchange, BodyExpectation};
use crate::adapters::http::{ReqwestHttp, DEFAULT_TIMEOUT};
use crate::domain::market::{MarketRecord, TokenId};
use crate::domain::outcome::{RequestOutcome, StageError, StatusPolicy};
use crate::ports::http::{HttpPort, HttpRequest, TransportError};

/// Circular API client configuration
#[derive(Debug, Clone)]
pub struct CircularConfig {
    /// Base URL, e.g. `https://pro.circular.bot`
    pub api_base_url: String,
    /// Sent as `x-api-key` on every request
    pub api_key: String,
    /// Request timeout
    pub timeout: Duration,
    /// Treatment of non-2xx responses carrying JSON
    pub status_policy: StatusPolicy,
    /// Parameters for the token list call
    pub token_query: TokenListQuery,
}

impl Default for CircularConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://pro.circular.bot".to_string(),
            api_key: String::new(),
            timeout: DEFAULT_TIMEOUT,
            status_policy: StatusPolicy::default(),
            token_query: TokenListQuery::default(),
        }
    }
}

impl CircularConfig {
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    pub fn tokens_url(&self) -> String {
        format!("{}/market/tokens", self.api_base_url.trim_end_matches('/'))
    }

    pub fn cache_url(&self) -> String {
        format!("{}/market/cache", self.api_base_url.trim_end_matches('/'))
    }
}

/// Client for the Circular market endpoints
#[derive(Debug, Clone)]
pub struct CircularClient<H = ReqwestHttp> {
    config: CircularConfig,
    http: H,
}

impl CircularClient<ReqwestHttp> {
    /// Create a client backed by reqwest with the configured timeout
    pub fn new(config: CircularConfig) -> Result<Self, TransportError> {
        let http = ReqwestHttp::with_timeout(config.timeout)?;
        Ok(Self { config, http })
    }
}

impl<H: HttpPort> CircularClient<H> {
    /// Create a client over any `HttpPort`
    pub fn with_http(config: CircularConfig, http: H) -> Self {
        Self { config, http }
    }

    pub fn config(&self) -> &CircularConfig {
        &self.config
    }

    /// Build the `/market/tokens` request
    pub fn tokens_request(&self) -> HttpRequest {
        let mut req = authed(HttpRequest::get(self.config.tokens_url()), &self.config.api_key);
        req.query = self.config.token_query.to_pairs();
        req
    }

    /// Build the `/market/cache` request
    pub fn cache_request(&self, api_key: &str, tokens: &[TokenId], only_jup: bool) -> HttpRequest {
        let mut req = authed(HttpRequest::get(self.config.cache_url()), api_key);
        req.query = MarketCacheQuery::new(tokens, only_jup).to_pairs();
        req
    }

    /// List token mints active in the configured time window.
    ///
    /// The returned ids are exactly the array the API sent, in its order.
    pub async fn list_market_tokens(&self) -> Result<Vec<TokenId>, StageError> {
        let outcome = exchange(
            &self.http,
            "tokens",
            self.tokens_request(),
            self.config.status_policy,
            BodyExpectation::Json,
        )
        .await;

        let tokens: Vec<TokenId> = decode_array(outcome).map_err(|e| {
            tracing::error!("Failed to list market tokens: {}", e);
            e
        })?;

        tracing::info!(count = tokens.len(), "Returning the array of token mints");
        Ok(tokens)
    }

    /// Fetch the market cache for `tokens` using the configured API key
    pub async fn fetch_market_cache(
        &self,
        tokens: &[TokenId],
        only_jup: bool,
    ) -> Result<Vec<MarketRecord>, StageError> {
        self.fetch_market_cache_with_key(&self.config.api_key, tokens, only_jup)
            .await
    }

    /// Fetch the market cache for `tokens` with an explicit API key
    pub async fn fetch_market_cache_with_key(
        &self,
        api_key: &str,
        tokens: &[TokenId],
        only_jup: bool,
    ) -> Result<Vec<MarketRecord>, StageError> {
        let outcome = exchange(
            &self.http,
            "cache",
            self.cache_request(api_key, tokens, only_jup),
            self.config.status_policy,
            BodyExpectation::Json,
        )
        .await;

        let markets: Vec<MarketRecord> = decode_array(outcome).map_err(|e| {
            tracing::error!("Failed to fetch market cache: {}", e);
            e
        })?;

        tracing::info!(count = markets.len(), "Returning the market cache");
        Ok(markets)
    }
}

fn authed(req: HttpRequest, api_key: &str) -> HttpRequest {
    req.header("Content-Type", "application/json")
        .header("x-api-key", api_key)
}

/// Turn an outcome into a typed array, or the stage error explaining why not
fn decode_array<T: DeserializeOwned>(outcome: RequestOutcome) -> Result<Vec<T>, StageError> {
    match outcome {
        RequestOutcome::Json { body, .. } => serde_json::from_value(body)
            .map_err(|e| StageError::UnexpectedShape(e.to_string())),
        RequestOutcome::Text { status, body } => Err(StageError::Decode { status, text: body }),
        RequestOutcome::Failed(failure) => Err(failure.into()),
    }
}
