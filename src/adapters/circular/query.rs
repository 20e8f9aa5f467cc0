//! Circular API request parameters
//!
//! Query sets for the `/market/tokens` and `/market/cache` endpoints.

use serde::{Deserialize, Serialize};

use crate::domain::market::{join_tokens, TokenId};

/// Wrapped SOL mint, used as the reference token
pub const WSOL_MINT: &str = "So11111111111111111111111111111111111111112";
/// USDC mint
pub const USDC_MINT: &str = "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v";
/// USDT mint
pub const USDT_MINT: &str = "Es9vMFrzaCERmJfrF4H2FYD4KCoNkY11McCe8BenwNYB";
/// Provider value meaning "no provider filter"
pub const NO_PROVIDER: &str = "NO_PROVIDER";

/// Parameters for `GET /market/tokens`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenListQuery {
    /// Result cap (`maxTokensList`)
    pub max_tokens_list: u32,
    /// Time window in seconds (`maxTimeRange`)
    pub max_time_range: u32,
    /// Provider filter (`provider`)
    pub provider: String,
    /// Base/reference token (`token`)
    pub base_token: String,
    /// Tokens left out of the result (`excludeTokens[]`, repeated)
    pub exclude_tokens: Vec<String>,
}

impl Default for TokenListQuery {
    fn default() -> Self {
        Self {
            max_tokens_list: 50,
            max_time_range: 900,
            provider: NO_PROVIDER.to_string(),
            base_token: WSOL_MINT.to_string(),
            exclude_tokens: vec![
                USDC_MINT.to_string(),
                USDT_MINT.to_string(),
                WSOL_MINT.to_string(),
            ],
        }
    }
}

impl TokenListQuery {
    /// Query pairs in send order; `excludeTokens[]` repeats per entry
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![
            ("maxTokensList".to_string(), self.max_tokens_list.to_string()),
            ("maxTimeRange".to_string(), self.max_time_range.to_string()),
        ];
        pairs.extend(
            self.exclude_tokens
                .iter()
                .map(|t| ("excludeTokens[]".to_string(), t.clone())),
        );
        pairs.push(("provider".to_string(), self.provider.clone()));
        pairs.push(("token".to_string(), self.base_token.clone()));
        pairs
    }
}

/// Parameters for `GET /market/cache`
#[derive(Debug, Clone, PartialEq)]
pub struct MarketCacheQuery<'a> {
    pub tokens: &'a [TokenId],
    pub only_jup: bool,
}

impl<'a> MarketCacheQuery<'a> {
    pub fn new(tokens: &'a [TokenId], only_jup: bool) -> Self {
        Self { tokens, only_jup }
    }

    pub fn to_pairs(&self) -> Vec<(String, String)> {
        vec![
            ("onlyjup".to_string(), python_bool(self.only_jup).to_string()),
            ("tokens".to_string(), join_tokens(self.tokens)),
        ]
    }
}

/// The cache endpoint expects `True` / `False`, not Rust's lowercase form
fn python_bool(flag: bool) -> &'static str {
    if flag {
        "True"
    } else {
        "False"
    }
}
