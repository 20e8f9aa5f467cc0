//! Market Types
//!
//! Token identifiers and market records as they travel through the relay.
//! Both are treated as opaque: the relay never inspects more than a market's
//! `address` field.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Placeholder logged for markets without a string `address`
pub const UNKNOWN_ADDRESS: &str = "unknown";

/// Opaque token identifier (a mint address in practice)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenId(String);

impl TokenId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TokenId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for TokenId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Join token ids into the comma-separated form the cache endpoint expects.
///
/// Ids containing commas are not escaped.
pub fn join_tokens(tokens: &[TokenId]) -> String {
    tokens
        .iter()
        .map(TokenId::as_str)
        .collect::<Vec<_>>()
        .join(",")
}

/// One market from the cache endpoint, passed through unexamined
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarketRecord(Value);

impl MarketRecord {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// The market's `address`, or `"unknown"` when missing or not a string
    pub fn address(&self) -> &str {
        self.0
            .get("address")
            .and_then(Value::as_str)
            .unwrap_or(UNKNOWN_ADDRESS)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

impl From<Value> for MarketRecord {
    fn from(value: Value) -> Self {
        Self(value)
    }
}
