//! Domain Layer - Relay data types
//!
//! - `market`: token identifiers and opaque market records
//! - `outcome`: request outcome classification and stage errors
//! - `forward`: per-market forwarding results

pub mod forward;
pub mod market;
pub mod outcome;

pub use forward::{ForwardOutcome, ForwardSummary};
pub use market::{join_tokens, MarketRecord, TokenId, UNKNOWN_ADDRESS};
pub use outcome::{RequestFailure, RequestOutcome, ResponseBody, StageError, StatusPolicy};
