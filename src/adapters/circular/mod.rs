//! Circular Adapter
//!
//! Client for the Circular market-data API (`/market/tokens`,
//! `/market/cache`).

mod client;
mod query;

pub use client::{CircularClient, CircularConfig};
pub use query::{TokenListQuery, MarketCacheQuery, NO_PROVIDER, USDC_MINT, USDT_MINT, WSOL_MINT};
