//! Adapters Layer - External System Implementations
//!
//! This module contains implementations of the port traits:
//! - HTTP: reqwest-backed `HttpPort`
//! - Circular: market token list and market cache client
//! - Forwarder: posts markets to the local market service
//! - CLI: Command-line interface handlers

pub mod exchange;
pub mod http;
pub mod circular;
pub mod forwarder;
pub mod cli;

pub use http::ReqwestHttp;
pub use circular::{CircularClient, CircularConfig};
pub use forwarder::{MarketForwarder, ForwarderConfig};
pub use cli::CliApp;
