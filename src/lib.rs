//! Market Relay - Circular market data relay library
//!
//! Lists active tokens from the Circular market API, fetches the market
//! cache for them and forwards every market to a local service.
//!
//! # Modules
//!
//! - `domain`: Token ids, market records, request outcomes, forward summaries
//! - `ports`: Trait abstractions (HttpPort) and test doubles
//! - `adapters`: External implementations (reqwest, Circular API, forwarder, CLI)
//! - `config`: Configuration loading and validation
//! - `application`: The token -> cache -> forward pipeline

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod config;
pub mod application;
