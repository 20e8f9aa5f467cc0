//! Ports Layer - Trait definitions for external dependencies
//!
//! Every stage talks to the outside world through `HttpPort`, so the
//! Circular API and the local market service can be swapped for
//! `mocks::MockHttp` in tests.

pub mod http;
pub mod mocks;

pub use http::{HttpMethod, HttpPort, HttpRequest, HttpResponse, TransportError};
