//! HTTP Adapter
//!
//! `reqwest`-backed implementation of the `HttpPort`.

mod client;

pub use client::{ReqwestHttp, DEFAULT_TIMEOUT};
