//! JSON-RPC transport for Spark-style Core Lightning endpoints.
//!
//! Implements [`RpcTransport`](super::RpcTransport) using `reqwest`, with
//! access-key authentication, connection timeouts, and optional request
//! rate limiting.

mod client;
mod connection;
mod protocol;

pub use client::{HttpTransport, HttpTransportConfig};
pub use connection::{make_access_key, normalize_url};
