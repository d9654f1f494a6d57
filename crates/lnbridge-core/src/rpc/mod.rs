//! Node RPC abstraction layer.
//!
//! Defines the [`RpcTransport`] trait and provides the HTTP implementation
//! ([`HttpTransport`]) that speaks the Spark-style `/rpc?access-key=` wire
//! protocol, plus a test mock (`mock::MockTransport`).

mod http_adapter;
#[cfg(test)]
pub mod mock;

pub use http_adapter::{make_access_key, normalize_url, HttpTransport, HttpTransportConfig};

use async_trait::async_trait;

use crate::error::CoreError;
use crate::types::WalletConnection;

/// One JSON-RPC round trip against the node described by `wallet`.
///
/// Implementations own URL construction, authentication, timeouts and
/// decoding. A body carrying a `code` field must surface as
/// [`crate::error::RpcError::Server`]; anything that is not JSON as
/// [`crate::error::RpcError::InvalidResponse`].
#[async_trait]
pub trait RpcTransport: Send + Sync {
    async fn call(
        &self,
        wallet: &WalletConnection,
        method: &str,
        params: Vec<serde_json::Value>,
    ) -> Result<serde_json::Value, CoreError>;
}
