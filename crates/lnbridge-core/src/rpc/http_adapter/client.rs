use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use reqwest::header;
use tracing::{debug, trace};

use crate::error::{CoreError, RpcError};
use crate::types::WalletConnection;

use super::super::RpcTransport;
use super::connection::{make_access_key, normalize_url, rpc_endpoint};
use super::protocol::{decode_rpc_body, RpcRequest};

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Tuning knobs for [`HttpTransport`].
#[derive(Debug, Clone)]
pub struct HttpTransportConfig {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    /// Outbound requests per second; `None` disables rate limiting.
    pub requests_per_second: Option<u32>,
}

impl Default for HttpTransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            requests_per_second: None,
        }
    }
}

/// JSON-RPC over HTTP(S) for Spark-style Core Lightning endpoints.
///
/// The transport is not bound to one node: every call builds its endpoint
/// and access key from the [`WalletConnection`] it is handed, so one
/// instance (and its connection pool) can serve many wallets.
pub struct HttpTransport {
    client: reqwest::Client,
    limiter: Option<DirectRateLimiter>,
    next_id: AtomicU64,
}

impl HttpTransport {
    pub fn new(config: HttpTransportConfig) -> Result<Self, CoreError> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .pool_max_idle_per_host(8)
            .tcp_nodelay(true)
            .build()
            .map_err(RpcError::Transport)?;

        let limiter = match config.requests_per_second {
            None => None,
            Some(limit) => {
                let limit = NonZeroU32::new(limit).ok_or_else(|| {
                    CoreError::InvalidConnection(
                        "requests_per_second must be at least 1".to_owned(),
                    )
                })?;
                Some(RateLimiter::direct(Quota::per_second(limit)))
            }
        };

        Ok(Self {
            client,
            limiter,
            next_id: AtomicU64::new(1),
        })
    }

    async fn wait_for_rate_limit(&self) {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }
    }
}

#[async_trait]
impl RpcTransport for HttpTransport {
    async fn call(
        &self,
        wallet: &WalletConnection,
        method: &str,
        params: Vec<serde_json::Value>,
    ) -> Result<serde_json::Value, CoreError> {
        let base = normalize_url(&wallet.host_and_port)?;
        let access_key = make_access_key(&wallet.username, &wallet.password);
        let endpoint = rpc_endpoint(&base, &access_key)?;

        self.wait_for_rate_limit().await;
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        debug!(
            rpc.id = id,
            rpc.method = method,
            rpc.params = params.len(),
            node = %base,
            "rpc call"
        );

        let response = self
            .client
            .post(endpoint)
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::ACCEPT, "application/json")
            .json(&RpcRequest {
                method,
                params: &params,
            })
            .send()
            .await
            .map_err(RpcError::Transport)?;
        let status = response.status();

        let body = response.text().await.map_err(RpcError::Transport)?;
        debug!(rpc.id = id, rpc.method = method, %status, body_len = body.len(), "rpc response");
        trace!(rpc.id = id, rpc.method = method, body = %body, "rpc response body");

        decode_rpc_body(status, &body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_rate_limit_is_rejected() {
        let config = HttpTransportConfig {
            requests_per_second: Some(0),
            ..HttpTransportConfig::default()
        };
        let err = HttpTransport::new(config)
            .err()
            .expect("zero rate must be rejected");
        assert!(err.to_string().contains("at least 1"));
    }

    #[tokio::test]
    async fn invalid_address_fails_before_any_request() {
        let transport =
            HttpTransport::new(HttpTransportConfig::default()).expect("transport must build");
        let wallet = WalletConnection::new("ftp://node", "u", "p");
        let err = transport
            .call(&wallet, "getinfo", Vec::new())
            .await
            .expect_err("must reject scheme");
        assert!(matches!(err, CoreError::InvalidConnection(_)));
    }
}
