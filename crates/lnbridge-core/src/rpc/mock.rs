use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{CoreError, RpcError};
use crate::types::WalletConnection;

use super::RpcTransport;

/// Error code the mock answers with for methods nobody registered.
pub const UNKNOWN_COMMAND: i64 = -32601;

#[derive(Clone)]
enum Reply {
    Result(serde_json::Value),
    Server { code: i64, message: String },
    Invalid(String),
}

/// A mock node for testing. Returns canned replies keyed by method, or by
/// method plus exact params, populated via the builder pattern. Every call
/// is recorded so tests can assert on what was sent.
pub struct MockTransport {
    replies: HashMap<String, Reply>,
    calls: Mutex<Vec<(String, Vec<serde_json::Value>)>>,
}

impl MockTransport {
    pub fn builder() -> MockTransportBuilder {
        MockTransportBuilder {
            replies: HashMap::new(),
        }
    }

    /// Every `(method, params)` pair received so far, in call order.
    pub fn calls(&self) -> Vec<(String, Vec<serde_json::Value>)> {
        self.calls.lock().expect("mock call log poisoned").clone()
    }

    pub fn call_count(&self, method: &str) -> usize {
        self.calls
            .lock()
            .expect("mock call log poisoned")
            .iter()
            .filter(|(m, _)| m == method)
            .count()
    }
}

fn key_for(method: &str, params: Option<&[serde_json::Value]>) -> String {
    match params {
        None => method.to_owned(),
        Some(params) => format!("{method}{}", serde_json::Value::from(params.to_vec())),
    }
}

pub struct MockTransportBuilder {
    replies: HashMap<String, Reply>,
}

impl MockTransportBuilder {
    /// Answer every call to `method` with `result`.
    pub fn with_result(mut self, method: &str, result: serde_json::Value) -> Self {
        self.replies
            .insert(key_for(method, None), Reply::Result(result));
        self
    }

    /// Answer `method` called with exactly `params`; takes precedence over
    /// [`Self::with_result`].
    pub fn with_result_for(
        mut self,
        method: &str,
        params: &[serde_json::Value],
        result: serde_json::Value,
    ) -> Self {
        self.replies
            .insert(key_for(method, Some(params)), Reply::Result(result));
        self
    }

    pub fn with_server_error(mut self, method: &str, code: i64, message: &str) -> Self {
        self.replies.insert(
            key_for(method, None),
            Reply::Server {
                code,
                message: message.to_owned(),
            },
        );
        self
    }

    pub fn with_server_error_for(
        mut self,
        method: &str,
        params: &[serde_json::Value],
        code: i64,
        message: &str,
    ) -> Self {
        self.replies.insert(
            key_for(method, Some(params)),
            Reply::Server {
                code,
                message: message.to_owned(),
            },
        );
        self
    }

    /// Simulate a body that could not be decoded.
    pub fn with_invalid_response(mut self, method: &str, detail: &str) -> Self {
        self.replies
            .insert(key_for(method, None), Reply::Invalid(detail.to_owned()));
        self
    }

    pub fn build(self) -> MockTransport {
        MockTransport {
            replies: self.replies,
            calls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl RpcTransport for MockTransport {
    async fn call(
        &self,
        _wallet: &WalletConnection,
        method: &str,
        params: Vec<serde_json::Value>,
    ) -> Result<serde_json::Value, CoreError> {
        let reply = self
            .replies
            .get(&key_for(method, Some(&params)))
            .or_else(|| self.replies.get(&key_for(method, None)))
            .cloned();
        self.calls
            .lock()
            .expect("mock call log poisoned")
            .push((method.to_owned(), params));

        match reply {
            Some(Reply::Result(value)) => Ok(value),
            Some(Reply::Server { code, message }) => Err(RpcError::Server { code, message }.into()),
            Some(Reply::Invalid(detail)) => Err(RpcError::InvalidResponse(detail).into()),
            None => Err(RpcError::Server {
                code: UNKNOWN_COMMAND,
                message: format!("Unknown command '{method}'"),
            }
            .into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::wallet;
    use serde_json::json;

    #[tokio::test]
    async fn param_specific_reply_wins_over_method_default() {
        let rpc = MockTransport::builder()
            .with_result("listnodes", json!({ "nodes": [] }))
            .with_result_for(
                "listnodes",
                &[json!("02bb")],
                json!({ "nodes": [{ "alias": "bob" }] }),
            )
            .build();

        let specific = rpc
            .call(&wallet(), "listnodes", vec![json!("02bb")])
            .await
            .unwrap();
        assert_eq!(specific["nodes"][0]["alias"], "bob");

        let fallback = rpc
            .call(&wallet(), "listnodes", vec![json!("02cc")])
            .await
            .unwrap();
        assert_eq!(fallback["nodes"], json!([]));
        assert_eq!(rpc.call_count("listnodes"), 2);
    }

    #[tokio::test]
    async fn unregistered_method_is_unknown_command() {
        let rpc = MockTransport::builder().build();
        let err = rpc.call(&wallet(), "getinfo", Vec::new()).await.unwrap_err();
        assert_eq!(err.server_code(), Some(UNKNOWN_COMMAND));
        assert_eq!(rpc.calls(), vec![("getinfo".to_owned(), Vec::new())]);
    }
}
