#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("RPC failure: {0}")]
    Rpc(#[from] RpcError),

    #[error("invalid connection: {0}")]
    InvalidConnection(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl CoreError {
    /// `true` when the node could not be reached or answered with something
    /// that is not JSON.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Rpc(RpcError::Transport(_) | RpcError::InvalidResponse(_))
        )
    }

    /// The node-reported error code, if the node rejected the call.
    pub fn server_code(&self) -> Option<i64> {
        match self {
            Self::Rpc(RpcError::Server { code, .. }) => Some(*code),
            _ => None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    #[error("HTTP transport error: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("invalid RPC response: {0}")]
    InvalidResponse(String),

    #[error("node returned error {code}: {message}")]
    Server { code: i64, message: String },
}
