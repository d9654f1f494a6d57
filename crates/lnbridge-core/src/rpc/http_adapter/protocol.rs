use crate::error::{CoreError, RpcError};

#[derive(serde::Serialize)]
pub(super) struct RpcRequest<'a> {
    pub(super) method: &'a str,
    pub(super) params: &'a [serde_json::Value],
}

/// Decode a response body into the call's result.
///
/// The endpoint answers with the bare result object on success and with an
/// object carrying `code` (and usually `message`) on failure, regardless of
/// HTTP status. `status` is only used to make decode failures readable.
pub(super) fn decode_rpc_body(
    status: reqwest::StatusCode,
    body: &str,
) -> Result<serde_json::Value, CoreError> {
    let decoded: serde_json::Value = serde_json::from_str(body).map_err(|e| {
        RpcError::InvalidResponse(format!("decode RPC response (HTTP {status}): {e}; body={body}"))
    })?;

    match decoded.get("code") {
        None | Some(serde_json::Value::Null) => Ok(decoded),
        Some(code) => Err(parse_rpc_error(code, decoded.get("message"))),
    }
}

/// Build a structured error from an error body's `code` and `message`.
///
/// The message falls back to the code's text when the node omits it.
pub(super) fn parse_rpc_error(
    code: &serde_json::Value,
    message: Option<&serde_json::Value>,
) -> CoreError {
    let code_text = match code {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    let message = message
        .and_then(serde_json::Value::as_str)
        .map(str::to_owned)
        .unwrap_or_else(|| code_text.clone());

    let numeric = code
        .as_i64()
        .or_else(|| code.as_str().and_then(|s| s.trim().parse().ok()));
    match numeric {
        Some(code) => RpcError::Server { code, message }.into(),
        None => RpcError::InvalidResponse(format!(
            "node error with non-numeric code {code_text}: {message}"
        ))
        .into(),
    }
}
