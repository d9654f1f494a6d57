use bitcoin::hashes::{hmac, sha256, Hash, HashEngine};
use reqwest::Url;

use crate::error::CoreError;

/// Message the Spark server MACs with the login credentials.
const ACCESS_KEY_MESSAGE: &[u8] = b"access-key";

/// Turn a user-supplied `host:port` (or full URL) into the base URL that
/// `/rpc` is appended to.
///
/// A missing scheme defaults to `https://`. Trailing slashes are dropped so
/// the caller can append paths without doubling them.
pub fn normalize_url(host_and_port: &str) -> Result<String, CoreError> {
    let trimmed = host_and_port.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(CoreError::InvalidConnection(
            "node address must not be empty".to_owned(),
        ));
    }

    let candidate = if trimmed.contains("://") {
        trimmed.to_owned()
    } else {
        format!("https://{trimmed}")
    };

    let parsed = Url::parse(&candidate).map_err(|e| {
        CoreError::InvalidConnection(format!(
            "invalid node address `{host_and_port}`: expected host:port or HTTP(S) URL ({e})"
        ))
    })?;
    match parsed.scheme() {
        "http" | "https" => Ok(candidate),
        other => Err(CoreError::InvalidConnection(format!(
            "unsupported node address scheme `{other}`; expected http or https"
        ))),
    }
}

/// Derive the `access-key` query parameter from login credentials.
///
/// HMAC-SHA256 keyed with `username:password` over the fixed message
/// `access-key`, base64 encoded, with every non-word character stripped.
pub fn make_access_key(username: &str, password: &str) -> String {
    let key = format!("{username}:{password}");
    let mut engine = hmac::HmacEngine::<sha256::Hash>::new(key.as_bytes());
    engine.input(ACCESS_KEY_MESSAGE);
    let mac = hmac::Hmac::<sha256::Hash>::from_engine(engine);

    base64::encode(mac.to_byte_array())
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect()
}

/// Full endpoint for one call: `<base>/rpc?access-key=<key>`.
pub(super) fn rpc_endpoint(base: &str, access_key: &str) -> Result<Url, CoreError> {
    let mut url = Url::parse(&format!("{base}/rpc")).map_err(|e| {
        CoreError::InvalidConnection(format!("cannot build RPC endpoint from `{base}`: {e}"))
    })?;
    url.query_pairs_mut().append_pair("access-key", access_key);
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_url_adds_https_scheme() {
        let url = normalize_url("node.example.com:9737").expect("should parse");
        assert_eq!(url, "https://node.example.com:9737");
    }

    #[test]
    fn normalize_url_keeps_explicit_http_and_strips_slashes() {
        let url = normalize_url(" http://127.0.0.1:9737// ").expect("should parse");
        assert_eq!(url, "http://127.0.0.1:9737");
    }

    #[test]
    fn normalize_url_keeps_path_prefix() {
        let url = normalize_url("https://example.com/spark/").expect("should parse");
        assert_eq!(url, "https://example.com/spark");
    }

    #[test]
    fn normalize_url_rejects_other_schemes() {
        let err = normalize_url("ftp://example.com").expect_err("must reject ftp");
        assert!(err.to_string().contains("unsupported node address scheme"));
    }

    #[test]
    fn normalize_url_rejects_empty_input() {
        let err = normalize_url("  / ").expect_err("must reject empty");
        assert!(err.to_string().contains("must not be empty"));
    }

    #[test]
    fn access_key_is_deterministic_and_url_safe() {
        let a = make_access_key("spark", "secret");
        let b = make_access_key("spark", "secret");
        assert_eq!(a, b);
        assert!(!a.is_empty());
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'));
        // 32-byte MAC encodes to 44 base64 chars, one of which is padding.
        assert!(a.len() <= 43);
    }

    #[test]
    fn access_key_depends_on_both_credentials() {
        let base = make_access_key("spark", "secret");
        assert_ne!(base, make_access_key("spark", "other"));
        assert_ne!(base, make_access_key("other", "secret"));
    }

    #[test]
    fn rpc_endpoint_appends_path_and_key() {
        let url = rpc_endpoint("https://node:9737", "abc123").expect("should build");
        assert_eq!(url.as_str(), "https://node:9737/rpc?access-key=abc123");
    }
}
