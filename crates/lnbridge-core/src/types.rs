//! Wallet-facing domain types.
//!
//! Every value here is built fresh from one RPC response and handed to the
//! caller; nothing is cached or mutated after it leaves [`crate::NodeClient`].
//! Amounts are satoshi. Fractional satoshi survive as `f64` where the node
//! reports millisatoshi precision.

use bitcoin::Network;
use serde::{Deserialize, Serialize, Serializer};
use time::macros::format_description;
use time::OffsetDateTime;

// ==============================================================================
// Connection
// ==============================================================================

/// How to reach and authenticate against one node.
///
/// Owned by the caller and borrowed for every call.
#[derive(Clone, Deserialize)]
pub struct WalletConnection {
    pub host_and_port: String,
    pub username: String,
    pub password: String,
    /// The node's own public key. Required to pick our side out of
    /// `listchannels`, which reports both directions of every channel.
    #[serde(default)]
    pub pubkey: Option<String>,
}

impl WalletConnection {
    pub fn new(
        host_and_port: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host_and_port: host_and_port.into(),
            username: username.into(),
            password: password.into(),
            pubkey: None,
        }
    }

    #[must_use]
    pub fn with_pubkey(mut self, pubkey: impl Into<String>) -> Self {
        self.pubkey = Some(pubkey.into());
        self
    }
}

impl std::fmt::Debug for WalletConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletConnection")
            .field("host_and_port", &self.host_and_port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("pubkey", &self.pubkey)
            .finish()
    }
}

// ==============================================================================
// Node Info
// ==============================================================================

/// Result of `getinfo`.
#[derive(Debug, Clone, Serialize)]
pub struct NodeInfo {
    pub pubkey: String,
    pub alias: Option<String>,
    pub color: Option<String>,
    pub version: Option<String>,
    pub blockheight: Option<u64>,
    /// `None` when the node reports a chain name we do not recognize.
    pub network: Option<Network>,
    pub num_peers: Option<u64>,
    pub num_active_channels: Option<u64>,
    pub short_channel_id: Option<String>,
    /// The untouched `getinfo` body, for fields not modelled above.
    #[serde(skip)]
    pub raw: serde_json::Value,
}

// ==============================================================================
// Channels
// ==============================================================================

/// One of our channels, seen from our side.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Channel {
    pub remote_pubkey: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short_channel_id: Option<String>,
    pub active: bool,
    /// Total channel capacity in satoshi. A millisatoshi capacity is rounded
    /// up so the local side never exceeds it.
    pub capacity: u64,
    pub private: bool,
    /// Filled by the `listpeers` lookup; `None` if that lookup failed.
    pub local_balance: Option<f64>,
    /// Always `capacity - local_balance` once the local side is known.
    pub remote_balance: Option<f64>,
    /// Filled by the `listnodes` lookup; `None` if that lookup failed.
    pub alias: Option<String>,
}

impl Channel {
    pub fn new(remote_pubkey: impl Into<String>, capacity: u64) -> Self {
        Self {
            remote_pubkey: remote_pubkey.into(),
            short_channel_id: None,
            active: false,
            capacity,
            private: true,
            local_balance: None,
            remote_balance: None,
            alias: None,
        }
    }

    /// Record our side of the split; the remote side follows from capacity.
    pub fn set_local_balance(&mut self, local: f64) {
        self.local_balance = Some(local);
        self.remote_balance = Some(self.capacity as f64 - local);
    }
}

// ==============================================================================
// Payments
// ==============================================================================

/// A decoded bolt11 payment request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentRequest {
    /// Satoshi; `0.0` for amountless invoices.
    pub amount: f64,
    pub description: String,
    pub destination: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry: Option<u64>,
}

/// Parameters for a new invoice. `amount` is in satoshi.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceRequest {
    pub amount: u64,
    pub label: String,
    pub description: String,
}

/// What the node said about a `pay` attempt that it did not reject outright.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PayOutcome {
    /// `status == "complete"`.
    Complete,
    /// Any other status string.
    Failed { status: String },
    /// No status, but the node sent a message.
    Rejected { message: String },
    /// Neither a status nor a message.
    Unknown,
}

impl PayOutcome {
    pub const UNKNOWN_ERROR: &'static str = "Unknown Error";

    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete)
    }

    /// Human-readable failure text, `None` on success.
    pub fn failure_description(&self) -> Option<&str> {
        match self {
            Self::Complete => None,
            Self::Failed { status } => Some(status.as_str()),
            Self::Rejected { message } => Some(message.as_str()),
            Self::Unknown => Some(Self::UNKNOWN_ERROR),
        }
    }
}

// ==============================================================================
// Transaction History
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionKind {
    Lightning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    Paid,
}

/// One entry of the merged invoice/payment history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub incoming: bool,
    #[serde(serialize_with = "serialize_http_date")]
    pub date: OffsetDateTime,
    pub description: Option<String>,
    /// Signed satoshi: positive for incoming, negative for outgoing.
    pub amount: f64,
    pub status: TransactionStatus,
}

impl Transaction {
    /// `date` as an HTTP-date style UTC string, e.g.
    /// `Thu, 01 Jan 1970 00:16:40 GMT`.
    pub fn utc_date(&self) -> String {
        format_http_date(&self.date).unwrap_or_else(|_| self.date.unix_timestamp().to_string())
    }
}

fn format_http_date(date: &OffsetDateTime) -> Result<String, time::error::Format> {
    date.to_offset(time::UtcOffset::UTC).format(format_description!(
        "[weekday repr:short], [day] [month repr:short] [year] [hour]:[minute]:[second] GMT"
    ))
}

fn serialize_http_date<S: Serializer>(
    date: &OffsetDateTime,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let rendered = format_http_date(date).map_err(serde::ser::Error::custom)?;
    serializer.serialize_str(&rendered)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wallet_connection_debug_redacts_password() {
        let wallet = WalletConnection::new("node:9737", "alice", "hunter2");
        let rendered = format!("{wallet:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn local_balance_determines_remote_side() {
        let mut channel = Channel::new("02ab", 100_000);
        channel.set_local_balance(30_000.5);
        assert_eq!(channel.remote_balance, Some(69_999.5));
        assert_eq!(
            channel.local_balance.unwrap() + channel.remote_balance.unwrap(),
            channel.capacity as f64
        );
    }

    #[test]
    fn pay_outcome_descriptions() {
        assert_eq!(PayOutcome::Complete.failure_description(), None);
        let failed = PayOutcome::Failed {
            status: "pending".into(),
        };
        assert_eq!(failed.failure_description(), Some("pending"));
        let rejected = PayOutcome::Rejected {
            message: "no route".into(),
        };
        assert_eq!(rejected.failure_description(), Some("no route"));
        assert_eq!(
            PayOutcome::Unknown.failure_description(),
            Some("Unknown Error")
        );
    }

    #[test]
    fn utc_date_matches_http_date_layout() {
        let tx = Transaction {
            kind: TransactionKind::Lightning,
            incoming: true,
            date: OffsetDateTime::from_unix_timestamp(1000).unwrap(),
            description: None,
            amount: 5.0,
            status: TransactionStatus::Paid,
        };
        assert_eq!(tx.utc_date(), "Thu, 01 Jan 1970 00:16:40 GMT");
    }

    #[test]
    fn transaction_serializes_wire_names() {
        let tx = Transaction {
            kind: TransactionKind::Lightning,
            incoming: false,
            date: OffsetDateTime::from_unix_timestamp(0).unwrap(),
            description: None,
            amount: -2.0,
            status: TransactionStatus::Paid,
        };
        let json = serde_json::to_value(&tx).unwrap();
        assert_eq!(json["type"], "LIGHTNING");
        assert_eq!(json["status"], "PAID");
        assert_eq!(json["date"], "Thu, 01 Jan 1970 00:00:00 GMT");
        assert_eq!(json["date"], tx.utc_date());
    }
}
