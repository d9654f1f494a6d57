//! Pure response mappers: one function per RPC result shape.
//!
//! Mapping is lenient. A field the wallet model can live without (a
//! description, an alias, a timestamp) defaults to empty/zero/`None` and the
//! anomaly is logged; only results that cannot be interpreted at all (wrong
//! JSON type, malformed amounts, missing identifiers) become
//! [`RpcError::InvalidResponse`].

use bitcoin::{Amount, Network};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use time::OffsetDateTime;
use tracing::{debug, warn};

use crate::error::{CoreError, RpcError};
use crate::types::{
    Channel, NodeInfo, PayOutcome, PaymentRequest, Transaction, TransactionKind,
    TransactionStatus,
};
use crate::units::{msat_to_sat, WireMsat, WireSat, MSAT_PER_SAT};

/// `pay` status that means the payment went through.
pub const PAY_STATUS_COMPLETE: &str = "complete";

/// `listinvoices` status of a settled invoice.
pub const INVOICE_STATUS_PAID: &str = "paid";

fn decode<T: DeserializeOwned>(raw: &serde_json::Value, method: &str) -> Result<T, CoreError> {
    T::deserialize(raw)
        .map_err(|e| RpcError::InvalidResponse(format!("invalid {method} result: {e}")).into())
}

// ==============================================================================
// getinfo
// ==============================================================================

#[derive(Deserialize)]
struct GetInfoResult {
    id: Option<String>,
    alias: Option<String>,
    color: Option<String>,
    version: Option<String>,
    blockheight: Option<u64>,
    network: Option<String>,
    num_peers: Option<u64>,
    num_active_channels: Option<u64>,
    short_channel_id: Option<String>,
}

pub fn node_info_from_getinfo(raw: serde_json::Value) -> Result<NodeInfo, CoreError> {
    let info: GetInfoResult = decode(&raw, "getinfo")?;
    let pubkey = info
        .id
        .ok_or_else(|| RpcError::InvalidResponse("getinfo result missing id".to_owned()))?;

    let network = info.network.as_deref().and_then(|name| {
        let parsed = name.parse::<Network>().ok();
        if parsed.is_none() {
            warn!(network = name, "unrecognized network in getinfo");
        }
        parsed
    });

    Ok(NodeInfo {
        pubkey,
        alias: info.alias,
        color: info.color,
        version: info.version,
        blockheight: info.blockheight,
        network,
        num_peers: info.num_peers,
        num_active_channels: info.num_active_channels,
        short_channel_id: info.short_channel_id,
        raw,
    })
}

// ==============================================================================
// listchannels / listpeers / listnodes
// ==============================================================================

#[derive(Deserialize)]
struct ListChannelsResult {
    #[serde(default)]
    channels: Vec<ChannelEdge>,
}

#[derive(Deserialize)]
struct ChannelEdge {
    source: Option<String>,
    destination: Option<String>,
    short_channel_id: Option<String>,
    active: Option<bool>,
    public: Option<bool>,
    satoshis: Option<WireSat>,
    amount_msat: Option<WireMsat>,
}

/// Keep the directed edges that start at `own_pubkey` and turn each into a
/// [`Channel`] with balances and alias still unknown.
///
/// `active` defaults to `false` and `private` to `true` when the node omits
/// the flags.
pub fn channels_from_listchannels(
    raw: serde_json::Value,
    own_pubkey: &str,
) -> Result<Vec<Channel>, CoreError> {
    let listing: ListChannelsResult = decode(&raw, "listchannels")?;

    Ok(listing
        .channels
        .into_iter()
        .filter(|edge| edge.source.as_deref() == Some(own_pubkey))
        .map(|edge| {
            let capacity = match (edge.satoshis, edge.amount_msat) {
                (Some(WireSat(sat)), _) => sat,
                (None, Some(WireMsat(msat))) => msat.div_ceil(MSAT_PER_SAT),
                (None, None) => {
                    debug!(peer = ?edge.destination, "channel edge without capacity");
                    0
                }
            };
            Channel {
                remote_pubkey: edge.destination.unwrap_or_default(),
                short_channel_id: edge.short_channel_id,
                active: edge.active.unwrap_or(false),
                capacity,
                private: edge.public.map(|public| !public).unwrap_or(true),
                local_balance: None,
                remote_balance: None,
                alias: None,
            }
        })
        .collect())
}

#[derive(Deserialize)]
struct ListPeersResult {
    #[serde(default)]
    peers: Vec<PeerEntry>,
}

#[derive(Deserialize)]
struct PeerEntry {
    #[serde(default)]
    channels: Vec<PeerChannel>,
}

#[derive(Deserialize)]
struct PeerChannel {
    short_channel_id: Option<String>,
    msatoshi_to_us: Option<WireMsat>,
    to_us_msat: Option<WireMsat>,
}

/// Our balance (satoshi) in the channel with the peer `listpeers` was
/// queried for.
///
/// Picks the peer channel whose `short_channel_id` matches, falling back to
/// the first one.
pub fn local_balance_from_listpeers(
    raw: serde_json::Value,
    short_channel_id: Option<&str>,
) -> Result<f64, CoreError> {
    let listing: ListPeersResult = decode(&raw, "listpeers")?;
    let channels = listing
        .peers
        .into_iter()
        .next()
        .map(|peer| peer.channels)
        .unwrap_or_default();

    let matching = short_channel_id.and_then(|scid| {
        channels
            .iter()
            .position(|c| c.short_channel_id.as_deref() == Some(scid))
    });
    let channel = channels
        .into_iter()
        .nth(matching.unwrap_or(0))
        .ok_or_else(|| RpcError::InvalidResponse("listpeers returned no channel".to_owned()))?;

    channel
        .msatoshi_to_us
        .or(channel.to_us_msat)
        .map(WireMsat::to_sat)
        .ok_or_else(|| {
            RpcError::InvalidResponse("listpeers channel missing msatoshi_to_us".to_owned()).into()
        })
}

#[derive(Deserialize)]
struct ListNodesResult {
    #[serde(default)]
    nodes: Vec<NodeEntry>,
}

#[derive(Deserialize)]
struct NodeEntry {
    alias: Option<String>,
}

/// The alias `listnodes` reports for the queried node. `Ok(None)` when the
/// node is known but never announced an alias.
pub fn alias_from_listnodes(raw: serde_json::Value) -> Result<Option<String>, CoreError> {
    let listing: ListNodesResult = decode(&raw, "listnodes")?;
    let node = listing
        .nodes
        .into_iter()
        .next()
        .ok_or_else(|| RpcError::InvalidResponse("listnodes returned no node".to_owned()))?;
    Ok(node.alias)
}

// ==============================================================================
// listfunds
// ==============================================================================

#[derive(Deserialize)]
struct ListFundsResult {
    #[serde(default)]
    outputs: Vec<FundsOutput>,
    #[serde(default)]
    channels: Vec<FundsChannel>,
}

#[derive(Deserialize)]
struct FundsOutput {
    value: Option<WireSat>,
    amount_msat: Option<WireMsat>,
}

#[derive(Deserialize)]
struct FundsChannel {
    channel_sat: Option<WireSat>,
    our_amount_msat: Option<WireMsat>,
}

fn sum_sats(mut values: impl Iterator<Item = u64>, method: &str) -> Result<Amount, CoreError> {
    values
        .try_fold(0u64, u64::checked_add)
        .map(Amount::from_sat)
        .ok_or_else(|| RpcError::InvalidResponse(format!("{method} total overflows")).into())
}

/// Sum of on-chain outputs. Zero when `outputs` is absent or empty.
pub fn wallet_balance_from_listfunds(raw: serde_json::Value) -> Result<Amount, CoreError> {
    let funds: ListFundsResult = decode(&raw, "listfunds")?;
    sum_sats(
        funds.outputs.iter().map(|o| match (o.value, o.amount_msat) {
            (Some(WireSat(sat)), _) => sat,
            (None, Some(WireMsat(msat))) => msat / MSAT_PER_SAT,
            (None, None) => 0,
        }),
        "listfunds outputs",
    )
}

/// Sum of our side of every funded channel. Zero when `channels` is absent
/// or empty.
pub fn channel_balance_from_listfunds(raw: serde_json::Value) -> Result<Amount, CoreError> {
    let funds: ListFundsResult = decode(&raw, "listfunds")?;
    sum_sats(
        funds
            .channels
            .iter()
            .map(|c| match (c.channel_sat, c.our_amount_msat) {
                (Some(WireSat(sat)), _) => sat,
                (None, Some(WireMsat(msat))) => msat / MSAT_PER_SAT,
                (None, None) => 0,
            }),
        "listfunds channels",
    )
}

// ==============================================================================
// decodepay / pay / invoice
// ==============================================================================

#[derive(Deserialize)]
struct DecodePayResult {
    msatoshi: Option<WireMsat>,
    amount_msat: Option<WireMsat>,
    description: Option<String>,
    payee: Option<String>,
    payment_hash: Option<String>,
    created_at: Option<u64>,
    expiry: Option<u64>,
}

pub fn payment_request_from_decodepay(raw: serde_json::Value) -> Result<PaymentRequest, CoreError> {
    let decoded: DecodePayResult = decode(&raw, "decodepay")?;
    if decoded.description.is_none() {
        debug!("decodepay result without description");
    }

    Ok(PaymentRequest {
        amount: decoded
            .msatoshi
            .or(decoded.amount_msat)
            .map_or(0.0, WireMsat::to_sat),
        description: decoded.description.unwrap_or_default(),
        destination: decoded.payee.unwrap_or_default(),
        payment_hash: decoded.payment_hash,
        created_at: decoded.created_at,
        expiry: decoded.expiry,
    })
}

#[derive(Deserialize)]
struct PayResult {
    status: Option<String>,
    message: Option<String>,
}

/// Classify a `pay` result that was not an RPC error.
///
/// Empty `status`/`message` strings count as absent.
pub fn pay_outcome_from_pay(raw: serde_json::Value) -> Result<PayOutcome, CoreError> {
    let result: PayResult = decode(&raw, "pay")?;
    let status = result.status.filter(|s| !s.is_empty());
    let message = result.message.filter(|m| !m.is_empty());

    Ok(match (status, message) {
        (Some(status), _) if status == PAY_STATUS_COMPLETE => PayOutcome::Complete,
        (Some(status), _) => PayOutcome::Failed { status },
        (None, Some(message)) => PayOutcome::Rejected { message },
        (None, None) => PayOutcome::Unknown,
    })
}

#[derive(Deserialize)]
struct InvoiceResult {
    bolt11: Option<String>,
}

pub fn bolt11_from_invoice(raw: serde_json::Value) -> Result<String, CoreError> {
    let result: InvoiceResult = decode(&raw, "invoice")?;
    result
        .bolt11
        .ok_or_else(|| RpcError::InvalidResponse("invoice result missing bolt11".to_owned()).into())
}

// ==============================================================================
// listinvoices / listpayments
// ==============================================================================

#[derive(Deserialize)]
struct ListInvoicesResult {
    invoices: Option<Vec<InvoiceEntry>>,
}

#[derive(Deserialize)]
struct InvoiceEntry {
    status: Option<String>,
    msatoshi: Option<WireMsat>,
    amount_msat: Option<WireMsat>,
    amount_received_msat: Option<WireMsat>,
    paid_at: Option<u64>,
    description: Option<String>,
}

#[derive(Deserialize)]
struct ListPaymentsResult {
    payments: Option<Vec<PaymentEntry>>,
}

#[derive(Deserialize)]
struct PaymentEntry {
    msatoshi: Option<WireMsat>,
    amount_msat: Option<WireMsat>,
    created_at: Option<u64>,
}

fn utc_from_unix(seconds: Option<u64>, field: &str) -> OffsetDateTime {
    let parsed = seconds
        .and_then(|s| i64::try_from(s).ok())
        .and_then(|s| OffsetDateTime::from_unix_timestamp(s).ok());
    parsed.unwrap_or_else(|| {
        warn!(field, value = ?seconds, "missing or out-of-range timestamp; using unix epoch");
        OffsetDateTime::UNIX_EPOCH
    })
}

/// Paid invoices as incoming transactions. Unpaid and expired invoices are
/// dropped.
pub fn transactions_from_listinvoices(
    raw: serde_json::Value,
) -> Result<Vec<Transaction>, CoreError> {
    let listing: ListInvoicesResult = decode(&raw, "listinvoices")?;
    let invoices = listing.invoices.unwrap_or_else(|| {
        debug!("listinvoices result without invoices");
        Vec::new()
    });

    Ok(invoices
        .into_iter()
        .filter(|invoice| invoice.status.as_deref() == Some(INVOICE_STATUS_PAID))
        .map(|invoice| Transaction {
            kind: TransactionKind::Lightning,
            incoming: true,
            date: utc_from_unix(invoice.paid_at, "paid_at"),
            description: invoice.description,
            amount: invoice
                .msatoshi
                .or(invoice.amount_msat)
                .or(invoice.amount_received_msat)
                .map_or(0.0, WireMsat::to_sat),
            status: TransactionStatus::Paid,
        })
        .collect())
}

/// Every payment as an outgoing transaction with a non-positive amount.
/// Payments carry no description.
pub fn transactions_from_listpayments(
    raw: serde_json::Value,
) -> Result<Vec<Transaction>, CoreError> {
    let listing: ListPaymentsResult = decode(&raw, "listpayments")?;
    let payments = listing.payments.unwrap_or_else(|| {
        debug!("listpayments result without payments");
        Vec::new()
    });

    Ok(payments
        .into_iter()
        .map(|payment| {
            let msat = payment
                .msatoshi
                .or(payment.amount_msat)
                .map_or(0, |WireMsat(msat)| msat);
            Transaction {
                kind: TransactionKind::Lightning,
                incoming: false,
                date: utc_from_unix(payment.created_at, "created_at"),
                description: None,
                // `0.0 - x` rather than `-x` so a zero amount stays +0.0.
                amount: 0.0 - msat_to_sat(msat),
                status: TransactionStatus::Paid,
            }
        })
        .collect())
}

/// Concatenate invoices then payments and order newest first.
///
/// The sort is stable, so equal timestamps keep invoices ahead of payments.
pub fn merge_history(invoices: Vec<Transaction>, payments: Vec<Transaction>) -> Vec<Transaction> {
    let mut history = invoices;
    history.extend(payments);
    history.sort_by(|a, b| b.date.cmp(&a.date));
    history
}
