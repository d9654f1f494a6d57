//! Wallet operations against one Core Lightning node.
//!
//! [`NodeClient`] pairs each wallet use case with the RPC call(s) it needs
//! and the mapper in [`crate::mapping`] that turns the result into a domain
//! value. Primary calls fail hard; the per-channel enrichment lookups in
//! [`NodeClient::list_channels`] are best effort and only logged on failure.

use std::sync::Arc;

use bitcoin::Amount;
use futures::future::join_all;
use serde_json::json;
use tracing::{debug, warn};

use crate::error::CoreError;
use crate::mapping;
use crate::rpc::{HttpTransport, HttpTransportConfig, RpcTransport};
use crate::types::{
    Channel, InvoiceRequest, NodeInfo, PayOutcome, PaymentRequest, Transaction, WalletConnection,
};
use crate::units::sat_to_msat;

/// Stateless service object; cheap to clone and share across tasks.
#[derive(Clone)]
pub struct NodeClient {
    rpc: Arc<dyn RpcTransport>,
}

impl NodeClient {
    pub fn new(rpc: Arc<dyn RpcTransport>) -> Self {
        Self { rpc }
    }

    /// A client backed by [`HttpTransport`].
    pub fn over_http(config: HttpTransportConfig) -> Result<Self, CoreError> {
        Ok(Self::new(Arc::new(HttpTransport::new(config)?)))
    }

    pub async fn get_info(&self, wallet: &WalletConnection) -> Result<NodeInfo, CoreError> {
        debug!("get info");
        let raw = self.rpc.call(wallet, "getinfo", Vec::new()).await?;
        mapping::node_info_from_getinfo(raw)
    }

    /// `wallet.pubkey` if the caller knows it, otherwise ask the node.
    async fn own_pubkey(&self, wallet: &WalletConnection) -> Result<String, CoreError> {
        match &wallet.pubkey {
            Some(pubkey) => Ok(pubkey.clone()),
            None => Ok(self.get_info(wallet).await?.pubkey),
        }
    }

    // ==========================================================================
    // Channels
    // ==========================================================================

    /// Our channels with balances and aliases resolved.
    ///
    /// Issues `listchannels`, then `listpeers` and `listnodes` for every
    /// channel concurrently, and waits for all of them before returning. A
    /// failed lookup leaves that channel's `local_balance`/`remote_balance`
    /// or `alias` as `None`; it never fails the listing.
    pub async fn list_channels(&self, wallet: &WalletConnection) -> Result<Vec<Channel>, CoreError> {
        let mut channels = self.list_channels_unenriched(wallet).await?;
        self.enrich_channels(wallet, &mut channels).await;
        Ok(channels)
    }

    /// Our channels straight from `listchannels`, without the per-channel
    /// lookups.
    pub async fn list_channels_unenriched(
        &self,
        wallet: &WalletConnection,
    ) -> Result<Vec<Channel>, CoreError> {
        debug!("list channels");
        let own_pubkey = self.own_pubkey(wallet).await?;
        let raw = self.rpc.call(wallet, "listchannels", Vec::new()).await?;
        mapping::channels_from_listchannels(raw, &own_pubkey)
    }

    async fn enrich_channels(&self, wallet: &WalletConnection, channels: &mut [Channel]) {
        let lookups = channels.iter().map(|channel| {
            self.lookup_peer(
                wallet,
                &channel.remote_pubkey,
                channel.short_channel_id.as_deref(),
            )
        });
        let results = join_all(lookups).await;

        for (channel, (local_balance, alias)) in channels.iter_mut().zip(results) {
            if let Some(local) = local_balance {
                channel.set_local_balance(local);
            }
            channel.alias = alias;
        }
    }

    async fn lookup_peer(
        &self,
        wallet: &WalletConnection,
        peer: &str,
        short_channel_id: Option<&str>,
    ) -> (Option<f64>, Option<String>) {
        let params = vec![json!(peer)];
        let (peers, nodes) = tokio::join!(
            self.rpc.call(wallet, "listpeers", params.clone()),
            self.rpc.call(wallet, "listnodes", params),
        );

        let local_balance = peers
            .and_then(|raw| mapping::local_balance_from_listpeers(raw, short_channel_id))
            .map_err(|err| warn!(peer, error = %err, "channel balance lookup failed"))
            .ok();
        let alias = nodes
            .and_then(mapping::alias_from_listnodes)
            .map_err(|err| warn!(peer, error = %err, "channel alias lookup failed"))
            .ok()
            .flatten();

        (local_balance, alias)
    }

    // ==========================================================================
    // Balances
    // ==========================================================================

    /// Confirmed and unconfirmed on-chain funds.
    pub async fn wallet_balance(&self, wallet: &WalletConnection) -> Result<Amount, CoreError> {
        debug!("wallet balance");
        let raw = self.rpc.call(wallet, "listfunds", Vec::new()).await?;
        mapping::wallet_balance_from_listfunds(raw)
    }

    /// Our side of all funded channels.
    pub async fn channel_balance(&self, wallet: &WalletConnection) -> Result<Amount, CoreError> {
        debug!("channel balance");
        let raw = self.rpc.call(wallet, "listfunds", Vec::new()).await?;
        mapping::channel_balance_from_listfunds(raw)
    }

    // ==========================================================================
    // Payments
    // ==========================================================================

    pub async fn decode_pay_req(
        &self,
        wallet: &WalletConnection,
        bolt11: &str,
    ) -> Result<PaymentRequest, CoreError> {
        debug!("decode pay req");
        let raw = self
            .rpc
            .call(wallet, "decodepay", vec![json!(bolt11)])
            .await?;
        mapping::payment_request_from_decodepay(raw)
    }

    /// Pay a bolt11 invoice.
    ///
    /// `Err` means the call itself failed (unreachable node, RPC error);
    /// a node that answered but did not complete the payment yields a
    /// non-[`PayOutcome::Complete`] outcome.
    pub async fn pay(&self, wallet: &WalletConnection, bolt11: &str) -> Result<PayOutcome, CoreError> {
        debug!("pay");
        let raw = self.rpc.call(wallet, "pay", vec![json!(bolt11)]).await?;
        let outcome = mapping::pay_outcome_from_pay(raw)?;
        if let Some(reason) = outcome.failure_description() {
            warn!(reason, "payment not completed");
        }
        Ok(outcome)
    }

    /// Create an invoice and return its bolt11 string.
    pub async fn create_invoice(
        &self,
        wallet: &WalletConnection,
        request: &InvoiceRequest,
    ) -> Result<String, CoreError> {
        debug!(label = %request.label, "create invoice");
        let amount_msat = sat_to_msat(request.amount).ok_or_else(|| {
            CoreError::InvalidRequest(format!("invoice amount {} sat overflows", request.amount))
        })?;
        let raw = self
            .rpc
            .call(
                wallet,
                "invoice",
                vec![
                    json!(amount_msat),
                    json!(request.label),
                    json!(request.description),
                ],
            )
            .await?;
        mapping::bolt11_from_invoice(raw)
    }

    // ==========================================================================
    // History
    // ==========================================================================

    /// Paid invoices and all payments, newest first.
    pub async fn list_all_transactions(
        &self,
        wallet: &WalletConnection,
    ) -> Result<Vec<Transaction>, CoreError> {
        debug!("list all transactions");
        let (invoices, payments) =
            tokio::try_join!(self.list_invoices(wallet), self.list_payments(wallet))?;
        Ok(mapping::merge_history(invoices, payments))
    }

    pub async fn list_invoices(
        &self,
        wallet: &WalletConnection,
    ) -> Result<Vec<Transaction>, CoreError> {
        let raw = self.rpc.call(wallet, "listinvoices", Vec::new()).await?;
        mapping::transactions_from_listinvoices(raw)
    }

    pub async fn list_payments(
        &self,
        wallet: &WalletConnection,
    ) -> Result<Vec<Transaction>, CoreError> {
        let raw = self.rpc.call(wallet, "listpayments", Vec::new()).await?;
        mapping::transactions_from_listpayments(raw)
    }
}
