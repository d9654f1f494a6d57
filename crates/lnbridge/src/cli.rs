use clap::{Parser, Subcommand};

/// lnbridge — wallet commands for a Core Lightning node behind a Spark-style RPC endpoint.
#[derive(Parser)]
#[command(version, about)]
pub struct Cli {
    /// Node address: `host:port` or a full http(s) URL. A bare address
    /// defaults to https.
    #[arg(long, default_value = "https://127.0.0.1:9737", env = "LNBRIDGE_HOST")]
    pub host: String,

    /// Login name the access key is derived from.
    #[arg(long, env = "LNBRIDGE_USERNAME")]
    pub username: String,

    /// Login password the access key is derived from.
    #[arg(long, env = "LNBRIDGE_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// The node's own pubkey. Looked up with `getinfo` when omitted.
    #[arg(long, env = "LNBRIDGE_PUBKEY")]
    pub pubkey: Option<String>,

    /// Cap on outbound RPC requests per second.
    #[arg(long)]
    pub rpc_requests_per_second: Option<u32>,

    /// Per-request timeout in seconds.
    #[arg(long, default_value = "30")]
    pub rpc_timeout_secs: u64,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show node identity and chain info.
    Info,
    /// List our channels.
    Channels {
        /// Skip the per-channel balance and alias lookups.
        #[arg(long)]
        no_enrich: bool,
    },
    /// Show on-chain and channel balances in satoshi.
    Balance,
    /// Decode a bolt11 payment request.
    Decode { bolt11: String },
    /// Pay a bolt11 payment request.
    Pay { bolt11: String },
    /// Create an invoice.
    Invoice {
        /// Amount in satoshi.
        #[arg(long)]
        amount: u64,
        #[arg(long)]
        label: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// Paid invoices and payments, newest first.
    History,
}
