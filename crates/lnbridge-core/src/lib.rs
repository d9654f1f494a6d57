pub mod client;
pub mod error;
pub mod mapping;
pub mod rpc;
#[cfg(test)]
mod test_util;
pub mod types;
pub mod units;

pub use client::NodeClient;
pub use error::{CoreError, RpcError};
pub use types::{
    Channel, InvoiceRequest, NodeInfo, PayOutcome, PaymentRequest, Transaction, WalletConnection,
};
