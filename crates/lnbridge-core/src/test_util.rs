//! Shared fixtures for `lnbridge-core` unit tests.

use crate::types::WalletConnection;

/// Pubkey the fixture wallet claims as its own.
pub const OWN_PUBKEY: &str = "02aa";

/// A wallet pointing at a node that only the mock transport ever answers for.
pub fn wallet() -> WalletConnection {
    WalletConnection::new("127.0.0.1:9737", "spark", "secret").with_pubkey(OWN_PUBKEY)
}
