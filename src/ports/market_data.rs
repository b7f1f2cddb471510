//! Market Data Port
//!
//! Advisory pool/migration lookup used for graduation status. Never
//! authoritative for security verdicts.

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use solana_sdk::pubkey::Pubkey;
use thiserror::Error;

/// Market data error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MarketDataError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("Market data unavailable: {0}")]
    Unavailable(String),
}

/// Whether a token has an AMM pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolStatus {
    Listed,
    NotListed,
}

/// Market data port trait
#[cfg_attr(test, automock)]
#[async_trait]
pub trait MarketDataPort: Send + Sync {
    /// Look up the pool state of a mint
    async fn pool_status(&self, mint: &Pubkey) -> Result<PoolStatus, MarketDataError>;
}
