//! Ledger RPC Port
//!
//! Read-only ledger queries needed by the analysis core. NotFound is a valid
//! outcome and is modeled as `Ok(None)`, not as an error.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use solana_sdk::pubkey::Pubkey;
use thiserror::Error;

/// Errors returned by ledger queries
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RpcError {
    /// Endpoint explicitly asked us to slow down
    #[error("Rate limited by RPC endpoint (retry after {retry_after:?})")]
    RateLimited { retry_after: Option<Duration> },

    /// Network failure, timeout, 5xx or node-health error
    #[error("Transient RPC error: {0}")]
    Transient(String),

    /// Response could not be decoded
    #[error("Malformed RPC response: {0}")]
    MalformedResponse(String),

    /// Endpoint rejected the request; retrying will not help
    #[error("RPC request rejected ({code}): {message}")]
    Rejected { code: i64, message: String },

    /// Retry budget spent
    #[error("RPC retries exhausted after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: Box<RpcError> },
}

impl RpcError {
    /// Innermost cause, unwrapping `Exhausted`
    pub fn root_cause(&self) -> &RpcError {
        match self {
            RpcError::Exhausted { last, .. } => last.root_cause(),
            other => other,
        }
    }
}

/// Raw account as stored on the ledger
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawAccount {
    /// Owning program
    pub owner: Pubkey,
    pub lamports: u64,
    pub data: Vec<u8>,
}

/// Entry from a signature history query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureInfo {
    pub signature: String,
    pub slot: u64,
    pub block_time: Option<i64>,
    /// Transaction failed on chain
    pub failed: bool,
}

/// Instruction with program and account indices resolved to addresses
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstructionDetail {
    pub program_id: Pubkey,
    pub accounts: Vec<Pubkey>,
    pub data: Vec<u8>,
    /// Emitted by CPI rather than the top-level message
    pub inner: bool,
}

/// Decoded transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionDetail {
    pub signature: String,
    pub slot: u64,
    pub block_time: Option<i64>,
    /// Static keys followed by lookup-table loaded keys
    pub account_keys: Vec<Pubkey>,
    /// Outer instructions followed by inner instructions
    pub instructions: Vec<InstructionDetail>,
}

impl TransactionDetail {
    /// Whether the transaction references `program` as an invoked program or
    /// as any account key
    pub fn touches(&self, program: &Pubkey) -> bool {
        self.account_keys.contains(program)
            || self.instructions.iter().any(|ix| ix.program_id == *program)
    }
}

/// Ledger RPC port trait
#[async_trait]
pub trait LedgerRpc: Send + Sync {
    /// Fetch an account; `None` if it does not exist
    async fn fetch_account(&self, address: &Pubkey) -> Result<Option<RawAccount>, RpcError>;

    /// Fetch up to `limit` signatures for an address, most recent first
    async fn fetch_signatures_for_address(
        &self,
        address: &Pubkey,
        limit: usize,
    ) -> Result<Vec<SignatureInfo>, RpcError>;

    /// Fetch a transaction; `None` if the node does not have it
    async fn fetch_transaction(&self, signature: &str)
        -> Result<Option<TransactionDetail>, RpcError>;
}

#[async_trait]
impl<T: LedgerRpc + ?Sized> LedgerRpc for Arc<T> {
    async fn fetch_account(&self, address: &Pubkey) -> Result<Option<RawAccount>, RpcError> {
        (**self).fetch_account(address).await
    }

    async fn fetch_signatures_for_address(
        &self,
        address: &Pubkey,
        limit: usize,
    ) -> Result<Vec<SignatureInfo>, RpcError> {
        (**self).fetch_signatures_for_address(address, limit).await
    }

    async fn fetch_transaction(
        &self,
        signature: &str,
    ) -> Result<Option<TransactionDetail>, RpcError> {
        (**self).fetch_transaction(signature).await
    }
}
