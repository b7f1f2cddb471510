//! Ledger wrapper applying the retry policy and rate-limit gate to every call

use std::sync::Arc;

use async_trait::async_trait;
use solana_sdk::pubkey::Pubkey;

use super::rate_limit::RateLimitGate;
use super::retry::{RetryClass, RetryError, RetryPolicy, Retryable};
use crate::ports::ledger::{LedgerRpc, RawAccount, RpcError, SignatureInfo, TransactionDetail};

impl Retryable for RpcError {
    fn retry_class(&self) -> RetryClass {
        match self {
            RpcError::RateLimited { retry_after } => RetryClass::RateLimited(*retry_after),
            // Proxies in front of RPC nodes return HTML error pages under load
            RpcError::Transient(_) | RpcError::MalformedResponse(_) => RetryClass::Transient,
            RpcError::Rejected { .. } | RpcError::Exhausted { .. } => RetryClass::Fatal,
        }
    }
}

impl From<RetryError<RpcError>> for RpcError {
    fn from(error: RetryError<RpcError>) -> Self {
        match error {
            RetryError::Fatal(error) => error,
            RetryError::Exhausted { attempts, last } => RpcError::Exhausted {
                attempts,
                last: Box::new(last),
            },
        }
    }
}

/// Retrying ledger client
pub struct RetryingLedger<L> {
    inner: L,
    policy: RetryPolicy,
    gate: Arc<RateLimitGate>,
}

impl<L: LedgerRpc> RetryingLedger<L> {
    pub fn new(inner: L, policy: RetryPolicy, gate: Arc<RateLimitGate>) -> Self {
        Self { inner, policy, gate }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn inner(&self) -> &L {
        &self.inner
    }
}

#[async_trait]
impl<L: LedgerRpc> LedgerRpc for RetryingLedger<L> {
    async fn fetch_account(&self, address: &Pubkey) -> Result<Option<RawAccount>, RpcError> {
        let operation = format!("getAccountInfo({})", address);
        self.policy
            .run(&self.gate, &operation, || self.inner.fetch_account(address))
            .await
            .map_err(RpcError::from)
    }

    async fn fetch_signatures_for_address(
        &self,
        address: &Pubkey,
        limit: usize,
    ) -> Result<Vec<SignatureInfo>, RpcError> {
        let operation = format!("getSignaturesForAddress({})", address);
        self.policy
            .run(&self.gate, &operation, || {
                self.inner.fetch_signatures_for_address(address, limit)
            })
            .await
            .map_err(RpcError::from)
    }

    async fn fetch_transaction(
        &self,
        signature: &str,
    ) -> Result<Option<TransactionDetail>, RpcError> {
        let operation = format!("getTransaction({})", signature);
        self.policy
            .run(&self.gate, &operation, || self.inner.fetch_transaction(signature))
            .await
            .map_err(RpcError::from)
    }
}
