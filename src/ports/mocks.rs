//! Hand-written port mocks with scripted responses and call recording.
//! Used by unit tests and by the integration tests under `tests/`.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use solana_sdk::pubkey::Pubkey;

use super::ledger::{LedgerRpc, RawAccount, RpcError, SignatureInfo, TransactionDetail};
use super::market_data::{MarketDataError, MarketDataPort, PoolStatus};

/// Mock ledger that serves configured accounts and transactions
#[derive(Debug, Default)]
pub struct MockLedger {
    accounts: Arc<Mutex<HashMap<Pubkey, RawAccount>>>,
    signatures: Arc<Mutex<HashMap<Pubkey, Vec<SignatureInfo>>>>,
    transactions: Arc<Mutex<HashMap<String, TransactionDetail>>>,
    /// Errors returned (in order) before the configured account is served
    account_failures: Arc<Mutex<HashMap<Pubkey, VecDeque<RpcError>>>>,
    signature_failure: Arc<Mutex<Option<RpcError>>>,
    delays: Arc<Mutex<HashMap<Pubkey, Duration>>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to serve an account
    pub fn with_account(self, address: Pubkey, account: RawAccount) -> Self {
        self.accounts.lock().unwrap().insert(address, account);
        self
    }

    /// Builder method to serve a signature history
    pub fn with_signatures(self, address: Pubkey, signatures: Vec<SignatureInfo>) -> Self {
        self.signatures.lock().unwrap().insert(address, signatures);
        self
    }

    /// Builder method to serve a transaction
    pub fn with_transaction(self, transaction: TransactionDetail) -> Self {
        self.transactions
            .lock()
            .unwrap()
            .insert(transaction.signature.clone(), transaction);
        self
    }

    /// Builder method to fail `fetch_account` with each error in turn before
    /// answering normally
    pub fn with_account_failures(self, address: Pubkey, errors: Vec<RpcError>) -> Self {
        self.account_failures
            .lock()
            .unwrap()
            .insert(address, errors.into_iter().collect());
        self
    }

    /// Builder method to fail every signature history query
    pub fn with_signature_failure(self, error: RpcError) -> Self {
        *self.signature_failure.lock().unwrap() = Some(error);
        self
    }

    /// Builder method to delay `fetch_account` for an address
    pub fn with_delay(self, address: Pubkey, delay: Duration) -> Self {
        self.delays.lock().unwrap().insert(address, delay);
        self
    }

    /// Get all recorded calls as `method:argument`
    pub fn get_calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of recorded calls to a method
    pub fn call_count(&self, method: &str) -> usize {
        let prefix = format!("{}:", method);
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.starts_with(&prefix))
            .count()
    }

    fn record(&self, method: &str, argument: &str) {
        self.calls.lock().unwrap().push(format!("{}:{}", method, argument));
    }
}

#[async_trait]
impl LedgerRpc for MockLedger {
    async fn fetch_account(&self, address: &Pubkey) -> Result<Option<RawAccount>, RpcError> {
        self.record("fetch_account", &address.to_string());

        let delay = self.delays.lock().unwrap().get(address).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let failure = self
            .account_failures
            .lock()
            .unwrap()
            .get_mut(address)
            .and_then(|queue| queue.pop_front());
        if let Some(error) = failure {
            return Err(error);
        }

        Ok(self.accounts.lock().unwrap().get(address).cloned())
    }

    async fn fetch_signatures_for_address(
        &self,
        address: &Pubkey,
        limit: usize,
    ) -> Result<Vec<SignatureInfo>, RpcError> {
        self.record("fetch_signatures_for_address", &address.to_string());

        if let Some(error) = self.signature_failure.lock().unwrap().clone() {
            return Err(error);
        }

        Ok(self
            .signatures
            .lock()
            .unwrap()
            .get(address)
            .map(|sigs| sigs.iter().take(limit).cloned().collect())
            .unwrap_or_default())
    }

    async fn fetch_transaction(
        &self,
        signature: &str,
    ) -> Result<Option<TransactionDetail>, RpcError> {
        self.record("fetch_transaction", signature);
        Ok(self.transactions.lock().unwrap().get(signature).cloned())
    }
}

/// Mock market data port with per-mint responses
#[derive(Debug, Default)]
pub struct MockMarketData {
    calls: Arc<Mutex<Vec<Pubkey>>>,
    responses: Arc<Mutex<HashMap<Pubkey, Result<PoolStatus, MarketDataError>>>>,
}

impl MockMarketData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set a response for a given mint
    pub fn with_response(self, mint: Pubkey, response: Result<PoolStatus, MarketDataError>) -> Self {
        self.responses.lock().unwrap().insert(mint, response);
        self
    }

    /// Get all recorded calls
    pub fn get_calls(&self) -> Vec<Pubkey> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl MarketDataPort for MockMarketData {
    async fn pool_status(&self, mint: &Pubkey) -> Result<PoolStatus, MarketDataError> {
        self.calls.lock().unwrap().push(*mint);
        self.responses
            .lock()
            .unwrap()
            .get(mint)
            .cloned()
            .unwrap_or_else(|| Err(MarketDataError::Unavailable("No response configured".to_string())))
    }
}
