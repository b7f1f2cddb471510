//! Solana RPC Client
//!
//! Read-only JSON-RPC 2.0 client over HTTP implementing [`LedgerRpc`].
//! A single attempt per call: retries, backoff and rate-limit cool-down are
//! applied by wrapping this client in
//! [`RetryingLedger`](crate::adapters::resilience::RetryingLedger).
//!
//! Error classification:
//! - HTTP 429 / JSON-RPC 429 or -32429 -> `RateLimited` (honours `Retry-After`)
//! - HTTP 5xx, transport errors, node-health codes -> `Transient`
//! - undecodable body -> `MalformedResponse`
//! - any other JSON-RPC error -> `Rejected`

use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::header::RETRY_AFTER;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use solana_sdk::pubkey::Pubkey;
use solana_transaction_status::UiTransactionEncoding;
use tracing::{debug, trace};

use super::types::{
    EncodedTransaction, RpcErrorObject, RpcResponse, SignatureEntry, UiAccount,
    UiCompiledInstruction, WithContext,
};
use crate::ports::ledger::{
    InstructionDetail, LedgerRpc, RawAccount, RpcError, SignatureInfo, TransactionDetail,
};

/// JSON-RPC codes that signal a node-side, retryable condition
const NODE_UNHEALTHY_CODES: [i64; 3] = [-32603, -32005, -32004];
/// JSON-RPC codes used by providers for rate limiting
const RATE_LIMIT_CODES: [i64; 2] = [429, -32429];

/// Configuration for the SolanaRpcClient
#[derive(Debug, Clone)]
pub struct SolanaRpcConfig {
    /// Solana RPC endpoint URL
    pub rpc_url: String,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for SolanaRpcConfig {
    fn default() -> Self {
        Self {
            rpc_url: "https://api.mainnet-beta.solana.com".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// JSON-RPC client for ledger reads
#[derive(Debug)]
pub struct SolanaRpcClient {
    config: SolanaRpcConfig,
    http: Client,
    next_id: AtomicU64,
}

impl SolanaRpcClient {
    /// Create a new client with custom configuration
    pub fn with_config(config: SolanaRpcConfig) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            config,
            http,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn rpc_url(&self) -> &str {
        &self.config.rpc_url
    }

    /// Issue one JSON-RPC call. `Ok(None)` when the result is null.
    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<Option<T>, RpcError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request_body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        trace!("RPC request {}: {}", id, request_body);

        let response = self
            .http
            .post(&self.config.rpc_url)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| RpcError::Transient(format!("{} request failed: {}", method, e)))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(parse_retry_after);
            return Err(RpcError::RateLimited { retry_after });
        }

        let body = response
            .text()
            .await
            .map_err(|e| RpcError::Transient(format!("{} body read failed: {}", method, e)))?;

        if status.is_server_error() {
            return Err(RpcError::Transient(format!(
                "{} server error {}: {}",
                method,
                status,
                truncate(&body)
            )));
        }
        if !status.is_success() {
            return Err(RpcError::Rejected {
                code: status.as_u16() as i64,
                message: truncate(&body).to_string(),
            });
        }

        let parsed: RpcResponse<T> = serde_json::from_str(&body).map_err(|e| {
            RpcError::MalformedResponse(format!("{}: {} (body: {})", method, e, truncate(&body)))
        })?;

        if let Some(error) = parsed.error {
            return Err(classify_rpc_error(error));
        }
        Ok(parsed.result)
    }
}

#[async_trait]
impl LedgerRpc for SolanaRpcClient {
    async fn fetch_account(&self, address: &Pubkey) -> Result<Option<RawAccount>, RpcError> {
        let result: Option<WithContext<UiAccount>> = self
            .call(
                "getAccountInfo",
                json!([address.to_string(), {"encoding": "base64", "commitment": "confirmed"}]),
            )
            .await?;

        match result.and_then(|r| r.value) {
            Some(account) => {
                let account = account_from_wire(account)?;
                debug!(
                    "Fetched account {} ({} bytes, owner {})",
                    address,
                    account.data.len(),
                    account.owner
                );
                Ok(Some(account))
            }
            None => Ok(None),
        }
    }

    async fn fetch_signatures_for_address(
        &self,
        address: &Pubkey,
        limit: usize,
    ) -> Result<Vec<SignatureInfo>, RpcError> {
        let entries: Option<Vec<SignatureEntry>> = self
            .call(
                "getSignaturesForAddress",
                json!([address.to_string(), {"limit": limit, "commitment": "confirmed"}]),
            )
            .await?;

        Ok(entries
            .unwrap_or_default()
            .into_iter()
            .map(|entry| SignatureInfo {
                signature: entry.signature,
                slot: entry.slot,
                block_time: entry.block_time,
                failed: entry.err.map_or(false, |e| !e.is_null()),
            })
            .collect())
    }

    async fn fetch_transaction(
        &self,
        signature: &str,
    ) -> Result<Option<TransactionDetail>, RpcError> {
        let transaction: Option<EncodedTransaction> = self
            .call(
                "getTransaction",
                json!([
                    signature,
                    {
                        "encoding": UiTransactionEncoding::Json,
                        "maxSupportedTransactionVersion": 0,
                        "commitment": "confirmed"
                    }
                ]),
            )
            .await?;

        transaction
            .map(|tx| transaction_from_wire(signature, tx))
            .transpose()
    }
}

/// Map a JSON-RPC error object onto the error taxonomy
pub(crate) fn classify_rpc_error(error: RpcErrorObject) -> RpcError {
    if RATE_LIMIT_CODES.contains(&error.code) {
        RpcError::RateLimited { retry_after: None }
    } else if NODE_UNHEALTHY_CODES.contains(&error.code) {
        RpcError::Transient(format!("node error {}: {}", error.code, error.message))
    } else {
        RpcError::Rejected {
            code: error.code,
            message: error.message,
        }
    }
}

/// `Retry-After` in delta-seconds form
fn parse_retry_after(value: &str) -> Option<Duration> {
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}

fn truncate(body: &str) -> &str {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}

fn parse_pubkey(value: &str) -> Result<Pubkey, RpcError> {
    Pubkey::from_str(value)
        .map_err(|e| RpcError::MalformedResponse(format!("invalid pubkey {}: {}", value, e)))
}

pub(crate) fn account_from_wire(account: UiAccount) -> Result<RawAccount, RpcError> {
    let encoded = account
        .data
        .first()
        .ok_or_else(|| RpcError::MalformedResponse("account data missing".to_string()))?;
    let data = STANDARD
        .decode(encoded)
        .map_err(|e| RpcError::MalformedResponse(format!("invalid base64 account data: {}", e)))?;

    Ok(RawAccount {
        owner: parse_pubkey(&account.owner)?,
        lamports: account.lamports,
        data,
    })
}

pub(crate) fn transaction_from_wire(
    signature: &str,
    tx: EncodedTransaction,
) -> Result<TransactionDetail, RpcError> {
    let meta = tx.meta.unwrap_or_default();

    let mut account_keys = tx
        .transaction
        .message
        .account_keys
        .iter()
        .map(|k| parse_pubkey(k))
        .collect::<Result<Vec<_>, _>>()?;
    if let Some(loaded) = &meta.loaded_addresses {
        for key in loaded.writable.iter().chain(loaded.readonly.iter()) {
            account_keys.push(parse_pubkey(key)?);
        }
    }

    let mut instructions = Vec::new();
    for ix in &tx.transaction.message.instructions {
        instructions.push(resolve_instruction(&account_keys, ix, false)?);
    }
    for group in meta.inner_instructions.iter().flatten() {
        for ix in &group.instructions {
            instructions.push(resolve_instruction(&account_keys, ix, true)?);
        }
    }

    Ok(TransactionDetail {
        signature: signature.to_string(),
        slot: tx.slot,
        block_time: tx.block_time,
        account_keys,
        instructions,
    })
}

fn resolve_instruction(
    keys: &[Pubkey],
    ix: &UiCompiledInstruction,
    inner: bool,
) -> Result<InstructionDetail, RpcError> {
    let lookup = |index: u8| {
        keys.get(index as usize).copied().ok_or_else(|| {
            RpcError::MalformedResponse(format!(
                "account index {} out of range ({} keys)",
                index,
                keys.len()
            ))
        })
    };

    let program_id = lookup(ix.program_id_index)?;
    let accounts = ix
        .accounts
        .iter()
        .map(|i| lookup(*i))
        .collect::<Result<Vec<_>, _>>()?;
    let data = bs58::decode(&ix.data)
        .into_vec()
        .map_err(|e| RpcError::MalformedResponse(format!("invalid instruction data: {}", e)))?;

    Ok(InstructionDetail {
        program_id,
        accounts,
        data,
        inner,
    })
}
