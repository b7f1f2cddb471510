//! Raydium mint lookup
//!
//! Graduation check against the Raydium v3 API: `GET /mint/ids?mints=<mint>`.
//! A non-null first entry in `data` means Raydium knows the mint (it has
//! migrated to the AMM); an empty list or `[null]` means it has not.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use solana_sdk::pubkey::Pubkey;
use tracing::{debug, info};

use crate::adapters::resilience::{RateLimitGate, RetryClass, RetryError, RetryPolicy, Retryable};
use crate::domain::known_programs::RAYDIUM_API_BASE_URL;
use crate::ports::market_data::{MarketDataError, MarketDataPort, PoolStatus};

const MINT_INFO_ENDPOINT: &str = "/mint/ids";
/// Header carrying the optional API key
const API_KEY_HEADER: &str = "x-api-key";

/// Configuration for the RaydiumMintClient
#[derive(Debug, Clone)]
pub struct RaydiumConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl Default for RaydiumConfig {
    fn default() -> Self {
        Self {
            base_url: RAYDIUM_API_BASE_URL.to_string(),
            api_key: None,
            timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Deserialize)]
struct MintIdsResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    data: Option<Vec<Option<MintEntry>>>,
}

#[derive(Debug, Deserialize)]
struct MintEntry {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    symbol: Option<String>,
}

impl Retryable for MarketDataError {
    fn retry_class(&self) -> RetryClass {
        match self {
            MarketDataError::Http(_) => RetryClass::Transient,
            MarketDataError::Status { status, .. } if *status == 429 => {
                RetryClass::RateLimited(None)
            }
            MarketDataError::Status { status, .. } if *status >= 500 => RetryClass::Transient,
            _ => RetryClass::Fatal,
        }
    }
}

/// Raydium API client implementing [`MarketDataPort`]
#[derive(Debug)]
pub struct RaydiumMintClient {
    config: RaydiumConfig,
    http: Client,
    policy: RetryPolicy,
    gate: Arc<RateLimitGate>,
}

impl RaydiumMintClient {
    pub fn new(
        config: RaydiumConfig,
        policy: RetryPolicy,
        gate: Arc<RateLimitGate>,
    ) -> Result<Self, MarketDataError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| MarketDataError::Http(e.to_string()))?;
        Ok(Self {
            config,
            http,
            policy,
            gate,
        })
    }

    fn url(&self, mint: &Pubkey) -> String {
        format!(
            "{}{}?mints={}",
            self.config.base_url.trim_end_matches('/'),
            MINT_INFO_ENDPOINT,
            mint
        )
    }

    /// One request, no retry
    async fn query(&self, url: &str) -> Result<String, MarketDataError> {
        let mut request = self.http.get(url);
        if let Some(key) = &self.config.api_key {
            request = request.header(API_KEY_HEADER, key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| MarketDataError::Http(e.to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| MarketDataError::Http(e.to_string()))?;

        if status != StatusCode::OK {
            return Err(MarketDataError::Status {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }
        Ok(body)
    }
}

/// Map a `/mint/ids` response body to a pool status
fn parse_mint_ids(body: &str) -> Result<PoolStatus, MarketDataError> {
    let response: MintIdsResponse =
        serde_json::from_str(body).map_err(|e| MarketDataError::Malformed(e.to_string()))?;

    if !response.success {
        return Err(MarketDataError::Unavailable(
            "Raydium API reported success=false".to_string(),
        ));
    }

    match response.data.as_deref() {
        Some([Some(entry), ..]) => {
            info!(
                "Token found in Raydium - Name: {}, Symbol: {}",
                entry.name.as_deref().unwrap_or("N/A"),
                entry.symbol.as_deref().unwrap_or("N/A")
            );
            Ok(PoolStatus::Listed)
        }
        Some([]) | Some([None, ..]) => Ok(PoolStatus::NotListed),
        None => Err(MarketDataError::Malformed("missing data field".to_string())),
    }
}

fn flatten(error: RetryError<MarketDataError>) -> MarketDataError {
    match error {
        RetryError::Fatal(error) => error,
        RetryError::Exhausted { attempts, last } => {
            MarketDataError::Unavailable(format!("gave up after {} attempts: {}", attempts, last))
        }
    }
}

#[async_trait]
impl MarketDataPort for RaydiumMintClient {
    async fn pool_status(&self, mint: &Pubkey) -> Result<PoolStatus, MarketDataError> {
        let url = self.url(mint);
        debug!("Checking Raydium graduation status: {}", url);

        let body = self
            .policy
            .run(&self.gate, "raydium mint lookup", || self.query(&url))
            .await
            .map_err(flatten)?;
        parse_mint_ids(&body)
    }
}
