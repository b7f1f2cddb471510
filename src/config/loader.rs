//! Configuration Loader
//!
//! Loads and validates the auditor configuration from a TOML file. Every
//! section is optional; missing values fall back to mainnet defaults.

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;
use solana_sdk::pubkey::Pubkey;
use thiserror::Error;

use crate::adapters::market_data::RaydiumConfig;
use crate::adapters::resilience::{RateLimitGate, RetryPolicy};
use crate::adapters::solana::SolanaRpcConfig;
use crate::application::PlatformConfig;
use crate::domain::known_programs::{
    METAPLEX_METADATA_PROGRAM, PUMP_FUN_PROGRAM, PUMP_FUN_UPDATE_AUTHORITY,
    RAYDIUM_API_BASE_URL, RAYDIUM_MIGRATION_AMM,
};

/// Main configuration structure matching config.toml
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub rpc: RpcSection,
    pub retry: RetrySection,
    pub rate_limit: RateLimitSection,
    pub batch: BatchSection,
    pub platform: PlatformSection,
    pub market_data: MarketDataSection,
    pub logging: LoggingSection,
}

/// Solana RPC configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RpcSection {
    /// RPC endpoint (use a private RPC for large batches)
    pub url: String,
    /// Per-request timeout
    pub timeout_secs: u64,
}

impl Default for RpcSection {
    fn default() -> Self {
        Self {
            url: "https://api.mainnet-beta.solana.com".to_string(),
            timeout_secs: 30,
        }
    }
}

impl RpcSection {
    /// Replace the configured URL with a non-empty override
    fn override_url(&mut self, url: Option<String>) {
        if let Some(url) = url.filter(|url| !url.is_empty()) {
            self.url = url;
        }
    }
}

/// Retry configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetrySection {
    /// Total attempts per call, including the first
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    /// Ceiling on time spent waiting across all retries of one call
    pub max_total_wait_ms: u64,
    /// Jitter applied to each backoff (0-100)
    pub jitter_pct: u32,
    /// Cool-down after a 429 without Retry-After
    pub rate_limit_cooldown_ms: u64,
}

impl Default for RetrySection {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            max_attempts: policy.max_attempts,
            base_delay_ms: policy.base_delay.as_millis() as u64,
            max_delay_ms: policy.max_delay.as_millis() as u64,
            max_total_wait_ms: policy.max_total_wait.as_millis() as u64,
            jitter_pct: policy.jitter_pct,
            rate_limit_cooldown_ms: policy.rate_limit_cooldown.as_millis() as u64,
        }
    }
}

/// Shared request throttle
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RateLimitSection {
    /// 0 disables throttling (cool-downs still apply)
    pub requests_per_second: u32,
    pub burst: u32,
}

impl Default for RateLimitSection {
    fn default() -> Self {
        Self {
            requests_per_second: 10,
            burst: 10,
        }
    }
}

/// Batch configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BatchSection {
    /// Analyses in flight at once
    pub concurrency: usize,
    /// Cancel the whole batch after this many seconds
    pub deadline_secs: Option<u64>,
}

impl Default for BatchSection {
    fn default() -> Self {
        Self {
            concurrency: 4,
            deadline_secs: None,
        }
    }
}

/// Launch-platform verification section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlatformSection {
    pub enabled: bool,
    pub launch_authority: String,
    pub launch_program: String,
    pub amm_program: String,
    pub metadata_program: String,
    /// Recent signatures scanned per token
    pub signature_limit: usize,
}

impl Default for PlatformSection {
    fn default() -> Self {
        Self {
            enabled: true,
            launch_authority: PUMP_FUN_UPDATE_AUTHORITY.to_string(),
            launch_program: PUMP_FUN_PROGRAM.to_string(),
            amm_program: RAYDIUM_MIGRATION_AMM.to_string(),
            metadata_program: METAPLEX_METADATA_PROGRAM.to_string(),
            signature_limit: PlatformConfig::default().signature_limit,
        }
    }
}

/// Market data API section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MarketDataSection {
    pub base_url: String,
    /// Optional API key for higher rate limits
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for MarketDataSection {
    fn default() -> Self {
        Self {
            base_url: RAYDIUM_API_BASE_URL.to_string(),
            api_key: None,
            timeout_secs: 10,
        }
    }
}

impl MarketDataSection {
    /// Get API key with environment variable fallback
    /// Checks MARKET_DATA_API_KEY env var if config value is empty/None
    pub fn get_api_key(&self) -> Option<String> {
        if let Some(ref key) = self.api_key {
            if !key.is_empty() {
                return Some(key.clone());
            }
        }
        std::env::var("MARKET_DATA_API_KEY")
            .ok()
            .filter(|key| !key.is_empty())
    }
}

/// Logging configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level: "trace", "debug", "info", "warn", "error"
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Failed to parse JSON: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

/// Largest `limit` RPC nodes accept for getSignaturesForAddress
const MAX_SIGNATURE_LIMIT: usize = 1000;

/// Load configuration from a TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut config: Config = toml::from_str(&content)?;
    config.apply_env_overrides();
    config.validate()?;
    Ok(config)
}

fn parse_address(field: &str, value: &str) -> Result<Pubkey, ConfigError> {
    Pubkey::from_str(value).map_err(|e| {
        ConfigError::ValidationError(format!("{} is not a valid address ({}): {}", field, value, e))
    })
}

impl Config {
    /// Apply SOLANA_RPC_URL over the file value. Runs at load time so
    /// command-line flags applied afterwards take precedence.
    pub fn apply_env_overrides(&mut self) {
        self.rpc.override_url(std::env::var("SOLANA_RPC_URL").ok());
    }

    /// Validate all configuration parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rpc.url.is_empty() {
            return Err(ConfigError::ValidationError(
                "rpc.url cannot be empty".to_string(),
            ));
        }

        if self.retry.max_attempts == 0 {
            return Err(ConfigError::ValidationError(
                "retry.max_attempts must be > 0".to_string(),
            ));
        }

        if self.retry.jitter_pct > 100 {
            return Err(ConfigError::ValidationError(format!(
                "retry.jitter_pct must be 0-100, got {}",
                self.retry.jitter_pct
            )));
        }

        if self.retry.base_delay_ms > self.retry.max_delay_ms {
            return Err(ConfigError::ValidationError(format!(
                "retry.base_delay_ms ({}) exceeds retry.max_delay_ms ({})",
                self.retry.base_delay_ms, self.retry.max_delay_ms
            )));
        }

        if self.batch.concurrency == 0 {
            return Err(ConfigError::ValidationError(
                "batch.concurrency must be > 0".to_string(),
            ));
        }

        if self.market_data.base_url.is_empty() {
            return Err(ConfigError::ValidationError(
                "market_data.base_url cannot be empty".to_string(),
            ));
        }

        if !(1..=MAX_SIGNATURE_LIMIT).contains(&self.platform.signature_limit) {
            return Err(ConfigError::ValidationError(format!(
                "platform.signature_limit must be between 1 and {}",
                MAX_SIGNATURE_LIMIT
            )));
        }

        self.platform_config()?;
        self.metadata_program()?;

        Ok(())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retry.max_attempts,
            base_delay: Duration::from_millis(self.retry.base_delay_ms),
            max_delay: Duration::from_millis(self.retry.max_delay_ms),
            max_total_wait: Duration::from_millis(self.retry.max_total_wait_ms),
            jitter_pct: self.retry.jitter_pct,
            rate_limit_cooldown: Duration::from_millis(self.retry.rate_limit_cooldown_ms),
        }
    }

    pub fn rate_limit_gate(&self) -> RateLimitGate {
        RateLimitGate::new(self.rate_limit.requests_per_second, self.rate_limit.burst)
    }

    pub fn rpc_config(&self) -> SolanaRpcConfig {
        SolanaRpcConfig {
            rpc_url: self.rpc.url.clone(),
            timeout: Duration::from_secs(self.rpc.timeout_secs),
        }
    }

    pub fn market_data_config(&self) -> RaydiumConfig {
        RaydiumConfig {
            base_url: self.market_data.base_url.clone(),
            api_key: self.market_data.get_api_key(),
            timeout: Duration::from_secs(self.market_data.timeout_secs),
        }
    }

    pub fn platform_config(&self) -> Result<PlatformConfig, ConfigError> {
        Ok(PlatformConfig {
            launch_authority: parse_address(
                "platform.launch_authority",
                &self.platform.launch_authority,
            )?,
            launch_program: parse_address("platform.launch_program", &self.platform.launch_program)?,
            amm_program: parse_address("platform.amm_program", &self.platform.amm_program)?,
            signature_limit: self.platform.signature_limit,
        })
    }

    pub fn metadata_program(&self) -> Result<Pubkey, ConfigError> {
        parse_address("platform.metadata_program", &self.platform.metadata_program)
    }

    pub fn batch_deadline(&self) -> Option<Duration> {
        self.batch.deadline_secs.map(Duration::from_secs)
    }
}
