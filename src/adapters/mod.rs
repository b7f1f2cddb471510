//! Adapters Layer - External System Implementations
//!
//! This module contains implementations of the port traits and the codecs
//! behind them:
//! - Solana: JSON-RPC client for the ledger port
//! - Resilience: retry policy, shared rate-limit gate, retrying ledger wrapper
//! - Token: mint, Token-2022 extension and metadata account decoding
//! - Market Data: Raydium graduation lookup
//! - CLI: Command-line interface handlers

pub mod cli;
pub mod market_data;
pub mod resilience;
pub mod solana;
pub mod token;

pub use cli::CliApp;
pub use market_data::{RaydiumConfig, RaydiumMintClient};
pub use resilience::{RateLimitGate, RetryPolicy, RetryingLedger};
pub use solana::{SolanaRpcClient, SolanaRpcConfig};
pub use token::DecodeError;
