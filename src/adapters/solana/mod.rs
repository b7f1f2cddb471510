//! Solana JSON-RPC adapter for the ledger port

pub mod rpc;
pub mod types;

pub use rpc::{SolanaRpcClient, SolanaRpcConfig};
