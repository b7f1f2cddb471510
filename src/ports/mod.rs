//! Ports Layer - Trait definitions for external dependencies
//!
//! This module defines the interfaces (ports) that adapters must implement.
//! Following hexagonal architecture, these traits abstract:
//! - Ledger RPC queries (accounts, signature history, transactions)
//! - Market data (pool / migration status)

pub mod ledger;
pub mod market_data;
pub mod mocks;

pub use ledger::{
    InstructionDetail, LedgerRpc, RawAccount, RpcError, SignatureInfo, TransactionDetail,
};
pub use market_data::{MarketDataError, MarketDataPort, PoolStatus};
