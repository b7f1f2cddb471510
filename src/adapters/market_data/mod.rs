//! Market Data Adapters
//!
//! External data sources for graduation status:
//! - `RaydiumMintClient`: Raydium v3 mint lookup (listed = migrated to the AMM)

mod raydium;

pub use raydium::{RaydiumConfig, RaydiumMintClient};
