//! spl-audit - Security auditor for SPL Token and Token-2022 mints
//!
//! Reads mint accounts straight from the ledger, decodes the fixed layout and
//! Token-2022 extensions, and reviews them against a fixed set of criteria.
//!
//! # Modules
//!
//! - `domain`: Core types and the security rule set (MintInfo, ExtensionRecord, SecurityReviewer)
//! - `ports`: Trait abstractions (LedgerRpc, MarketDataPort)
//! - `adapters`: External implementations (Solana RPC, Raydium, decoders, retry, CLI)
//! - `config`: Configuration and mitigation loading
//! - `application`: Per-address analyzer, platform verifier and batch orchestrator

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
