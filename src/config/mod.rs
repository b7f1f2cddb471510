//! Configuration Module
//!
//! Loads and validates the TOML configuration and the mitigation JSON.

pub mod loader;
pub mod mitigations;

pub use loader::{
    load_config, BatchSection, Config, ConfigError, LoggingSection, MarketDataSection,
    PlatformSection, RateLimitSection, RetrySection, RpcSection,
};
pub use mitigations::{load_mitigations, parse_mitigations};
