//! Mitigation file loading
//!
//! JSON of the form `{ "<mint>": { "<criterion>": { "documentation": "...",
//! "applied": true } } }`. Unknown criterion names are skipped with a
//! warning; an unparsable mint address rejects the whole file.

use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;

use solana_sdk::pubkey::Pubkey;
use tracing::{info, warn};

use super::loader::ConfigError;
use crate::domain::mitigation::{Criterion, MitigationBook, MitigationEntry};

type RawMitigations = HashMap<String, HashMap<String, MitigationEntry>>;

/// Load mitigations from a JSON file
pub fn load_mitigations<P: AsRef<Path>>(path: P) -> Result<MitigationBook, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_mitigations(&content)
}

/// Parse mitigations from a JSON document
pub fn parse_mitigations(content: &str) -> Result<MitigationBook, ConfigError> {
    let raw: RawMitigations = serde_json::from_str(content)?;
    let mut book = MitigationBook::new();

    for (mint, criteria) in raw {
        let address = Pubkey::from_str(&mint).map_err(|e| {
            ConfigError::ValidationError(format!("invalid mint address {:?}: {}", mint, e))
        })?;

        for (name, entry) in criteria {
            match Criterion::from_str(&name) {
                Ok(criterion) => book.insert(address, criterion, entry),
                Err(_) => warn!("Ignoring unknown mitigation criterion {:?} for {}", name, mint),
            }
        }
    }

    info!("Loaded mitigations for {} mints", book.len());
    Ok(book)
}
