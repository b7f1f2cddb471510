//! Token metadata (name, symbol, uri, update authority)

use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;

use super::serde_helpers;

/// Where the metadata was read from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetadataSource {
    /// Metaplex Token Metadata PDA
    Metaplex,
    /// Token-2022 TokenMetadata extension stored on the mint itself
    Token2022Extension,
}

/// Token metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMetadata {
    pub name: String,
    pub symbol: String,
    pub uri: String,
    /// Authority allowed to rewrite the metadata. This is the field the
    /// platform check compares against the launch authority.
    #[serde(with = "serde_helpers::option_pubkey")]
    pub update_authority: Option<Pubkey>,
    pub source: MetadataSource,
}

impl TokenMetadata {
    /// Display label in the `NAME (SYMBOL)` form used by reports
    pub fn label(&self) -> String {
        match (self.name.is_empty(), self.symbol.is_empty()) {
            (true, true) => "Unknown".to_string(),
            (false, true) => self.name.clone(),
            (true, false) => self.symbol.clone(),
            (false, false) => format!("{} ({})", self.name, self.symbol),
        }
    }
}
