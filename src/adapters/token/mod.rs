//! Token Account Decoding
//!
//! Parses raw mint account data for the standard SPL Token program and for
//! Token-2022 (fixed mint prefix followed by TLV extension records), plus
//! Metaplex metadata accounts.
//!
//! Decoding is strict: every byte of a mint account is either decoded,
//! reported as an unrecognized/unparsed record, or rejected with
//! [`DecodeError::MalformedAccount`]. Nothing is silently truncated.

mod reader;

pub mod extensions;
pub mod metadata;
pub mod mint_layout;

use solana_sdk::pubkey::Pubkey;
use thiserror::Error;

pub use extensions::decode_extensions;
pub use metadata::{decode_metaplex_metadata, metadata_from_extensions, metaplex_metadata_address};
pub use mint_layout::{decode_mint, ACCOUNT_TYPE_OFFSET, EXTENSIONS_START_OFFSET, MINT_BASE_SIZE};

/// Error type for account decoding
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Owner is neither token program
    #[error("Unsupported token program: {owner}")]
    UnsupportedProgram { owner: Pubkey },

    /// Layout invariant violated
    #[error("Malformed account ({len} bytes): {reason}")]
    MalformedAccount { reason: String, len: usize },
}

impl DecodeError {
    pub(crate) fn malformed(data: &[u8], reason: impl Into<String>) -> Self {
        DecodeError::MalformedAccount {
            reason: reason.into(),
            len: data.len(),
        }
    }
}
