//! Mint Model
//!
//! Decoded view of a mint account. Created by the account decoder and never
//! mutated afterwards.

use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;

use super::known_programs::{SPL_TOKEN_PROGRAM, TOKEN_2022_PROGRAM};
use super::serde_helpers;

/// Ledger address of a token mint. Opaque 32 bytes, used as the lookup key
/// everywhere.
pub type TokenAccountAddress = Pubkey;

/// Token program that owns a mint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenProgram {
    /// Standard SPL Token program (fixed layout, no extensions)
    Spl,
    /// Token-2022 program with TLV extensions
    Token2022,
}

impl TokenProgram {
    /// Resolve the program variant from an account owner
    pub fn from_owner(owner: &Pubkey) -> Option<Self> {
        if *owner == SPL_TOKEN_PROGRAM {
            Some(TokenProgram::Spl)
        } else if *owner == TOKEN_2022_PROGRAM {
            Some(TokenProgram::Token2022)
        } else {
            None
        }
    }

    pub fn program_id(&self) -> Pubkey {
        match self {
            TokenProgram::Spl => SPL_TOKEN_PROGRAM,
            TokenProgram::Token2022 => TOKEN_2022_PROGRAM,
        }
    }

    /// Whether mints of this program can carry extension records
    pub fn supports_extensions(&self) -> bool {
        matches!(self, TokenProgram::Token2022)
    }

    pub fn name(&self) -> &'static str {
        match self {
            TokenProgram::Spl => "Token Program",
            TokenProgram::Token2022 => "Token 2022 Program",
        }
    }
}

/// Decoded mint account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintInfo {
    /// Program variant the mint belongs to
    pub program: TokenProgram,
    /// Owning program ID
    #[serde(with = "serde_helpers::pubkey")]
    pub program_id: Pubkey,
    /// Supply in base units
    pub supply: u64,
    /// Number of decimal places
    pub decimals: u8,
    pub is_initialized: bool,
    /// Can mint new supply (None = revoked)
    #[serde(with = "serde_helpers::option_pubkey")]
    pub mint_authority: Option<Pubkey>,
    /// Can freeze holder accounts (None = revoked)
    #[serde(with = "serde_helpers::option_pubkey")]
    pub freeze_authority: Option<Pubkey>,
}

impl MintInfo {
    /// Supply in human units (adjusted for decimals)
    pub fn supply_adjusted(&self) -> f64 {
        self.supply as f64 / 10f64.powi(self.decimals as i32)
    }

    pub fn has_freeze_authority(&self) -> bool {
        self.freeze_authority.is_some()
    }

    pub fn has_mint_authority(&self) -> bool {
        self.mint_authority.is_some()
    }
}
