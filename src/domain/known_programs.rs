//! Known Program Addresses
//!
//! Well-known Solana program IDs and the pump.fun platform addresses used as
//! configuration defaults. The platform addresses can all be overridden from
//! config; the token program IDs are fixed by the chain.

use solana_sdk::pubkey;
use solana_sdk::pubkey::Pubkey;

/// Standard SPL Token program
pub const SPL_TOKEN_PROGRAM: Pubkey = pubkey!("TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA");
/// Token-2022 program (extension-bearing mints)
pub const TOKEN_2022_PROGRAM: Pubkey = pubkey!("TokenzQdBNbLqP5VEhdkAS6EPFLC1PHnBqCXEpPxuEb");
/// Metaplex Token Metadata program
pub const METAPLEX_METADATA_PROGRAM: Pubkey =
    pubkey!("metaqbxxUerdq28cj1RbAWkYQm3ybzjb6a8bt518x1s");
/// System Program
pub const SYSTEM_PROGRAM: Pubkey = pubkey!("11111111111111111111111111111111");

/// pump.fun update authority stamped on every token it launches
pub const PUMP_FUN_UPDATE_AUTHORITY: Pubkey =
    pubkey!("TSLvdd1pWpHVjahSpsvCXUbgwsL3JAcvokwaKt1eokM");
/// pump.fun bonding curve program
pub const PUMP_FUN_PROGRAM: Pubkey = pubkey!("6EF8rrecthR5Dkzon8Nwu78hRvfCKubJ14M5uBEwF6P");
/// Raydium migration account pump.fun tokens interact with on graduation
pub const RAYDIUM_MIGRATION_AMM: Pubkey = pubkey!("EhhTKJ6M13fa4jc281HpdyiNpAHj8uvxymgZqGuDs9Jj");

/// Raydium v3 public API
pub const RAYDIUM_API_BASE_URL: &str = "https://api-v3.raydium.io";

/// Human label for a mint owner, as shown in exported reports.
pub fn owner_label(owner: &Pubkey) -> &'static str {
    if *owner == SPL_TOKEN_PROGRAM {
        "Token Program"
    } else if *owner == TOKEN_2022_PROGRAM {
        "Token 2022 Program"
    } else if *owner == SYSTEM_PROGRAM {
        "System Program"
    } else {
        "Unknown Owner"
    }
}
