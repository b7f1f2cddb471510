//! Mint Account Layout
//!
//! Standard Mint Account Layout (first 82 bytes):
//! - Offset 0-3:   mint_authority_option (u32: 0=None, 1=Some)
//! - Offset 4-35:  mint_authority (Pubkey, 32 bytes)
//! - Offset 36-43: supply (u64)
//! - Offset 44:    decimals (u8)
//! - Offset 45:    is_initialized (bool)
//! - Offset 46-49: freeze_authority_option (u32: 0=None, 1=Some)
//! - Offset 50-81: freeze_authority (Pubkey, 32 bytes)
//!
//! A Token-2022 mint with extensions is padded with zeros up to the size of a
//! token account (165 bytes), followed by one account-type byte and the TLV
//! records.

use solana_sdk::pubkey::Pubkey;
use spl_token::solana_program::program_pack::Pack;
use tracing::debug;

use super::reader::ByteReader;
use super::DecodeError;
use crate::domain::mint::{MintInfo, TokenProgram};

/// Base mint account size (standard fields)
pub const MINT_BASE_SIZE: usize = spl_token::state::Mint::LEN;
/// Account type discriminator offset for Token-2022 (size of a token account)
pub const ACCOUNT_TYPE_OFFSET: usize = spl_token::state::Account::LEN;
/// First TLV header
pub const EXTENSIONS_START_OFFSET: usize = ACCOUNT_TYPE_OFFSET + 1;
/// Account type byte value for a mint
pub const ACCOUNT_TYPE_MINT: u8 = 1;

/// Decode a mint account owned by `owner`.
///
/// The owner selects the layout. Standard mints must be exactly 82 bytes.
/// Token-2022 mints are either 82 bytes (no extensions) or carry the padded
/// prefix and mint account-type byte; extensions themselves are decoded by
/// [`super::decode_extensions`].
pub fn decode_mint(owner: &Pubkey, data: &[u8]) -> Result<MintInfo, DecodeError> {
    let program = TokenProgram::from_owner(owner)
        .ok_or(DecodeError::UnsupportedProgram { owner: *owner })?;

    if data.len() < MINT_BASE_SIZE {
        return Err(DecodeError::malformed(
            data,
            format!("mint data shorter than {} bytes", MINT_BASE_SIZE),
        ));
    }

    match program {
        TokenProgram::Spl if data.len() != MINT_BASE_SIZE => {
            return Err(DecodeError::malformed(
                data,
                format!(
                    "standard mint must be exactly {} bytes, found {} trailing bytes",
                    MINT_BASE_SIZE,
                    data.len() - MINT_BASE_SIZE
                ),
            ));
        }
        TokenProgram::Token2022 => check_extended_prefix(data)?,
        TokenProgram::Spl => {}
    }

    let mut reader = ByteReader::new(&data[..MINT_BASE_SIZE]);
    let parse = |reader: &mut ByteReader<'_>| -> Result<MintInfo, String> {
        let mint_authority = coption_pubkey(reader, "mint authority")?;
        let supply = reader.u64()?;
        let decimals = reader.u8()?;
        let is_initialized = reader
            .bool()
            .map_err(|e| format!("is_initialized: {}", e))?;
        let freeze_authority = coption_pubkey(reader, "freeze authority")?;
        Ok(MintInfo {
            program,
            program_id: *owner,
            supply,
            decimals,
            is_initialized,
            mint_authority,
            freeze_authority,
        })
    };

    let info = parse(&mut reader).map_err(|reason| DecodeError::malformed(data, reason))?;
    debug!(
        "Decoded {} mint: supply={} decimals={} freeze_authority={:?}",
        program.name(),
        info.supply,
        info.decimals,
        info.freeze_authority
    );
    Ok(info)
}

/// Validate the Token-2022 prefix between the base mint and the TLV region
pub(crate) fn check_extended_prefix(data: &[u8]) -> Result<(), DecodeError> {
    if data.len() == MINT_BASE_SIZE {
        return Ok(());
    }
    if data.len() < EXTENSIONS_START_OFFSET {
        return Err(DecodeError::malformed(
            data,
            format!(
                "extended mint must be at least {} bytes",
                EXTENSIONS_START_OFFSET
            ),
        ));
    }
    if data[MINT_BASE_SIZE..ACCOUNT_TYPE_OFFSET].iter().any(|b| *b != 0) {
        return Err(DecodeError::malformed(
            data,
            "non-zero bytes in padding between mint and account type",
        ));
    }
    let account_type = data[ACCOUNT_TYPE_OFFSET];
    if account_type != ACCOUNT_TYPE_MINT {
        return Err(DecodeError::malformed(
            data,
            format!("account type {} is not a mint", account_type),
        ));
    }
    Ok(())
}

fn coption_pubkey(reader: &mut ByteReader<'_>, field: &str) -> Result<Option<Pubkey>, String> {
    let tag = reader.u32()?;
    let key = reader.pubkey()?;
    match tag {
        0 => Ok(None),
        1 => Ok(Some(key)),
        other => Err(format!("{} has invalid COption tag {}", field, other)),
    }
}

/// Encode a mint in the standard 82-byte layout. Test fixtures only.
#[cfg(test)]
pub(crate) fn encode_mint(
    mint_authority: Option<Pubkey>,
    supply: u64,
    decimals: u8,
    freeze_authority: Option<Pubkey>,
) -> Vec<u8> {
    let mut data = Vec::with_capacity(MINT_BASE_SIZE);
    let push_coption = |data: &mut Vec<u8>, key: Option<Pubkey>| {
        data.extend_from_slice(&(key.is_some() as u32).to_le_bytes());
        data.extend_from_slice(key.unwrap_or_default().as_ref());
    };
    push_coption(&mut data, mint_authority);
    data.extend_from_slice(&supply.to_le_bytes());
    data.push(decimals);
    data.push(1);
    push_coption(&mut data, freeze_authority);
    data
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::known_programs::{SPL_TOKEN_PROGRAM, TOKEN_2022_PROGRAM};

    #[test]
    fn test_layout_constants() {
        assert_eq!(MINT_BASE_SIZE, 82);
        assert_eq!(ACCOUNT_TYPE_OFFSET, 165);
        assert_eq!(EXTENSIONS_START_OFFSET, 166);
    }

    #[test]
    fn test_decode_no_authorities() {
        let data = encode_mint(None, 1_000_000, 9, None);
        let info = decode_mint(&SPL_TOKEN_PROGRAM, &data).unwrap();

        assert_eq!(info.program, TokenProgram::Spl);
        assert_eq!(info.program_id, SPL_TOKEN_PROGRAM);
        assert_eq!(info.supply, 1_000_000);
        assert_eq!(info.decimals, 9);
        assert!(info.is_initialized);
        assert!(info.mint_authority.is_none());
        assert!(info.freeze_authority.is_none());
    }

    #[test]
    fn test_decode_with_both_authorities() {
        let mint_auth = Pubkey::new_unique();
        let freeze_auth = Pubkey::new_unique();
        let data = encode_mint(Some(mint_auth), 42, 6, Some(freeze_auth));
        let info = decode_mint(&TOKEN_2022_PROGRAM, &data).unwrap();

        assert_eq!(info.program, TokenProgram::Token2022);
        assert_eq!(info.mint_authority, Some(mint_auth));
        assert_eq!(info.freeze_authority, Some(freeze_auth));
    }

    #[test]
    fn test_decode_is_idempotent() {
        let data = encode_mint(Some(Pubkey::new_unique()), 7, 2, Some(Pubkey::new_unique()));
        let first = decode_mint(&SPL_TOKEN_PROGRAM, &data).unwrap();
        let second = decode_mint(&SPL_TOKEN_PROGRAM, &data).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_unknown_owner_rejected() {
        let owner = Pubkey::new_unique();
        let data = encode_mint(None, 1, 0, None);
        assert_eq!(
            decode_mint(&owner, &data),
            Err(DecodeError::UnsupportedProgram { owner })
        );
    }

    #[test]
    fn test_short_data_rejected() {
        let err = decode_mint(&SPL_TOKEN_PROGRAM, &[0u8; 40]).unwrap_err();
        assert!(matches!(err, DecodeError::MalformedAccount { len: 40, .. }));
    }

    #[test]
    fn test_standard_mint_trailing_bytes_rejected() {
        let mut data = encode_mint(None, 1, 0, None);
        data.push(0);
        let err = decode_mint(&SPL_TOKEN_PROGRAM, &data).unwrap_err();
        assert!(matches!(err, DecodeError::MalformedAccount { len: 83, .. }));
    }

    #[test]
    fn test_invalid_coption_tag_rejected() {
        let mut data = encode_mint(None, 1, 0, None);
        data[46] = 7;
        let err = decode_mint(&SPL_TOKEN_PROGRAM, &data).unwrap_err();
        match err {
            DecodeError::MalformedAccount { reason, .. } => {
                assert!(reason.contains("freeze authority"))
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_token_2022_between_base_and_prefix_rejected() {
        let mut data = encode_mint(None, 1, 0, None);
        data.resize(120, 0);
        assert!(decode_mint(&TOKEN_2022_PROGRAM, &data).is_err());
    }

    #[test]
    fn test_token_2022_wrong_account_type_rejected() {
        let mut data = encode_mint(None, 1, 0, None);
        data.resize(EXTENSIONS_START_OFFSET, 0);
        data[ACCOUNT_TYPE_OFFSET] = 2;
        let err = decode_mint(&TOKEN_2022_PROGRAM, &data).unwrap_err();
        assert!(err.to_string().contains("not a mint"));
    }
}
