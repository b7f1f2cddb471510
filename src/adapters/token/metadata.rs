//! Token metadata lookup
//!
//! Metaplex metadata lives in a PDA derived from the mint; Token-2022 mints
//! may instead carry a TokenMetadata extension on the mint itself.
//!
//! Metaplex Metadata Layout (prefix we read):
//! - Offset 0:     key (4 = MetadataV1)
//! - Offset 1-32:  update_authority (Pubkey)
//! - Offset 33-64: mint (Pubkey)
//! - Offset 65+:   name, symbol, uri (borsh strings, NUL padded)

use solana_sdk::pubkey::Pubkey;

use super::reader::ByteReader;
use super::DecodeError;
use crate::domain::extension::ExtensionRecord;
use crate::domain::metadata::{MetadataSource, TokenMetadata};

/// Metaplex account key for a V1 metadata account
const METADATA_V1_KEY: u8 = 4;

/// Derive the Metaplex metadata PDA for a mint
pub fn metaplex_metadata_address(mint: &Pubkey, metadata_program: &Pubkey) -> Pubkey {
    let (address, _bump) = Pubkey::find_program_address(
        &[b"metadata", metadata_program.as_ref(), mint.as_ref()],
        metadata_program,
    );
    address
}

/// Decode a Metaplex metadata account
pub fn decode_metaplex_metadata(data: &[u8]) -> Result<TokenMetadata, DecodeError> {
    let mut reader = ByteReader::new(data);
    let parse = |r: &mut ByteReader<'_>| -> Result<TokenMetadata, String> {
        let key = r.u8()?;
        if key != METADATA_V1_KEY {
            return Err(format!("account key {} is not a metadata account", key));
        }
        let update_authority = r.pubkey()?;
        let _mint = r.pubkey()?;
        let name = trim_padding(r.string()?);
        let symbol = trim_padding(r.string()?);
        let uri = trim_padding(r.string()?);
        Ok(TokenMetadata {
            name,
            symbol,
            uri,
            update_authority: Some(update_authority),
            source: MetadataSource::Metaplex,
        })
    };

    parse(&mut reader).map_err(|reason| DecodeError::malformed(data, reason))
}

/// Metadata from a Token-2022 TokenMetadata extension, if present
pub fn metadata_from_extensions(extensions: &[ExtensionRecord]) -> Option<TokenMetadata> {
    extensions.iter().find_map(|record| match record {
        ExtensionRecord::TokenMetadata {
            update_authority,
            name,
            symbol,
            uri,
            ..
        } => Some(TokenMetadata {
            name: trim_padding(name.clone()),
            symbol: trim_padding(symbol.clone()),
            uri: trim_padding(uri.clone()),
            update_authority: *update_authority,
            source: MetadataSource::Token2022Extension,
        }),
        _ => None,
    })
}

fn trim_padding(value: String) -> String {
    value.trim_end_matches('\0').trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::token::extensions::fixtures::borsh_string;
    use crate::domain::known_programs::METAPLEX_METADATA_PROGRAM;

    fn padded(value: &str, width: usize) -> String {
        let mut s = value.to_string();
        while s.len() < width {
            s.push('\0');
        }
        s
    }

    fn metaplex_account(update_authority: Pubkey, mint: Pubkey) -> Vec<u8> {
        let mut data = vec![METADATA_V1_KEY];
        data.extend_from_slice(update_authority.as_ref());
        data.extend_from_slice(mint.as_ref());
        data.extend(borsh_string(&padded("Pump Token", 32)));
        data.extend(borsh_string(&padded("PUMP", 10)));
        data.extend(borsh_string(&padded("https://ipfs.io/x", 200)));
        // seller fee + creators etc. follow in real accounts
        data.extend_from_slice(&[0u8; 16]);
        data
    }

    #[test]
    fn test_pda_is_deterministic() {
        let mint = Pubkey::new_unique();
        let a = metaplex_metadata_address(&mint, &METAPLEX_METADATA_PROGRAM);
        let b = metaplex_metadata_address(&mint, &METAPLEX_METADATA_PROGRAM);
        assert_eq!(a, b);
        assert_ne!(a, metaplex_metadata_address(&Pubkey::new_unique(), &METAPLEX_METADATA_PROGRAM));
    }

    #[test]
    fn test_decode_metaplex_trims_padding() {
        let authority = Pubkey::new_unique();
        let data = metaplex_account(authority, Pubkey::new_unique());
        let metadata = decode_metaplex_metadata(&data).unwrap();

        assert_eq!(metadata.name, "Pump Token");
        assert_eq!(metadata.symbol, "PUMP");
        assert_eq!(metadata.uri, "https://ipfs.io/x");
        assert_eq!(metadata.update_authority, Some(authority));
        assert_eq!(metadata.source, MetadataSource::Metaplex);
    }

    #[test]
    fn test_decode_metaplex_rejects_truncated() {
        let data = metaplex_account(Pubkey::new_unique(), Pubkey::new_unique());
        assert!(decode_metaplex_metadata(&data[..70]).is_err());
    }

    #[test]
    fn test_decode_metaplex_rejects_wrong_key() {
        let mut data = metaplex_account(Pubkey::new_unique(), Pubkey::new_unique());
        data[0] = 1;
        assert!(decode_metaplex_metadata(&data).is_err());
    }

    #[test]
    fn test_metadata_from_extension() {
        let authority = Pubkey::new_unique();
        let records = vec![
            ExtensionRecord::NonTransferable,
            ExtensionRecord::TokenMetadata {
                update_authority: Some(authority),
                mint: Pubkey::new_unique(),
                name: "Ext".to_string(),
                symbol: "EXT".to_string(),
                uri: String::new(),
                additional_metadata: vec![],
            },
        ];
        let metadata = metadata_from_extensions(&records).unwrap();
        assert_eq!(metadata.update_authority, Some(authority));
        assert_eq!(metadata.source, MetadataSource::Token2022Extension);
        assert!(metadata_from_extensions(&[]).is_none());
    }
}
