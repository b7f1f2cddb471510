//! Token-2022 Extension Parsing
//!
//! Walks the TLV (Type-Length-Value) region of a Token-2022 mint. Each
//! record is a u16 LE tag, a u16 LE length and `length` bytes of payload,
//! packed with no alignment. A zero tag marks the start of unused space,
//! which must be zero-filled to the end of the account.

use std::collections::HashSet;

use tracing::{debug, trace};

use super::mint_layout::{check_extended_prefix, EXTENSIONS_START_OFFSET};
use super::reader::ByteReader;
use super::DecodeError;
use crate::domain::extension::{DefaultState, ExtensionRecord, ExtensionType, TransferFee};

/// TLV header size (tag + length)
const TLV_HEADER_SIZE: usize = 4;

/// Parse Token-2022 extensions from mint account data.
///
/// `fixed_len` is the base mint size; data of exactly that length has no
/// extensions. Otherwise the padded prefix is validated and every byte from
/// offset 166 onwards is accounted for by exactly one returned record.
pub fn decode_extensions(
    data: &[u8],
    fixed_len: usize,
) -> Result<Vec<ExtensionRecord>, DecodeError> {
    if data.len() < fixed_len {
        return Err(DecodeError::malformed(
            data,
            format!("data shorter than fixed prefix of {} bytes", fixed_len),
        ));
    }
    if data.len() == fixed_len {
        return Ok(Vec::new());
    }
    check_extended_prefix(data)?;

    let mut records = Vec::new();
    let mut seen = HashSet::new();
    let mut offset = EXTENSIONS_START_OFFSET;

    while offset < data.len() {
        let remaining = &data[offset..];

        if remaining.len() < TLV_HEADER_SIZE {
            if remaining.iter().all(|b| *b == 0) {
                records.push(ExtensionRecord::Uninitialized {
                    reserved_len: remaining.len(),
                });
                break;
            }
            return Err(DecodeError::malformed(
                data,
                format!("truncated extension header at offset {}", offset),
            ));
        }

        let tag = u16::from_le_bytes([remaining[0], remaining[1]]);
        let length = u16::from_le_bytes([remaining[2], remaining[3]]) as usize;

        if tag == 0 {
            if remaining.iter().all(|b| *b == 0) {
                trace!("{} bytes of uninitialized extension space", remaining.len());
                records.push(ExtensionRecord::Uninitialized {
                    reserved_len: remaining.len(),
                });
                break;
            }
            return Err(DecodeError::malformed(
                data,
                format!("non-zero bytes in uninitialized extension space at offset {}", offset),
            ));
        }

        let end = offset + TLV_HEADER_SIZE + length;
        if end > data.len() {
            return Err(DecodeError::malformed(
                data,
                format!(
                    "extension tag {} at offset {} declares {} bytes but only {} remain",
                    tag,
                    offset,
                    length,
                    remaining.len() - TLV_HEADER_SIZE
                ),
            ));
        }

        if !seen.insert(tag) {
            return Err(DecodeError::malformed(
                data,
                format!("duplicate extension tag {}", tag),
            ));
        }

        let payload = &data[offset + TLV_HEADER_SIZE..end];
        let kind = ExtensionType::from(tag);
        let record = decode_record(kind, payload).map_err(|reason| {
            DecodeError::malformed(data, format!("{} extension: {}", kind.name(), reason))
        })?;
        debug!("Parsed extension: {}", record.describe());
        records.push(record);

        offset = end;
    }

    Ok(records)
}

fn expect_len(payload: &[u8], expected: usize) -> Result<(), String> {
    if payload.len() != expected {
        return Err(format!(
            "expected {} byte payload, found {}",
            expected,
            payload.len()
        ));
    }
    Ok(())
}

fn transfer_fee(reader: &mut ByteReader<'_>) -> Result<TransferFee, String> {
    Ok(TransferFee {
        epoch: reader.u64()?,
        maximum_fee: reader.u64()?,
        basis_points: reader.u16()?,
    })
}

fn decode_record(kind: ExtensionType, payload: &[u8]) -> Result<ExtensionRecord, String> {
    let mut reader = ByteReader::new(payload);
    let r = &mut reader;

    let record = match kind {
        ExtensionType::TransferFeeConfig => {
            expect_len(payload, 108)?;
            ExtensionRecord::TransferFeeConfig {
                config_authority: r.optional_pubkey()?,
                withdraw_withheld_authority: r.optional_pubkey()?,
                withheld_amount: r.u64()?,
                older_transfer_fee: transfer_fee(r)?,
                newer_transfer_fee: transfer_fee(r)?,
            }
        }
        ExtensionType::MintCloseAuthority => {
            expect_len(payload, 32)?;
            ExtensionRecord::MintCloseAuthority {
                authority: r.optional_pubkey()?,
            }
        }
        ExtensionType::ConfidentialTransferMint => {
            expect_len(payload, 65)?;
            let authority = r.optional_pubkey()?;
            let auto_approve_new_accounts = r.bool()?;
            let auditor = r.take(32)?;
            ExtensionRecord::ConfidentialTransferMint {
                authority,
                auto_approve_new_accounts,
                has_auditor: auditor.iter().any(|b| *b != 0),
            }
        }
        ExtensionType::DefaultAccountState => {
            expect_len(payload, 1)?;
            let state = match r.u8()? {
                0 => DefaultState::Uninitialized,
                1 => DefaultState::Initialized,
                2 => DefaultState::Frozen,
                other => return Err(format!("invalid account state {}", other)),
            };
            ExtensionRecord::DefaultAccountState { state }
        }
        ExtensionType::NonTransferable => {
            expect_len(payload, 0)?;
            ExtensionRecord::NonTransferable
        }
        ExtensionType::InterestBearingConfig => {
            // authority, init timestamp, pre-update average rate,
            // last update timestamp, current rate
            expect_len(payload, 52)?;
            let rate_authority = r.optional_pubkey()?;
            r.take(8 + 2 + 8)?;
            ExtensionRecord::InterestBearingConfig {
                rate_authority,
                current_rate_bps: r.i16()?,
            }
        }
        ExtensionType::PermanentDelegate => {
            expect_len(payload, 32)?;
            ExtensionRecord::PermanentDelegate {
                delegate: r.optional_pubkey()?,
            }
        }
        ExtensionType::TransferHook => {
            expect_len(payload, 64)?;
            ExtensionRecord::TransferHook {
                authority: r.optional_pubkey()?,
                program_id: r.optional_pubkey()?,
            }
        }
        ExtensionType::MetadataPointer => {
            expect_len(payload, 64)?;
            ExtensionRecord::MetadataPointer {
                authority: r.optional_pubkey()?,
                metadata_address: r.optional_pubkey()?,
            }
        }
        ExtensionType::GroupPointer => {
            expect_len(payload, 64)?;
            ExtensionRecord::GroupPointer {
                authority: r.optional_pubkey()?,
                group_address: r.optional_pubkey()?,
            }
        }
        ExtensionType::GroupMemberPointer => {
            expect_len(payload, 64)?;
            ExtensionRecord::GroupMemberPointer {
                authority: r.optional_pubkey()?,
                member_address: r.optional_pubkey()?,
            }
        }
        ExtensionType::Pausable => {
            expect_len(payload, 33)?;
            ExtensionRecord::Pausable {
                authority: r.optional_pubkey()?,
                paused: r.bool()?,
            }
        }
        ExtensionType::TokenMetadata => {
            let update_authority = r.optional_pubkey()?;
            let mint = r.pubkey()?;
            let name = r.string()?;
            let symbol = r.string()?;
            let uri = r.string()?;
            let count = r.u32()? as usize;
            let mut additional_metadata = Vec::new();
            for _ in 0..count {
                let key = r.string()?;
                let value = r.string()?;
                additional_metadata.push((key, value));
            }
            if r.remaining() != 0 {
                return Err(format!("{} trailing bytes after metadata", r.remaining()));
            }
            ExtensionRecord::TokenMetadata {
                update_authority,
                mint,
                name,
                symbol,
                uri,
                additional_metadata,
            }
        }
        ExtensionType::Unknown(tag) => ExtensionRecord::Unrecognized {
            tag,
            payload: payload.to_vec(),
        },
        other => ExtensionRecord::Other {
            kind: other,
            payload: payload.to_vec(),
        },
    };

    Ok(record)
}
