//! Token-2022 Extension Model
//!
//! Typed view of the TLV records that follow a Token-2022 mint. Every tag in
//! the account ends up in exactly one record: security-relevant and metadata
//! extensions get a typed variant, other known types keep their raw payload
//! in [`ExtensionRecord::Other`], unknown tags land in
//! [`ExtensionRecord::Unrecognized`], and zero-filled free space at the end
//! of the region is reported as [`ExtensionRecord::Uninitialized`].

use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;

use super::serde_helpers;

/// Token-2022 extension types
///
/// Tags as assigned by the SPL Token-2022 program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExtensionType {
    Uninitialized,
    TransferFeeConfig,
    TransferFeeAmount,
    MintCloseAuthority,
    ConfidentialTransferMint,
    ConfidentialTransferAccount,
    /// Default account state (e.g., frozen by default)
    DefaultAccountState,
    ImmutableOwner,
    MemoTransfer,
    /// Non-transferable (soulbound)
    NonTransferable,
    InterestBearingConfig,
    CpiGuard,
    PermanentDelegate,
    NonTransferableAccount,
    TransferHook,
    TransferHookAccount,
    ConfidentialTransferFeeConfig,
    ConfidentialTransferFeeAmount,
    MetadataPointer,
    TokenMetadata,
    GroupPointer,
    TokenGroup,
    GroupMemberPointer,
    TokenGroupMember,
    ConfidentialMintBurn,
    ScaledUiAmountConfig,
    Pausable,
    PausableAccount,
    /// Tag not known to this decoder
    Unknown(u16),
}

impl From<u16> for ExtensionType {
    fn from(value: u16) -> Self {
        match value {
            0 => ExtensionType::Uninitialized,
            1 => ExtensionType::TransferFeeConfig,
            2 => ExtensionType::TransferFeeAmount,
            3 => ExtensionType::MintCloseAuthority,
            4 => ExtensionType::ConfidentialTransferMint,
            5 => ExtensionType::ConfidentialTransferAccount,
            6 => ExtensionType::DefaultAccountState,
            7 => ExtensionType::ImmutableOwner,
            8 => ExtensionType::MemoTransfer,
            9 => ExtensionType::NonTransferable,
            10 => ExtensionType::InterestBearingConfig,
            11 => ExtensionType::CpiGuard,
            12 => ExtensionType::PermanentDelegate,
            13 => ExtensionType::NonTransferableAccount,
            14 => ExtensionType::TransferHook,
            15 => ExtensionType::TransferHookAccount,
            16 => ExtensionType::ConfidentialTransferFeeConfig,
            17 => ExtensionType::ConfidentialTransferFeeAmount,
            18 => ExtensionType::MetadataPointer,
            19 => ExtensionType::TokenMetadata,
            20 => ExtensionType::GroupPointer,
            21 => ExtensionType::TokenGroup,
            22 => ExtensionType::GroupMemberPointer,
            23 => ExtensionType::TokenGroupMember,
            24 => ExtensionType::ConfidentialMintBurn,
            25 => ExtensionType::ScaledUiAmountConfig,
            26 => ExtensionType::Pausable,
            27 => ExtensionType::PausableAccount,
            other => ExtensionType::Unknown(other),
        }
    }
}

impl ExtensionType {
    /// On-chain tag value
    pub fn tag(&self) -> u16 {
        match self {
            ExtensionType::Uninitialized => 0,
            ExtensionType::TransferFeeConfig => 1,
            ExtensionType::TransferFeeAmount => 2,
            ExtensionType::MintCloseAuthority => 3,
            ExtensionType::ConfidentialTransferMint => 4,
            ExtensionType::ConfidentialTransferAccount => 5,
            ExtensionType::DefaultAccountState => 6,
            ExtensionType::ImmutableOwner => 7,
            ExtensionType::MemoTransfer => 8,
            ExtensionType::NonTransferable => 9,
            ExtensionType::InterestBearingConfig => 10,
            ExtensionType::CpiGuard => 11,
            ExtensionType::PermanentDelegate => 12,
            ExtensionType::NonTransferableAccount => 13,
            ExtensionType::TransferHook => 14,
            ExtensionType::TransferHookAccount => 15,
            ExtensionType::ConfidentialTransferFeeConfig => 16,
            ExtensionType::ConfidentialTransferFeeAmount => 17,
            ExtensionType::MetadataPointer => 18,
            ExtensionType::TokenMetadata => 19,
            ExtensionType::GroupPointer => 20,
            ExtensionType::TokenGroup => 21,
            ExtensionType::GroupMemberPointer => 22,
            ExtensionType::TokenGroupMember => 23,
            ExtensionType::ConfidentialMintBurn => 24,
            ExtensionType::ScaledUiAmountConfig => 25,
            ExtensionType::Pausable => 26,
            ExtensionType::PausableAccount => 27,
            ExtensionType::Unknown(tag) => *tag,
        }
    }

    /// Get human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            ExtensionType::Uninitialized => "Uninitialized",
            ExtensionType::TransferFeeConfig => "TransferFeeConfig",
            ExtensionType::TransferFeeAmount => "TransferFeeAmount",
            ExtensionType::MintCloseAuthority => "MintCloseAuthority",
            ExtensionType::ConfidentialTransferMint => "ConfidentialTransferMint",
            ExtensionType::ConfidentialTransferAccount => "ConfidentialTransferAccount",
            ExtensionType::DefaultAccountState => "DefaultAccountState",
            ExtensionType::ImmutableOwner => "ImmutableOwner",
            ExtensionType::MemoTransfer => "MemoTransfer",
            ExtensionType::NonTransferable => "NonTransferable",
            ExtensionType::InterestBearingConfig => "InterestBearingConfig",
            ExtensionType::CpiGuard => "CpiGuard",
            ExtensionType::PermanentDelegate => "PermanentDelegate",
            ExtensionType::NonTransferableAccount => "NonTransferableAccount",
            ExtensionType::TransferHook => "TransferHook",
            ExtensionType::TransferHookAccount => "TransferHookAccount",
            ExtensionType::ConfidentialTransferFeeConfig => "ConfidentialTransferFeeConfig",
            ExtensionType::ConfidentialTransferFeeAmount => "ConfidentialTransferFeeAmount",
            ExtensionType::MetadataPointer => "MetadataPointer",
            ExtensionType::TokenMetadata => "TokenMetadata",
            ExtensionType::GroupPointer => "GroupPointer",
            ExtensionType::TokenGroup => "TokenGroup",
            ExtensionType::GroupMemberPointer => "GroupMemberPointer",
            ExtensionType::TokenGroupMember => "TokenGroupMember",
            ExtensionType::ConfidentialMintBurn => "ConfidentialMintBurn",
            ExtensionType::ScaledUiAmountConfig => "ScaledUiAmountConfig",
            ExtensionType::Pausable => "Pausable",
            ExtensionType::PausableAccount => "PausableAccount",
            ExtensionType::Unknown(_) => "Unknown",
        }
    }
}

/// One epoch's transfer fee parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferFee {
    pub epoch: u64,
    pub maximum_fee: u64,
    pub basis_points: u16,
}

/// Account state new holder accounts start in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefaultState {
    Uninitialized,
    Initialized,
    Frozen,
}

/// Decoded extension record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "extension", rename_all = "snake_case")]
pub enum ExtensionRecord {
    TransferFeeConfig {
        #[serde(with = "serde_helpers::option_pubkey")]
        config_authority: Option<Pubkey>,
        #[serde(with = "serde_helpers::option_pubkey")]
        withdraw_withheld_authority: Option<Pubkey>,
        withheld_amount: u64,
        older_transfer_fee: TransferFee,
        newer_transfer_fee: TransferFee,
    },
    MintCloseAuthority {
        #[serde(with = "serde_helpers::option_pubkey")]
        authority: Option<Pubkey>,
    },
    ConfidentialTransferMint {
        #[serde(with = "serde_helpers::option_pubkey")]
        authority: Option<Pubkey>,
        auto_approve_new_accounts: bool,
        has_auditor: bool,
    },
    DefaultAccountState {
        state: DefaultState,
    },
    NonTransferable,
    InterestBearingConfig {
        #[serde(with = "serde_helpers::option_pubkey")]
        rate_authority: Option<Pubkey>,
        current_rate_bps: i16,
    },
    PermanentDelegate {
        #[serde(with = "serde_helpers::option_pubkey")]
        delegate: Option<Pubkey>,
    },
    TransferHook {
        #[serde(with = "serde_helpers::option_pubkey")]
        authority: Option<Pubkey>,
        #[serde(with = "serde_helpers::option_pubkey")]
        program_id: Option<Pubkey>,
    },
    MetadataPointer {
        #[serde(with = "serde_helpers::option_pubkey")]
        authority: Option<Pubkey>,
        #[serde(with = "serde_helpers::option_pubkey")]
        metadata_address: Option<Pubkey>,
    },
    TokenMetadata {
        #[serde(with = "serde_helpers::option_pubkey")]
        update_authority: Option<Pubkey>,
        #[serde(with = "serde_helpers::pubkey")]
        mint: Pubkey,
        name: String,
        symbol: String,
        uri: String,
        additional_metadata: Vec<(String, String)>,
    },
    GroupPointer {
        #[serde(with = "serde_helpers::option_pubkey")]
        authority: Option<Pubkey>,
        #[serde(with = "serde_helpers::option_pubkey")]
        group_address: Option<Pubkey>,
    },
    GroupMemberPointer {
        #[serde(with = "serde_helpers::option_pubkey")]
        authority: Option<Pubkey>,
        #[serde(with = "serde_helpers::option_pubkey")]
        member_address: Option<Pubkey>,
    },
    Pausable {
        #[serde(with = "serde_helpers::option_pubkey")]
        authority: Option<Pubkey>,
        paused: bool,
    },
    /// Known Token-2022 type kept as raw payload
    Other {
        kind: ExtensionType,
        #[serde(with = "serde_helpers::base64_bytes")]
        payload: Vec<u8>,
    },
    /// Tag this decoder does not know
    Unrecognized {
        tag: u16,
        #[serde(with = "serde_helpers::base64_bytes")]
        payload: Vec<u8>,
    },
    /// Zero-filled space reserved after the last record
    Uninitialized { reserved_len: usize },
}

impl ExtensionRecord {
    /// Extension type of this record
    pub fn extension_type(&self) -> ExtensionType {
        match self {
            ExtensionRecord::TransferFeeConfig { .. } => ExtensionType::TransferFeeConfig,
            ExtensionRecord::MintCloseAuthority { .. } => ExtensionType::MintCloseAuthority,
            ExtensionRecord::ConfidentialTransferMint { .. } => {
                ExtensionType::ConfidentialTransferMint
            }
            ExtensionRecord::DefaultAccountState { .. } => ExtensionType::DefaultAccountState,
            ExtensionRecord::NonTransferable => ExtensionType::NonTransferable,
            ExtensionRecord::InterestBearingConfig { .. } => ExtensionType::InterestBearingConfig,
            ExtensionRecord::PermanentDelegate { .. } => ExtensionType::PermanentDelegate,
            ExtensionRecord::TransferHook { .. } => ExtensionType::TransferHook,
            ExtensionRecord::MetadataPointer { .. } => ExtensionType::MetadataPointer,
            ExtensionRecord::TokenMetadata { .. } => ExtensionType::TokenMetadata,
            ExtensionRecord::GroupPointer { .. } => ExtensionType::GroupPointer,
            ExtensionRecord::GroupMemberPointer { .. } => ExtensionType::GroupMemberPointer,
            ExtensionRecord::Pausable { .. } => ExtensionType::Pausable,
            ExtensionRecord::Other { kind, .. } => *kind,
            ExtensionRecord::Unrecognized { tag, .. } => ExtensionType::Unknown(*tag),
            ExtensionRecord::Uninitialized { .. } => ExtensionType::Uninitialized,
        }
    }

    /// Bytes this record occupied in the account, header included.
    ///
    /// Summed over a decoded mint this equals the length of the TLV region.
    pub fn encoded_len(&self) -> usize {
        const HEADER: usize = 4;
        match self {
            ExtensionRecord::TransferFeeConfig { .. } => HEADER + 108,
            ExtensionRecord::MintCloseAuthority { .. } => HEADER + 32,
            ExtensionRecord::ConfidentialTransferMint { .. } => HEADER + 65,
            ExtensionRecord::DefaultAccountState { .. } => HEADER + 1,
            ExtensionRecord::NonTransferable => HEADER,
            ExtensionRecord::InterestBearingConfig { .. } => HEADER + 52,
            ExtensionRecord::PermanentDelegate { .. } => HEADER + 32,
            ExtensionRecord::TransferHook { .. }
            | ExtensionRecord::MetadataPointer { .. }
            | ExtensionRecord::GroupPointer { .. }
            | ExtensionRecord::GroupMemberPointer { .. } => HEADER + 64,
            ExtensionRecord::Pausable { .. } => HEADER + 33,
            ExtensionRecord::TokenMetadata {
                name,
                symbol,
                uri,
                additional_metadata,
                ..
            } => {
                let strings = [name, symbol, uri].iter().map(|s| 4 + s.len()).sum::<usize>();
                let pairs = additional_metadata
                    .iter()
                    .map(|(k, v)| 8 + k.len() + v.len())
                    .sum::<usize>();
                HEADER + 64 + strings + 4 + pairs
            }
            ExtensionRecord::Other { payload, .. }
            | ExtensionRecord::Unrecognized { payload, .. } => HEADER + payload.len(),
            ExtensionRecord::Uninitialized { reserved_len } => *reserved_len,
        }
    }

    /// Whether the security rules have no opinion on this record and a human
    /// should look at it.
    pub fn is_unreviewed(&self) -> bool {
        matches!(
            self,
            ExtensionRecord::Other { .. } | ExtensionRecord::Unrecognized { .. }
        )
    }

    /// Short description for logs and reports
    pub fn describe(&self) -> String {
        match self {
            ExtensionRecord::TransferFeeConfig { newer_transfer_fee, .. } => format!(
                "TransferFeeConfig (fee: {}bps, max {})",
                newer_transfer_fee.basis_points, newer_transfer_fee.maximum_fee
            ),
            ExtensionRecord::PermanentDelegate { delegate: Some(d) } => {
                format!("PermanentDelegate (delegate: {})", d)
            }
            ExtensionRecord::TransferHook { program_id: Some(p), .. } => {
                format!("TransferHook (program: {})", p)
            }
            ExtensionRecord::Unrecognized { tag, payload } => {
                format!("Unrecognized extension tag {} ({} bytes)", tag, payload.len())
            }
            ExtensionRecord::Other { kind, payload } => {
                format!("{} ({} bytes, not interpreted)", kind.name(), payload.len())
            }
            ExtensionRecord::Uninitialized { reserved_len } => {
                format!("Uninitialized space ({} bytes)", reserved_len)
            }
            other => other.extension_type().name().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_type_from_u16() {
        assert_eq!(ExtensionType::from(1), ExtensionType::TransferFeeConfig);
        assert_eq!(ExtensionType::from(12), ExtensionType::PermanentDelegate);
        assert_eq!(ExtensionType::from(14), ExtensionType::TransferHook);
        assert_eq!(ExtensionType::from(9999), ExtensionType::Unknown(9999));
    }

    #[test]
    fn test_tag_inverts_from_u16() {
        for tag in 0..40u16 {
            assert_eq!(ExtensionType::from(tag).tag(), tag);
        }
    }

    #[test]
    fn test_extension_names() {
        assert_eq!(ExtensionType::TransferHook.name(), "TransferHook");
        assert_eq!(ExtensionType::PermanentDelegate.name(), "PermanentDelegate");
        assert_eq!(ExtensionType::Unknown(999).name(), "Unknown");
    }

    #[test]
    fn test_unreviewed_records() {
        let unknown = ExtensionRecord::Unrecognized { tag: 400, payload: vec![1, 2] };
        let other = ExtensionRecord::Other { kind: ExtensionType::CpiGuard, payload: vec![] };
        let hook = ExtensionRecord::TransferHook { authority: None, program_id: None };

        assert!(unknown.is_unreviewed());
        assert!(other.is_unreviewed());
        assert!(!hook.is_unreviewed());
        assert_eq!(unknown.encoded_len(), 6);
        assert_eq!(unknown.extension_type(), ExtensionType::Unknown(400));
    }

    #[test]
    fn test_token_metadata_encoded_len() {
        let record = ExtensionRecord::TokenMetadata {
            update_authority: None,
            mint: Pubkey::new_unique(),
            name: "Dog".to_string(),
            symbol: "DOG".to_string(),
            uri: String::new(),
            additional_metadata: vec![("k".to_string(), "vv".to_string())],
        };
        // header + 2 keys + (4+3) + (4+3) + (4+0) + count + (4+1+4+2)
        assert_eq!(record.encoded_len(), 4 + 64 + 7 + 7 + 4 + 4 + 11);
    }

    #[test]
    fn test_record_serializes_with_tag() {
        let record = ExtensionRecord::DefaultAccountState { state: DefaultState::Frozen };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["extension"], "default_account_state");
        assert_eq!(json["state"], "frozen");
    }
}
