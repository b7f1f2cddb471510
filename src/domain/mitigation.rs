//! Mitigation statements
//!
//! Externally supplied documentation accepting a triggered finding. Matched
//! to findings by criterion name. A mitigation only changes how a finding is
//! presented; it never changes whether the finding triggered.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;

/// Security criteria evaluated by the reviewer, in report order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Criterion {
    FreezeAuthority,
    PermanentDelegate,
    TransferHook,
    ConfidentialTransfers,
    #[serde(alias = "transaction_fees")]
    TransferFees,
}

impl Criterion {
    /// Rules applied to extension-bearing mints, in evaluation order
    pub const ALL: [Criterion; 5] = [
        Criterion::FreezeAuthority,
        Criterion::PermanentDelegate,
        Criterion::TransferHook,
        Criterion::ConfidentialTransfers,
        Criterion::TransferFees,
    ];

    /// Stable name used in mitigation input and exports
    pub fn as_str(&self) -> &'static str {
        match self {
            Criterion::FreezeAuthority => "freeze_authority",
            Criterion::PermanentDelegate => "permanent_delegate",
            Criterion::TransferHook => "transfer_hook",
            Criterion::ConfidentialTransfers => "confidential_transfers",
            Criterion::TransferFees => "transfer_fees",
        }
    }
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Criterion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "freeze_authority" => Ok(Criterion::FreezeAuthority),
            "permanent_delegate" => Ok(Criterion::PermanentDelegate),
            "transfer_hook" => Ok(Criterion::TransferHook),
            "confidential_transfers" => Ok(Criterion::ConfidentialTransfers),
            "transfer_fees" | "transaction_fees" => Ok(Criterion::TransferFees),
            other => Err(format!("unknown criterion: {}", other)),
        }
    }
}

/// Documentation accepting one criterion for one mint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MitigationEntry {
    pub documentation: String,
    pub applied: bool,
    /// Supporting references (audits, multisig policies, ...)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<String>,
}

/// Mitigations for a single mint, keyed by criterion
pub type MitigationSet = HashMap<Criterion, MitigationEntry>;

/// Mitigations for every mint in a run
#[derive(Debug, Clone, Default)]
pub struct MitigationBook {
    entries: HashMap<Pubkey, MitigationSet>,
}

impl MitigationBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, mint: Pubkey, criterion: Criterion, entry: MitigationEntry) {
        self.entries.entry(mint).or_default().insert(criterion, entry);
    }

    /// Mitigations recorded for a mint
    pub fn for_mint(&self, mint: &Pubkey) -> Option<&MitigationSet> {
        self.entries.get(mint)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
