//! Platform authenticity verification result

use serde::{Deserialize, Serialize};

/// Whether a launch-platform token has migrated to a general AMM
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GraduationStatus {
    NotGraduated,
    Graduated,
    /// Market data unavailable; never read as NotGraduated
    Unknown,
}

/// Outcome of checking a token against the launch platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformVerification {
    /// Metadata update authority equals the configured launch authority
    pub update_authority_match: bool,
    pub launch_program_interaction: bool,
    pub amm_program_interaction: bool,
    pub graduation: GraduationStatus,
    /// Signatures touching the launch program, most recent first
    pub launch_signatures: Vec<String>,
    /// Signatures touching the AMM program, most recent first
    pub amm_signatures: Vec<String>,
    /// Union of the two lists above, most recent first
    pub supporting_signatures: Vec<String>,
    /// Number of transactions inspected
    pub checked_signatures: usize,
}

impl PlatformVerification {
    /// Result for a token whose update authority does not match
    pub fn authority_mismatch() -> Self {
        Self {
            update_authority_match: false,
            launch_program_interaction: false,
            amm_program_interaction: false,
            graduation: GraduationStatus::Unknown,
            launch_signatures: Vec::new(),
            amm_signatures: Vec::new(),
            supporting_signatures: Vec::new(),
            checked_signatures: 0,
        }
    }

    /// Genuine platform token: authority matches and it touched the launch program
    pub fn is_authentic(&self) -> bool {
        self.update_authority_match && self.launch_program_interaction
    }
}
