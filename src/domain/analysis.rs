//! Analysis Result
//!
//! Aggregate handed to reporting collaborators: one per address per run,
//! built once and never mutated. Field names are the export contract.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;

use super::extension::ExtensionRecord;
use super::metadata::TokenMetadata;
use super::mint::MintInfo;
use super::platform::PlatformVerification;
use super::security_review::{SecurityFinding, SecurityReview, UnreviewedExtension, Verdict};
use super::serde_helpers;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(with = "serde_helpers::pubkey")]
    pub address: Pubkey,
    pub mint: MintInfo,
    pub extensions: Vec<ExtensionRecord>,
    pub metadata: Option<TokenMetadata>,
    pub findings: Vec<SecurityFinding>,
    pub raw_verdict: Verdict,
    pub mitigated_verdict: Verdict,
    pub unreviewed_extensions: Vec<UnreviewedExtension>,
    pub platform: Option<PlatformVerification>,
    pub analyzed_at: DateTime<Utc>,
}

impl AnalysisResult {
    pub fn new(
        address: Pubkey,
        mint: MintInfo,
        extensions: Vec<ExtensionRecord>,
        metadata: Option<TokenMetadata>,
        review: SecurityReview,
        platform: Option<PlatformVerification>,
    ) -> Self {
        Self {
            address,
            mint,
            extensions,
            metadata,
            findings: review.findings,
            raw_verdict: review.raw_verdict,
            mitigated_verdict: review.mitigated_verdict,
            unreviewed_extensions: review.unreviewed_extensions,
            platform,
            analyzed_at: Utc::now(),
        }
    }

    /// One-line summary for logs and the CLI
    pub fn summary(&self) -> String {
        let label = self
            .metadata
            .as_ref()
            .map(|m| m.label())
            .unwrap_or_else(|| "Unknown".to_string());
        let triggered: Vec<&str> = self
            .findings
            .iter()
            .filter(|f| f.triggered)
            .map(|f| f.criterion.as_str())
            .collect();

        format!(
            "{} [{}] {}: raw={:?} mitigated={:?}{}",
            self.address,
            self.mint.program.name(),
            label,
            self.raw_verdict,
            self.mitigated_verdict,
            if triggered.is_empty() {
                String::new()
            } else {
                format!(" triggered={}", triggered.join(","))
            }
        )
    }
}
