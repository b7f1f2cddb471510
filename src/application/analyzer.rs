//! Token Analyzer
//!
//! Per-address pipeline: fetch the mint, decode it, look up metadata,
//! review it against the security criteria, optionally verify platform
//! provenance, and hand back an [`AnalysisResult`].

use std::sync::Arc;

use solana_sdk::pubkey::Pubkey;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::adapters::token::{
    decode_extensions, decode_metaplex_metadata, decode_mint, metadata_from_extensions,
    metaplex_metadata_address, DecodeError, MINT_BASE_SIZE,
};
use crate::domain::analysis::AnalysisResult;
use crate::domain::extension::ExtensionRecord;
use crate::domain::known_programs::{owner_label, METAPLEX_METADATA_PROGRAM};
use crate::domain::metadata::TokenMetadata;
use crate::domain::mint::TokenProgram;
use crate::domain::mitigation::MitigationBook;
use crate::domain::security_review::SecurityReviewer;
use crate::ports::ledger::{LedgerRpc, RpcError};

use super::platform_verifier::PlatformVerifier;

/// Why one address could not be analyzed
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    #[error("Account {0} not found")]
    NotFound(Pubkey),

    #[error("Account {address} is not a token mint (owner: {owner})")]
    NotATokenMint { address: Pubkey, owner: Pubkey },

    #[error("Malformed mint account {address} ({len} bytes): {reason}")]
    MalformedAccount {
        address: Pubkey,
        len: usize,
        reason: String,
    },

    #[error("RPC error: {0}")]
    Rpc(#[from] RpcError),

    #[error("Analysis cancelled")]
    Cancelled,

    #[error("Analysis task failed: {0}")]
    TaskFailed(String),
}

impl AnalysisError {
    /// Stable identifier used in exports
    pub fn kind(&self) -> &'static str {
        match self {
            AnalysisError::NotFound(_) => "not_found",
            AnalysisError::NotATokenMint { .. } => "not_a_token_mint",
            AnalysisError::MalformedAccount { .. } => "malformed_account",
            AnalysisError::Rpc(_) => "rpc",
            AnalysisError::Cancelled => "cancelled",
            AnalysisError::TaskFailed(_) => "task_failed",
        }
    }

    fn from_decode(address: Pubkey, error: DecodeError) -> Self {
        match error {
            DecodeError::UnsupportedProgram { owner } => {
                AnalysisError::NotATokenMint { address, owner }
            }
            DecodeError::MalformedAccount { reason, len } => AnalysisError::MalformedAccount {
                address,
                len,
                reason,
            },
        }
    }
}

/// Runs the full analysis for one address
pub struct TokenAnalyzer {
    ledger: Arc<dyn LedgerRpc>,
    reviewer: SecurityReviewer,
    mitigations: Arc<MitigationBook>,
    verifier: Option<PlatformVerifier>,
    metadata_program: Pubkey,
}

impl TokenAnalyzer {
    pub fn new(ledger: Arc<dyn LedgerRpc>, mitigations: Arc<MitigationBook>) -> Self {
        Self {
            ledger,
            reviewer: SecurityReviewer::new(),
            mitigations,
            verifier: None,
            metadata_program: METAPLEX_METADATA_PROGRAM,
        }
    }

    /// Enable platform-authenticity verification
    pub fn with_verifier(mut self, verifier: PlatformVerifier) -> Self {
        self.verifier = Some(verifier);
        self
    }

    /// Override the Metaplex metadata program id
    pub fn with_metadata_program(mut self, program: Pubkey) -> Self {
        self.metadata_program = program;
        self
    }

    pub fn verifies_platform(&self) -> bool {
        self.verifier.is_some()
    }

    pub async fn analyze(&self, address: &Pubkey) -> Result<AnalysisResult, AnalysisError> {
        let account = match self.ledger.fetch_account(address).await? {
            Some(account) => account,
            None => {
                info!("Account {} not found", address);
                return Err(AnalysisError::NotFound(*address));
            }
        };

        let mint = decode_mint(&account.owner, &account.data).map_err(|e| {
            if let DecodeError::UnsupportedProgram { owner } = &e {
                info!("Account {} is owned by {}", address, owner_label(owner));
            }
            AnalysisError::from_decode(*address, e)
        })?;

        let extensions = match mint.program {
            TokenProgram::Token2022 => decode_extensions(&account.data, MINT_BASE_SIZE)
                .map_err(|e| AnalysisError::from_decode(*address, e))?,
            TokenProgram::Spl => Vec::new(),
        };
        debug!(
            "Decoded {} mint {} with {} extension records",
            mint.program.name(),
            address,
            extensions.len()
        );

        let metadata = self.lookup_metadata(address, &extensions).await?;

        let review = self
            .reviewer
            .review(&mint, &extensions, self.mitigations.for_mint(address));

        let platform = match &self.verifier {
            Some(verifier) => {
                let update_authority = metadata.as_ref().and_then(|m| m.update_authority);
                Some(
                    verifier
                        .verify(address, &mint, update_authority.as_ref())
                        .await?,
                )
            }
            None => None,
        };

        let result = AnalysisResult::new(*address, mint, extensions, metadata, review, platform);
        info!("{}", result.summary());
        Ok(result)
    }

    /// Metaplex account first, Token-2022 metadata extension as fallback.
    /// An undecodable metadata account is logged and skipped.
    async fn lookup_metadata(
        &self,
        address: &Pubkey,
        extensions: &[ExtensionRecord],
    ) -> Result<Option<TokenMetadata>, AnalysisError> {
        let pda = metaplex_metadata_address(address, &self.metadata_program);
        if let Some(account) = self.ledger.fetch_account(&pda).await? {
            if account.owner != self.metadata_program {
                warn!(
                    "Metadata account {} owned by {}, ignoring",
                    pda,
                    owner_label(&account.owner)
                );
            } else {
                match decode_metaplex_metadata(&account.data) {
                    Ok(metadata) => return Ok(Some(metadata)),
                    Err(e) => warn!("Failed to decode metadata for {}: {}", address, e),
                }
            }
        }

        let fallback = metadata_from_extensions(extensions);
        if fallback.is_none() {
            debug!("No metadata found for {}", address);
        }
        Ok(fallback)
    }
}
