//! Platform-Authenticity Verifier
//!
//! Checks whether a token really came from the launch platform:
//! (a) metadata update authority must equal the platform's authority,
//! (b) recent transactions are scanned for the launch and AMM programs,
//! (c) market data decides graduation. Step (c) is advisory and degrades to
//! `Unknown` on any failure.

use std::sync::Arc;

use solana_sdk::pubkey::Pubkey;
use tracing::{debug, info, warn};

use crate::domain::known_programs::{
    PUMP_FUN_PROGRAM, PUMP_FUN_UPDATE_AUTHORITY, RAYDIUM_MIGRATION_AMM,
};
use crate::domain::mint::MintInfo;
use crate::domain::platform::{GraduationStatus, PlatformVerification};
use crate::ports::ledger::{LedgerRpc, RpcError};
use crate::ports::market_data::{MarketDataPort, PoolStatus};

/// Launch platform addresses
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformConfig {
    /// Update authority stamped on every platform token
    pub launch_authority: Pubkey,
    /// Platform bonding-curve program
    pub launch_program: Pubkey,
    /// AMM program/account tokens touch on graduation
    pub amm_program: Pubkey,
    /// Signature history page size
    pub signature_limit: usize,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            launch_authority: PUMP_FUN_UPDATE_AUTHORITY,
            launch_program: PUMP_FUN_PROGRAM,
            amm_program: RAYDIUM_MIGRATION_AMM,
            signature_limit: 10,
        }
    }
}

/// Verifies launch-platform provenance
pub struct PlatformVerifier {
    ledger: Arc<dyn LedgerRpc>,
    market_data: Arc<dyn MarketDataPort>,
    config: PlatformConfig,
}

impl PlatformVerifier {
    pub fn new(
        ledger: Arc<dyn LedgerRpc>,
        market_data: Arc<dyn MarketDataPort>,
        config: PlatformConfig,
    ) -> Self {
        Self {
            ledger,
            market_data,
            config,
        }
    }

    pub fn config(&self) -> &PlatformConfig {
        &self.config
    }

    /// Run the three checks for `address`.
    ///
    /// A mismatching (or missing) update authority returns immediately with
    /// no network calls. Ledger errors in the history scan propagate; market
    /// data errors never do.
    pub async fn verify(
        &self,
        address: &Pubkey,
        mint: &MintInfo,
        update_authority: Option<&Pubkey>,
    ) -> Result<PlatformVerification, RpcError> {
        // (a) exact match against the configured authority
        if update_authority != Some(&self.config.launch_authority) {
            info!(
                "Token {} failed update authority check (authority: {:?})",
                address, update_authority
            );
            return Ok(PlatformVerification::authority_mismatch());
        }
        debug!(
            "Token {} ({}) carries the launch authority, scanning history",
            address,
            mint.program.name()
        );

        // (b) transaction history
        let signatures = self
            .ledger
            .fetch_signatures_for_address(address, self.config.signature_limit)
            .await?;

        let mut launch_signatures = Vec::new();
        let mut amm_signatures = Vec::new();
        let mut supporting_signatures = Vec::new();
        let mut checked_signatures = 0;

        for entry in &signatures {
            let Some(transaction) = self.ledger.fetch_transaction(&entry.signature).await? else {
                debug!("Transaction {} not available, skipping", entry.signature);
                continue;
            };
            checked_signatures += 1;

            let touches_launch = transaction.touches(&self.config.launch_program);
            let touches_amm = transaction.touches(&self.config.amm_program);
            if touches_launch {
                info!("Found launch program interaction in tx {}", entry.signature);
                launch_signatures.push(entry.signature.clone());
            }
            if touches_amm {
                info!("Found AMM interaction in tx {}", entry.signature);
                amm_signatures.push(entry.signature.clone());
            }
            if touches_launch || touches_amm {
                supporting_signatures.push(entry.signature.clone());
            }
        }

        // (c) graduation from market data
        let graduation = match self.market_data.pool_status(address).await {
            Ok(PoolStatus::Listed) => GraduationStatus::Graduated,
            Ok(PoolStatus::NotListed) => GraduationStatus::NotGraduated,
            Err(e) => {
                warn!("Market data unavailable for {}: {}; graduation unknown", address, e);
                GraduationStatus::Unknown
            }
        };

        Ok(PlatformVerification {
            update_authority_match: true,
            launch_program_interaction: !launch_signatures.is_empty(),
            amm_program_interaction: !amm_signatures.is_empty(),
            graduation,
            launch_signatures,
            amm_signatures,
            supporting_signatures,
            checked_signatures,
        })
    }
}
