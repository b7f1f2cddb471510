//! Mint Analysis Integration Tests
//!
//! Verifies the analysis components work together over the public API:
//! 1. RetryingLedger -> TokenAnalyzer (retries absorbed, verdicts computed)
//! 2. Token-2022 extension decoding -> SecurityReviewer with mitigations
//! 3. PlatformVerifier with Metaplex metadata, history and market data
//! 4. BatchOrchestrator ordering and export
//!
//! All tests are deterministic (no real network calls) and use mock ports.

use std::sync::Arc;
use std::time::Duration;

use solana_sdk::pubkey::Pubkey;
use tokio_util::sync::CancellationToken;

use spl_audit::adapters::resilience::{RateLimitGate, RetryPolicy, RetryingLedger};
use spl_audit::adapters::token::metaplex_metadata_address;
use spl_audit::application::{AnalysisError, BatchOrchestrator, PlatformConfig, PlatformVerifier, TokenAnalyzer};
use spl_audit::config::parse_mitigations;
use spl_audit::domain::known_programs::{
    METAPLEX_METADATA_PROGRAM, PUMP_FUN_PROGRAM, PUMP_FUN_UPDATE_AUTHORITY, SPL_TOKEN_PROGRAM,
    TOKEN_2022_PROGRAM,
};
use spl_audit::domain::{Criterion, GraduationStatus, MitigationBook, Severity, Verdict};
use spl_audit::ports::mocks::{MockLedger, MockMarketData};
use spl_audit::ports::{InstructionDetail, PoolStatus, RawAccount, RpcError, SignatureInfo, TransactionDetail};

// ============================================================================
// Test Fixtures
// ============================================================================

/// Standard 82-byte mint layout
fn mint_bytes(freeze_authority: Option<Pubkey>) -> Vec<u8> {
    let mut data = Vec::with_capacity(82);
    data.extend_from_slice(&0u32.to_le_bytes());
    data.extend_from_slice(&[0u8; 32]);
    data.extend_from_slice(&1_000_000_000_000_000u64.to_le_bytes());
    data.push(6);
    data.push(1);
    data.extend_from_slice(&(freeze_authority.is_some() as u32).to_le_bytes());
    data.extend_from_slice(freeze_authority.unwrap_or_default().as_ref());
    data
}

/// Token-2022 mint: base layout, padding to 165, account type, TLV records
fn token_2022_bytes(records: &[(u16, Vec<u8>)]) -> Vec<u8> {
    let mut data = mint_bytes(None);
    data.resize(165, 0);
    data.push(1);
    for (tag, payload) in records {
        data.extend_from_slice(&tag.to_le_bytes());
        data.extend_from_slice(&(payload.len() as u16).to_le_bytes());
        data.extend_from_slice(payload);
    }
    data
}

fn account(owner: Pubkey, data: Vec<u8>) -> RawAccount {
    RawAccount {
        owner,
        lamports: 1_461_600,
        data,
    }
}

fn metaplex_account(update_authority: Pubkey, mint: Pubkey) -> RawAccount {
    let mut data = vec![4u8];
    data.extend_from_slice(update_authority.as_ref());
    data.extend_from_slice(mint.as_ref());
    for field in ["Pumped", "PUMP", "https://example.org/pump.json"] {
        data.extend_from_slice(&(field.len() as u32).to_le_bytes());
        data.extend_from_slice(field.as_bytes());
    }
    account(METAPLEX_METADATA_PROGRAM, data)
}

fn fast_policy() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 4,
        base_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(5),
        max_total_wait: Duration::from_secs(1),
        jitter_pct: 0,
        rate_limit_cooldown: Duration::from_millis(1),
    }
}

fn analyzer_over(ledger: Arc<MockLedger>, mitigations: MitigationBook) -> TokenAnalyzer {
    let retrying = RetryingLedger::new(ledger, fast_policy(), Arc::new(RateLimitGate::unlimited()));
    TokenAnalyzer::new(Arc::new(retrying), Arc::new(mitigations))
}

// ============================================================================
// Retry + analysis pipeline
// ============================================================================

mod pipeline_tests {
    use super::*;

    #[tokio::test]
    async fn test_transient_failures_absorbed_by_retry() {
        let address = Pubkey::new_unique();
        let ledger = Arc::new(
            MockLedger::new()
                .with_account(address, account(SPL_TOKEN_PROGRAM, mint_bytes(Some(Pubkey::new_unique()))))
                .with_account_failures(
                    address,
                    vec![
                        RpcError::Transient("connection reset".to_string()),
                        RpcError::RateLimited { retry_after: None },
                    ],
                ),
        );

        let result = analyzer_over(ledger.clone(), MitigationBook::new())
            .analyze(&address)
            .await
            .unwrap();

        assert_eq!(result.raw_verdict, Verdict::Failed);
        // three attempts for the mint plus one metadata lookup
        assert_eq!(ledger.call_count("fetch_account"), 4);
    }

    #[tokio::test]
    async fn test_retry_exhaustion_reported() {
        let address = Pubkey::new_unique();
        let failures = (0..4)
            .map(|_| RpcError::Transient("timeout".to_string()))
            .collect();
        let ledger = Arc::new(MockLedger::new().with_account_failures(address, failures));

        let err = analyzer_over(ledger, MitigationBook::new())
            .analyze(&address)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::Rpc(RpcError::Exhausted { attempts: 4, .. })
        ));
    }
}

// ============================================================================
// Token-2022 review with mitigations
// ============================================================================

mod token_2022_tests {
    use super::*;

    #[tokio::test]
    async fn test_delegate_and_hook_with_partial_mitigation() {
        let address = Pubkey::new_unique();
        let mut hook = Pubkey::new_unique().to_bytes().to_vec();
        hook.extend_from_slice(Pubkey::new_unique().as_ref());
        let data = token_2022_bytes(&[
            (12, Pubkey::new_unique().to_bytes().to_vec()),
            (14, hook),
        ]);
        let ledger = Arc::new(MockLedger::new().with_account(address, account(TOKEN_2022_PROGRAM, data)));

        let mitigations = parse_mitigations(&format!(
            r#"{{"{}": {{
                "permanent_delegate": {{"documentation": "Regulated issuer clawback", "applied": true}},
                "transfer_hook": {{"documentation": "Allow-list hook, audit pending", "applied": false}}
            }}}}"#,
            address
        ))
        .unwrap();

        let result = analyzer_over(ledger, mitigations).analyze(&address).await.unwrap();

        let triggered: Vec<Criterion> = result
            .findings
            .iter()
            .filter(|f| f.triggered)
            .map(|f| f.criterion)
            .collect();
        assert_eq!(triggered, vec![Criterion::PermanentDelegate, Criterion::TransferHook]);

        let delegate = &result.findings[1];
        assert_eq!(delegate.criterion, Criterion::PermanentDelegate);
        assert_eq!(delegate.severity, Severity::Critical);
        assert_eq!(delegate.display_severity, Severity::Mitigated);

        assert_eq!(result.raw_verdict, Verdict::Failed);
        // the hook mitigation is not applied
        assert_eq!(result.mitigated_verdict, Verdict::Failed);
    }

    #[tokio::test]
    async fn test_overrunning_extension_is_malformed() {
        let address = Pubkey::new_unique();
        let mut data = token_2022_bytes(&[]);
        data.extend_from_slice(&12u16.to_le_bytes());
        data.extend_from_slice(&64u16.to_le_bytes());
        data.extend_from_slice(&[7u8; 10]);
        let ledger = Arc::new(MockLedger::new().with_account(address, account(TOKEN_2022_PROGRAM, data)));

        let err = analyzer_over(ledger, MitigationBook::new())
            .analyze(&address)
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::MalformedAccount { len: 180, .. }));
    }
}

// ============================================================================
// Platform verification
// ============================================================================

mod platform_tests {
    use super::*;

    #[tokio::test]
    async fn test_authentic_graduated_platform_token() {
        let address = Pubkey::new_unique();
        let payer = Pubkey::new_unique();
        let pda = metaplex_metadata_address(&address, &METAPLEX_METADATA_PROGRAM);
        let ledger = Arc::new(
            MockLedger::new()
                .with_account(address, account(SPL_TOKEN_PROGRAM, mint_bytes(None)))
                .with_account(pda, metaplex_account(PUMP_FUN_UPDATE_AUTHORITY, address))
                .with_signatures(
                    address,
                    vec![SignatureInfo {
                        signature: "create".to_string(),
                        slot: 300_000_000,
                        block_time: Some(1_720_000_000),
                        failed: false,
                    }],
                )
                .with_transaction(TransactionDetail {
                    signature: "create".to_string(),
                    slot: 300_000_000,
                    block_time: Some(1_720_000_000),
                    account_keys: vec![payer, address, PUMP_FUN_PROGRAM],
                    instructions: vec![InstructionDetail {
                        program_id: PUMP_FUN_PROGRAM,
                        accounts: vec![payer, address],
                        data: vec![24, 30, 200, 40, 5, 28, 7, 119],
                        inner: false,
                    }],
                }),
        );
        let market = MockMarketData::new().with_response(address, Ok(PoolStatus::Listed));

        let verifier = PlatformVerifier::new(ledger.clone(), Arc::new(market), PlatformConfig::default());
        let analyzer = TokenAnalyzer::new(ledger, Arc::new(MitigationBook::new())).with_verifier(verifier);

        let result = analyzer.analyze(&address).await.unwrap();
        let platform = result.platform.unwrap();
        assert!(platform.update_authority_match);
        assert!(platform.launch_program_interaction);
        assert!(!platform.amm_program_interaction);
        assert_eq!(platform.graduation, GraduationStatus::Graduated);
        assert!(platform.is_authentic());
        assert_eq!(result.metadata.unwrap().symbol, "PUMP");
    }

    #[tokio::test]
    async fn test_impostor_authority_short_circuits() {
        let address = Pubkey::new_unique();
        let pda = metaplex_metadata_address(&address, &METAPLEX_METADATA_PROGRAM);
        let ledger = Arc::new(
            MockLedger::new()
                .with_account(address, account(SPL_TOKEN_PROGRAM, mint_bytes(None)))
                .with_account(pda, metaplex_account(Pubkey::new_unique(), address)),
        );
        let market = Arc::new(MockMarketData::new());

        let verifier = PlatformVerifier::new(ledger.clone(), market.clone(), PlatformConfig::default());
        let analyzer =
            TokenAnalyzer::new(ledger.clone(), Arc::new(MitigationBook::new())).with_verifier(verifier);

        let platform = analyzer.analyze(&address).await.unwrap().platform.unwrap();
        assert!(!platform.update_authority_match);
        assert!(!platform.is_authentic());
        assert_eq!(ledger.call_count("fetch_signatures_for_address"), 0);
        assert!(market.get_calls().is_empty());
    }
}

// ============================================================================
// Batch orchestration
// ============================================================================

mod batch_tests {
    use super::*;

    #[tokio::test]
    async fn test_batch_report_in_input_order() {
        let frozen = Pubkey::new_unique();
        let clean = Pubkey::new_unique();
        let wallet = Pubkey::new_unique();
        let ledger = Arc::new(
            MockLedger::new()
                .with_account(frozen, account(SPL_TOKEN_PROGRAM, mint_bytes(Some(Pubkey::new_unique()))))
                .with_delay(frozen, Duration::from_millis(40))
                .with_account(clean, account(SPL_TOKEN_PROGRAM, mint_bytes(None)))
                .with_account(wallet, account(Pubkey::default(), vec![])),
        );
        let orchestrator = BatchOrchestrator::new(Arc::new(analyzer_over(ledger, MitigationBook::new())));

        let report = orchestrator
            .analyze_many(&[frozen, clean, wallet], 3, &CancellationToken::new())
            .await;

        let addresses: Vec<Pubkey> = report.entries.iter().map(|e| e.address).collect();
        assert_eq!(addresses, vec![frozen, clean, wallet]);
        assert_eq!(report.entries[0].outcome.as_ref().unwrap().raw_verdict, Verdict::Failed);
        assert_eq!(report.entries[1].outcome.as_ref().unwrap().raw_verdict, Verdict::Passed);
        assert!(matches!(
            report.entries[2].outcome,
            Err(AnalysisError::NotATokenMint { .. })
        ));

        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(json["summary"]["total"], 3);
        assert_eq!(json["results"][2]["status"], "not_a_token");
        assert_eq!(json["summary"]["not_a_token"], 1);
        assert_eq!(json["summary"]["errored"], 0);
    }
}
