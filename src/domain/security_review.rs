//! Security Reviewer
//!
//! Deterministic rule set over a decoded mint. Standard SPL mints are judged
//! on the freeze authority alone. Token-2022 mints are judged on five
//! criteria, evaluated independently and always in the same order so reports
//! are reproducible.
//!
//! Every evaluated rule produces a finding, triggered or not. Mitigations are
//! folded in afterwards and only affect `display_severity` and the mitigated
//! verdict; `triggered` and the raw verdict depend on decoded fields only.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::extension::ExtensionRecord;
use super::mint::{MintInfo, TokenProgram};
use super::mitigation::{Criterion, MitigationEntry, MitigationSet};

/// Transfer fees at or above this many basis points are rated High
const HIGH_TRANSFER_FEE_BPS: u16 = 1_000;

/// Severity of a finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Rule evaluated and did not trigger
    Info,
    Low,
    Medium,
    High,
    Critical,
    /// Triggered, but an applied mitigation accepts it
    Mitigated,
}

/// Overall review outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    Passed,
    Failed,
}

impl Verdict {
    pub fn is_passed(&self) -> bool {
        matches!(self, Verdict::Passed)
    }
}

/// One evaluated rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityFinding {
    pub criterion: Criterion,
    /// Pure function of decoded fields
    pub triggered: bool,
    /// Severity of the underlying condition
    pub severity: Severity,
    /// Severity to show, after accepted mitigations
    pub display_severity: Severity,
    pub description: String,
    /// Mitigation matched to this finding, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mitigation: Option<MitigationEntry>,
}

impl SecurityFinding {
    /// Triggered and covered by an applied mitigation
    pub fn is_accepted(&self) -> bool {
        self.triggered && self.mitigation.as_ref().map_or(false, |m| m.applied)
    }
}

/// Extension the rule set has no opinion on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnreviewedExtension {
    pub tag: u16,
    pub name: String,
    pub payload_len: usize,
}

/// Full review output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityReview {
    pub findings: Vec<SecurityFinding>,
    /// Verdict on decoded facts alone
    pub raw_verdict: Verdict,
    /// Verdict after accepted mitigations
    pub mitigated_verdict: Verdict,
    /// Advisory only; never changes either verdict
    pub unreviewed_extensions: Vec<UnreviewedExtension>,
}

impl SecurityReview {
    /// Findings whose rule triggered
    pub fn triggered(&self) -> impl Iterator<Item = &SecurityFinding> {
        self.findings.iter().filter(|f| f.triggered)
    }
}

/// Outcome of evaluating one rule before mitigations are applied
struct RuleOutcome {
    criterion: Criterion,
    triggered: bool,
    severity: Severity,
    description: String,
}

/// Stateless rule evaluator
#[derive(Debug, Clone, Default)]
pub struct SecurityReviewer;

impl SecurityReviewer {
    pub fn new() -> Self {
        Self
    }

    /// Review a decoded mint
    pub fn review(
        &self,
        mint: &MintInfo,
        extensions: &[ExtensionRecord],
        mitigations: Option<&MitigationSet>,
    ) -> SecurityReview {
        let outcomes = match mint.program {
            TokenProgram::Spl => vec![freeze_authority_rule(mint)],
            TokenProgram::Token2022 => Criterion::ALL
                .iter()
                .map(|criterion| evaluate(*criterion, mint, extensions))
                .collect(),
        };

        if let Some(set) = mitigations {
            for criterion in set.keys() {
                if !outcomes.iter().any(|o| o.criterion == *criterion) {
                    debug!(
                        "Mitigation for {} ignored: rule not evaluated for {} mints",
                        criterion,
                        mint.program.name()
                    );
                }
            }
        }

        let findings: Vec<SecurityFinding> = outcomes
            .into_iter()
            .map(|outcome| apply_mitigation(outcome, mitigations))
            .collect();

        let raw_verdict = verdict(findings.iter().any(|f| f.triggered));
        let mitigated_verdict =
            verdict(findings.iter().any(|f| f.triggered && !f.is_accepted()));

        let unreviewed_extensions: Vec<UnreviewedExtension> = extensions
            .iter()
            .filter(|record| record.is_unreviewed())
            .map(|record| {
                warn!("Unreviewed extension present: {}", record.describe());
                let payload_len = match record {
                    ExtensionRecord::Other { payload, .. }
                    | ExtensionRecord::Unrecognized { payload, .. } => payload.len(),
                    _ => 0,
                };
                let kind = record.extension_type();
                UnreviewedExtension {
                    tag: kind.tag(),
                    name: kind.name().to_string(),
                    payload_len,
                }
            })
            .collect();

        SecurityReview {
            findings,
            raw_verdict,
            mitigated_verdict,
            unreviewed_extensions,
        }
    }
}

fn verdict(failed: bool) -> Verdict {
    if failed {
        Verdict::Failed
    } else {
        Verdict::Passed
    }
}

fn apply_mitigation(outcome: RuleOutcome, mitigations: Option<&MitigationSet>) -> SecurityFinding {
    let mitigation = if outcome.triggered {
        mitigations.and_then(|set| set.get(&outcome.criterion)).cloned()
    } else {
        None
    };

    let display_severity = match &mitigation {
        Some(entry) if entry.applied => {
            info!(
                "Mitigation accepted for {}; condition still structurally present",
                outcome.criterion
            );
            Severity::Mitigated
        }
        _ => outcome.severity,
    };

    SecurityFinding {
        criterion: outcome.criterion,
        triggered: outcome.triggered,
        severity: outcome.severity,
        display_severity,
        description: outcome.description,
        mitigation,
    }
}

fn evaluate(criterion: Criterion, mint: &MintInfo, extensions: &[ExtensionRecord]) -> RuleOutcome {
    match criterion {
        Criterion::FreezeAuthority => freeze_authority_rule(mint),
        Criterion::PermanentDelegate => permanent_delegate_rule(extensions),
        Criterion::TransferHook => transfer_hook_rule(extensions),
        Criterion::ConfidentialTransfers => confidential_transfers_rule(extensions),
        Criterion::TransferFees => transfer_fees_rule(extensions),
    }
}

fn freeze_authority_rule(mint: &MintInfo) -> RuleOutcome {
    match mint.freeze_authority {
        Some(authority) => RuleOutcome {
            criterion: Criterion::FreezeAuthority,
            triggered: true,
            severity: Severity::High,
            description: format!(
                "Freeze authority is set to {}; holder accounts can be frozen and blacklisted",
                authority
            ),
        },
        None => RuleOutcome {
            criterion: Criterion::FreezeAuthority,
            triggered: false,
            severity: Severity::Info,
            description: "No freeze authority; account freezing is permanently revoked".to_string(),
        },
    }
}

fn permanent_delegate_rule(extensions: &[ExtensionRecord]) -> RuleOutcome {
    let delegate = extensions.iter().find_map(|record| match record {
        ExtensionRecord::PermanentDelegate { delegate } => Some(*delegate),
        _ => None,
    });

    match delegate {
        Some(delegate) => RuleOutcome {
            criterion: Criterion::PermanentDelegate,
            triggered: true,
            severity: Severity::Critical,
            description: format!(
                "Permanent delegate extension present (delegate: {}); it can transfer or burn any holder's tokens",
                display_optional(delegate)
            ),
        },
        None => RuleOutcome {
            criterion: Criterion::PermanentDelegate,
            triggered: false,
            severity: Severity::Info,
            description: "No permanent delegate; no address can move or burn holder balances"
                .to_string(),
        },
    }
}

fn transfer_hook_rule(extensions: &[ExtensionRecord]) -> RuleOutcome {
    let hook = extensions.iter().find_map(|record| match record {
        ExtensionRecord::TransferHook { authority, program_id } => Some((*authority, *program_id)),
        _ => None,
    });

    match hook {
        Some((authority, program_id)) => RuleOutcome {
            criterion: Criterion::TransferHook,
            triggered: true,
            severity: Severity::High,
            description: format!(
                "Transfer hook extension present (program: {}, authority: {}); every transfer invokes a custom program that can block it",
                display_optional(program_id),
                display_optional(authority)
            ),
        },
        None => RuleOutcome {
            criterion: Criterion::TransferHook,
            triggered: false,
            severity: Severity::Info,
            description: "No transfer hook; transfers do not call a custom program".to_string(),
        },
    }
}

fn confidential_transfers_rule(extensions: &[ExtensionRecord]) -> RuleOutcome {
    let authority = extensions.iter().find_map(|record| match record {
        ExtensionRecord::ConfidentialTransferMint { authority, .. } => Some(*authority),
        _ => None,
    });

    match authority {
        Some(authority) => RuleOutcome {
            criterion: Criterion::ConfidentialTransfers,
            triggered: true,
            severity: Severity::Medium,
            description: format!(
                "Confidential transfers enabled (authority: {}); transfer amounts are encrypted",
                display_optional(authority)
            ),
        },
        None => RuleOutcome {
            criterion: Criterion::ConfidentialTransfers,
            triggered: false,
            severity: Severity::Info,
            description: "No confidential transfers; all transfer amounts are public".to_string(),
        },
    }
}

fn transfer_fees_rule(extensions: &[ExtensionRecord]) -> RuleOutcome {
    let fee = extensions.iter().find_map(|record| match record {
        ExtensionRecord::TransferFeeConfig { newer_transfer_fee, .. } => Some(*newer_transfer_fee),
        _ => None,
    });

    match fee {
        Some(fee) if fee.basis_points > 0 => RuleOutcome {
            criterion: Criterion::TransferFees,
            triggered: true,
            severity: if fee.basis_points >= HIGH_TRANSFER_FEE_BPS {
                Severity::High
            } else {
                Severity::Medium
            },
            description: format!(
                "Transfer fee of {} bps (max {} base units) from epoch {}; recipients receive less than sent",
                fee.basis_points, fee.maximum_fee, fee.epoch
            ),
        },
        Some(_) => RuleOutcome {
            criterion: Criterion::TransferFees,
            triggered: false,
            severity: Severity::Low,
            description: "Transfer fee extension present with a zero fee; the fee authority could raise it"
                .to_string(),
        },
        None => RuleOutcome {
            criterion: Criterion::TransferFees,
            triggered: false,
            severity: Severity::Info,
            description: "No transfer fees; sent and received amounts are equal".to_string(),
        },
    }
}

fn display_optional(key: Option<solana_sdk::pubkey::Pubkey>) -> String {
    key.map(|k| k.to_string()).unwrap_or_else(|| "None".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::extension::{ExtensionType, TransferFee};
    use solana_sdk::pubkey::Pubkey;

    fn mint(program: TokenProgram, freeze: bool) -> MintInfo {
        MintInfo {
            program,
            program_id: program.program_id(),
            supply: 1_000_000,
            decimals: 6,
            is_initialized: true,
            mint_authority: None,
            freeze_authority: freeze.then(Pubkey::new_unique),
        }
    }

    fn fee_config(bps: u16) -> ExtensionRecord {
        let fee = TransferFee { epoch: 10, maximum_fee: 5_000, basis_points: bps };
        ExtensionRecord::TransferFeeConfig {
            config_authority: None,
            withdraw_withheld_authority: None,
            withheld_amount: 0,
            older_transfer_fee: TransferFee { basis_points: 0, ..fee },
            newer_transfer_fee: fee,
        }
    }

    fn trigger_records() -> Vec<(Criterion, ExtensionRecord)> {
        vec![
            (
                Criterion::PermanentDelegate,
                ExtensionRecord::PermanentDelegate { delegate: Some(Pubkey::new_unique()) },
            ),
            (
                Criterion::TransferHook,
                ExtensionRecord::TransferHook {
                    authority: None,
                    program_id: Some(Pubkey::new_unique()),
                },
            ),
            (
                Criterion::ConfidentialTransfers,
                ExtensionRecord::ConfidentialTransferMint {
                    authority: Some(Pubkey::new_unique()),
                    auto_approve_new_accounts: false,
                    has_auditor: false,
                },
            ),
            (Criterion::TransferFees, fee_config(250)),
        ]
    }

    fn accepted(criterion: Criterion) -> MitigationSet {
        let mut set = MitigationSet::new();
        set.insert(
            criterion,
            MitigationEntry {
                documentation: "Controlled by governance".to_string(),
                applied: true,
                links: vec![],
            },
        );
        set
    }

    #[test]
    fn test_standard_mint_verdict_follows_freeze_authority() {
        let reviewer = SecurityReviewer::new();

        let review = reviewer.review(&mint(TokenProgram::Spl, true), &[], None);
        assert_eq!(review.raw_verdict, Verdict::Failed);
        assert_eq!(review.findings.len(), 1);
        assert_eq!(review.findings[0].criterion, Criterion::FreezeAuthority);

        let review = reviewer.review(&mint(TokenProgram::Spl, false), &[], None);
        assert_eq!(review.raw_verdict, Verdict::Passed);
        assert!(!review.findings[0].triggered);
        assert_eq!(review.findings[0].severity, Severity::Info);
    }

    #[test]
    fn test_standard_mint_ignores_extension_rules() {
        // A standard mint never carries extensions, but even if handed some
        // only the freeze rule is evaluated.
        let records: Vec<_> = trigger_records().into_iter().map(|(_, r)| r).collect();
        let review = SecurityReviewer::new().review(&mint(TokenProgram::Spl, false), &records, None);
        assert_eq!(review.raw_verdict, Verdict::Passed);
        assert_eq!(review.findings.len(), 1);
    }

    #[test]
    fn test_token_2022_clean_mint_passes_with_five_findings() {
        let review = SecurityReviewer::new().review(&mint(TokenProgram::Token2022, false), &[], None);
        assert_eq!(review.raw_verdict, Verdict::Passed);
        assert_eq!(review.mitigated_verdict, Verdict::Passed);
        let order: Vec<_> = review.findings.iter().map(|f| f.criterion).collect();
        assert_eq!(order, Criterion::ALL.to_vec());
        assert!(review.findings.iter().all(|f| !f.triggered));
    }

    #[test]
    fn test_token_2022_triggered_set_is_exact() {
        let reviewer = SecurityReviewer::new();
        let triggers = trigger_records();

        // Every subset of the four extension triggers, with and without freeze.
        for mask in 0u32..32 {
            let freeze = mask & 1 == 1;
            let mut expected = Vec::new();
            if freeze {
                expected.push(Criterion::FreezeAuthority);
            }
            let mut records = Vec::new();
            for (i, (criterion, record)) in triggers.iter().enumerate() {
                if mask & (1 << (i + 1)) != 0 {
                    expected.push(*criterion);
                    records.push(record.clone());
                }
            }

            let review = reviewer.review(&mint(TokenProgram::Token2022, freeze), &records, None);
            let triggered: Vec<_> = review.triggered().map(|f| f.criterion).collect();
            assert_eq!(triggered, expected, "mask {mask:05b}");
            assert_eq!(review.raw_verdict.is_passed(), expected.is_empty());
        }
    }

    #[test]
    fn test_zero_fee_does_not_trigger() {
        let review = SecurityReviewer::new().review(
            &mint(TokenProgram::Token2022, false),
            &[fee_config(0)],
            None,
        );
        assert_eq!(review.raw_verdict, Verdict::Passed);
        let fees = &review.findings[4];
        assert_eq!(fees.criterion, Criterion::TransferFees);
        assert!(!fees.triggered);
        assert_eq!(fees.severity, Severity::Low);
    }

    #[test]
    fn test_high_fee_severity() {
        let review = SecurityReviewer::new().review(
            &mint(TokenProgram::Token2022, false),
            &[fee_config(1_500)],
            None,
        );
        assert_eq!(review.findings[4].severity, Severity::High);
    }

    #[test]
    fn test_mitigation_never_changes_triggered_flags() {
        let reviewer = SecurityReviewer::new();
        let records: Vec<_> = trigger_records().into_iter().map(|(_, r)| r).collect();
        let info = mint(TokenProgram::Token2022, true);

        let mut all = MitigationSet::new();
        for criterion in Criterion::ALL {
            all.extend(accepted(criterion));
        }

        let plain = reviewer.review(&info, &records, None);
        let mitigated = reviewer.review(&info, &records, Some(&all));

        let flags = |r: &SecurityReview| r.findings.iter().map(|f| f.triggered).collect::<Vec<_>>();
        assert_eq!(flags(&plain), flags(&mitigated));
        assert_eq!(plain.raw_verdict, mitigated.raw_verdict);
        assert_eq!(mitigated.raw_verdict, Verdict::Failed);
        assert_eq!(mitigated.mitigated_verdict, Verdict::Passed);
        assert!(mitigated
            .findings
            .iter()
            .all(|f| f.display_severity == Severity::Mitigated));
    }

    #[test]
    fn test_partial_mitigation_keeps_failure() {
        let info = mint(TokenProgram::Token2022, true);
        let records = vec![fee_config(100)];
        let review = SecurityReviewer::new().review(
            &info,
            &records,
            Some(&accepted(Criterion::FreezeAuthority)),
        );

        assert_eq!(review.mitigated_verdict, Verdict::Failed);
        assert_eq!(review.findings[0].display_severity, Severity::Mitigated);
        assert_eq!(review.findings[0].severity, Severity::High);
        assert_eq!(review.findings[4].display_severity, Severity::Medium);
    }

    #[test]
    fn test_unapplied_mitigation_is_attached_but_not_accepted() {
        let mut set = accepted(Criterion::FreezeAuthority);
        if let Some(entry) = set.get_mut(&Criterion::FreezeAuthority) {
            entry.applied = false;
        }

        let review =
            SecurityReviewer::new().review(&mint(TokenProgram::Spl, true), &[], Some(&set));
        let finding = &review.findings[0];
        assert!(finding.mitigation.is_some());
        assert!(!finding.is_accepted());
        assert_eq!(finding.display_severity, Severity::High);
        assert_eq!(review.mitigated_verdict, Verdict::Failed);
    }

    #[test]
    fn test_mitigation_on_passing_rule_is_not_attached() {
        let review = SecurityReviewer::new().review(
            &mint(TokenProgram::Spl, false),
            &[],
            Some(&accepted(Criterion::FreezeAuthority)),
        );
        assert!(review.findings[0].mitigation.is_none());
        assert_eq!(review.findings[0].display_severity, Severity::Info);
    }

    #[test]
    fn test_unreviewed_extensions_are_advisory() {
        let records = vec![
            ExtensionRecord::Unrecognized { tag: 300, payload: vec![0; 12] },
            ExtensionRecord::Other { kind: ExtensionType::ScaledUiAmountConfig, payload: vec![0; 56] },
            ExtensionRecord::Uninitialized { reserved_len: 8 },
        ];
        let review =
            SecurityReviewer::new().review(&mint(TokenProgram::Token2022, false), &records, None);

        assert_eq!(review.raw_verdict, Verdict::Passed);
        assert_eq!(review.unreviewed_extensions.len(), 2);
        assert_eq!(review.unreviewed_extensions[0].tag, 300);
        assert_eq!(review.unreviewed_extensions[1].name, "ScaledUiAmountConfig");
        assert_eq!(review.unreviewed_extensions[1].payload_len, 56);
    }

    #[test]
    fn test_verdict_serialization() {
        assert_eq!(serde_json::to_string(&Verdict::Failed).unwrap(), "\"FAILED\"");
        assert_eq!(serde_json::to_string(&Severity::Mitigated).unwrap(), "\"mitigated\"");
    }
}
