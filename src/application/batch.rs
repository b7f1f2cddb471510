//! Batch Orchestrator
//!
//! Analyzes many addresses concurrently under a semaphore. Results come back
//! in input order regardless of completion order, and one address failing
//! never affects its siblings. Cancellation stops dispatch and aborts
//! in-flight analyses at their next await point.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use solana_sdk::pubkey::Pubkey;
use tokio::sync::Semaphore;
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, info_span, warn, Instrument};

use crate::domain::analysis::AnalysisResult;

use super::analyzer::{AnalysisError, TokenAnalyzer};

/// Outcome for one input address
#[derive(Debug, Clone)]
pub struct BatchEntry {
    pub address: Pubkey,
    pub outcome: Result<AnalysisResult, AnalysisError>,
}

/// Counts over a finished batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    /// Raw verdict passed
    pub passed: usize,
    /// Raw verdict failed
    pub failed: usize,
    /// Raw verdict failed but every triggered finding carries an applied mitigation
    pub passed_with_mitigations: usize,
    /// No account at the address
    pub not_found: usize,
    /// Account exists but is not owned by a token program
    pub not_a_token: usize,
    pub errored: usize,
    pub cancelled: usize,
}

/// Export row: `{"address", "status", ...}` where status is one of
/// `success`, `not_found`, `not_a_token` or `error`
#[derive(Debug, Serialize)]
pub struct ExportEntry<'a> {
    pub address: String,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<&'a AnalysisResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
struct ExportDocument<'a> {
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
    cancelled: bool,
    summary: BatchSummary,
    results: Vec<ExportEntry<'a>>,
}

/// Export status for outcomes that mean "no token here" rather than a failure
fn absent_status(error: &AnalysisError) -> Option<&'static str> {
    match error {
        AnalysisError::NotFound(_) => Some("not_found"),
        AnalysisError::NotATokenMint { .. } => Some("not_a_token"),
        _ => None,
    }
}

/// Everything a batch run produced
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub entries: Vec<BatchEntry>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub cancelled: bool,
}

impl BatchReport {
    pub fn summary(&self) -> BatchSummary {
        let mut summary = BatchSummary {
            total: self.entries.len(),
            ..BatchSummary::default()
        };
        for entry in &self.entries {
            match &entry.outcome {
                Ok(result) if result.raw_verdict.is_passed() => summary.passed += 1,
                Ok(result) => {
                    summary.failed += 1;
                    if result.mitigated_verdict.is_passed() {
                        summary.passed_with_mitigations += 1;
                    }
                }
                Err(AnalysisError::NotFound(_)) => summary.not_found += 1,
                Err(AnalysisError::NotATokenMint { .. }) => summary.not_a_token += 1,
                Err(AnalysisError::Cancelled) => summary.cancelled += 1,
                Err(_) => summary.errored += 1,
            }
        }
        summary
    }

    /// Flat per-address view for JSON export
    pub fn export_entries(&self) -> Vec<ExportEntry<'_>> {
        self.entries
            .iter()
            .map(|entry| match &entry.outcome {
                Ok(result) => ExportEntry {
                    address: entry.address.to_string(),
                    status: "success",
                    result: Some(result),
                    detail: None,
                    error_kind: None,
                    error: None,
                },
                Err(e) => match absent_status(e) {
                    Some(status) => ExportEntry {
                        address: entry.address.to_string(),
                        status,
                        result: None,
                        detail: Some(e.to_string()),
                        error_kind: None,
                        error: None,
                    },
                    None => ExportEntry {
                        address: entry.address.to_string(),
                        status: "error",
                        result: None,
                        detail: None,
                        error_kind: Some(e.kind()),
                        error: Some(e.to_string()),
                    },
                },
            })
            .collect()
    }

    /// Pretty JSON document with summary and per-address rows
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&ExportDocument {
            started_at: self.started_at,
            finished_at: self.finished_at,
            cancelled: self.cancelled,
            summary: self.summary(),
            results: self.export_entries(),
        })
    }
}

/// Concurrent driver over a shared [`TokenAnalyzer`]
pub struct BatchOrchestrator {
    analyzer: Arc<TokenAnalyzer>,
}

impl BatchOrchestrator {
    pub fn new(analyzer: Arc<TokenAnalyzer>) -> Self {
        Self { analyzer }
    }

    /// Analyze `addresses` with at most `concurrency` in flight.
    ///
    /// The report has exactly one entry per input, in input order.
    pub async fn analyze_many(
        &self,
        addresses: &[Pubkey],
        concurrency: usize,
        cancel: &CancellationToken,
    ) -> BatchReport {
        let started_at = Utc::now();
        let concurrency = concurrency.max(1);
        info!(
            "Starting batch of {} addresses (concurrency {})",
            addresses.len(),
            concurrency
        );

        let semaphore = Arc::new(Semaphore::new(concurrency));
        let mut tasks = JoinSet::new();

        for (index, address) in addresses.iter().copied().enumerate() {
            let permit = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    warn!(
                        "Batch cancelled, {} addresses not dispatched",
                        addresses.len() - index
                    );
                    break;
                }
                permit = Arc::clone(&semaphore).acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
            };

            let analyzer = Arc::clone(&self.analyzer);
            let token = cancel.clone();
            let span = info_span!("analyze", %address, index);
            tasks.spawn(
                async move {
                    let _permit = permit;
                    let outcome = tokio::select! {
                        biased;
                        _ = token.cancelled() => Err(AnalysisError::Cancelled),
                        outcome = analyzer.analyze(&address) => outcome,
                    };
                    match &outcome {
                        Ok(_) | Err(AnalysisError::Cancelled) => {}
                        Err(e @ (AnalysisError::NotFound(_) | AnalysisError::NotATokenMint { .. })) => {
                            info!("Skipping: {}", e)
                        }
                        Err(e) => warn!("Analysis failed: {}", e),
                    }
                    (index, outcome)
                }
                .instrument(span),
            );
        }

        let mut slots: Vec<Option<Result<AnalysisResult, AnalysisError>>> =
            (0..addresses.len()).map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, outcome)) => slots[index] = Some(outcome),
                Err(e) => error!("Analysis task failed: {}", e),
            }
        }

        let cancelled = cancel.is_cancelled();
        let entries = addresses
            .iter()
            .zip(slots)
            .map(|(address, slot)| BatchEntry {
                address: *address,
                outcome: slot.unwrap_or_else(|| {
                    if cancelled {
                        Err(AnalysisError::Cancelled)
                    } else {
                        Err(AnalysisError::TaskFailed(
                            "task panicked before producing a result".to_string(),
                        ))
                    }
                }),
            })
            .collect();

        let report = BatchReport {
            entries,
            started_at,
            finished_at: Utc::now(),
            cancelled,
        };
        let summary = report.summary();
        info!(
            "Batch complete: {} passed, {} failed ({} mitigated), {} not tokens, {} errored, {} cancelled",
            summary.passed,
            summary.failed,
            summary.passed_with_mitigations,
            summary.not_found + summary.not_a_token,
            summary.errored,
            summary.cancelled
        );
        report
    }
}

/// Cancel `token` once `deadline` elapses. Dropping the handle leaves the
/// timer running; abort it to disarm.
pub fn cancel_after(token: CancellationToken, deadline: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            _ = token.cancelled() => {}
            _ = tokio::time::sleep(deadline) => {
                warn!("Batch deadline of {:?} reached, cancelling", deadline);
                token.cancel();
            }
        }
    })
}
