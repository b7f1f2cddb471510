pub mod analyzer;
pub mod batch;
pub mod platform_verifier;

pub use analyzer::{AnalysisError, TokenAnalyzer};
pub use batch::{cancel_after, BatchEntry, BatchOrchestrator, BatchReport, BatchSummary, ExportEntry};
pub use platform_verifier::{PlatformConfig, PlatformVerifier};
