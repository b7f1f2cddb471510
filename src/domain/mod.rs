//! Domain Layer - Core types and rules for mint auditing
//!
//! This module contains pure domain types and logic with no network access.
//! All external interactions happen through the ports layer.
//!
//! - `mint`: Decoded mint account and owning program
//! - `extension`: Token-2022 extension records
//! - `metadata`: Token name/symbol/uri and update authority
//! - `mitigation`: Criteria and externally supplied mitigation statements
//! - `security_review`: Deterministic rule set and verdicts
//! - `platform`: Launch-platform authenticity result
//! - `analysis`: Per-address aggregate handed to reporting
//! - `known_programs`: Well-known program addresses

pub mod analysis;
pub mod extension;
pub mod known_programs;
pub mod metadata;
pub mod mint;
pub mod mitigation;
pub mod platform;
pub mod security_review;
pub mod serde_helpers;

pub use analysis::AnalysisResult;
pub use extension::{DefaultState, ExtensionRecord, ExtensionType, TransferFee};
pub use metadata::{MetadataSource, TokenMetadata};
pub use mint::{MintInfo, TokenAccountAddress, TokenProgram};
pub use mitigation::{Criterion, MitigationBook, MitigationEntry, MitigationSet};
pub use platform::{GraduationStatus, PlatformVerification};
pub use security_review::{
    SecurityFinding, SecurityReview, SecurityReviewer, Severity, UnreviewedExtension, Verdict,
};
