//! Resilience - retry policy, rate-limit gate and the retrying ledger wrapper

pub mod rate_limit;
pub mod retry;
pub mod retrying_ledger;

pub use rate_limit::RateLimitGate;
pub use retry::{RetryClass, RetryError, RetryPolicy, Retryable};
pub use retrying_ledger::RetryingLedger;
