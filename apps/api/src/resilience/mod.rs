// Resilient-call layer: error classification, bounded retries, backoff.
// Every LLM call in the service goes through ResilientExecutor; nothing else retries.

pub mod classifier;
pub mod executor;

pub use classifier::ErrorClassification;
pub use executor::{ExecutionOutcome, ResilientExecutor, RetryPolicy};
