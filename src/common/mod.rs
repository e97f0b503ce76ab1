//! Shared helpers used across the crate.

pub mod retry;

pub use retry::{retry, Backoff, RetryPolicy, DEFAULT_MAX_RETRIES, DEFAULT_RETRY_DELAY};
