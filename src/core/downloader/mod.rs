pub mod checksum;
pub mod client;
pub mod progress;

pub use client::{FetchOutcome, FetchState, Fetcher, RetryPolicy, RetryReason};
pub use progress::{ProgressEvent, ProgressSink, TracingProgress};
