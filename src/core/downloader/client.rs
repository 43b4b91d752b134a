// ─── Retrying Fetcher ───
// One logical download: bounded retries, backoff, optional SHA-1 gate.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::core::downloader::checksum;
use crate::core::downloader::progress::{ProgressEvent, ProgressSink};
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::http::Transport;

pub const MAX_RETRIES: u32 = 5;
pub const RETRY_DELAY: Duration = Duration::from_secs(2);
pub const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(60);
pub const RATE_LIMIT_DELAY: Duration = Duration::from_millis(100);

/// Timing knobs of the fetcher.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub retry_delay: Duration,
    pub timeout: Duration,
    pub rate_limit_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_RETRIES,
            retry_delay: RETRY_DELAY,
            timeout: DOWNLOAD_TIMEOUT,
            rate_limit_delay: RATE_LIMIT_DELAY,
        }
    }
}

impl RetryPolicy {
    /// `RETRY_DELAY * 2^attempt`, `attempt` zero-based.
    pub fn network_backoff(&self, attempt: u32) -> Duration {
        self.retry_delay.saturating_mul(2u32.saturating_pow(attempt))
    }

    /// `RETRY_DELAY * (attempt + 1)`, `attempt` zero-based.
    pub fn mismatch_backoff(&self, attempt: u32) -> Duration {
        self.retry_delay.saturating_mul(attempt + 1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryReason {
    Network,
    ChecksumMismatch,
}

impl RetryReason {
    fn describe(self) -> &'static str {
        match self {
            RetryReason::Network => "Network error",
            RetryReason::ChecksumMismatch => "Checksum mismatch",
        }
    }
}

/// States of one fetch. `Succeeded`, `ExhaustedFailed` and `Aborted` are terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchState {
    Attempting {
        attempt: u32,
    },
    BackingOff {
        attempt: u32,
        delay: Duration,
        reason: RetryReason,
    },
    Succeeded {
        attempt: u32,
    },
    ExhaustedFailed,
    /// A failure that is neither network nor digest related (e.g. the
    /// destination cannot be written). Never retried.
    Aborted,
}

impl FetchState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            FetchState::Succeeded { .. } | FetchState::ExhaustedFailed | FetchState::Aborted
        )
    }
}

/// What happened during a fetch.
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub state: FetchState,
    pub attempts: u32,
    pub delays: Vec<Duration>,
}

impl FetchOutcome {
    pub fn succeeded(&self) -> bool {
        matches!(self.state, FetchState::Succeeded { .. })
    }
}

/// The sole network I/O primitive for artifacts.
#[derive(Clone)]
pub struct Fetcher {
    transport: Arc<dyn Transport>,
    policy: RetryPolicy,
    progress: Arc<dyn ProgressSink>,
}

impl Fetcher {
    pub fn new(
        transport: Arc<dyn Transport>,
        policy: RetryPolicy,
        progress: Arc<dyn ProgressSink>,
    ) -> Self {
        Self {
            transport,
            policy,
            progress,
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn progress(&self) -> &Arc<dyn ProgressSink> {
        &self.progress
    }

    /// Download `url` to `dest`. Returns `false` once all attempts are spent
    /// or on a non-retryable failure; a failed fetch leaves no file behind.
    pub async fn fetch(
        &self,
        url: &str,
        dest: &Path,
        label: &str,
        expected_sha1: Option<&str>,
    ) -> bool {
        self.fetch_outcome(url, dest, label, expected_sha1)
            .await
            .succeeded()
    }

    /// Like [`Fetcher::fetch`] but fails with a `LauncherError` carrying the label and url.
    pub async fn fetch_required(
        &self,
        url: &str,
        dest: &Path,
        label: &str,
        expected_sha1: Option<&str>,
    ) -> LauncherResult<()> {
        let outcome = self.fetch_outcome(url, dest, label, expected_sha1).await;
        if outcome.succeeded() {
            return Ok(());
        }
        Err(LauncherError::DownloadExhausted {
            label: label.to_string(),
            url: url.to_string(),
            attempts: outcome.attempts,
        })
    }

    pub async fn fetch_outcome(
        &self,
        url: &str,
        dest: &Path,
        label: &str,
        expected_sha1: Option<&str>,
    ) -> FetchOutcome {
        let mut delays = Vec::new();
        let mut attempts = 0;

        if let Some(parent) = dest.parent() {
            if let Err(e) = tokio::fs::create_dir_all(parent).await {
                error!("Cannot create {:?} for {}: {}", parent, label, e);
                self.progress.emit(&ProgressEvent::Failed {
                    label: label.to_string(),
                });
                return FetchOutcome {
                    state: FetchState::Aborted,
                    attempts,
                    delays,
                };
            }
        }

        let mut state = FetchState::Attempting { attempt: 0 };
        while !state.is_terminal() {
            state = match state {
                FetchState::Attempting { attempt } => {
                    attempts = attempt + 1;
                    self.attempt(url, dest, label, expected_sha1, attempt).await
                }
                FetchState::BackingOff {
                    attempt,
                    delay,
                    reason,
                } => {
                    self.progress.emit(&ProgressEvent::Retrying {
                        label: label.to_string(),
                        wait: delay,
                        reason: reason.describe().to_string(),
                    });
                    delays.push(delay);
                    tokio::time::sleep(delay).await;
                    FetchState::Attempting {
                        attempt: attempt + 1,
                    }
                }
                terminal => terminal,
            };
        }

        match state {
            FetchState::Succeeded { .. } => {
                info!("Downloaded {} successfully", label);
                self.progress.emit(&ProgressEvent::Fetched {
                    label: label.to_string(),
                });
                tokio::time::sleep(self.policy.rate_limit_delay).await;
            }
            FetchState::ExhaustedFailed => {
                error!(
                    "Failed to download {} after {} attempts",
                    label, self.policy.max_attempts
                );
                self.progress.emit(&ProgressEvent::Failed {
                    label: label.to_string(),
                });
            }
            _ => {
                self.progress.emit(&ProgressEvent::Failed {
                    label: label.to_string(),
                });
            }
        }

        FetchOutcome {
            state,
            attempts,
            delays,
        }
    }

    async fn attempt(
        &self,
        url: &str,
        dest: &Path,
        label: &str,
        expected_sha1: Option<&str>,
        attempt: u32,
    ) -> FetchState {
        self.progress.emit(&ProgressEvent::Attempt {
            label: label.to_string(),
            attempt: attempt + 1,
            max_attempts: self.policy.max_attempts,
        });

        let body = match self.transport.get(url, self.policy.timeout).await {
            Ok(body) => body,
            Err(e) => {
                warn!("Network error downloading {}: {}", label, e);
                remove_partial(dest).await;
                return self.next_after_failure(attempt, RetryReason::Network);
            }
        };

        if let Err(e) = tokio::fs::write(dest, &body).await {
            error!("Unexpected error writing {} to {:?}: {}", label, dest, e);
            remove_partial(dest).await;
            return FetchState::Aborted;
        }

        if let Some(expected) = expected_sha1 {
            if !checksum::verify_async(dest, expected).await {
                warn!("Checksum mismatch for {}", label);
                remove_partial(dest).await;
                return self.next_after_failure(attempt, RetryReason::ChecksumMismatch);
            }
        }

        debug!("Fetched {} -> {:?} ({} bytes)", url, dest, body.len());
        FetchState::Succeeded { attempt }
    }

    fn next_after_failure(&self, attempt: u32, reason: RetryReason) -> FetchState {
        if attempt + 1 >= self.policy.max_attempts {
            return FetchState::ExhaustedFailed;
        }
        let delay = match reason {
            RetryReason::Network => self.policy.network_backoff(attempt),
            RetryReason::ChecksumMismatch => self.policy.mismatch_backoff(attempt),
        };
        FetchState::BackingOff {
            attempt,
            delay,
            reason,
        }
    }
}

async fn remove_partial(dest: &Path) {
    if tokio::fs::try_exists(dest).await.unwrap_or(false) {
        let _ = tokio::fs::remove_file(dest).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::downloader::checksum::sha1_hex;
    use crate::core::downloader::progress::TracingProgress;
    use crate::core::http::TransportError;
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Fails the first `failures` calls, then serves `body`.
    struct FlakyTransport {
        failures: u32,
        calls: AtomicU32,
        body: &'static [u8],
    }

    #[async_trait]
    impl Transport for FlakyTransport {
        async fn get(&self, _url: &str, _timeout: Duration) -> Result<Bytes, TransportError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                return Err(TransportError::Connect("connection reset".into()));
            }
            Ok(Bytes::from_static(self.body))
        }
    }

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 5,
            retry_delay: Duration::from_millis(1),
            timeout: Duration::from_secs(1),
            rate_limit_delay: Duration::ZERO,
        }
    }

    fn fetcher(transport: Arc<FlakyTransport>) -> Fetcher {
        Fetcher::new(transport, fast_policy(), Arc::new(TracingProgress))
    }

    #[test]
    fn backoff_schedules() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.network_backoff(0), Duration::from_secs(2));
        assert_eq!(policy.network_backoff(1), Duration::from_secs(4));
        assert_eq!(policy.network_backoff(3), Duration::from_secs(16));
        assert_eq!(policy.mismatch_backoff(0), Duration::from_secs(2));
        assert_eq!(policy.mismatch_backoff(2), Duration::from_secs(6));
    }

    #[tokio::test]
    async fn succeeds_on_third_attempt_after_two_network_faults() {
        let dir = tempfile::TempDir::new().unwrap();
        let dest = dir.path().join("nested").join("lib.jar");
        let transport = Arc::new(FlakyTransport {
            failures: 2,
            calls: AtomicU32::new(0),
            body: b"library bytes",
        });

        let outcome = fetcher(transport.clone())
            .fetch_outcome(
                "https://example.invalid/lib.jar",
                &dest,
                "library",
                Some(&sha1_hex(b"library bytes")),
            )
            .await;

        assert_eq!(outcome.state, FetchState::Succeeded { attempt: 2 });
        assert_eq!(outcome.attempts, 3);
        assert_eq!(
            outcome.delays,
            vec![Duration::from_millis(1), Duration::from_millis(2)]
        );
        assert_eq!(transport.calls.load(Ordering::SeqCst), 3);
        assert_eq!(std::fs::read(&dest).unwrap(), b"library bytes");
    }

    #[tokio::test]
    async fn exhausted_fetch_leaves_no_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let dest = dir.path().join("asset");
        std::fs::write(&dest, b"stale partial").unwrap();
        let transport = Arc::new(FlakyTransport {
            failures: u32::MAX,
            calls: AtomicU32::new(0),
            body: b"",
        });

        let ok = fetcher(transport.clone())
            .fetch("https://example.invalid/asset", &dest, "asset", None)
            .await;

        assert!(!ok);
        assert!(!dest.exists());
        assert_eq!(transport.calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn digest_mismatch_retries_with_linear_backoff_then_fails() {
        let dir = tempfile::TempDir::new().unwrap();
        let dest = dir.path().join("client.jar");
        let transport = Arc::new(FlakyTransport {
            failures: 0,
            calls: AtomicU32::new(0),
            body: b"tampered",
        });

        let outcome = fetcher(transport)
            .fetch_outcome(
                "https://example.invalid/client.jar",
                &dest,
                "client",
                Some(&sha1_hex(b"genuine")),
            )
            .await;

        assert_eq!(outcome.state, FetchState::ExhaustedFailed);
        assert_eq!(outcome.attempts, 5);
        assert_eq!(
            outcome.delays,
            (1..=4).map(Duration::from_millis).collect::<Vec<_>>()
        );
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn fetch_required_reports_label_and_url() {
        let dir = tempfile::TempDir::new().unwrap();
        let transport = Arc::new(FlakyTransport {
            failures: u32::MAX,
            calls: AtomicU32::new(0),
            body: b"",
        });

        let err = fetcher(transport)
            .fetch_required(
                "https://example.invalid/1.20.4.jar",
                &dir.path().join("1.20.4.jar"),
                "1.20.4 JAR",
                None,
            )
            .await
            .unwrap_err();

        let message = err.to_string();
        assert!(message.contains("1.20.4 JAR"));
        assert!(message.contains("https://example.invalid/1.20.4.jar"));
    }
}
