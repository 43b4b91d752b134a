use std::fmt;
use std::time::Duration;

use tracing::info;

/// Human-readable progress emitted while resolving and fetching.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    Stage(String),
    Attempt {
        label: String,
        attempt: u32,
        max_attempts: u32,
    },
    Retrying {
        label: String,
        wait: Duration,
        reason: String,
    },
    Fetched {
        label: String,
    },
    Failed {
        label: String,
    },
    Assets {
        done: usize,
        total: usize,
    },
}

impl fmt::Display for ProgressEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProgressEvent::Stage(stage) => write!(f, "{stage}"),
            ProgressEvent::Attempt {
                label,
                attempt,
                max_attempts,
            } => write!(f, "Downloading {label} (attempt {attempt}/{max_attempts})"),
            ProgressEvent::Retrying {
                label,
                wait,
                reason,
            } => write!(
                f,
                "{reason} for {label}, retrying in {:.1}s",
                wait.as_secs_f64()
            ),
            ProgressEvent::Fetched { label } => write!(f, "Downloaded {label}"),
            ProgressEvent::Failed { label } => write!(f, "Failed to download {label}"),
            ProgressEvent::Assets { done, total } => write!(f, "Assets: {done}/{total}"),
        }
    }
}

/// Receives progress. Implementations must not block.
pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: &ProgressEvent);
}

impl<F> ProgressSink for F
where
    F: Fn(&ProgressEvent) + Send + Sync,
{
    fn emit(&self, event: &ProgressEvent) {
        self(event)
    }
}

/// Default sink: progress goes to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingProgress;

impl ProgressSink for TracingProgress {
    fn emit(&self, event: &ProgressEvent) {
        info!("{}", event);
    }
}
