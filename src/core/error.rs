use std::path::PathBuf;
use thiserror::Error;

use crate::core::http::TransportError;

/// Central error type for the launcher core.
/// Every module returns `Result<T, LauncherError>`.
#[derive(Debug, Error)]
pub enum LauncherError {
    // ── IO ──────────────────────────────────────────────
    #[error("IO error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    // ── Network ─────────────────────────────────────────
    #[error("Request to {url} failed: {source}")]
    Transport { url: String, source: TransportError },

    #[error("Failed to download {label} from {url} after {attempts} attempts")]
    DownloadExhausted {
        label: String,
        url: String,
        attempts: u32,
    },

    // ── Integrity ───────────────────────────────────────
    #[error("Checksum mismatch for {path:?}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    // ── Manifests ───────────────────────────────────────
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Malformed manifest: {0}")]
    Manifest(String),

    // ── Archive ─────────────────────────────────────────
    #[error("Zip extraction error: {0}")]
    Zip(#[from] zip::result::ZipError),

    // ── Configuration ───────────────────────────────────
    #[error("Version not found in catalog: {0}")]
    VersionNotFound(String),

    #[error("Java not found for major version {0}")]
    JavaNotFound(u32),

    #[error("Java execution failed: {0}")]
    JavaExecution(String),

    #[error("Unsupported platform: {0}")]
    UnsupportedPlatform(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Convenience alias used throughout the crate.
pub type LauncherResult<T> = Result<T, LauncherError>;

/// Coarse classification used by collaborators to pick a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Network,
    Integrity,
    Parse,
    Filesystem,
    Configuration,
}

impl LauncherError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LauncherError::Transport { .. } | LauncherError::DownloadExhausted { .. } => {
                ErrorKind::Network
            }
            LauncherError::ChecksumMismatch { .. } => ErrorKind::Integrity,
            LauncherError::Json(_) | LauncherError::Manifest(_) => ErrorKind::Parse,
            LauncherError::Io { .. } | LauncherError::Zip(_) => ErrorKind::Filesystem,
            LauncherError::VersionNotFound(_)
            | LauncherError::JavaNotFound(_)
            | LauncherError::JavaExecution(_)
            | LauncherError::UnsupportedPlatform(_)
            | LauncherError::InvalidArgument(_) => ErrorKind::Configuration,
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        LauncherError::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<std::io::Error> for LauncherError {
    fn from(source: std::io::Error) -> Self {
        LauncherError::Io {
            path: PathBuf::new(),
            source,
        }
    }
}
