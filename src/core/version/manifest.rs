// ─── Version Catalog ───
// Fetches the top-level version manifest and sorts entries into categories.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tracing::{info, instrument};

use crate::core::error::LauncherError;
use crate::core::http::{Transport, TransportError};

pub const VERSION_MANIFEST_URL: &str =
    "https://piston-meta.mojang.com/mc/game/version_manifest_v2.json";

/// Catalog failures, kept apart so the front end can word them differently.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Network error loading version catalog from {url}: {source}")]
    Network { url: String, source: TransportError },

    #[error("TLS verification failed loading version catalog from {url}: {message}")]
    Tls { url: String, message: String },

    #[error("Malformed version catalog: {0}")]
    Parse(#[from] serde_json::Error),
}

impl From<CatalogError> for LauncherError {
    fn from(value: CatalogError) -> Self {
        match value {
            CatalogError::Network { url, source } => LauncherError::Transport { url, source },
            CatalogError::Tls { url, message } => LauncherError::Transport {
                url,
                source: TransportError::Tls(message),
            },
            CatalogError::Parse(source) => LauncherError::Json(source),
        }
    }
}

/// Top-level version manifest.
#[derive(Debug, Clone, Deserialize)]
pub struct VersionCatalog {
    pub latest: LatestVersions,
    pub versions: Vec<VersionCatalogEntry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LatestVersions {
    #[serde(default)]
    pub release: Option<String>,
    #[serde(default)]
    pub snapshot: Option<String>,
}

/// A single entry in the manifest.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionCatalogEntry {
    pub id: String,
    #[serde(rename = "type")]
    pub version_type: VersionType,
    pub url: String,
    /// Digest of the version descriptor (v2 manifests only).
    #[serde(default)]
    pub sha1: Option<String>,
    #[serde(default)]
    pub release_time: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VersionType {
    Release,
    Snapshot,
    OldBeta,
    OldAlpha,
    #[serde(other)]
    Unknown,
}

/// Selection categories shown to the user. Each entry lands in at most one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum VersionCategory {
    LatestRelease,
    LatestSnapshot,
    Release,
    Snapshot,
    OldBeta,
    OldAlpha,
}

impl VersionCategory {
    pub const ALL: [VersionCategory; 6] = [
        VersionCategory::LatestRelease,
        VersionCategory::LatestSnapshot,
        VersionCategory::Release,
        VersionCategory::Snapshot,
        VersionCategory::OldBeta,
        VersionCategory::OldAlpha,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            VersionCategory::LatestRelease => "Latest Release",
            VersionCategory::LatestSnapshot => "Latest Snapshot",
            VersionCategory::Release => "Release",
            VersionCategory::Snapshot => "Snapshot",
            VersionCategory::OldBeta => "Old Beta",
            VersionCategory::OldAlpha => "Old Alpha",
        }
    }

    pub fn from_label(raw: &str) -> Option<Self> {
        let wanted = raw.trim().to_ascii_lowercase().replace(['-', '_'], " ");
        Self::ALL
            .into_iter()
            .find(|category| category.label().to_ascii_lowercase() == wanted)
    }
}

impl fmt::Display for VersionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Version ids per category, each list in catalog order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategorizedVersions {
    lists: HashMap<VersionCategory, Vec<String>>,
}

impl CategorizedVersions {
    pub fn get(&self, category: VersionCategory) -> &[String] {
        self.lists.get(&category).map(Vec::as_slice).unwrap_or(&[])
    }

    fn push(&mut self, category: VersionCategory, id: &str) {
        self.lists.entry(category).or_default().push(id.to_string());
    }
}

impl VersionCatalog {
    /// Fetch the catalog. A single attempt: the catalog is small and the
    /// user is waiting on it.
    #[instrument(skip(transport))]
    pub async fn fetch(
        transport: &dyn Transport,
        url: &str,
        timeout: Duration,
    ) -> Result<Self, CatalogError> {
        info!("Fetching version catalog...");

        let body = transport.get(url, timeout).await.map_err(|source| match source {
            TransportError::Tls(message) => CatalogError::Tls {
                url: url.to_string(),
                message,
            },
            source => CatalogError::Network {
                url: url.to_string(),
                source,
            },
        })?;

        let catalog = Self::parse(&body)?;
        info!("Loaded {} versions from catalog", catalog.versions.len());
        Ok(catalog)
    }

    pub fn parse(bytes: &[u8]) -> Result<Self, CatalogError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Find a specific version entry by ID (e.g. "1.20.4").
    pub fn find_version(&self, id: &str) -> Option<&VersionCatalogEntry> {
        self.versions.iter().find(|v| v.id == id)
    }

    /// Version id -> descriptor URL.
    pub fn urls(&self) -> HashMap<String, String> {
        self.versions
            .iter()
            .map(|v| (v.id.clone(), v.url.clone()))
            .collect()
    }

    /// The entry tagged latest release goes only to `LatestRelease` and is
    /// kept out of `Release`; likewise for snapshots.
    pub fn categorize(&self) -> CategorizedVersions {
        let latest_release = self.latest.release.as_deref();
        let latest_snapshot = self.latest.snapshot.as_deref();
        let mut out = CategorizedVersions::default();

        for entry in &self.versions {
            let id = entry.id.as_str();
            if Some(id) == latest_release {
                out.push(VersionCategory::LatestRelease, id);
                continue;
            }
            if Some(id) == latest_snapshot {
                out.push(VersionCategory::LatestSnapshot, id);
                continue;
            }

            match entry.version_type {
                VersionType::Release => out.push(VersionCategory::Release, id),
                VersionType::Snapshot => out.push(VersionCategory::Snapshot, id),
                VersionType::OldBeta => out.push(VersionCategory::OldBeta, id),
                VersionType::OldAlpha => out.push(VersionCategory::OldAlpha, id),
                VersionType::Unknown => {}
            }
        }

        out
    }
}
