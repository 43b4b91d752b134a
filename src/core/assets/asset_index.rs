// ─── Asset Store ───
// Content-addressed objects under assets/objects/<2 hex>/<digest>.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use futures_util::{stream, StreamExt};
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use crate::core::downloader::checksum;
use crate::core::downloader::{Fetcher, ProgressEvent};
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::version::version_file::{AssetIndexRef, VersionDescriptor};

pub const RESOURCES_URL: &str = "https://resources.download.minecraft.net";

/// Top-level asset index JSON structure.
#[derive(Debug, Clone, Deserialize)]
pub struct AssetIndex {
    /// Sorted by logical name so work order is stable across runs.
    pub objects: BTreeMap<String, AssetObject>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct AssetObject {
    pub hash: String,
    #[serde(default)]
    pub size: u64,
}

impl AssetIndex {
    pub fn parse(raw: &[u8]) -> LauncherResult<Self> {
        Ok(serde_json::from_slice(raw)?)
    }

    /// Objects in index order, one per digest.
    pub fn unique_objects(&self) -> Vec<&AssetObject> {
        let mut seen = HashSet::new();
        self.objects
            .values()
            .filter(|object| seen.insert(object.hash.to_ascii_lowercase()))
            .collect()
    }
}

/// `<first two hex chars>/<digest>`, or `None` for a digest too short to shard.
pub fn shard_path(hash: &str) -> Option<String> {
    let prefix = hash.get(..2)?;
    if hash.len() < 3 || !hash.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    Some(format!("{prefix}/{hash}"))
}

/// Fetches asset indexes and the objects they reference.
pub struct AssetStore {
    fetcher: Fetcher,
    assets_dir: PathBuf,
    base_url: String,
    concurrency: usize,
}

impl AssetStore {
    pub fn new(
        fetcher: Fetcher,
        assets_dir: impl Into<PathBuf>,
        base_url: impl Into<String>,
        concurrency: usize,
    ) -> Self {
        Self {
            fetcher,
            assets_dir: assets_dir.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            concurrency: concurrency.max(1),
        }
    }

    pub fn index_path(&self, index_id: &str) -> PathBuf {
        self.assets_dir
            .join("indexes")
            .join(format!("{index_id}.json"))
    }

    pub fn object_path(&self, hash: &str) -> Option<PathBuf> {
        let shard = shard_path(hash)?;
        Some(self.assets_dir.join("objects").join(shard))
    }

    pub fn object_url(&self, hash: &str) -> Option<String> {
        Some(format!("{}/{}", self.base_url, shard_path(hash)?))
    }

    /// Makes sure the index named by `descriptor` and its objects are on disk.
    /// Returns whether the index was obtained; object failures are logged only.
    /// A version without an asset index has nothing to fetch and reports `true`.
    #[instrument(skip_all, fields(version = %descriptor.id))]
    pub async fn ensure_assets(&self, descriptor: &VersionDescriptor) -> bool {
        let Some(index_ref) = descriptor.asset_index.as_ref() else {
            info!("No asset index for {}, skipping assets", descriptor.id);
            return true;
        };

        let index = match self.ensure_index(index_ref).await {
            Ok(index) => index,
            Err(e) => {
                warn!("Asset index {} unavailable: {}", index_ref.id, e);
                return false;
            }
        };

        let (fetched, failed) = self.ensure_objects(&index).await;
        info!(
            "Assets for index {}: {} fetched, {} failed",
            index_ref.id, fetched, failed
        );
        true
    }

    /// Load the index from disk if it verifies, otherwise download it first.
    /// Without a digest, any on-disk index that parses is taken as is.
    pub async fn ensure_index(&self, index_ref: &AssetIndexRef) -> LauncherResult<AssetIndex> {
        let path = self.index_path(&index_ref.id);
        let expected = index_ref.sha1.as_deref();

        let present = match expected {
            Some(sha1) => checksum::verify_async(&path, sha1).await,
            None => match tokio::fs::read(&path).await {
                Ok(raw) => match AssetIndex::parse(&raw) {
                    Ok(index) => {
                        debug!("Asset index {} already present", index_ref.id);
                        return Ok(index);
                    }
                    Err(_) => false,
                },
                Err(_) => false,
            },
        };

        if present {
            debug!("Asset index {} already present", index_ref.id);
        } else {
            self.fetcher
                .fetch_required(
                    &index_ref.url,
                    &path,
                    &format!("asset index {}", index_ref.id),
                    expected,
                )
                .await?;
        }

        let raw = tokio::fs::read(&path)
            .await
            .map_err(|e| LauncherError::io(&path, e))?;
        AssetIndex::parse(&raw)
    }

    /// Returns `(fetched, failed)`. Already valid objects count as neither.
    async fn ensure_objects(&self, index: &AssetIndex) -> (usize, usize) {
        let objects = index.unique_objects();
        let total = objects.len();
        self.fetcher
            .progress()
            .emit(&ProgressEvent::Stage(format!("Checking {total} assets")));

        let mut done = 0;
        let mut fetched = 0;
        let mut failed = 0;

        // Digests are unique here, so no two in-flight fetches share a path.
        let mut results = stream::iter(objects)
            .map(|object| self.ensure_object(object))
            .buffer_unordered(self.concurrency);

        while let Some(result) = results.next().await {
            match result {
                ObjectResult::Present => {}
                ObjectResult::Fetched => fetched += 1,
                ObjectResult::Failed => failed += 1,
            }
            done += 1;
            self.fetcher
                .progress()
                .emit(&ProgressEvent::Assets { done, total });
        }

        (fetched, failed)
    }

    async fn ensure_object(&self, object: &AssetObject) -> ObjectResult {
        let (Some(dest), Some(url)) = (self.object_path(&object.hash), self.object_url(&object.hash))
        else {
            warn!("Skipping asset with malformed digest {:?}", object.hash);
            return ObjectResult::Failed;
        };

        if checksum::verify_async(&dest, &object.hash).await {
            return ObjectResult::Present;
        }

        let label = format!("asset {}", object.hash);
        if self.fetcher.fetch(&url, &dest, &label, Some(&object.hash)).await {
            ObjectResult::Fetched
        } else {
            warn!("Failed to download asset {}", object.hash);
            ObjectResult::Failed
        }
    }

    pub fn assets_dir(&self) -> &Path {
        &self.assets_dir
    }
}

enum ObjectResult {
    Present,
    Fetched,
    Failed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shard_path_uses_first_two_hex_chars() {
        assert_eq!(
            shard_path("bdf48ef6b5d0d23bbb02e17d04865216179f510a").as_deref(),
            Some("bd/bdf48ef6b5d0d23bbb02e17d04865216179f510a")
        );
        assert_eq!(shard_path("a"), None);
        assert_eq!(shard_path("../etc/passwd"), None);
    }

    #[test]
    fn index_objects_are_deduplicated_by_digest() {
        let index = AssetIndex::parse(
            br#"{"objects": {
                "minecraft/sounds/a.ogg": {"hash": "aa11", "size": 1},
                "minecraft/sounds/b.ogg": {"hash": "AA11", "size": 1},
                "minecraft/lang/en_us.json": {"hash": "bb22", "size": 2}
            }}"#,
        )
        .unwrap();
        assert_eq!(index.objects.len(), 3);
        let unique: Vec<_> = index.unique_objects().iter().map(|o| o.hash.clone()).collect();
        assert_eq!(unique, vec!["bb22", "aa11"]);
    }
}
