// ─── Version Installer ───
// Descriptor, assets, client, libraries and natives for one version.

pub mod natives;
pub mod resolver;

use std::path::PathBuf;

use tracing::{info, instrument, warn};

use crate::core::assets::AssetStore;
use crate::core::downloader::checksum;
use crate::core::downloader::{Fetcher, ProgressEvent};
use crate::core::error::LauncherResult;
use crate::core::state::layout::GameLayout;
use crate::core::version::manifest::VersionCatalogEntry;
use crate::core::version::platform::Platform;
use crate::core::version::version_file::VersionDescriptor;

pub use resolver::{resolve_artifacts, ArtifactKind, ResolvedArtifact};

/// Summary of one resolve-and-fetch pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReport {
    pub version_id: String,
    pub client: PathBuf,
    pub libraries_fetched: usize,
    pub libraries_present: usize,
    /// Labels of libraries or native archives that could not be obtained.
    pub libraries_failed: Vec<String>,
    pub natives_extracted: usize,
    pub assets_ok: bool,
}

pub struct Installer {
    fetcher: Fetcher,
    layout: GameLayout,
    platform: Platform,
    assets: AssetStore,
}

impl Installer {
    pub fn new(
        fetcher: Fetcher,
        layout: GameLayout,
        platform: Platform,
        asset_base_url: &str,
        asset_concurrency: usize,
    ) -> Self {
        let assets = AssetStore::new(
            fetcher.clone(),
            layout.assets_dir(),
            asset_base_url,
            asset_concurrency,
        );
        Self {
            fetcher,
            layout,
            platform,
            assets,
        }
    }

    pub fn assets(&self) -> &AssetStore {
        &self.assets
    }

    /// Descriptor on disk, downloaded first unless a valid copy exists. With
    /// a digest the copy must verify; without one it only has to parse.
    pub async fn ensure_descriptor(
        &self,
        entry: &VersionCatalogEntry,
    ) -> LauncherResult<VersionDescriptor> {
        let path = self.layout.descriptor_path(&entry.id);
        let expected = entry.sha1.as_deref();

        let present = match expected {
            Some(sha1) => checksum::verify_async(&path, sha1).await,
            None => match VersionDescriptor::load_from(&path).await {
                Ok(descriptor) => return Ok(descriptor),
                Err(_) => false,
            },
        };
        if !present {
            self.fetcher
                .fetch_required(
                    &entry.url,
                    &path,
                    &format!("version manifest {}", entry.id),
                    expected,
                )
                .await?;
        }

        VersionDescriptor::load_from(&path).await
    }

    #[instrument(skip_all, fields(version = %entry.id))]
    pub async fn install_entry(&self, entry: &VersionCatalogEntry) -> LauncherResult<InstallReport> {
        self.stage(format!("Resolving version {}", entry.id));
        let descriptor = self.ensure_descriptor(entry).await?;
        self.install_descriptor(&descriptor).await
    }

    /// Everything after the descriptor. Only a missing client jar is fatal.
    pub async fn install_descriptor(
        &self,
        descriptor: &VersionDescriptor,
    ) -> LauncherResult<InstallReport> {
        self.stage("Downloading assets".to_string());
        let assets_ok = self.assets.ensure_assets(descriptor).await;
        if !assets_ok {
            warn!("Assets for {} are incomplete", descriptor.id);
        }

        let artifacts = resolve_artifacts(descriptor, &self.layout, &self.platform)?;
        let mut report = InstallReport {
            version_id: descriptor.id.clone(),
            client: self.layout.client_jar_path(&descriptor.id),
            libraries_fetched: 0,
            libraries_present: 0,
            libraries_failed: Vec::new(),
            natives_extracted: 0,
            assets_ok,
        };

        self.stage("Downloading libraries".to_string());
        for artifact in &artifacts {
            match &artifact.kind {
                ArtifactKind::Client => self.ensure_client(artifact).await?,
                ArtifactKind::Library => match self.ensure_file(artifact).await {
                    Obtained::Present => report.libraries_present += 1,
                    Obtained::Fetched => report.libraries_fetched += 1,
                    Obtained::Failed => report.libraries_failed.push(artifact.label.clone()),
                },
                ArtifactKind::Native { excludes, .. } => {
                    match self.ensure_native(artifact, excludes, &descriptor.id).await {
                        Obtained::Present => {}
                        Obtained::Fetched => report.natives_extracted += 1,
                        Obtained::Failed => report.libraries_failed.push(artifact.label.clone()),
                    }
                }
            }
        }

        info!(
            "Version {} ready: {} libraries fetched, {} present, {} failed, {} natives extracted",
            report.version_id,
            report.libraries_fetched,
            report.libraries_present,
            report.libraries_failed.len(),
            report.natives_extracted
        );
        Ok(report)
    }

    async fn ensure_client(&self, artifact: &ResolvedArtifact) -> LauncherResult<()> {
        if self.is_present(artifact).await {
            return Ok(());
        }
        self.stage("Downloading client".to_string());
        self.fetcher
            .fetch_required(
                &artifact.url,
                &artifact.path,
                &artifact.label,
                artifact.sha1.as_deref(),
            )
            .await
    }

    async fn ensure_file(&self, artifact: &ResolvedArtifact) -> Obtained {
        if self.is_present(artifact).await {
            return Obtained::Present;
        }
        let ok = self
            .fetcher
            .fetch(
                &artifact.url,
                &artifact.path,
                &artifact.label,
                artifact.sha1.as_deref(),
            )
            .await;
        if ok {
            Obtained::Fetched
        } else {
            warn!("Library {} unavailable, continuing", artifact.label);
            Obtained::Failed
        }
    }

    /// `Present` when a previous run already extracted this archive.
    async fn ensure_native(
        &self,
        artifact: &ResolvedArtifact,
        excludes: &[String],
        version_id: &str,
    ) -> Obtained {
        let natives_dir = self.layout.natives_dir(version_id);
        let key = native_key(artifact);

        if natives::is_extracted(&natives_dir, &key).await {
            return Obtained::Present;
        }

        if self.ensure_file(artifact).await == Obtained::Failed {
            return Obtained::Failed;
        }

        match natives::extract_native_archive(&artifact.path, &natives_dir, excludes, &key).await {
            Ok(_) => Obtained::Fetched,
            Err(e) => {
                warn!("Failed to extract natives from {}: {}", artifact.label, e);
                Obtained::Failed
            }
        }
    }

    /// A file with a known digest counts only if it verifies; without one,
    /// existence is all there is to check.
    async fn is_present(&self, artifact: &ResolvedArtifact) -> bool {
        match artifact.sha1.as_deref() {
            Some(sha1) => checksum::verify_async(&artifact.path, sha1).await,
            None => tokio::fs::try_exists(&artifact.path).await.unwrap_or(false),
        }
    }

    fn stage(&self, message: String) {
        self.fetcher.progress().emit(&ProgressEvent::Stage(message));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Obtained {
    Present,
    Fetched,
    Failed,
}

fn native_key(artifact: &ResolvedArtifact) -> String {
    match (&artifact.sha1, &artifact.kind) {
        (Some(sha1), _) => sha1.to_ascii_lowercase(),
        (None, ArtifactKind::Native { classifier, .. }) => classifier.clone(),
        (None, _) => artifact.label.clone(),
    }
}
