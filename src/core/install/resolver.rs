// ─── Artifact Resolver ───
// Descriptor + platform -> the ordered list of files a version needs.

use std::path::PathBuf;

use tracing::{debug, warn};

use crate::core::error::LauncherResult;
use crate::core::state::layout::GameLayout;
use crate::core::version::platform::Platform;
use crate::core::version::version_file::VersionDescriptor;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactKind {
    Client,
    Library,
    /// Archive to unpack into the version's natives directory.
    Native {
        classifier: String,
        excludes: Vec<String>,
    },
}

/// One downloadable file and where it lives locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedArtifact {
    pub label: String,
    pub url: String,
    pub path: PathBuf,
    pub sha1: Option<String>,
    pub kind: ArtifactKind,
}

/// Client first, then each allowed library followed by its native archive.
/// Assets are resolved separately by the asset store.
pub fn resolve_artifacts(
    descriptor: &VersionDescriptor,
    layout: &GameLayout,
    platform: &Platform,
) -> LauncherResult<Vec<ResolvedArtifact>> {
    let client = descriptor.client()?;
    let mut artifacts = vec![ResolvedArtifact {
        label: format!("client {}", descriptor.id),
        url: client.url.clone(),
        path: layout.client_jar_path(&descriptor.id),
        sha1: client.sha1.clone(),
        kind: ArtifactKind::Client,
    }];

    for library in &descriptor.libraries {
        if !library.is_allowed(platform) {
            debug!("Skipping library (OS rule): {}", library.name);
            continue;
        }

        if let (Some(artifact), Some(relative)) = (library.artifact(), library.artifact_path()) {
            match layout.library_path(&relative) {
                Some(path) => artifacts.push(ResolvedArtifact {
                    label: library.name.clone(),
                    url: artifact.url.clone(),
                    path,
                    sha1: artifact.sha1.clone(),
                    kind: ArtifactKind::Library,
                }),
                None => warn!("Skipping library {} with unsafe path {:?}", library.name, relative),
            }
        }

        if let Some((classifier, native)) = library.native_artifact(platform) {
            let file_name = native
                .path
                .as_deref()
                .and_then(|p| p.rsplit(['/', '\\']).next())
                .filter(|name| !name.is_empty() && *name != "." && *name != "..")
                .map(ToString::to_string)
                .unwrap_or_else(|| format!("{classifier}.jar"));

            artifacts.push(ResolvedArtifact {
                label: format!("{} ({classifier})", library.name),
                url: native.url.clone(),
                path: layout.natives_dir(&descriptor.id).join(file_name),
                sha1: native.sha1.clone(),
                kind: ArtifactKind::Native {
                    classifier,
                    excludes: library.extract_excludes().to_vec(),
                },
            });
        }
    }

    Ok(artifacts)
}
