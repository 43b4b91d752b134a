// ─── Search Path Builder ───
// Client jar followed by every allowed library present on disk.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::core::state::layout::GameLayout;
use crate::core::version::platform::Platform;
use crate::core::version::version_file::VersionDescriptor;

/// Libraries are filtered by their rules again here, independent of what
/// resolution did, and only paths that exist are kept.
pub fn build_search_path(
    descriptor: &VersionDescriptor,
    layout: &GameLayout,
    platform: &Platform,
) -> Vec<PathBuf> {
    let mut entries = vec![layout.client_jar_path(&descriptor.id)];
    if !entries[0].exists() {
        warn!("Client jar {:?} is missing", entries[0]);
    }

    for library in &descriptor.libraries {
        if !library.is_allowed(platform) {
            continue;
        }
        let Some(path) = library
            .artifact_path()
            .and_then(|relative| layout.library_path(&relative))
        else {
            continue;
        };
        if path.exists() {
            entries.push(path);
        } else {
            debug!("Library {} not on disk, left out of classpath", library.name);
        }
    }

    dedup_preserving_order(&mut entries);
    entries
}

pub fn join_search_path(entries: &[PathBuf], platform: &Platform) -> String {
    entries
        .iter()
        .map(|path| safe_path_str(path))
        .collect::<Vec<_>>()
        .join(platform.classpath_separator())
}

fn dedup_preserving_order(entries: &mut Vec<PathBuf>) {
    let mut seen = HashSet::new();
    entries.retain(|entry| {
        let key = if cfg!(target_os = "windows") {
            entry.to_string_lossy().to_lowercase()
        } else {
            entry.to_string_lossy().to_string()
        };
        seen.insert(key)
    });
}

/// Path as a string, without the `\\?\` prefix Java chokes on.
pub fn safe_path_str(path: &Path) -> String {
    let text = path.to_string_lossy().to_string();
    match text.strip_prefix(r"\\?\") {
        Some(stripped) => stripped.to_string(),
        None => text,
    }
}
