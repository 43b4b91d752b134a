// ─── Native Extraction ───
// Unpacks native archives into versions/<id>/natives without disturbing
// files already extracted from other archives.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::core::error::{LauncherError, LauncherResult};

/// Marker recording that the archive identified by `key` was extracted.
pub fn marker_path(natives_dir: &Path, key: &str) -> PathBuf {
    natives_dir.join(format!(".{key}.extracted"))
}

pub async fn is_extracted(natives_dir: &Path, key: &str) -> bool {
    tokio::fs::try_exists(marker_path(natives_dir, key))
        .await
        .unwrap_or(false)
}

/// Extract `archive` into `natives_dir`, delete the archive and write the
/// marker for `key`. Returns the number of files extracted.
pub async fn extract_native_archive(
    archive: &Path,
    natives_dir: &Path,
    excludes: &[String],
    key: &str,
) -> LauncherResult<usize> {
    let archive = archive.to_path_buf();
    let natives_dir = natives_dir.to_path_buf();
    let excludes = excludes.to_vec();
    let key = key.to_string();

    tokio::task::spawn_blocking(move || extract_blocking(&archive, &natives_dir, &excludes, &key))
        .await
        .map_err(|e| LauncherError::io(PathBuf::new(), io::Error::other(e)))?
}

fn extract_blocking(
    archive: &Path,
    natives_dir: &Path,
    excludes: &[String],
    key: &str,
) -> LauncherResult<usize> {
    let stem = archive
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| key.to_string());
    let staging = natives_dir.join(format!(".staging-{stem}"));

    if staging.exists() {
        let _ = fs::remove_dir_all(&staging);
    }

    let result = unpack(archive, &staging, excludes)
        .and_then(|count| move_into(&staging, natives_dir).map(|()| count));
    let _ = fs::remove_dir_all(&staging);
    let count = result?;

    fs::remove_file(archive).map_err(|e| LauncherError::io(archive, e))?;
    let marker = marker_path(natives_dir, key);
    fs::write(&marker, b"").map_err(|e| LauncherError::io(&marker, e))?;

    debug!("Extracted {} native files from {:?}", count, archive);
    Ok(count)
}

fn unpack(archive: &Path, staging: &Path, excludes: &[String]) -> LauncherResult<usize> {
    let file = fs::File::open(archive).map_err(|e| LauncherError::io(archive, e))?;
    let mut zip = zip::ZipArchive::new(io::BufReader::new(file))?;
    fs::create_dir_all(staging).map_err(|e| LauncherError::io(staging, e))?;

    let mut count = 0;
    for i in 0..zip.len() {
        let mut entry = zip.by_index(i)?;
        let name = entry.name().to_string();

        if is_excluded(&name, excludes) {
            continue;
        }
        let Some(relative) = entry.enclosed_name() else {
            warn!("Skipping unsafe entry {:?} in {:?}", name, archive);
            continue;
        };
        let target = staging.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&target).map_err(|e| LauncherError::io(&target, e))?;
            continue;
        }
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| LauncherError::io(parent, e))?;
        }
        let mut out = fs::File::create(&target).map_err(|e| LauncherError::io(&target, e))?;
        io::copy(&mut entry, &mut out).map_err(|e| LauncherError::io(&target, e))?;
        count += 1;
    }

    Ok(count)
}

fn is_excluded(name: &str, excludes: &[String]) -> bool {
    name.starts_with("META-INF/") || excludes.iter().any(|prefix| name.starts_with(prefix.as_str()))
}

fn move_into(staging: &Path, target: &Path) -> LauncherResult<()> {
    for entry in fs::read_dir(staging).map_err(|e| LauncherError::io(staging, e))? {
        let entry = entry.map_err(|e| LauncherError::io(staging, e))?;
        let from = entry.path();
        let to = target.join(entry.file_name());
        let file_type = entry.file_type().map_err(|e| LauncherError::io(&from, e))?;

        if file_type.is_dir() {
            fs::create_dir_all(&to).map_err(|e| LauncherError::io(&to, e))?;
            move_into(&from, &to)?;
        } else {
            fs::rename(&from, &to).map_err(|e| LauncherError::io(&to, e))?;
        }
    }
    Ok(())
}
