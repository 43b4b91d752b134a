// ─── Runtime Installer ───
// Downloads a Temurin JDK from Adoptium into <root>/java.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use flate2::read::GzDecoder;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{info, instrument, warn};

use super::runtime::{installed_runtimes, locate_java_binary};
use crate::core::downloader::Fetcher;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::http::Transport;
use crate::core::version::platform::{OsName, Platform};

pub const ADOPTIUM_API_BASE: &str = "https://api.adoptium.net/v3/assets/latest";
pub const DEFAULT_JAVA_MAJOR: u32 = 21;
const API_TIMEOUT: Duration = Duration::from_secs(10);
const INSTALL_RECORD: &str = "installed_runtime.json";

#[derive(Debug, Clone, Deserialize)]
pub struct AdoptiumRelease {
    pub binary: AdoptiumBinary,
    #[serde(default)]
    pub release_name: Option<String>,
    pub version: AdoptiumVersion,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdoptiumBinary {
    pub package: AdoptiumPackage,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdoptiumPackage {
    pub checksum: String,
    pub link: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdoptiumVersion {
    pub openjdk_version: String,
}

/// Written next to the runtimes after a successful install.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstallRecord {
    pub major: u32,
    pub version: String,
    pub java_bin: PathBuf,
    pub source_url: String,
    pub installed_at: String,
}

pub struct JavaInstaller {
    transport: Arc<dyn Transport>,
    fetcher: Fetcher,
    java_dir: PathBuf,
    platform: Platform,
    api_base: String,
}

impl JavaInstaller {
    pub fn new(
        transport: Arc<dyn Transport>,
        fetcher: Fetcher,
        java_dir: impl Into<PathBuf>,
        platform: Platform,
    ) -> Self {
        Self {
            transport,
            fetcher,
            java_dir: java_dir.into(),
            platform,
            api_base: ADOPTIUM_API_BASE.to_string(),
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn release_url(&self, major: u32) -> String {
        format!(
            "{}/{}/hotspot?architecture={}&image_type=jdk&os={}",
            self.api_base,
            major,
            adoptium_arch(&self.platform),
            adoptium_os(&self.platform)
        )
    }

    /// Install the latest JDK of `major`. Returns the path of its `java` binary.
    #[instrument(skip(self))]
    pub async fn install(&self, major: u32) -> LauncherResult<PathBuf> {
        let release = self.latest_release(major).await?;
        let package = &release.binary.package;
        info!(
            "Installing Java {} ({})",
            major, release.version.openjdk_version
        );

        let file_name = package
            .name
            .clone()
            .or_else(|| package.link.rsplit('/').next().map(ToString::to_string))
            .filter(|name| !name.is_empty() && !name.contains(['/', '\\']) && name != "..")
            .unwrap_or_else(|| format!("jdk-{major}.archive"));
        let archive = self.java_dir.join(&file_name);

        self.fetcher
            .fetch_required(&package.link, &archive, &format!("Java {major} runtime"), None)
            .await?;

        let hashed = archive.clone();
        let actual = tokio::task::spawn_blocking(move || sha256_file(&hashed))
            .await
            .map_err(|e| LauncherError::io(&archive, io::Error::other(e)))??;
        if !actual.eq_ignore_ascii_case(package.checksum.trim()) {
            let _ = fs::remove_file(&archive);
            return Err(LauncherError::ChecksumMismatch {
                path: archive,
                expected: package.checksum.clone(),
                actual,
            });
        }

        let java_dir = self.java_dir.clone();
        let archive_path = archive.clone();
        tokio::task::spawn_blocking(move || extract_archive(&archive_path, &java_dir))
            .await
            .map_err(|e| LauncherError::io(&archive, io::Error::other(e)))??;
        let _ = fs::remove_file(&archive);

        let java_bin = match &release.release_name {
            Some(name) if self.java_dir.join(name).is_dir() => {
                locate_java_binary(&self.java_dir.join(name), &self.platform)
            }
            _ => installed_runtimes(&self.java_dir, &self.platform)
                .into_iter()
                .next()
                .ok_or(LauncherError::JavaNotFound(major))?,
        };
        if !java_bin.exists() {
            return Err(LauncherError::JavaNotFound(major));
        }
        make_executable(&java_bin)?;

        let record = InstallRecord {
            major,
            version: release.version.openjdk_version.clone(),
            java_bin: java_bin.clone(),
            source_url: package.link.clone(),
            installed_at: Utc::now().to_rfc3339(),
        };
        let record_path = self.java_dir.join(INSTALL_RECORD);
        if let Err(e) = fs::write(&record_path, serde_json::to_vec_pretty(&record)?) {
            warn!("Could not write {:?}: {}", record_path, e);
        }

        info!("Java {} installed at {:?}", major, java_bin);
        Ok(java_bin)
    }

    async fn latest_release(&self, major: u32) -> LauncherResult<AdoptiumRelease> {
        let url = self.release_url(major);
        let body = self
            .transport
            .get(&url, API_TIMEOUT)
            .await
            .map_err(|source| LauncherError::Transport {
                url: url.clone(),
                source,
            })?;
        let releases: Vec<AdoptiumRelease> = serde_json::from_slice(&body)?;
        releases.into_iter().next().ok_or_else(|| {
            LauncherError::UnsupportedPlatform(format!(
                "no Java {major} package for {} {}",
                self.platform.os, self.platform.arch
            ))
        })
    }
}

fn adoptium_os(platform: &Platform) -> &'static str {
    match platform.os {
        OsName::Windows => "windows",
        OsName::Osx => "mac",
        OsName::Linux => "linux",
    }
}

fn adoptium_arch(platform: &Platform) -> &str {
    match platform.arch.as_str() {
        "x86_64" | "amd64" => "x64",
        "arm64" | "aarch64" => "aarch64",
        other => other,
    }
}

/// Hex SHA-256 of the file, streamed rather than read whole.
fn sha256_file(path: &Path) -> LauncherResult<String> {
    let mut file = fs::File::open(path).map_err(|e| LauncherError::io(path, e))?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher).map_err(|e| LauncherError::io(path, e))?;
    Ok(hex::encode(hasher.finalize()))
}

/// Zip on Windows, tar.gz elsewhere; decided by the file name.
fn extract_archive(archive: &Path, dest: &Path) -> LauncherResult<()> {
    let is_zip = archive
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("zip"))
        .unwrap_or(false);
    if is_zip {
        extract_zip(archive, dest)
    } else {
        let file = fs::File::open(archive).map_err(|e| LauncherError::io(archive, e))?;
        tar::Archive::new(GzDecoder::new(file))
            .unpack(dest)
            .map_err(|e| LauncherError::io(dest, e))
    }
}

fn extract_zip(archive: &Path, dest: &Path) -> LauncherResult<()> {
    let file = fs::File::open(archive).map_err(|e| LauncherError::io(archive, e))?;
    let mut zip = zip::ZipArchive::new(file)?;

    for index in 0..zip.len() {
        let mut entry = zip.by_index(index)?;
        let Some(relative) = entry.enclosed_name() else {
            continue;
        };
        let out_path = dest.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&out_path).map_err(|e| LauncherError::io(&out_path, e))?;
            continue;
        }
        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent).map_err(|e| LauncherError::io(parent, e))?;
        }
        let mut out = fs::File::create(&out_path).map_err(|e| LauncherError::io(&out_path, e))?;
        io::copy(&mut entry, &mut out).map_err(|e| LauncherError::io(&out_path, e))?;
    }
    Ok(())
}

#[cfg(unix)]
fn make_executable(path: &Path) -> LauncherResult<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = fs::metadata(path)
        .map_err(|e| LauncherError::io(path, e))?
        .permissions();
    perms.set_mode(0o755);
    fs::set_permissions(path, perms).map_err(|e| LauncherError::io(path, e))
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> LauncherResult<()> {
    Ok(())
}
