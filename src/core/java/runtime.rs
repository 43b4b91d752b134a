use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, info, instrument, warn};

use crate::core::error::{LauncherError, LauncherResult};
use crate::core::version::platform::Platform;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JavaInstallation {
    pub path: PathBuf,
    pub version: String,
    pub major: u32,
}

/// Finds a Java binary new enough for a version.
///
/// Candidates, in order: the configured path, `java` on `PATH`, then the
/// newest `jdk-*` runtime installed under the launcher's `java/` directory.
#[derive(Debug, Clone)]
pub struct JavaLocator {
    explicit: Option<PathBuf>,
    java_dir: PathBuf,
    platform: Platform,
}

impl JavaLocator {
    pub fn new(explicit: Option<PathBuf>, java_dir: impl Into<PathBuf>, platform: Platform) -> Self {
        Self {
            explicit,
            java_dir: java_dir.into(),
            platform,
        }
    }

    pub fn candidates(&self) -> Vec<PathBuf> {
        let mut candidates = Vec::new();
        if let Some(explicit) = &self.explicit {
            candidates.push(explicit.clone());
        }
        candidates.push(PathBuf::from(self.platform.java_executable()));
        candidates.extend(installed_runtimes(&self.java_dir, &self.platform));
        candidates
    }

    /// First candidate whose reported major is at least `required_major`.
    #[instrument(skip(self))]
    pub async fn locate(&self, required_major: u32) -> LauncherResult<JavaInstallation> {
        let candidates = self.candidates();
        let found = tokio::task::spawn_blocking(move || {
            candidates
                .iter()
                .filter_map(|candidate| inspect_java(candidate))
                .find(|install| {
                    let ok = install.major >= required_major;
                    if !ok {
                        debug!(
                            "Java {:?} is {} (< {}), skipping",
                            install.path, install.version, required_major
                        );
                    }
                    ok
                })
        })
        .await
        .map_err(|e| LauncherError::JavaExecution(e.to_string()))?;

        match found {
            Some(install) => {
                info!("Using Java {} at {:?}", install.version, install.path);
                Ok(install)
            }
            None => {
                warn!("No Java {} or newer found", required_major);
                Err(LauncherError::JavaNotFound(required_major))
            }
        }
    }
}

/// Binaries of runtimes under `java_dir`, newest first.
pub fn installed_runtimes(java_dir: &Path, platform: &Platform) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(java_dir) else {
        return Vec::new();
    };

    let mut roots: Vec<(String, PathBuf)> = entries
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .filter_map(|entry| {
            let name = entry.file_name().to_string_lossy().to_string();
            let version = name.strip_prefix("jdk")?.trim_start_matches('-').to_string();
            Some((version, entry.path()))
        })
        .collect();
    roots.sort_by(|(a, _), (b, _)| compare_java_versions(b, a));

    roots
        .into_iter()
        .map(|(_, root)| locate_java_binary(&root, platform))
        .filter(|bin| bin.exists())
        .collect()
}

/// `bin/java` inside a runtime root, accounting for the macOS bundle layout.
pub fn locate_java_binary(runtime_root: &Path, platform: &Platform) -> PathBuf {
    let exe = platform.java_executable();
    let primary = runtime_root.join("bin").join(exe);
    if primary.exists() {
        return primary;
    }
    let mac_layout = runtime_root
        .join("Contents")
        .join("Home")
        .join("bin")
        .join(exe);
    if mac_layout.exists() {
        return mac_layout;
    }
    primary
}

/// Run `java -version` and parse what it reports.
pub fn inspect_java(path: &Path) -> Option<JavaInstallation> {
    let output = Command::new(path)
        .args(["-XshowSettings:properties", "-version"])
        .output()
        .ok()?;

    let text = format!(
        "{}\n{}",
        String::from_utf8_lossy(&output.stderr),
        String::from_utf8_lossy(&output.stdout)
    );
    debug!("Probing {:?}: {}", path, text.lines().next().unwrap_or(""));

    let version = parse_version_string(&text)?;
    let major = parse_major_version(&version)?;
    Some(JavaInstallation {
        path: path.to_path_buf(),
        version,
        major,
    })
}

/// The first quoted token, e.g. `21.0.2` from `openjdk version "21.0.2" 2024-01-16`.
pub fn parse_version_string(output: &str) -> Option<String> {
    output.lines().find_map(|line| {
        let start = line.find('"')?;
        let rest = &line[start + 1..];
        let end = rest.find('"')?;
        Some(rest[..end].to_string())
    })
}

/// `1.8.0_382` -> 8, `21.0.2` -> 21, `17` -> 17.
pub fn parse_major_version(version: &str) -> Option<u32> {
    let mut parts = version.split(|c: char| c == '.' || c == '_' || c == '-' || c == '+');
    let first: u32 = parts.next()?.parse().ok()?;
    if first == 1 {
        parts.next()?.parse().ok()
    } else {
        Some(first)
    }
}

/// Fallback when a descriptor carries no `javaVersion`.
pub fn required_java_for_minecraft_version(minecraft_version: &str) -> u32 {
    let lower = minecraft_version.to_ascii_lowercase();
    if let Some((year, _)) = lower.split_once('w') {
        if let Ok(snapshot_year) = year.parse::<u32>() {
            return if snapshot_year >= 24 { 21 } else { 17 };
        }
    }

    let mut parts = minecraft_version.split('.');
    let major = parts.next().and_then(|p| p.parse::<u32>().ok()).unwrap_or(1);
    let minor = parts.next().and_then(|p| p.parse::<u32>().ok()).unwrap_or(20);
    let patch = parts.next().and_then(|p| p.parse::<u32>().ok()).unwrap_or(0);

    if major > 1 || minor >= 21 || (minor == 20 && patch >= 5) {
        21
    } else if minor >= 17 {
        17
    } else {
        8
    }
}

fn parse_java_version(version: &str) -> (u32, u32, u32, u32) {
    let cleaned = version.split('-').next().unwrap_or(version);
    let (core, build) = cleaned.split_once('+').unwrap_or((cleaned, "0"));
    let mut nums = core
        .split(['.', '_'])
        .filter_map(|part| part.parse::<u32>().ok())
        .collect::<Vec<_>>();
    nums.resize(3.max(nums.len()), 0);
    let build = build
        .split('.')
        .next()
        .and_then(|b| b.parse::<u32>().ok())
        .unwrap_or(0);
    (nums[0], nums[1], nums[2], build)
}

pub fn compare_java_versions(left: &str, right: &str) -> Ordering {
    parse_java_version(left).cmp(&parse_java_version(right))
}
