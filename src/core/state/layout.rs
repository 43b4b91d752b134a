// ─── Game Layout ───
// Every path under the launcher root.

use std::path::{Component, Path, PathBuf};

use tracing::debug;

use crate::core::error::{LauncherError, LauncherResult};

/// Directories created before a launch, relative to the root.
const GAME_DIRS: [&str; 6] = [
    "logs",
    "crash-reports",
    "saves",
    "resourcepacks",
    "assets/indexes",
    "assets/objects",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameLayout {
    root: PathBuf,
}

impl GameLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn versions_dir(&self) -> PathBuf {
        self.root.join("versions")
    }

    pub fn version_dir(&self, version_id: &str) -> PathBuf {
        self.versions_dir().join(version_id)
    }

    pub fn descriptor_path(&self, version_id: &str) -> PathBuf {
        self.version_dir(version_id)
            .join(format!("{version_id}.json"))
    }

    pub fn client_jar_path(&self, version_id: &str) -> PathBuf {
        self.version_dir(version_id)
            .join(format!("{version_id}.jar"))
    }

    pub fn natives_dir(&self, version_id: &str) -> PathBuf {
        self.version_dir(version_id).join("natives")
    }

    pub fn libraries_dir(&self) -> PathBuf {
        self.root.join("libraries")
    }

    /// `None` when `relative` would leave `libraries/`: absolute paths,
    /// `..` or any other non-plain component.
    pub fn library_path(&self, relative: &str) -> Option<PathBuf> {
        let relative = Path::new(relative);
        let plain = relative
            .components()
            .all(|part| matches!(part, Component::Normal(_)));
        if !plain || relative.as_os_str().is_empty() {
            return None;
        }
        Some(self.libraries_dir().join(relative))
    }

    pub fn assets_dir(&self) -> PathBuf {
        self.root.join("assets")
    }

    pub fn java_dir(&self) -> PathBuf {
        self.root.join("java")
    }

    pub fn options_path(&self) -> PathBuf {
        self.root.join("options.txt")
    }

    /// Create the working directories the game expects, plus an empty
    /// `logs/latest.log`.
    pub async fn prepare(&self) -> LauncherResult<()> {
        for dir in GAME_DIRS {
            let path = self.root.join(dir);
            tokio::fs::create_dir_all(&path)
                .await
                .map_err(|e| LauncherError::io(&path, e))?;
        }

        let latest_log = self.root.join("logs").join("latest.log");
        if !tokio::fs::try_exists(&latest_log).await.unwrap_or(false) {
            tokio::fs::write(&latest_log, b"")
                .await
                .map_err(|e| LauncherError::io(&latest_log, e))?;
        }

        debug!("Prepared game directory {:?}", self.root);
        Ok(())
    }
}
