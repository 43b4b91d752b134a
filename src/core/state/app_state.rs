use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info, instrument};

use super::layout::GameLayout;
use super::settings::LauncherSettings;
use crate::core::downloader::{Fetcher, ProgressSink, TracingProgress};
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::http::{HttpTransport, Transport};
use crate::core::install::{InstallReport, Installer};
use crate::core::java::{JavaInstaller, JavaLocator};
use crate::core::launch::{self, Composer, GameOptions, LaunchCommand, LaunchOptions};
use crate::core::version::manifest::{VersionCatalog, VersionCatalogEntry};
use crate::core::version::platform::Platform;
use crate::core::version::version_file::VersionDescriptor;

/// Everything a collaborator needs: one root, one transport, one fetcher.
pub struct AppState {
    pub layout: GameLayout,
    pub settings: LauncherSettings,
    pub platform: Platform,
    transport: Arc<dyn Transport>,
    fetcher: Fetcher,
}

impl AppState {
    /// Settings are read from `root`; progress goes to the log.
    pub fn new(root: impl Into<PathBuf>) -> LauncherResult<Self> {
        let root = root.into();
        let settings = LauncherSettings::load(&root);
        let transport = HttpTransport::new(&settings.user_agent).map_err(|e| {
            LauncherError::Transport {
                url: String::new(),
                source: e.into(),
            }
        })?;
        Ok(Self::with_transport(
            root,
            settings,
            Platform::current(),
            Arc::new(transport),
            Arc::new(TracingProgress),
        ))
    }

    pub fn with_transport(
        root: impl Into<PathBuf>,
        settings: LauncherSettings,
        platform: Platform,
        transport: Arc<dyn Transport>,
        progress: Arc<dyn ProgressSink>,
    ) -> Self {
        let fetcher = Fetcher::new(transport.clone(), settings.retry_policy(), progress);
        Self {
            layout: GameLayout::new(root),
            settings,
            platform,
            transport,
            fetcher,
        }
    }

    pub fn fetcher(&self) -> &Fetcher {
        &self.fetcher
    }

    pub async fn load_catalog(&self) -> LauncherResult<VersionCatalog> {
        Ok(VersionCatalog::fetch(
            self.transport.as_ref(),
            &self.settings.catalog_url,
            self.settings.catalog_timeout(),
        )
        .await?)
    }

    /// A descriptor already on disk is used as is. Otherwise the catalog is
    /// consulted, then [`Self::resolve_and_fetch_entry`].
    #[instrument(skip(self))]
    pub async fn resolve_and_fetch(&self, version_id: &str) -> LauncherResult<InstallReport> {
        let cached = self.layout.descriptor_path(version_id);
        match VersionDescriptor::load_from(&cached).await {
            Ok(descriptor) if descriptor.id == version_id => {
                debug!("Using descriptor on disk for {}", version_id);
                return self.installer().install_descriptor(&descriptor).await;
            }
            Ok(_) | Err(_) => {}
        }

        let catalog = self.load_catalog().await?;
        let entry = catalog
            .find_version(version_id)
            .ok_or_else(|| LauncherError::VersionNotFound(version_id.to_string()))?;
        self.resolve_and_fetch_entry(entry).await
    }

    pub async fn resolve_and_fetch_entry(
        &self,
        entry: &VersionCatalogEntry,
    ) -> LauncherResult<InstallReport> {
        self.installer().install_entry(entry).await
    }

    /// Compose against the descriptor already on disk.
    pub async fn compose(
        &self,
        version_id: &str,
        options: &LaunchOptions,
    ) -> LauncherResult<LaunchCommand> {
        let descriptor =
            VersionDescriptor::load_from(&self.layout.descriptor_path(version_id)).await?;
        self.composer().compose(&descriptor, options).await
    }

    /// [`Self::compose`], installing the required runtime once if none is found.
    pub async fn compose_or_install_java(
        &self,
        version_id: &str,
        options: &LaunchOptions,
    ) -> LauncherResult<LaunchCommand> {
        match self.compose(version_id, options).await {
            Err(LauncherError::JavaNotFound(major)) => {
                info!("No Java {} found, installing one", major);
                self.install_java(major).await?;
                self.compose(version_id, options).await
            }
            other => other,
        }
    }

    pub fn launch(&self, command: &LaunchCommand) -> LauncherResult<tokio::process::Child> {
        launch::launch(command)
    }

    /// Install a local runtime; the locator picks it up on the next compose.
    pub async fn install_java(&self, major: u32) -> LauncherResult<PathBuf> {
        JavaInstaller::new(
            self.transport.clone(),
            self.fetcher.clone(),
            self.layout.java_dir(),
            self.platform.clone(),
        )
        .install(major)
        .await
    }

    pub async fn prepare_game_dir(&self) -> LauncherResult<()> {
        self.layout.prepare().await
    }

    pub async fn tune_options(&self, fps: u32) -> LauncherResult<()> {
        let mut options = GameOptions::load(&self.layout.options_path()).await;
        options.apply_fps_limit(fps);
        options.save().await
    }

    pub fn installer(&self) -> Installer {
        Installer::new(
            self.fetcher.clone(),
            self.layout.clone(),
            self.platform.clone(),
            &self.settings.asset_base_url,
            self.settings.asset_concurrency,
        )
    }

    pub fn composer(&self) -> Composer {
        let locator = JavaLocator::new(
            self.settings.java_path.clone(),
            self.layout.java_dir(),
            self.platform.clone(),
        );
        Composer::new(
            self.layout.clone(),
            self.platform.clone(),
            locator,
            self.settings.min_java_major,
        )
    }
}
