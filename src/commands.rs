use std::path::PathBuf;

use tracing::{info, warn};

use blocklaunch::core::launch::LaunchOptions;
use blocklaunch::core::version::manifest::VersionCategory;
use blocklaunch::{AppState, LauncherError, LauncherResult};

pub async fn versions(root: PathBuf, category: Option<String>) -> LauncherResult<()> {
    let wanted = match category {
        Some(raw) => vec![VersionCategory::from_label(&raw)
            .ok_or_else(|| LauncherError::InvalidArgument(format!("unknown category {raw:?}")))?],
        None => VersionCategory::ALL.to_vec(),
    };

    let state = AppState::new(root)?;
    let categorized = state.load_catalog().await?.categorize();
    for category in wanted {
        let ids = categorized.get(category);
        println!("{} ({})", category, ids.len());
        for id in ids {
            println!("  {id}");
        }
    }
    Ok(())
}

pub async fn install(root: PathBuf, version: String) -> LauncherResult<()> {
    let state = AppState::new(root)?;
    let report = state.resolve_and_fetch(&version).await?;

    println!(
        "{}: {} libraries downloaded, {} already present, {} natives extracted",
        report.version_id,
        report.libraries_fetched,
        report.libraries_present,
        report.natives_extracted
    );
    for label in &report.libraries_failed {
        println!("  missing: {label}");
    }
    if !report.assets_ok {
        println!("  assets incomplete; the game may lack sounds or textures");
    }
    Ok(())
}

pub async fn command(
    root: PathBuf,
    version: String,
    username: String,
    memory: u32,
) -> LauncherResult<()> {
    let state = AppState::new(root)?;
    let command = state
        .compose(&version, &LaunchOptions::new(username, memory))
        .await?;
    println!("{command}");
    Ok(())
}

pub async fn launch(
    root: PathBuf,
    version: String,
    username: String,
    memory: u32,
    fps: u32,
) -> LauncherResult<()> {
    let state = AppState::new(root)?;
    state.prepare_game_dir().await?;
    state.tune_options(fps).await?;

    let report = state.resolve_and_fetch(&version).await?;
    if !report.libraries_failed.is_empty() {
        warn!(
            "{} libraries could not be downloaded; the game may not start",
            report.libraries_failed.len()
        );
    }

    let command = state
        .compose_or_install_java(&version, &LaunchOptions::new(username, memory))
        .await?;
    let mut child = state.launch(&command)?;
    let status = child
        .wait()
        .await
        .map_err(|e| LauncherError::JavaExecution(e.to_string()))?;
    info!("Game exited with {}", status);
    Ok(())
}

pub async fn java_install(root: PathBuf, major: u32) -> LauncherResult<()> {
    let state = AppState::new(root)?;
    let java = state.install_java(major).await?;
    println!("Java {} installed at {}", major, java.display());
    Ok(())
}
