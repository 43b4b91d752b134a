// ─── Launch Task ───
// Composes the game command line and spawns it.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use tracing::{debug, info, instrument};

use super::arguments::PlaceholderTable;
use super::classpath::{build_search_path, join_search_path, safe_path_str};
use crate::core::auth::LaunchAccountProfile;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::java::runtime::{required_java_for_minecraft_version, JavaLocator};
use crate::core::state::layout::GameLayout;
use crate::core::version::platform::{OsName, Platform};
use crate::core::version::version_file::VersionDescriptor;

pub const LAUNCHER_NAME: &str = "blocklaunch";
pub const LAUNCHER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// A fully composed process invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchCommand {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub working_dir: PathBuf,
    pub env: Vec<(String, String)>,
}

impl LaunchCommand {
    /// Program followed by its arguments.
    pub fn argv(&self) -> Vec<String> {
        std::iter::once(safe_path_str(&self.program))
            .chain(self.args.iter().cloned())
            .collect()
    }
}

impl fmt::Display for LaunchCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let line = self
            .argv()
            .iter()
            .map(|arg| shell_escape(arg))
            .collect::<Vec<_>>()
            .join(" ");
        f.write_str(&line)
    }
}

/// What the player asked for.
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    pub username: String,
    pub memory_gb: u32,
    /// Defaults to `versions/<id>/natives`.
    pub natives_dir: Option<PathBuf>,
}

impl LaunchOptions {
    pub fn new(username: impl Into<String>, memory_gb: u32) -> Self {
        Self {
            username: username.into(),
            memory_gb,
            natives_dir: None,
        }
    }
}

pub struct Composer {
    layout: GameLayout,
    platform: Platform,
    locator: JavaLocator,
    min_java_major: Option<u32>,
}

impl Composer {
    pub fn new(
        layout: GameLayout,
        platform: Platform,
        locator: JavaLocator,
        min_java_major: Option<u32>,
    ) -> Self {
        Self {
            layout,
            platform,
            locator,
            min_java_major,
        }
    }

    pub fn required_java_major(&self, descriptor: &VersionDescriptor) -> u32 {
        self.min_java_major
            .or_else(|| descriptor.required_java_major())
            .unwrap_or_else(|| required_java_for_minecraft_version(&descriptor.id))
    }

    /// Fails with a configuration error when no suitable Java is found.
    #[instrument(skip_all, fields(version = %descriptor.id))]
    pub async fn compose(
        &self,
        descriptor: &VersionDescriptor,
        options: &LaunchOptions,
    ) -> LauncherResult<LaunchCommand> {
        let java = self
            .locator
            .locate(self.required_java_major(descriptor))
            .await?;
        let natives_dir = options
            .natives_dir
            .clone()
            .unwrap_or_else(|| self.layout.natives_dir(&descriptor.id));
        let account = LaunchAccountProfile::offline(&options.username);

        let args = self.arguments(descriptor, &account, options.memory_gb, &natives_dir)?;
        let command = LaunchCommand {
            program: java.path,
            args,
            working_dir: self.layout.root().to_path_buf(),
            env: vec![native_library_env(&self.platform, &natives_dir)],
        };
        debug!("Command (copy/paste): {}", command);
        Ok(command)
    }

    /// Flags, entry point, then program arguments.
    pub fn arguments(
        &self,
        descriptor: &VersionDescriptor,
        account: &LaunchAccountProfile,
        memory_gb: u32,
        natives_dir: &Path,
    ) -> LauncherResult<Vec<String>> {
        if memory_gb == 0 {
            return Err(LauncherError::InvalidArgument(
                "memory limit must be at least 1 GB".into(),
            ));
        }

        let search_path = join_search_path(
            &build_search_path(descriptor, &self.layout, &self.platform),
            &self.platform,
        );
        let table = self.placeholders(descriptor, account, natives_dir, &search_path);

        let raw_jvm = descriptor.arguments.jvm(&self.platform);
        let mentions = |needle: &str| raw_jvm.iter().any(|arg| arg.contains(needle));
        let descriptor_jvm = table.apply(&raw_jvm);
        let mut args = vec![format!("-Xmx{memory_gb}G")];

        if self.platform.os == OsName::Osx
            && !descriptor_jvm.iter().any(|a| a == "-XstartOnFirstThread")
        {
            args.push("-XstartOnFirstThread".into());
        }
        if !mentions("-Djava.library.path") {
            args.push(format!(
                "-Djava.library.path={}",
                safe_path_str(natives_dir)
            ));
        }
        args.extend(descriptor_jvm);
        if !mentions("${classpath}") {
            args.push("-cp".into());
            args.push(search_path);
        }

        args.push(descriptor.main_class.clone());
        args.extend(table.apply(&descriptor.arguments.game(&self.platform)));
        Ok(args)
    }

    fn placeholders(
        &self,
        descriptor: &VersionDescriptor,
        account: &LaunchAccountProfile,
        natives_dir: &Path,
        search_path: &str,
    ) -> PlaceholderTable {
        let root = safe_path_str(self.layout.root());
        let assets = safe_path_str(&self.layout.assets_dir());

        PlaceholderTable::new()
            .set("auth_player_name", account.username.clone())
            .set("version_name", descriptor.id.clone())
            .set("game_directory", root)
            .set("assets_root", assets.clone())
            .set("game_assets", assets)
            .set("assets_index_name", descriptor.asset_index_id())
            .set("auth_uuid", account.uuid.clone())
            .set("auth_access_token", account.access_token.clone())
            .set("auth_session", account.access_token.clone())
            .set("auth_xuid", account.xuid.clone())
            .set("user_type", account.user_type.clone())
            .set(
                "version_type",
                descriptor.version_type.clone().unwrap_or_else(|| "release".into()),
            )
            .set("user_properties", "{}")
            .set("clientid", account.client_id.clone())
            .set("quickPlayRealms", "")
            .set("natives_directory", safe_path_str(natives_dir))
            .set("library_directory", safe_path_str(&self.layout.libraries_dir()))
            .set("classpath", search_path)
            .set("classpath_separator", self.platform.classpath_separator())
            .set("launcher_name", LAUNCHER_NAME)
            .set("launcher_version", LAUNCHER_VERSION)
    }
}

/// Spawn `command` with inherited standard streams.
pub fn launch(command: &LaunchCommand) -> LauncherResult<tokio::process::Child> {
    launch_with(command, Stdio::inherit, Stdio::inherit)
}

pub fn launch_with(
    command: &LaunchCommand,
    stdout: impl FnOnce() -> Stdio,
    stderr: impl FnOnce() -> Stdio,
) -> LauncherResult<tokio::process::Child> {
    let mut cmd = tokio::process::Command::new(&command.program);
    cmd.args(&command.args)
        .current_dir(&command.working_dir)
        .envs(command.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .stdin(Stdio::null())
        .stdout(stdout())
        .stderr(stderr());

    info!("Launching with Java: {:?}", command.program);
    cmd.spawn()
        .map_err(|e| LauncherError::JavaExecution(format!("{:?}: {}", command.program, e)))
}

/// Library-path variable with the natives directory prepended.
fn native_library_env(platform: &Platform, natives_dir: &Path) -> (String, String) {
    let var = match platform.os {
        OsName::Windows => "PATH",
        OsName::Osx => "DYLD_LIBRARY_PATH",
        OsName::Linux => "LD_LIBRARY_PATH",
    };
    let native_path = safe_path_str(natives_dir);
    let value = match std::env::var(var) {
        Ok(existing) if !existing.trim().is_empty() => {
            format!("{}{}{}", native_path, platform.classpath_separator(), existing)
        }
        _ => native_path,
    };
    (var.to_string(), value)
}

fn shell_escape(raw: &str) -> String {
    if raw.is_empty() {
        return "\"\"".to_string();
    }

    if raw.chars().all(|ch| {
        ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.' | '/' | ':' | '\\' | '=')
    }) {
        return raw.to_string();
    }

    format!("\"{}\"", raw.replace('"', "\\\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODERN: &str = r#"{
        "id": "1.20.4",
        "type": "release",
        "mainClass": "net.minecraft.client.main.Main",
        "assetIndex": {"id": "12", "url": "https://example.invalid/12.json"},
        "downloads": {"client": {"url": "https://example.invalid/client.jar"}},
        "arguments": {
            "jvm": [
                {"rules": [{"action": "allow", "os": {"name": "osx"}}], "value": ["-XstartOnFirstThread"]},
                "-Djava.library.path=${natives_directory}",
                "-Dminecraft.launcher.brand=${launcher_name}",
                "-cp", "${classpath}"
            ],
            "game": [
                "--username", "${auth_player_name}",
                "--version", "${version_name}",
                "--assetIndex", "${assets_index_name}",
                "--uuid", "${auth_uuid}",
                "--accessToken", "${auth_access_token}",
                "--clientId", "${clientid}",
                "--userType", "${user_type}",
                "--versionType", "${version_type}",
                {"rules": [{"action": "allow", "features": {"has_custom_resolution": true}}],
                 "value": ["--width", "${resolution_width}"]}
            ]
        }
    }"#;

    const LEGACY: &str = r#"{
        "id": "1.8.9",
        "mainClass": "net.minecraft.client.main.Main",
        "assets": "1.8",
        "downloads": {"client": {"url": "https://example.invalid/client.jar"}},
        "minecraftArguments": "--username ${auth_player_name} --session ${auth_session} --userProperties ${user_properties}"
    }"#;

    fn composer(root: &Path, os: OsName) -> Composer {
        let platform = Platform::new(os, "x86_64");
        let layout = GameLayout::new(root);
        let locator = JavaLocator::new(None, layout.java_dir(), platform.clone());
        Composer::new(layout, platform, locator, None)
    }

    #[test]
    fn modern_arguments_in_order() {
        let dir = tempfile::TempDir::new().unwrap();
        let composer = composer(dir.path(), OsName::Linux);
        let descriptor = VersionDescriptor::parse(MODERN).unwrap();
        let account = LaunchAccountProfile::offline("Alex");
        let natives = dir.path().join("versions/1.20.4/natives");

        let args = composer
            .arguments(&descriptor, &account, 4, &natives)
            .unwrap();

        let client = safe_path_str(&dir.path().join("versions/1.20.4/1.20.4.jar"));
        let expected: Vec<String> = vec![
            "-Xmx4G".into(),
            format!("-Djava.library.path={}", safe_path_str(&natives)),
            "-Dminecraft.launcher.brand=blocklaunch".into(),
            "-cp".into(),
            client,
            "net.minecraft.client.main.Main".into(),
            "--username".into(),
            "Alex".into(),
            "--version".into(),
            "1.20.4".into(),
            "--assetIndex".into(),
            "12".into(),
            "--uuid".into(),
            account.uuid.clone(),
            "--accessToken".into(),
            "0".into(),
            "--clientId".into(),
            "".into(),
            "--userType".into(),
            "legacy".into(),
            "--versionType".into(),
            "release".into(),
        ];
        assert_eq!(args, expected);
    }

    #[test]
    fn legacy_descriptor_gets_library_path_and_classpath() {
        let dir = tempfile::TempDir::new().unwrap();
        let composer = composer(dir.path(), OsName::Osx);
        let descriptor = VersionDescriptor::parse(LEGACY).unwrap();
        let account = LaunchAccountProfile::offline("bad name");
        let natives = dir.path().join("n");

        let args = composer
            .arguments(&descriptor, &account, 2, &natives)
            .unwrap();

        assert_eq!(args[0], "-Xmx2G");
        assert_eq!(args[1], "-XstartOnFirstThread");
        assert_eq!(args[2], format!("-Djava.library.path={}", safe_path_str(&natives)));
        assert_eq!(args[3], "-cp");
        assert_eq!(args[5], "net.minecraft.client.main.Main");
        assert_eq!(
            &args[6..],
            ["--username", "Player", "--session", "0", "--userProperties", "{}"]
        );
    }

    #[test]
    fn mac_first_thread_flag_is_not_duplicated() {
        let dir = tempfile::TempDir::new().unwrap();
        let composer = composer(dir.path(), OsName::Osx);
        let descriptor = VersionDescriptor::parse(MODERN).unwrap();
        let args = composer
            .arguments(
                &descriptor,
                &LaunchAccountProfile::default(),
                1,
                &dir.path().join("n"),
            )
            .unwrap();
        assert_eq!(
            args.iter().filter(|a| *a == "-XstartOnFirstThread").count(),
            1
        );
    }

    #[test]
    fn flags_gated_to_another_os_do_not_suppress_our_own() {
        let dir = tempfile::TempDir::new().unwrap();
        let composer = composer(dir.path(), OsName::Linux);
        let descriptor = VersionDescriptor::parse(
            r#"{"id": "1.20.4", "arguments": {"jvm": [
                {"rules": [{"action": "allow", "os": {"name": "osx"}}],
                 "value": ["-Djava.library.path=/Library/natives", "-cp", "${classpath}"]}
            ], "game": []}}"#,
        )
        .unwrap();
        let natives = dir.path().join("n");

        let args = composer
            .arguments(&descriptor, &LaunchAccountProfile::default(), 2, &natives)
            .unwrap();

        assert_eq!(args[1], format!("-Djava.library.path={}", safe_path_str(&natives)));
        assert_eq!(args[2], "-cp");
        assert!(args.iter().all(|a| !a.contains("/Library/natives")), "{args:?}");
    }

    #[test]
    fn zero_memory_is_rejected() {
        let dir = tempfile::TempDir::new().unwrap();
        let composer = composer(dir.path(), OsName::Linux);
        let descriptor = VersionDescriptor::parse(LEGACY).unwrap();
        assert!(composer
            .arguments(&descriptor, &LaunchAccountProfile::default(), 0, dir.path())
            .is_err());
    }

    #[test]
    fn argv_and_display() {
        let command = LaunchCommand {
            program: PathBuf::from("/usr/bin/java"),
            args: vec!["-Xmx2G".into(), "--title".into(), "My World".into()],
            working_dir: PathBuf::from("/tmp"),
            env: Vec::new(),
        };
        assert_eq!(command.argv(), vec!["/usr/bin/java", "-Xmx2G", "--title", "My World"]);
        assert_eq!(command.to_string(), "/usr/bin/java -Xmx2G --title \"My World\"");
    }

    #[test]
    fn library_path_env_prepends_natives() {
        let (var, value) =
            native_library_env(&Platform::new(OsName::Linux, "x86_64"), Path::new("/n"));
        assert_eq!(var, "LD_LIBRARY_PATH");
        assert!(value.starts_with("/n"));
    }

    #[test]
    fn required_major_prefers_override_then_descriptor() {
        let dir = tempfile::TempDir::new().unwrap();
        let descriptor = VersionDescriptor::parse(
            r#"{"id": "1.20.4", "javaVersion": {"majorVersion": 17}}"#,
        )
        .unwrap();
        assert_eq!(composer(dir.path(), OsName::Linux).required_java_major(&descriptor), 17);

        let layout = GameLayout::new(dir.path());
        let platform = Platform::new(OsName::Linux, "x86_64");
        let overridden = Composer::new(
            layout.clone(),
            platform.clone(),
            JavaLocator::new(None, layout.java_dir(), platform),
            Some(21),
        );
        assert_eq!(overridden.required_java_major(&descriptor), 21);

        let bare = VersionDescriptor::parse(r#"{"id": "1.12.2"}"#).unwrap();
        assert_eq!(composer(dir.path(), OsName::Linux).required_java_major(&bare), 8);
    }
}
