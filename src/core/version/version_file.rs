// ─── Version Descriptor ───
// Parses a per-version JSON. Manifest shapes from every era land in one type;
// the argument layout is decided once here, never re-inspected downstream.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use super::platform::Platform;
use super::rules::{argument_allowed, library_allowed, Rule};
use crate::core::error::{LauncherError, LauncherResult};

pub const DEFAULT_MAIN_CLASS: &str = "net.minecraft.client.main.Main";

/// A fully parsed version JSON.
#[derive(Debug, Clone, Deserialize)]
#[serde(from = "RawVersionDescriptor")]
pub struct VersionDescriptor {
    pub id: String,
    /// `release`, `snapshot`, ... Fed to `${version_type}`.
    pub version_type: Option<String>,
    pub main_class: String,
    pub downloads: VersionDownloads,
    pub libraries: Vec<LibrarySpec>,
    pub arguments: LaunchArguments,
    pub asset_index: Option<AssetIndexRef>,
    /// Legacy `assets` field naming the index when `assetIndex` is absent.
    pub assets: Option<String>,
    pub java_version: Option<JavaVersionInfo>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VersionDownloads {
    #[serde(default)]
    pub client: Option<DownloadArtifact>,
    #[serde(default)]
    pub server: Option<DownloadArtifact>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct DownloadArtifact {
    pub url: String,
    #[serde(default)]
    pub sha1: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AssetIndexRef {
    pub id: String,
    pub url: String,
    #[serde(default)]
    pub sha1: Option<String>,
    #[serde(default)]
    pub total_size: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JavaVersionInfo {
    pub major_version: u32,
    #[serde(default)]
    pub component: Option<String>,
}

/// Launch arguments in whichever layout the descriptor uses.
#[derive(Debug, Clone, PartialEq)]
pub enum LaunchArguments {
    /// `arguments.jvm` / `arguments.game` (1.13 and later).
    Structured {
        jvm: Vec<ArgumentEntry>,
        game: Vec<ArgumentEntry>,
    },
    /// `minecraftArguments`, one space separated string of program arguments.
    Legacy(String),
    None,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ArgumentEntry {
    Literal(String),
    Conditional {
        rules: Vec<Rule>,
        value: ArgumentValue,
    },
    /// Anything else a future manifest might carry. Contributes nothing.
    Unknown(serde_json::Value),
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum ArgumentValue {
    One(String),
    Many(Vec<String>),
}

impl ArgumentEntry {
    /// Values this entry contributes on `platform`.
    pub fn values<'a>(&'a self, platform: &Platform) -> Vec<&'a str> {
        match self {
            ArgumentEntry::Literal(arg) => vec![arg.as_str()],
            ArgumentEntry::Conditional { rules, value } => {
                if !argument_allowed(rules, platform) {
                    return Vec::new();
                }
                match value {
                    ArgumentValue::One(arg) => vec![arg.as_str()],
                    ArgumentValue::Many(args) => args.iter().map(String::as_str).collect(),
                }
            }
            ArgumentEntry::Unknown(_) => Vec::new(),
        }
    }
}

impl LaunchArguments {
    pub fn jvm(&self, platform: &Platform) -> Vec<String> {
        match self {
            LaunchArguments::Structured { jvm, .. } => collect_values(jvm, platform),
            LaunchArguments::Legacy(_) | LaunchArguments::None => Vec::new(),
        }
    }

    pub fn game(&self, platform: &Platform) -> Vec<String> {
        match self {
            LaunchArguments::Structured { game, .. } => collect_values(game, platform),
            LaunchArguments::Legacy(flat) => {
                flat.split_whitespace().map(ToString::to_string).collect()
            }
            LaunchArguments::None => Vec::new(),
        }
    }
}

fn collect_values(entries: &[ArgumentEntry], platform: &Platform) -> Vec<String> {
    entries
        .iter()
        .flat_map(|entry| entry.values(platform))
        .map(ToString::to_string)
        .collect()
}

// ─── Library Entry ───

#[derive(Debug, Clone, Deserialize)]
pub struct LibrarySpec {
    pub name: String,
    #[serde(default)]
    pub downloads: Option<LibraryDownloads>,
    #[serde(default)]
    pub rules: Vec<Rule>,
    /// OS keyword -> classifier, possibly holding `${arch}`.
    #[serde(default)]
    pub natives: HashMap<String, String>,
    #[serde(default)]
    pub extract: Option<ExtractRules>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LibraryDownloads {
    #[serde(default)]
    pub artifact: Option<LibraryArtifact>,
    #[serde(default)]
    pub classifiers: HashMap<String, LibraryArtifact>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct LibraryArtifact {
    #[serde(default)]
    pub path: Option<String>,
    pub url: String,
    #[serde(default)]
    pub sha1: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExtractRules {
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl LibrarySpec {
    pub fn is_allowed(&self, platform: &Platform) -> bool {
        library_allowed(&self.rules, platform)
    }

    /// Platform-agnostic jar, if the library has one.
    pub fn artifact(&self) -> Option<&LibraryArtifact> {
        self.downloads.as_ref()?.artifact.as_ref()
    }

    /// Path of the main jar relative to `libraries/`. Falls back to the
    /// Maven layout of `name` when the manifest omits it.
    pub fn artifact_path(&self) -> Option<String> {
        let artifact = self.artifact()?;
        artifact
            .path
            .clone()
            .or_else(|| maven_relative_path(&self.name, None))
    }

    /// Native classifier for `platform`, `${arch}` substituted.
    pub fn native_classifier(&self, platform: &Platform) -> Option<String> {
        self.natives
            .get(platform.os.as_str())
            .map(|classifier| classifier.replace("${arch}", platform.arch_bits()))
    }

    /// Native archive for `platform` with its classifier.
    pub fn native_artifact(&self, platform: &Platform) -> Option<(String, &LibraryArtifact)> {
        let classifier = self.native_classifier(platform)?;
        let artifact = self.downloads.as_ref()?.classifiers.get(&classifier)?;
        Some((classifier, artifact))
    }

    pub fn extract_excludes(&self) -> &[String] {
        self.extract
            .as_ref()
            .map(|rules| rules.exclude.as_slice())
            .unwrap_or(&[])
    }
}

/// `group:artifact:version[:classifier]` -> `group/path/artifact/version/artifact-version[-classifier].jar`.
pub fn maven_relative_path(coordinate: &str, classifier: Option<&str>) -> Option<String> {
    let (coordinate, packaging) = match coordinate.rsplit_once('@') {
        Some((coord, ext)) => (coord, ext),
        None => (coordinate, "jar"),
    };
    let parts: Vec<&str> = coordinate.split(':').collect();
    let (group, artifact, version, own_classifier) = match parts.as_slice() {
        [g, a, v] => (*g, *a, *v, None),
        [g, a, v, c] => (*g, *a, *v, Some(*c)),
        _ => return None,
    };
    let filename = match classifier.or(own_classifier) {
        Some(c) => format!("{artifact}-{version}-{c}.{packaging}"),
        None => format!("{artifact}-{version}.{packaging}"),
    };
    Some(format!(
        "{}/{artifact}/{version}/{filename}",
        group.replace('.', "/")
    ))
}

// ─── Parsing ───

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawVersionDescriptor {
    id: String,
    #[serde(rename = "type", default)]
    version_type: Option<String>,
    #[serde(default)]
    main_class: Option<String>,
    #[serde(default)]
    downloads: VersionDownloads,
    #[serde(default)]
    libraries: Vec<LibrarySpec>,
    #[serde(default)]
    arguments: Option<RawArguments>,
    #[serde(default)]
    minecraft_arguments: Option<String>,
    #[serde(default)]
    asset_index: Option<AssetIndexRef>,
    #[serde(default)]
    assets: Option<String>,
    #[serde(default)]
    java_version: Option<JavaVersionInfo>,
}

#[derive(Deserialize)]
struct RawArguments {
    #[serde(default)]
    jvm: Vec<ArgumentEntry>,
    #[serde(default)]
    game: Vec<ArgumentEntry>,
}

impl From<RawVersionDescriptor> for VersionDescriptor {
    fn from(raw: RawVersionDescriptor) -> Self {
        let arguments = match (raw.arguments, raw.minecraft_arguments) {
            (Some(args), _) => LaunchArguments::Structured {
                jvm: args.jvm,
                game: args.game,
            },
            (None, Some(flat)) => LaunchArguments::Legacy(flat),
            (None, None) => LaunchArguments::None,
        };

        Self {
            id: raw.id,
            version_type: raw.version_type,
            main_class: raw
                .main_class
                .unwrap_or_else(|| DEFAULT_MAIN_CLASS.to_string()),
            downloads: raw.downloads,
            libraries: raw.libraries,
            arguments,
            asset_index: raw.asset_index,
            assets: raw.assets,
            java_version: raw.java_version,
        }
    }
}

impl VersionDescriptor {
    pub fn parse(raw: &str) -> LauncherResult<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub async fn load_from(path: &Path) -> LauncherResult<Self> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| LauncherError::io(path, e))?;
        Self::parse(&raw)
    }

    /// The client jar. Every launchable descriptor has one.
    pub fn client(&self) -> LauncherResult<&DownloadArtifact> {
        self.downloads.client.as_ref().ok_or_else(|| {
            LauncherError::Manifest(format!("version {} has no client download", self.id))
        })
    }

    /// Index id for `${assets_index_name}`; `legacy` when the descriptor names none.
    pub fn asset_index_id(&self) -> &str {
        self.asset_index
            .as_ref()
            .map(|index| index.id.as_str())
            .or(self.assets.as_deref())
            .unwrap_or("legacy")
    }

    pub fn required_java_major(&self) -> Option<u32> {
        self.java_version.as_ref().map(|j| j.major_version)
    }

    pub fn allowed_libraries<'a>(
        &'a self,
        platform: &'a Platform,
    ) -> impl Iterator<Item = &'a LibrarySpec> + 'a {
        self.libraries.iter().filter(move |lib| lib.is_allowed(platform))
    }
}
