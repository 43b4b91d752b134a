// ─── BlockLaunch Core ───
// Manifest-driven resolution, fetching and launching of one game version.
//
// Architecture:
//   core/
//     http         Transport seam over reqwest
//     downloader/  Retrying fetcher with SHA-1 validation and progress
//     version/     Catalog, version descriptor, platform and rules
//     assets/      Asset index and content-addressed objects
//     install/     Artifact resolution, library fetch, native extraction
//     auth         Offline identity
//     java/        Runtime detection and local runtime install
//     launch/      Search path, placeholders, command and spawn
//     state/       Settings, directory layout, application facade

pub mod assets;
pub mod auth;
pub mod downloader;
pub mod error;
pub mod http;
pub mod install;
pub mod java;
pub mod launch;
pub mod state;
pub mod version;
