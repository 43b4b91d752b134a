pub mod install;
pub mod runtime;

pub use install::{JavaInstaller, DEFAULT_JAVA_MAJOR};
pub use runtime::{required_java_for_minecraft_version, JavaInstallation, JavaLocator};
