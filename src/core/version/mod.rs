pub mod manifest;
pub mod platform;
pub mod rules;
pub mod version_file;

pub use manifest::{CatalogError, VersionCatalog, VersionCatalogEntry, VersionCategory, VersionType};
pub use platform::{OsName, Platform};
pub use rules::{argument_allowed, library_allowed, Rule, RuleAction};
pub use version_file::{LaunchArguments, LibrarySpec, VersionDescriptor};
