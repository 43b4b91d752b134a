// ─── Platform ───
// OS and architecture keywords as the version manifests spell them.

use std::fmt;

/// Manifest OS keyword. macOS is `osx`, never the kernel name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OsName {
    Windows,
    Osx,
    Linux,
}

impl OsName {
    pub fn as_str(&self) -> &'static str {
        match self {
            OsName::Windows => "windows",
            OsName::Osx => "osx",
            OsName::Linux => "linux",
        }
    }

    /// Accepts both manifest keywords and kernel/`std` names.
    pub fn from_keyword(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "windows" => Some(OsName::Windows),
            "osx" | "macos" | "darwin" => Some(OsName::Osx),
            "linux" => Some(OsName::Linux),
            _ => None,
        }
    }
}

impl fmt::Display for OsName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The platform rules and native classifiers are evaluated against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Platform {
    pub os: OsName,
    pub arch: String,
}

impl Platform {
    pub fn new(os: OsName, arch: impl Into<String>) -> Self {
        Self {
            os,
            arch: arch.into(),
        }
    }

    /// The running host. Unknown Unix flavours are treated as `linux`.
    pub fn current() -> Self {
        let os = OsName::from_keyword(std::env::consts::OS).unwrap_or(OsName::Linux);
        let arch = match std::env::consts::ARCH {
            "aarch64" => "arm64",
            other => other,
        };
        Self::new(os, arch)
    }

    /// Value substituted for `${arch}` in native classifiers.
    pub fn arch_bits(&self) -> &'static str {
        match self.arch.as_str() {
            "x86" | "arm" => "32",
            _ => "64",
        }
    }

    pub fn classpath_separator(&self) -> &'static str {
        match self.os {
            OsName::Windows => ";",
            _ => ":",
        }
    }

    pub fn java_executable(&self) -> &'static str {
        match self.os {
            OsName::Windows => "java.exe",
            _ => "java",
        }
    }
}
