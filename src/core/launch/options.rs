// ─── Game Options ───
// `options.txt` is `key:value` per line; lines are kept in order and
// anything not touched is written back verbatim.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::core::error::{LauncherError, LauncherResult};

#[derive(Debug, Clone, PartialEq, Eq)]
enum OptionLine {
    Pair(String, String),
    Raw(String),
}

#[derive(Debug, Clone)]
pub struct GameOptions {
    path: PathBuf,
    lines: Vec<OptionLine>,
}

impl GameOptions {
    /// An unreadable or missing file loads as empty.
    pub async fn load(path: &Path) -> Self {
        let raw = match tokio::fs::read_to_string(path).await {
            Ok(raw) => raw,
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!("Could not read {:?}: {}", path, e);
                }
                String::new()
            }
        };
        Self::parse(path, &raw)
    }

    pub fn parse(path: &Path, raw: &str) -> Self {
        let lines = raw
            .lines()
            .map(|line| match line.split_once(':') {
                Some((key, value)) if !key.is_empty() => {
                    OptionLine::Pair(key.to_string(), value.to_string())
                }
                _ => OptionLine::Raw(line.to_string()),
            })
            .collect();
        Self {
            path: path.to_path_buf(),
            lines,
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.lines.iter().find_map(|line| match line {
            OptionLine::Pair(k, v) if k == key => Some(v.as_str()),
            _ => None,
        })
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        let existing = self.lines.iter_mut().find_map(|line| match line {
            OptionLine::Pair(k, v) if k == key => Some(v),
            _ => None,
        });
        match existing {
            Some(slot) => *slot = value,
            None => self.lines.push(OptionLine::Pair(key.to_string(), value)),
        }
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            match line {
                OptionLine::Pair(k, v) => {
                    out.push_str(k);
                    out.push(':');
                    out.push_str(v);
                }
                OptionLine::Raw(raw) => out.push_str(raw),
            }
            out.push('\n');
        }
        out
    }

    pub async fn save(&self) -> LauncherResult<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| LauncherError::io(parent, e))?;
        }
        tokio::fs::write(&self.path, self.render())
            .await
            .map_err(|e| LauncherError::io(&self.path, e))
    }

    /// Cap the frame rate and turn vsync off.
    pub fn apply_fps_limit(&mut self, fps: u32) {
        self.set("maxFps", fps.to_string());
        self.set("enableVsync", "false");
        info!("Set maxFps to {} and disabled vsync", fps);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fps_limit_keeps_other_lines_in_place() {
        let raw = "version:3465\nmaxFps:260\nlang:en_us\n\nkey_key.jump:key.keyboard.space\n";
        let mut options = GameOptions::parse(Path::new("options.txt"), raw);
        options.apply_fps_limit(60);

        assert_eq!(
            options.render(),
            "version:3465\nmaxFps:60\nlang:en_us\n\nkey_key.jump:key.keyboard.space\nenableVsync:false\n"
        );
        assert_eq!(options.get("lang"), Some("en_us"));
    }

    #[tokio::test]
    async fn missing_file_is_created_on_save() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("options.txt");

        let mut options = GameOptions::load(&path).await;
        assert_eq!(options.get("maxFps"), None);
        options.apply_fps_limit(120);
        options.save().await.unwrap();

        let reloaded = GameOptions::load(&path).await;
        assert_eq!(reloaded.get("maxFps"), Some("120"));
        assert_eq!(reloaded.get("enableVsync"), Some("false"));
    }

    #[test]
    fn value_may_contain_colons() {
        let options = GameOptions::parse(Path::new("o"), "lastServer:play.example.org:25565");
        assert_eq!(options.get("lastServer"), Some("play.example.org:25565"));
    }
}
