// ─── Offline Identity ───
// Usernames and stable offline UUIDs; no identity service is contacted.

use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_USERNAME: &str = "Player";
const OFFLINE_PREFIX: &str = "OfflinePlayer:";

/// Identity fed to the launch placeholders.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LaunchAccountProfile {
    pub username: String,
    pub uuid: String,
    pub access_token: String,
    pub xuid: String,
    pub user_type: String,
    /// Left empty; offline launches have no client id.
    pub client_id: String,
}

impl Default for LaunchAccountProfile {
    fn default() -> Self {
        Self::offline(DEFAULT_USERNAME)
    }
}

impl LaunchAccountProfile {
    /// Offline profile for `username`, which is sanitized first.
    pub fn offline(username: &str) -> Self {
        let username = sanitize_username(username);
        Self {
            uuid: offline_uuid(&username),
            username,
            access_token: "0".into(),
            xuid: "0".into(),
            user_type: "legacy".into(),
            client_id: String::new(),
        }
    }
}

/// ASCII letters, digits and `_` only; anything else becomes `Player`.
pub fn sanitize_username(raw: &str) -> String {
    let trimmed = raw.trim();
    let valid = !trimmed.is_empty()
        && trimmed
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        trimmed.to_string()
    } else {
        DEFAULT_USERNAME.to_string()
    }
}

/// `md5("OfflinePlayer:" + name)` laid out as 8-4-4-4-12 lowercase hex.
pub fn offline_uuid(username: &str) -> String {
    let digest = Md5::digest(format!("{OFFLINE_PREFIX}{username}").as_bytes());
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&digest);
    Uuid::from_bytes(bytes).hyphenated().to_string()
}
