// ─── Checksum Verifier ───
// SHA-1 content digests for downloaded artifacts.

use std::path::Path;

use sha1::{Digest, Sha1};
use tracing::debug;

/// Hex SHA-1 of an in-memory buffer.
pub fn sha1_hex(bytes: &[u8]) -> String {
    hex::encode(Sha1::digest(bytes))
}

/// Hex SHA-1 of a file's full contents.
pub fn sha1_file(path: &Path) -> std::io::Result<String> {
    let bytes = std::fs::read(path)?;
    Ok(sha1_hex(&bytes))
}

/// `true` only when the file exists, is readable and its SHA-1 equals
/// `expected` (hex, case-insensitive). Never fails: callers treat `false`
/// as "must re-fetch".
pub fn verify(path: &Path, expected: &str) -> bool {
    match sha1_file(path) {
        Ok(actual) => {
            let matches = actual.eq_ignore_ascii_case(expected.trim());
            if !matches {
                debug!(
                    "Checksum mismatch for {:?}: expected {}, got {}",
                    path, expected, actual
                );
            }
            matches
        }
        Err(e) => {
            debug!("Cannot verify {:?}: {}", path, e);
            false
        }
    }
}

/// [`verify`] off the async executor.
pub async fn verify_async(path: &Path, expected: &str) -> bool {
    let path = path.to_path_buf();
    let expected = expected.to_string();
    tokio::task::spawn_blocking(move || verify(&path, &expected))
        .await
        .unwrap_or(false)
}
