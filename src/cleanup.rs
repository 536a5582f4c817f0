//! Temp-file housekeeping and filename sanitizing.

use std::path::Path;
use tracing::{debug, info};

/// Default length limit for [`safe_filename`].
pub const DEFAULT_FILENAME_LEN: usize = 60;

/// Remove every regular file directly inside `dir`.
///
/// Individual failures are skipped. A missing directory removes nothing.
pub fn cleanup_temp_files(dir: &Path) -> usize {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return 0;
    };

    let mut removed = 0;
    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        match std::fs::remove_file(&path) {
            Ok(()) => removed += 1,
            Err(e) => debug!("Could not remove {:?}: {}", path, e),
        }
    }

    if removed > 0 {
        info!("Cleaned {} temp files from {:?}", removed, dir);
    }
    removed
}

/// Replace every character that is not alphanumeric, `_` or `-` with `_` and cap the length.
pub fn safe_filename(s: &str, max_len: usize) -> String {
    s.chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .take(max_len)
        .collect()
}
