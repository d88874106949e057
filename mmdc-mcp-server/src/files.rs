//! Restricted-permission file creation and atomic JSON writes.

use serde::Serialize;
use std::io::Write;
use std::path::Path;

/// Open (or create/truncate) a file for writing with owner-only permissions
/// (0o600) on Unix, or default permissions on other platforms.
pub fn open_restricted_write(path: &Path) -> Result<std::fs::File, std::io::Error> {
    let mut opts = std::fs::OpenOptions::new();
    opts.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        opts.mode(0o600);
    }
    opts.open(path)
}

/// Create a new file with owner-only permissions, failing if it exists.
pub fn create_restricted_new(path: &Path) -> Result<std::fs::File, std::io::Error> {
    let mut opts = std::fs::OpenOptions::new();
    opts.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        opts.mode(0o600);
    }
    opts.open(path)
}

/// Atomically write a JSON payload to a path.
///
/// Creates parent directories if needed, writes to a uniquely named temp file
/// next to `path` with restricted permissions, then renames into place.
pub fn write_json_atomic<T: Serialize>(payload: &T, path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let bytes = serde_json::to_vec_pretty(payload).map_err(std::io::Error::other)?;
    let temp_path = path.with_extension(format!("{}.tmp", uuid::Uuid::new_v4().simple()));
    open_restricted_write(&temp_path).and_then(|mut f| f.write_all(&bytes))?;
    std::fs::rename(&temp_path, path).inspect_err(|_| {
        let _ = std::fs::remove_file(&temp_path);
    })
}
