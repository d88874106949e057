//! Scratch input files owned by a single renderer invocation.

use std::io::Write;
use std::path::{Path, PathBuf};

use crate::files::create_restricted_new;
use crate::fingerprint::Fingerprint;

/// A temporary `.mmd` file holding one invocation's diagram source.
///
/// The name combines the fingerprint with a random suffix, so concurrent
/// retries of the same source never share a file. The file is removed when
/// the guard drops; a failed removal is logged and otherwise ignored.
#[derive(Debug)]
pub struct ScratchFile {
    path: PathBuf,
}

impl ScratchFile {
    /// Write `source` (UTF-8) to a fresh file under `dir`.
    pub fn create(dir: &Path, fingerprint: &Fingerprint, source: &str) -> std::io::Result<Self> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(format!(
            "mermaid_{fingerprint}_{}.mmd",
            uuid::Uuid::new_v4().simple()
        ));

        // Own the path before writing so a failed write is still cleaned up.
        let scratch = Self { path };
        let mut file = create_restricted_new(&scratch.path)?;
        file.write_all(source.as_bytes())?;
        file.flush()?;
        log::debug!("Wrote Mermaid source to {}", scratch.path.display());
        Ok(scratch)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => log::warn!(
                "Failed to remove scratch file {}: {e}",
                self.path.display()
            ),
        }
    }
}
