//! Persistent image cache keyed by pipeline fingerprints.

use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::array::persist::{read_image, write_image};
use crate::dataset::ImageData;
use crate::foundation::diagnostics::{self, Severity};
use crate::foundation::error::VoxflowResult;
use crate::pipeline::fingerprint::Fingerprint;

/// Directory of `<fingerprint>.vxi` files.
#[derive(Clone, Debug)]
pub struct DiskCache {
    dir: PathBuf,
}

impl DiskCache {
    /// Open (creating if needed) the cache directory.
    pub fn open(dir: impl AsRef<Path>) -> VoxflowResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create cache directory '{}'", dir.display()))?;
        Ok(Self { dir })
    }

    /// Cache directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File backing `key`.
    pub fn path(&self, key: Fingerprint) -> PathBuf {
        self.dir.join(format!("{}.vxi", key.to_hex()))
    }

    /// Load the image stored under `key`. Unreadable or corrupt entries count as misses.
    pub fn load(&self, key: Fingerprint) -> Option<ImageData> {
        let path = self.path(key);
        let bytes = match std::fs::read(&path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                miss(&path, &e.to_string());
                return None;
            }
        };
        match read_image(&bytes) {
            Ok(img) => Some(img),
            Err(e) => {
                miss(&path, &e.to_string());
                None
            }
        }
    }

    /// Store `img` under `key` (write to a temp file, then rename).
    pub fn store(&self, key: Fingerprint, img: &ImageData) -> VoxflowResult<()> {
        let path = self.path(key);
        let tmp = path.with_extension(format!("vxi.{}.tmp", std::process::id()));
        let bytes = write_image(img)?;
        std::fs::write(&tmp, bytes)
            .with_context(|| format!("failed to write cache entry '{}'", tmp.display()))?;
        if let Err(e) = std::fs::rename(&tmp, &path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(e.into());
        }
        Ok(())
    }
}

fn miss(path: &Path, reason: &str) {
    diagnostics::emit(
        Severity::Warning,
        "disk_cache",
        format!("ignoring unreadable cache entry '{}': {reason}", path.display()),
    );
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/disk_cache.rs"]
mod tests;
