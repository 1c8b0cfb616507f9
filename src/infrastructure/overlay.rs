/// Overlay Module
///
/// Materializes rewritten sources as temporary files and writes the
/// `go build -overlay` manifest that maps the originals onto them.
///
/// Files created here are never removed implicitly. The [`OverlayHandle`] returned on
/// success owns them until [`OverlayHandle::release`] is called.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tempfile::Builder;
use tracing::{debug, info, warn};

use crate::domain::manifest::OverlayManifest;
use crate::domain::source::RewrittenSource;
use crate::error::{PatchError, Result};

const MANIFEST_PREFIX: &str = "go_net_overlay";
const MANIFEST_SUFFIX: &str = ".json";

/// Owns the manifest file and every temporary source file of one overlay.
#[derive(Debug)]
pub struct OverlayHandle {
    path: PathBuf,
    tmp_file_paths: Vec<PathBuf>,
}

impl OverlayHandle {
    /// Manifest path, suitable for `go build -overlay=<path>`.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn tmp_file_paths(&self) -> &[PathBuf] {
        &self.tmp_file_paths
    }

    /// Rebuild a handle from a manifest written earlier, e.g. by another process.
    pub fn from_manifest(path: &Path) -> Result<Self> {
        let content = fs::read(path).map_err(|source| PatchError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let manifest: OverlayManifest =
            serde_json::from_slice(&content).map_err(|source| PatchError::Serialization {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self {
            path: path.to_path_buf(),
            tmp_file_paths: manifest.replace.into_values().collect(),
        })
    }

    /// Delete the manifest and all temporary files. Files that are already gone are
    /// ignored, and calling this again is a no-op.
    pub fn release(&mut self) {
        let paths = std::iter::once(std::mem::take(&mut self.path))
            .chain(std::mem::take(&mut self.tmp_file_paths))
            .filter(|p| !p.as_os_str().is_empty());
        for path in paths {
            match fs::remove_file(&path) {
                Ok(()) => debug!("Removed {}", path.display()),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => warn!("Failed to remove {}: {}", path.display(), e),
            }
        }
    }
}

/// Builds overlays in a chosen directory (the system temp dir by default).
#[derive(Debug, Clone, Default)]
pub struct OverlayBuilder {
    dir: Option<PathBuf>,
}

impl OverlayBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Some(dir.into()),
        }
    }

    fn dir(&self) -> PathBuf {
        self.dir.clone().unwrap_or_else(std::env::temp_dir)
    }

    /// Write every source to its own temporary file, then the manifest.
    pub fn build(&self, srcs: &[RewrittenSource]) -> Result<OverlayHandle> {
        let dir = self.dir();
        let mut manifest = OverlayManifest::default();
        let mut tmp_file_paths = Vec::with_capacity(srcs.len());

        for src in srcs {
            let base = src
                .path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let tmp_path = write_temp(&dir, &format!("{}_", base), "", src.as_bytes())?;
            debug!("{} -> {}", src.path.display(), tmp_path.display());
            manifest.replace.insert(src.path.clone(), tmp_path.clone());
            tmp_file_paths.push(tmp_path);
        }

        let content = serde_json::to_vec(&manifest).map_err(|source| PatchError::Serialization {
            path: dir.clone(),
            source,
        })?;
        let path = write_temp(&dir, MANIFEST_PREFIX, MANIFEST_SUFFIX, &content)?;

        info!(
            "Created overlay {} replacing {} files",
            path.display(),
            manifest.len()
        );
        Ok(OverlayHandle {
            path,
            tmp_file_paths,
        })
    }
}

/// Create a uniquely named file in `dir`, fill it and close it. The file is kept.
fn write_temp(dir: &Path, prefix: &str, suffix: &str, content: &[u8]) -> Result<PathBuf> {
    let tmp = Builder::new()
        .prefix(prefix)
        .suffix(suffix)
        .tempfile_in(dir)
        .map_err(|source| PatchError::Write {
            path: dir.to_path_buf(),
            source,
        })?;
    let (mut file, path) = tmp.keep().map_err(|e| PatchError::Write {
        path: dir.to_path_buf(),
        source: e.error,
    })?;
    file.write_all(content)
        .and_then(|_| file.flush())
        .map_err(|source| PatchError::Write {
            path: path.clone(),
            source,
        })?;
    Ok(path)
}
