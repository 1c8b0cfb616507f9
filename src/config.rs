//! Configuration loaded from a TOML file.
//!
//! ```toml
//! go_binary = "go"
//! package_dir = "net"
//! replacement_module = "github.com/goccy/wasi-go-net/wasip1"
//! marker_package = "unsafe"
//! timeout_secs = 30
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{PatchError, Result};
use crate::infrastructure::cancel::CancelToken;
use crate::infrastructure::rewriter::{RewriteOptions, DEFAULT_MARKER_PACKAGE, DEFAULT_REPLACEMENT_MODULE};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Executable asked for `GOROOT`.
    pub go_binary: String,
    /// Use this root instead of asking the toolchain.
    pub goroot: Option<PathBuf>,
    /// Patched package, relative to `$GOROOT/src`.
    pub package_dir: String,
    pub replacement_module: String,
    pub marker_package: String,
    pub timeout_secs: Option<u64>,
    /// Where overlay files are created.
    pub temp_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            go_binary: "go".to_string(),
            goroot: None,
            package_dir: "net".to_string(),
            replacement_module: DEFAULT_REPLACEMENT_MODULE.to_string(),
            marker_package: DEFAULT_MARKER_PACKAGE.to_string(),
            timeout_secs: None,
            temp_dir: None,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| PatchError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content).map_err(|reason| PatchError::Config {
            path: path.to_path_buf(),
            reason,
        })
    }

    pub fn from_toml(content: &str) -> std::result::Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    pub fn rewrite_options(&self) -> RewriteOptions {
        RewriteOptions {
            replacement_module: self.replacement_module.clone(),
            marker_package: self.marker_package.clone(),
        }
    }

    /// Fresh token carrying the configured deadline, if any.
    pub fn cancel_token(&self) -> CancelToken {
        match self.timeout_secs {
            Some(secs) => CancelToken::with_timeout(Duration::from_secs(secs)),
            None => CancelToken::new(),
        }
    }
}
