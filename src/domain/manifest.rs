//! Overlay manifest consumed by `go build -overlay`.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// `{"Replace": {"<original path>": "<replacement path>"}}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlayManifest {
    #[serde(rename = "Replace")]
    pub replace: BTreeMap<PathBuf, PathBuf>,
}

impl OverlayManifest {
    pub fn len(&self) -> usize {
        self.replace.len()
    }

    pub fn is_empty(&self) -> bool {
        self.replace.is_empty()
    }
}
