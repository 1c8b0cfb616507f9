// Per-file records flowing through the pipeline.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::domain::target::TargetKind;

/// Outcome of evaluating the structural predicates over one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    pub path: PathBuf,
    /// Number of matching top-level declarations per kind.
    pub counts: BTreeMap<TargetKind, usize>,
}

impl MatchResult {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            counts: BTreeMap::new(),
        }
    }

    pub fn record(&mut self, kind: TargetKind) {
        *self.counts.entry(kind).or_default() += 1;
    }

    pub fn has(&self, kind: TargetKind) -> bool {
        self.counts.get(&kind).copied().unwrap_or(0) > 0
    }

    pub fn is_match(&self) -> bool {
        TargetKind::ALL.iter().any(|k| self.has(*k))
    }

    /// More than one declaration of the same kind matched.
    pub fn is_ambiguous(&self) -> bool {
        self.counts.values().any(|&n| n > 1)
    }
}

/// A rewritten file: where it came from and what it now contains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewrittenSource {
    pub path: PathBuf,
    pub content: String,
}

impl RewrittenSource {
    pub fn new(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.content.as_bytes()
    }
}
