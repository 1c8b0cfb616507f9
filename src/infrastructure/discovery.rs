use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

const SOURCE_EXT: &str = "go";
const TEST_SUFFIX: &str = "_test.go";

/// Collect every non-test `.go` file under `root`, recursively.
///
/// The walk is best effort: a directory that cannot be read is skipped together with
/// its subtree and nothing is reported. An empty result is not an error here.
pub fn collect_go_files(root: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    visit_dir(root, &mut files);
    debug!("Found {} candidate files under {}", files.len(), root.display());
    files
}

fn visit_dir(dir: &Path, out: &mut Vec<PathBuf>) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            debug!("Skipping {}: {}", dir.display(), e);
            return;
        }
    };

    // file_type() does not follow symlinks, so linked directories are never entered
    let mut entries: Vec<(PathBuf, fs::FileType)> = entries
        .flatten()
        .filter_map(|entry| entry.file_type().ok().map(|ty| (entry.path(), ty)))
        .collect();
    entries.sort_by(|a, b| a.0.cmp(&b.0));

    for (path, ty) in entries {
        if ty.is_dir() {
            visit_dir(&path, out);
        } else if is_candidate(&path) {
            out.push(path);
        }
    }
}

fn is_candidate(path: &Path) -> bool {
    let is_go = path.extension().is_some_and(|ext| ext == SOURCE_EXT);
    let is_test = path
        .file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.ends_with(TEST_SUFFIX));
    is_go && !is_test
}
