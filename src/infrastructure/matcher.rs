use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use tracing::{debug, warn};

use crate::domain::ast::GoFile;
use crate::domain::source::MatchResult;
use crate::domain::target::TargetKind;
use crate::ports::GoParser;

/// Evaluate every target predicate over the top-level declarations of `file`.
pub fn match_file(path: impl Into<PathBuf>, file: &GoFile, targets: &[TargetKind]) -> MatchResult {
    let mut result = MatchResult::new(path);
    for decl in &file.funcs {
        for target in targets {
            if target.matches(decl) {
                result.record(*target);
            }
        }
    }
    result
}

/// Select the candidate files that declare at least one target.
///
/// Unreadable or unparsable candidates are skipped. The result is deduplicated and
/// sorted by path.
pub fn find_source_paths(
    files: &[PathBuf],
    parser: &dyn GoParser,
    targets: &[TargetKind],
) -> Vec<MatchResult> {
    let mut matched: BTreeMap<PathBuf, MatchResult> = BTreeMap::new();

    for path in files {
        let src = match fs::read_to_string(path) {
            Ok(src) => src,
            Err(e) => {
                warn!("Skipping {}: {}", path.display(), e);
                continue;
            }
        };
        let file = match parser.parse(&src) {
            Ok(file) => file,
            Err(reason) => {
                warn!("Skipping {}: {}", path.display(), reason);
                continue;
            }
        };

        let result = match_file(path.clone(), &file, targets);
        if !result.is_match() {
            continue;
        }
        if result.is_ambiguous() {
            warn!(
                "{} declares more than one matching target: {:?}",
                path.display(),
                result.counts
            );
        }
        debug!("Matched {}: {:?}", path.display(), result.counts);
        matched.insert(path.clone(), result);
    }

    matched.into_values().collect()
}
