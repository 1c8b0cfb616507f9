use std::path::PathBuf;

use crate::domain::ast::GoFile;
use crate::error::Result;
use crate::infrastructure::cancel::CancelToken;

/// Resolves the directory holding the package that gets patched.
pub trait ModuleLocator {
    fn locate(&self, cancel: &CancelToken) -> Result<PathBuf>;
}

/// Parses Go source text into its top-level declarations.
pub trait GoParser {
    /// On failure returns a human readable reason; the caller attaches the path.
    fn parse(&self, src: &str) -> std::result::Result<GoFile, String>;
}
