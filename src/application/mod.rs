// Pipeline: locate -> discover -> match -> rewrite -> overlay.

use tracing::info;

use crate::domain::source::RewrittenSource;
use crate::domain::target::TargetKind;
use crate::error::{PatchError, Result};
use crate::infrastructure::cancel::CancelToken;
use crate::infrastructure::discovery::collect_go_files;
use crate::infrastructure::matcher::find_source_paths;
use crate::infrastructure::overlay::{OverlayBuilder, OverlayHandle};
use crate::infrastructure::rewriter::{RewriteOptions, SourceRewriter};
use crate::ports::{GoParser, ModuleLocator};

pub struct PatchUsecase<'a> {
    pub locator: &'a dyn ModuleLocator,
    pub parser: &'a dyn GoParser,
    pub options: RewriteOptions,
    pub overlay: OverlayBuilder,
}

impl<'a> PatchUsecase<'a> {
    /// Rewritten contents of every file that declares `net.Listen` or
    /// `net.(*Dialer).DialContext`, ordered by path.
    pub fn replacement_sources(&self, cancel: &CancelToken) -> Result<Vec<RewrittenSource>> {
        let root = self.locator.locate(cancel)?;
        let files = collect_go_files(&root);

        let matches = find_source_paths(&files, self.parser, &TargetKind::ALL);
        if matches.is_empty() {
            return Err(PatchError::NoCandidates { root });
        }
        info!(
            "Matched {} of {} files under {}",
            matches.len(),
            files.len(),
            root.display()
        );

        let rewriter = SourceRewriter::new(self.parser, self.options.clone());
        matches
            .iter()
            .map(|m| rewriter.rewrite_file(&m.path))
            .collect()
    }

    pub fn build_overlay(&self, srcs: &[RewrittenSource]) -> Result<OverlayHandle> {
        self.overlay.build(srcs)
    }

    /// Discover, rewrite and package in one call.
    pub fn create_overlay(&self, cancel: &CancelToken) -> Result<OverlayHandle> {
        let srcs = self.replacement_sources(cancel)?;
        self.build_overlay(&srcs)
    }
}
