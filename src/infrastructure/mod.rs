// Infrastructure implementations: toolchain, filesystem and Go syntax.

pub mod cancel;
pub mod discovery;
pub mod go_syntax;
pub mod matcher;
pub mod overlay;
pub mod rewriter;
pub mod toolchain;

pub use cancel::CancelToken;
pub use go_syntax::TreeSitterGoParser;
pub use overlay::{OverlayBuilder, OverlayHandle};
pub use rewriter::{RewriteOptions, SourceRewriter};
pub use toolchain::{FixedDirLocator, GoEnvLocator};
