// Main library entry point for go-net-overlay.
//
// Rewrites net.Listen and net.(*Dialer).DialContext in the Go standard library into
// go:linkname stubs bound to a replacement module, and packages the rewritten files
// as a `go build -overlay` manifest.

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod ports;

use std::path::PathBuf;

pub use application::PatchUsecase;
pub use config::Config;
pub use domain::source::RewrittenSource;
pub use error::{PatchError, Result};
pub use infrastructure::{CancelToken, OverlayBuilder, OverlayHandle};

use infrastructure::{FixedDirLocator, GoEnvLocator, TreeSitterGoParser};
use ports::ModuleLocator;

/// Locator implied by `config`: a fixed `goroot` if set, the toolchain otherwise.
pub fn locator_for(config: &Config) -> Box<dyn ModuleLocator> {
    match &config.goroot {
        Some(goroot) => Box::new(FixedDirLocator(
            infrastructure::toolchain::package_dir(goroot, &config.package_dir),
        )),
        None => Box::new(GoEnvLocator::new(&config.go_binary, &config.package_dir)),
    }
}

pub fn overlay_builder_for(config: &Config) -> OverlayBuilder {
    match &config.temp_dir {
        Some(dir) => OverlayBuilder::in_dir(dir),
        None => OverlayBuilder::new(),
    }
}

/// Rewritten net package sources, using the default configuration.
pub fn replaced_net_sources(cancel: &CancelToken) -> Result<Vec<RewrittenSource>> {
    let config = Config::default();
    let locator = locator_for(&config);
    usecase(&config, locator.as_ref()).replacement_sources(cancel)
}

/// Overlay for already rewritten sources, in the system temp dir.
pub fn create_overlay(srcs: &[RewrittenSource]) -> Result<OverlayHandle> {
    OverlayBuilder::new().build(srcs)
}

/// [`replaced_net_sources`] followed by [`create_overlay`].
pub fn create_replaced_net_overlay(cancel: &CancelToken) -> Result<OverlayHandle> {
    let srcs = replaced_net_sources(cancel)?;
    create_overlay(&srcs)
}

pub fn usecase<'a>(config: &Config, locator: &'a dyn ModuleLocator) -> PatchUsecase<'a> {
    PatchUsecase {
        locator,
        parser: &TreeSitterGoParser,
        options: config.rewrite_options(),
        overlay: overlay_builder_for(config),
    }
}

/// Basename used for a rewritten file written outside an overlay.
pub fn output_name(src: &RewrittenSource) -> PathBuf {
    src.path
        .file_name()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("source.go"))
}
