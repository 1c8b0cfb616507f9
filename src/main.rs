// Command-line entry point for go-net-overlay.

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use go_net_overlay::{locator_for, output_name, usecase, Config, OverlayHandle};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// GOROOT to use instead of asking `go env GOROOT`
    #[arg(long)]
    goroot: Option<PathBuf>,

    /// Package directory relative to $GOROOT/src
    #[arg(long)]
    package_dir: Option<String>,

    /// Seconds to wait for the toolchain query
    #[arg(long)]
    timeout: Option<u64>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build an overlay and print the manifest path
    Overlay,
    /// Write the rewritten sources into a directory
    Sources {
        #[arg(short, long)]
        out_dir: PathBuf,
    },
    /// Delete a manifest and every file it references
    Clean { manifest: PathBuf },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if cli.goroot.is_some() {
        config.goroot = cli.goroot.clone();
    }
    if let Some(dir) = &cli.package_dir {
        config.package_dir = dir.clone();
    }
    if cli.timeout.is_some() {
        config.timeout_secs = cli.timeout;
    }

    let locator = locator_for(&config);
    let usecase = usecase(&config, locator.as_ref());

    match cli.command {
        Command::Overlay => {
            let handle = usecase
                .create_overlay(&config.cancel_token())
                .context("Failed to create overlay")?;
            println!("{}", handle.path().display());
        }
        Command::Sources { out_dir } => {
            let srcs = usecase
                .replacement_sources(&config.cancel_token())
                .context("Failed to rewrite sources")?;
            fs::create_dir_all(&out_dir)
                .with_context(|| format!("Failed to create {}", out_dir.display()))?;
            for src in &srcs {
                let dest = out_dir.join(output_name(src));
                if dest.exists() {
                    bail!("{} already exists", dest.display());
                }
                fs::write(&dest, src.as_bytes())
                    .with_context(|| format!("Failed to write {}", dest.display()))?;
                println!("{} -> {}", src.path.display(), dest.display());
            }
        }
        Command::Clean { manifest } => {
            let mut handle = OverlayHandle::from_manifest(&manifest)?;
            handle.release();
        }
    }
    Ok(())
}
