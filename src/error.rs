//! Error taxonomy for the overlay pipeline.
//!
//! Every failure is fatal to the operation that raised it; nothing is retried.
//! Variants that concern a file always carry its path.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PatchError {
    #[error("failed to get GOROOT via `{command}`: {message}\n{output}")]
    Discovery {
        command: String,
        message: String,
        output: String,
    },

    #[error("`{command}` was cancelled")]
    Cancelled { command: String },

    #[error("no source files found defining net.Listen or net.(*Dialer).DialContext under {}", root.display())]
    NoCandidates { root: PathBuf },

    #[error("failed to parse file {}: {reason}", path.display())]
    Parse { path: PathBuf, reason: String },

    #[error("no target functions (DialContext or Listen) found in {}", path.display())]
    NoTargetFunctions { path: PathBuf },

    #[error("cannot forward parameters of {function} in {}: {reason}", path.display())]
    Signature {
        path: PathBuf,
        function: String,
        reason: String,
    },

    #[error("failed to read file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write file {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to create overlay file content {}: {source}", path.display())]
    Serialization {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid configuration {}: {reason}", path.display())]
    Config { path: PathBuf, reason: String },
}

pub type Result<T> = std::result::Result<T, PatchError>;
