/// Go toolchain queries.
///
/// Locates the patched package through `go env GOROOT`. The query runs as a child
/// process that is polled against a [`CancelToken`] and killed when it fires.

use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use std::thread;
use std::time::Duration;

use tracing::{debug, info};

use crate::error::{PatchError, Result};
use crate::infrastructure::cancel::CancelToken;
use crate::ports::ModuleLocator;

const POLL_INTERVAL: Duration = Duration::from_millis(10);

// ═══════════════════════════════════════════════════════════════════════════
// Locators
// ═══════════════════════════════════════════════════════════════════════════

/// Resolves `$GOROOT/src/<package_dir>` by asking the toolchain.
#[derive(Debug, Clone)]
pub struct GoEnvLocator {
    go_binary: String,
    package_dir: String,
}

impl GoEnvLocator {
    pub fn new(go_binary: impl Into<String>, package_dir: impl Into<String>) -> Self {
        Self {
            go_binary: go_binary.into(),
            package_dir: package_dir.into(),
        }
    }
}

impl Default for GoEnvLocator {
    fn default() -> Self {
        Self::new("go", "net")
    }
}

impl ModuleLocator for GoEnvLocator {
    fn locate(&self, cancel: &CancelToken) -> Result<PathBuf> {
        let goroot = query_goroot(&self.go_binary, cancel)?;
        let dir = package_dir(&goroot, &self.package_dir);
        info!("Using package directory: {}", dir.display());
        Ok(dir)
    }
}

/// A directory known up front, e.g. from configuration or a test fixture.
#[derive(Debug, Clone)]
pub struct FixedDirLocator(pub PathBuf);

impl ModuleLocator for FixedDirLocator {
    fn locate(&self, cancel: &CancelToken) -> Result<PathBuf> {
        if cancel.is_cancelled() {
            return Err(PatchError::Cancelled {
                command: format!("locate {}", self.0.display()),
            });
        }
        Ok(self.0.clone())
    }
}

pub fn package_dir(goroot: &Path, package_dir: &str) -> PathBuf {
    goroot.join("src").join(package_dir)
}

// ═══════════════════════════════════════════════════════════════════════════
// Internal Implementation
// ═══════════════════════════════════════════════════════════════════════════

/// Run `<go> env GOROOT` and return the single path it prints.
pub fn query_goroot(go_binary: &str, cancel: &CancelToken) -> Result<PathBuf> {
    let spec = build_command_spec(go_binary);
    let shown = spec.to_string();
    debug!("Running `{}`", shown);

    let output = run_cancellable(
        Command::new(&spec.program).args(&spec.args),
        &shown,
        cancel,
    )?;

    let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
    combined.push_str(&String::from_utf8_lossy(&output.stderr));

    if !output.status.success() {
        return Err(PatchError::Discovery {
            command: shown,
            message: output.status.to_string(),
            output: combined,
        });
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let goroot = stdout.trim();
    if goroot.is_empty() || goroot.lines().count() != 1 {
        return Err(PatchError::Discovery {
            command: shown,
            message: "expected a single directory path".to_string(),
            output: combined,
        });
    }
    Ok(PathBuf::from(goroot))
}

fn run_cancellable(cmd: &mut Command, shown: &str, cancel: &CancelToken) -> Result<Output> {
    if cancel.is_cancelled() {
        return Err(PatchError::Cancelled {
            command: shown.to_string(),
        });
    }

    let mut child = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| PatchError::Discovery {
            command: shown.to_string(),
            message: format!("failed to execute: {}", e),
            output: String::new(),
        })?;

    loop {
        let exited = child.try_wait().map_err(|e| PatchError::Discovery {
            command: shown.to_string(),
            message: e.to_string(),
            output: String::new(),
        })?;
        if exited.is_some() {
            break;
        }
        if cancel.is_cancelled() {
            let _ = child.kill();
            let _ = child.wait();
            return Err(PatchError::Cancelled {
                command: shown.to_string(),
            });
        }
        thread::sleep(POLL_INTERVAL);
    }

    child.wait_with_output().map_err(|e| PatchError::Discovery {
        command: shown.to_string(),
        message: e.to_string(),
        output: String::new(),
    })
}

// ═══════════════════════════════════════════════════════════════════════════
// Testable Command Builder
// ═══════════════════════════════════════════════════════════════════════════

/// Describes the toolchain command without running it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl std::fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

pub fn build_command_spec(go_binary: &str) -> CommandSpec {
    CommandSpec {
        program: go_binary.to_string(),
        args: vec!["env".to_string(), "GOROOT".to_string()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_command_spec() {
        let spec = build_command_spec("go");
        assert_eq!(spec.program, "go");
        assert_eq!(spec.args, vec!["env", "GOROOT"]);
        assert_eq!(spec.to_string(), "go env GOROOT");
    }

    #[test]
    fn test_package_dir() {
        assert_eq!(
            package_dir(Path::new("/usr/local/go"), "net"),
            PathBuf::from("/usr/local/go/src/net")
        );
    }

    #[test]
    fn test_cancelled_before_spawn() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let err = query_goroot("go", &cancel).unwrap_err();
        assert!(matches!(err, PatchError::Cancelled { .. }));
    }

    #[test]
    fn test_missing_binary_is_discovery_error() {
        let err = query_goroot("definitely-not-a-go-binary-4599", &CancelToken::new()).unwrap_err();
        assert!(matches!(err, PatchError::Discovery { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_nonzero_exit_is_discovery_error() {
        // `false env GOROOT` exits 1
        let err = query_goroot("false", &CancelToken::new()).unwrap_err();
        match err {
            PatchError::Discovery { command, .. } => assert_eq!(command, "false env GOROOT"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_empty_output_is_discovery_error() {
        let err = query_goroot("true", &CancelToken::new()).unwrap_err();
        assert!(err.to_string().contains("expected a single directory path"));
    }

    #[test]
    fn test_fixed_dir_locator() {
        let locator = FixedDirLocator(PathBuf::from("/fixture/net"));
        assert_eq!(
            locator.locate(&CancelToken::new()).unwrap(),
            PathBuf::from("/fixture/net")
        );
    }

    #[test]
    #[ignore] // Requires a Go toolchain in PATH
    fn test_go_env_locator() {
        let dir = GoEnvLocator::default().locate(&CancelToken::new()).unwrap();
        assert!(dir.ends_with("src/net"));
    }
}
