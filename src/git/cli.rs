//! Git subprocess spawning.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

use crate::error::VcsError;

use super::Vcs;

/// Environment variable pointing at the real git binary.
pub const GIT_ENV_VAR: &str = "NSCM_GIT";

/// Locate the git binary to delegate to.
///
/// An explicit override wins. Otherwise the first `git` on PATH that is not
/// `current_exe` is used, so installing nscm itself as `git` cannot recurse.
pub fn resolve_git_binary(
    override_path: Option<&OsStr>,
    current_exe: Option<&Path>,
) -> Result<PathBuf, VcsError> {
    if let Some(path) = override_path.filter(|p| !p.is_empty()) {
        return which::which(path).map_err(|_| VcsError::NotFound);
    }

    let current = current_exe.and_then(|p| p.canonicalize().ok());

    which::which_all("git")
        .map_err(|_| VcsError::NotFound)?
        .find(|candidate| match (&current, candidate.canonicalize()) {
            (Some(me), Ok(resolved)) => resolved != *me,
            _ => true,
        })
        .ok_or(VcsError::NotFound)
}

/// Map an exit status to a shell-style exit code.
fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }

    1
}

/// [`Vcs`] backed by the real git executable.
#[derive(Debug, Clone)]
pub struct GitCli {
    program: PathBuf,
    capture_timeout: Duration,
}

impl GitCli {
    pub fn new(program: impl Into<PathBuf>, capture_timeout: Duration) -> Self {
        Self {
            program: program.into(),
            capture_timeout,
        }
    }

    /// Resolve git from `NSCM_GIT` or PATH.
    pub fn discover(capture_timeout: Duration) -> Result<Self, VcsError> {
        let override_path = std::env::var_os(GIT_ENV_VAR);
        let current_exe = std::env::current_exe().ok();
        let program = resolve_git_binary(override_path.as_deref(), current_exe.as_deref())?;
        debug!("Delegating to git at {}", program.display());
        Ok(Self::new(program, capture_timeout))
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Run git with inherited stdio and wait for it.
    ///
    /// On Unix a SIGINT listener is registered first. The terminal delivers
    /// the interrupt to git directly (same foreground process group); we stay
    /// alive to report git's exit status instead of dying before it.
    async fn run_inherited(&self, args: &[OsString]) -> Result<i32, VcsError> {
        #[cfg(unix)]
        let _sigint = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::interrupt())
            .map_err(VcsError::SpawnFailed)?;

        let status = Command::new(&self.program)
            .args(args)
            .status()
            .await
            .map_err(VcsError::SpawnFailed)?;

        Ok(exit_code(status))
    }
}

#[async_trait]
impl Vcs for GitCli {
    async fn diff(&self, args: &[OsString]) -> Result<String, VcsError> {
        let timeout_secs = self.capture_timeout.as_secs();

        let output = timeout(
            self.capture_timeout,
            Command::new(&self.program)
                .args(args)
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .kill_on_drop(true)
                .output(),
        )
        .await
        .map_err(|_| VcsError::Timeout(timeout_secs))?
        .map_err(VcsError::SpawnFailed)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(VcsError::NonZeroExit {
                code: exit_code(output.status),
                stderr,
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    async fn commit(&self, args: &[OsString]) -> Result<i32, VcsError> {
        self.run_inherited(args).await
    }

    async fn passthrough(&self, args: &[OsString]) -> Result<i32, VcsError> {
        self.run_inherited(args).await
    }
}
