//! The underlying git binary as a narrow collaborator.
//!
//! The diff collector and dispatcher only talk to git through [`Vcs`], so
//! they can be exercised against a fake without a real repository.

pub mod cli;

use std::ffi::OsString;

use async_trait::async_trait;

use crate::error::VcsError;

pub use cli::{GitCli, resolve_git_binary};

/// Operations nscm needs from the version-control tool.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Vcs: Send + Sync {
    /// Run a read-only diff query with captured output and a bounded timeout.
    async fn diff(&self, args: &[OsString]) -> Result<String, VcsError>;

    /// Run the real commit with inherited stdio. Returns git's exit code.
    async fn commit(&self, args: &[OsString]) -> Result<i32, VcsError>;

    /// Forward an invocation untouched with inherited stdio. Returns git's
    /// exit code.
    async fn passthrough(&self, args: &[OsString]) -> Result<i32, VcsError>;
}
