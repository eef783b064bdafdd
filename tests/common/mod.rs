//! Shared test utilities for integration tests.
//!
//! Not all functions are used by every test file, but they're shared across tests.
#![allow(dead_code)]

use std::ffi::OsString;
use std::path::Path;
use std::process::Command;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use nscm::config::{FileConfig, GenerationSettings, resolve};
use nscm::{MessageProvider, PromptRequest, ProviderError, Vcs, VcsError};

/// Build an argument vector from string literals.
pub fn os(args: &[&str]) -> Vec<OsString> {
    args.iter().map(OsString::from).collect()
}

/// Settings resolved from the given env pairs only, no config file.
pub fn settings_from(pairs: &[(&str, &str)]) -> GenerationSettings {
    let pairs: Vec<(String, String)> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    resolve(
        move |key| pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone()),
        &FileConfig::default(),
    )
}

/// Which [`Vcs`] method was called, with its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GitCall {
    Diff(Vec<OsString>),
    Commit(Vec<OsString>),
    Passthrough(Vec<OsString>),
}

/// In-memory git that serves a fixed diff and records every call.
#[derive(Clone, Default)]
pub struct FakeGit {
    pub diff: String,
    pub shortstat: String,
    pub exit_code: i32,
    calls: Arc<Mutex<Vec<GitCall>>>,
}

impl FakeGit {
    pub fn with_diff(diff: impl Into<String>, shortstat: impl Into<String>) -> Self {
        Self {
            diff: diff.into(),
            shortstat: shortstat.into(),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<GitCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn commits(&self) -> Vec<Vec<OsString>> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                GitCall::Commit(args) => Some(args),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl Vcs for FakeGit {
    async fn diff(&self, args: &[OsString]) -> Result<String, VcsError> {
        self.calls.lock().unwrap().push(GitCall::Diff(args.to_vec()));
        if args.iter().any(|a| a == "--shortstat") {
            Ok(self.shortstat.clone())
        } else {
            Ok(self.diff.clone())
        }
    }

    async fn commit(&self, args: &[OsString]) -> Result<i32, VcsError> {
        self.calls.lock().unwrap().push(GitCall::Commit(args.to_vec()));
        Ok(self.exit_code)
    }

    async fn passthrough(&self, args: &[OsString]) -> Result<i32, VcsError> {
        self.calls
            .lock()
            .unwrap()
            .push(GitCall::Passthrough(args.to_vec()));
        Ok(self.exit_code)
    }
}

/// Provider returning a canned reply and recording every prompt it got.
#[derive(Clone)]
pub struct StubProvider {
    reply: String,
    requests: Arc<Mutex<Vec<PromptRequest>>>,
}

impl StubProvider {
    pub fn replying(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn requests(&self) -> Vec<PromptRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl MessageProvider for StubProvider {
    fn name(&self) -> &'static str {
        "Stub"
    }

    async fn complete(&self, request: &PromptRequest) -> Result<String, ProviderError> {
        self.requests.lock().unwrap().push(request.clone());
        Ok(self.reply.clone())
    }
}

/// Whether a usable git binary is on PATH.
pub fn git_available() -> bool {
    which::which("git").is_ok()
}

/// A throwaway git repository driven through the git CLI.
pub struct TestRepo {
    pub dir: tempfile::TempDir,
}

impl TestRepo {
    /// Create a new empty git repository in a temp directory.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp directory");
        let repo = Self { dir };
        repo.git(&["init", "-q"]);
        repo.git(&["config", "user.name", "Test User"]);
        repo.git(&["config", "user.email", "test@example.com"]);
        repo.git(&["config", "commit.gpgsign", "false"]);
        repo
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Run git in the repository, panicking on failure.
    pub fn git(&self, args: &[&str]) -> String {
        let output = Command::new("git")
            .args(args)
            .current_dir(self.dir.path())
            .output()
            .expect("Failed to run git");
        assert!(
            output.status.success(),
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8_lossy(&output.stdout).into_owned()
    }

    /// Write a file relative to the repository root.
    pub fn write(&self, name: &str, contents: &str) {
        std::fs::write(self.dir.path().join(name), contents).expect("Failed to write file");
    }

    /// Write and stage a file.
    pub fn stage(&self, name: &str, contents: &str) {
        self.write(name, contents);
        self.git(&["add", name]);
    }

    /// Subject of the latest commit.
    pub fn last_subject(&self) -> String {
        self.git(&["log", "-1", "--format=%s"]).trim_end().to_string()
    }

    /// Number of commits on HEAD, zero for an unborn branch.
    pub fn commit_count(&self) -> usize {
        let output = Command::new("git")
            .args(["rev-list", "--count", "HEAD"])
            .current_dir(self.dir.path())
            .output()
            .expect("Failed to run git");
        String::from_utf8_lossy(&output.stdout)
            .trim()
            .parse()
            .unwrap_or(0)
    }
}
