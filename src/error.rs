//! Error types for nscm modules using thiserror.

use thiserror::Error;

/// Errors from invoking the underlying git binary.
#[derive(Error, Debug)]
pub enum VcsError {
    #[error("git executable not found. Install git or point NSCM_GIT at it")]
    NotFound,

    #[error("Failed to spawn git: {0}")]
    SpawnFailed(#[source] std::io::Error),

    #[error("git timed out after {0} seconds")]
    Timeout(u64),

    #[error("git exited with code {code}: {stderr}")]
    NonZeroExit { code: i32, stderr: String },
}

/// Errors from a single text-generation provider call.
///
/// Messages carry status codes and provider names only. Request and
/// response bodies never end up in here.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("{provider} credential missing (set {env_var})")]
    AuthMissing {
        provider: &'static str,
        env_var: &'static str,
    },

    #[error("{provider} rejected the credential (HTTP {status})")]
    AuthRejected { provider: &'static str, status: u16 },

    #[error("{provider} request timed out after {secs} seconds")]
    Timeout { provider: &'static str, secs: u64 },

    #[error("{provider} request failed: {reason}")]
    Transport {
        provider: &'static str,
        reason: String,
    },

    #[error("{provider} API error: HTTP {status}")]
    HttpStatus { provider: &'static str, status: u16 },

    #[error("{provider} returned an unexpected response: {reason}")]
    InvalidResponse {
        provider: &'static str,
        reason: String,
    },

    #[error("All retry attempts failed: {0}")]
    RetriesExhausted(#[source] Box<ProviderError>),
}

impl ProviderError {
    /// Whether another attempt could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            ProviderError::Timeout { .. } | ProviderError::Transport { .. } => true,
            ProviderError::HttpStatus { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// The innermost error, looking through `RetriesExhausted`.
    pub fn root(&self) -> &ProviderError {
        match self {
            ProviderError::RetriesExhausted(inner) => inner.root(),
            other => other,
        }
    }
}

/// User-facing failure kinds of the generation pipeline.
#[derive(Error, Debug)]
pub enum NscmError {
    #[error("No staged changes to describe. Stage files with `git add` first")]
    NoStagedChanges,

    #[error("{0}")]
    ProviderAuthMissing(String),

    #[error("{0}")]
    ProviderTimeout(String),

    #[error("{0}")]
    ProviderTransportError(String),

    #[error("Provider returned no usable commit message")]
    EmptyGeneration,

    #[error("git failed: {0}")]
    UnderlyingToolError(#[source] VcsError),

    #[error("Unsupported provider '{0}' (expected one of: openai, anthropic, ollama)")]
    UnsupportedProvider(String),

    #[error("Interrupted before committing")]
    Interrupted,

    #[error("Unexpected internal error: {0}")]
    Fatal(String),
}

impl NscmError {
    /// Stable name of the failure kind, shown to the user.
    pub fn kind(&self) -> &'static str {
        match self {
            NscmError::NoStagedChanges => "NoStagedChanges",
            NscmError::ProviderAuthMissing(_) => "ProviderAuthMissing",
            NscmError::ProviderTimeout(_) => "ProviderTimeout",
            NscmError::ProviderTransportError(_) => "ProviderTransportError",
            NscmError::EmptyGeneration => "EmptyGeneration",
            NscmError::UnderlyingToolError(_) => "UnderlyingToolError",
            NscmError::UnsupportedProvider(_) => "UnsupportedProvider",
            NscmError::Interrupted => "Interrupted",
            NscmError::Fatal(_) => "Fatal",
        }
    }

    /// Process exit code for this failure kind.
    pub fn exit_code(&self) -> i32 {
        match self {
            NscmError::Fatal(_) => 1,
            NscmError::NoStagedChanges => 3,
            NscmError::ProviderAuthMissing(_) => 4,
            NscmError::ProviderTimeout(_) => 5,
            NscmError::ProviderTransportError(_) => 6,
            NscmError::EmptyGeneration => 7,
            NscmError::UnderlyingToolError(_) => 8,
            NscmError::UnsupportedProvider(_) => 9,
            NscmError::Interrupted => 130,
        }
    }

    /// Short actionable hint printed under the error line.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            NscmError::NoStagedChanges => Some("Nothing was committed."),
            NscmError::ProviderAuthMissing(_) => {
                Some("Export the provider's API key, or set NSCM_PROVIDER=ollama for a local model.")
            }
            NscmError::ProviderTimeout(_) => Some("Raise NSCM_TIMEOUT or try again."),
            NscmError::UnsupportedProvider(_) => Some("Check NSCM_PROVIDER or the provider key in ~/.nscmrc."),
            NscmError::EmptyGeneration => Some("Write the message yourself with `git commit -m \"...\"`."),
            _ => None,
        }
    }
}

impl From<ProviderError> for NscmError {
    fn from(err: ProviderError) -> Self {
        let detail = err.to_string();
        match err.root() {
            ProviderError::AuthMissing { .. } | ProviderError::AuthRejected { .. } => {
                NscmError::ProviderAuthMissing(detail)
            }
            ProviderError::Timeout { .. } => NscmError::ProviderTimeout(detail),
            _ => NscmError::ProviderTransportError(detail),
        }
    }
}

impl From<VcsError> for NscmError {
    fn from(err: VcsError) -> Self {
        NscmError::UnderlyingToolError(err)
    }
}
