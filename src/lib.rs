//! nscm - a transparent git wrapper that writes commit messages.
//!
//! # Overview
//!
//! nscm forwards every invocation to the real git binary unchanged, except
//! `git commit -m ""`. For that one shape it collects the staged diff, asks a
//! text-generation provider (OpenAI, Anthropic or a local Ollama) for a
//! one-line message, and runs the commit with the message substituted.
//! `--preview` shows the message without committing.
//!
//! `-p` is a short form of `--preview` only when it accompanies an empty
//! `-m`. Anywhere else, including a bare `git commit -p`, it stays git's own
//! `--patch` and the invocation is forwarded untouched.

pub mod commit;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod git;
pub mod llm;
pub mod trigger;

// Re-export commonly used types
pub use commit::{DiffPayload, DiffStats};
pub use config::GenerationSettings;
pub use dispatch::{Dispatcher, Outcome};
pub use error::{NscmError, ProviderError, VcsError};
pub use git::{GitCli, Vcs};
pub use llm::{MessageProvider, PromptRequest};
pub use trigger::{TriggerDecision, classify};
