//! Text-generation providers.
//!
//! Every vendor implements [`MessageProvider`]. [`build_provider`] is the
//! only place that maps a provider identifier to an implementation.

pub mod anthropic;
mod http;
pub mod ollama;
pub mod openai;
pub mod retry;

use async_trait::async_trait;

use crate::config::GenerationSettings;
use crate::error::{NscmError, ProviderError};

pub use anthropic::AnthropicProvider;
pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;

/// One generation call: instructions plus the diff, for a given model.
#[derive(Clone, PartialEq)]
pub struct PromptRequest {
    pub model: String,
    /// Style and format instructions.
    pub system: String,
    /// The diff to summarise. Never logged.
    pub user: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl std::fmt::Debug for PromptRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PromptRequest")
            .field("model", &self.model)
            .field("system_len", &self.system.len())
            .field("user_len", &self.user.len())
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

/// Capability shared by all providers: take a prompt, return free text.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageProvider: Send + Sync {
    /// Human-readable provider name for messages.
    fn name(&self) -> &'static str;

    /// Run a single completion and return the raw response text.
    async fn complete(&self, request: &PromptRequest) -> Result<String, ProviderError>;
}

/// Construct the provider named in `settings`.
///
/// Fails before any network I/O when the provider is unknown or its
/// credential is missing.
pub fn build_provider(
    settings: &GenerationSettings,
) -> Result<Box<dyn MessageProvider>, NscmError> {
    let provider: Box<dyn MessageProvider> = match settings.provider.as_str() {
        "openai" => Box::new(OpenAiProvider::from_settings(settings)?),
        "anthropic" => Box::new(AnthropicProvider::from_settings(settings)?),
        "ollama" => Box::new(OllamaProvider::from_settings(settings)?),
        other => return Err(NscmError::UnsupportedProvider(other.to_string())),
    };
    Ok(provider)
}
