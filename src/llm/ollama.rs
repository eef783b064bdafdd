//! Local Ollama provider. Needs no credential.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::GenerationSettings;
use crate::error::ProviderError;

use super::http::{build_client, endpoint, send_json};
use super::{MessageProvider, PromptRequest};

const PROVIDER: &str = "Ollama";
pub const DEFAULT_HOST: &str = "http://localhost:11434";

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    system: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

/// `OLLAMA_HOST` is often given as bare `host:port`.
fn normalize_host(host: &str) -> String {
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("http://{}", host)
    }
}

pub struct OllamaProvider {
    client: Client,
    host: String,
    timeout: Duration,
}

impl OllamaProvider {
    pub fn new(host: Option<String>, timeout: Duration) -> Result<Self, ProviderError> {
        let host = host
            .as_deref()
            .map(normalize_host)
            .unwrap_or_else(|| DEFAULT_HOST.to_string());

        Ok(Self {
            client: build_client(PROVIDER, timeout)?,
            host,
            timeout,
        })
    }

    pub fn from_settings(settings: &GenerationSettings) -> Result<Self, ProviderError> {
        Self::new(settings.base_url.clone(), settings.timeout)
    }
}

#[async_trait]
impl MessageProvider for OllamaProvider {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn complete(&self, request: &PromptRequest) -> Result<String, ProviderError> {
        let body = GenerateRequest {
            model: &request.model,
            system: &request.system,
            prompt: &request.user,
            stream: false,
            options: GenerateOptions {
                temperature: request.temperature,
                num_predict: request.max_tokens,
            },
        };

        let http = self
            .client
            .post(endpoint(&self.host, "api/generate"))
            .json(&body);

        let response: GenerateResponse = send_json(PROVIDER, self.timeout, http).await?;
        Ok(response.response)
    }
}
