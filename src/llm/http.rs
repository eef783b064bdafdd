//! Shared reqwest plumbing for HTTP providers.
//!
//! Errors produced here carry status codes and error categories only.
//! Response bodies are never read into an error or a log line.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::ProviderError;

/// Build a client whose every request is bounded by `timeout`.
pub(crate) fn build_client(
    provider: &'static str,
    timeout: Duration,
) -> Result<Client, ProviderError> {
    Client::builder()
        .timeout(timeout)
        .user_agent(concat!("nscm/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| ProviderError::Transport {
            provider,
            reason: e.without_url().to_string(),
        })
}

/// Join a base URL and a path without doubling slashes.
pub(crate) fn endpoint(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

fn classify_reqwest_error(
    provider: &'static str,
    timeout_secs: u64,
    err: reqwest::Error,
) -> ProviderError {
    if err.is_timeout() {
        ProviderError::Timeout {
            provider,
            secs: timeout_secs,
        }
    } else if err.is_decode() {
        ProviderError::InvalidResponse {
            provider,
            reason: "response body is not the expected JSON".to_string(),
        }
    } else {
        ProviderError::Transport {
            provider,
            reason: err.without_url().to_string(),
        }
    }
}

/// Send a prepared request and decode a successful JSON response.
pub(crate) async fn send_json<R>(
    provider: &'static str,
    timeout: Duration,
    request: RequestBuilder,
) -> Result<R, ProviderError>
where
    R: DeserializeOwned,
{
    let timeout_secs = timeout.as_secs();

    let response = request
        .send()
        .await
        .map_err(|e| classify_reqwest_error(provider, timeout_secs, e))?;

    let status = response.status();
    debug!("{} responded with HTTP {}", provider, status.as_u16());

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(ProviderError::AuthRejected {
            provider,
            status: status.as_u16(),
        });
    }

    if !status.is_success() {
        return Err(ProviderError::HttpStatus {
            provider,
            status: status.as_u16(),
        });
    }

    response
        .json::<R>()
        .await
        .map_err(|e| classify_reqwest_error(provider, timeout_secs, e))
}
