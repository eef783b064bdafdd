//! Layered configuration: environment variables, then `~/.nscmrc`, then defaults.
//!
//! Resolution happens once per invocation and produces an immutable
//! [`GenerationSettings`]. The environment is passed in as a lookup function
//! so the layering can be tested without touching the process environment.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, warn};

pub const PROVIDER_ENV_VAR: &str = "NSCM_PROVIDER";
pub const MODEL_ENV_VAR: &str = "NSCM_MODEL";
pub const STYLE_ENV_VAR: &str = "NSCM_STYLE";
pub const TIMEOUT_ENV_VAR: &str = "NSCM_TIMEOUT";
pub const GIT_TIMEOUT_ENV_VAR: &str = "NSCM_GIT_TIMEOUT";
pub const MAX_DIFF_LINES_ENV_VAR: &str = "NSCM_MAX_DIFF_LINES";

pub const DEFAULT_PROVIDER: &str = "openai";
pub const DEFAULT_STYLE: &str = "conventional";
pub const DEFAULT_TIMEOUT_SECS: u64 = 20;
pub const DEFAULT_GIT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MAX_DIFF_LINES: usize = 500;

/// Name of the optional config file in the user's home directory.
pub const CONFIG_FILE_NAME: &str = ".nscmrc";

/// Values read from the flat `key: value` config file.
///
/// Only `provider`, `model` and `style` are recognised.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileConfig {
    pub provider: Option<String>,
    pub model: Option<String>,
    pub style: Option<String>,
}

impl FileConfig {
    /// Parse `key: value` lines. Blank lines, `#` comments, lines without a
    /// colon, empty values and unknown keys are skipped.
    pub fn parse(contents: &str) -> Self {
        let mut config = FileConfig::default();

        for raw in contents.lines() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let value = value.trim();
            if value.is_empty() {
                continue;
            }

            match key.trim() {
                "provider" => config.provider = Some(value.to_string()),
                "model" => config.model = Some(value.to_string()),
                "style" => config.style = Some(value.to_string()),
                other => debug!("Ignoring unknown config key '{}'", other),
            }
        }

        config
    }

    /// Read and parse the config file at `path`. A missing file yields the
    /// empty config.
    pub fn load(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(contents) => Ok(Self::parse(&contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
        }
    }

    /// Load `~/.nscmrc`, warning and falling back to empty on read errors.
    pub fn load_user() -> Self {
        let Some(path) = config_path() else {
            debug!("No home directory; skipping {}", CONFIG_FILE_NAME);
            return Self::default();
        };

        Self::load(&path).unwrap_or_else(|e| {
            warn!("{:#}", e);
            Self::default()
        })
    }
}

/// Location of the user config file, if a home directory exists.
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(CONFIG_FILE_NAME))
}

/// Immutable settings for one generation request.
#[derive(Clone, PartialEq, Eq)]
pub struct GenerationSettings {
    pub provider: String,
    pub model: String,
    pub style: String,
    /// Provider credential, if the provider needs one and it is set.
    pub api_key: Option<String>,
    /// Endpoint override for the provider (tests, proxies, remote Ollama).
    pub base_url: Option<String>,
    pub timeout: Duration,
    pub max_diff_lines: usize,
}

impl fmt::Debug for GenerationSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationSettings")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("style", &self.style)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("max_diff_lines", &self.max_diff_lines)
            .finish()
    }
}

/// Default model for a provider when neither env nor file names one.
pub fn default_model(provider: &str) -> &'static str {
    match provider {
        "anthropic" => "claude-3-5-haiku-latest",
        "ollama" => "llama3.2",
        _ => "gpt-4o-mini",
    }
}

/// Environment variables holding the credential and endpoint for a provider.
fn provider_env_vars(provider: &str) -> (Option<&'static str>, &'static str) {
    match provider {
        "anthropic" => (Some("ANTHROPIC_API_KEY"), "ANTHROPIC_BASE_URL"),
        "ollama" => (None, "OLLAMA_HOST"),
        _ => (Some("OPENAI_API_KEY"), "OPENAI_BASE_URL"),
    }
}

/// Look up an env var, treating empty values as unset.
fn non_empty<F>(env: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    env(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Parse a numeric env var, warning and using `default` when invalid.
fn numeric<F, T>(env: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr + Copy + PartialOrd + Default + fmt::Display,
{
    match non_empty(env, key) {
        Some(v) => match v.parse::<T>() {
            Ok(n) if n > T::default() => n,
            _ => {
                warn!("Invalid {} value '{}', using default {}", key, v, default);
                default
            }
        },
        None => default,
    }
}

/// Resolve settings with strict precedence: env, then file, then defaults.
pub fn resolve<F>(env: F, file: &FileConfig) -> GenerationSettings
where
    F: Fn(&str) -> Option<String>,
{
    let provider = non_empty(&env, PROVIDER_ENV_VAR)
        .or_else(|| file.provider.clone())
        .unwrap_or_else(|| DEFAULT_PROVIDER.to_string())
        .to_lowercase();

    let model = non_empty(&env, MODEL_ENV_VAR)
        .or_else(|| file.model.clone())
        .unwrap_or_else(|| default_model(&provider).to_string());

    let style = non_empty(&env, STYLE_ENV_VAR)
        .or_else(|| file.style.clone())
        .unwrap_or_else(|| DEFAULT_STYLE.to_string());

    let (key_var, url_var) = provider_env_vars(&provider);
    let api_key = key_var.and_then(|var| non_empty(&env, var));
    let base_url = non_empty(&env, url_var);

    let timeout = Duration::from_secs(numeric(&env, TIMEOUT_ENV_VAR, DEFAULT_TIMEOUT_SECS));
    let max_diff_lines = numeric(&env, MAX_DIFF_LINES_ENV_VAR, DEFAULT_MAX_DIFF_LINES);

    GenerationSettings {
        provider,
        model,
        style,
        api_key,
        base_url,
        timeout,
        max_diff_lines,
    }
}

/// Resolve settings from the real process environment and `~/.nscmrc`.
pub fn resolve_from_environment() -> GenerationSettings {
    let file = FileConfig::load_user();
    resolve(|key| std::env::var(key).ok(), &file)
}

/// Timeout for captured git queries (diff and stat).
pub fn git_timeout<F>(env: F) -> Duration
where
    F: Fn(&str) -> Option<String>,
{
    Duration::from_secs(numeric(&env, GIT_TIMEOUT_ENV_VAR, DEFAULT_GIT_TIMEOUT_SECS))
}
