//! Commit message generation and response cleanup.

use tracing::debug;

use crate::commit::diff::DiffPayload;
use crate::commit::prompt::build_prompt;
use crate::config::GenerationSettings;
use crate::error::{NscmError, ProviderError};
use crate::llm::MessageProvider;
use crate::llm::retry::retry_with_backoff;

/// Longest message accepted from a provider, in characters.
pub const MAX_MESSAGE_CHARS: usize = 120;

/// Labels models like to put in front of the answer. Matched
/// case-insensitively.
const LABELS: &[&str] = &["commit message:", "commit:", "subject:", "message:"];

/// Wrappers stripped when they surround the whole line.
const WRAPPERS: &[&str] = &["**", "`", "\"", "'"];

fn strip_label(line: &str) -> &str {
    // Labels are often bolded: `**Subject:** ...`
    let bare = line.trim_start_matches('*');
    for label in LABELS {
        if let Some(prefix) = bare.get(..label.len())
            && prefix.eq_ignore_ascii_case(label)
        {
            return bare[label.len()..].trim_start_matches('*').trim();
        }
    }
    line
}

fn strip_wrappers(mut line: &str) -> &str {
    loop {
        let wrapper = WRAPPERS.iter().find(|w| {
            line.len() >= w.len() * 2 && line.starts_with(**w) && line.ends_with(**w)
        });
        match wrapper {
            Some(w) => line = line[w.len()..line.len() - w.len()].trim(),
            None => return line,
        }
    }
}

fn truncate_chars(line: &str, max: usize) -> &str {
    match line.char_indices().nth(max) {
        Some((end, _)) => line[..end].trim_end(),
        None => line,
    }
}

/// Pull a single-line commit message out of free-form provider output.
///
/// Returns `None` when nothing usable remains.
pub fn extract_message(raw: &str) -> Option<String> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.starts_with("```"))
        .map(|line| strip_wrappers(strip_label(strip_wrappers(line))))
        .find(|line| !line.is_empty())
        .map(|line| truncate_chars(line, MAX_MESSAGE_CHARS).to_string())
}

/// Generate a commit message for `payload` with `provider`.
pub async fn generate_message<P>(
    provider: &P,
    settings: &GenerationSettings,
    payload: &DiffPayload,
) -> Result<String, NscmError>
where
    P: MessageProvider + ?Sized,
{
    let request = build_prompt(&settings.style, payload).into_request(&settings.model);

    debug!(
        "Requesting message from {} (model {}, {} diff lines, truncated={})",
        provider.name(),
        settings.model,
        payload.sent_lines(),
        payload.truncated
    );

    let raw = retry_with_backoff(
        || provider.complete(&request),
        ProviderError::is_retryable,
        |e| ProviderError::RetriesExhausted(Box::new(e)),
    )
    .await?;

    debug!("Provider returned {} bytes", raw.len());

    extract_message(&raw).ok_or(NscmError::EmptyGeneration)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commit::diff::DiffStats;
    use crate::config::{FileConfig, resolve};
    use crate::llm::MockMessageProvider;

    fn settings() -> GenerationSettings {
        resolve(|_| None, &FileConfig::default())
    }

    fn payload() -> DiffPayload {
        DiffPayload::new("+fn main() {}\n", DiffStats::default(), 500)
    }

    #[test]
    fn test_extract_plain_line() {
        assert_eq!(
            extract_message("feat: add login\n").as_deref(),
            Some("feat: add login")
        );
    }

    #[test]
    fn test_extract_skips_fences_and_blank_lines() {
        let raw = "```\n\n  fix(parser): handle empty input  \n```\n";
        assert_eq!(
            extract_message(raw).as_deref(),
            Some("fix(parser): handle empty input")
        );
    }

    #[test]
    fn test_extract_strips_label_and_quotes() {
        assert_eq!(
            extract_message("Commit message: \"chore: bump deps\"").as_deref(),
            Some("chore: bump deps")
        );
        assert_eq!(
            extract_message("**Subject:** `docs: fix typo`").as_deref(),
            Some("docs: fix typo")
        );
    }

    #[test]
    fn test_extract_label_on_its_own_line() {
        let raw = "Commit message:\nrefactor: split module\n";
        assert_eq!(extract_message(raw).as_deref(), Some("refactor: split module"));
    }

    #[test]
    fn test_extract_keeps_inner_quotes() {
        assert_eq!(
            extract_message("fix: don't panic on 'empty' input").as_deref(),
            Some("fix: don't panic on 'empty' input")
        );
    }

    #[test]
    fn test_extract_caps_length_on_char_boundary() {
        let long = "é".repeat(200);
        let message = extract_message(&long).unwrap();
        assert_eq!(message.chars().count(), MAX_MESSAGE_CHARS);
    }

    #[test]
    fn test_extract_empty_is_none() {
        assert_eq!(extract_message(""), None);
        assert_eq!(extract_message("```\n```\n  \n"), None);
        assert_eq!(extract_message("\"\""), None);
    }

    #[tokio::test]
    async fn test_generate_returns_cleaned_message() {
        let mut provider = MockMessageProvider::new();
        provider.expect_name().return_const("Mock");
        provider
            .expect_complete()
            .withf(|request| request.user.contains("+fn main() {}") && request.model == "gpt-4o-mini")
            .times(1)
            .returning(|_| Ok("\"feat: add entry point\"\n".to_string()));

        let message = generate_message(&provider, &settings(), &payload()).await.unwrap();
        assert_eq!(message, "feat: add entry point");
    }

    #[tokio::test]
    async fn test_generate_blank_response_is_empty_generation() {
        let mut provider = MockMessageProvider::new();
        provider.expect_name().return_const("Mock");
        provider.expect_complete().returning(|_| Ok("   \n".to_string()));

        let result = generate_message(&provider, &settings(), &payload()).await;
        assert!(matches!(result, Err(NscmError::EmptyGeneration)));
    }

    #[tokio::test]
    async fn test_generate_auth_rejected_is_not_retried() {
        let mut provider = MockMessageProvider::new();
        provider.expect_name().return_const("Mock");
        provider.expect_complete().times(1).returning(|_| {
            Err(ProviderError::AuthRejected {
                provider: "Mock",
                status: 401,
            })
        });

        let err = generate_message(&provider, &settings(), &payload())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "ProviderAuthMissing");
    }

    #[tokio::test(start_paused = true)]
    async fn test_generate_timeout_retried_then_reported() {
        let mut provider = MockMessageProvider::new();
        provider.expect_name().return_const("Mock");
        provider.expect_complete().times(2).returning(|_| {
            Err(ProviderError::Timeout {
                provider: "Mock",
                secs: 20,
            })
        });

        let err = generate_message(&provider, &settings(), &payload())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "ProviderTimeout");
        assert_eq!(err.exit_code(), 5);
    }
}
