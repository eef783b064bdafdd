//! Prompt construction for generated commit messages.

use crate::commit::diff::DiffPayload;
use crate::llm::PromptRequest;

/// Upper bound on response tokens. A subject line needs far fewer.
pub const MAX_RESPONSE_TOKENS: u32 = 120;
pub const TEMPERATURE: f32 = 0.2;

const BASE_INSTRUCTIONS: &str = "You write git commit messages. \
Reply with a single-line subject of at most 72 characters describing the staged changes. \
Use the present tense (\"add\", \"fix\", \"remove\") and do not end with a period. \
Reply with the subject only: no quotes, no markdown, no explanation.";

const CONVENTIONAL_INSTRUCTIONS: &str = "Follow the Conventional Commits format \
`type(scope): description`, where type is one of feat, fix, build, chore, ci, docs, \
style, refactor, perf, test. The scope is optional; infer it from the primary module \
affected.";

/// System instruction and user message, before a model is chosen.
#[derive(Clone, PartialEq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

impl Prompt {
    pub fn into_request(self, model: &str) -> PromptRequest {
        PromptRequest {
            model: model.to_string(),
            system: self.system,
            user: self.user,
            max_tokens: MAX_RESPONSE_TOKENS,
            temperature: TEMPERATURE,
        }
    }
}

fn style_instructions(style: &str) -> Option<String> {
    let style = style.trim();
    if style.is_empty() {
        None
    } else if style.to_lowercase().starts_with("conventional") {
        Some(CONVENTIONAL_INSTRUCTIONS.to_string())
    } else {
        Some(format!("Style: {}", style))
    }
}

/// Keep diff content from closing the fence it is wrapped in.
fn sanitize_diff(text: &str) -> String {
    text.replace("```", "'''")
}

/// Build the prompt for describing `payload` in the given style.
pub fn build_prompt(style: &str, payload: &DiffPayload) -> Prompt {
    let mut system = BASE_INSTRUCTIONS.to_string();
    if let Some(extra) = style_instructions(style) {
        system.push_str("\n\n");
        system.push_str(&extra);
    }

    let truncation_note = if payload.truncated {
        format!(
            "\n\nNote: the diff was truncated to its first {} of {} lines. \
             Summarise the visible changes; the statistics above cover the full diff.",
            payload.sent_lines(),
            payload.total_lines
        )
    } else {
        String::new()
    };

    let user = format!(
        "Staged changes: {stats}\n\n```diff\n{diff}\n```{truncation_note}",
        stats = payload.stats,
        diff = sanitize_diff(&payload.text),
    );

    Prompt { system, user }
}
