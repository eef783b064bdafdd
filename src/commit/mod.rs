//! Generated commit messages: diff collection, prompt, and generation.

pub mod diff;
pub mod message;
pub mod prompt;

pub use diff::{DiffPayload, DiffStats, collect_diff};
pub use message::{extract_message, generate_message};
pub use prompt::{Prompt, build_prompt};
