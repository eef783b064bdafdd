//! Detection of the `git commit -m ""` trigger and message substitution.

pub mod classify;

use std::ffi::OsString;

pub use classify::classify;

/// Which changes the commit will record, and therefore which diff to describe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffScope {
    /// Only what is in the index (`git diff --cached`).
    Staged,
    /// All tracked changes, for `commit -a` (`git diff HEAD`).
    Tracked,
}

/// Where the generated message goes in the argument list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageSlot {
    /// `-m ""`: the value token at `index` is replaced.
    Separate { index: usize },
    /// `--message=` or `-m"`: the token at `index` becomes `prefix + message`.
    Attached { index: usize, prefix: String },
    /// A trailing `-m` with no value: the message is inserted after `index`.
    Missing { index: usize },
    /// No message option at all (`commit --preview`): `-m <message>` is appended.
    Append,
}

/// Everything the pipeline needs to generate and substitute a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateRequest {
    pub slot: MessageSlot,
    /// Display the message without committing.
    pub preview: bool,
    /// Indices of preview flags, which git must never see.
    pub preview_flags: Vec<usize>,
    /// Git global options that preceded `commit` (e.g. `-C <dir>`).
    pub global_args: Vec<OsString>,
    pub scope: DiffScope,
}

impl GenerateRequest {
    /// Build the argument list for the real commit, with `message` placed in
    /// the slot as a single argument and preview flags removed.
    pub fn commit_args(&self, args: &[OsString], message: &str) -> Vec<OsString> {
        let mut out = Vec::with_capacity(args.len() + 2);

        for (i, arg) in args.iter().enumerate() {
            if self.preview_flags.contains(&i) {
                continue;
            }

            match &self.slot {
                MessageSlot::Separate { index } if *index == i => {
                    out.push(OsString::from(message));
                }
                MessageSlot::Attached { index, prefix } if *index == i => {
                    out.push(OsString::from(format!("{prefix}{message}")));
                }
                MessageSlot::Missing { index } if *index == i => {
                    out.push(arg.clone());
                    out.push(OsString::from(message));
                }
                _ => out.push(arg.clone()),
            }
        }

        if self.slot == MessageSlot::Append {
            out.push(OsString::from("-m"));
            out.push(OsString::from(message));
        }

        out
    }
}

/// Outcome of classifying an invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerDecision {
    /// Forward the original arguments to git untouched.
    Passthrough,
    /// Generate a message and substitute it.
    Generate(GenerateRequest),
}
