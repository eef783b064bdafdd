//! Argument classification.
//!
//! Classification never fails. Anything unexpected, from non-UTF-8 input to
//! an option combination we do not understand, resolves to
//! [`TriggerDecision::Passthrough`] so normal git usage is never blocked.

use std::ffi::OsString;

use tracing::debug;

use super::{DiffScope, GenerateRequest, MessageSlot, TriggerDecision};

/// Global options taking a separate value (`git -C dir commit`).
const GLOBAL_VALUE_OPTIONS: &[&str] = &[
    "-C",
    "-c",
    "--git-dir",
    "--work-tree",
    "--namespace",
    "--config-env",
];

/// Global options written as `--opt=value`.
const GLOBAL_ATTACHED_OPTIONS: &[&str] = &[
    "--git-dir=",
    "--work-tree=",
    "--namespace=",
    "--config-env=",
];

/// Global flags that are harmless to repeat on the diff query.
const GLOBAL_FLAGS: &[&str] = &[
    "--bare",
    "--no-replace-objects",
    "--literal-pathspecs",
    "--glob-pathspecs",
    "--noglob-pathspecs",
    "--icase-pathspecs",
    "--no-optional-locks",
    "--no-advice",
];

/// Pager flags are accepted but not carried over to captured queries.
const GLOBAL_PAGER_FLAGS: &[&str] = &["-p", "--paginate", "-P", "--no-pager"];

/// Commit options that already supply a message.
const MESSAGE_SOURCE_OPTIONS: &[&str] = &[
    "-F",
    "--file",
    "-C",
    "--reuse-message",
    "-c",
    "--reedit-message",
    "--fixup",
    "--squash",
];

/// Commit options whose value is the next token.
const COMMIT_VALUE_OPTIONS: &[&str] = &[
    "--author",
    "--date",
    "-t",
    "--template",
    "--cleanup",
    "--trailer",
    "--pathspec-from-file",
];

const PREVIEW_LONG: &str = "--preview";
const PREVIEW_SHORT: &str = "-p";

/// Classify an invocation as passthrough or message generation.
pub fn classify(args: &[OsString]) -> TriggerDecision {
    let Some(args) = args.iter().map(|a| a.to_str()).collect::<Option<Vec<&str>>>() else {
        debug!("Non UTF-8 argument; passing through");
        return TriggerDecision::Passthrough;
    };

    let Some((command_index, global_args)) = split_global_options(&args) else {
        return TriggerDecision::Passthrough;
    };

    if args[command_index] != "commit" {
        return TriggerDecision::Passthrough;
    }

    match scan_commit_args(&args, command_index + 1) {
        Some(mut request) => {
            request.global_args = global_args;
            debug!(
                "Trigger detected (slot={:?}, preview={}, scope={:?})",
                request.slot, request.preview, request.scope
            );
            TriggerDecision::Generate(request)
        }
        None => TriggerDecision::Passthrough,
    }
}

/// Walk leading global options. Returns the subcommand index and the global
/// options worth repeating on diff queries, or `None` if something unknown
/// precedes the subcommand.
fn split_global_options(args: &[&str]) -> Option<(usize, Vec<OsString>)> {
    let mut carried = Vec::new();
    let mut i = 0;

    while i < args.len() {
        let arg = args[i];

        if GLOBAL_VALUE_OPTIONS.contains(&arg) {
            let value = args.get(i + 1)?;
            carried.push(OsString::from(arg));
            carried.push(OsString::from(*value));
            i += 2;
        } else if GLOBAL_ATTACHED_OPTIONS.iter().any(|p| arg.starts_with(p))
            || GLOBAL_FLAGS.contains(&arg)
        {
            carried.push(OsString::from(arg));
            i += 1;
        } else if GLOBAL_PAGER_FLAGS.contains(&arg) {
            i += 1;
        } else if arg.starts_with('-') {
            return None;
        } else {
            return Some((i, carried));
        }
    }

    None
}

/// State gathered while scanning the arguments after `commit`.
struct Scan {
    slot: Option<MessageSlot>,
    message_options: usize,
    long_preview: Option<usize>,
    short_preview: Option<usize>,
    scope: DiffScope,
}

/// Scan commit options. `None` means passthrough.
fn scan_commit_args(args: &[&str], start: usize) -> Option<GenerateRequest> {
    let mut scan = Scan {
        slot: None,
        message_options: 0,
        long_preview: None,
        short_preview: None,
        scope: DiffScope::Staged,
    };

    let mut i = start;
    while i < args.len() {
        let arg = args[i];

        if arg == "--" {
            break;
        }

        if arg == "-m" || arg == "--message" {
            scan.message_options += 1;
            i = separate_message(args, i, &mut scan)?;
            continue;
        }

        if let Some(value) = arg.strip_prefix("--message=") {
            scan.message_options += 1;
            if !is_trigger_value(value, &args[i + 1..]) {
                return None;
            }
            scan.slot = Some(MessageSlot::Attached {
                index: i,
                prefix: "--message=".to_string(),
            });
            i += 1;
            continue;
        }

        if arg == PREVIEW_LONG {
            scan.long_preview = Some(i);
        } else if arg == PREVIEW_SHORT {
            scan.short_preview = Some(i);
        } else if arg == "--all" {
            scan.scope = DiffScope::Tracked;
        } else if is_message_source(arg) {
            debug!("Message already supplied via {}", arg);
            return None;
        } else if COMMIT_VALUE_OPTIONS.contains(&arg) {
            i += 1;
        } else if arg.starts_with("--") {
            // Other long flags and `--opt=value` forms carry nothing we need.
        } else if arg.len() > 1 && arg.starts_with('-') {
            i = short_cluster(args, i, &mut scan)?;
            continue;
        }

        i += 1;
    }

    if scan.message_options > 1 {
        debug!("Multiple message options; passing through");
        return None;
    }

    let (slot, mut preview_flags) = match scan.slot {
        // A bare `-p` is git's --patch unless a trigger is present.
        Some(slot) => (slot, scan.short_preview.into_iter().collect::<Vec<_>>()),
        None if scan.long_preview.is_some() => (MessageSlot::Append, Vec::new()),
        None => return None,
    };
    preview_flags.extend(scan.long_preview);

    Some(GenerateRequest {
        slot,
        preview: !preview_flags.is_empty(),
        preview_flags,
        global_args: Vec::new(),
        scope: scan.scope,
    })
}

/// Handle a message option at `i` whose value is the next token. Returns
/// the index to continue from.
fn separate_message(args: &[&str], i: usize, scan: &mut Scan) -> Option<usize> {
    match args.get(i + 1) {
        Some(value) => {
            if !is_trigger_value(value, &args[i + 2..]) {
                return None;
            }
            scan.slot = Some(MessageSlot::Separate { index: i + 1 });
            Some(i + 2)
        }
        None => {
            scan.slot = Some(MessageSlot::Missing { index: i });
            Some(i + 1)
        }
    }
}

/// Handle a short option cluster such as `-am`, `-sm""` or `-vt tmpl`.
/// Returns the index to continue from.
fn short_cluster(args: &[&str], i: usize, scan: &mut Scan) -> Option<usize> {
    let arg = args[i];
    let flags = &arg[1..];

    for (pos, flag) in flags.char_indices() {
        let rest = &flags[pos + flag.len_utf8()..];
        match flag {
            'm' => {
                scan.message_options += 1;
                if rest.is_empty() {
                    return separate_message(args, i, scan);
                }
                if !is_trigger_value(rest, &args[i + 1..]) {
                    return None;
                }
                scan.slot = Some(MessageSlot::Attached {
                    index: i,
                    prefix: arg[..1 + pos + flag.len_utf8()].to_string(),
                });
                return Some(i + 1);
            }
            // -F, -C and -c supply a message.
            'F' | 'C' | 'c' => return None,
            // `p` inside a cluster is --patch; too ambiguous to reinterpret.
            'p' => return None,
            't' => {
                return Some(if rest.is_empty() { i + 2 } else { i + 1 });
            }
            // Optional attached values swallow the rest of the cluster.
            'S' | 'u' => return Some(i + 1),
            'a' => scan.scope = DiffScope::Tracked,
            _ => {}
        }
    }

    Some(i + 1)
}

fn is_message_source(arg: &str) -> bool {
    MESSAGE_SOURCE_OPTIONS.contains(&arg)
        || MESSAGE_SOURCE_OPTIONS
            .iter()
            .filter(|o| o.starts_with("--"))
            .any(|o| arg.starts_with(&format!("{o}=")))
}

/// Whether a message value means "write it for me".
///
/// Empty values and empty quote pairs always qualify. A lone quote character
/// qualifies only when no later token could close it; otherwise the intent is
/// ambiguous and the caller passes through.
fn is_trigger_value(value: &str, remaining: &[&str]) -> bool {
    match value {
        "" | "\"\"" | "''" => true,
        "\"" | "'" => !remaining.iter().any(|t| t.contains(value)),
        _ => false,
    }
}
