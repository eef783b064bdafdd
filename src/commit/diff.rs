//! Staged diff collection and truncation.

use std::ffi::OsString;
use std::fmt;
use std::sync::LazyLock;

use regex_lite::Regex;
use tracing::debug;

use crate::error::{NscmError, VcsError};
use crate::git::Vcs;
use crate::trigger::{DiffScope, GenerateRequest};

static FILES_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+) files? changed").expect("Invalid regex"));
static INSERTIONS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+) insertions?\(\+\)").expect("Invalid regex"));
static DELETIONS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+) deletions?\(-\)").expect("Invalid regex"));

/// Change statistics of the full, untruncated diff.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiffStats {
    pub files_changed: usize,
    pub insertions: usize,
    pub deletions: usize,
}

impl fmt::Display for DiffStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let plural = |n: usize| if n == 1 { "" } else { "s" };
        write!(
            f,
            "{} file{} changed, {} insertion{}(+), {} deletion{}(-)",
            self.files_changed,
            plural(self.files_changed),
            self.insertions,
            plural(self.insertions),
            self.deletions,
            plural(self.deletions),
        )
    }
}

/// Parse `git diff --shortstat` output.
///
/// Missing parts (a diff with only deletions has no insertions clause) count
/// as zero.
pub fn parse_shortstat(summary: &str) -> DiffStats {
    let capture = |re: &Regex| {
        re.captures(summary)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(0)
    };

    DiffStats {
        files_changed: capture(&FILES_RE),
        insertions: capture(&INSERTIONS_RE),
        deletions: capture(&DELETIONS_RE),
    }
}

/// The diff handed to the generator.
///
/// `text` never holds more than the line cap. `stats` and `total_lines`
/// always describe the full diff.
#[derive(Clone, PartialEq, Eq)]
pub struct DiffPayload {
    pub text: String,
    pub stats: DiffStats,
    pub total_lines: usize,
    pub truncated: bool,
}

impl DiffPayload {
    /// Build a payload keeping the first `line_cap` whole lines of `raw`.
    pub fn new(raw: &str, stats: DiffStats, line_cap: usize) -> Self {
        let total_lines = raw.lines().count();
        let truncated = total_lines > line_cap;

        let text = if truncated {
            raw.lines().take(line_cap).collect::<Vec<_>>().join("\n")
        } else {
            raw.trim_end_matches('\n').to_string()
        };

        Self {
            text,
            stats,
            total_lines,
            truncated,
        }
    }

    /// Number of diff lines actually sent to the provider.
    pub fn sent_lines(&self) -> usize {
        self.text.lines().count()
    }
}

// The diff body is confidential; Debug shows only its shape.
impl fmt::Debug for DiffPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiffPayload")
            .field("text", &format_args!("<{} bytes>", self.text.len()))
            .field("stats", &self.stats)
            .field("total_lines", &self.total_lines)
            .field("truncated", &self.truncated)
            .finish()
    }
}

/// Arguments for a diff query in `scope`.
pub fn diff_args(request: &GenerateRequest, scope: DiffScope, shortstat: bool) -> Vec<OsString> {
    let mut args = request.global_args.clone();
    args.extend(["--no-pager", "--no-optional-locks", "diff"].map(OsString::from));

    match scope {
        DiffScope::Staged => args.push(OsString::from("--cached")),
        DiffScope::Tracked => args.push(OsString::from("HEAD")),
    }

    args.extend(["--no-color", "--no-ext-diff"].map(OsString::from));
    if shortstat {
        args.push(OsString::from("--shortstat"));
    }

    args
}

/// Arguments checking whether HEAD points at a commit.
fn head_args(request: &GenerateRequest) -> Vec<OsString> {
    let mut args = request.global_args.clone();
    args.extend(["rev-parse", "--verify", "-q", "HEAD"].map(OsString::from));
    args
}

/// The scope to diff in. An unborn branch has no HEAD to diff against, so
/// `commit -a` there records exactly the index.
async fn effective_scope<V>(vcs: &V, request: &GenerateRequest) -> Result<DiffScope, NscmError>
where
    V: Vcs + ?Sized,
{
    if request.scope == DiffScope::Staged {
        return Ok(DiffScope::Staged);
    }

    match vcs.diff(&head_args(request)).await {
        Ok(_) => Ok(DiffScope::Tracked),
        Err(VcsError::NonZeroExit { .. }) => {
            debug!("HEAD is unborn; describing the index");
            Ok(DiffScope::Staged)
        }
        Err(e) => Err(e.into()),
    }
}

/// Collect the staged diff and its statistics.
///
/// Fails with [`NoStagedChanges`](NscmError::NoStagedChanges) when there is
/// nothing to describe, before any provider is contacted.
pub async fn collect_diff<V>(
    vcs: &V,
    request: &GenerateRequest,
    line_cap: usize,
) -> Result<DiffPayload, NscmError>
where
    V: Vcs + ?Sized,
{
    let scope = effective_scope(vcs, request).await?;

    let raw = vcs.diff(&diff_args(request, scope, false)).await?;
    if raw.trim().is_empty() {
        return Err(NscmError::NoStagedChanges);
    }

    let summary = vcs.diff(&diff_args(request, scope, true)).await?;
    let stats = parse_shortstat(&summary);

    let payload = DiffPayload::new(&raw, stats, line_cap);
    debug!(
        "Collected diff: {}, {} lines, truncated={}",
        payload.stats, payload.total_lines, payload.truncated
    );

    Ok(payload)
}
