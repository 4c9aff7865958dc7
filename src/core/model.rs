// LogWatch - core/model.rs
//
// Core data model types. Pure data definitions with no I/O, no threads,
// no platform dependencies.
//
// These types are the shared vocabulary across all layers.

use crate::core::matcher::Matcher;
use crate::util::constants;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

// =============================================================================
// Watch target
// =============================================================================

/// A file to tail together with the predicate applied to each of its lines.
///
/// Built once per path by the supervisor and moved into the tailer that owns
/// it; never mutated afterwards.
#[derive(Debug, Clone)]
pub struct WatchTarget {
    /// Path as supplied on the command line.
    pub path: PathBuf,
    /// Search term predicate.
    pub matcher: Matcher,
}

impl WatchTarget {
    pub fn new(path: impl Into<PathBuf>, matcher: Matcher) -> Self {
        Self {
            path: path.into(),
            matcher,
        }
    }
}

// =============================================================================
// Match event
// =============================================================================

/// One complete line, from one source, that satisfied the match predicate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchEvent {
    /// Source file the line was read from.
    pub path: PathBuf,

    /// Line content with its terminator (`\n` or `\r\n`) removed.
    pub line: String,

    /// Wall-clock time at which the tailer read the line.
    pub observed_at: DateTime<Utc>,
}

impl MatchEvent {
    pub fn new(path: &Path, line: String) -> Self {
        Self {
            path: path.to_path_buf(),
            line,
            observed_at: Utc::now(),
        }
    }
}

// =============================================================================
// Output format
// =============================================================================

/// How matches are rendered on the output stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// `<path>: Matched: <line>`
    #[default]
    Text,
    /// One JSON object per line: `{"path", "line", "observed_at"}`.
    Json,
}

impl OutputFormat {
    /// Render one event as a complete, newline-terminated record.
    pub fn render(self, event: &MatchEvent) -> String {
        match self {
            Self::Text => format!("{}: Matched: {}\n", event.path.display(), event.line),
            Self::Json => match serde_json::to_string(event) {
                Ok(mut json) => {
                    json.push('\n');
                    json
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to serialise match event; using text");
                    Self::Text.render(event)
                }
            },
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!(
                "unknown output format '{other}' (expected 'text' or 'json')"
            )),
        }
    }
}

// =============================================================================
// Source notices (operator-facing diagnostics)
// =============================================================================

/// Non-match conditions a tailer reports about its source.
///
/// Rendered on the sink's error stream, tagged with the offending path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceNotice {
    /// The file could not be opened; its tailer has stopped.
    Unavailable { path: PathBuf, error: String },

    /// A non-EOF read error occurred; its tailer has stopped.
    ReadFailed { path: PathBuf, error: String },

    /// The file shrank below the read position and is being re-read from
    /// the start.
    Reset {
        path: PathBuf,
        offset: u64,
        size: u64,
    },

    /// An unterminated line grew past the partial-line cap and was dropped.
    /// `bytes` is the chunk dropped when the cap was crossed; the remainder
    /// of that line is skipped without further notices.
    PartialDiscarded { path: PathBuf, bytes: usize },
}

impl SourceNotice {
    /// Path of the source this notice concerns.
    pub fn path(&self) -> &Path {
        match self {
            Self::Unavailable { path, .. }
            | Self::ReadFailed { path, .. }
            | Self::Reset { path, .. }
            | Self::PartialDiscarded { path, .. } => path,
        }
    }
}

impl fmt::Display for SourceNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable { path, error } => {
                write!(f, "{}: cannot open: {error}", path.display())
            }
            Self::ReadFailed { path, error } => {
                write!(f, "{}: read error: {error}", path.display())
            }
            Self::Reset { path, offset, size } => write!(
                f,
                "{}: file truncated (size {size} < offset {offset}), reading from start",
                path.display()
            ),
            Self::PartialDiscarded { path, bytes } => write!(
                f,
                "{}: discarded {bytes} bytes of an unterminated line",
                path.display()
            ),
        }
    }
}

// =============================================================================
// Termination
// =============================================================================

/// Why a tailer stopped.
#[derive(Debug)]
pub enum TerminationReason {
    /// The cancellation token fired. Normal shutdown.
    Cancelled,

    /// The source could not be opened.
    SourceUnavailable(io::Error),

    /// A non-EOF I/O error occurred while reading.
    ReadFailure(io::Error),

    /// The tailer thread unwound instead of returning.
    ///
    /// Only reachable in builds that unwind (debug and test). The release
    /// profile sets `panic = "abort"`, so there a tailer panic ends the
    /// process before the supervisor can join it.
    Panicked,
}

impl TerminationReason {
    /// Whether this outcome contributes to a non-zero exit status.
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::ReadFailure(_) | Self::Panicked)
    }

    /// Short label for logs and summaries.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Cancelled => "cancelled",
            Self::SourceUnavailable(_) => "source unavailable",
            Self::ReadFailure(_) => "read failure",
            Self::Panicked => "panicked",
        }
    }
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SourceUnavailable(e) | Self::ReadFailure(e) => {
                write!(f, "{}: {e}", self.label())
            }
            _ => f.write_str(self.label()),
        }
    }
}

/// Final outcome of one tailer.
#[derive(Debug)]
pub struct TailerOutcome {
    pub path: PathBuf,
    pub reason: TerminationReason,
}

// =============================================================================
// Aggregate report
// =============================================================================

/// Overall process status derived from all tailer outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    /// No tailer failed.
    Success,
    /// At least one tailer ended in a read failure.
    PartialFailure,
}

impl ExitStatus {
    /// Process exit code for this status.
    pub fn code(self) -> u8 {
        match self {
            Self::Success => constants::EXIT_SUCCESS,
            Self::PartialFailure => constants::EXIT_PARTIAL_FAILURE,
        }
    }
}

/// Outcomes of every tailer the supervisor started, in request order.
#[derive(Debug)]
pub struct WatchReport {
    pub outcomes: Vec<TailerOutcome>,
}

impl WatchReport {
    pub fn new(outcomes: Vec<TailerOutcome>) -> Self {
        Self { outcomes }
    }

    /// Aggregate status: `PartialFailure` if any tailer failed.
    pub fn status(&self) -> ExitStatus {
        if self.outcomes.iter().any(|o| o.reason.is_failure()) {
            ExitStatus::PartialFailure
        } else {
            ExitStatus::Success
        }
    }

    /// Paths whose tailer did not fail.
    pub fn succeeded(&self) -> impl Iterator<Item = &Path> {
        self.outcomes
            .iter()
            .filter(|o| !o.reason.is_failure())
            .map(|o| o.path.as_path())
    }

    /// Outcomes that contribute to a non-zero exit status.
    pub fn failed(&self) -> impl Iterator<Item = &TailerOutcome> {
        self.outcomes.iter().filter(|o| o.reason.is_failure())
    }

    /// Outcome for a specific path, if a tailer ran for it.
    pub fn outcome_for(&self, path: &Path) -> Option<&TerminationReason> {
        self.outcomes
            .iter()
            .find(|o| o.path == path)
            .map(|o| &o.reason)
    }
}
