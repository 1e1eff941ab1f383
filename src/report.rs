//! Per-request conversion log.
//!
//! Every informational, skip, success and failure message of a request is
//! appended here in processing order and mirrored to `tracing`. The rendered
//! log prefixes each line with a marker per kind, so failures can be told
//! apart from successes by a human or a test scanning the text.

use serde::Serialize;
use std::fmt;

/// Broad class of a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Info,
    Converted,
    Skipped,
    Failed,
}

impl EntryKind {
    /// Line prefix used when rendering.
    pub fn marker(&self) -> &'static str {
        match self {
            EntryKind::Info => "[INFO]",
            EntryKind::Converted => "[OK]",
            EntryKind::Skipped => "[SKIP]",
            EntryKind::Failed => "[FAIL]",
        }
    }
}

/// Per-item problems that drop one upload, archive or task but let the
/// request continue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Issue {
    /// A named upload does not exist.
    MissingUpload,
    /// An archive's uncompressed size exceeds the budget.
    ArchiveTooLarge,
    /// An archive could not be opened or extracted.
    ArchiveUnreadable,
    /// The source/target pair is not in the routing table.
    Unconvertible,
    /// The converter failed or produced nothing.
    ConversionFailed,
    /// Every task was skipped or failed.
    NoOutputsProduced,
}

impl Issue {
    pub fn as_str(&self) -> &'static str {
        match self {
            Issue::MissingUpload => "missing-upload",
            Issue::ArchiveTooLarge => "archive-too-large",
            Issue::ArchiveUnreadable => "archive-unreadable",
            Issue::Unconvertible => "unconvertible",
            Issue::ConversionFailed => "conversion-failed",
            Issue::NoOutputsProduced => "no-outputs-produced",
        }
    }

    /// Entry kind the issue is reported under.
    pub fn kind(&self) -> EntryKind {
        match self {
            Issue::MissingUpload | Issue::Unconvertible => EntryKind::Skipped,
            Issue::ArchiveTooLarge | Issue::ArchiveUnreadable | Issue::ConversionFailed => {
                EntryKind::Failed
            }
            Issue::NoOutputsProduced => EntryKind::Info,
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One line of the request log, optionally followed by captured tool output.
#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub kind: EntryKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue: Option<Issue>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_output: Option<String>,
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ", self.kind.marker())?;
        if let Some(issue) = self.issue {
            write!(f, "{issue}: ")?;
        }
        f.write_str(&self.message)?;

        if let Some(output) = &self.tool_output {
            for line in output.lines() {
                write!(f, "\n    {line}")?;
            }
        }
        Ok(())
    }
}

/// Ordered log of one request.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConversionLog {
    entries: Vec<LogEntry>,
}

impl ConversionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn info(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::info!("{}", message);
        self.push(EntryKind::Info, None, message, None);
    }

    /// Record a successful conversion with the tool's captured text.
    pub fn converted(&mut self, message: impl Into<String>, tool_output: impl Into<String>) {
        let message = message.into();
        tracing::info!("Converted {}", message);
        self.push(EntryKind::Converted, None, message, Some(tool_output.into()));
    }

    /// Record a per-item problem.
    pub fn issue(&mut self, issue: Issue, message: impl Into<String>, tool_output: Option<String>) {
        let message = message.into();
        match issue.kind() {
            EntryKind::Info => tracing::info!("{}: {}", issue, message),
            _ => tracing::warn!("{}: {}", issue, message),
        }
        self.push(issue.kind(), Some(issue), message, tool_output);
    }

    fn push(
        &mut self,
        kind: EntryKind,
        issue: Option<Issue>,
        message: String,
        tool_output: Option<String>,
    ) {
        let tool_output = tool_output.filter(|text| !text.trim().is_empty());
        self.entries.push(LogEntry {
            kind,
            issue,
            message,
            tool_output,
        });
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries of the given kind.
    pub fn count(&self, kind: EntryKind) -> usize {
        self.entries.iter().filter(|e| e.kind == kind).count()
    }

    /// Entries reporting the given issue.
    pub fn issues(&self, issue: Issue) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter().filter(move |e| e.issue == Some(issue))
    }

    /// Render all entries, one per line, in processing order.
    pub fn render(&self) -> String {
        self.entries
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl fmt::Display for ConversionLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}
