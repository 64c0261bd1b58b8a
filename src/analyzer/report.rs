//! Run summary

use crate::types::{Diagnostic, Severity};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// How semantic answers were available during a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SemanticMode {
    #[default]
    Disabled,
    Enabled,
    /// Configured but the service could not be started
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SinkFailure {
    pub path: PathBuf,
    pub chunk: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub project_id: String,
    pub branch: String,
    pub semantic: SemanticMode,
    /// Files with an enabled extension found under the root
    pub files_discovered: usize,
    /// Files that went through phase 2 and produced chunks
    pub files_analyzed: usize,
    pub chunks_emitted: usize,
    pub skipped: Vec<SkippedFile>,
    pub unindexed: Vec<SkippedFile>,
    /// Files not finished because the run was cancelled
    pub files_cancelled: usize,
    /// FQNs of emitted chunks with incomplete inheritance
    pub incomplete_chunks: Vec<String>,
    pub sink_failures: Vec<SinkFailure>,
    /// Files with at least one chunk the sink rejected
    pub failed_exports: Vec<PathBuf>,
    pub sessions_opened: usize,
    pub sessions_failed: usize,
    pub diagnostics: Vec<Diagnostic>,
    pub cancelled: bool,
    pub budget_exhausted: bool,
    #[serde(rename = "elapsed_ms", serialize_with = "as_millis")]
    pub elapsed: Duration,
}

fn as_millis<S: serde::Serializer>(elapsed: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(elapsed.as_millis() as u64)
}

impl RunReport {
    pub fn new(project_id: impl Into<String>, branch: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            branch: branch.into(),
            ..Self::default()
        }
    }

    /// Nothing skipped, rejected or flagged
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
            && self.unindexed.is_empty()
            && self.sink_failures.is_empty()
            && self.incomplete_chunks.is_empty()
            && !self.cancelled
    }

    pub fn diagnostics_with_code<'a>(
        &'a self,
        code: &'a str,
    ) -> impl Iterator<Item = &'a Diagnostic> {
        self.diagnostics.iter().filter(move |d| d.code == code)
    }

    pub fn count_severity(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }

    pub(crate) fn record_sink_failure(&mut self, path: PathBuf, chunk: String, error: String) {
        if !self.failed_exports.contains(&path) {
            self.failed_exports.push(path.clone());
        }
        self.sink_failures.push(SinkFailure { path, chunk, error });
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Analysis of {}@{}", self.project_id, self.branch)?;
        writeln!(f, "  Files discovered:  {}", self.files_discovered)?;
        writeln!(f, "  Files analyzed:    {}", self.files_analyzed)?;
        writeln!(f, "  Chunks emitted:    {}", self.chunks_emitted)?;
        writeln!(f, "  Incomplete chunks: {}", self.incomplete_chunks.len())?;
        writeln!(f, "  Skipped files:     {}", self.skipped.len())?;
        writeln!(f, "  Unindexed files:   {}", self.unindexed.len())?;
        if !self.sink_failures.is_empty() {
            writeln!(f, "  Sink failures:     {}", self.sink_failures.len())?;
        }
        writeln!(
            f,
            "  Semantic:          {:?} ({} sessions, {} failed)",
            self.semantic, self.sessions_opened, self.sessions_failed
        )?;
        writeln!(
            f,
            "  Diagnostics:       {} warnings, {} errors",
            self.count_severity(Severity::Warning),
            self.count_severity(Severity::Error)
        )?;
        if self.cancelled {
            writeln!(f, "  Cancelled files:   {}", self.files_cancelled)?;
            let why = if self.budget_exhausted {
                "time budget exhausted"
            } else {
                "cancelled"
            };
            writeln!(f, "  Run stopped early: {why}")?;
        }
        write!(f, "  Elapsed:           {:.2}s", self.elapsed.as_secs_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_report_is_clean() {
        let report = RunReport::new("demo", "main");
        assert!(report.is_clean());
        assert_eq!(report.semantic, SemanticMode::Disabled);
    }

    #[test]
    fn sink_failures_mark_the_file_once() {
        let mut report = RunReport::new("demo", "main");
        report.record_sink_failure("A.java".into(), "p.A".into(), "disk full".into());
        report.record_sink_failure("A.java".into(), "p.A.Inner".into(), "disk full".into());
        assert_eq!(report.sink_failures.len(), 2);
        assert_eq!(report.failed_exports, vec![PathBuf::from("A.java")]);
        assert!(!report.is_clean());
    }

    #[test]
    fn summary_mentions_totals() {
        let mut report = RunReport::new("demo", "main");
        report.files_discovered = 3;
        report.chunks_emitted = 5;
        report.cancelled = true;
        report.budget_exhausted = true;
        report
            .diagnostics
            .push(Diagnostic::warning("PARSE_SKIPPED", "bad file"));

        let text = report.to_string();
        assert!(text.contains("Files discovered:  3"));
        assert!(text.contains("Chunks emitted:    5"));
        assert!(text.contains("time budget exhausted"));
        assert!(text.contains("1 warnings"));
        assert_eq!(report.diagnostics_with_code("PARSE_SKIPPED").count(), 1);
    }

    #[test]
    fn serializes_elapsed_as_millis() {
        let mut report = RunReport::new("demo", "main");
        report.elapsed = Duration::from_millis(1500);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["elapsed_ms"], 1500);
        assert_eq!(json["semantic"], "disabled");
    }
}
