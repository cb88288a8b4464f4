//! Shared data models: extracted records, blame data, outcomes and results.

pub mod outcome;

pub use outcome::{Outcome, Stage};

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// Authorship data looked up from the blame facility for one source line.
pub struct BlameInfo {
    pub revision: String,
    pub user: String,
    /// Source text of the blamed line, when the blame format carries it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blame_line: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// A compiler error or warning pinned to a physical line of a file.
pub struct SourceIssue {
    pub file: String,
    pub line: usize,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blame: Option<BlameInfo>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    Fail,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// One failing test and the traceback printed for it.
pub struct TestFailure {
    #[serde(rename = "failure")]
    pub kind: FailureKind,
    pub test: String,
    /// Dotted module path until the traceback resolver finds a real path.
    pub file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    pub traceback: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blame: Option<BlameInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// An uncaught exception that aborted the build script.
pub struct ExceptionBlock {
    pub traceback: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkError {
    pub source_name: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnknownError {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
/// One detected issue, tagged by the grammar that produced it.
pub enum Record {
    CompileError(SourceIssue),
    LinkError(LinkError),
    Exception(ExceptionBlock),
    UnknownError(UnknownError),
    Warning(SourceIssue),
    TestFailure(TestFailure),
}

impl Record {
    /// Source file this record is grouped under. Link and unknown errors have none.
    pub fn file(&self) -> Option<&str> {
        match self {
            Record::CompileError(i) | Record::Warning(i) => Some(&i.file),
            Record::TestFailure(t) => Some(&t.file),
            Record::Exception(e) => e.file.as_deref(),
            Record::LinkError(_) | Record::UnknownError(_) => None,
        }
    }

    /// 1-based physical line in `file()`, when known.
    pub fn line(&self) -> Option<usize> {
        match self {
            Record::CompileError(i) | Record::Warning(i) => Some(i.line),
            Record::TestFailure(t) => t.line,
            Record::Exception(e) => e.line,
            Record::LinkError(_) | Record::UnknownError(_) => None,
        }
    }

    pub fn blame(&self) -> Option<&BlameInfo> {
        match self {
            Record::CompileError(i) | Record::Warning(i) => i.blame.as_ref(),
            Record::TestFailure(t) => t.blame.as_ref(),
            _ => None,
        }
    }

    /// Merge blame data into the record. Records that cannot carry blame
    /// ignore it and return false.
    pub fn attach_blame(&mut self, info: BlameInfo) -> bool {
        match self {
            Record::CompileError(i) | Record::Warning(i) => {
                i.blame = Some(info);
                true
            }
            Record::TestFailure(t) => {
                t.blame = Some(info);
                true
            }
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// Exit code and captured output of one external process run.
pub struct ProcessOutput {
    pub exit_code: i32,
    pub output: String,
}

impl ProcessOutput {
    pub fn new(exit_code: i32, output: impl Into<String>) -> Self {
        Self {
            exit_code,
            output: output.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
/// Classification of a single phase (build or test).
pub struct PhaseReport {
    pub outcome: Outcome,
    pub report: String,
    pub records: Vec<Record>,
}

impl PhaseReport {
    pub fn new(outcome: Outcome, report: impl Into<String>) -> Self {
        Self {
            outcome,
            report: report.into(),
            records: Vec::new(),
        }
    }

    pub fn with_records(mut self, records: Vec<Record>) -> Self {
        self.records = records;
        self
    }
}

#[derive(Debug, Clone, Serialize)]
/// Final engine output handed back to orchestration.
pub struct PipelineResult {
    pub outcome: Outcome,
    pub summary: String,
    pub report: String,
    pub warnings: String,
    pub stages: Vec<Stage>,
    pub records: Vec<Record>,
}
