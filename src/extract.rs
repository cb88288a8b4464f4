//! Pattern extraction: raw tool output to typed records.
//!
//! Build-phase grammars are exclusive alternatives tried in a fixed order;
//! the first one that yields anything decides the result. Warnings and
//! test failures are extracted by their own entry points.

use crate::grammar::*;
use crate::models::{
    ExceptionBlock, FailureKind, LinkError, Record, SourceIssue, TestFailure, UnknownError,
};
use crate::traceback;
use regex::{Captures, Regex};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
/// Which build-phase grammar explained a failed build.
pub enum BuildMatch {
    /// Exit code zero; nothing to explain.
    Clean,
    CompileErrors(Vec<Record>),
    LinkErrors(Vec<Record>),
    Exception(Record),
    Unknown(Vec<Record>),
    /// Non-zero exit and no grammar matched.
    Unparseable,
}

/// Apply the build grammars in priority order.
pub fn extract_build(exit_code: i32, output: &str) -> BuildMatch {
    if exit_code == 0 {
        return BuildMatch::Clean;
    }
    let errors = compile_errors(output);
    if !errors.is_empty() {
        debug!(count = errors.len(), "compile error grammar matched");
        return BuildMatch::CompileErrors(errors);
    }
    let links = link_errors(output);
    if !links.is_empty() {
        debug!(count = links.len(), "link error grammar matched");
        return BuildMatch::LinkErrors(links);
    }
    if let Some(exc) = build_exception(output) {
        debug!("build traceback grammar matched");
        return BuildMatch::Exception(exc);
    }
    let unknown = unknown_errors(output);
    if !unknown.is_empty() {
        debug!(count = unknown.len(), "generic error grammar matched");
        return BuildMatch::Unknown(unknown);
    }
    debug!(exit_code, "no build grammar matched");
    BuildMatch::Unparseable
}

/// Run several dialect regexes over `text` and merge hits by position.
fn scan<F>(text: &str, grammars: &[&Regex], build: F) -> Vec<Record>
where
    F: Fn(&Captures) -> Option<Record>,
{
    let mut hits: Vec<(usize, Record)> = Vec::new();
    for re in grammars {
        for caps in re.captures_iter(text) {
            let start = caps.get(0).map(|m| m.start()).unwrap_or(0);
            if let Some(rec) = build(&caps) {
                hits.push((start, rec));
            }
        }
    }
    hits.sort_by_key(|(start, _)| *start);
    hits.into_iter().map(|(_, rec)| rec).collect()
}

fn source_issue(caps: &Captures) -> Option<SourceIssue> {
    let line = caps["line"].parse::<usize>().ok()?;
    Some(SourceIssue {
        file: caps["file"].trim().to_string(),
        line,
        message: caps["message"].trim_end().to_string(),
        blame: None,
    })
}

pub fn compile_errors(output: &str) -> Vec<Record> {
    scan(
        output,
        &[&*COMPILE_ERROR_GNU, &*COMPILE_ERROR_MSVC],
        |caps| source_issue(caps).map(Record::CompileError),
    )
}

pub fn link_errors(output: &str) -> Vec<Record> {
    scan(output, &[&*LINK_ERROR_MSVC, &*LINK_ERROR_GNU], |caps| {
        Some(Record::LinkError(LinkError {
            source_name: caps["source_name"].trim().to_string(),
            message: caps["message"].trim_end().to_string(),
        }))
    })
}

/// The first uncaught-exception block, with its location resolved when possible.
pub fn build_exception(output: &str) -> Option<Record> {
    let caps = BUILD_TRACEBACK.captures(output)?;
    let mut block = ExceptionBlock {
        traceback: caps["traceback"].to_string(),
        file: None,
        line: None,
    };
    traceback::resolve_exception(&mut block);
    Some(Record::Exception(block))
}

pub fn unknown_errors(output: &str) -> Vec<Record> {
    scan(output, &[&*UNKNOWN_ERROR], |caps| {
        Some(Record::UnknownError(UnknownError {
            message: caps["message"].trim_end().to_string(),
        }))
    })
}

/// Compiler warnings, regardless of how the build ended.
pub fn warnings(output: &str) -> Vec<Record> {
    scan(output, &[&*WARNING_GNU, &*WARNING_MSVC], |caps| {
        source_issue(caps).map(Record::Warning)
    })
}

/// One record per failing test, located through its traceback.
///
/// A traceback spans every line up to the next section rule, so chained
/// exceptions and their blank separator lines stay in one record.
pub fn test_failures(output: &str) -> Vec<Record> {
    scan(output, &[&*TEST_FAILURE], |caps| {
        let body = &output[caps.get(0)?.end()..];
        let end = SECTION_RULE.find(body).map(|m| m.start()).unwrap_or(body.len());
        let kind = match &caps["kind"] {
            "ERROR" => FailureKind::Error,
            _ => FailureKind::Fail,
        };
        let test = caps["test"].trim().to_string();
        let mut failure = TestFailure {
            kind,
            file: caps
                .name("file")
                .map(|m| m.as_str().to_string())
                .unwrap_or_else(|| test.clone()),
            test,
            line: None,
            traceback: body[..end].trim_end().to_string(),
            blame: None,
        };
        if !traceback::resolve_failure(&mut failure) {
            debug!(test = %failure.test, "traceback has no frame line");
        }
        Some(Record::TestFailure(failure))
    })
}

pub fn tests_failed_marker(output: &str) -> bool {
    TESTS_FAILED_MARKER.is_match(output)
}

/// Names of test modules the runner reported loading.
pub fn tests_loaded(output: &str) -> Vec<String> {
    TESTS_LOADED
        .captures_iter(output)
        .map(|caps| caps["test"].trim_end().to_string())
        .collect()
}
