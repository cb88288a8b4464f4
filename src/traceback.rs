//! Locate the offending file and line inside a traceback block.

use crate::grammar::TRACEBACK_FRAME;
use crate::models::{ExceptionBlock, TestFailure};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub file: String,
    pub line: usize,
}

/// First `File "...", line N` frame in the block, if any.
pub fn resolve(traceback: &str) -> Option<Location> {
    let caps = TRACEBACK_FRAME.captures(traceback)?;
    let line = caps["line"].parse::<usize>().ok()?;
    Some(Location {
        file: caps["file"].to_string(),
        line,
    })
}

/// Fill a test failure's location from its traceback. On no match the
/// record keeps its module path and stays without a line.
pub fn resolve_failure(failure: &mut TestFailure) -> bool {
    match resolve(&failure.traceback) {
        Some(loc) => {
            failure.file = loc.file;
            failure.line = Some(loc.line);
            true
        }
        None => false,
    }
}

pub fn resolve_exception(block: &mut ExceptionBlock) -> bool {
    match resolve(&block.traceback) {
        Some(loc) => {
            block.file = Some(loc.file);
            block.line = Some(loc.line);
            true
        }
        None => false,
    }
}
