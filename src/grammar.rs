//! Text grammars recognized in raw build and test output.
//!
//! Each grammar is a multi-line regex compiled once. Named groups carry the
//! fields of the record the grammar produces. Where a tool family has two
//! dialects (GNU-style and MSVC-style) both are listed and the extractor
//! merges their matches by position in the text.

use regex::Regex;
use std::sync::LazyLock;

/// `path/to/file.c:12:5: error: message`
pub static COMPILE_ERROR_GNU: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)^(?P<file>(?:[A-Za-z]:[\\/])?[^:\s][^:\r\n]*?):(?P<line>\d+):(?:\d+:)?[ \t]*(?:fatal )?error:[ \t]*(?P<message>[^\r\n]+)",
    )
    .expect("COMPILE_ERROR_GNU regex should compile")
});

/// `src\file.c(12) : error C2065: message`
pub static COMPILE_ERROR_MSVC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)^(?P<file>[^\r\n(]+?)\((?P<line>\d+)(?:,\d+)?\)[ \t]*:[ \t]*(?:fatal )?error[ \t]+C\d+:[ \t]*(?P<message>[^\r\n]+)",
    )
    .expect("COMPILE_ERROR_MSVC regex should compile")
});

/// `module.obj : error LNK2019: unresolved external symbol ...`
pub static LINK_ERROR_MSVC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)^(?P<source_name>LINK|(?:[A-Za-z]:)?[^\r\n:]+?\.(?:obj|lib|exe|dll|pyd))[ \t]*:[ \t]*(?:fatal )?error[ \t]+LNK\d+:[ \t]*(?P<message>[^\r\n]+)",
    )
    .expect("LINK_ERROR_MSVC regex should compile")
});

/// `module.o:module.c:(.text+0x15): undefined reference to 'symbol'`, or the
/// binutils 2.26+ layout `/usr/bin/ld: module.c:(.text+0x15): undefined ...`
/// that follows an `in function` line.
pub static LINK_ERROR_GNU: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)^(?:\S*ld(?:\.\w+)?: )?(?P<source_name>(?:[A-Za-z]:)?[^\s:][^\r\n:]*?):(?:[^\r\n]*?:)?[ \t]*(?P<message>(?:undefined reference to|multiple definition of)[^\r\n]+)",
    )
    .expect("LINK_ERROR_GNU regex should compile")
});

/// A traceback header, its indented frame lines and the closing exception line.
pub static BUILD_TRACEBACK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)(?P<traceback>^Traceback \(most recent call last\):[ \t]*\r?\n(?:[ \t]+[^\r\n]*\r?\n)*[^\s][^\r\n]*)",
    )
    .expect("BUILD_TRACEBACK regex should compile")
});

pub static UNKNOWN_ERROR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^error: (?P<message>[^\r\n]+)").expect("UNKNOWN_ERROR regex should compile")
});

pub static WARNING_GNU: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)^(?P<file>(?:[A-Za-z]:[\\/])?[^:\s][^:\r\n]*?):(?P<line>\d+):(?:\d+:)?[ \t]*warning:[ \t]*(?P<message>[^\r\n]+)",
    )
    .expect("WARNING_GNU regex should compile")
});

pub static WARNING_MSVC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)^(?P<file>[^\r\n(]+?)\((?P<line>\d+)(?:,\d+)?\)[ \t]*:[ \t]*warning[ \t]+C\d+:[ \t]*(?P<message>[^\r\n]+)",
    )
    .expect("WARNING_MSVC regex should compile")
});

/// Header of one unittest failure block. Its traceback is the text after
/// the header up to the next `SECTION_RULE`.
pub static TEST_FAILURE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)^={20,}\r?\n(?P<kind>FAIL|ERROR): (?P<test>[^\r\n(]+?)(?: \((?P<file>[^)\r\n]+)\))?[ \t]*\r?\n-{20,}[ \t]*\r?\n",
    )
    .expect("TEST_FAILURE regex should compile")
});

/// `=====` or `-----` rule separating unittest report sections.
pub static SECTION_RULE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^(?:={20,}|-{20,})[ \t]*\r?$").expect("SECTION_RULE regex should compile")
});

pub static TESTS_FAILED_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^FAILED \(").expect("TESTS_FAILED_MARKER regex should compile")
});

pub static TESTS_LOADED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"loading (?P<test>[^\r\n]+)").expect("TESTS_LOADED regex should compile")
});

/// `File "path/to/module.py", line 42`
pub static TRACEBACK_FRAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"File "(?P<file>[^"\r\n]+)", line (?P<line>\d+)"#)
        .expect("TRACEBACK_FRAME regex should compile")
});
