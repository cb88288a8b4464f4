//! Report rendering: grouped records to newline-free, markup-safe text.
//!
//! Every record tag maps to one render function through `RENDERERS`. The
//! table is independent of `Outcome`, so adding a failure kind only touches
//! this module.

use crate::error::EngineError;
use crate::group::FileGroup;
use crate::models::Record;
use regex::Regex;
use std::borrow::Cow;
use std::str::FromStr;
use std::sync::LazyLock;

/// Line-break token substituted for newlines in grouped reports.
pub const LINE_BREAK: &str = "<br />";
/// Line-break token used by raw fallbacks and flat lists.
pub const RAW_LINE_BREAK: &str = "<br>";
pub const DEFAULT_SEPARATOR: &str = "<hr>";

static ENTITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^&(?:amp|lt|gt|quot|#[0-9]+|#[xX][0-9A-Fa-f]+);")
        .expect("ENTITY regex should compile")
});

/// Escape `&`, `<` and `>` for embedding in HTML.
///
/// An `&` that already starts one of the entities this escaper emits (or a
/// numeric reference) is left alone, so escaping twice gives the same
/// result as escaping once.
pub fn escape_html(text: &str) -> Cow<'_, str> {
    if !text.contains(['&', '<', '>']) {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len() + 16);
    for (i, ch) in text.char_indices() {
        match ch {
            '&' if ENTITY.is_match(&text[i..]) => out.push('&'),
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    Cow::Owned(out)
}

/// Last path component, accepting both `/` and `\` separators.
pub fn basename(file: &str) -> &str {
    file.rsplit(['/', '\\']).next().unwrap_or(file)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// Discriminants index `RENDERERS`.
pub enum RenderKind {
    BuildError,
    LinkError,
    Exception,
    UnknownError,
    Warning,
    TestFailure,
}

impl RenderKind {
    pub fn of(record: &Record) -> Self {
        match record {
            Record::CompileError(_) => RenderKind::BuildError,
            Record::LinkError(_) => RenderKind::LinkError,
            Record::Exception(_) => RenderKind::Exception,
            Record::UnknownError(_) => RenderKind::UnknownError,
            Record::Warning(_) => RenderKind::Warning,
            Record::TestFailure(_) => RenderKind::TestFailure,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            RenderKind::BuildError => "build_error",
            RenderKind::LinkError => "link_error",
            RenderKind::Exception => "exception",
            RenderKind::UnknownError => "unknown_error",
            RenderKind::Warning => "warning",
            RenderKind::TestFailure => "test_failure",
        }
    }
}

impl FromStr for RenderKind {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RENDERERS
            .iter()
            .map(|(kind, _)| *kind)
            .find(|kind| kind.name() == s)
            .ok_or_else(|| EngineError::UnknownRenderKind(s.to_string()))
    }
}

type RenderFn = fn(&Record) -> String;

static RENDERERS: [(RenderKind, RenderFn); 6] = [
    (RenderKind::BuildError, render_build_error),
    (RenderKind::LinkError, render_link_error),
    (RenderKind::Exception, render_exception),
    (RenderKind::UnknownError, render_unknown_error),
    (RenderKind::Warning, render_warning),
    (RenderKind::TestFailure, render_test_failure),
];

fn renderer(kind: RenderKind) -> RenderFn {
    let (registered, f) = RENDERERS[kind as usize];
    assert_eq!(registered, kind, "RENDERERS out of order");
    f
}

fn mismatch(expected: RenderKind, record: &Record) -> ! {
    unreachable!(
        "{} renderer called with a {} record",
        expected.name(),
        RenderKind::of(record).name()
    )
}

/// `basename[:line][ last rev: revision:user]`
fn file_info(record: &Record) -> String {
    let mut out = String::new();
    if let Some(file) = record.file() {
        out.push_str(&escape_html(basename(file)));
    }
    if let Some(line) = record.line() {
        out.push_str(&format!(":{}", line));
    }
    if let Some(b) = record.blame() {
        out.push_str(&format!(
            " last rev: {}:{}",
            escape_html(&b.revision),
            escape_html(&b.user)
        ));
    }
    out
}

fn render_build_error(record: &Record) -> String {
    let Record::CompileError(issue) = record else {
        mismatch(RenderKind::BuildError, record)
    };
    format!("{}<br>ERROR: {}", file_info(record), escape_html(&issue.message))
}

fn render_warning(record: &Record) -> String {
    let Record::Warning(issue) = record else {
        mismatch(RenderKind::Warning, record)
    };
    let mut out = format!("{}<br>warning:{}", file_info(record), escape_html(&issue.message));
    if let Some(src) = issue.blame.as_ref().and_then(|b| b.blame_line.as_deref()) {
        out.push_str(&format!("<br><code>{}</code>", escape_html(src)));
    }
    out
}

fn render_test_failure(record: &Record) -> String {
    let Record::TestFailure(failure) = record else {
        mismatch(RenderKind::TestFailure, record)
    };
    format!(
        "{}<br />{}<br /><pre>{}</pre>",
        file_info(record),
        escape_html(&failure.test),
        escape_html(&failure.traceback)
    )
}

fn render_exception(record: &Record) -> String {
    let Record::Exception(block) = record else {
        mismatch(RenderKind::Exception, record)
    };
    let body = format!("<pre>{}</pre>", escape_html(&block.traceback));
    if block.file.is_some() {
        format!("{}<br>{}", file_info(record), body)
    } else {
        body
    }
}

fn render_link_error(record: &Record) -> String {
    let Record::LinkError(link) = record else {
        mismatch(RenderKind::LinkError, record)
    };
    format!(
        "{}: {}{}",
        escape_html(&link.source_name),
        escape_html(&link.message),
        RAW_LINE_BREAK
    )
}

fn render_unknown_error(record: &Record) -> String {
    let Record::UnknownError(err) = record else {
        mismatch(RenderKind::UnknownError, record)
    };
    format!("{}{}", escape_html(&err.message), RAW_LINE_BREAK)
}

/// Render one record with the function registered for its tag.
pub fn render_record(record: &Record) -> String {
    renderer(RenderKind::of(record))(record)
}

/// One section per record, file by file, joined with `separator`.
pub fn render_group(group: &FileGroup, separator: &str) -> String {
    let sections: Vec<String> = group
        .iter()
        .flat_map(|(_, records)| records.iter().map(render_record))
        .collect();
    replace_newlines(&sections.join(separator), LINE_BREAK)
}

/// Flat rendering for records without a file (link and unknown errors).
pub fn render_ungrouped(records: &[Record]) -> String {
    let joined: String = records.iter().map(render_record).collect();
    replace_newlines(&joined, RAW_LINE_BREAK)
}

/// Raw output used verbatim as a report: escaped, newlines converted.
pub fn raw_report(output: &str) -> String {
    replace_newlines(&escape_html(output), RAW_LINE_BREAK)
}

fn replace_newlines(text: &str, token: &str) -> String {
    text.replace("\r\n", "\n").replace('\n', token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        BlameInfo, ExceptionBlock, FailureKind, LinkError, SourceIssue, TestFailure,
        UnknownError,
    };

    fn issue(file: &str, line: usize, msg: &str) -> SourceIssue {
        SourceIssue {
            file: file.into(),
            line,
            message: msg.into(),
            blame: None,
        }
    }

    #[test]
    fn test_escape_is_idempotent() {
        let once = escape_html("a < b && c > \"d\"").to_string();
        assert_eq!(once, "a &lt; b &amp;&amp; c &gt; \"d\"");
        assert_eq!(escape_html(&once), once);
        assert_eq!(escape_html("&#39;x&#x27;"), "&#39;x&#x27;");
        assert!(matches!(escape_html("plain"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_escape_only_trusts_known_entities() {
        assert_eq!(escape_html("bind a &ref; here"), "bind a &amp;ref; here");
        assert_eq!(escape_html("&quot;&lt;&amp;"), "&quot;&lt;&amp;");
    }

    #[test]
    fn test_renderer_table_matches_kinds() {
        for (i, (kind, _)) in RENDERERS.iter().enumerate() {
            assert_eq!(*kind as usize, i);
        }
        let rec = Record::UnknownError(UnknownError {
            message: "x".into(),
        });
        assert_eq!(renderer(RenderKind::UnknownError)(&rec), "x<br>");
    }

    #[test]
    #[should_panic(expected = "build_error renderer called with a warning record")]
    fn test_renderer_rejects_mismatched_record() {
        render_build_error(&Record::Warning(issue("a.c", 1, "w")));
    }

    #[test]
    fn test_basename_handles_both_separators() {
        assert_eq!(basename("src/lib/a.c"), "a.c");
        assert_eq!(basename(r"C:\src\b.cpp"), "b.cpp");
        assert_eq!(basename("c.c"), "c.c");
    }

    #[test]
    fn test_build_error_without_blame_omits_revision() {
        let rec = Record::CompileError(issue("src/a.c", 4, "expected '<'"));
        assert_eq!(render_record(&rec), "a.c:4<br>ERROR: expected '&lt;'");
    }

    #[test]
    fn test_warning_with_blame_line() {
        let mut w = issue("w.c", 2, "unused");
        w.blame = Some(BlameInfo {
            revision: "77".into(),
            user: "carol".into(),
            blame_line: Some("if (a < b)".into()),
        });
        let out = render_record(&Record::Warning(w));
        assert_eq!(
            out,
            "w.c:2 last rev: 77:carol<br>warning:unused<br><code>if (a &lt; b)</code>"
        );
    }

    #[test]
    fn test_test_failure_escapes_traceback() {
        let rec = Record::TestFailure(TestFailure {
            kind: FailureKind::Fail,
            test: "test_cmp".into(),
            file: "tests/test_cmp.py".into(),
            line: Some(3),
            traceback: "AssertionError: <a> != <b>".into(),
            blame: None,
        });
        assert_eq!(
            render_record(&rec),
            "test_cmp.py:3<br />test_cmp<br /><pre>AssertionError: &lt;a&gt; != &lt;b&gt;</pre>"
        );
    }

    #[test]
    fn test_group_join_and_newlines() {
        let group = FileGroup::from_records(vec![
            Record::CompileError(issue("b.c", 1, "one")),
            Record::CompileError(issue("a.c", 2, "two")),
        ]);
        assert_eq!(
            render_group(&group, "<hr>"),
            "b.c:1<br>ERROR: one<hr>a.c:2<br>ERROR: two"
        );
        let exc = FileGroup::from_records(vec![Record::Exception(ExceptionBlock {
            traceback: "Traceback\nValueError".into(),
            file: Some("setup.py".into()),
            line: Some(1),
        })]);
        let out = render_group(&exc, "<hr>");
        assert!(!out.contains('\n'));
        assert!(out.contains("Traceback<br />ValueError"));
    }

    #[test]
    fn test_ungrouped_link_and_unknown() {
        let recs = vec![
            Record::LinkError(LinkError {
                source_name: "a.obj".into(),
                message: "unresolved external symbol _f".into(),
            }),
            Record::UnknownError(UnknownError {
                message: "bad <thing>".into(),
            }),
        ];
        assert_eq!(
            render_ungrouped(&recs),
            "a.obj: unresolved external symbol _f<br>bad &lt;thing&gt;<br>"
        );
    }

    #[test]
    fn test_raw_report_is_newline_free() {
        assert_eq!(raw_report("a\r\nb\n<c>"), "a<br>b<br>&lt;c&gt;");
    }

    #[test]
    fn test_unknown_render_kind_fails_loudly() {
        assert_eq!("warning".parse::<RenderKind>().unwrap(), RenderKind::Warning);
        match "BUILD_WARNINGS_HTML".parse::<RenderKind>() {
            Err(EngineError::UnknownRenderKind(k)) => assert_eq!(k, "BUILD_WARNINGS_HTML"),
            other => panic!("unexpected {:?}", other),
        }
    }
}
