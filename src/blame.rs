//! Blame enrichment: attach revision and author data to grouped records.
//!
//! The blame tool sits behind `BlameSource` so tests can use fixtures and a
//! concurrent lookup can be swapped in without touching grouping or
//! rendering. Enrichment is best-effort: a failed lookup leaves the
//! records as they were.

use crate::error::EngineError;
use crate::group::FileGroup;
use crate::models::{BlameInfo, Record};
use rayon::prelude::*;
use regex::Regex;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::LazyLock;
use tracing::{info, warn};

/// `  1234      alice     int main(void)`
static SVN_BLAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?P<revision>\S+)\s+(?P<user>\S+) ?(?P<blame_line>.*)$")
        .expect("SVN_BLAME regex should compile")
});

/// `git blame -c`: `1a2b3c4d\t(   alice\t2024-01-02 10:00:00 +0000\t12)int main(void)`
static GIT_BLAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\^?(?P<revision>[0-9a-f]+)\t\(\s*(?P<user>[^\t]*?)\s*\t[^\t]*\t\s*\d+\)(?P<blame_line>.*)$",
    )
    .expect("GIT_BLAME regex should compile")
});

#[derive(Debug, Clone, PartialEq, Eq)]
/// Raw result of one blame invocation.
pub struct BlameOutput {
    pub status: i32,
    pub text: String,
}

/// A facility that reports per-line authorship of a source file.
pub trait BlameSource: Send + Sync {
    fn blame(&self, file: &Path, source_root: &Path) -> Result<BlameOutput, EngineError>;
}

#[derive(Debug, Clone)]
/// Runs an external blame command with the file appended, from the source root.
pub struct CommandBlame {
    pub command: Vec<String>,
}

impl CommandBlame {
    pub fn new(command: Vec<String>) -> Self {
        Self { command }
    }
}

impl BlameSource for CommandBlame {
    fn blame(&self, file: &Path, source_root: &Path) -> Result<BlameOutput, EngineError> {
        let Some((program, args)) = self.command.split_first() else {
            return Err(EngineError::config("blame.command", "must not be empty"));
        };
        let out = Command::new(program)
            .args(args)
            .arg(file)
            .current_dir(source_root)
            .output()
            .map_err(|source| EngineError::BlameSpawn {
                program: program.clone(),
                source,
            })?;
        Ok(BlameOutput {
            status: out.status.code().unwrap_or(-1),
            text: String::from_utf8_lossy(&out.stdout).to_string(),
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlamePreset {
    #[default]
    Svn,
    Git,
}

impl BlamePreset {
    pub fn default_command(self) -> Vec<String> {
        match self {
            BlamePreset::Svn => vec!["svn".into(), "blame".into()],
            BlamePreset::Git => vec!["git".into(), "blame".into(), "-c".into()],
        }
    }
}

#[derive(Debug, Clone)]
/// Grammar for one line of blame output.
pub struct BlameFormat {
    re: Regex,
}

impl BlameFormat {
    pub fn preset(preset: BlamePreset) -> Self {
        let re = match preset {
            BlamePreset::Svn => SVN_BLAME.clone(),
            BlamePreset::Git => GIT_BLAME.clone(),
        };
        Self { re }
    }

    /// Custom grammar; must define `revision` and `user` groups.
    pub fn custom(pattern: &str) -> Result<Self, EngineError> {
        let re = Regex::new(pattern)?;
        for group in ["revision", "user"] {
            if !re.capture_names().flatten().any(|n| n == group) {
                return Err(EngineError::config(
                    "blame.pattern",
                    format!("missing named group '{}'", group),
                ));
            }
        }
        Ok(Self { re })
    }

    pub fn parse(&self, line: &str) -> Option<BlameInfo> {
        let caps = self.re.captures(line)?;
        Some(BlameInfo {
            revision: caps.name("revision")?.as_str().to_string(),
            user: caps.name("user")?.as_str().to_string(),
            blame_line: caps.name("blame_line").map(|m| m.as_str().to_string()),
        })
    }
}

impl Default for BlameFormat {
    fn default() -> Self {
        Self::preset(BlamePreset::Svn)
    }
}

/// Maps a record to the 1-based blame line it should be attributed to.
pub type LineIndex = fn(&Record) -> Option<usize>;

pub fn default_line_index(record: &Record) -> Option<usize> {
    record.line()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnrichStats {
    pub files_blamed: usize,
    pub files_failed: usize,
    pub records_enriched: usize,
}

/// Attaches blame data to every record of a `FileGroup`.
pub struct BlameEnricher<'a> {
    source: &'a dyn BlameSource,
    format: &'a BlameFormat,
    source_root: &'a Path,
    parallel: bool,
    line_index: LineIndex,
}

impl<'a> BlameEnricher<'a> {
    pub fn new(source: &'a dyn BlameSource, format: &'a BlameFormat, source_root: &'a Path) -> Self {
        Self {
            source,
            format,
            source_root,
            parallel: false,
            line_index: default_line_index,
        }
    }

    /// Blame distinct files on the rayon pool. Results are still applied
    /// in file order.
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn line_index(mut self, line_index: LineIndex) -> Self {
        self.line_index = line_index;
        self
    }

    pub fn enrich(&self, group: &mut FileGroup) -> EnrichStats {
        let files: Vec<String> = group.files().map(str::to_string).collect();
        let lookups: Vec<Option<Vec<String>>> = if self.parallel {
            files.par_iter().map(|f| self.lookup(f)).collect()
        } else {
            files.iter().map(|f| self.lookup(f)).collect()
        };

        let mut stats = EnrichStats::default();
        for ((_, records), lines) in group.iter_mut().zip(lookups) {
            let Some(lines) = lines else {
                stats.files_failed += 1;
                continue;
            };
            stats.files_blamed += 1;
            for record in records.iter_mut() {
                if self.apply(record, &lines) {
                    stats.records_enriched += 1;
                }
            }
        }
        stats
    }

    fn apply(&self, record: &mut Record, lines: &[String]) -> bool {
        let Some(index) = (self.line_index)(record) else {
            return false;
        };
        if index == 0 {
            return false;
        }
        let Some(line) = lines.get(index - 1) else {
            return false;
        };
        match self.format.parse(line) {
            Some(info) => record.attach_blame(info),
            None => false,
        }
    }

    /// Blame output split into lines, or None when the lookup failed.
    fn lookup(&self, file: &str) -> Option<Vec<String>> {
        let path = blame_path(file, self.source_root);
        info!(file = %path.display(), "blame");
        match self.source.blame(&path, self.source_root) {
            Ok(out) if out.status == 0 => Some(out.text.lines().map(str::to_string).collect()),
            Ok(out) => {
                warn!(file = %path.display(), status = out.status, "blame failed; skipping file");
                None
            }
            Err(e) => {
                warn!(file = %path.display(), error = %e, "blame unavailable; skipping file");
                None
            }
        }
    }
}

/// Path handed to the blame tool: relative to the source root when the
/// matched path is an absolute path inside it.
pub fn blame_path(file: &str, source_root: &Path) -> PathBuf {
    let p = Path::new(file);
    if p.is_absolute() && p.starts_with(source_root) {
        if let Some(rel) = pathdiff::diff_paths(p, source_root) {
            return rel;
        }
    }
    p.to_path_buf()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SourceIssue;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct FakeBlame {
        outputs: HashMap<String, BlameOutput>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeBlame {
        fn new(entries: &[(&str, i32, &str)]) -> Self {
            let outputs = entries
                .iter()
                .map(|(f, status, text)| {
                    (
                        f.to_string(),
                        BlameOutput {
                            status: *status,
                            text: text.to_string(),
                        },
                    )
                })
                .collect();
            Self {
                outputs,
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    impl BlameSource for FakeBlame {
        fn blame(&self, file: &Path, _root: &Path) -> Result<BlameOutput, EngineError> {
            let key = file.to_string_lossy().to_string();
            self.calls.lock().unwrap().push(key.clone());
            Ok(self.outputs.get(&key).cloned().unwrap_or(BlameOutput {
                status: 1,
                text: String::new(),
            }))
        }
    }

    fn err(file: &str, line: usize) -> Record {
        Record::CompileError(SourceIssue {
            file: file.into(),
            line,
            message: format!("bad at {}", line),
            blame: None,
        })
    }

    const SVN_OUT: &str = "   101      alice #include <stdio.h>\n   102        bob int main(void) {\n   101      alice }\n";

    #[test]
    fn test_enrich_uses_record_line_as_index() {
        let fake = FakeBlame::new(&[("a.c", 0, SVN_OUT)]);
        let format = BlameFormat::default();
        let root = PathBuf::from("/src");
        let mut group = FileGroup::from_records(vec![err("a.c", 2), err("a.c", 1)]);
        let stats = BlameEnricher::new(&fake, &format, &root).enrich(&mut group);
        assert_eq!(stats.records_enriched, 2);
        let recs = group.get("a.c").unwrap();
        let b0 = recs[0].blame().unwrap();
        assert_eq!((b0.revision.as_str(), b0.user.as_str()), ("102", "bob"));
        assert_eq!(b0.blame_line.as_deref(), Some("int main(void) {"));
        assert_eq!(recs[1].blame().unwrap().user, "alice");
    }

    #[test]
    fn test_failed_blame_leaves_records_untouched() {
        let fake = FakeBlame::new(&[("ok.c", 0, SVN_OUT), ("bad.c", 1, "svn: E155007")]);
        let format = BlameFormat::default();
        let root = PathBuf::from("/src");
        let mut group = FileGroup::from_records(vec![err("bad.c", 1), err("ok.c", 1)]);
        let before = group.get("bad.c").unwrap().to_vec();
        let stats = BlameEnricher::new(&fake, &format, &root).enrich(&mut group);
        assert_eq!(stats.files_failed, 1);
        assert_eq!(stats.files_blamed, 1);
        assert_eq!(group.get("bad.c").unwrap(), before.as_slice());
        assert!(group.get("ok.c").unwrap()[0].blame().is_some());
    }

    #[test]
    fn test_out_of_range_and_zero_lines_get_no_blame() {
        let fake = FakeBlame::new(&[("a.c", 0, SVN_OUT)]);
        let format = BlameFormat::default();
        let root = PathBuf::from("/src");
        let mut group = FileGroup::from_records(vec![err("a.c", 40), err("a.c", 0)]);
        let stats = BlameEnricher::new(&fake, &format, &root).enrich(&mut group);
        assert_eq!(stats.records_enriched, 0);
        assert!(group.get("a.c").unwrap().iter().all(|r| r.blame().is_none()));
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let fake = FakeBlame::new(&[("a.c", 0, SVN_OUT), ("b.c", 0, SVN_OUT)]);
        let format = BlameFormat::default();
        let root = PathBuf::from("/src");
        let records = vec![err("b.c", 3), err("a.c", 2), err("b.c", 1)];
        let mut seq = FileGroup::from_records(records.clone());
        let mut par = FileGroup::from_records(records);
        BlameEnricher::new(&fake, &format, &root).enrich(&mut seq);
        BlameEnricher::new(&fake, &format, &root)
            .parallel(true)
            .enrich(&mut par);
        assert_eq!(seq, par);
    }

    #[test]
    fn test_custom_line_index() {
        fn always_first(_: &Record) -> Option<usize> {
            Some(1)
        }
        let fake = FakeBlame::new(&[("a.c", 0, SVN_OUT)]);
        let format = BlameFormat::default();
        let root = PathBuf::from("/src");
        let mut group = FileGroup::from_records(vec![err("a.c", 2)]);
        BlameEnricher::new(&fake, &format, &root)
            .line_index(always_first)
            .enrich(&mut group);
        assert_eq!(group.get("a.c").unwrap()[0].blame().unwrap().user, "alice");
    }

    #[test]
    fn test_absolute_paths_inside_root_are_made_relative() {
        let root = Path::new("/work/src");
        assert_eq!(
            blame_path("/work/src/lib/a.c", root),
            PathBuf::from("lib/a.c")
        );
        assert_eq!(blame_path("/other/a.c", root), PathBuf::from("/other/a.c"));
        assert_eq!(blame_path("lib/a.c", root), PathBuf::from("lib/a.c"));
    }

    #[test]
    fn test_git_preset_parses_annotate_layout() {
        let format = BlameFormat::preset(BlamePreset::Git);
        let info = format
            .parse("1a2b3c4d\t(     alice\t2024-01-02 10:00:00 +0000\t12)    return 0;")
            .unwrap();
        assert_eq!(info.revision, "1a2b3c4d");
        assert_eq!(info.user, "alice");
        assert_eq!(info.blame_line.as_deref(), Some("    return 0;"));
    }

    #[test]
    fn test_custom_format_requires_groups() {
        assert!(BlameFormat::custom(r"^(?P<revision>\d+)").is_err());
        let f = BlameFormat::custom(r"^(?P<revision>\d+):(?P<user>\w+)").unwrap();
        let info = f.parse("7:eve").unwrap();
        assert_eq!(info.blame_line, None);
    }

    #[test]
    fn test_empty_command_is_a_config_error() {
        let blame = CommandBlame::new(Vec::new());
        let res = blame.blame(Path::new("a.c"), Path::new("."));
        assert!(matches!(res, Err(EngineError::Config { .. })));
    }
}
