//! Configuration discovery and effective settings resolution.
//!
//! Buildpage reads `buildpage.toml|yaml|yml` from the working directory (or
//! the closest ancestor) and merges it with CLI flags into a `Settings`
//! value that is passed explicitly to the engine.
//! Defaults:
//! - `source_root`: the directory holding the config file (or the start dir)
//! - `output`: `human`
//! - `blame.format`: `svn`, `blame.command`: the preset's command
//! - `blame.enabled`: true, `blame.parallel`: false
//! - `report.separator`: `<hr>`
//!
//! Overrides precedence: CLI > config file > defaults.

use crate::blame::{BlameFormat, BlamePreset};
use crate::error::EngineError;
use crate::render::DEFAULT_SEPARATOR;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_NAMES: [&str; 3] = ["buildpage.toml", "buildpage.yaml", "buildpage.yml"];

#[derive(Debug, Default, Deserialize, Clone)]
/// Blame facility section under `[blame]`.
pub struct BlameCfg {
    pub enabled: Option<bool>,
    /// Argument vector; the file path is appended.
    pub command: Option<Vec<String>>,
    pub format: Option<BlamePreset>,
    /// Custom line grammar with `revision`, `user` and optional `blame_line` groups.
    pub pattern: Option<String>,
    pub parallel: Option<bool>,
}

#[derive(Debug, Default, Deserialize, Clone)]
pub struct ReportCfg {
    pub separator: Option<String>,
}

#[derive(Debug, Default, Deserialize, Clone)]
/// Root configuration loaded from `buildpage.toml|yaml`.
pub struct BuildpageConfig {
    pub source_root: Option<String>,
    pub output: Option<String>,
    #[serde(default)]
    pub blame: Option<BlameCfg>,
    #[serde(default)]
    pub report: Option<ReportCfg>,
}

#[derive(Debug, Default, Clone)]
/// Values supplied on the command line; `None` defers to the config file.
pub struct Overrides {
    pub start: Option<String>,
    pub config: Option<String>,
    pub source_root: Option<String>,
    pub output: Option<String>,
    pub no_blame: bool,
    pub parallel_blame: Option<bool>,
}

#[derive(Debug, Clone)]
/// Fully-resolved settings used by the engine after applying precedence.
pub struct Settings {
    pub source_root: PathBuf,
    pub output: String,
    pub blame_enabled: bool,
    pub blame_command: Vec<String>,
    pub blame_format: BlameFormat,
    pub blame_parallel: bool,
    pub separator: String,
    /// Config file the settings were read from; `None` means defaults only.
    pub config_file: Option<PathBuf>,
}

impl Settings {
    pub fn new(source_root: impl Into<PathBuf>) -> Self {
        Self {
            source_root: source_root.into(),
            output: "human".to_string(),
            blame_enabled: true,
            blame_command: BlamePreset::Svn.default_command(),
            blame_format: BlameFormat::default(),
            blame_parallel: false,
            separator: DEFAULT_SEPARATOR.to_string(),
            config_file: None,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::new(".")
    }
}

/// Walk upward from `start` to find the directory holding the config.
///
/// Stops at a `buildpage.toml|yaml|yml`, or at a `.git`/`.svn` checkout root.
pub fn detect_root(start: &Path) -> PathBuf {
    let mut cur = start;
    loop {
        if CONFIG_NAMES.iter().any(|n| cur.join(n).exists()) {
            return cur.to_path_buf();
        }
        if cur.join(".git").exists() || cur.join(".svn").exists() {
            return cur.to_path_buf();
        }
        match cur.parent() {
            Some(p) => cur = p,
            None => return start.to_path_buf(),
        }
    }
}

/// Parse a config file, picking TOML or YAML by extension.
pub fn load_config_file(path: &Path) -> Result<BuildpageConfig, EngineError> {
    let s = fs::read_to_string(path)?;
    match path.extension().and_then(|e| e.to_str()) {
        Some("yaml") | Some("yml") => Ok(serde_yaml::from_str(&s)?),
        _ => Ok(toml::from_str(&s)?),
    }
}

/// First known config file name present in `root`.
pub fn find_config(root: &Path) -> Option<PathBuf> {
    CONFIG_NAMES
        .iter()
        .map(|n| root.join(n))
        .find(|p| p.exists())
}

/// Resolve `Settings` by merging CLI overrides, discovered config, and defaults.
pub fn resolve_settings(ov: &Overrides) -> Result<Settings, EngineError> {
    let start = PathBuf::from(ov.start.as_deref().unwrap_or("."));
    let (root, cfg, config_file) = match ov.config.as_deref() {
        Some(explicit) => {
            let path = PathBuf::from(explicit);
            let cfg = load_config_file(&path)?;
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(Path::to_path_buf)
                .unwrap_or_else(|| start.clone());
            (dir, cfg, Some(path))
        }
        None => {
            let root = detect_root(&start);
            match find_config(&root) {
                Some(path) => (root, load_config_file(&path)?, Some(path)),
                None => (root, BuildpageConfig::default(), None),
            }
        }
    };

    // Relative roots from the config file are anchored at its directory.
    let source_root = match ov.source_root.as_deref() {
        Some(s) => PathBuf::from(s),
        None => cfg
            .source_root
            .as_deref()
            .map(|s| root.join(s))
            .unwrap_or_else(|| root.clone()),
    };

    let output = ov
        .output
        .clone()
        .or(cfg.output)
        .unwrap_or_else(|| "human".to_string());
    if output != "human" && output != "json" {
        return Err(EngineError::config(
            "output",
            format!("expected human|json, got '{}'", output),
        ));
    }

    let blame = cfg.blame.unwrap_or_default();
    let preset = blame.format.unwrap_or_default();
    let blame_format = match blame.pattern.as_deref() {
        Some(p) => BlameFormat::custom(p)?,
        None => BlameFormat::preset(preset),
    };
    let blame_command = blame
        .command
        .unwrap_or_else(|| preset.default_command());
    if blame_command.is_empty() {
        return Err(EngineError::config("blame.command", "must not be empty"));
    }

    let separator = cfg
        .report
        .and_then(|r| r.separator)
        .unwrap_or_else(|| DEFAULT_SEPARATOR.to_string());

    Ok(Settings {
        source_root,
        output,
        blame_enabled: !ov.no_blame && blame.enabled.unwrap_or(true),
        blame_command,
        blame_format,
        blame_parallel: ov.parallel_blame.or(blame.parallel).unwrap_or(false),
        separator,
        config_file,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    fn at(root: &Path) -> Overrides {
        Overrides {
            start: root.to_str().map(str::to_string),
            ..Overrides::default()
        }
    }

    #[test]
    fn test_detect_and_load_toml() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let mut f = fs::File::create(root.join("buildpage.toml")).unwrap();
        writeln!(
            f,
            "{}",
            r#"
source_root = "trunk"
output = "json"
[blame]
format = "git"
parallel = true
[report]
separator = "<hr />"
    "#
        )
        .unwrap();

        let s = resolve_settings(&at(root)).unwrap();
        assert_eq!(s.source_root, root.join("trunk"));
        assert_eq!(s.output, "json");
        assert_eq!(s.blame_command, vec!["git", "blame", "-c"]);
        assert!(s.blame_parallel);
        assert_eq!(s.separator, "<hr />");
        assert_eq!(s.config_file, Some(root.join("buildpage.toml")));
    }

    #[test]
    fn test_defaults_only_when_no_config_found() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir(root.join(".git")).unwrap();
        let s = resolve_settings(&at(root)).unwrap();
        assert_eq!(s.config_file, None);
        assert_eq!(s.source_root, root.to_path_buf());
    }

    #[test]
    fn test_load_yaml_and_defaults() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let mut f = fs::File::create(root.join("buildpage.yaml")).unwrap();
        writeln!(
            f,
            "{}",
            r#"
blame:
  command: ["svn", "blame", "--non-interactive"]
            "#
        )
        .unwrap();

        let s = resolve_settings(&at(root)).unwrap();
        assert_eq!(s.source_root, root.to_path_buf());
        assert_eq!(s.output, "human");
        assert_eq!(s.blame_command.len(), 3);
        assert!(s.blame_enabled);
        assert!(!s.blame_parallel);
        assert_eq!(s.separator, "<hr>");
    }

    #[test]
    fn test_cli_takes_precedence() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::write(
            root.join("buildpage.toml"),
            "output = \"json\"\nsource_root = \"cfg\"\n[blame]\nparallel = true\n",
        )
        .unwrap();
        let ov = Overrides {
            output: Some("human".into()),
            source_root: Some("/elsewhere".into()),
            no_blame: true,
            parallel_blame: Some(false),
            ..at(root)
        };
        let s = resolve_settings(&ov).unwrap();
        assert_eq!(s.output, "human");
        assert_eq!(s.source_root, PathBuf::from("/elsewhere"));
        assert!(!s.blame_enabled);
        assert!(!s.blame_parallel);
    }

    #[test]
    fn test_explicit_config_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ci.yml");
        fs::write(&path, "source_root: src\n").unwrap();
        let ov = Overrides {
            config: path.to_str().map(str::to_string),
            ..Overrides::default()
        };
        let s = resolve_settings(&ov).unwrap();
        assert_eq!(s.source_root, dir.path().join("src"));
    }

    #[test]
    fn test_invalid_values_are_errors() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("buildpage.toml"), "output = \"html\"\n").unwrap();
        assert!(matches!(
            resolve_settings(&at(root)),
            Err(EngineError::Config { .. })
        ));

        fs::write(root.join("buildpage.toml"), "[blame]\npattern = \"(?P<user>\\\\w+)\"\n").unwrap();
        assert!(resolve_settings(&at(root)).is_err());

        fs::write(root.join("buildpage.toml"), "output = [").unwrap();
        assert!(matches!(
            resolve_settings(&at(root)),
            Err(EngineError::Toml(_))
        ));
    }

    #[test]
    fn test_detect_root_stops_at_checkout() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join(".svn")).unwrap();
        let nested = root.join("a/b");
        fs::create_dir_all(&nested).unwrap();
        assert_eq!(detect_root(&nested), root.to_path_buf());
    }
}
