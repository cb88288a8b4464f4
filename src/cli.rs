//! CLI argument parsing via `clap`.

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "buildpage",
    version,
    about = "Classify captured build and test output",
    long_about = "Buildpage — classify build/test logs into an outcome, extract errors, warnings and test failures, attach blame data and render an HTML-safe report.\n\nConfiguration precedence: CLI > buildpage.toml > defaults.",
    after_help = "Examples:\n  buildpage classify --build-log build.txt --build-exit 0 --test-log tests.txt --test-exit 1\n  buildpage classify --build-log build.txt --build-exit 1 --output json --no-blame\n  buildpage warnings --build-log build.txt",
    arg_required_else_help = true
)]
/// Top-level CLI options and subcommands.
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Args, Clone, Default)]
/// Options shared by every command that resolves settings.
pub struct CommonOpts {
    #[arg(long, help = "Source checkout used for blame lookups (default: config dir)")]
    pub source_root: Option<String>,
    #[arg(long, help = "Explicit config file (default: discover buildpage.toml)")]
    pub config: Option<String>,
    #[arg(long, help = "Output mode: human|json (default: human)")]
    pub output: Option<String>,
    #[arg(long, action = clap::ArgAction::SetTrue, help = "Skip blame enrichment")]
    pub no_blame: bool,
    #[arg(long, action = clap::ArgAction::SetTrue, help = "Blame files concurrently")]
    pub parallel_blame: bool,
}

#[derive(Subcommand)]
/// Supported subcommands.
pub enum Commands {
    /// Show version
    #[command(about = "Show version", long_about = "Print the current buildpage version.")]
    Version,
    /// Classify a build log and optional test log
    #[command(
        about = "Classify build/test output",
        long_about = "Read captured build (and optionally test) output with its exit code, classify the run and print the outcome, report and warnings. Exits 0 on success, 1 on a failed outcome, 2 on usage errors.",
        after_help = "Examples:\n  buildpage classify --build-log build.txt --build-exit 2\n  buildpage classify --build-log b.txt --build-exit 0 --test-log t.txt --test-exit 0"
    )]
    Classify {
        #[arg(long, help = "File holding the captured build output")]
        build_log: String,
        #[arg(long, allow_hyphen_values = true, help = "Exit code of the build process")]
        build_exit: i32,
        #[arg(long, requires = "test_exit", help = "File holding the captured test output")]
        test_log: Option<String>,
        #[arg(long, allow_hyphen_values = true, requires = "test_log", help = "Exit code of the test process")]
        test_exit: Option<i32>,
        #[command(flatten)]
        common: CommonOpts,
    },
    /// Print the warnings report for a build log
    #[command(
        about = "Report build warnings",
        long_about = "Extract compiler warnings from a build log regardless of its exit code."
    )]
    Warnings {
        #[arg(long, help = "File holding the captured build output")]
        build_log: String,
        #[command(flatten)]
        common: CommonOpts,
    },
}
