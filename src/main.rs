//! Buildpage CLI binary entry point.
//! Resolves settings, reads captured logs and prints the classification.

use buildpage::cli::{Cli, Commands, CommonOpts};
use buildpage::config::{self, Overrides, Settings};
use buildpage::error::EngineError;
use buildpage::models::ProcessOutput;
use buildpage::{output, Engine};
use clap::Parser;
use std::fs;
use tracing_subscriber::EnvFilter;

fn init_logging() {
    let filter = EnvFilter::try_from_env("BUILDPAGE_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn fail(msg: impl std::fmt::Display) -> ! {
    eprintln!("{} {}", output::error_prefix(), msg);
    std::process::exit(2);
}

/// Logs are not guaranteed to be UTF-8; decode lossily.
fn read_log(path: &str) -> Result<String, EngineError> {
    let bytes = fs::read(path)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn settings(common: &CommonOpts) -> Settings {
    let ov = Overrides {
        start: None,
        config: common.config.clone(),
        source_root: common.source_root.clone(),
        output: common.output.clone(),
        no_blame: common.no_blame,
        parallel_blame: if common.parallel_blame { Some(true) } else { None },
    };
    let settings = match config::resolve_settings(&ov) {
        Ok(s) => s,
        Err(e) => fail(e),
    };
    if settings.config_file.is_none() {
        eprintln!(
            "{} {}",
            output::note_prefix(),
            "No buildpage.toml found; using defaults."
        );
    }
    settings
}

fn main() {
    init_logging();
    let cli = Cli::parse();
    match cli.cmd {
        Commands::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
        }
        Commands::Classify {
            build_log,
            build_exit,
            test_log,
            test_exit,
            common,
        } => {
            let settings = settings(&common);
            let build = match read_log(&build_log) {
                Ok(s) => ProcessOutput::new(build_exit, s),
                Err(e) => fail(format!("cannot read build log {}: {}", build_log, e)),
            };
            let tests = match (test_log, test_exit) {
                (Some(path), Some(code)) => match read_log(&path) {
                    Ok(s) => Some(ProcessOutput::new(code, s)),
                    Err(e) => fail(format!("cannot read test log {}: {}", path, e)),
                },
                _ => None,
            };
            let mode = settings.output.clone();
            let engine = Engine::with_command_blame(settings);
            let result = engine.run(&build, tests.as_ref());
            if let Err(e) = output::print_result(&result, &mode) {
                fail(e);
            }
            if !result.outcome.is_success() {
                std::process::exit(1);
            }
        }
        Commands::Warnings { build_log, common } => {
            let settings = settings(&common);
            let text = match read_log(&build_log) {
                Ok(s) => s,
                Err(e) => fail(format!("cannot read build log {}: {}", build_log, e)),
            };
            let mode = settings.output.clone();
            let engine = Engine::with_command_blame(settings);
            output::print_warnings(&engine.build_warnings(&text), &mode);
        }
    }
}
