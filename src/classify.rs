//! Outcome classification for the build and test phases.
//!
//! `Engine` owns the explicit settings and the blame facility. Each phase
//! maps an `(exit code, output)` pair to exactly one `Outcome` plus a
//! report; `run` chains them the way the pipeline state machine does.

use crate::blame::{BlameEnricher, BlameSource, CommandBlame};
use crate::config::Settings;
use crate::extract::{self, BuildMatch};
use crate::group::FileGroup;
use crate::models::outcome::stages_for;
use crate::models::{Outcome, PhaseReport, PipelineResult, ProcessOutput, Record};
use crate::render;
use tracing::{debug, info};

pub struct Engine {
    settings: Settings,
    blame: Box<dyn BlameSource>,
}

impl Engine {
    pub fn new(settings: Settings, blame: Box<dyn BlameSource>) -> Self {
        Self { settings, blame }
    }

    /// Engine backed by the configured blame command.
    pub fn with_command_blame(settings: Settings) -> Self {
        let blame = CommandBlame::new(settings.blame_command.clone());
        Self::new(settings, Box::new(blame))
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Group records by file and attach blame data when enabled.
    pub fn categorize(&self, records: Vec<Record>) -> FileGroup {
        let mut group = FileGroup::from_records(records);
        if self.settings.blame_enabled {
            let stats = BlameEnricher::new(
                self.blame.as_ref(),
                &self.settings.blame_format,
                &self.settings.source_root,
            )
            .parallel(self.settings.blame_parallel)
            .enrich(&mut group);
            debug!(
                blamed = stats.files_blamed,
                failed = stats.files_failed,
                enriched = stats.records_enriched,
                "blame enrichment done"
            );
        }
        group
    }

    fn render(&self, group: &FileGroup) -> String {
        render::render_group(group, &self.settings.separator)
    }

    /// Classify the build phase.
    pub fn parse_build_results(&self, exit_code: i32, output: &str) -> PhaseReport {
        match extract::extract_build(exit_code, output) {
            BuildMatch::Clean => PhaseReport::new(Outcome::BuildSuccessful, ""),
            BuildMatch::CompileErrors(records) => {
                let group = self.categorize(records);
                let report = self.render(&group);
                PhaseReport::new(Outcome::BuildFailed, report).with_records(group.into_records())
            }
            BuildMatch::LinkErrors(records) => {
                let report = render::render_ungrouped(&records);
                PhaseReport::new(Outcome::BuildLinkFailed, report).with_records(records)
            }
            BuildMatch::Exception(record) => {
                let group = FileGroup::from_records(vec![record.clone()]);
                let report = if group.is_empty() {
                    render::render_ungrouped(std::slice::from_ref(&record))
                } else {
                    self.render(&group)
                };
                PhaseReport::new(Outcome::BuildFailedException, report).with_records(vec![record])
            }
            BuildMatch::Unknown(records) => {
                let report = render::render_ungrouped(&records);
                PhaseReport::new(Outcome::BuildFailedUnknown, report).with_records(records)
            }
            BuildMatch::Unparseable => {
                PhaseReport::new(Outcome::BuildFailedUnparseable, render::raw_report(output))
            }
        }
    }

    /// Classify the test phase.
    ///
    /// A failure marker with parsed failures is `TestsFailed`. A marker
    /// without any, or a non-zero exit without a marker, is `TestsInvalid`.
    /// Otherwise the run passed and the report lists the loaded tests.
    pub fn parse_test_results(&self, exit_code: i32, output: &str) -> PhaseReport {
        let failed_marker = extract::tests_failed_marker(output);
        let failures = extract::test_failures(output);

        if failed_marker && !failures.is_empty() {
            let group = self.categorize(failures);
            let report = self.render(&group);
            return PhaseReport::new(Outcome::TestsFailed, report).with_records(group.into_records());
        }
        if failed_marker || exit_code != 0 {
            debug!(failed_marker, exit_code, "test output could not be explained");
            return PhaseReport::new(Outcome::TestsInvalid, render::raw_report(output));
        }
        let passed: Vec<String> = extract::tests_loaded(output)
            .iter()
            .map(|t| format!("{} passed", render::escape_html(t)))
            .collect();
        PhaseReport::new(Outcome::TestsPassed, passed.join(render::RAW_LINE_BREAK))
    }

    /// Warnings report for the build output, independent of the outcome.
    pub fn build_warnings(&self, output: &str) -> String {
        let warnings = extract::warnings(output);
        if warnings.is_empty() {
            return String::new();
        }
        let group = self.categorize(warnings);
        self.render(&group)
    }

    /// Classify a whole run. Tests are only considered when the build
    /// outcome permits testing; their report then supersedes the build one.
    pub fn run(&self, build: &ProcessOutput, tests: Option<&ProcessOutput>) -> PipelineResult {
        let mut phase = self.parse_build_results(build.exit_code, &build.output);
        let warnings = self.build_warnings(&build.output);

        if phase.outcome.permits_testing() {
            match tests {
                Some(t) => phase = self.parse_test_results(t.exit_code, &t.output),
                None => debug!("build succeeded but no test output was supplied"),
            }
        }
        info!(outcome = %phase.outcome, "classified");

        PipelineResult {
            outcome: phase.outcome,
            summary: phase.outcome.label().to_string(),
            report: phase.report,
            warnings,
            stages: stages_for(phase.outcome),
            records: phase.records,
        }
    }
}
