//! Output rendering for classification results.
//!
//! Supports `human` (default) and `json` outputs. The JSON form is the
//! serialized `PipelineResult` plus a small summary block.

use crate::models::{Outcome, PipelineResult};
use owo_colors::OwoColorize;
use serde_json::json;
use serde_json::Value as JsonVal;

fn use_colors(output: &str) -> bool {
    output != "json" && std::env::var_os("NO_COLOR").is_none()
}

pub fn error_prefix() -> String {
    if use_colors("human") {
        "error:".red().bold().to_string()
    } else {
        "error:".to_string()
    }
}

pub fn note_prefix() -> String {
    if use_colors("human") {
        "note:".blue().bold().to_string()
    } else {
        "note:".to_string()
    }
}

fn outcome_badge(outcome: Outcome, color: bool) -> String {
    let icon = if outcome.is_success() {
        "✔"
    } else if matches!(outcome, Outcome::TestsInvalid | Outcome::BuildFailedUnparseable) {
        "▲"
    } else {
        "✖"
    };
    let text = format!("{} {}", icon, outcome.label());
    if !color {
        return text;
    }
    match icon {
        "✔" => text.green().bold().to_string(),
        "▲" => text.yellow().bold().to_string(),
        _ => text.red().bold().to_string(),
    }
}

/// Print a pipeline result in the requested format.
pub fn print_result(res: &PipelineResult, output: &str) -> Result<(), serde_json::Error> {
    match output {
        "json" => println!("{}", serde_json::to_string_pretty(&compose_json(res)?)?),
        _ => {
            let color = use_colors(output);
            println!("{}", outcome_badge(res.outcome, color));
            if !res.report.is_empty() {
                let head = "— Report —";
                if color {
                    println!("{}", head.bold());
                } else {
                    println!("{}", head);
                }
                println!("{}", res.report);
            }
            if !res.warnings.is_empty() {
                let head = "— Warnings —";
                if color {
                    println!("{}", head.yellow().bold());
                } else {
                    println!("{}", head);
                }
                println!("{}", res.warnings);
            }
        }
    }
    Ok(())
}

/// Print only a warnings report.
pub fn print_warnings(warnings: &str, output: &str) {
    match output {
        "json" => println!("{}", json!({ "warnings": warnings })),
        _ => {
            if warnings.is_empty() {
                if use_colors(output) {
                    println!("{}", "no warnings".bright_black());
                } else {
                    println!("no warnings");
                }
            } else {
                println!("{}", warnings);
            }
        }
    }
}

/// Compose the JSON document for a result (pure) for testing purposes.
pub fn compose_json(res: &PipelineResult) -> Result<JsonVal, serde_json::Error> {
    let mut out = serde_json::to_value(res)?;
    if let JsonVal::Object(map) = &mut out {
        map.insert(
            "flags".into(),
            json!({
                "terminal_success": res.outcome.is_terminal_success(),
                "permits_testing": res.outcome.permits_testing(),
                "uploads_installer": res.outcome.uploads_installer(),
                "records": res.records.len(),
            }),
        );
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::outcome::stages_for;
    use crate::models::{Record, SourceIssue};

    fn result(outcome: Outcome) -> PipelineResult {
        PipelineResult {
            outcome,
            summary: outcome.label().to_string(),
            report: "a.c:1<br>ERROR: x".into(),
            warnings: String::new(),
            stages: stages_for(outcome),
            records: vec![Record::CompileError(SourceIssue {
                file: "a.c".into(),
                line: 1,
                message: "x".into(),
                blame: None,
            })],
        }
    }

    #[test]
    fn test_compose_json_shape() {
        let out = compose_json(&result(Outcome::BuildFailed)).unwrap();
        assert_eq!(out["outcome"], "BUILD_FAILED");
        assert_eq!(out["summary"], "Build FAILED, Tests not run");
        assert_eq!(out["records"][0]["kind"], "compile_error");
        assert_eq!(out["stages"][1], "building");
        assert_eq!(out["flags"]["permits_testing"], false);
        assert_eq!(out["flags"]["records"], 1);
    }

    #[test]
    fn test_badge_without_color() {
        assert_eq!(
            outcome_badge(Outcome::TestsPassed, false),
            "✔ Build Successful, Tests Passed"
        );
        assert_eq!(
            outcome_badge(Outcome::TestsInvalid, false),
            "▲ Build Successful, Invalid Test Results"
        );
        assert_eq!(
            outcome_badge(Outcome::BuildLinkFailed, false),
            "✖ Link FAILED, Tests not run"
        );
    }
}
