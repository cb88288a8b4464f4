//! The closed set of pipeline outcomes and the stages that lead to them.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
/// Result of one pipeline run. Exactly one is produced per run.
pub enum Outcome {
    BuildFailed,
    BuildLinkFailed,
    BuildFailedException,
    BuildFailedUnknown,
    BuildFailedUnparseable,
    BuildSuccessful,
    TestsPassed,
    TestsFailed,
    TestsInvalid,
}

impl Outcome {
    pub const ALL: [Outcome; 9] = [
        Outcome::BuildFailed,
        Outcome::BuildLinkFailed,
        Outcome::BuildFailedException,
        Outcome::BuildFailedUnknown,
        Outcome::BuildFailedUnparseable,
        Outcome::BuildSuccessful,
        Outcome::TestsPassed,
        Outcome::TestsFailed,
        Outcome::TestsInvalid,
    ];

    /// Human-facing summary line shown on the build page.
    pub fn label(self) -> &'static str {
        match self {
            Outcome::BuildFailed => "Build FAILED, Tests not run",
            Outcome::BuildLinkFailed => "Link FAILED, Tests not run",
            Outcome::BuildFailedException => "Build FAILED, Exception",
            Outcome::BuildFailedUnknown => "Build FAILED, Unknown Errors",
            Outcome::BuildFailedUnparseable => "Build FAILED, Unparseable Results",
            Outcome::BuildSuccessful => "Build Successful",
            Outcome::TestsPassed => "Build Successful, Tests Passed",
            Outcome::TestsFailed => "Build Successful, Tests FAILED",
            Outcome::TestsInvalid => "Build Successful, Invalid Test Results",
        }
    }

    /// `(is_terminal_success, permits_testing)`
    pub fn flags(self) -> (bool, bool) {
        (self.is_terminal_success(), self.permits_testing())
    }

    pub fn is_terminal_success(self) -> bool {
        matches!(self, Outcome::TestsPassed)
    }

    /// Only a successful build may proceed to install and test.
    pub fn permits_testing(self) -> bool {
        matches!(self, Outcome::BuildSuccessful)
    }

    pub fn is_build_failure(self) -> bool {
        matches!(
            self,
            Outcome::BuildFailed
                | Outcome::BuildLinkFailed
                | Outcome::BuildFailedException
                | Outcome::BuildFailedUnknown
                | Outcome::BuildFailedUnparseable
        )
    }

    /// Test-phase outcomes are the ones that ship an installer.
    pub fn uploads_installer(self) -> bool {
        matches!(
            self,
            Outcome::TestsPassed | Outcome::TestsFailed | Outcome::TestsInvalid
        )
    }

    /// Whether the run as a whole counts as green.
    pub fn is_success(self) -> bool {
        matches!(self, Outcome::TestsPassed | Outcome::BuildSuccessful)
    }

    /// Name an installer is published under for this outcome.
    pub fn installer_name(self, file_name: &str) -> String {
        if self.is_terminal_success() {
            file_name.to_string()
        } else {
            format!("failed_tests_{}", file_name)
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
/// States of the pipeline state machine, in the order they are visited.
pub enum Stage {
    Configuring,
    Building,
    Installing,
    Testing,
    UploadingInstaller,
    Reporting,
    Done,
}

/// Path through the state machine for a run that ended in `outcome`.
pub fn stages_for(outcome: Outcome) -> Vec<Stage> {
    let mut stages = vec![Stage::Configuring, Stage::Building];
    if outcome.uploads_installer() {
        stages.extend([Stage::Installing, Stage::Testing, Stage::UploadingInstaller]);
    }
    stages.extend([Stage::Reporting, Stage::Done]);
    stages
}
