//! Module outcomes and upload-output classification
//!
//! The index client reports upload results only as free text, so the
//! classification here is best-effort: an ordered list of marker rules is
//! evaluated top to bottom and the first match wins. Replace this with a
//! structured result once the index service exposes one.

use serde::Serialize;
use std::fmt;

/// Outcome of a single upload, derived from captured output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum UploadOutcome {
    /// The version is already on a non-volatile index
    AlreadyExists,
    Failed,
    Uploaded,
}

/// A classification rule: any marker present selects the outcome
#[derive(Debug, Clone, Copy)]
pub struct ClassificationRule {
    pub markers: &'static [&'static str],
    pub outcome: UploadOutcome,
}

/// Rules in evaluation order
pub const UPLOAD_RULES: &[ClassificationRule] = &[
    ClassificationRule {
        markers: &["409", "already exists"],
        outcome: UploadOutcome::AlreadyExists,
    },
    ClassificationRule {
        markers: &["FAIL", "ERROR"],
        outcome: UploadOutcome::Failed,
    },
];

impl UploadOutcome {
    /// Classify captured upload output.
    ///
    /// Matching is case-sensitive. Output matching no rule is treated as
    /// [`UploadOutcome::Uploaded`].
    pub fn classify(output: &str) -> Self {
        UPLOAD_RULES
            .iter()
            .find(|rule| rule.markers.iter().any(|m| output.contains(m)))
            .map(|rule| rule.outcome)
            .unwrap_or(UploadOutcome::Uploaded)
    }
}

/// Why a module was skipped
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SkipReason {
    MissingDirectory,
    MissingPackageFile,
}

/// Why a module failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case", tag = "kind", content = "detail")]
pub enum FailureReason {
    BuildFailed,
    MissingDist,
    UploadRejected { output: String },
    ToolError(String),
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BuildFailed => write!(f, "build command failed"),
            Self::MissingDist => write!(f, "build produced no dist directory"),
            Self::UploadRejected { .. } => write!(f, "upload rejected by index"),
            Self::ToolError(message) => write!(f, "tool error: {}", message),
        }
    }
}

/// Final outcome of the per-module procedure
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case", tag = "status", content = "reason")]
pub enum ModuleOutcome {
    Skipped(SkipReason),
    Failed(FailureReason),
    Published,
    /// Counted as success: republishing an existing version is not an error
    AlreadyPublished,
}

impl ModuleOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// Aggregated counters for a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunTally {
    pub succeeded: usize,
    pub failed: usize,
    /// Reported only; skips count as neither success nor failure
    pub skipped: usize,
}

impl RunTally {
    pub fn record(&mut self, outcome: &ModuleOutcome) {
        match outcome {
            ModuleOutcome::Skipped(_) => self.skipped += 1,
            ModuleOutcome::Failed(_) => self.failed += 1,
            ModuleOutcome::Published | ModuleOutcome::AlreadyPublished => self.succeeded += 1,
        }
    }
}
