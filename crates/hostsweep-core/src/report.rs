//! Run report types

use std::fmt;

use chrono::{DateTime, Utc};
use hostsweep_pkg::ManagerKind;
use serde::{Deserialize, Serialize};

/// Outcome of a single pipeline step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum StepStatus {
    /// All commands ran (tolerated exits included)
    Completed,
    /// Step was not attempted
    Skipped(String),
    /// A command failed or could not be run
    Failed(String),
    /// Dry run: the plan was resolved but not executed
    Planned,
}

/// Report entry for one step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepReport {
    /// Operation or collaborator name
    pub name: String,
    /// Outcome
    #[serde(flatten)]
    pub status: StepStatus,
    /// Number of external commands issued
    pub commands_issued: usize,
    /// Informational note from the plan
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl StepReport {
    /// Create a step report
    pub fn new(name: impl Into<String>, status: StepStatus, commands_issued: usize) -> Self {
        Self {
            name: name.into(),
            status,
            commands_issued,
            note: None,
        }
    }

    /// Step that was not attempted
    pub fn skipped(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(name, StepStatus::Skipped(reason.into()), 0)
    }

    /// Attach a note
    #[must_use]
    pub fn with_note(mut self, note: Option<String>) -> Self {
        self.note = note;
        self
    }
}

/// Report for a whole maintenance run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Detected package manager
    pub manager: ManagerKind,
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// When the run ended
    pub finished_at: Option<DateTime<Utc>>,
    /// Whether commands were only planned
    pub dry_run: bool,
    /// Whether a failure stopped the remaining steps
    pub aborted: bool,
    /// Per-step outcomes in execution order
    pub steps: Vec<StepReport>,
}

impl RunReport {
    /// Start a report
    #[must_use]
    pub fn new(manager: ManagerKind, dry_run: bool) -> Self {
        Self {
            manager,
            started_at: Utc::now(),
            finished_at: None,
            dry_run,
            aborted: false,
            steps: Vec::new(),
        }
    }

    /// Record a step
    pub fn push(&mut self, step: StepReport) {
        self.steps.push(step);
    }

    /// Mark the run finished
    #[must_use]
    pub fn finish(mut self) -> Self {
        self.finished_at = Some(Utc::now());
        self
    }

    /// Check if any step failed
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.steps
            .iter()
            .any(|s| matches!(s.status, StepStatus::Failed(_)))
    }

    /// Total number of external commands issued
    #[must_use]
    pub fn commands_issued(&self) -> usize {
        self.steps.iter().map(|s| s.commands_issued).sum()
    }

    /// One-line summary
    #[must_use]
    pub fn summary(&self) -> String {
        let count = |f: fn(&StepStatus) -> bool| self.steps.iter().filter(|s| f(&s.status)).count();
        let completed = count(|s| matches!(s, StepStatus::Completed));
        let planned = count(|s| matches!(s, StepStatus::Planned));
        let skipped = count(|s| matches!(s, StepStatus::Skipped(_)));
        let failed = count(|s| matches!(s, StepStatus::Failed(_)));

        let mut summary = format!(
            "{manager}: {total} steps, {completed} completed, {skipped} skipped, {failed} failed",
            manager = self.manager,
            total = self.steps.len(),
        );
        if planned > 0 {
            summary.push_str(&format!(", {planned} planned"));
        }
        if self.aborted {
            summary.push_str(" (aborted)");
        }
        summary
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for step in &self.steps {
            let (mark, detail) = match &step.status {
                StepStatus::Completed => ("ok", None),
                StepStatus::Planned => ("plan", None),
                StepStatus::Skipped(reason) => ("skip", Some(reason)),
                StepStatus::Failed(error) => ("FAIL", Some(error)),
            };
            write!(f, "[{mark:>4}] {}", step.name)?;
            if let Some(detail) = detail {
                write!(f, ": {detail}")?;
            } else if let Some(note) = &step.note {
                write!(f, " ({note})")?;
            }
            writeln!(f)?;
        }
        write!(f, "{}", self.summary())
    }
}
