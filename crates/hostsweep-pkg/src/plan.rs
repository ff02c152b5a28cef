//! Command plans and the `(manager, operation)` dispatch table

use std::fmt;

use hostsweep_exec::CommandSpec;
use serde::{Deserialize, Serialize};

use crate::apt::AptManager;
use crate::detect::{BinaryProbe, detect};
use crate::dnf::DnfManager;
use crate::error::PackageError;
use crate::kernel::KernelPrune;
use crate::nix::NixManager;
use crate::orphans::OrphanPrune;
use crate::snap::SnapPrune;
use crate::traits::PackageManager;
use crate::types::{ManagerKind, Operation, PlanParams};
use crate::zypper::ZypperManager;

/// One external command plus how to read its exit status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invocation {
    /// Command to run
    pub command: CommandSpec,
    /// A non-zero exit means "nothing to do" rather than failure
    pub tolerate_nonzero_exit: bool,
}

impl Invocation {
    /// Invocation whose non-zero exit is a failure
    #[must_use]
    pub fn strict(command: CommandSpec) -> Self {
        Self {
            command,
            tolerate_nonzero_exit: false,
        }
    }

    /// Invocation whose non-zero exit is benign
    #[must_use]
    pub fn tolerant(command: CommandSpec) -> Self {
        Self {
            command,
            tolerate_nonzero_exit: true,
        }
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.command)?;
        if self.tolerate_nonzero_exit {
            write!(f, " (non-zero exit tolerated)")?;
        }
        Ok(())
    }
}

/// A step in a [`CommandPlan`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlanStep {
    /// Run a single command
    Run(Invocation),
    /// Query installed kernels, select the old ones, then remove them
    PruneKernels(KernelPrune),
    /// Query unneeded packages, then remove them
    PruneOrphans(OrphanPrune),
    /// Query disabled snap revisions, then remove each
    PruneSnapRevisions(SnapPrune),
}

impl fmt::Display for PlanStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanStep::Run(invocation) => write!(f, "{invocation}"),
            PlanStep::PruneKernels(prune) => write!(f, "{prune}"),
            PlanStep::PruneOrphans(prune) => write!(f, "{prune}"),
            PlanStep::PruneSnapRevisions(prune) => write!(f, "{prune}"),
        }
    }
}

/// Ordered steps for one operation, built without side effects
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandPlan {
    /// Steps, run in order
    pub steps: Vec<PlanStep>,
    /// Why the plan is empty, or other information for the operator
    pub note: Option<String>,
}

impl CommandPlan {
    /// Create a plan from plain invocations
    #[must_use]
    pub fn new(invocations: impl IntoIterator<Item = Invocation>) -> Self {
        Self {
            steps: invocations.into_iter().map(PlanStep::Run).collect(),
            note: None,
        }
    }

    /// An intentionally empty plan
    pub fn noop(note: impl Into<String>) -> Self {
        Self {
            steps: Vec::new(),
            note: Some(note.into()),
        }
    }

    /// Append a step
    #[must_use]
    pub fn then(mut self, step: PlanStep) -> Self {
        self.steps.push(step);
        self
    }

    /// Attach a note
    #[must_use]
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// Check if the plan issues nothing
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Plain invocations in order, skipping query based steps
    pub fn invocations(&self) -> impl Iterator<Item = &Invocation> {
        self.steps.iter().filter_map(|step| match step {
            PlanStep::Run(invocation) => Some(invocation),
            _ => None,
        })
    }
}

/// Build the plan for `op` on `kind`
///
/// Pure: no command is run and nothing is probed.
///
/// # Errors
/// Returns `PackageError::NoSupportedManager` for [`ManagerKind::Unknown`]
pub fn plan_for(
    kind: ManagerKind,
    op: Operation,
    params: &PlanParams,
) -> Result<CommandPlan, PackageError> {
    let plan = match kind {
        ManagerKind::Apt => AptManager.plan(op, params),
        ManagerKind::Dnf => DnfManager::dnf().plan(op, params),
        ManagerKind::Yum => DnfManager::yum().plan(op, params),
        ManagerKind::Zypper => ZypperManager.plan(op, params),
        ManagerKind::Nix => NixManager.plan(op, params),
        ManagerKind::Unknown => return Err(PackageError::NoSupportedManager),
    }?;

    // Only explicit no-ops may come back empty
    if plan.is_empty() && plan.note.is_none() {
        return Err(PackageError::UnsupportedOperation {
            kind,
            operation: op,
        });
    }

    Ok(plan)
}

/// Detected manager plus the parameters its plans are built with
///
/// Computed once per run and never changed afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    kind: ManagerKind,
    params: PlanParams,
}

impl Resolution {
    /// Pin a resolution to an already known manager
    #[must_use]
    pub fn new(kind: ManagerKind, params: PlanParams) -> Self {
        Self { kind, params }
    }

    /// Detected manager
    #[must_use]
    pub fn kind(&self) -> ManagerKind {
        self.kind
    }

    /// Parameters the plans are built with
    #[must_use]
    pub fn params(&self) -> &PlanParams {
        &self.params
    }

    /// Build the plan for `op` on the detected manager
    ///
    /// # Errors
    /// Returns `PackageError::NoSupportedManager` if detection found nothing
    pub fn plan_for(&self, op: Operation) -> Result<CommandPlan, PackageError> {
        plan_for(self.kind, op, &self.params)
    }
}

/// Detect the manager once and bind it to `params`
pub fn resolve(probe: &dyn BinaryProbe, params: PlanParams) -> Resolution {
    Resolution::new(detect(probe), params)
}
