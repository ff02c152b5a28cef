//! Package manager traits

use crate::error::PackageError;
use crate::plan::CommandPlan;
use crate::types::{ManagerKind, Operation, PlanParams};

/// Maps logical operations onto one manager's commands
pub trait PackageManager: Send + Sync {
    /// Build the plan for an operation
    ///
    /// # Errors
    /// Returns `PackageError::UnsupportedOperation` if the manager has no
    /// mapping for `op`
    fn plan(&self, op: Operation, params: &PlanParams) -> Result<CommandPlan, PackageError>;

    /// Manager this implementation plans for
    fn manager_type(&self) -> ManagerKind;
}
