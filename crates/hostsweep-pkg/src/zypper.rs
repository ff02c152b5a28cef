//! Zypper package manager (openSUSE/SLES)

use hostsweep_exec::CommandSpec;

use crate::error::PackageError;
use crate::orphans::OrphanPrune;
use crate::plan::{CommandPlan, Invocation, PlanStep};
use crate::traits::PackageManager;
use crate::types::{ManagerKind, Operation, PlanParams};

/// Zypper package manager implementation
#[derive(Debug, Clone, Copy, Default)]
pub struct ZypperManager;

impl ZypperManager {
    /// Build a non-interactive zypper invocation
    fn zypper_cmd(args: &[&str]) -> Invocation {
        let command = CommandSpec::privileged("zypper", ["--non-interactive"])
            .with_args(args.iter().copied());
        Invocation::strict(command)
    }
}

impl PackageManager for ZypperManager {
    fn plan(&self, op: Operation, _params: &PlanParams) -> Result<CommandPlan, PackageError> {
        let plan = match op {
            Operation::UpdateRepos => CommandPlan::new([Self::zypper_cmd(&["refresh"])]),
            Operation::UpgradePackages => CommandPlan::new([Self::zypper_cmd(&["update"])]),
            // purge-kernels honours multiversion.kernels from zypp.conf
            Operation::RemoveOrphans => CommandPlan::default()
                .then(PlanStep::PruneOrphans(OrphanPrune::zypper()))
                .then(PlanStep::Run(Self::zypper_cmd(&["purge-kernels"]))),
            Operation::CleanCache => CommandPlan::new([Self::zypper_cmd(&["clean", "--all"])]),
            Operation::RemoveOldKernels => {
                CommandPlan::noop("old kernels are purged with orphan removal")
            }
        };
        Ok(plan)
    }

    fn manager_type(&self) -> ManagerKind {
        ManagerKind::Zypper
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commands_are_non_interactive() {
        for op in Operation::PIPELINE {
            let plan = ZypperManager.plan(op, &PlanParams::default()).unwrap();
            for invocation in plan.invocations() {
                assert_eq!(invocation.command.args[0], "--non-interactive");
            }
        }
    }

    #[test]
    fn test_orphans_removes_unneeded_packages() {
        let plan = ZypperManager
            .plan(Operation::RemoveOrphans, &PlanParams::default())
            .unwrap();
        let PlanStep::PruneOrphans(prune) = &plan.steps[0] else {
            panic!("orphan removal must start with the unneeded query");
        };
        assert_eq!(prune.query.command.args, vec!["--non-interactive", "packages", "--unneeded"]);
        assert_eq!(
            prune.remove.to_string(),
            "zypper --non-interactive remove --clean-deps"
        );
    }

    #[test]
    fn test_kernel_removal_folded_into_orphans() {
        let params = PlanParams::default();
        let orphans = ZypperManager.plan(Operation::RemoveOrphans, &params).unwrap();
        assert_eq!(
            orphans.invocations().next().unwrap().command.to_string(),
            "zypper --non-interactive purge-kernels"
        );

        let kernels = ZypperManager.plan(Operation::RemoveOldKernels, &params).unwrap();
        assert!(kernels.is_empty());
        assert!(kernels.note.is_some());
    }
}
