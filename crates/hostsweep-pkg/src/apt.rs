//! APT package manager (Debian/Ubuntu)

use hostsweep_exec::CommandSpec;

use crate::error::PackageError;
use crate::plan::{CommandPlan, Invocation};
use crate::traits::PackageManager;
use crate::types::{ManagerKind, Operation, PlanParams};

/// APT package manager implementation
#[derive(Debug, Clone, Copy, Default)]
pub struct AptManager;

impl AptManager {
    /// Build an apt-get invocation
    fn apt_cmd(args: &[&str]) -> Invocation {
        Invocation::strict(CommandSpec::privileged("apt-get", args.iter().copied()))
    }
}

impl PackageManager for AptManager {
    fn plan(&self, op: Operation, _params: &PlanParams) -> Result<CommandPlan, PackageError> {
        let plan = match op {
            Operation::UpdateRepos => CommandPlan::new([Self::apt_cmd(&["update"])]),
            Operation::UpgradePackages => CommandPlan::new([Self::apt_cmd(&["upgrade", "-y"])]),
            Operation::RemoveOrphans => {
                CommandPlan::new([Self::apt_cmd(&["autoremove", "--purge", "-y"])])
            }
            Operation::CleanCache => CommandPlan::new([
                Self::apt_cmd(&["autoclean", "-y"]),
                Self::apt_cmd(&["clean"]),
            ]),
            // Superseded kernel packages are auto-installed, autoremove takes them
            Operation::RemoveOldKernels => CommandPlan::noop("old kernels are removed by autoremove"),
        };
        Ok(plan)
    }

    fn manager_type(&self) -> ManagerKind {
        ManagerKind::Apt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn commands(op: Operation) -> Vec<String> {
        AptManager
            .plan(op, &PlanParams::default())
            .unwrap()
            .invocations()
            .map(|i| i.command.to_string())
            .collect()
    }

    #[test]
    fn test_clean_cache_runs_autoclean_then_clean() {
        assert_eq!(
            commands(Operation::CleanCache),
            vec!["apt-get autoclean -y", "apt-get clean"]
        );
    }

    #[test]
    fn test_remove_orphans_purges() {
        assert_eq!(
            commands(Operation::RemoveOrphans),
            vec!["apt-get autoremove --purge -y"]
        );
    }

    #[test]
    fn test_kernel_removal_is_noop_with_note() {
        let plan = AptManager
            .plan(Operation::RemoveOldKernels, &PlanParams::default())
            .unwrap();
        assert!(plan.is_empty());
        assert!(plan.note.unwrap().contains("autoremove"));
    }

    #[test]
    fn test_apt_commands_are_strict() {
        for op in Operation::PIPELINE {
            let plan = AptManager.plan(op, &PlanParams::default()).unwrap();
            assert!(plan.invocations().all(|i| !i.tolerate_nonzero_exit));
        }
    }
}
