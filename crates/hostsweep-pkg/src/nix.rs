//! Nix package manager (NixOS)

use hostsweep_exec::CommandSpec;

use crate::error::PackageError;
use crate::plan::{CommandPlan, Invocation};
use crate::traits::PackageManager;
use crate::types::{ManagerKind, Operation, PlanParams};

/// System profile whose generations carry the boot entries
const SYSTEM_PROFILE: &str = "/nix/var/nix/profiles/system";

/// Nix package manager implementation
#[derive(Debug, Clone, Copy, Default)]
pub struct NixManager;

impl NixManager {
    fn nix_cmd(program: &str, args: &[&str]) -> Invocation {
        Invocation::strict(CommandSpec::privileged(program, args.iter().copied()))
    }
}

impl PackageManager for NixManager {
    fn plan(&self, op: Operation, params: &PlanParams) -> Result<CommandPlan, PackageError> {
        let plan = match op {
            Operation::UpdateRepos => CommandPlan::new([Self::nix_cmd("nix-channel", &["--update"])]),
            Operation::UpgradePackages => CommandPlan::new([Self::nix_cmd("nix-env", &["--upgrade"])]),
            Operation::RemoveOrphans => {
                CommandPlan::new([Self::nix_cmd("nix-collect-garbage", &[])])
            }
            Operation::CleanCache => CommandPlan::new([Self::nix_cmd("nix-store", &["--optimise"])])
                .with_note("nix keeps no package download cache; the store is deduplicated instead"),
            Operation::RemoveOldKernels => {
                // "+N" keeps the last N generations, the current one is never deleted
                let keep = format!("+{}", params.kernels_to_keep.max(1));
                CommandPlan::new([
                    Self::nix_cmd(
                        "nix-env",
                        &["--profile", SYSTEM_PROFILE, "--delete-generations", keep.as_str()],
                    ),
                    Self::nix_cmd("nix-collect-garbage", &[]),
                ])
                .with_note("kernels are pruned with old system generations")
            }
        };
        Ok(plan)
    }

    fn manager_type(&self) -> ManagerKind {
        ManagerKind::Nix
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_pruning_keeps_configured_count() {
        let params = PlanParams::default().with_kernels_to_keep(3);
        let plan = NixManager.plan(Operation::RemoveOldKernels, &params).unwrap();
        let commands: Vec<String> = plan.invocations().map(|i| i.command.to_string()).collect();

        assert_eq!(
            commands,
            vec![
                "nix-env --profile /nix/var/nix/profiles/system --delete-generations +3",
                "nix-collect-garbage",
            ]
        );
    }

    #[test]
    fn test_clean_cache_explains_optimise() {
        let plan = NixManager.plan(Operation::CleanCache, &PlanParams::default()).unwrap();
        let commands: Vec<String> = plan.invocations().map(|i| i.command.to_string()).collect();

        assert_eq!(commands, vec!["nix-store --optimise"]);
        assert!(plan.note.unwrap().contains("deduplicated"));
    }

    #[test]
    fn test_zero_keep_still_keeps_current_generation() {
        let params = PlanParams::default().with_kernels_to_keep(0);
        let plan = NixManager.plan(Operation::RemoveOldKernels, &params).unwrap();
        let first = plan.invocations().next().unwrap();
        assert_eq!(first.command.args.last().map(String::as_str), Some("+1"));
    }
}
