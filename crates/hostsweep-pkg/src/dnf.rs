//! DNF package manager (Fedora/RHEL/CentOS)

use hostsweep_exec::CommandSpec;

use crate::error::PackageError;
use crate::kernel::KernelPrune;
use crate::plan::{CommandPlan, Invocation, PlanStep};
use crate::traits::PackageManager;
use crate::types::{ManagerKind, Operation, PlanParams};

/// DNF package manager implementation
///
/// Also drives `yum` hosts, the command line is the same for everything
/// this crate issues.
#[derive(Debug, Clone, Copy)]
pub struct DnfManager {
    /// Whether to use yum instead of dnf
    use_yum: bool,
}

impl DnfManager {
    /// Manager issuing `dnf` commands
    #[must_use]
    pub fn dnf() -> Self {
        Self { use_yum: false }
    }

    /// Manager issuing `yum` commands
    #[must_use]
    pub fn yum() -> Self {
        Self { use_yum: true }
    }

    fn tool(&self) -> &'static str {
        if self.use_yum { "yum" } else { "dnf" }
    }

    /// Build dnf/yum invocation
    fn pkg_cmd(&self, args: &[&str]) -> Invocation {
        Invocation::strict(CommandSpec::privileged(self.tool(), args.iter().copied()))
    }

    /// Installed kernel package the prune query lists
    ///
    /// Since Fedora 21 the bootable kernel lives in `kernel-core`, `kernel` is
    /// a meta package. EL7 only has `kernel`.
    fn kernel_package(&self) -> &'static str {
        if self.use_yum { "kernel" } else { "kernel-core" }
    }
}

impl PackageManager for DnfManager {
    fn plan(&self, op: Operation, params: &PlanParams) -> Result<CommandPlan, PackageError> {
        let plan = match op {
            // check-update exits 100 when updates are available, 0 when there are none
            Operation::UpdateRepos => CommandPlan::new([Invocation::tolerant(
                CommandSpec::privileged(self.tool(), ["check-update"]),
            )]),
            Operation::UpgradePackages => CommandPlan::new([self.pkg_cmd(&["upgrade", "-y"])]),
            Operation::RemoveOrphans => CommandPlan::new([self.pkg_cmd(&["autoremove", "-y"])]),
            Operation::CleanCache => CommandPlan::new([self.pkg_cmd(&["clean", "all"])]),
            Operation::RemoveOldKernels => CommandPlan::default().then(PlanStep::PruneKernels(
                KernelPrune::rpm(self.kernel_package(), self.tool(), params.kernels_to_keep),
            )),
        };
        Ok(plan)
    }

    fn manager_type(&self) -> ManagerKind {
        if self.use_yum {
            ManagerKind::Yum
        } else {
            ManagerKind::Dnf
        }
    }
}
