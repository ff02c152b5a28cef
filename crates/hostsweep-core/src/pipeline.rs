//! Sequential maintenance pipeline
//!
//! Detects the package manager once, runs the five package operations in
//! order, then the enabled cleanup collaborators. Every command is awaited
//! before the next one is issued.

use std::sync::Arc;

use hostsweep_exec::{CommandExecutor, CommandResult, CommandSpec};
use hostsweep_pkg::{
    BinaryProbe, CommandPlan, Invocation, KernelPrune, Operation, OrphanPrune, PackageError,
    PlanStep, Resolution, SnapPrune, resolve,
};
use tracing::{debug, error, info, instrument, warn};

use crate::cleanup::enabled_tasks;
use crate::config::{Privilege, SweepConfig};
use crate::error::CoreError;
use crate::report::{RunReport, StepReport, StepStatus};

/// Runs the maintenance pipeline against one host
pub struct Pipeline {
    /// Executor every command goes through
    executor: Arc<dyn CommandExecutor>,
    /// Binary probe used for detection and collaborator availability
    probe: Arc<dyn BinaryProbe>,
    /// Run configuration
    config: SweepConfig,
}

impl Pipeline {
    /// Create a new pipeline
    pub fn new(
        executor: Arc<dyn CommandExecutor>,
        probe: Arc<dyn BinaryProbe>,
        config: SweepConfig,
    ) -> Self {
        Self {
            executor,
            probe,
            config,
        }
    }

    /// Run configuration
    #[must_use]
    pub fn config(&self) -> &SweepConfig {
        &self.config
    }

    /// Detect the package manager and bind the configured params
    #[must_use]
    pub fn resolve(&self) -> Resolution {
        resolve(self.probe.as_ref(), self.config.params.clone())
    }

    /// Run every step and report the outcome
    ///
    /// Failed commands are recorded in the report; depending on
    /// `continue_on_error` the remaining steps still run or are abandoned.
    ///
    /// # Errors
    /// Returns `CoreError::Package` when no supported package manager is
    /// found or a plan cannot be built. Nothing has been executed then.
    #[instrument(skip(self), fields(dry_run = self.config.general.dry_run))]
    pub async fn run(&self) -> Result<RunReport, CoreError> {
        let resolution = self.resolve();
        let kind = resolution.kind();
        if !kind.is_supported() {
            error!("no supported package manager, nothing to do");
            return Err(PackageError::NoSupportedManager.into());
        }

        // Build every plan up front so a defect in the table stops the run
        // before anything is touched
        let plans = Operation::PIPELINE
            .into_iter()
            .map(|op| resolution.plan_for(op).map(|plan| (op, plan)))
            .collect::<Result<Vec<_>, _>>()?;

        let mut report = RunReport::new(kind, self.config.general.dry_run);
        info!(manager = %kind, executor = self.executor.executor_type(), "starting maintenance run");

        for (op, plan) in &plans {
            if !self.run_step(&mut report, &op.to_string(), plan).await {
                report.aborted = true;
                warn!(step = %op, "aborting remaining steps");
                return Ok(report.finish());
            }
        }

        for task in enabled_tasks(&self.config.cleanup) {
            if let Err(reason) = task.availability(self.probe.as_ref()) {
                info!(step = task.name(), %reason, "skipping cleanup");
                report.push(StepReport::skipped(task.name(), reason));
                continue;
            }

            let plan = task.plan(&self.config.params);
            if !self.run_step(&mut report, task.name(), &plan).await {
                report.aborted = true;
                warn!(step = task.name(), "aborting remaining steps");
                return Ok(report.finish());
            }
        }

        let report = report.finish();
        info!(summary = %report.summary(), "maintenance run finished");
        Ok(report)
    }

    /// Execute one plan and record it; returns whether the run should go on
    async fn run_step(&self, report: &mut RunReport, name: &str, plan: &CommandPlan) -> bool {
        let mut issued = 0;
        let result = self.execute_plan(name, plan, &mut issued).await;

        let status = match result {
            Ok(()) if self.config.general.dry_run => StepStatus::Planned,
            Ok(()) => StepStatus::Completed,
            Err(e) => {
                error!(step = name, error = %e, "step failed");
                StepStatus::Failed(e.to_string())
            }
        };
        let failed = matches!(status, StepStatus::Failed(_));
        report.push(StepReport::new(name, status, issued).with_note(plan.note.clone()));

        !failed || self.config.general.continue_on_error
    }

    /// Execute a plan step by step
    ///
    /// `issued` counts the commands actually run, including those before a
    /// failure.
    ///
    /// # Errors
    /// Returns `CoreError::CommandExecutionFailed` for a non-tolerated
    /// non-zero exit, `CoreError::Exec` if a command could not run
    #[instrument(skip(self, plan, issued))]
    pub async fn execute_plan(
        &self,
        name: &str,
        plan: &CommandPlan,
        issued: &mut usize,
    ) -> Result<(), CoreError> {
        if plan.is_empty() {
            info!(note = plan.note.as_deref().unwrap_or(""), "nothing to run");
            return Ok(());
        }

        for step in &plan.steps {
            match step {
                PlanStep::Run(invocation) => {
                    self.run_invocation(invocation, issued).await?;
                }
                PlanStep::PruneKernels(prune) => {
                    self.prune_kernels(prune, issued).await?;
                }
                PlanStep::PruneOrphans(prune) => {
                    self.prune_orphans(prune, issued).await?;
                }
                PlanStep::PruneSnapRevisions(prune) => {
                    self.prune_snap_revisions(prune, issued).await?;
                }
            }
        }
        Ok(())
    }

    /// Query installed kernels, select the old ones and remove them
    async fn prune_kernels(&self, prune: &KernelPrune, issued: &mut usize) -> Result<(), CoreError> {
        let Some(listing) = self.query(&prune.query, issued).await? else {
            return Ok(());
        };
        let candidates = KernelPrune::parse_candidates(&listing);

        let running = self
            .exec(&KernelPrune::running_release_query())
            .await
            .inspect(|_| *issued += 1)
            .ok()
            .filter(CommandResult::success)
            .map(|r| r.stdout);
        if running.is_none() {
            warn!("could not read running kernel release");
        }

        let targets = prune.targets(&candidates, running.as_deref());
        info!(
            installed = candidates.len(),
            keep = prune.keep,
            removing = targets.len(),
            "selected old kernels"
        );

        match prune.removal(&targets) {
            Some(removal) => {
                self.run_invocation(&removal, issued).await?;
            }
            None => info!("no old kernels to remove"),
        }
        Ok(())
    }

    /// List unneeded packages and remove them in one command
    async fn prune_orphans(&self, prune: &OrphanPrune, issued: &mut usize) -> Result<(), CoreError> {
        let Some(listing) = self.query(&prune.query, issued).await? else {
            return Ok(());
        };
        let packages = OrphanPrune::parse_packages(&listing);
        info!(unneeded = packages.len(), "selected orphan packages");

        match prune.removal(&packages) {
            Some(removal) => {
                self.run_invocation(&removal, issued).await?;
            }
            None => info!("no orphan packages to remove"),
        }
        Ok(())
    }

    /// List disabled snap revisions and remove each one
    async fn prune_snap_revisions(
        &self,
        prune: &SnapPrune,
        issued: &mut usize,
    ) -> Result<(), CoreError> {
        let Some(listing) = self.query(&prune.query, issued).await? else {
            return Ok(());
        };
        let revisions = SnapPrune::parse_disabled(&listing);
        info!(disabled = revisions.len(), "selected disabled snap revisions");

        for removal in prune.removals(&revisions) {
            self.run_invocation(&removal, issued).await?;
        }
        Ok(())
    }

    /// Run the query phase of a two-phase step and return its stdout
    ///
    /// Returns `None` in dry run mode, where nothing is queried.
    async fn query(
        &self,
        query: &Invocation,
        issued: &mut usize,
    ) -> Result<Option<String>, CoreError> {
        if self.config.general.dry_run {
            info!(query = %query.command, "would query");
            return Ok(None);
        }
        Ok(self
            .run_invocation(query, issued)
            .await?
            .map(|result| result.stdout))
    }

    /// Run one invocation and classify its exit status
    ///
    /// Returns `None` in dry run mode.
    async fn run_invocation(
        &self,
        invocation: &Invocation,
        issued: &mut usize,
    ) -> Result<Option<CommandResult>, CoreError> {
        if self.config.general.dry_run {
            info!(command = %invocation, "would run");
            return Ok(None);
        }

        info!(command = %invocation.command, "running");
        let result = self.exec(&invocation.command).await?;
        *issued += 1;

        if !result.success() {
            if invocation.tolerate_nonzero_exit {
                debug!(
                    command = %invocation.command,
                    status = result.status,
                    "non-zero exit tolerated"
                );
            } else {
                return Err(CoreError::CommandExecutionFailed {
                    command: invocation.command.to_string(),
                    status: result.status,
                    stderr: result.stderr.trim().to_string(),
                });
            }
        }
        Ok(Some(result))
    }

    async fn exec(&self, command: &CommandSpec) -> Result<CommandResult, CoreError> {
        let result = match self.config.general.command_timeout() {
            Some(timeout) => self.executor.run_with_timeout(command, timeout).await,
            None => self.executor.run(command).await,
        };
        Ok(result?)
    }
}

/// Decide whether privileged commands need sudo
///
/// For `Privilege::Auto` this asks `whoami` through `executor`; when that
/// cannot be answered sudo is assumed.
pub async fn needs_sudo(privilege: Privilege, executor: &dyn CommandExecutor) -> bool {
    match privilege {
        Privilege::Sudo => true,
        Privilege::None => false,
        Privilege::Auto => {
            let whoami = executor.run(&CommandSpec::new("whoami", Vec::<String>::new())).await;
            let is_root = whoami
                .as_ref()
                .is_ok_and(|r| r.success() && r.stdout.trim() == "root");
            debug!(is_root, "resolved privilege");
            !is_root
        }
    }
}
