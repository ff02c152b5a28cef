//! Cleanup collaborators
//!
//! Independent of the detected package manager. Each collaborator reports
//! whether it can run on this host and builds a plan from the shared params.

use std::path::PathBuf;

use hostsweep_exec::CommandSpec;
use hostsweep_pkg::{BinaryProbe, CommandPlan, Invocation, PlanParams, PlanStep, SnapPrune};

use crate::config::CleanupConfig;

/// A cleanup task that runs after the package manager operations
pub trait CleanupTask: Send + Sync {
    /// Name used in logs and the run report
    fn name(&self) -> &'static str;

    /// Check the task can run here, or say why not
    ///
    /// # Errors
    /// Returns the skip reason when a required binary or directory is missing
    fn availability(&self, probe: &dyn BinaryProbe) -> Result<(), String>;

    /// Build the plan
    fn plan(&self, params: &PlanParams) -> CommandPlan;
}

fn require(probe: &dyn BinaryProbe, binary: &str) -> Result<(), String> {
    if probe.has_binary(binary) {
        Ok(())
    } else {
        Err(format!("{binary} not installed"))
    }
}

/// `find` invocation deleting regular files not accessed for `days`
fn sweep_files(roots: &[String], days: u32, privileged: bool) -> Invocation {
    let mut command = CommandSpec::new("find", roots.iter().cloned()).with_args([
        "-mindepth".to_string(),
        "1".to_string(),
        "-type".to_string(),
        "f".to_string(),
        "-atime".to_string(),
        format!("+{days}"),
        "-delete".to_string(),
    ]);
    command.privileged = privileged;
    // Files vanish or are unreadable mid-walk, find then exits 1
    Invocation::tolerant(command)
}

/// Removes Flatpak runtimes no installed app uses
#[derive(Debug, Clone, Copy, Default)]
pub struct FlatpakCleanup;

impl CleanupTask for FlatpakCleanup {
    fn name(&self) -> &'static str {
        "flatpak"
    }

    fn availability(&self, probe: &dyn BinaryProbe) -> Result<(), String> {
        require(probe, "flatpak")
    }

    fn plan(&self, _params: &PlanParams) -> CommandPlan {
        CommandPlan::new([Invocation::strict(CommandSpec::privileged(
            "flatpak",
            ["uninstall", "--unused", "-y"],
        ))])
    }
}

/// Removes disabled snap revisions
#[derive(Debug, Clone, Copy, Default)]
pub struct SnapCleanup {
    /// Also cap the revisions snapd keeps from now on
    pub retain: Option<u32>,
}

impl CleanupTask for SnapCleanup {
    fn name(&self) -> &'static str {
        "snap"
    }

    fn availability(&self, probe: &dyn BinaryProbe) -> Result<(), String> {
        require(probe, "snap")
    }

    fn plan(&self, _params: &PlanParams) -> CommandPlan {
        let plan = CommandPlan::default().then(PlanStep::PruneSnapRevisions(SnapPrune::default()));
        match self.retain {
            Some(retain) => plan.then(PlanStep::Run(Invocation::strict(CommandSpec::privileged(
                "snap",
                [
                    "set".to_string(),
                    "system".to_string(),
                    format!("refresh.retain={retain}"),
                ],
            )))),
            None => plan,
        }
    }
}

/// Prunes stopped containers, dangling images, networks and build cache
#[derive(Debug, Clone, Copy, Default)]
pub struct DockerCleanup {
    /// Also prune unused volumes
    pub prune_volumes: bool,
}

impl CleanupTask for DockerCleanup {
    fn name(&self) -> &'static str {
        "docker"
    }

    fn availability(&self, probe: &dyn BinaryProbe) -> Result<(), String> {
        require(probe, "docker")
    }

    fn plan(&self, _params: &PlanParams) -> CommandPlan {
        let mut command = CommandSpec::privileged("docker", ["system", "prune", "-af"]);
        if self.prune_volumes {
            command = command.with_args(["--volumes"]);
        }
        CommandPlan::new([Invocation::strict(command)])
    }
}

/// Vacuums journal files older than the retention window
#[derive(Debug, Clone, Copy, Default)]
pub struct JournalCleanup;

impl CleanupTask for JournalCleanup {
    fn name(&self) -> &'static str {
        "journal"
    }

    fn availability(&self, probe: &dyn BinaryProbe) -> Result<(), String> {
        require(probe, "journalctl")
    }

    fn plan(&self, params: &PlanParams) -> CommandPlan {
        CommandPlan::new([Invocation::strict(CommandSpec::privileged(
            "journalctl",
            [format!("--vacuum-time={}", params.journal_retention)],
        ))])
    }
}

/// Deletes old files below the system temp directories
#[derive(Debug, Clone, Copy, Default)]
pub struct TempSweep;

impl TempSweep {
    /// Directories swept
    pub const ROOTS: [&'static str; 2] = ["/tmp", "/var/tmp"];
}

impl CleanupTask for TempSweep {
    fn name(&self) -> &'static str {
        "temp"
    }

    fn availability(&self, probe: &dyn BinaryProbe) -> Result<(), String> {
        require(probe, "find")
    }

    fn plan(&self, params: &PlanParams) -> CommandPlan {
        let roots: Vec<String> = Self::ROOTS.iter().map(ToString::to_string).collect();
        CommandPlan::new([sweep_files(&roots, params.temp_age_days, true)])
    }
}

/// Deletes old files in the invoking user's cache directory
#[derive(Debug, Clone, Default)]
pub struct UserCacheSweep {
    /// Cache directory, `None` if the platform has none
    pub dir: Option<PathBuf>,
}

impl UserCacheSweep {
    /// Sweep the platform cache directory of the current user
    #[must_use]
    pub fn for_current_user() -> Self {
        Self {
            dir: dirs::cache_dir(),
        }
    }
}

impl CleanupTask for UserCacheSweep {
    fn name(&self) -> &'static str {
        "user-cache"
    }

    fn availability(&self, probe: &dyn BinaryProbe) -> Result<(), String> {
        match &self.dir {
            None => Err("no user cache directory".to_string()),
            Some(dir) if !dir.is_dir() => Err(format!("{} does not exist", dir.display())),
            Some(_) => require(probe, "find"),
        }
    }

    fn plan(&self, params: &PlanParams) -> CommandPlan {
        match &self.dir {
            Some(dir) => CommandPlan::new([sweep_files(
                &[dir.display().to_string()],
                params.temp_age_days,
                false,
            )]),
            None => CommandPlan::noop("no user cache directory"),
        }
    }
}

/// Enabled collaborators in the order they run
#[must_use]
pub fn enabled_tasks(config: &CleanupConfig) -> Vec<Box<dyn CleanupTask>> {
    let mut tasks: Vec<Box<dyn CleanupTask>> = Vec::new();
    if config.flatpak {
        tasks.push(Box::new(FlatpakCleanup));
    }
    if config.snap {
        tasks.push(Box::new(SnapCleanup {
            retain: config.snap_retain,
        }));
    }
    if config.docker {
        tasks.push(Box::new(DockerCleanup {
            prune_volumes: config.docker_prune_volumes,
        }));
    }
    if config.journal {
        tasks.push(Box::new(JournalCleanup));
    }
    if config.temp {
        tasks.push(Box::new(TempSweep));
    }
    if config.user_cache {
        tasks.push(Box::new(UserCacheSweep::for_current_user()));
    }
    tasks
}
