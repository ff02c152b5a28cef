use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use hostsweep_core::*;
use hostsweep_exec::{CommandExecutor, CommandResult, CommandSpec, ExecError};
use hostsweep_pkg::{ManagerKind, PackageError, StaticProbe};

// Mock implementations
#[derive(Default)]
struct ScriptedExecutor {
    /// (command prefix, outcome) pairs, first match wins
    script: Vec<(String, Result<(i32, String), ExecError>)>,
    calls: Mutex<Vec<String>>,
    timeouts: Mutex<Vec<Duration>>,
}

impl ScriptedExecutor {
    fn respond(mut self, prefix: &str, status: i32, stdout: &str) -> Self {
        self.script
            .push((prefix.to_string(), Ok((status, stdout.to_string()))));
        self
    }

    fn fail(mut self, prefix: &str, error: ExecError) -> Self {
        self.script.push((prefix.to_string(), Err(error)));
        self
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandExecutor for ScriptedExecutor {
    async fn run(&self, cmd: &CommandSpec) -> Result<CommandResult, ExecError> {
        let line = cmd.to_string();
        self.calls.lock().unwrap().push(line.clone());

        let outcome = self
            .script
            .iter()
            .find(|(prefix, _)| line.starts_with(prefix.as_str()))
            .map_or_else(|| Ok((0, String::new())), |(_, outcome)| outcome.clone());

        outcome.map(|(status, stdout)| CommandResult {
            status,
            stdout,
            stderr: if status == 0 {
                String::new()
            } else {
                format!("{} exited {status}", cmd.program)
            },
            duration: Duration::from_millis(1),
        })
    }

    async fn run_with_timeout(
        &self,
        cmd: &CommandSpec,
        timeout: Duration,
    ) -> Result<CommandResult, ExecError> {
        self.timeouts.lock().unwrap().push(timeout);
        self.run(cmd).await
    }

    fn executor_type(&self) -> &'static str {
        "mock"
    }
}

const KERNELS: &str = "\
1700000000 kernel-core-6.5.6-300.fc39.x86_64
1701000000 kernel-core-6.6.2-201.fc39.x86_64
1702000000 kernel-core-6.6.8-200.fc39.x86_64
1703000000 kernel-core-6.7.4-200.fc39.x86_64
";

fn config() -> SweepConfig {
    let mut config = SweepConfig::default();
    config.cleanup.user_cache = false;
    config
}

fn pipeline(executor: Arc<ScriptedExecutor>, binaries: &[&str], config: SweepConfig) -> Pipeline {
    Pipeline::new(
        executor,
        Arc::new(StaticProbe::new(binaries.iter().copied())),
        config,
    )
}

#[tokio::test]
async fn test_dnf_host_runs_pipeline_in_order() {
    let executor = Arc::new(
        ScriptedExecutor::default()
            .respond("dnf check-update", 100, "vim.x86_64 2:9.1 updates\n")
            .respond("rpm -q kernel-core", 0, KERNELS)
            .respond("uname -r", 0, "6.5.6-300.fc39.x86_64\n"),
    );
    let pipeline = pipeline(executor.clone(), &["dnf", "yum", "journalctl", "find"], config());

    let report = pipeline.run().await.unwrap();

    assert_eq!(report.manager, ManagerKind::Dnf);
    assert!(!report.has_failures(), "{report}");
    assert!(!report.aborted);

    let calls = executor.calls();
    assert_eq!(calls[0], "dnf check-update");
    assert_eq!(calls[1], "dnf upgrade -y");
    assert_eq!(calls[2], "dnf autoremove -y");
    assert_eq!(calls[3], "dnf clean all");
    assert!(calls[4].starts_with("rpm -q kernel-core --queryformat"));
    assert_eq!(calls[5], "uname -r");
    // Keep the two newest; the oldest is running and stays too
    assert_eq!(calls[6], "dnf remove -y kernel-core-6.6.2-201.fc39.x86_64");
    assert_eq!(calls[7], "journalctl --vacuum-time=7d");
    assert!(calls[8].starts_with("find /tmp /var/tmp"));
    assert_eq!(calls.len(), 9);

    let names: Vec<_> = report.steps.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "update-repos",
            "upgrade-packages",
            "remove-orphans",
            "clean-cache",
            "remove-old-kernels",
            "flatpak",
            "snap",
            "docker",
            "journal",
            "temp",
        ]
    );
    assert!(matches!(report.steps[5].status, StepStatus::Skipped(_)));
    assert_eq!(report.steps[4].commands_issued, 3);
}

fn only_cleanup(enable: impl FnOnce(&mut CleanupConfig)) -> SweepConfig {
    let mut config = config();
    config.cleanup = CleanupConfig {
        flatpak: false,
        snap: false,
        docker: false,
        journal: false,
        temp: false,
        user_cache: false,
        ..CleanupConfig::default()
    };
    enable(&mut config.cleanup);
    config
}

const SNAP_LIST: &str = "\
Name      Version          Rev    Tracking         Publisher   Notes
core20    20240111         2182   latest/stable    canonical✓  base,disabled
core20    20240227         2264   latest/stable    canonical✓  base
firefox   123.0-1          3836   latest/stable/…  mozilla✓    disabled
firefox   124.0.1-1        4033   latest/stable/…  mozilla✓    -
";

#[tokio::test]
async fn test_snap_cleanup_removes_disabled_revisions() {
    let executor = Arc::new(ScriptedExecutor::default().respond("snap list --all", 0, SNAP_LIST));
    let config = only_cleanup(|c| c.snap = true);
    let pipeline = pipeline(executor.clone(), &["apt-get", "snap"], config);

    let report = pipeline.run().await.unwrap();

    assert!(!report.has_failures(), "{report}");
    let calls = executor.calls();
    let snap_calls: Vec<_> = calls.iter().filter(|c| c.starts_with("snap")).collect();
    assert_eq!(
        snap_calls,
        vec![
            "snap list --all",
            "snap remove core20 --revision=2182",
            "snap remove firefox --revision=3836",
        ]
    );
    let snap = report.steps.iter().find(|s| s.name == "snap").unwrap();
    assert_eq!(snap.status, StepStatus::Completed);
    assert_eq!(snap.commands_issued, 3);
}

#[tokio::test]
async fn test_snap_cleanup_without_disabled_revisions_succeeds() {
    let listing = "Name  Version  Rev  Tracking  Publisher  Notes\n\
                   lxd   5.21     27948  5.21/stable  canonical✓  -\n";
    let executor = Arc::new(ScriptedExecutor::default().respond("snap list --all", 0, listing));
    let config = only_cleanup(|c| {
        c.snap = true;
        c.snap_retain = Some(3);
    });
    let pipeline = pipeline(executor.clone(), &["apt-get", "snap"], config);

    let report = pipeline.run().await.unwrap();

    assert!(!report.has_failures());
    let calls = executor.calls();
    assert!(!calls.iter().any(|c| c.starts_with("snap remove")));
    assert_eq!(calls.last().unwrap(), "snap set system refresh.retain=3");
}

const ZYPPER_UNNEEDED: &str = "\
Loading repository data...
Reading installed packages...
S  | Repository | Name            | Version      | Arch
---+------------+-----------------+--------------+-------
i  | @System    | libqt5-qtbase   | 5.15.12-1.1  | x86_64
i  | @System    | python311-six   | 1.16.0-2.3   | noarch
";

#[tokio::test]
async fn test_zypper_removes_unneeded_packages() {
    let executor = Arc::new(
        ScriptedExecutor::default().respond(
            "zypper --non-interactive packages --unneeded",
            0,
            ZYPPER_UNNEEDED,
        ),
    );
    let pipeline = pipeline(executor.clone(), &["zypper"], only_cleanup(|_| {}));

    let report = pipeline.run().await.unwrap();

    assert!(!report.has_failures(), "{report}");
    assert_eq!(
        executor.calls(),
        vec![
            "zypper --non-interactive refresh",
            "zypper --non-interactive update",
            "zypper --non-interactive packages --unneeded",
            "zypper --non-interactive remove --clean-deps libqt5-qtbase python311-six",
            "zypper --non-interactive purge-kernels",
            "zypper --non-interactive clean --all",
        ]
    );
    let orphans = report.steps.iter().find(|s| s.name == "remove-orphans").unwrap();
    assert_eq!(orphans.commands_issued, 3);
}

#[tokio::test]
async fn test_zypper_without_unneeded_packages_skips_removal() {
    let executor = Arc::new(ScriptedExecutor::default().respond(
        "zypper --non-interactive packages --unneeded",
        0,
        "Loading repository data...\nReading installed packages...\nNo packages found.\n",
    ));
    let pipeline = pipeline(executor.clone(), &["zypper"], only_cleanup(|_| {}));

    let report = pipeline.run().await.unwrap();

    assert!(!report.has_failures());
    assert!(!executor.calls().iter().any(|c| c.contains("remove --clean-deps")));
}

#[tokio::test]
async fn test_no_old_kernels_issues_no_removal() {
    let executor = Arc::new(
        ScriptedExecutor::default()
            .respond("rpm -q kernel-core", 1, "package kernel-core is not installed\n"),
    );
    let mut config = config();
    config.cleanup = CleanupConfig {
        flatpak: false,
        snap: false,
        docker: false,
        journal: false,
        temp: false,
        user_cache: false,
        ..CleanupConfig::default()
    };
    let pipeline = pipeline(executor.clone(), &["dnf"], config);

    let report = pipeline.run().await.unwrap();

    assert!(!report.has_failures());
    assert!(!executor.calls().iter().any(|c| c.starts_with("dnf remove")));
}

#[tokio::test]
async fn test_failed_upgrade_aborts_remaining_steps() {
    let executor = Arc::new(ScriptedExecutor::default().respond("apt-get upgrade", 100, ""));
    let pipeline = pipeline(executor.clone(), &["apt-get", "docker", "find"], config());

    let report = pipeline.run().await.unwrap();

    assert!(report.aborted);
    assert!(report.has_failures());
    assert_eq!(report.steps.len(), 2);
    assert!(matches!(
        &report.steps[1].status,
        StepStatus::Failed(msg) if msg.contains("apt-get upgrade -y") && msg.contains("100")
    ));
    assert_eq!(executor.calls(), vec!["apt-get update", "apt-get upgrade -y"]);
}

#[tokio::test]
async fn test_continue_on_error_runs_everything() {
    let executor = Arc::new(ScriptedExecutor::default().respond("apt-get upgrade", 1, ""));
    let pipeline = pipeline(
        executor.clone(),
        &["apt-get", "docker"],
        config().with_continue_on_error(true),
    );

    let report = pipeline.run().await.unwrap();

    assert!(!report.aborted);
    assert!(report.has_failures());
    let calls = executor.calls();
    assert!(calls.contains(&"apt-get autoremove --purge -y".to_string()));
    assert!(calls.contains(&"docker system prune -af".to_string()));
    // APT folds kernel removal into autoremove
    let kernels = report
        .steps
        .iter()
        .find(|s| s.name == "remove-old-kernels")
        .unwrap();
    assert_eq!(kernels.status, StepStatus::Completed);
    assert!(kernels.note.is_some());
}

#[tokio::test]
async fn test_exec_error_is_a_step_failure() {
    let executor = Arc::new(ScriptedExecutor::default().fail(
        "docker",
        ExecError::SpawnError("docker: permission denied".to_string()),
    ));
    let pipeline = pipeline(executor.clone(), &["zypper", "docker", "snap"], config());

    let report = pipeline.run().await.unwrap();

    assert!(report.aborted);
    let last = report.steps.last().unwrap();
    assert_eq!(last.name, "docker");
    assert!(matches!(&last.status, StepStatus::Failed(msg) if msg.contains("permission denied")));
}

#[tokio::test]
async fn test_dry_run_issues_nothing() {
    let executor = Arc::new(ScriptedExecutor::default());
    let pipeline = pipeline(
        executor.clone(),
        &["dnf", "flatpak", "journalctl", "find"],
        config().with_dry_run(true),
    );

    let report = pipeline.run().await.unwrap();

    assert!(executor.calls().is_empty());
    assert!(report.dry_run);
    assert_eq!(report.commands_issued(), 0);
    assert!(report.steps.iter().all(|s| matches!(
        s.status,
        StepStatus::Planned | StepStatus::Skipped(_)
    )));
}

#[tokio::test]
async fn test_unknown_manager_fails_before_any_command() {
    let executor = Arc::new(ScriptedExecutor::default());
    let pipeline = pipeline(executor.clone(), &["docker", "flatpak"], config());

    let err = pipeline.run().await.unwrap_err();

    assert!(matches!(
        err,
        CoreError::Package(PackageError::NoSupportedManager)
    ));
    assert!(err.is_fatal());
    assert!(executor.calls().is_empty());
}

#[tokio::test]
async fn test_command_timeout_is_applied() {
    let executor = Arc::new(ScriptedExecutor::default());
    let mut config = config();
    config.general.command_timeout_secs = Some(30);
    config.cleanup = CleanupConfig {
        flatpak: false,
        snap: false,
        docker: false,
        journal: false,
        temp: false,
        user_cache: false,
        ..CleanupConfig::default()
    };
    let pipeline = pipeline(executor.clone(), &["nix-env"], config);

    let report = pipeline.run().await.unwrap();

    assert!(!report.has_failures());
    let timeouts = executor.timeouts.lock().unwrap().clone();
    assert_eq!(timeouts.len(), executor.calls().len());
    assert!(timeouts.iter().all(|t| *t == Duration::from_secs(30)));
}

#[tokio::test]
async fn test_needs_sudo() {
    let root = ScriptedExecutor::default().respond("whoami", 0, "root\n");
    let user = ScriptedExecutor::default().respond("whoami", 0, "alice\n");
    let broken = ScriptedExecutor::default().fail("whoami", ExecError::IoError("gone".to_string()));

    assert!(!needs_sudo(Privilege::Auto, &root).await);
    assert!(needs_sudo(Privilege::Auto, &user).await);
    assert!(needs_sudo(Privilege::Auto, &broken).await);
    assert!(needs_sudo(Privilege::Sudo, &root).await);
    assert!(!needs_sudo(Privilege::None, &user).await);
}
