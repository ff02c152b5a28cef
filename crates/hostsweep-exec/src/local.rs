//! Local command execution using `tokio::process`

use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, error, instrument};

use crate::command::CommandSpec;
use crate::error::ExecError;
use crate::result::CommandResult;
use crate::traits::CommandExecutor;

/// Local command executor
///
/// Executes commands on the local machine using `tokio::process::Command`.
/// Privileged commands are prefixed with `sudo -n` when sudo is enabled.
#[derive(Debug, Clone, Default)]
pub struct LocalExecutor {
    /// Whether privileged commands go through sudo
    use_sudo: bool,
}

impl LocalExecutor {
    /// Create a new local executor that never elevates
    #[must_use]
    pub fn new() -> Self {
        Self { use_sudo: false }
    }

    /// Enable or disable sudo for privileged commands
    #[must_use]
    pub fn with_sudo(mut self, use_sudo: bool) -> Self {
        self.use_sudo = use_sudo;
        self
    }

    /// Whether privileged commands are elevated
    #[must_use]
    pub fn uses_sudo(&self) -> bool {
        self.use_sudo
    }

    /// Build the process for a command, adding sudo where needed
    fn build_command(&self, cmd: &CommandSpec) -> Command {
        let mut command = if cmd.privileged && self.use_sudo {
            let mut c = Command::new("sudo");
            c.arg("-n").arg(&cmd.program);
            c
        } else {
            Command::new(&cmd.program)
        };
        command
            .args(&cmd.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        command
    }

    /// Internal method to execute command
    #[instrument(skip(self, cmd), fields(command = %cmd), level = "debug")]
    async fn execute(&self, cmd: &CommandSpec) -> Result<CommandResult, ExecError> {
        let start = Instant::now();

        debug!(privileged = cmd.privileged, sudo = self.use_sudo, "executing local command");

        let child = self
            .build_command(cmd)
            .spawn()
            .map_err(|e| ExecError::SpawnError(format!("{}: {e}", cmd.program)))?;

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| ExecError::IoError(e.to_string()))?;

        let duration = start.elapsed();

        let status = output.status.code().unwrap_or(-1);
        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        debug!(status = status, duration = ?duration, "command completed");

        Ok(CommandResult {
            status,
            stdout,
            stderr,
            duration,
        })
    }
}

#[async_trait]
impl CommandExecutor for LocalExecutor {
    async fn run(&self, cmd: &CommandSpec) -> Result<CommandResult, ExecError> {
        self.execute(cmd).await
    }

    #[instrument(skip(self, cmd), fields(command = %cmd), level = "debug")]
    async fn run_with_timeout(
        &self,
        cmd: &CommandSpec,
        timeout_duration: Duration,
    ) -> Result<CommandResult, ExecError> {
        let start = Instant::now();

        match timeout(timeout_duration, self.execute(cmd)).await {
            Ok(result) => result,
            Err(_) => {
                error!(
                    timeout = ?timeout_duration,
                    elapsed = ?start.elapsed(),
                    "command timed out"
                );
                Err(ExecError::Timeout {
                    timeout: timeout_duration,
                })
            }
        }
    }

    fn executor_type(&self) -> &'static str {
        "local"
    }
}
