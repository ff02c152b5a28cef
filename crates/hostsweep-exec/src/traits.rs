//! Command executor trait

use std::time::Duration;

use async_trait::async_trait;

use crate::command::CommandSpec;
use crate::error::ExecError;
use crate::result::CommandResult;

/// Runs one external command to completion
///
/// A non-zero exit status is not an error at this layer; callers inspect
/// [`CommandResult::status`] and decide.
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Run a command and wait for it to exit
    async fn run(&self, cmd: &CommandSpec) -> Result<CommandResult, ExecError>;

    /// Run a command, giving up once `timeout` has elapsed
    async fn run_with_timeout(
        &self,
        cmd: &CommandSpec,
        timeout: Duration,
    ) -> Result<CommandResult, ExecError>;

    /// Short name of the executor, used in logs
    fn executor_type(&self) -> &'static str;
}
