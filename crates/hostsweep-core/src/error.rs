//! Core error types for hostsweep-core

use hostsweep_exec::ExecError;
use hostsweep_pkg::PackageError;
use thiserror::Error;

/// Errors that can occur while running the maintenance pipeline
#[derive(Error, Debug, Clone)]
pub enum CoreError {
    /// Detection or plan resolution failed
    #[error(transparent)]
    Package(#[from] PackageError),

    /// Command could not be run at all (spawn failure, timeout)
    #[error("execution error: {0}")]
    Exec(#[from] ExecError),

    /// Command exited non-zero and was not marked tolerable
    #[error("command `{command}` failed with status {status}: {stderr}")]
    CommandExecutionFailed {
        /// Command line that was issued
        command: String,
        /// Exit status
        status: i32,
        /// Trimmed stderr output
        stderr: String,
    },

    /// Configuration error
    #[error("configuration error: {0}")]
    ConfigError(String),
}

impl CoreError {
    /// Check if error must stop the whole run regardless of policy
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        match self {
            CoreError::Package(e) => e.is_fatal(),
            CoreError::ConfigError(_) => true,
            CoreError::Exec(_) | CoreError::CommandExecutionFailed { .. } => false,
        }
    }
}
