//! Configuration types for a maintenance run

use std::time::Duration;

use hostsweep_pkg::PlanParams;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Top-level configuration for a hostsweep run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepConfig {
    /// Run-wide settings
    #[serde(default)]
    pub general: GeneralConfig,
    /// Scalars handed to plan construction
    #[serde(default)]
    pub params: PlanParams,
    /// Which cleanup collaborators run
    #[serde(default)]
    pub cleanup: CleanupConfig,
}

impl SweepConfig {
    /// Check values the tools would reject
    ///
    /// # Errors
    /// Returns `CoreError::ConfigError` describing the first invalid value
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.params.kernels_to_keep == 0 {
            return Err(CoreError::ConfigError(
                "params.kernels_to_keep must be at least 1".to_string(),
            ));
        }
        if self.params.journal_retention.trim().is_empty() {
            return Err(CoreError::ConfigError(
                "params.journal_retention must not be empty".to_string(),
            ));
        }
        if let Some(retain) = self.cleanup.snap_retain.filter(|r| !(2..=20).contains(r)) {
            return Err(CoreError::ConfigError(format!(
                "cleanup.snap_retain must be between 2 and 20, got {retain}"
            )));
        }
        if self.general.command_timeout_secs == Some(0) {
            return Err(CoreError::ConfigError(
                "general.command_timeout_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Set dry run
    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.general.dry_run = dry_run;
        self
    }

    /// Set whether failures abort the run
    #[must_use]
    pub fn with_continue_on_error(mut self, continue_on_error: bool) -> Self {
        self.general.continue_on_error = continue_on_error;
        self
    }
}

/// Run-wide settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log level (trace, debug, info, warn, error) used when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// How privileged commands are elevated
    #[serde(default)]
    pub privilege: Privilege,
    /// Keep going after a failed step instead of aborting
    #[serde(default)]
    pub continue_on_error: bool,
    /// Per-command timeout in seconds
    #[serde(default)]
    pub command_timeout_secs: Option<u64>,
    /// Log plans instead of running them
    #[serde(default)]
    pub dry_run: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            privilege: Privilege::default(),
            continue_on_error: false,
            command_timeout_secs: None,
            dry_run: false,
        }
    }
}

impl GeneralConfig {
    /// Per-command timeout, if any
    #[must_use]
    pub fn command_timeout(&self) -> Option<Duration> {
        self.command_timeout_secs.map(Duration::from_secs)
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Privilege elevation policy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Privilege {
    /// Use sudo unless already running as root
    #[default]
    Auto,
    /// Always use sudo for privileged commands
    Sudo,
    /// Never elevate
    None,
}

/// Cleanup collaborator switches
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupConfig {
    /// Remove unused Flatpak runtimes
    #[serde(default = "default_true")]
    pub flatpak: bool,
    /// Remove disabled Snap revisions
    #[serde(default = "default_true")]
    pub snap: bool,
    /// Also set how many revisions snapd keeps per snap
    #[serde(default)]
    pub snap_retain: Option<u32>,
    /// Prune unused Docker data
    #[serde(default = "default_true")]
    pub docker: bool,
    /// Also prune unused Docker volumes
    #[serde(default)]
    pub docker_prune_volumes: bool,
    /// Vacuum the systemd journal
    #[serde(default = "default_true")]
    pub journal: bool,
    /// Delete old files under /tmp and /var/tmp
    #[serde(default = "default_true")]
    pub temp: bool,
    /// Delete old files in the user cache directory
    #[serde(default = "default_true")]
    pub user_cache: bool,
}

fn default_true() -> bool {
    true
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            flatpak: true,
            snap: true,
            snap_retain: None,
            docker: true,
            docker_prune_volumes: false,
            journal: true,
            temp: true,
            user_cache: true,
        }
    }
}
