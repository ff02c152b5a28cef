//! Type definitions for package manager resolution

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PackageError;

/// Package manager type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManagerKind {
    /// APT (Debian/Ubuntu)
    Apt,
    /// DNF (Fedora/RHEL 8+)
    Dnf,
    /// YUM (CentOS 7/RHEL 7)
    Yum,
    /// Zypper (openSUSE/SLES)
    Zypper,
    /// Nix (NixOS)
    Nix,
    /// No supported manager was found
    Unknown,
}

impl ManagerKind {
    /// Detection order, highest priority first
    pub const PRIORITY: [ManagerKind; 5] = [
        ManagerKind::Apt,
        ManagerKind::Dnf,
        ManagerKind::Yum,
        ManagerKind::Zypper,
        ManagerKind::Nix,
    ];

    /// Executable whose presence on `$PATH` identifies the manager
    #[must_use]
    pub fn primary_binary(self) -> Option<&'static str> {
        match self {
            ManagerKind::Apt => Some("apt-get"),
            ManagerKind::Dnf => Some("dnf"),
            ManagerKind::Yum => Some("yum"),
            ManagerKind::Zypper => Some("zypper"),
            ManagerKind::Nix => Some("nix-env"),
            ManagerKind::Unknown => None,
        }
    }

    /// Whether a real manager was detected
    #[must_use]
    pub fn is_supported(self) -> bool {
        self != ManagerKind::Unknown
    }
}

impl fmt::Display for ManagerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ManagerKind::Apt => write!(f, "apt"),
            ManagerKind::Dnf => write!(f, "dnf"),
            ManagerKind::Yum => write!(f, "yum"),
            ManagerKind::Zypper => write!(f, "zypper"),
            ManagerKind::Nix => write!(f, "nix"),
            ManagerKind::Unknown => write!(f, "unknown"),
        }
    }
}

impl FromStr for ManagerKind {
    type Err = PackageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "apt" | "apt-get" => Ok(ManagerKind::Apt),
            "dnf" => Ok(ManagerKind::Dnf),
            "yum" => Ok(ManagerKind::Yum),
            "zypper" => Ok(ManagerKind::Zypper),
            "nix" | "nix-env" => Ok(ManagerKind::Nix),
            "unknown" => Ok(ManagerKind::Unknown),
            other => Err(PackageError::UnknownManager(other.to_string())),
        }
    }
}

/// Logical maintenance operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Operation {
    /// Refresh repository metadata
    UpdateRepos,
    /// Upgrade all installed packages
    UpgradePackages,
    /// Remove packages nothing depends on anymore
    RemoveOrphans,
    /// Drop downloaded package archives
    CleanCache,
    /// Remove kernels beyond the retained generations
    RemoveOldKernels,
}

impl Operation {
    /// Operations in the order the pipeline runs them
    pub const PIPELINE: [Operation; 5] = [
        Operation::UpdateRepos,
        Operation::UpgradePackages,
        Operation::RemoveOrphans,
        Operation::CleanCache,
        Operation::RemoveOldKernels,
    ];
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::UpdateRepos => write!(f, "update-repos"),
            Operation::UpgradePackages => write!(f, "upgrade-packages"),
            Operation::RemoveOrphans => write!(f, "remove-orphans"),
            Operation::CleanCache => write!(f, "clean-cache"),
            Operation::RemoveOldKernels => write!(f, "remove-old-kernels"),
        }
    }
}

impl FromStr for Operation {
    type Err = PackageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operation::PIPELINE
            .into_iter()
            .find(|op| op.to_string() == s.trim())
            .ok_or_else(|| PackageError::UnknownOperation(s.to_string()))
    }
}

/// Scalars some plans need
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanParams {
    /// Number of most recent kernels (or system generations) to keep
    #[serde(default = "default_kernels_to_keep")]
    pub kernels_to_keep: usize,
    /// Journal retention window, in journalctl time syntax
    #[serde(default = "default_journal_retention")]
    pub journal_retention: String,
    /// Age in days after which temp and cache files are deleted
    #[serde(default = "default_temp_age_days")]
    pub temp_age_days: u32,
}

fn default_kernels_to_keep() -> usize {
    2
}

fn default_journal_retention() -> String {
    "7d".to_string()
}

fn default_temp_age_days() -> u32 {
    10
}

impl Default for PlanParams {
    fn default() -> Self {
        Self {
            kernels_to_keep: default_kernels_to_keep(),
            journal_retention: default_journal_retention(),
            temp_age_days: default_temp_age_days(),
        }
    }
}

impl PlanParams {
    /// Set the number of kernels to keep
    #[must_use]
    pub fn with_kernels_to_keep(mut self, keep: usize) -> Self {
        self.kernels_to_keep = keep;
        self
    }

    /// Set the journal retention window
    #[must_use]
    pub fn with_journal_retention(mut self, retention: impl Into<String>) -> Self {
        self.journal_retention = retention.into();
        self
    }

    /// Set the temp file age threshold
    #[must_use]
    pub fn with_temp_age_days(mut self, days: u32) -> Self {
        self.temp_age_days = days;
        self
    }
}
