//! Error types for hostsweep-pkg

use thiserror::Error;

use crate::types::{ManagerKind, Operation};

/// Errors that can occur while resolving package manager plans
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PackageError {
    /// Detection found no supported package manager
    #[error("no supported package manager found (tried apt-get, dnf, yum, zypper, nix-env)")]
    NoSupportedManager,

    /// The manager has no mapping for the requested operation
    #[error("operation {operation} is not supported by {kind}")]
    UnsupportedOperation {
        /// Manager the plan was requested for
        kind: ManagerKind,
        /// Requested operation
        operation: Operation,
    },

    /// Manager name could not be parsed
    #[error("unknown package manager: {0}")]
    UnknownManager(String),

    /// Operation name could not be parsed
    #[error("unknown operation: {0}")]
    UnknownOperation(String),
}

impl PackageError {
    /// Check if error must stop the whole run
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            PackageError::NoSupportedManager | PackageError::UnsupportedOperation { .. }
        )
    }
}
