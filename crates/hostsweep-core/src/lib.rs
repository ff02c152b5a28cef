//! hostsweep-core: Maintenance pipeline
//!
//! Runs the package manager operations resolved by `hostsweep-pkg` one after
//! another, followed by the cleanup collaborators (Flatpak, Snap, Docker,
//! journal, temp and user cache sweeps), and reports what happened.

pub mod cleanup;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod report;

pub use cleanup::{CleanupTask, enabled_tasks};
pub use config::{CleanupConfig, GeneralConfig, Privilege, SweepConfig};
pub use error::CoreError;
pub use pipeline::{Pipeline, needs_sudo};
pub use report::{RunReport, StepReport, StepStatus};
