//! hostsweep-pkg: Package manager detection and dispatch
//!
//! Detects the active package manager once and maps logical maintenance
//! operations onto manager-specific command plans (apt, dnf, yum, zypper, nix).
//! Query based steps (old kernels, unneeded packages, disabled snap revisions)
//! are carried in the plan and resolved when it runs.
//! Plans are built without side effects; executing them is the caller's job.

pub mod apt;
pub mod detect;
pub mod dnf;
pub mod error;
pub mod kernel;
pub mod nix;
pub mod orphans;
pub mod plan;
pub mod snap;
pub mod traits;
pub mod types;
pub mod zypper;

pub use detect::{BinaryProbe, PathProbe, StaticProbe, detect};
pub use error::PackageError;
pub use kernel::{KernelCandidate, KernelPrune, select_for_removal};
pub use orphans::OrphanPrune;
pub use plan::{CommandPlan, Invocation, PlanStep, Resolution, plan_for, resolve};
pub use snap::{SnapPrune, SnapRevision};
pub use traits::PackageManager;
pub use types::{ManagerKind, Operation, PlanParams};
