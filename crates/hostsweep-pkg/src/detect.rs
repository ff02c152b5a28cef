//! Package manager detection

use std::collections::BTreeSet;

use tracing::{debug, info};

use crate::types::ManagerKind;

/// Answers whether an executable is available
pub trait BinaryProbe: Send + Sync {
    /// Check if `name` resolves to an executable
    fn has_binary(&self, name: &str) -> bool;
}

/// Probe that resolves binaries on `$PATH`
#[derive(Debug, Clone, Copy, Default)]
pub struct PathProbe;

impl BinaryProbe for PathProbe {
    fn has_binary(&self, name: &str) -> bool {
        which::which(name).is_ok()
    }
}

/// Probe backed by a fixed set of binary names
///
/// Used for plan previews of a manager that is not installed and in tests.
#[derive(Debug, Clone, Default)]
pub struct StaticProbe {
    binaries: BTreeSet<String>,
}

impl StaticProbe {
    /// Create a probe reporting exactly `binaries` as present
    pub fn new<I, S>(binaries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            binaries: binaries.into_iter().map(Into::into).collect(),
        }
    }
}

impl BinaryProbe for StaticProbe {
    fn has_binary(&self, name: &str) -> bool {
        self.binaries.contains(name)
    }
}

/// Detect the active package manager
///
/// Managers are probed in [`ManagerKind::PRIORITY`] order and the first one
/// whose primary binary is present wins. Hosts that carry both `dnf` and the
/// `yum` compatibility shim resolve to DNF. Returns [`ManagerKind::Unknown`]
/// when nothing matches.
pub fn detect(probe: &dyn BinaryProbe) -> ManagerKind {
    for kind in ManagerKind::PRIORITY {
        let Some(binary) = kind.primary_binary() else {
            continue;
        };
        if !probe.has_binary(binary) {
            debug!(binary, "package manager binary not found");
            continue;
        }
        let kind = if kind == ManagerKind::Yum && probe.has_binary("dnf") {
            ManagerKind::Dnf
        } else {
            kind
        };
        info!(manager = %kind, binary, "detected package manager");
        return kind;
    }

    info!("no supported package manager detected");
    ManagerKind::Unknown
}
