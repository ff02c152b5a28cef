//! Query based orphan removal
//!
//! Managers without an autoremove command list unneeded packages first and
//! remove exactly those, or nothing when the list is empty.

use std::fmt;

use hostsweep_exec::CommandSpec;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::plan::Invocation;

/// Deferred removal of packages nothing depends on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrphanPrune {
    /// Lists unneeded packages as a zypper table
    pub query: Invocation,
    /// Removal command; package names are appended as arguments
    pub remove: CommandSpec,
}

impl OrphanPrune {
    /// Orphan removal for zypper
    #[must_use]
    pub fn zypper() -> Self {
        Self {
            query: Invocation::strict(CommandSpec::privileged(
                "zypper",
                ["--non-interactive", "packages", "--unneeded"],
            )),
            remove: CommandSpec::privileged(
                "zypper",
                ["--non-interactive", "remove", "--clean-deps"],
            ),
        }
    }

    /// Parse the `Name` column of a zypper package table
    ///
    /// Rows before the header (repository loading messages) and the
    /// separator line are ignored. Names are returned sorted and unique.
    #[must_use]
    pub fn parse_packages(output: &str) -> Vec<String> {
        let mut lines = output.lines();
        let Some(name_column) = lines.by_ref().find_map(|line| {
            line.split('|').position(|cell| cell.trim() == "Name")
        }) else {
            debug!("no package table in zypper output");
            return Vec::new();
        };

        let mut packages: Vec<String> = lines
            .filter(|line| line.contains('|') && !line.starts_with("--"))
            .filter_map(|line| line.split('|').nth(name_column))
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(ToString::to_string)
            .collect();

        packages.sort();
        packages.dedup();
        packages
    }

    /// Removal invocation for `packages`, or `None` when there is nothing to remove
    #[must_use]
    pub fn removal(&self, packages: &[String]) -> Option<Invocation> {
        if packages.is_empty() {
            return None;
        }
        let command = self.remove.clone().with_args(packages.iter().cloned());
        Some(Invocation::strict(command))
    }
}

impl fmt::Display for OrphanPrune {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} <unneeded packages> (after: {})",
            self.remove, self.query.command
        )
    }
}
