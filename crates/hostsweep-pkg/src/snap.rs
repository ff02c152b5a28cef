//! Disabled Snap revision removal
//!
//! snapd keeps the previous revisions of every snap around as `disabled`.
//! `snap list --all` shows them; each one is removed by revision.

use std::fmt;

use hostsweep_exec::CommandSpec;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::plan::Invocation;

/// A disabled revision of an installed snap
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SnapRevision {
    /// Snap name
    pub name: String,
    /// Revision number as printed by snap
    pub revision: String,
}

impl SnapRevision {
    /// Create a new revision
    pub fn new(name: impl Into<String>, revision: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            revision: revision.into(),
        }
    }
}

/// Deferred removal of disabled snap revisions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapPrune {
    /// Lists every installed revision
    pub query: Invocation,
}

impl Default for SnapPrune {
    fn default() -> Self {
        Self {
            query: Invocation::strict(CommandSpec::new("snap", ["list", "--all"])),
        }
    }
}

impl SnapPrune {
    /// Parse `snap list --all` output into its disabled revisions
    ///
    /// Columns are `Name Version Rev Tracking Publisher Notes`; a revision is
    /// disabled when `disabled` is among its comma separated notes.
    #[must_use]
    pub fn parse_disabled(output: &str) -> Vec<SnapRevision> {
        let mut revisions = Vec::new();

        for line in output.lines().skip_while(|l| !l.trim_start().starts_with("Name")).skip(1) {
            let columns: Vec<&str> = line.split_whitespace().collect();
            let (Some(name), Some(revision), Some(notes), 6..) =
                (columns.first(), columns.get(2), columns.last(), columns.len())
            else {
                if !line.trim().is_empty() {
                    debug!(line, "skipping malformed snap list line");
                }
                continue;
            };
            if notes.split(',').any(|note| note == "disabled") {
                revisions.push(SnapRevision::new(*name, *revision));
            }
        }

        revisions.sort();
        revisions.dedup();
        revisions
    }

    /// One removal per disabled revision, in name order
    #[must_use]
    pub fn removals(&self, revisions: &[SnapRevision]) -> Vec<Invocation> {
        revisions
            .iter()
            .map(|r| {
                Invocation::strict(CommandSpec::privileged(
                    "snap",
                    [
                        "remove".to_string(),
                        r.name.clone(),
                        format!("--revision={}", r.revision),
                    ],
                ))
            })
            .collect()
    }
}

impl fmt::Display for SnapPrune {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "snap remove <name> --revision=<rev> for each disabled revision (after: {})",
            self.query.command
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = "\
Name      Version          Rev    Tracking         Publisher   Notes
core20    20240111         2182   latest/stable    canonical✓  base,disabled
core20    20240227         2264   latest/stable    canonical✓  base
firefox   123.0-1          3836   latest/stable/…  mozilla✓    disabled
firefox   124.0.1-1        4033   latest/stable/…  mozilla✓    -
snapd     2.61.2           21184  latest/stable    canonical✓  snapd
";

    #[test]
    fn test_parse_picks_disabled_rows() {
        let revisions = SnapPrune::parse_disabled(LISTING);
        assert_eq!(
            revisions,
            vec![
                SnapRevision::new("core20", "2182"),
                SnapRevision::new("firefox", "3836"),
            ]
        );
    }

    #[test]
    fn test_parse_without_disabled_revisions() {
        let listing = "Name  Version Rev Tracking Publisher Notes\n\
                       lxd   5.21    27948 5.21/stable canonical✓ -\n";
        assert!(SnapPrune::parse_disabled(listing).is_empty());
        assert!(SnapPrune::parse_disabled("").is_empty());
    }

    #[test]
    fn test_removals_one_per_revision() {
        let prune = SnapPrune::default();
        let removals = prune.removals(&SnapPrune::parse_disabled(LISTING));

        let commands: Vec<String> = removals.iter().map(|i| i.command.to_string()).collect();
        assert_eq!(
            commands,
            vec![
                "snap remove core20 --revision=2182",
                "snap remove firefox --revision=3836",
            ]
        );
        assert!(removals.iter().all(|i| i.command.privileged && !i.tolerate_nonzero_exit));
        assert!(prune.removals(&[]).is_empty());
    }
}
