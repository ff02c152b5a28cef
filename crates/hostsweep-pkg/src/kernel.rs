//! Old kernel selection
//!
//! Kernel pruning runs in two phases. The query phase lists installed kernels
//! with their build time; the selection phase orders them oldest first and
//! keeps the newest `keep` entries. Whatever is left is removed.

use std::fmt;

use hostsweep_exec::CommandSpec;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::plan::Invocation;

/// An installed kernel package
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KernelCandidate {
    /// Build time, seconds since the epoch
    pub build_time: u64,
    /// Package identifier passed to the removal command
    pub package: String,
}

impl KernelCandidate {
    /// Create a new candidate
    pub fn new(build_time: u64, package: impl Into<String>) -> Self {
        Self {
            build_time,
            package: package.into(),
        }
    }
}

/// Pick the kernels to remove, keeping the `keep` most recent
///
/// Candidates are ordered by build time, ties broken by package name, so the
/// result does not depend on input order. At most
/// `candidates.len().saturating_sub(keep)` entries are returned, oldest first.
#[must_use]
pub fn select_for_removal(candidates: &[KernelCandidate], keep: usize) -> Vec<KernelCandidate> {
    let mut sorted = candidates.to_vec();
    sorted.sort_by(|a, b| {
        a.build_time
            .cmp(&b.build_time)
            .then_with(|| a.package.cmp(&b.package))
    });
    sorted.dedup();

    let removable = sorted.len().saturating_sub(keep);
    sorted.truncate(removable);
    sorted
}

/// Deferred kernel removal
///
/// Holds everything needed to prune kernels once the query output is known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KernelPrune {
    /// Lists installed kernels as `<build-time> <package>` lines
    pub query: Invocation,
    /// Removal command; selected packages are appended as arguments
    pub remove: CommandSpec,
    /// Number of most recent kernels to keep
    pub keep: usize,
}

impl KernelPrune {
    /// rpm query format producing `<build-time> <name>-<version>-<release>.<arch>`
    pub const RPM_QUERY_FORMAT: &'static str =
        "%{BUILDTIME} %{NAME}-%{VERSION}-%{RELEASE}.%{ARCH}\\n";

    /// Prune step for an rpm based manager
    ///
    /// `rpm -q` exits 1 when the package is not installed at all, which just
    /// means there is nothing to prune.
    #[must_use]
    pub fn rpm(package: &str, manager: &str, keep: usize) -> Self {
        Self {
            query: Invocation::tolerant(CommandSpec::new(
                "rpm",
                ["-q", package, "--queryformat", Self::RPM_QUERY_FORMAT],
            )),
            remove: CommandSpec::privileged(manager, ["remove", "-y"]),
            keep,
        }
    }

    /// Command that prints the running kernel release
    #[must_use]
    pub fn running_release_query() -> CommandSpec {
        CommandSpec::new("uname", ["-r"])
    }

    /// Parse query output into candidates
    ///
    /// Lines that do not look like `<build-time> <package>` are skipped.
    #[must_use]
    pub fn parse_candidates(output: &str) -> Vec<KernelCandidate> {
        let mut candidates = Vec::new();

        for line in output.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let mut parts = line.split_whitespace();
            let (Some(time), Some(package), None) = (parts.next(), parts.next(), parts.next())
            else {
                debug!(line, "skipping malformed kernel query line");
                continue;
            };

            match time.parse::<u64>() {
                Ok(build_time) => candidates.push(KernelCandidate::new(build_time, package)),
                Err(_) => debug!(line, "skipping kernel query line without build time"),
            }
        }

        candidates
    }

    /// Select removal targets, never including the running kernel
    ///
    /// `running_release` is the `uname -r` output; a package is the running
    /// kernel when its identifier ends in `-<release>`.
    #[must_use]
    pub fn targets(
        &self,
        candidates: &[KernelCandidate],
        running_release: Option<&str>,
    ) -> Vec<KernelCandidate> {
        let running = running_release
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(|r| format!("-{r}"));

        select_for_removal(candidates, self.keep)
            .into_iter()
            .filter(|candidate| {
                let is_running = running
                    .as_deref()
                    .is_some_and(|r| candidate.package.ends_with(r));
                if is_running {
                    debug!(package = %candidate.package, "keeping running kernel");
                }
                !is_running
            })
            .collect()
    }

    /// Removal invocation for `targets`, or `None` when there is nothing to remove
    #[must_use]
    pub fn removal(&self, targets: &[KernelCandidate]) -> Option<Invocation> {
        if targets.is_empty() {
            return None;
        }
        let command = self
            .remove
            .clone()
            .with_args(targets.iter().map(|t| t.package.clone()));
        Some(Invocation::strict(command))
    }
}

impl fmt::Display for KernelPrune {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} <kernels older than the newest {}> (after: {})",
            self.remove, self.keep, self.query.command
        )
    }
}
