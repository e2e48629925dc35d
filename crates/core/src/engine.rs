//! Run orchestration.
//!
//! A [`Ghostbuster`] run goes through these steps:
//!
//! 1. Collect and parse every header in the source tree.
//! 2. Union the contributor logins across all headers.
//! 3. Check the whole union for ghosts once.
//! 4. Stop without writing if there are none, otherwise patch every header.
//!
//! Patch failures are fatal: the first one aborts the run. Files patched
//! before the failure stay patched.

use std::path::PathBuf;

use serde::Serialize;
use tracing::{info, warn};

use crate::collector::{all_contributor_usernames, collect_all, SourceTree};
use crate::errors::CoreError;
use crate::github::{GhostChecker, IdentityLookup};
use crate::patcher::{PatchOutcome, Patcher};

/// Statistics from a single run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub files_scanned: usize,
    pub usernames_checked: usize,
    pub ghosts: Vec<String>,
    /// Files rewritten, or that would be rewritten in a dry run.
    pub patched: Vec<PathBuf>,
    pub dry_run: bool,
}

/// Sequences collection, ghost detection and patching.
pub struct Ghostbuster<L> {
    checker: GhostChecker<L>,
    patcher: Patcher,
    dry_run: bool,
}

impl<L: IdentityLookup> Ghostbuster<L> {
    pub fn new(checker: GhostChecker<L>, patcher: Patcher) -> Self {
        Self {
            checker,
            patcher,
            dry_run: false,
        }
    }

    /// Compute patches without writing them.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    #[cfg(test)]
    pub(crate) fn checker(&self) -> &GhostChecker<L> {
        &self.checker
    }

    pub async fn run(&self, tree: &dyn SourceTree) -> Result<RunSummary, CoreError> {
        let headers = collect_all(tree)?;
        let usernames = all_contributor_usernames(&headers);
        let mut summary = RunSummary {
            files_scanned: headers.len(),
            usernames_checked: usernames.len(),
            dry_run: self.dry_run,
            ..RunSummary::default()
        };

        let ghosts = self.checker.find_ghosts(&usernames).await?;
        if ghosts.is_empty() {
            info!("no ghosts found");
            return Ok(summary);
        }
        summary.ghosts = ghosts.iter().map(str::to_string).collect();
        info!(ghosts = ghosts.len(), "found deleted accounts");

        for (path, header) in &headers {
            if self.dry_run {
                if let Some(_patched) = self.patcher.patch_text(header, &ghosts)? {
                    info!(path = %path.display(), "would patch (dry run)");
                    summary.patched.push(path.clone());
                }
                continue;
            }
            match self.patcher.patch(tree, path, header, &ghosts)? {
                PatchOutcome::Patched { removed } => {
                    info!(path = %path.display(), removed = ?removed, "patched");
                    summary.patched.push(path.clone());
                }
                PatchOutcome::Unchanged => {
                    warn!(path = %path.display(), "ghosts found but header text unchanged");
                }
                PatchOutcome::Clean => {}
            }
        }

        info!(
            patched = summary.patched.len(),
            dry_run = self.dry_run,
            "run complete"
        );
        Ok(summary)
    }
}
