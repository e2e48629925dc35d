//! Two-pass ghost detection over a set of logins.

use std::collections::{BTreeSet, HashSet};

use tracing::{debug, info};

use super::{IdentityLookup, LoginKind};
use crate::errors::GitHubError;
use crate::header::GhostSet;

/// Upper bound on logins per GraphQL query.
pub const DEFAULT_BATCH_SIZE: usize = 2000;

/// Finds logins that belong to neither a user nor an organization.
pub struct GhostChecker<L> {
    lookup: L,
    batch_size: usize,
}

impl<L: IdentityLookup> GhostChecker<L> {
    /// `batch_size` is clamped to at least 1.
    pub fn new(lookup: L, batch_size: usize) -> Self {
        Self {
            lookup,
            batch_size: batch_size.max(1),
        }
    }

    #[cfg(test)]
    pub(crate) fn lookup(&self) -> &L {
        &self.lookup
    }

    /// Return the subset of `usernames` with no live account.
    ///
    /// All user batches finish before the organization pass starts, since
    /// the second pass runs over every candidate from the first.
    pub async fn find_ghosts<I, S>(&self, usernames: I) -> Result<GhostSet, GitHubError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let logins: Vec<String> = usernames
            .into_iter()
            .map(|u| u.as_ref().to_lowercase())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        if logins.is_empty() {
            return Ok(GhostSet::new());
        }

        info!(
            logins = logins.len(),
            batch_size = self.batch_size,
            "checking for deleted accounts"
        );
        let candidates = self.missing(LoginKind::User, &logins).await?;
        if candidates.is_empty() {
            return Ok(GhostSet::new());
        }

        info!(
            candidates = candidates.len(),
            "filtering out organizations"
        );
        let ghosts = self.missing(LoginKind::Organization, &candidates).await?;
        Ok(ghosts.iter().collect())
    }

    /// Logins from `logins` that do not resolve to `kind`, in input order.
    async fn missing(
        &self,
        kind: LoginKind,
        logins: &[String],
    ) -> Result<Vec<String>, GitHubError> {
        let mut missing = Vec::new();
        for (page, batch) in logins.chunks(self.batch_size).enumerate() {
            let existing: HashSet<String> = self.lookup.existing_logins(kind, batch).await?;
            let before = missing.len();
            missing.extend(
                batch
                    .iter()
                    .filter(|login| !existing.contains(login.as_str()))
                    .cloned(),
            );
            debug!(
                %kind,
                page,
                batch = batch.len(),
                missing = missing.len() - before,
                "batch checked"
            );
        }
        Ok(missing)
    }
}
