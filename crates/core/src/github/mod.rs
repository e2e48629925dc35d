//! GitHub account existence checks.

pub mod checker;
pub mod graphql;

use std::collections::HashSet;

use async_trait::async_trait;

use crate::errors::GitHubError;

pub use checker::GhostChecker;
pub use graphql::GraphQlClient;

/// Which kind of account a batch of logins is checked against.
///
/// Users and organizations share one login namespace, so a login that is
/// not a user may still be a live organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoginKind {
    User,
    Organization,
}

impl LoginKind {
    /// The GraphQL root field queried for this kind.
    pub fn field(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Organization => "organization",
        }
    }

    /// Prefix for per-login query aliases (`u0`, `o0`, ...).
    pub fn alias_prefix(self) -> char {
        match self {
            Self::User => 'u',
            Self::Organization => 'o',
        }
    }
}

impl std::fmt::Display for LoginKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.field())
    }
}

/// A service that can tell which logins in a batch resolve to an account.
#[async_trait]
pub trait IdentityLookup: Send + Sync {
    /// Return the lower-cased subset of `logins` that exist as `kind`.
    ///
    /// One call is one round trip; callers bound `logins.len()`.
    async fn existing_logins(
        &self,
        kind: LoginKind,
        logins: &[String],
    ) -> Result<HashSet<String>, GitHubError>;
}
