//! Contributor header model.
//!
//! A [`Header`] is the comment block at the top of a declaration file that
//! names the package and attributes it to its contributors. Headers are
//! produced by [`parse_header`] and are immutable afterwards.

pub mod parser;

use std::collections::BTreeSet;

pub use parser::parse_header;

/// A single attributed contributor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contributor {
    /// Display name as written in the header.
    pub name: String,
    /// Profile URL, if one was given.
    pub url: Option<String>,
    /// GitHub login derived from a `https://github.com/<login>` URL.
    pub github_username: Option<String>,
}

impl Contributor {
    /// `true` if this contributor's login is in `ghosts`.
    ///
    /// Contributors without a login are never ghosts.
    pub fn is_ghost(&self, ghosts: &GhostSet) -> bool {
        self.github_username
            .as_deref()
            .is_some_and(|login| ghosts.contains(login))
    }
}

/// A parsed contributor header together with the text it was parsed from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub library_name: String,
    pub library_version: Option<String>,
    pub projects: Vec<String>,
    /// Contributors in attribution order.
    pub contributors: Vec<Contributor>,
    pub typescript_version: Option<String>,
    /// The complete original file text.
    pub raw: String,
}

impl Header {
    pub fn has_ghost(&self, ghosts: &GhostSet) -> bool {
        self.contributors.iter().any(|c| c.is_ghost(ghosts))
    }

    /// Lower-cased logins of every contributor that has one.
    pub fn usernames(&self) -> impl Iterator<Item = String> + '_ {
        self.contributors
            .iter()
            .filter_map(|c| c.github_username.as_deref())
            .map(str::to_lowercase)
    }
}

/// Logins confirmed to belong to neither a user nor an organization.
///
/// All entries are stored lower-cased, and lookups ignore case.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GhostSet(BTreeSet<String>);

impl GhostSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, login: &str) -> bool {
        self.0.insert(login.to_lowercase())
    }

    pub fn contains(&self, login: &str) -> bool {
        self.0.contains(&login.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: AsRef<str>> FromIterator<S> for GhostSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = GhostSet::new();
        for login in iter {
            set.insert(login.as_ref());
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contributor(name: &str, login: Option<&str>) -> Contributor {
        Contributor {
            name: name.into(),
            url: login.map(|l| format!("https://github.com/{}", l)),
            github_username: login.map(str::to_string),
        }
    }

    #[test]
    fn test_ghost_set_ignores_case() {
        let ghosts: GhostSet = ["GhostUser"].into_iter().collect();
        assert!(ghosts.contains("ghostuser"));
        assert!(ghosts.contains("GHOSTUSER"));
        assert_eq!(ghosts.iter().collect::<Vec<_>>(), vec!["ghostuser"]);
    }

    #[test]
    fn test_contributor_without_login_is_never_ghost() {
        let ghosts: GhostSet = ["alice"].into_iter().collect();
        assert!(!contributor("alice", None).is_ghost(&ghosts));
        assert!(contributor("Alice", Some("ALICE")).is_ghost(&ghosts));
    }

    #[test]
    fn test_usernames_are_lowercased_and_defined_only() {
        let header = Header {
            library_name: "foo".into(),
            library_version: None,
            projects: vec![],
            contributors: vec![
                contributor("A", Some("Alice")),
                contributor("B", None),
                contributor("C", Some("carol")),
            ],
            typescript_version: None,
            raw: String::new(),
        };
        let names: Vec<String> = header.usernames().collect();
        assert_eq!(names, vec!["alice", "carol"]);
    }
}
