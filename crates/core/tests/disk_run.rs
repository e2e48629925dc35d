//! End-to-end runs of the ghostbuster orchestrator over an on-disk tree.
//!
//! The GitHub lookup is replaced by a fixed in-process directory of users
//! and organizations; everything else (traversal, parsing, patching, file
//! writes) is the real implementation.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tempfile::TempDir;

use ghostbuster_core::errors::{CoreError, GitHubError, PatchError};
use ghostbuster_core::github::{GhostChecker, IdentityLookup, LoginKind};
use ghostbuster_core::{DiskTree, Ghostbuster, Patcher};

// ===========================================================================
// Helpers
// ===========================================================================

struct Directory {
    users: HashSet<String>,
    orgs: HashSet<String>,
    requests: Arc<AtomicUsize>,
}

impl Directory {
    fn new(users: &[&str], orgs: &[&str]) -> Self {
        Self {
            users: users.iter().map(|s| s.to_string()).collect(),
            orgs: orgs.iter().map(|s| s.to_string()).collect(),
            requests: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait]
impl IdentityLookup for Directory {
    async fn existing_logins(
        &self,
        kind: LoginKind,
        logins: &[String],
    ) -> Result<HashSet<String>, GitHubError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        let known = match kind {
            LoginKind::User => &self.users,
            LoginKind::Organization => &self.orgs,
        };
        Ok(logins.iter().filter(|l| known.contains(*l)).cloned().collect())
    }
}

fn header(contributors: &[(&str, &str)]) -> String {
    let mut text = String::from(
        "// Type definitions for pkg 2.1\n// Project: https://github.com/example/pkg\n",
    );
    for (i, (name, login)) in contributors.iter().enumerate() {
        let prefix = if i == 0 {
            "// Definitions by:"
        } else {
            "//                "
        };
        text.push_str(&format!("{} {} <https://github.com/{}>\n", prefix, name, login));
    }
    text.push_str("// Definitions: https://github.com/DefinitelyTyped/DefinitelyTyped\n");
    text.push_str("// TypeScript Version: 4.1\n\nexport declare function pkg(): void;\n");
    text
}

fn write_package(root: &Path, rel: &str, contents: &str) -> PathBuf {
    let dir = root.join(rel);
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("index.d.ts");
    std::fs::write(&path, contents).unwrap();
    path
}

fn buster(directory: Directory) -> Ghostbuster<Directory> {
    Ghostbuster::new(GhostChecker::new(directory, 2), Patcher::default())
}

fn disk_tree(dir: &TempDir) -> DiskTree {
    DiskTree::new(
        vec![dir.path().to_path_buf()],
        "index.d.ts",
        vec!["node_modules".into()],
    )
}

// ===========================================================================
// Tests
// ===========================================================================

#[tokio::test]
async fn test_ghosts_removed_across_tree() {
    let dir = tempfile::tempdir().unwrap();
    let multi = write_package(
        dir.path(),
        "multi",
        &header(&[("A", "alice"), ("B", "GhostUser"), ("C", "carol")]),
    );
    let sole = write_package(dir.path(), "sole/v3", &header(&[("B", "ghostuser")]));
    let org = write_package(dir.path(), "org", &header(&[("Acme", "acme")]));
    let vendored = write_package(
        dir.path(),
        "multi/node_modules/dep",
        &header(&[("A", "alice"), ("B", "ghostuser")]),
    );

    let summary = buster(Directory::new(&["alice", "carol"], &["acme"]))
        .run(&disk_tree(&dir))
        .await
        .unwrap();

    assert_eq!(summary.files_scanned, 3);
    assert_eq!(summary.ghosts, vec!["ghostuser"]);
    assert_eq!(summary.patched, vec![multi.clone(), sole.clone()]);

    assert_eq!(
        std::fs::read_to_string(&multi).unwrap(),
        header(&[("A", "alice"), ("C", "carol")])
    );
    assert_eq!(
        std::fs::read_to_string(&sole).unwrap(),
        header(&[("DefinitelyTyped", "DefinitelyTyped")])
    );
    assert_eq!(
        std::fs::read_to_string(&org).unwrap(),
        header(&[("Acme", "acme")])
    );
    assert_eq!(
        std::fs::read_to_string(&vendored).unwrap(),
        header(&[("A", "alice"), ("B", "ghostuser")])
    );
}

#[tokio::test]
async fn test_second_run_is_a_no_op() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_package(dir.path(), "pkg", &header(&[("A", "alice"), ("B", "gone")]));

    let first = buster(Directory::new(&["alice"], &[]))
        .run(&disk_tree(&dir))
        .await
        .unwrap();
    assert_eq!(first.patched, vec![path.clone()]);
    let after_first = std::fs::read_to_string(&path).unwrap();

    let second = buster(Directory::new(&["alice"], &[]))
        .run(&disk_tree(&dir))
        .await
        .unwrap();
    assert!(second.ghosts.is_empty());
    assert!(second.patched.is_empty());
    assert_eq!(std::fs::read_to_string(&path).unwrap(), after_first);
}

#[tokio::test]
async fn test_unparseable_files_are_ignored() {
    let dir = tempfile::tempdir().unwrap();
    let plain = write_package(dir.path(), "plain", "export const x = 1;\n");

    let directory = Directory::new(&[], &[]);
    let requests = Arc::clone(&directory.requests);
    let summary = buster(directory).run(&disk_tree(&dir)).await.unwrap();
    assert_eq!(summary.files_scanned, 0);
    assert_eq!(summary.usernames_checked, 0);
    assert_eq!(requests.load(Ordering::SeqCst), 0);
    assert_eq!(
        std::fs::read_to_string(&plain).unwrap(),
        "export const x = 1;\n"
    );
}

#[tokio::test]
async fn test_structural_violation_aborts_without_writing() {
    let dir = tempfile::tempdir().unwrap();
    let stale = header(&[("DefinitelyTyped", "DefinitelyTyped")]);
    let path = write_package(dir.path(), "stale", &stale);

    let err = buster(Directory::new(&[], &[]))
        .run(&disk_tree(&dir))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CoreError::Patch(PatchError::SubstitutionUnchanged)
    ));
    assert_eq!(std::fs::read_to_string(&path).unwrap(), stale);
}
