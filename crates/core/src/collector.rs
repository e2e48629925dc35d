//! Header collection over a tree of package directories.
//!
//! Traversal and file I/O sit behind the [`SourceTree`] trait so collection
//! and patching can run against [`DiskTree`] or an in-memory [`MemoryTree`].

use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

use crate::config::ScanConfig;
use crate::errors::CollectError;
use crate::header::{parse_header, Header};

/// Source of header files and the sink for patched contents.
pub trait SourceTree: Send + Sync {
    /// Every candidate header file, in a stable order.
    fn header_files(&self) -> Result<Vec<PathBuf>, CollectError>;

    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Overwrite `path` with `contents`.
    fn write(&self, path: &Path, contents: &str) -> io::Result<()>;
}

// ---------------------------------------------------------------------------
// On-disk tree
// ---------------------------------------------------------------------------

/// Package directories on the local filesystem.
///
/// Every directory strictly below a root is a package candidate; skipped
/// directories are pruned together with their subtrees.
#[derive(Debug, Clone)]
pub struct DiskTree {
    roots: Vec<PathBuf>,
    header_file: String,
    skip_dirs: Vec<String>,
}

impl DiskTree {
    pub fn new(roots: Vec<PathBuf>, header_file: impl Into<String>, skip_dirs: Vec<String>) -> Self {
        Self {
            roots,
            header_file: header_file.into(),
            skip_dirs,
        }
    }

    pub fn from_config(scan: &ScanConfig) -> Self {
        Self::new(
            scan.roots.clone(),
            scan.header_file.clone(),
            scan.skip_dirs.clone(),
        )
    }

    fn is_skipped(&self, entry: &DirEntry) -> bool {
        entry.file_type().is_dir()
            && entry
                .file_name()
                .to_str()
                .is_some_and(|name| self.skip_dirs.iter().any(|s| s == name))
    }
}

impl SourceTree for DiskTree {
    fn header_files(&self) -> Result<Vec<PathBuf>, CollectError> {
        let mut files = Vec::new();
        for root in &self.roots {
            if !root.exists() {
                return Err(CollectError::RootNotFound(root.clone()));
            }
            if !root.is_dir() {
                return Err(CollectError::NotADirectory(root.clone()));
            }

            let walker = WalkDir::new(root)
                .min_depth(1)
                .follow_links(false)
                .sort_by_file_name()
                .into_iter()
                .filter_entry(|e| !self.is_skipped(e));

            for entry in walker {
                match entry {
                    Ok(entry) if entry.file_type().is_dir() => {
                        let candidate = entry.path().join(&self.header_file);
                        if candidate.is_file() {
                            files.push(candidate);
                        }
                    }
                    Ok(_) => {}
                    Err(e) => warn!(error = %e, "error accessing entry, skipping"),
                }
            }
        }
        debug!(count = files.len(), "found header files");
        Ok(files)
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn write(&self, path: &Path, contents: &str) -> io::Result<()> {
        std::fs::write(path, contents)
    }
}

// ---------------------------------------------------------------------------
// In-memory tree
// ---------------------------------------------------------------------------

/// A virtual file tree with the same discovery rules as [`DiskTree`].
#[derive(Debug)]
pub struct MemoryTree {
    root: PathBuf,
    header_file: String,
    skip_dirs: Vec<String>,
    files: Mutex<BTreeMap<PathBuf, String>>,
    writes: Mutex<Vec<PathBuf>>,
}

impl MemoryTree {
    pub fn new(root: impl Into<PathBuf>, header_file: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            header_file: header_file.into(),
            skip_dirs: vec!["node_modules".into()],
            files: Mutex::new(BTreeMap::new()),
            writes: Mutex::new(Vec::new()),
        }
    }

    /// Add a file at `rel_path` below the root.
    pub fn with_file(self, rel_path: impl AsRef<Path>, contents: impl Into<String>) -> Self {
        let path = self.root.join(rel_path);
        self.lock_files().insert(path, contents.into());
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Current contents of `rel_path`, if present.
    pub fn contents(&self, rel_path: impl AsRef<Path>) -> Option<String> {
        self.lock_files().get(&self.root.join(rel_path)).cloned()
    }

    /// Paths written so far, in write order.
    pub fn writes(&self) -> Vec<PathBuf> {
        self.writes
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn lock_files(&self) -> std::sync::MutexGuard<'_, BTreeMap<PathBuf, String>> {
        self.files
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn is_header_path(&self, path: &Path) -> bool {
        let Ok(rel) = path.strip_prefix(&self.root) else {
            return false;
        };
        let parts: Vec<&str> = rel.iter().filter_map(|c| c.to_str()).collect();
        match parts.split_last() {
            Some((file, dirs)) => {
                *file == self.header_file
                    && !dirs.is_empty()
                    && !dirs.iter().any(|d| self.skip_dirs.iter().any(|s| s == d))
            }
            None => false,
        }
    }
}

impl SourceTree for MemoryTree {
    fn header_files(&self) -> Result<Vec<PathBuf>, CollectError> {
        Ok(self
            .lock_files()
            .keys()
            .filter(|path| self.is_header_path(path))
            .cloned()
            .collect())
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        self.lock_files()
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, path.display().to_string()))
    }

    fn write(&self, path: &Path, contents: &str) -> io::Result<()> {
        self.lock_files().insert(path.to_path_buf(), contents.to_string());
        self.writes
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(path.to_path_buf());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Collection
// ---------------------------------------------------------------------------

/// Parse the header of every file `tree` yields, keyed by path.
///
/// Files that cannot be read or parsed are left out.
pub fn collect_all(tree: &dyn SourceTree) -> Result<BTreeMap<PathBuf, Header>, CollectError> {
    info!("reading headers");
    let mut headers = BTreeMap::new();
    let mut skipped = 0usize;
    for path in tree.header_files()? {
        let text = match tree.read_to_string(&path) {
            Ok(text) => text,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to read header file, skipping");
                skipped += 1;
                continue;
            }
        };
        match parse_header(&text) {
            Ok(header) => {
                headers.insert(path, header);
            }
            Err(e) => {
                debug!(path = %path.display(), reason = %e, "no parseable header, skipping");
                skipped += 1;
            }
        }
    }
    info!(parsed = headers.len(), skipped, "header collection complete");
    Ok(headers)
}

/// Distinct lower-cased logins across every collected header.
pub fn all_contributor_usernames(headers: &BTreeMap<PathBuf, Header>) -> BTreeSet<String> {
    headers.values().flat_map(|h| h.usernames()).collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn header_text(contributors: &[(&str, &str)]) -> String {
        let mut text = String::from("// Type definitions for pkg 1.0\n// Project: https://example.com\n");
        for (i, (name, login)) in contributors.iter().enumerate() {
            let prefix = if i == 0 {
                "// Definitions by: "
            } else {
                "//                 "
            };
            text.push_str(&format!("{prefix}{name} <https://github.com/{login}>\n"));
        }
        text.push_str("// Definitions: https://github.com/DefinitelyTyped/DefinitelyTyped\n\nexport {};\n");
        text
    }

    #[test]
    fn test_collect_skips_unparseable_and_excluded_dirs() {
        let tree = MemoryTree::new("/types", "index.d.ts")
            .with_file("a/index.d.ts", header_text(&[("A", "Alice")]))
            .with_file("a/v1/index.d.ts", header_text(&[("B", "bob"), ("A", "alice")]))
            .with_file("b/index.d.ts", "export const x: number;\n")
            .with_file("c/node_modules/dep/index.d.ts", header_text(&[("N", "nobody")]))
            .with_file("index.d.ts", header_text(&[("R", "rooty")]))
            .with_file("d/other.d.ts", header_text(&[("O", "other")]));

        let headers = collect_all(&tree).unwrap();
        let paths: Vec<_> = headers.keys().cloned().collect();
        assert_eq!(
            paths,
            vec![
                PathBuf::from("/types/a/index.d.ts"),
                PathBuf::from("/types/a/v1/index.d.ts"),
            ]
        );

        let names: Vec<String> = all_contributor_usernames(&headers).into_iter().collect();
        assert_eq!(names, vec!["alice", "bob"]);
    }

    #[test]
    fn test_disk_tree_walks_nested_packages() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        for rel in ["foo", "foo/v2", "bar", "node_modules/dep", "baz/node_modules/x"] {
            std::fs::create_dir_all(root.join(rel)).unwrap();
            std::fs::write(root.join(rel).join("index.d.ts"), "").unwrap();
        }
        std::fs::create_dir_all(root.join("empty")).unwrap();
        std::fs::write(root.join("index.d.ts"), "").unwrap();

        let tree = DiskTree::new(vec![root.to_path_buf()], "index.d.ts", vec!["node_modules".into()]);
        let files = tree.header_files().unwrap();
        assert_eq!(
            files,
            vec![
                root.join("bar/index.d.ts"),
                root.join("foo/index.d.ts"),
                root.join("foo/v2/index.d.ts"),
            ]
        );
    }

    #[test]
    fn test_disk_tree_missing_root() {
        let tree = DiskTree::new(vec![PathBuf::from("/nonexistent/types")], "index.d.ts", vec![]);
        assert!(matches!(
            tree.header_files(),
            Err(CollectError::RootNotFound(_))
        ));
    }
}
