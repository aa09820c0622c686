//! Access to the current content of tracked files.
//!
//! Content lookups never fail the run: a missing file is [`FileContent::Absent`]
//! and any other read problem is [`FileContent::Unreadable`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use evolens_core::EvolensError;
use git2::{ErrorCode, Oid, Repository};
use tracing::{debug, warn};

use crate::mining::resolve_tip;

/// Result of looking up a file's current content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileContent {
    /// Raw bytes of the file.
    Bytes(Vec<u8>),
    /// The file no longer exists.
    Absent,
    /// The file exists but could not be read.
    Unreadable(String),
}

/// Resolves a repository-relative path to its current content.
///
/// # Examples
///
/// ```
/// use std::collections::HashMap;
/// use evolens_history::content::{ContentSource, FileContent};
///
/// let mut files = HashMap::new();
/// files.insert("src/a.c".to_string(), "int a;\n".to_string());
///
/// assert_eq!(files.read("src/a.c"), FileContent::Bytes(b"int a;\n".to_vec()));
/// assert_eq!(files.read("src/gone.c"), FileContent::Absent);
/// ```
pub trait ContentSource {
    /// Look up `path`, relative to the repository root.
    fn read(&self, path: &str) -> FileContent;
}

impl ContentSource for HashMap<String, String> {
    fn read(&self, path: &str) -> FileContent {
        match self.get(path) {
            Some(text) => FileContent::Bytes(text.as_bytes().to_vec()),
            None => FileContent::Absent,
        }
    }
}

/// Reads files from a checked-out working copy.
///
/// # Examples
///
/// ```
/// use evolens_history::content::{ContentSource, FileContent, WorkingCopy};
///
/// let wc = WorkingCopy::new(".");
/// assert_eq!(wc.read("no/such/file.c"), FileContent::Absent);
/// ```
#[derive(Debug, Clone)]
pub struct WorkingCopy {
    root: PathBuf,
}

impl WorkingCopy {
    /// Working copy rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ContentSource for WorkingCopy {
    fn read(&self, path: &str) -> FileContent {
        let full_path = self.root.join(path);
        match std::fs::read(&full_path) {
            Ok(bytes) => FileContent::Bytes(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path, "file absent from working copy");
                FileContent::Absent
            }
            Err(e) => {
                warn!(path = %full_path.display(), error = %e, "failed to read file");
                FileContent::Unreadable(e.to_string())
            }
        }
    }
}

/// Reads files from the tree at the tip of a branch, without a checkout.
pub struct BranchTip {
    repo: Repository,
    tree: Oid,
}

impl BranchTip {
    /// Open `repo_path` and pin the tree of `branch` (or HEAD).
    ///
    /// # Errors
    ///
    /// Returns [`EvolensError::Git`] if the repository or branch cannot be
    /// resolved.
    pub fn open(repo_path: &Path, branch: Option<&str>) -> Result<Self, EvolensError> {
        let repo = Repository::open(repo_path)
            .map_err(|e| EvolensError::Git(format!("failed to open repository: {e}")))?;
        let tip = resolve_tip(&repo, branch)?;
        let tree = repo
            .find_commit(tip)
            .and_then(|c| c.tree())
            .map_err(|e| EvolensError::Git(format!("failed to get tip tree: {e}")))?
            .id();
        Ok(Self { repo, tree })
    }
}

impl ContentSource for BranchTip {
    fn read(&self, path: &str) -> FileContent {
        let tree = match self.repo.find_tree(self.tree) {
            Ok(tree) => tree,
            Err(e) => return FileContent::Unreadable(e.to_string()),
        };
        let entry = match tree.get_path(Path::new(path)) {
            Ok(entry) => entry,
            Err(e) if e.code() == ErrorCode::NotFound => {
                debug!(path, "file absent from branch tip");
                return FileContent::Absent;
            }
            Err(e) => return FileContent::Unreadable(e.to_string()),
        };
        match entry.to_object(&self.repo).and_then(|o| o.peel_to_blob()) {
            Ok(blob) => FileContent::Bytes(blob.content().to_vec()),
            Err(e) => {
                warn!(path, error = %e, "failed to read blob");
                FileContent::Unreadable(e.to_string())
            }
        }
    }
}
