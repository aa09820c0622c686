//! Scratch repositories for unit tests.

use std::path::Path;

use git2::{Oid, Repository, Signature, Time};
use tempfile::TempDir;

pub(crate) struct FixtureRepo {
    dir: TempDir,
    repo: Repository,
}

impl FixtureRepo {
    pub(crate) fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        Self { dir, repo }
    }

    pub(crate) fn path(&self) -> &Path {
        self.dir.path()
    }

    pub(crate) fn repo(&self) -> &Repository {
        &self.repo
    }

    /// Write (`Some`) or remove (`None`) files, then commit on HEAD.
    pub(crate) fn commit(&self, message: &str, time: i64, files: &[(&str, Option<&str>)]) -> Oid {
        self.commit_with_parent(message, time, files, None)
    }

    /// Like [`FixtureRepo::commit`], with `other` as a second parent.
    pub(crate) fn merge(
        &self,
        message: &str,
        time: i64,
        other: Oid,
        files: &[(&str, Option<&str>)],
    ) -> Oid {
        self.commit_with_parent(message, time, files, Some(other))
    }

    /// Hard-reset HEAD and the working tree to `oid`.
    pub(crate) fn reset_to(&self, oid: Oid) {
        let commit = self.repo.find_commit(oid).unwrap();
        self.repo
            .reset(commit.as_object(), git2::ResetType::Hard, None)
            .unwrap();
    }

    fn commit_with_parent(
        &self,
        message: &str,
        time: i64,
        files: &[(&str, Option<&str>)],
        other: Option<Oid>,
    ) -> Oid {
        let mut index = self.repo.index().unwrap();
        for (path, content) in files {
            let full = self.dir.path().join(path);
            match content {
                Some(text) => {
                    if let Some(parent) = full.parent() {
                        std::fs::create_dir_all(parent).unwrap();
                    }
                    std::fs::write(&full, text).unwrap();
                    index.add_path(Path::new(path)).unwrap();
                }
                None => {
                    std::fs::remove_file(&full).unwrap();
                    index.remove_path(Path::new(path)).unwrap();
                }
            }
        }
        index.write().unwrap();
        let tree_id = index.write_tree().unwrap();
        let tree = self.repo.find_tree(tree_id).unwrap();
        let sig = Signature::new("alice", "alice@example.com", &Time::new(time, 0)).unwrap();
        let parent = self
            .repo
            .head()
            .ok()
            .and_then(|h| h.peel_to_commit().ok());
        let other = other.map(|oid| self.repo.find_commit(oid).unwrap());
        let parents: Vec<&git2::Commit> = parent.iter().chain(other.iter()).collect();
        self.repo
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .unwrap()
    }
}
