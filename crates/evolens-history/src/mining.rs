//! Git history extraction via git2.
//!
//! Walks a branch oldest-first and turns every commit into a
//! [`CommitRecord`] with per-file line counts and change kinds.

use std::path::Path;

use evolens_core::{ChangeKind, CommitRecord, EvolensError, FileModification};
use git2::{Delta, DiffFindOptions, DiffOptions, Oid, Patch, Repository, Sort};
use tracing::debug;

/// Options for history mining.
///
/// # Examples
///
/// ```
/// use evolens_history::mining::MiningOptions;
///
/// let opts = MiningOptions::default();
/// assert!(opts.branch.is_none());
/// assert!(opts.since_days.is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct MiningOptions {
    /// Branch to walk (default: HEAD).
    pub branch: Option<String>,
    /// Only include commits from the last N days (default: all history).
    pub since_days: Option<u64>,
}

/// Mine commit history from a git repository.
///
/// Returns commits in traversal order, oldest first. Merge commits are
/// returned with no modifications: their changes are already visited
/// through the commits they merge.
///
/// # Errors
///
/// Returns [`EvolensError::Git`] if the repository cannot be opened or walked.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use evolens_history::mining::{mine_history, MiningOptions};
///
/// let commits = mine_history(Path::new("."), &MiningOptions::default()).unwrap();
/// for c in &commits {
///     println!("{} {} files", c.hash, c.modifications.len());
/// }
/// ```
pub fn mine_history(
    repo_path: &Path,
    options: &MiningOptions,
) -> Result<Vec<CommitRecord>, EvolensError> {
    let repo = Repository::open(repo_path)
        .map_err(|e| EvolensError::Git(format!("failed to open repository: {e}")))?;

    let mut revwalk = repo
        .revwalk()
        .map_err(|e| EvolensError::Git(format!("failed to create revwalk: {e}")))?;

    revwalk
        .set_sorting(Sort::TIME | Sort::REVERSE)
        .map_err(|e| EvolensError::Git(format!("failed to set sorting: {e}")))?;

    let tip = resolve_tip(&repo, options.branch.as_deref())?;
    revwalk
        .push(tip)
        .map_err(|e| EvolensError::Git(format!("failed to push oid: {e}")))?;

    let cutoff = options.since_days.map(compute_cutoff);
    let mut commits = Vec::new();

    for oid_result in revwalk {
        let oid = oid_result.map_err(|e| EvolensError::Git(format!("revwalk error: {e}")))?;

        let commit = repo
            .find_commit(oid)
            .map_err(|e| EvolensError::Git(format!("failed to find commit: {e}")))?;

        let timestamp = commit.time().seconds();
        if cutoff.is_some_and(|c| timestamp < c) {
            continue;
        }

        let modifications = if commit.parent_count() > 1 {
            debug!(commit = %oid, "merge commit, no modifications recorded");
            Vec::new()
        } else {
            extract_modifications(&repo, &commit)?
        };

        commits.push(CommitRecord {
            hash: oid.to_string(),
            author: commit.author().name().unwrap_or("unknown").to_string(),
            message: commit.message().unwrap_or("").to_string(),
            timestamp,
            modifications,
        });
    }

    Ok(commits)
}

/// Resolve the commit a branch (or HEAD) points at.
pub(crate) fn resolve_tip(repo: &Repository, branch: Option<&str>) -> Result<Oid, EvolensError> {
    let reference = match branch {
        Some(branch) => repo
            .resolve_reference_from_short_name(branch)
            .map_err(|e| EvolensError::Git(format!("failed to resolve branch '{branch}': {e}")))?,
        None => repo
            .head()
            .map_err(|e| EvolensError::Git(format!("failed to resolve HEAD: {e}")))?,
    };
    let commit = reference
        .peel_to_commit()
        .map_err(|e| EvolensError::Git(format!("reference has no commit: {e}")))?;
    Ok(commit.id())
}

fn compute_cutoff(since_days: u64) -> i64 {
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64;
    now - (since_days as i64 * 86400)
}

fn path_string(path: Option<&Path>) -> Option<String> {
    path.map(|p| p.to_string_lossy().to_string())
        .filter(|p| !p.is_empty())
}

fn extract_modifications(
    repo: &Repository,
    commit: &git2::Commit,
) -> Result<Vec<FileModification>, EvolensError> {
    let commit_tree = commit
        .tree()
        .map_err(|e| EvolensError::Git(format!("failed to get commit tree: {e}")))?;

    let parent_tree = if commit.parent_count() > 0 {
        let parent = commit
            .parent(0)
            .map_err(|e| EvolensError::Git(format!("failed to get parent: {e}")))?;
        Some(
            parent
                .tree()
                .map_err(|e| EvolensError::Git(format!("failed to get parent tree: {e}")))?,
        )
    } else {
        None
    };

    let mut diff_opts = DiffOptions::new();
    let mut diff = repo
        .diff_tree_to_tree(
            parent_tree.as_ref(),
            Some(&commit_tree),
            Some(&mut diff_opts),
        )
        .map_err(|e| EvolensError::Git(format!("failed to compute diff: {e}")))?;

    // Enable rename detection
    let mut find_opts = DiffFindOptions::new();
    find_opts.renames(true);
    diff.find_similar(Some(&mut find_opts))
        .map_err(|e| EvolensError::Git(format!("failed to find renames: {e}")))?;

    let mut modifications = Vec::new();

    for (idx, delta) in diff.deltas().enumerate() {
        let kind = match delta.status() {
            Delta::Added | Delta::Copied | Delta::Untracked => ChangeKind::Created,
            Delta::Deleted => ChangeKind::Deleted,
            Delta::Renamed => ChangeKind::Renamed,
            _ => ChangeKind::Modified,
        };

        let new_path = match kind {
            ChangeKind::Deleted => None,
            _ => path_string(delta.new_file().path()),
        };
        let old_path = match kind {
            ChangeKind::Created => None,
            _ => path_string(delta.old_file().path()),
        };

        // Binary files have no textual patch and count as zero lines.
        let (added_lines, deleted_lines) = match Patch::from_diff(&diff, idx)
            .map_err(|e| EvolensError::Git(format!("failed to build patch: {e}")))?
        {
            Some(patch) => {
                let (_, added, deleted) = patch
                    .line_stats()
                    .map_err(|e| EvolensError::Git(format!("failed to count lines: {e}")))?;
                (added as u64, deleted as u64)
            }
            None => (0, 0),
        };

        modifications.push(FileModification {
            new_path,
            old_path,
            added_lines,
            deleted_lines,
            kind,
        });
    }

    Ok(modifications)
}
