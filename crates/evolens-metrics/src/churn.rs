//! Per-file churn accumulation.
//!
//! Splits every tracked file's churn into creation churn (lines from the
//! commit that created it) and refactoring churn (lines from every later
//! change), keyed by the path the file has after each change.

use std::collections::BTreeMap;

use evolens_core::{ChangeKind, CommitRecord, EvolensError, HistoryConfig};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Decides which paths are tracked.
///
/// A path is tracked when it ends with one of the allowed suffixes (or the
/// suffix list is empty) and matches one of the include globs (or there are
/// none).
///
/// # Examples
///
/// ```
/// use evolens_metrics::churn::PathFilter;
///
/// let filter = PathFilter::new(&[".c", ".h"], &[]).unwrap();
/// assert!(filter.matches("src/driver.c"));
/// assert!(!filter.matches("README.md"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct PathFilter {
    extensions: Vec<String>,
    include: Vec<glob::Pattern>,
}

impl PathFilter {
    /// Build a filter from suffixes and glob patterns.
    ///
    /// # Errors
    ///
    /// Returns [`EvolensError::Pattern`] if a glob does not compile.
    pub fn new<S: AsRef<str>>(extensions: &[S], include: &[S]) -> Result<Self, EvolensError> {
        let include = include
            .iter()
            .map(|p| {
                glob::Pattern::new(p.as_ref()).map_err(|e| EvolensError::Pattern {
                    pattern: p.as_ref().to_string(),
                    reason: e.msg.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            extensions: extensions
                .iter()
                .map(|e| e.as_ref().to_string())
                .filter(|e| !e.is_empty())
                .collect(),
            include,
        })
    }

    /// Build a filter from the `[history]` configuration.
    ///
    /// # Errors
    ///
    /// Returns [`EvolensError::Pattern`] if an include glob does not compile.
    pub fn from_config(config: &HistoryConfig) -> Result<Self, EvolensError> {
        Self::new(&config.extensions, &config.include_paths)
    }

    /// Check whether `path` is tracked.
    pub fn matches(&self, path: &str) -> bool {
        let extension_ok =
            self.extensions.is_empty() || self.extensions.iter().any(|e| path.ends_with(e.as_str()));
        let include_ok = self.include.is_empty() || self.include.iter().any(|p| p.matches(path));
        extension_ok && include_ok
    }
}

/// Churn accumulated for one path.
///
/// # Examples
///
/// ```
/// use evolens_metrics::churn::FileMetric;
///
/// let metric = FileMetric { creation_churn: 50, refactoring_churn: 15, revisions: 2 };
/// assert_eq!(metric.total_churn(), 65);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMetric {
    /// Lines from `created` modifications.
    pub creation_churn: u64,
    /// Lines from every other modification.
    pub refactoring_churn: u64,
    /// Number of modifications observed.
    pub revisions: u32,
}

impl FileMetric {
    /// `creation_churn + refactoring_churn`.
    pub fn total_churn(&self) -> u64 {
        self.creation_churn + self.refactoring_churn
    }
}

/// What one commit contributed to the tracked files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommitChurn {
    /// Refactoring churn over tracked files in this commit.
    pub refactoring_churn: u64,
    /// Creation churn over tracked files in this commit.
    pub creation_churn: u64,
    /// Tracked modifications in this commit.
    pub tracked_files: usize,
}

/// Accumulates [`FileMetric`]s across a commit stream.
///
/// # Examples
///
/// ```
/// use evolens_core::{CommitRecord, FileModification};
/// use evolens_metrics::churn::{ChurnAggregator, PathFilter};
///
/// let mut aggregator = ChurnAggregator::new(PathFilter::new(&[".c"], &[]).unwrap());
/// let commit = CommitRecord {
///     hash: "a".into(),
///     author: "ann".into(),
///     message: "init".into(),
///     timestamp: 1,
///     modifications: vec![FileModification::created("m.c", 50)],
/// };
/// let churn = aggregator.ingest(&commit);
/// assert_eq!(churn.refactoring_churn, 0);
/// assert_eq!(aggregator.get("m.c").unwrap().creation_churn, 50);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ChurnAggregator {
    filter: PathFilter,
    files: BTreeMap<String, FileMetric>,
}

impl ChurnAggregator {
    /// An empty aggregator tracking paths accepted by `filter`.
    pub fn new(filter: PathFilter) -> Self {
        Self {
            filter,
            files: BTreeMap::new(),
        }
    }

    /// Add one commit's modifications.
    ///
    /// Modifications without a new path (deletions) or whose new path fails
    /// the filter are ignored. Renames are tracked under the new path with
    /// no history carried over from the old one.
    pub fn ingest(&mut self, commit: &CommitRecord) -> CommitChurn {
        let mut churn = CommitChurn::default();

        for modification in &commit.modifications {
            let Some(path) = modification.new_path.as_deref() else {
                continue;
            };
            if !self.filter.matches(path) {
                debug!(path, commit = %commit.hash, "modification filtered out");
                continue;
            }

            let lines = modification.churn();
            let metric = self.files.entry(path.to_string()).or_default();
            metric.revisions += 1;
            if modification.kind == ChangeKind::Created {
                metric.creation_churn += lines;
                churn.creation_churn += lines;
            } else {
                metric.refactoring_churn += lines;
                churn.refactoring_churn += lines;
            }
            churn.tracked_files += 1;
        }

        churn
    }

    /// Metric for `path`, if tracked.
    pub fn get(&self, path: &str) -> Option<&FileMetric> {
        self.files.get(path)
    }

    /// Number of tracked paths.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether no path has been tracked yet.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Tracked paths and their metrics, ordered by path.
    pub fn files(&self) -> &BTreeMap<String, FileMetric> {
        &self.files
    }

    /// Consume the aggregator, yielding the per-path metrics.
    pub fn into_files(self) -> BTreeMap<String, FileMetric> {
        self.files
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use evolens_core::FileModification;

    fn commit(hash: &str, modifications: Vec<FileModification>) -> CommitRecord {
        CommitRecord {
            hash: hash.into(),
            author: "alice".into(),
            message: "test commit".into(),
            timestamp: 0,
            modifications,
        }
    }

    fn c_filter() -> PathFilter {
        PathFilter::new(&[".c", ".h"], &[]).unwrap()
    }

    #[test]
    fn creation_and_refactoring_churn_are_separated() {
        let mut aggregator = ChurnAggregator::new(c_filter());
        aggregator.ingest(&commit("a", vec![FileModification::created("drv.c", 50)]));
        let churn = aggregator.ingest(&commit("b", vec![FileModification::modified("drv.c", 10, 5)]));

        assert_eq!(churn.refactoring_churn, 15);
        let metric = aggregator.get("drv.c").unwrap();
        assert_eq!(metric.creation_churn, 50);
        assert_eq!(metric.refactoring_churn, 15);
        assert_eq!(metric.revisions, 2);
    }

    #[test]
    fn churn_partitions_total_lines() {
        let history = vec![
            commit("a", vec![FileModification::created("x.c", 40)]),
            commit("b", vec![FileModification::modified("x.c", 7, 3)]),
            commit("c", vec![FileModification::modified("x.c", 0, 12)]),
        ];
        let mut aggregator = ChurnAggregator::new(c_filter());
        for c in &history {
            aggregator.ingest(c);
        }
        let expected: u64 = history
            .iter()
            .flat_map(|c| &c.modifications)
            .map(|m| m.churn())
            .sum();
        assert_eq!(aggregator.get("x.c").unwrap().total_churn(), expected);
    }

    #[test]
    fn deletions_and_filtered_paths_are_ignored() {
        let mut aggregator = ChurnAggregator::new(c_filter());
        let churn = aggregator.ingest(&commit(
            "a",
            vec![
                FileModification::deleted("gone.c", 30),
                FileModification::modified("README.md", 4, 4),
            ],
        ));
        assert_eq!(churn, CommitChurn::default());
        assert!(aggregator.is_empty());
    }

    #[test]
    fn rename_starts_a_fresh_metric_under_new_path() {
        let mut aggregator = ChurnAggregator::new(c_filter());
        aggregator.ingest(&commit("a", vec![FileModification::created("old.c", 20)]));
        let churn = aggregator.ingest(&commit(
            "b",
            vec![FileModification::renamed("old.c", "new.c", 2, 1)],
        ));

        assert_eq!(churn.refactoring_churn, 3);
        assert_eq!(aggregator.get("old.c").unwrap().total_churn(), 20);
        let renamed = aggregator.get("new.c").unwrap();
        assert_eq!(renamed.creation_churn, 0);
        assert_eq!(renamed.refactoring_churn, 3);
    }

    #[test]
    fn rename_into_untracked_extension_is_ignored() {
        let mut aggregator = ChurnAggregator::new(c_filter());
        aggregator.ingest(&commit(
            "a",
            vec![FileModification::renamed("a.c", "a.c.bak", 0, 0)],
        ));
        assert!(aggregator.get("a.c.bak").is_none());
        assert!(aggregator.get("a.c").is_none());
    }

    #[test]
    fn modification_order_within_commit_does_not_matter() {
        let mods = vec![
            FileModification::created("a.c", 5),
            FileModification::modified("b.h", 3, 2),
            FileModification::modified("a.c", 1, 1),
        ];
        let mut reversed = mods.clone();
        reversed.reverse();

        let mut first = ChurnAggregator::new(c_filter());
        let mut second = ChurnAggregator::new(c_filter());
        let churn_a = first.ingest(&commit("x", mods));
        let churn_b = second.ingest(&commit("x", reversed));

        assert_eq!(churn_a, churn_b);
        assert_eq!(first.files(), second.files());
    }

    #[test]
    fn modification_of_untracked_path_initializes_metric() {
        let mut aggregator = ChurnAggregator::new(c_filter());
        aggregator.ingest(&commit("a", vec![FileModification::modified("legacy.c", 3, 0)]));
        let metric = aggregator.get("legacy.c").unwrap();
        assert_eq!(metric.creation_churn, 0);
        assert_eq!(metric.refactoring_churn, 3);
    }

    #[test]
    fn empty_extension_list_tracks_everything() {
        let filter = PathFilter::new::<&str>(&[], &[]).unwrap();
        assert!(filter.matches("any/file.txt"));
        assert!(filter.matches("Makefile"));
    }

    #[test]
    fn extension_match_is_case_sensitive_suffix() {
        let filter = c_filter();
        assert!(!filter.matches("DRIVER.C"));
        assert!(filter.matches("include/api.h"));
        assert!(!filter.matches("include/api.hpp"));
    }

    #[test]
    fn include_patterns_restrict_paths() {
        let filter = PathFilter::new(&[".c"], &["OBC750-AOCS-Shell-RTP/**"]).unwrap();
        assert!(filter.matches("OBC750-AOCS-Shell-RTP/src/ctrl.c"));
        assert!(!filter.matches("tools/gen.c"));
    }

    #[test]
    fn invalid_include_pattern_is_rejected() {
        let err = PathFilter::new(&[".c"], &["src/[abc"]).unwrap_err();
        assert!(matches!(err, EvolensError::Pattern { .. }));
    }

    #[test]
    fn filter_from_config_uses_history_settings() {
        let config = HistoryConfig {
            extensions: vec![".rs".into()],
            include_paths: vec!["crates/**".into()],
            ..HistoryConfig::default()
        };
        let filter = PathFilter::from_config(&config).unwrap();
        assert!(filter.matches("crates/core/src/lib.rs"));
        assert!(!filter.matches("src/main.rs"));
    }
}
