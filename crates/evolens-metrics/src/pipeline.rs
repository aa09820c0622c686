//! One analysis run over a commit stream.
//!
//! [`AnalysisRun`] owns all mutable state of a run: commit counters, churn
//! accumulation, the chronological churn points and the change-set size
//! distribution. Feed it commits with [`AnalysisRun::ingest`], then call
//! [`AnalysisRun::finish`] to resolve SLoC and produce an [`AnalysisReport`].

use std::collections::BTreeMap;

use evolens_core::{CommitRecord, EvolensConfig, EvolensError};
use evolens_history::content::ContentSource;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::churn::{ChurnAggregator, PathFilter};
use crate::classify::{CommitCounters, Taxonomy};
use crate::reduce::{self, ChronoPoint, CumulativePoint, FileReport, OverallTotals};
use crate::sloc::SourceLineCounter;

/// Everything a run needs besides its inputs.
#[derive(Debug, Clone)]
pub struct AnalysisSettings {
    /// Commit-message taxonomy.
    pub taxonomy: Taxonomy,
    /// Which paths are tracked.
    pub filter: PathFilter,
    /// SLoC counter used at finalization.
    pub counter: SourceLineCounter,
}

impl AnalysisSettings {
    /// Build settings from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`EvolensError::Config`] for an invalid taxonomy or
    /// [`EvolensError::Pattern`] for an invalid include glob.
    ///
    /// # Examples
    ///
    /// ```
    /// use evolens_core::EvolensConfig;
    /// use evolens_metrics::pipeline::AnalysisSettings;
    ///
    /// let settings = AnalysisSettings::from_config(&EvolensConfig::default()).unwrap();
    /// assert!(settings.filter.matches("src/main.c"));
    /// ```
    pub fn from_config(config: &EvolensConfig) -> Result<Self, EvolensError> {
        Ok(Self {
            taxonomy: Taxonomy::new(&config.taxonomy)?,
            filter: PathFilter::from_config(&config.history)?,
            counter: SourceLineCounter::from_config(&config.sloc),
        })
    }
}

/// Number of commits per change-set size, ordered by size.
///
/// # Examples
///
/// ```
/// use evolens_metrics::pipeline::ChangeSetDistribution;
///
/// let mut dist = ChangeSetDistribution::default();
/// dist.record(3);
/// dist.record(3);
/// dist.record(1);
/// assert_eq!(dist.commits_with(3), 2);
/// assert_eq!(dist.total_commits(), 3);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChangeSetDistribution {
    sizes: BTreeMap<usize, u64>,
}

impl ChangeSetDistribution {
    /// Count one commit touching `files` files.
    pub fn record(&mut self, files: usize) {
        *self.sizes.entry(files).or_default() += 1;
    }

    /// Commits that touched exactly `files` files.
    pub fn commits_with(&self, files: usize) -> u64 {
        self.sizes.get(&files).copied().unwrap_or(0)
    }

    /// Number of commits recorded.
    pub fn total_commits(&self) -> u64 {
        self.sizes.values().sum()
    }

    /// Mean files per commit, 0 with no commits.
    pub fn mean(&self) -> f64 {
        let files: u64 = self
            .sizes
            .iter()
            .map(|(size, commits)| *size as u64 * commits)
            .sum();
        reduce::ratio(files, self.total_commits())
    }

    /// `(size, commits)` pairs in ascending size.
    pub fn iter(&self) -> impl Iterator<Item = (usize, u64)> + '_ {
        self.sizes.iter().map(|(size, commits)| (*size, *commits))
    }
}

/// Everything a run produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    /// Commits ingested.
    pub commits_analyzed: u64,
    /// Overall totals.
    pub overall: OverallTotals,
    /// Commits per category.
    pub commit_counts: CommitCounters,
    /// Per-file metrics, ordered by path.
    pub files: Vec<FileReport>,
    /// Cumulative refactoring churn, in time order.
    pub cumulative_churn: Vec<CumulativePoint>,
    /// Commits per change-set size.
    pub change_sets: ChangeSetDistribution,
}

/// Aggregation context for a single run.
///
/// # Examples
///
/// ```
/// use std::collections::HashMap;
/// use evolens_core::{CommitRecord, EvolensConfig, FileModification};
/// use evolens_metrics::pipeline::{AnalysisRun, AnalysisSettings};
///
/// let settings = AnalysisSettings::from_config(&EvolensConfig::default()).unwrap();
/// let mut run = AnalysisRun::new(settings);
/// run.ingest(&CommitRecord {
///     hash: "a".into(),
///     author: "ann".into(),
///     message: "feat: scheduler".into(),
///     timestamp: 1,
///     modifications: vec![FileModification::created("sched.c", 12)],
/// });
///
/// let content: HashMap<String, String> = HashMap::new();
/// let report = run.finish(&content);
/// assert_eq!(report.commit_counts.get("feat"), 1);
/// assert_eq!(report.files[0].creation_churn, 12);
/// ```
#[derive(Debug, Clone)]
pub struct AnalysisRun {
    taxonomy: Taxonomy,
    counter: SourceLineCounter,
    counters: CommitCounters,
    aggregator: ChurnAggregator,
    chrono: Vec<ChronoPoint>,
    change_sets: ChangeSetDistribution,
    commits: u64,
}

impl AnalysisRun {
    /// Start an empty run.
    pub fn new(settings: AnalysisSettings) -> Self {
        let counters = CommitCounters::new(&settings.taxonomy);
        Self {
            taxonomy: settings.taxonomy,
            counter: settings.counter,
            counters,
            aggregator: ChurnAggregator::new(settings.filter),
            chrono: Vec::new(),
            change_sets: ChangeSetDistribution::default(),
            commits: 0,
        }
    }

    /// Classify a commit and accumulate its churn.
    pub fn ingest(&mut self, commit: &CommitRecord) {
        let category = self.taxonomy.classify(&commit.message);
        self.counters.record(category);

        let churn = self.aggregator.ingest(commit);
        debug!(
            commit = %commit.hash,
            category,
            refactoring_churn = churn.refactoring_churn,
            tracked_files = churn.tracked_files,
            "ingested commit"
        );

        self.chrono.push(ChronoPoint {
            timestamp: commit.timestamp,
            churn: churn.refactoring_churn,
        });
        self.change_sets.record(commit.modifications.len());
        self.commits += 1;
    }

    /// Commits ingested so far.
    pub fn commits(&self) -> u64 {
        self.commits
    }

    /// Per-file churn accumulated so far.
    pub fn aggregator(&self) -> &ChurnAggregator {
        &self.aggregator
    }

    /// Resolve SLoC through `content` and reduce everything into a report.
    pub fn finish(self, content: &dyn ContentSource) -> AnalysisReport {
        let files = self.aggregator.into_files();
        let finalized = reduce::finalize(&files, content, &self.counter);

        AnalysisReport {
            commits_analyzed: self.commits,
            overall: finalized.overall,
            commit_counts: self.counters,
            files: finalized.files,
            cumulative_churn: reduce::cumulative_series(&self.chrono),
            change_sets: self.change_sets,
        }
    }
}

/// Run a whole analysis over `commits`.
///
/// A pure function of its inputs: the same commits and content yield the
/// same report.
pub fn analyze<'a, I>(
    commits: I,
    settings: AnalysisSettings,
    content: &dyn ContentSource,
) -> AnalysisReport
where
    I: IntoIterator<Item = &'a CommitRecord>,
{
    let mut run = AnalysisRun::new(settings);
    for commit in commits {
        run.ingest(commit);
    }
    run.finish(content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use evolens_core::{CategoryConfig, FileModification};
    use std::collections::HashMap;

    fn commit(ts: i64, message: &str, modifications: Vec<FileModification>) -> CommitRecord {
        CommitRecord {
            hash: format!("hash_{ts}"),
            author: "alice".into(),
            message: message.into(),
            timestamp: ts,
            modifications,
        }
    }

    fn settings() -> AnalysisSettings {
        AnalysisSettings::from_config(&EvolensConfig::default()).unwrap()
    }

    fn history() -> Vec<CommitRecord> {
        vec![
            commit(100, "feat: attitude filter", vec![FileModification::created("aocs/filter.c", 50)]),
            commit(
                200,
                "Fix critical bug in driver",
                vec![
                    FileModification::modified("aocs/filter.c", 10, 5),
                    FileModification::modified("README.md", 3, 0),
                ],
            ),
            commit(
                300,
                "Merge branch 'dev'",
                vec![],
            ),
            commit(
                400,
                "rework telemetry",
                vec![
                    FileModification::created("aocs/tm.h", 8),
                    FileModification::modified("aocs/old.c", 4, 4),
                ],
            ),
        ]
    }

    fn content() -> HashMap<String, String> {
        let mut content = HashMap::new();
        content.insert("aocs/filter.c".to_string(), "f();\n".repeat(40));
        content.insert("aocs/tm.h".to_string(), "/* tm */\nint tm;\n".to_string());
        content
    }

    #[test]
    fn end_to_end_metrics() {
        let report = analyze(&history(), settings(), &content());

        assert_eq!(report.commits_analyzed, 4);
        assert_eq!(report.commit_counts.get("feat"), 1);
        assert_eq!(report.commit_counts.get("fix"), 1);
        assert_eq!(report.commit_counts.get("refactor"), 1);
        assert_eq!(report.commit_counts.get("other"), 1);
        assert_eq!(report.commit_counts.total(), report.commits_analyzed);

        let paths: Vec<&str> = report.files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["aocs/filter.c", "aocs/old.c", "aocs/tm.h"]);

        let filter = &report.files[0];
        assert_eq!(filter.creation_churn, 50);
        assert_eq!(filter.refactoring_churn, 15);
        assert_eq!(filter.sloc, 40);
        assert_eq!(filter.ratio, 0.375);

        let old = &report.files[1];
        assert_eq!(old.sloc, 0);
        assert_eq!(old.ratio, 0.0);
        assert_eq!(old.refactoring_churn, 8);

        assert_eq!(report.overall.total_sloc, 41);
        assert_eq!(report.overall.total_refactoring_churn, 23);
        assert_eq!(report.overall.total_creation_churn, 58);
        assert_eq!(report.overall.files_absent, 1);
    }

    #[test]
    fn cumulative_churn_follows_commit_time() {
        let mut commits = history();
        commits.swap(0, 3);
        let report = analyze(&commits, settings(), &content());
        let cumulative: Vec<u64> = report.cumulative_churn.iter().map(|p| p.cumulative).collect();
        assert_eq!(cumulative, vec![0, 15, 15, 23]);
    }

    #[test]
    fn change_set_sizes_count_all_modifications() {
        let report = analyze(&history(), settings(), &content());
        assert_eq!(report.change_sets.commits_with(0), 1);
        assert_eq!(report.change_sets.commits_with(1), 1);
        assert_eq!(report.change_sets.commits_with(2), 2);
        assert_eq!(report.change_sets.total_commits(), 4);
        assert_eq!(report.change_sets.mean(), 1.25);
    }

    #[test]
    fn rerunning_is_idempotent() {
        let commits = history();
        let first = analyze(&commits, settings(), &content());
        let second = analyze(&commits, settings(), &content());
        assert_eq!(first, second);
    }

    #[test]
    fn custom_taxonomy_order_decides_category() {
        let config = EvolensConfig {
            taxonomy: vec![
                CategoryConfig::new("driver", &["driver"]),
                CategoryConfig::new("fix", &["fix", "bug"]),
            ],
            ..EvolensConfig::default()
        };
        let settings = AnalysisSettings::from_config(&config).unwrap();
        let report = analyze(&history(), settings, &content());
        assert_eq!(report.commit_counts.get("driver"), 1);
        assert_eq!(report.commit_counts.get("fix"), 0);
    }

    #[test]
    fn invalid_taxonomy_fails_settings() {
        let config = EvolensConfig {
            taxonomy: vec![CategoryConfig::new("other", &["x"])],
            ..EvolensConfig::default()
        };
        assert!(AnalysisSettings::from_config(&config).is_err());
    }

    #[test]
    fn empty_history_gives_empty_report() {
        let report = analyze(&[], settings(), &content());
        assert_eq!(report.commits_analyzed, 0);
        assert!(report.files.is_empty());
        assert!(report.cumulative_churn.is_empty());
        assert_eq!(report.overall.refactoring_ratio, 0.0);
        assert_eq!(report.change_sets.mean(), 0.0);
    }

    #[test]
    fn run_exposes_progress() {
        let mut run = AnalysisRun::new(settings());
        for c in &history() {
            run.ingest(c);
        }
        assert_eq!(run.commits(), 4);
        assert_eq!(run.aggregator().len(), 3);
    }
}
