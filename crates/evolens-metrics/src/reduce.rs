//! Reduction of accumulated churn into final metrics.
//!
//! Resolves each tracked file's current SLoC, derives per-file and overall
//! refactoring ratios, folds the per-commit churn into a cumulative series,
//! and ranks files.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use evolens_history::content::{ContentSource, FileContent};
use serde::{Deserialize, Serialize};

use crate::churn::FileMetric;
use crate::sloc::{SlocOutcome, SlocStatus, SourceLineCounter};

/// Final metrics for one tracked file.
///
/// # Examples
///
/// ```
/// use evolens_metrics::reduce::FileReport;
/// use evolens_metrics::sloc::SlocStatus;
///
/// let report = FileReport {
///     path: "src/drv.c".into(),
///     creation_churn: 50,
///     refactoring_churn: 15,
///     revisions: 2,
///     sloc: 40,
///     sloc_status: SlocStatus::Counted,
///     ratio: 0.375,
/// };
/// assert_eq!(report.total_churn(), 65);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileReport {
    /// File path relative to repo root.
    pub path: String,
    /// Lines from the commit that created the file.
    pub creation_churn: u64,
    /// Lines from every later change.
    pub refactoring_churn: u64,
    /// Number of modifications observed.
    pub revisions: u32,
    /// Current source lines, 0 when absent or unreadable.
    pub sloc: u64,
    /// How `sloc` was obtained.
    pub sloc_status: SlocStatus,
    /// `refactoring_churn / sloc`, 0 when `sloc` is 0.
    pub ratio: f64,
}

impl FileReport {
    /// `creation_churn + refactoring_churn`.
    pub fn total_churn(&self) -> u64 {
        self.creation_churn + self.refactoring_churn
    }
}

/// Totals over every tracked file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverallTotals {
    /// Sum of current SLoC.
    pub total_sloc: u64,
    /// Sum of refactoring churn.
    pub total_refactoring_churn: u64,
    /// Sum of creation churn.
    pub total_creation_churn: u64,
    /// `total_refactoring_churn / total_sloc`, 0 when `total_sloc` is 0.
    pub refactoring_ratio: f64,
    /// Number of tracked files.
    pub files_tracked: usize,
    /// Tracked files no longer present.
    pub files_absent: usize,
    /// Tracked files that could not be read or decoded.
    pub files_unreadable: usize,
}

/// Per-file reports plus overall totals.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalizedMetrics {
    /// Overall totals.
    pub overall: OverallTotals,
    /// Per-file reports, ordered by path.
    pub files: Vec<FileReport>,
}

/// Refactoring churn of one commit, in traversal order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChronoPoint {
    /// Committer time as unix seconds.
    pub timestamp: i64,
    /// Refactoring churn contributed by the commit.
    pub churn: u64,
}

/// One step of the cumulative churn series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CumulativePoint {
    /// Committer time as unix seconds.
    pub timestamp: i64,
    /// Refactoring churn contributed by the commit.
    pub churn: u64,
    /// Running total up to and including this commit.
    pub cumulative: u64,
}

/// `numerator / denominator`, defined as 0 when the denominator is 0.
pub fn ratio(numerator: u64, denominator: u64) -> f64 {
    if denominator > 0 {
        numerator as f64 / denominator as f64
    } else {
        0.0
    }
}

/// Resolve SLoC for every tracked file and compute ratios.
///
/// Files that are absent or unreadable get SLoC 0 and ratio 0; their churn
/// is kept as accumulated.
///
/// # Examples
///
/// ```
/// use std::collections::{BTreeMap, HashMap};
/// use evolens_metrics::churn::FileMetric;
/// use evolens_metrics::reduce::finalize;
/// use evolens_metrics::sloc::SourceLineCounter;
///
/// let mut files = BTreeMap::new();
/// files.insert("m.c".to_string(), FileMetric { creation_churn: 50, refactoring_churn: 15, revisions: 2 });
///
/// let mut content = HashMap::new();
/// content.insert("m.c".to_string(), "x();\n".repeat(40));
///
/// let metrics = finalize(&files, &content, &SourceLineCounter::default());
/// assert_eq!(metrics.files[0].sloc, 40);
/// assert_eq!(metrics.files[0].ratio, 0.375);
/// ```
pub fn finalize(
    files: &BTreeMap<String, FileMetric>,
    content: &dyn ContentSource,
    counter: &SourceLineCounter,
) -> FinalizedMetrics {
    let mut overall = OverallTotals {
        files_tracked: files.len(),
        ..OverallTotals::default()
    };
    let mut reports = Vec::with_capacity(files.len());

    for (path, metric) in files {
        let outcome = match content.read(path) {
            FileContent::Bytes(bytes) => counter.count_bytes(&bytes),
            FileContent::Absent => SlocOutcome::Absent,
            FileContent::Unreadable(_) => SlocOutcome::Unreadable,
        };
        match outcome {
            SlocOutcome::Absent => overall.files_absent += 1,
            SlocOutcome::Unreadable => overall.files_unreadable += 1,
            SlocOutcome::Counted(_) => {}
        }

        let sloc = outcome.lines();
        overall.total_sloc += sloc;
        overall.total_refactoring_churn += metric.refactoring_churn;
        overall.total_creation_churn += metric.creation_churn;

        reports.push(FileReport {
            path: path.clone(),
            creation_churn: metric.creation_churn,
            refactoring_churn: metric.refactoring_churn,
            revisions: metric.revisions,
            sloc,
            sloc_status: outcome.status(),
            ratio: ratio(metric.refactoring_churn, sloc),
        });
    }

    overall.refactoring_ratio = ratio(overall.total_refactoring_churn, overall.total_sloc);

    FinalizedMetrics {
        overall,
        files: reports,
    }
}

/// Sort points by timestamp (stable) and accumulate their churn.
///
/// # Examples
///
/// ```
/// use evolens_metrics::reduce::{cumulative_series, ChronoPoint};
///
/// let points = [
///     ChronoPoint { timestamp: 2, churn: 10 },
///     ChronoPoint { timestamp: 1, churn: 0 },
///     ChronoPoint { timestamp: 3, churn: 5 },
/// ];
/// let series: Vec<u64> = cumulative_series(&points).iter().map(|p| p.cumulative).collect();
/// assert_eq!(series, vec![0, 10, 15]);
/// ```
pub fn cumulative_series(points: &[ChronoPoint]) -> Vec<CumulativePoint> {
    let mut sorted = points.to_vec();
    sorted.sort_by_key(|p| p.timestamp);

    let mut running = 0u64;
    sorted
        .into_iter()
        .map(|p| {
            running += p.churn;
            CumulativePoint {
                timestamp: p.timestamp,
                churn: p.churn,
                cumulative: running,
            }
        })
        .collect()
}

/// Top `k` files by refactoring ratio, descending, ties by path.
pub fn top_by_ratio(files: &[FileReport], k: usize) -> Vec<&FileReport> {
    top_k(files, k, |a, b| b.ratio.total_cmp(&a.ratio))
}

/// Top `k` files by total churn, descending, ties by path.
pub fn top_by_churn(files: &[FileReport], k: usize) -> Vec<&FileReport> {
    top_k(files, k, |a, b| b.total_churn().cmp(&a.total_churn()))
}

fn top_k<F>(files: &[FileReport], k: usize, order: F) -> Vec<&FileReport>
where
    F: Fn(&FileReport, &FileReport) -> Ordering,
{
    let mut ranked: Vec<&FileReport> = files.iter().collect();
    ranked.sort_by(|a, b| order(a, b).then_with(|| a.path.cmp(&b.path)));
    ranked.truncate(k);
    ranked
}
