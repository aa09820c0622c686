//! Commit-message classification against an ordered keyword taxonomy.

use std::collections::HashSet;
use std::fmt;

use evolens_core::{CategoryConfig, EvolensError};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize};

/// Catch-all category for messages that match no keyword.
pub const OTHER: &str = "other";

/// An ordered list of categories and their lower-cased keywords.
///
/// # Examples
///
/// ```
/// use evolens_core::CategoryConfig;
/// use evolens_metrics::classify::Taxonomy;
///
/// let taxonomy = Taxonomy::new(&[CategoryConfig::new("fix", &["fix", "bug"])]).unwrap();
/// assert_eq!(taxonomy.classify("Fix critical bug in driver"), "fix");
/// assert_eq!(taxonomy.classify("Add telemetry"), "other");
/// ```
#[derive(Debug, Clone)]
pub struct Taxonomy {
    categories: Vec<(String, Vec<String>)>,
}

impl Taxonomy {
    /// Build a taxonomy, keeping declaration order.
    ///
    /// # Errors
    ///
    /// Returns [`EvolensError::Config`] if a category is named `other`, a
    /// name is repeated, or a keyword is empty (it would match every
    /// message).
    pub fn new(categories: &[CategoryConfig]) -> Result<Self, EvolensError> {
        let mut seen = HashSet::new();
        let mut ordered = Vec::with_capacity(categories.len());

        for category in categories {
            if category.name.eq_ignore_ascii_case(OTHER) {
                return Err(EvolensError::Config(format!(
                    "taxonomy category '{OTHER}' is reserved for unmatched commits"
                )));
            }
            if !seen.insert(category.name.clone()) {
                return Err(EvolensError::Config(format!(
                    "taxonomy category '{}' is declared twice",
                    category.name
                )));
            }
            if category.keywords.iter().any(|k| k.trim().is_empty()) {
                return Err(EvolensError::Config(format!(
                    "taxonomy category '{}' has an empty keyword",
                    category.name
                )));
            }
            ordered.push((
                category.name.clone(),
                category.keywords.iter().map(|k| k.to_lowercase()).collect(),
            ));
        }

        Ok(Self {
            categories: ordered,
        })
    }

    /// Category names in declaration order, without `other`.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(|(name, _)| name.as_str())
    }

    /// Classify a commit message.
    ///
    /// The first category, in declaration order, with any keyword present
    /// as a case-insensitive substring wins; otherwise [`OTHER`].
    pub fn classify(&self, message: &str) -> &str {
        let message = message.to_lowercase();
        self.categories
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|k| message.contains(k.as_str())))
            .map_or(OTHER, |(name, _)| name.as_str())
    }
}

/// Commit count for one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryCount {
    /// Category name.
    pub category: String,
    /// Commits classified into it.
    pub commits: u64,
}

/// Per-category commit counts, in taxonomy order with `other` last.
///
/// Serializes as a map from category name to commit count, keeping
/// taxonomy order.
///
/// # Examples
///
/// ```
/// use evolens_core::default_taxonomy;
/// use evolens_metrics::classify::{CommitCounters, Taxonomy};
///
/// let taxonomy = Taxonomy::new(&default_taxonomy()).unwrap();
/// let mut counters = CommitCounters::new(&taxonomy);
/// counters.record(taxonomy.classify("docs: readme"));
/// counters.record(taxonomy.classify("wip"));
/// assert_eq!(counters.get("docs"), 1);
/// assert_eq!(counters.get("other"), 1);
/// assert_eq!(counters.total(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitCounters {
    counts: Vec<CategoryCount>,
}

impl CommitCounters {
    /// Zeroed counters for every category of `taxonomy` plus `other`.
    pub fn new(taxonomy: &Taxonomy) -> Self {
        let counts = taxonomy
            .names()
            .chain(std::iter::once(OTHER))
            .map(|name| CategoryCount {
                category: name.to_string(),
                commits: 0,
            })
            .collect();
        Self { counts }
    }

    /// Increment the counter for `category`.
    ///
    /// Unknown categories are counted as `other`.
    pub fn record(&mut self, category: &str) {
        let idx = self
            .counts
            .iter()
            .position(|c| c.category == category)
            .unwrap_or(self.counts.len() - 1);
        self.counts[idx].commits += 1;
    }

    /// Count for `category`, zero if unknown.
    pub fn get(&self, category: &str) -> u64 {
        self.counts
            .iter()
            .find(|c| c.category == category)
            .map_or(0, |c| c.commits)
    }

    /// Sum over all categories.
    pub fn total(&self) -> u64 {
        self.counts.iter().map(|c| c.commits).sum()
    }

    /// All categories in order, including empty ones.
    pub fn iter(&self) -> impl Iterator<Item = &CategoryCount> {
        self.counts.iter()
    }
}

impl Serialize for CommitCounters {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.counts.len()))?;
        for count in &self.counts {
            map.serialize_entry(&count.category, &count.commits)?;
        }
        map.end()
    }
}

struct CountsVisitor;

impl<'de> Visitor<'de> for CountsVisitor {
    type Value = CommitCounters;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of category name to commit count")
    }

    fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut counts = Vec::new();
        while let Some((category, commits)) = access.next_entry::<String, u64>()? {
            counts.push(CategoryCount { category, commits });
        }
        Ok(CommitCounters { counts })
    }
}

impl<'de> Deserialize<'de> for CommitCounters {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_map(CountsVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use evolens_core::default_taxonomy;

    fn taxonomy() -> Taxonomy {
        Taxonomy::new(&default_taxonomy()).unwrap()
    }

    #[test]
    fn first_declared_category_wins() {
        // "fix" and "refactor" both match; "fix" is declared first.
        assert_eq!(taxonomy().classify("Refactor to fix race"), "fix");
        // "feature" also contains "feat", which is declared before "fix".
        assert_eq!(taxonomy().classify("bugfix for feature flag"), "feat");
    }

    #[test]
    fn matching_is_case_insensitive() {
        assert_eq!(taxonomy().classify("HOTFIX: overflow"), "fix");
        let custom = Taxonomy::new(&[CategoryConfig::new("perf", &["SPEED"])]).unwrap();
        assert_eq!(custom.classify("speed up parser"), "perf");
    }

    #[test]
    fn substring_matching_is_literal() {
        // Plain substring match: "ci" is inside "decision".
        assert_eq!(taxonomy().classify("record decision"), "chore");
    }

    #[test]
    fn unmatched_message_is_other() {
        assert_eq!(taxonomy().classify("Initial import"), OTHER);
        assert_eq!(taxonomy().classify(""), OTHER);
    }

    #[test]
    fn reserved_other_category_is_rejected() {
        let err = Taxonomy::new(&[CategoryConfig::new("Other", &["misc"])]).unwrap_err();
        assert!(err.to_string().contains("reserved"));
    }

    #[test]
    fn duplicate_category_is_rejected() {
        let categories = [
            CategoryConfig::new("fix", &["fix"]),
            CategoryConfig::new("fix", &["bug"]),
        ];
        assert!(Taxonomy::new(&categories).is_err());
    }

    #[test]
    fn empty_keyword_is_rejected() {
        let err = Taxonomy::new(&[CategoryConfig::new("fix", &["fix", " "])]).unwrap_err();
        assert!(matches!(err, EvolensError::Config(_)));
    }

    #[test]
    fn counters_cover_taxonomy_plus_other() {
        let counters = CommitCounters::new(&taxonomy());
        let names: Vec<&str> = counters.iter().map(|c| c.category.as_str()).collect();
        assert_eq!(names, vec!["feat", "fix", "refactor", "chore", "docs", "other"]);
        assert_eq!(counters.total(), 0);
    }

    #[test]
    fn each_record_increments_exactly_one_category() {
        let taxonomy = taxonomy();
        let mut counters = CommitCounters::new(&taxonomy);
        let messages = ["feat: a", "fix b", "rework c", "misc", "docs", "ci: d", "bug"];
        for (i, msg) in messages.iter().enumerate() {
            counters.record(taxonomy.classify(msg));
            assert_eq!(counters.total(), i as u64 + 1);
        }
        assert_eq!(counters.get("fix"), 2);
        assert_eq!(counters.get("other"), 1);
    }

    #[test]
    fn unknown_category_counts_as_other() {
        let mut counters = CommitCounters::new(&taxonomy());
        counters.record("security");
        assert_eq!(counters.get(OTHER), 1);
        assert_eq!(counters.get("security"), 0);
    }

    #[test]
    fn counters_serialize_as_ordered_map() {
        let taxonomy = taxonomy();
        let mut counters = CommitCounters::new(&taxonomy);
        counters.record(taxonomy.classify("fix: overflow"));
        counters.record(taxonomy.classify("wip"));

        let json = serde_json::to_string(&counters).unwrap();
        assert_eq!(
            json,
            r#"{"feat":0,"fix":1,"refactor":0,"chore":0,"docs":0,"other":1}"#
        );

        let back: CommitCounters = serde_json::from_str(&json).unwrap();
        assert_eq!(back, counters);
    }

    #[test]
    fn empty_taxonomy_classifies_everything_as_other() {
        let taxonomy = Taxonomy::new(&[]).unwrap();
        let mut counters = CommitCounters::new(&taxonomy);
        counters.record(taxonomy.classify("fix: anything"));
        assert_eq!(counters.get(OTHER), 1);
    }
}
