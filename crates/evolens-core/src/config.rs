use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::EvolensError;

/// Top-level configuration loaded from `.evolens.toml`.
///
/// Supports layered resolution: CLI flags > local config > defaults.
///
/// # Examples
///
/// ```
/// use evolens_core::EvolensConfig;
///
/// let config = EvolensConfig::default();
/// assert_eq!(config.report.top_ratio, 5);
/// assert_eq!(config.taxonomy[0].name, "feat");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolensConfig {
    /// Which history to mine and which files to track.
    #[serde(default)]
    pub history: HistoryConfig,
    /// Comment syntax used when counting SLoC.
    #[serde(default)]
    pub sloc: SlocConfig,
    /// Report sizing.
    #[serde(default)]
    pub report: ReportConfig,
    /// Commit-message categories, matched in declaration order.
    #[serde(default = "default_taxonomy")]
    pub taxonomy: Vec<CategoryConfig>,
}

impl Default for EvolensConfig {
    fn default() -> Self {
        Self {
            history: HistoryConfig::default(),
            sloc: SlocConfig::default(),
            report: ReportConfig::default(),
            taxonomy: default_taxonomy(),
        }
    }
}

impl EvolensConfig {
    /// Load configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`EvolensError::Io`] if the file cannot be read, or
    /// [`EvolensError::Toml`] if the content is not valid TOML.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use evolens_core::EvolensConfig;
    /// use std::path::Path;
    ///
    /// let config = EvolensConfig::from_file(Path::new(".evolens.toml")).unwrap();
    /// ```
    pub fn from_file(path: &Path) -> Result<Self, EvolensError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`EvolensError::Toml`] if parsing fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use evolens_core::EvolensConfig;
    ///
    /// let toml = r#"
    /// [history]
    /// branch = "master"
    /// extensions = [".c", ".h"]
    /// "#;
    /// let config = EvolensConfig::from_toml(toml).unwrap();
    /// assert_eq!(config.history.branch.as_deref(), Some("master"));
    /// ```
    pub fn from_toml(content: &str) -> Result<Self, EvolensError> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }
}

/// History traversal and file selection settings.
///
/// # Examples
///
/// ```
/// use evolens_core::HistoryConfig;
///
/// let config = HistoryConfig::default();
/// assert!(config.branch.is_none());
/// assert!(config.extensions.contains(&".c".to_string()));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Repository location (default: current directory).
    #[serde(default = "default_repo_path")]
    pub repo_path: PathBuf,
    /// Branch to walk (default: HEAD).
    pub branch: Option<String>,
    /// Only include commits from the last N days (default: whole history).
    pub since_days: Option<u64>,
    /// File suffixes to track. Empty tracks every file.
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
    /// Glob patterns a path must match to be tracked. Empty matches all.
    #[serde(default)]
    pub include_paths: Vec<String>,
}

fn default_repo_path() -> PathBuf {
    PathBuf::from(".")
}

fn default_extensions() -> Vec<String> {
    [".c", ".h", ".java", ".hpp", ".di", ".uml", ".notation", ".genmodel"]
        .iter()
        .map(|e| e.to_string())
        .collect()
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            repo_path: default_repo_path(),
            branch: None,
            since_days: None,
            extensions: default_extensions(),
            include_paths: Vec::new(),
        }
    }
}

/// Comment syntax for the SLoC counter.
///
/// # Examples
///
/// ```
/// use evolens_core::SlocConfig;
///
/// let config = SlocConfig::default();
/// assert_eq!(config.line_comments, vec!["//", "#"]);
/// assert_eq!(config.block_open, "/*");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlocConfig {
    /// Single-line comment prefixes (default: `//` and `#`).
    #[serde(default = "default_line_comments")]
    pub line_comments: Vec<String>,
    /// Block comment opener (default: `/*`).
    #[serde(default = "default_block_open")]
    pub block_open: String,
    /// Block comment closer (default: `*/`).
    #[serde(default = "default_block_close")]
    pub block_close: String,
}

fn default_line_comments() -> Vec<String> {
    vec!["//".into(), "#".into()]
}

fn default_block_open() -> String {
    "/*".into()
}

fn default_block_close() -> String {
    "*/".into()
}

impl Default for SlocConfig {
    fn default() -> Self {
        Self {
            line_comments: default_line_comments(),
            block_open: default_block_open(),
            block_close: default_block_close(),
        }
    }
}

/// Report sizing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Files listed by refactoring ratio (default: 5).
    #[serde(default = "default_top_ratio")]
    pub top_ratio: usize,
    /// Files listed by absolute churn (default: 10).
    #[serde(default = "default_top_churn")]
    pub top_churn: usize,
}

fn default_top_ratio() -> usize {
    5
}

fn default_top_churn() -> usize {
    10
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            top_ratio: default_top_ratio(),
            top_churn: default_top_churn(),
        }
    }
}

/// One commit-message category and its case-insensitive keywords.
///
/// # Examples
///
/// ```
/// use evolens_core::CategoryConfig;
///
/// let fix = CategoryConfig::new("fix", &["fix", "bug"]);
/// assert_eq!(fix.keywords.len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryConfig {
    /// Category name reported in commit counts.
    pub name: String,
    /// Substrings that select this category.
    pub keywords: Vec<String>,
}

impl CategoryConfig {
    /// Build a category from string slices.
    pub fn new(name: &str, keywords: &[&str]) -> Self {
        Self {
            name: name.into(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }
}

/// The conventional-commit style taxonomy used when none is configured.
pub fn default_taxonomy() -> Vec<CategoryConfig> {
    vec![
        CategoryConfig::new("feat", &["feat", "feature"]),
        CategoryConfig::new("fix", &["fix", "bug", "hotfix", "repair"]),
        CategoryConfig::new("refactor", &["refactor", "restructure", "rework"]),
        CategoryConfig::new("chore", &["chore", "build", "ci"]),
        CategoryConfig::new("docs", &["docs", "documentation"]),
    ]
}
