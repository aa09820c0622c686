use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One commit as produced by a history source.
///
/// Records are consumed once per traversal and never mutated.
///
/// # Examples
///
/// ```
/// use evolens_core::{ChangeKind, CommitRecord, FileModification};
///
/// let record = CommitRecord {
///     hash: "abc12345".into(),
///     author: "alice".into(),
///     message: "fix: driver timeout".into(),
///     timestamp: 1_700_000_000,
///     modifications: vec![FileModification::modified("src/driver.c", 10, 5)],
/// };
/// assert_eq!(record.modifications[0].kind, ChangeKind::Modified);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitRecord {
    /// Commit identifier.
    pub hash: String,
    /// Author name.
    #[serde(default)]
    pub author: String,
    /// Full commit message.
    #[serde(default)]
    pub message: String,
    /// Committer time as unix seconds.
    pub timestamp: i64,
    /// Files touched by this commit, in diff order.
    #[serde(default)]
    pub modifications: Vec<FileModification>,
}

impl CommitRecord {
    /// Lines added across every modification in the commit.
    pub fn insertions(&self) -> u64 {
        self.modifications.iter().map(|m| m.added_lines).sum()
    }

    /// Lines deleted across every modification in the commit.
    pub fn deletions(&self) -> u64 {
        self.modifications.iter().map(|m| m.deleted_lines).sum()
    }
}

/// A single file change within a commit.
///
/// Missing line counts in deserialized input are treated as zero.
///
/// # Examples
///
/// ```
/// use evolens_core::FileModification;
///
/// let m: FileModification =
///     serde_json::from_str(r#"{"newPath": "a.c", "kind": "modified"}"#).unwrap();
/// assert_eq!(m.churn(), 0);
/// assert_eq!(m.path(), Some("a.c"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileModification {
    /// Path after the change; `None` when the file was deleted.
    #[serde(default)]
    pub new_path: Option<String>,
    /// Path before the change; `None` when the file was created.
    #[serde(default)]
    pub old_path: Option<String>,
    /// Lines added.
    #[serde(default)]
    pub added_lines: u64,
    /// Lines deleted.
    #[serde(default)]
    pub deleted_lines: u64,
    /// Kind of change.
    pub kind: ChangeKind,
}

impl FileModification {
    /// A newly created file.
    pub fn created(path: impl Into<String>, added: u64) -> Self {
        Self {
            new_path: Some(path.into()),
            old_path: None,
            added_lines: added,
            deleted_lines: 0,
            kind: ChangeKind::Created,
        }
    }

    /// An in-place modification.
    pub fn modified(path: impl Into<String>, added: u64, deleted: u64) -> Self {
        let path = path.into();
        Self {
            new_path: Some(path.clone()),
            old_path: Some(path),
            added_lines: added,
            deleted_lines: deleted,
            kind: ChangeKind::Modified,
        }
    }

    /// A rename from `from` to `to`, possibly with edits.
    pub fn renamed(from: impl Into<String>, to: impl Into<String>, added: u64, deleted: u64) -> Self {
        Self {
            new_path: Some(to.into()),
            old_path: Some(from.into()),
            added_lines: added,
            deleted_lines: deleted,
            kind: ChangeKind::Renamed,
        }
    }

    /// A deleted file.
    pub fn deleted(path: impl Into<String>, deleted: u64) -> Self {
        Self {
            new_path: None,
            old_path: Some(path.into()),
            added_lines: 0,
            deleted_lines: deleted,
            kind: ChangeKind::Deleted,
        }
    }

    /// `added_lines + deleted_lines`.
    pub fn churn(&self) -> u64 {
        self.added_lines + self.deleted_lines
    }

    /// The new path, falling back to the old one for deletions.
    pub fn path(&self) -> Option<&str> {
        self.new_path.as_deref().or(self.old_path.as_deref())
    }
}

/// Kind of a file modification.
///
/// # Examples
///
/// ```
/// use evolens_core::ChangeKind;
///
/// assert_eq!(ChangeKind::Renamed.to_string(), "renamed");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    /// New file.
    Created,
    /// Existing file modified in place.
    Modified,
    /// File moved to a new path.
    Renamed,
    /// File removed.
    Deleted,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeKind::Created => write!(f, "created"),
            ChangeKind::Modified => write!(f, "modified"),
            ChangeKind::Renamed => write!(f, "renamed"),
            ChangeKind::Deleted => write!(f, "deleted"),
        }
    }
}

/// Output format for CLI subcommands.
///
/// Implements [`FromStr`] so it can be used directly with `clap` argument parsing.
///
/// # Examples
///
/// ```
/// use evolens_core::OutputFormat;
///
/// let fmt: OutputFormat = "json".parse().unwrap();
/// assert_eq!(fmt, OutputFormat::Json);
///
/// let fmt: OutputFormat = "md".parse().unwrap();
/// assert_eq!(fmt, OutputFormat::Markdown);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable tables and summaries.
    #[default]
    Text,
    /// Machine-readable JSON with camelCase keys.
    Json,
    /// Markdown-formatted output.
    Markdown,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Markdown => write!(f, "markdown"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            other => Err(format!("unknown output format: {other}")),
        }
    }
}
