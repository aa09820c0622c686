//! Commit records supplied as JSON by an external miner.
//!
//! The file holds an array of [`CommitRecord`] objects with camelCase keys.
//! Absent line counts read as zero.

use std::path::Path;

use evolens_core::{CommitRecord, EvolensError};

/// Load commit records from a JSON file.
///
/// # Errors
///
/// Returns [`EvolensError::FileNotFound`] if `path` does not exist,
/// [`EvolensError::Io`] if it cannot be read, or
/// [`EvolensError::Serialization`] if it is not a valid record array.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use evolens_history::records::load_records;
///
/// let commits = load_records(Path::new("history.json")).unwrap();
/// println!("{} commits", commits.len());
/// ```
pub fn load_records(path: &Path) -> Result<Vec<CommitRecord>, EvolensError> {
    if !path.exists() {
        return Err(EvolensError::FileNotFound(path.to_path_buf()));
    }
    let content = std::fs::read_to_string(path)?;
    parse_records(&content)
}

/// Parse commit records from a JSON string.
///
/// # Errors
///
/// Returns [`EvolensError::Serialization`] on malformed input.
///
/// # Examples
///
/// ```
/// use evolens_history::records::parse_records;
///
/// let json = r#"[{"hash": "a1", "timestamp": 10, "message": "feat: x"}]"#;
/// let commits = parse_records(json).unwrap();
/// assert_eq!(commits[0].message, "feat: x");
/// assert!(commits[0].modifications.is_empty());
/// ```
pub fn parse_records(content: &str) -> Result<Vec<CommitRecord>, EvolensError> {
    let records: Vec<CommitRecord> = serde_json::from_str(content)?;
    Ok(records)
}
