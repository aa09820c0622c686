//! Source lines of code counting.
//!
//! Counts lines that carry code after blank lines, single-line comments
//! and block comments are removed. Counting is best-effort: input that is
//! not valid UTF-8 produces [`SlocOutcome::Unreadable`] instead of an error.

use evolens_core::SlocConfig;
use serde::{Deserialize, Serialize};

/// Outcome of counting one file's source lines.
///
/// # Examples
///
/// ```
/// use evolens_metrics::sloc::SlocOutcome;
///
/// assert_eq!(SlocOutcome::Counted(12).lines(), 12);
/// assert_eq!(SlocOutcome::Absent.lines(), 0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlocOutcome {
    /// The file was read and counted.
    Counted(u64),
    /// The file no longer exists.
    Absent,
    /// The file exists but could not be read or decoded.
    Unreadable,
}

impl SlocOutcome {
    /// Line count, zero unless counted.
    pub fn lines(self) -> u64 {
        match self {
            SlocOutcome::Counted(n) => n,
            SlocOutcome::Absent | SlocOutcome::Unreadable => 0,
        }
    }

    /// The reportable status of this outcome.
    pub fn status(self) -> SlocStatus {
        match self {
            SlocOutcome::Counted(_) => SlocStatus::Counted,
            SlocOutcome::Absent => SlocStatus::Absent,
            SlocOutcome::Unreadable => SlocStatus::Unreadable,
        }
    }
}

/// How a file's SLoC was obtained, as shown in reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlocStatus {
    /// Counted from current content.
    Counted,
    /// File no longer exists; SLoC is 0.
    Absent,
    /// File could not be read or decoded; SLoC is 0.
    Unreadable,
}

/// Counts non-blank, non-comment lines.
///
/// # Examples
///
/// ```
/// use evolens_metrics::sloc::SourceLineCounter;
///
/// let counter = SourceLineCounter::default();
/// let text = "// header\nint x = 1; /* note */\n\n/*\n * doc\n */\nreturn x;\n";
/// assert_eq!(counter.count(text), 2);
/// ```
#[derive(Debug, Clone)]
pub struct SourceLineCounter {
    line_comments: Vec<String>,
    block_open: String,
    block_close: String,
}

impl Default for SourceLineCounter {
    fn default() -> Self {
        Self::from_config(&SlocConfig::default())
    }
}

impl SourceLineCounter {
    /// Build a counter from configured comment syntax.
    ///
    /// Empty markers are ignored; an empty block opener or closer disables
    /// block comments.
    pub fn from_config(config: &SlocConfig) -> Self {
        let block_enabled = !config.block_open.is_empty() && !config.block_close.is_empty();
        Self {
            line_comments: config
                .line_comments
                .iter()
                .filter(|m| !m.is_empty())
                .cloned()
                .collect(),
            block_open: if block_enabled {
                config.block_open.clone()
            } else {
                String::new()
            },
            block_close: if block_enabled {
                config.block_close.clone()
            } else {
                String::new()
            },
        }
    }

    /// Count source lines in `text`.
    ///
    /// An unterminated block comment swallows the rest of the input.
    pub fn count(&self, text: &str) -> u64 {
        let mut in_block = false;
        text.lines()
            .filter(|line| self.line_has_code(line, &mut in_block))
            .count() as u64
    }

    /// Count source lines in raw bytes, reporting undecodable input.
    ///
    /// # Examples
    ///
    /// ```
    /// use evolens_metrics::sloc::{SlocOutcome, SourceLineCounter};
    ///
    /// let counter = SourceLineCounter::default();
    /// assert_eq!(counter.count_bytes(b"a();\n"), SlocOutcome::Counted(1));
    /// assert_eq!(counter.count_bytes(&[0xff, 0xfe, 0x00]), SlocOutcome::Unreadable);
    /// ```
    pub fn count_bytes(&self, bytes: &[u8]) -> SlocOutcome {
        match std::str::from_utf8(bytes) {
            Ok(text) => SlocOutcome::Counted(self.count(text)),
            Err(_) => SlocOutcome::Unreadable,
        }
    }

    fn line_has_code(&self, line: &str, in_block: &mut bool) -> bool {
        let mut rest = line;
        let mut has_code = false;

        loop {
            if *in_block {
                match rest.find(self.block_close.as_str()) {
                    Some(idx) => {
                        *in_block = false;
                        rest = &rest[idx + self.block_close.len()..];
                    }
                    None => return has_code,
                }
            }

            let trimmed = rest.trim();
            if trimmed.is_empty() {
                return has_code;
            }

            let line_comment = self
                .line_comments
                .iter()
                .filter_map(|m| trimmed.find(m.as_str()))
                .min();
            let block_start = if self.block_open.is_empty() {
                None
            } else {
                trimmed.find(self.block_open.as_str())
            };

            match (line_comment, block_start) {
                (Some(lc), Some(bs)) if lc < bs => {
                    return has_code || !trimmed[..lc].trim().is_empty();
                }
                (Some(lc), None) => {
                    return has_code || !trimmed[..lc].trim().is_empty();
                }
                (_, Some(bs)) => {
                    has_code |= !trimmed[..bs].trim().is_empty();
                    *in_block = true;
                    rest = &trimmed[bs + self.block_open.len()..];
                }
                (None, None) => return true,
            }
        }
    }
}
