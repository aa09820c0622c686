//! History sources and file-content access for evolens.
//!
//! Mines commit history using git2 (or loads records mined elsewhere) and
//! resolves the current content of tracked files, either from the working
//! copy or from the tip of the analyzed branch.

pub mod content;
pub mod mining;
pub mod records;

#[cfg(test)]
mod testing;
