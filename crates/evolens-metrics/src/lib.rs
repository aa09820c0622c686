//! Software-evolution metrics over a commit stream.
//!
//! Classifies commits by message keywords, splits per-file churn into
//! creation and refactoring churn, counts current source lines, and reduces
//! everything into refactoring ratios, a cumulative churn series and a
//! change-set size distribution.

pub mod churn;
pub mod classify;
pub mod pipeline;
pub mod reduce;
pub mod report;
pub mod sloc;
