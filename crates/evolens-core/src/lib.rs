//! Core types, configuration, and error handling for evolens.
//!
//! This crate provides the shared foundation used by the other evolens crates:
//! - [`EvolensError`] — unified error type using `thiserror` and `miette`
//! - [`EvolensConfig`] — configuration loaded from `.evolens.toml`
//! - The history data model: [`CommitRecord`], [`FileModification`], [`ChangeKind`]
//! - [`OutputFormat`] for report rendering

mod config;
mod error;
mod types;

pub use config::{
    default_taxonomy, CategoryConfig, EvolensConfig, HistoryConfig, ReportConfig, SlocConfig,
};
pub use error::EvolensError;
pub use types::{ChangeKind, CommitRecord, FileModification, OutputFormat};

/// A convenience `Result` type for evolens operations.
pub type Result<T> = std::result::Result<T, EvolensError>;
