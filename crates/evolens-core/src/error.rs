use std::path::PathBuf;

/// Errors that can occur across evolens.
///
/// Library crates return this type directly; the binary reports it through
/// `miette`, so variants carry diagnostic codes and help text.
///
/// # Examples
///
/// ```
/// use evolens_core::EvolensError;
///
/// let err = EvolensError::Config("taxonomy category 'other' is reserved".into());
/// assert!(err.to_string().contains("reserved"));
/// ```
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum EvolensError {
    /// Filesystem I/O failure.
    #[error("IO error: {0}")]
    #[diagnostic(code(evolens::io))]
    Io(#[from] std::io::Error),

    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    #[diagnostic(
        code(evolens::config),
        help("check the [history], [sloc] and [[taxonomy]] sections of .evolens.toml")
    )]
    Config(String),

    /// Git operation failure.
    #[error("git error: {0}")]
    #[diagnostic(code(evolens::git))]
    Git(String),

    /// Invalid glob pattern in a path filter.
    #[error("invalid path pattern '{pattern}': {reason}")]
    #[diagnostic(code(evolens::pattern))]
    Pattern {
        /// The offending pattern.
        pattern: String,
        /// Why it failed to compile.
        reason: String,
    },

    /// JSON serialization / deserialization failure.
    #[error("serialization error: {0}")]
    #[diagnostic(code(evolens::serialization))]
    Serialization(#[from] serde_json::Error),

    /// TOML deserialization failure.
    #[error("TOML parse error: {0}")]
    #[diagnostic(code(evolens::toml))]
    Toml(#[from] toml::de::Error),

    /// A required file was not found.
    #[error("file not found: {}", .0.display())]
    #[diagnostic(code(evolens::not_found))]
    FileNotFound(PathBuf),
}
