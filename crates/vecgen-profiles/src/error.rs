//! Error types for registry parsing and validation

use thiserror::Error;

/// Result type for registry operations
pub type Result<T> = std::result::Result<T, ProfileError>;

/// Errors that can occur while loading a type profile registry
#[derive(Debug, Error)]
pub enum ProfileError {
    /// I/O error reading the registry file
    #[error("I/O error: {0}")]
    Io(String),

    /// TOML parsing error (a profile missing an attribute lands here)
    #[error("Failed to parse profile registry: {0}")]
    Parse(String),

    /// The registry declares no profiles at all
    #[error("Profile registry is empty")]
    Empty,

    /// Two profiles share a class tag or file tag
    #[error("Duplicate {kind} '{tag}'")]
    DuplicateTag { kind: &'static str, tag: String },

    /// A tag that cannot be used as an identifier fragment
    #[error("Invalid {kind} '{tag}': {reason}")]
    InvalidTag {
        kind: &'static str,
        tag: String,
        reason: String,
    },

    /// The include label disagrees with the file tag
    #[error("Profile '{tag}' includes '{found}' but its interface file is '{expected}'")]
    InconsistentIncludeLabel {
        tag: String,
        expected: String,
        found: String,
    },

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),
}
