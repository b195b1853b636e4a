//! Error types for generation

use crate::master::ArtifactKind;
use crate::rules::Stage;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, GenError>;

/// Target name used in errors raised while synthesizing the generic header
pub const GENERIC_TARGET: &str = "generic";

#[derive(Debug, Error)]
pub enum GenError {
    #[error("Canonical {artifact} artifact not readable at {path:?}: {source}")]
    MissingMasterArtifact {
        artifact: ArtifactKind,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Placeholder `{sentinel}` survived rewriting of the {artifact} artifact for '{target}'")]
    IncompleteSubstitution {
        target: String,
        artifact: ArtifactKind,
        sentinel: String,
    },

    #[error("Rule `{rule}` ({stage}) matched nothing in the {artifact} artifact for '{target}'")]
    RuleNotApplied {
        target: String,
        artifact: ArtifactKind,
        stage: Stage,
        rule: String,
    },

    #[error("Marker `{marker}` not found in the canonical {artifact} artifact")]
    MarkerNotFound {
        marker: String,
        artifact: ArtifactKind,
    },

    #[error("Malformed canonical {artifact} artifact: {detail}")]
    MalformedTemplate {
        artifact: ArtifactKind,
        detail: String,
    },

    #[error("Invalid rewrite pattern `{pattern}`: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Two artifacts would be written to '{0}'")]
    DuplicateOutput(String),

    #[error("Failed to write {path:?}: {source}")]
    WriteFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Registry error: {0}")]
    Registry(#[from] vecgen_profiles::ProfileError),
}

impl GenError {
    pub(crate) fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        GenError::WriteFailure {
            path: path.into(),
            source,
        }
    }
}
