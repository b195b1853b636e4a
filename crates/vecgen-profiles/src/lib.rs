//! vecgen type profile registry
//!
//! This crate describes every element type the vector family is generated
//! for, together with the conventions of the canonical double-precision
//! template those types are derived from. Registries are TOML documents; the
//! built-in one is embedded at compile time.

pub mod canonical;
pub mod error;
pub mod profile;
pub mod registry;

pub use canonical::Canonical;
pub use error::{ProfileError, Result};
pub use profile::{SemanticCategory, TypeProfile};
pub use registry::{Registry, BUILTIN_REGISTRY};

use registry::RegistryDocument;
use std::path::Path;

/// Parse a registry from a file path
pub fn from_path(path: impl AsRef<Path>) -> Result<Registry> {
    let contents =
        std::fs::read_to_string(path.as_ref()).map_err(|e| ProfileError::Io(e.to_string()))?;
    from_str(&contents)
}

/// Parse a registry from a string
pub fn from_str(s: &str) -> Result<Registry> {
    let document: RegistryDocument =
        toml::from_str(s).map_err(|e| ProfileError::Parse(e.to_string()))?;
    Registry::from_document(document)
}
