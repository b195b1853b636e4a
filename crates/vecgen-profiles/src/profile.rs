//! Type profile definitions

use crate::error::{ProfileError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification that decides which rewrite rules apply to a profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SemanticCategory {
    /// Integers wide enough and floating point types; no adaptation needed
    StandardNumeric,
    /// `bool`: arithmetic that makes no sense is pruned
    Boolean,
    /// 8/16-bit integers: arithmetic promotes to `int` and must be narrowed
    NarrowInteger,
    /// `wchar_t`: narrowed like integers, streamed through wide streams
    WideCharacter,
}

impl SemanticCategory {
    pub const ALL: [SemanticCategory; 4] = [
        SemanticCategory::StandardNumeric,
        SemanticCategory::Boolean,
        SemanticCategory::NarrowInteger,
        SemanticCategory::WideCharacter,
    ];

    /// Whether arithmetic results have to be cast back to the element type
    pub fn needs_narrowing_cast(self) -> bool {
        !matches!(self, SemanticCategory::StandardNumeric)
    }

    /// Whether fields must be promoted before being inserted into a stream
    pub fn needs_printable_stream(self) -> bool {
        matches!(
            self,
            SemanticCategory::NarrowInteger | SemanticCategory::WideCharacter
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SemanticCategory::StandardNumeric => "standard-numeric",
            SemanticCategory::Boolean => "boolean",
            SemanticCategory::NarrowInteger => "narrow-integer",
            SemanticCategory::WideCharacter => "wide-character",
        }
    }
}

impl fmt::Display for SemanticCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One target element type
///
/// Every attribute is required; a registry entry that omits one fails to
/// deserialize.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TypeProfile {
    /// Type token as it appears in generated source (`std::uint8_t`)
    pub symbol: String,

    /// Tag naming arity-specific classes (`Vector3ui8`)
    pub short_tag: String,

    /// Tag naming the generated files (`VectorUi8.h`)
    pub file_tag: String,

    /// Zero-value initializer (`0U`, `false`, `0.f`)
    pub default_literal: String,

    /// Size in bytes on the reference platform
    pub byte_size: u32,

    /// Human-readable value range
    pub range: String,

    /// Interface file included by the generated implementation
    pub include_label: String,

    /// Rule-selection category
    pub category: SemanticCategory,
}

impl TypeProfile {
    /// Validate the attributes of a single profile
    pub fn validate(&self) -> Result<()> {
        check_tag("class tag", &self.short_tag)?;
        check_tag("file tag", &self.file_tag)?;

        if self.symbol.trim().is_empty() {
            return Err(self.invalid("symbol cannot be empty"));
        }
        if self.default_literal.trim().is_empty() {
            return Err(self.invalid("default literal cannot be empty"));
        }
        if self.range.trim().is_empty() {
            return Err(self.invalid("range cannot be empty"));
        }
        if self.byte_size == 0 {
            return Err(self.invalid("byte size must be non-zero"));
        }

        Ok(())
    }

    fn invalid(&self, reason: &str) -> ProfileError {
        ProfileError::Validation(format!("profile '{}': {}", self.short_tag, reason))
    }
}

/// A tag is appended to `Vector<arity>` and to file stems, so it has to be an
/// identifier fragment that cannot be read as part of the arity.
pub(crate) fn check_tag(kind: &'static str, tag: &str) -> Result<()> {
    let invalid = |reason: &str| ProfileError::InvalidTag {
        kind,
        tag: tag.to_string(),
        reason: reason.to_string(),
    };

    let Some(first) = tag.chars().next() else {
        return Err(invalid("cannot be empty"));
    };
    if first.is_ascii_digit() {
        return Err(invalid("cannot start with a digit"));
    }
    if !tag.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(invalid(
            "can only contain ASCII letters, digits and underscores",
        ));
    }
    Ok(())
}
