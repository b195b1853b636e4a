//! Conventions of the canonical double-precision template
//!
//! Every generated artifact is derived from one master pair (`VectorD.h`,
//! `VectorD.cpp`). The values here are the literal placeholders that the
//! rewrite rules look for in that pair, and the naming scheme used for the
//! files written next to it.

use serde::{Deserialize, Serialize};

/// Canonical template conventions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Canonical {
    /// Shared class/file name prefix (`Vector`)
    pub class_prefix: String,

    /// Element type token in the template (`std::double_t`)
    pub symbol: String,

    /// Class tag following the arity digit (`Vector3d`)
    pub short_tag: String,

    /// File tag following the prefix (`VectorD.h`)
    pub file_tag: String,

    /// Zero-value initializer used for default arguments
    pub default_literal: String,

    /// Value of the `Bytes:` annotation
    pub byte_size: u32,

    /// Value of the `Range:` annotation
    pub range: String,

    /// Export-visibility annotation token
    pub export_token: String,

    /// Type parameter used by the synthesized generic header
    pub generic_param: String,

    /// Interface (declaration) file extension
    pub interface_extension: String,

    /// Implementation (body) file extension
    pub implementation_extension: String,
}

impl Default for Canonical {
    fn default() -> Self {
        Self {
            class_prefix: "Vector".to_string(),
            symbol: "std::double_t".to_string(),
            short_tag: "d".to_string(),
            file_tag: "D".to_string(),
            default_literal: "0.0".to_string(),
            byte_size: 8,
            range: "1.7E +/- 308  precision: (15 digits)".to_string(),
            export_token: "PFO_API".to_string(),
            generic_param: "T".to_string(),
            interface_extension: "h".to_string(),
            implementation_extension: "cpp".to_string(),
        }
    }
}

impl Canonical {
    /// File stem of the master pair (`VectorD`)
    pub fn base_name(&self) -> String {
        format!("{}{}", self.class_prefix, self.file_tag)
    }

    /// File stem for a given file tag (`VectorUi8`)
    pub fn stem_for(&self, file_tag: &str) -> String {
        format!("{}{}", self.class_prefix, file_tag)
    }

    /// Interface file name that an implementation with this file tag includes
    pub fn include_label_for(&self, file_tag: &str) -> String {
        format!("{}.{}", self.stem_for(file_tag), self.interface_extension)
    }

    /// The master implementation's include label (`VectorD.h`)
    pub fn include_label(&self) -> String {
        self.include_label_for(&self.file_tag)
    }

    /// Class name for one arity (`Vector3d`)
    pub fn class_name(&self, arity: u8) -> String {
        format!("{}{}{}", self.class_prefix, arity, self.short_tag)
    }

    /// Generic class name for one arity (`Vector3`)
    pub fn generic_class_name(&self, arity: u8) -> String {
        format!("{}{}", self.class_prefix, arity)
    }

    /// File name of the synthesized generic header (`VectorT.h`)
    pub fn generic_file_name(&self) -> String {
        format!(
            "{}{}.{}",
            self.class_prefix, self.generic_param, self.interface_extension
        )
    }

    pub(crate) fn validate(&self) -> crate::Result<()> {
        let required = [
            ("class_prefix", &self.class_prefix),
            ("symbol", &self.symbol),
            ("short_tag", &self.short_tag),
            ("file_tag", &self.file_tag),
            ("default_literal", &self.default_literal),
            ("range", &self.range),
            ("export_token", &self.export_token),
            ("generic_param", &self.generic_param),
            ("interface_extension", &self.interface_extension),
            ("implementation_extension", &self.implementation_extension),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(crate::ProfileError::Validation(format!(
                    "canonical.{} cannot be empty",
                    field
                )));
            }
        }
        crate::profile::check_tag("canonical class tag", &self.short_tag)?;
        crate::profile::check_tag("canonical file tag", &self.file_tag)?;
        if self.interface_extension == self.implementation_extension {
            return Err(crate::ProfileError::Validation(
                "interface and implementation extensions must differ".to_string(),
            ));
        }
        Ok(())
    }
}
