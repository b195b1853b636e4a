//! The ordered registry of type profiles

use crate::canonical::Canonical;
use crate::error::{ProfileError, Result};
use crate::profile::TypeProfile;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// The registry shipped with vecgen
pub const BUILTIN_REGISTRY: &str = include_str!("../profiles.toml");

/// On-disk shape of a registry document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct RegistryDocument {
    /// Template conventions; the built-in VectorD conventions when omitted
    #[serde(default)]
    pub canonical: Canonical,

    /// Profiles in generation order
    #[serde(default, rename = "profile")]
    pub profiles: Vec<TypeProfile>,
}

/// Validated, read-only registry of type profiles
#[derive(Debug, Clone)]
pub struct Registry {
    canonical: Canonical,
    profiles: Vec<TypeProfile>,
    by_tag: IndexMap<String, usize>,
}

impl Registry {
    /// Build and validate a registry
    pub fn new(canonical: Canonical, profiles: Vec<TypeProfile>) -> Result<Self> {
        let mut by_tag = IndexMap::with_capacity(profiles.len());
        for (index, profile) in profiles.iter().enumerate() {
            if by_tag.insert(profile.short_tag.clone(), index).is_some() {
                return Err(ProfileError::DuplicateTag {
                    kind: "class tag",
                    tag: profile.short_tag.clone(),
                });
            }
        }

        let registry = Self {
            canonical,
            profiles,
            by_tag,
        };
        registry.validate()?;
        Ok(registry)
    }

    /// The built-in 14-profile registry
    pub fn builtin() -> Result<Self> {
        crate::from_str(BUILTIN_REGISTRY)
    }

    pub(crate) fn from_document(document: RegistryDocument) -> Result<Self> {
        Self::new(document.canonical, document.profiles)
    }

    /// Canonical template conventions
    pub fn canonical(&self) -> &Canonical {
        &self.canonical
    }

    /// Profiles in registry order
    pub fn profiles(&self) -> &[TypeProfile] {
        &self.profiles
    }

    /// Look a profile up by its class tag
    pub fn lookup(&self, short_tag: &str) -> Option<&TypeProfile> {
        self.by_tag.get(short_tag).map(|&index| &self.profiles[index])
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// Validate the registry as a whole
    pub fn validate(&self) -> Result<()> {
        self.canonical.validate()?;

        if self.profiles.is_empty() {
            return Err(ProfileError::Empty);
        }

        for profile in &self.profiles {
            profile.validate()?;
        }

        self.validate_tags()?;
        self.validate_include_labels()?;

        Ok(())
    }

    /// Class tags must not collide with each other or with the canonical tag.
    /// File tags are compared case-insensitively since the outputs may land on
    /// a case-folding filesystem.
    fn validate_tags(&self) -> Result<()> {
        let mut file_tags = HashSet::new();
        file_tags.insert(self.canonical.file_tag.to_ascii_lowercase());
        // The generic header is named after the type parameter
        file_tags.insert(self.canonical.generic_param.to_ascii_lowercase());

        for profile in &self.profiles {
            if profile.short_tag == self.canonical.short_tag {
                return Err(ProfileError::InvalidTag {
                    kind: "class tag",
                    tag: profile.short_tag.clone(),
                    reason: "collides with the canonical template tag".to_string(),
                });
            }

            if !file_tags.insert(profile.file_tag.to_ascii_lowercase()) {
                return Err(ProfileError::DuplicateTag {
                    kind: "file tag",
                    tag: profile.file_tag.clone(),
                });
            }
        }

        Ok(())
    }

    fn validate_include_labels(&self) -> Result<()> {
        for profile in &self.profiles {
            let expected = self.canonical.include_label_for(&profile.file_tag);
            if profile.include_label != expected {
                return Err(ProfileError::InconsistentIncludeLabel {
                    tag: profile.short_tag.clone(),
                    expected,
                    found: profile.include_label.clone(),
                });
            }
        }
        Ok(())
    }
}
