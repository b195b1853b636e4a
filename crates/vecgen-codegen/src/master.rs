//! The canonical master template
//!
//! The master pair is read once per run and never mutated. On load the
//! implementation is split into arity-keyed sections:
//!
//! ```text
//! #include "VectorD.h"          preamble (namespace opening)
//!     // Vector2d               section 2
//!     ...
//!     // Vector10d              section 10
//!     // End                    trailer
//! }
//! ```
//!
//! and the interface's stream helpers (`// overloads for the << operator` up
//! to `// End`) are located. All nine sections must be present exactly once
//! and in ascending order, otherwise loading fails.

use crate::error::{GenError, Result};
use std::fmt;
use std::ops::{Range, RangeInclusive};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use vecgen_profiles::Canonical;

/// Supported arities
pub const ARITIES: RangeInclusive<u8> = 2..=10;

/// Every field name used anywhere in the canonical template
pub const FIELD_ALPHABET: [&str; 13] = [
    "a", "b", "c", "d", "e", "f", "g", "h", "i", "j", "x", "y", "z",
];

const POSITIONAL_FIELDS: [&str; 3] = ["x", "y", "z"];
const LETTERED_FIELDS: [&str; 10] = ["a", "b", "c", "d", "e", "f", "g", "h", "i", "j"];

/// Opens the free-standing stream helpers in the interface
pub const HELPERS_MARKER: &str = "// overloads for the << operator";

/// Closes the last section of either artifact
pub const END_MARKER: &str = "// End";

/// Field names of one arity: `x, y` and `x, y, z` for 2 and 3, letters from
/// `a` for 4 through 10
pub fn field_letters(arity: u8) -> &'static [&'static str] {
    match arity {
        2 | 3 => &POSITIONAL_FIELDS[..arity as usize],
        4..=10 => &LETTERED_FIELDS[..arity as usize],
        _ => &[],
    }
}

/// The two artifacts of a template pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ArtifactKind {
    /// Class declarations and stream helpers (`.h`)
    Interface,
    /// Member definitions (`.cpp`)
    Implementation,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 2] = [ArtifactKind::Interface, ArtifactKind::Implementation];

    pub fn extension(self, canonical: &Canonical) -> &str {
        match self {
            ArtifactKind::Interface => &canonical.interface_extension,
            ArtifactKind::Implementation => &canonical.implementation_extension,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ArtifactKind::Interface => "interface",
            ArtifactKind::Implementation => "implementation",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Byte span of one arity's definitions in the canonical implementation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArityRegion {
    pub arity: u8,
    pub span: Range<usize>,
}

/// Validated layout of the master pair
#[derive(Debug, Clone)]
pub struct TemplateSections {
    namespace: String,
    arities: Vec<ArityRegion>,
    helpers: Range<usize>,
}

impl TemplateSections {
    /// Locate and validate every section boundary
    pub fn locate(canonical: &Canonical, interface: &str, implementation: &str) -> Result<Self> {
        let arities = locate_arities(canonical, implementation)?;
        let namespace = locate_namespace(&implementation[..arities[0].span.start])?;
        let helpers = locate_helpers(interface)?;

        Ok(Self {
            namespace,
            arities,
            helpers,
        })
    }

    /// Namespace the canonical definitions live in (`util::math`)
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Arity sections in ascending order
    pub fn arities(&self) -> &[ArityRegion] {
        &self.arities
    }

    /// Span of the stream helpers in the interface
    pub fn helpers(&self) -> Range<usize> {
        self.helpers.clone()
    }
}

/// Lines (terminator included) paired with their starting byte offset
pub(crate) fn lines_with_offsets(text: &str) -> impl Iterator<Item = (usize, &str)> {
    let mut offset = 0;
    text.split_inclusive('\n').map(move |line| {
        let start = offset;
        offset += line.len();
        (start, line)
    })
}

fn locate_arities(canonical: &Canonical, implementation: &str) -> Result<Vec<ArityRegion>> {
    let markers: Vec<(u8, String)> = ARITIES
        .map(|arity| (arity, format!("// {}", canonical.class_name(arity))))
        .collect();

    let mut starts: Vec<Option<usize>> = vec![None; markers.len()];
    let mut end: Option<usize> = None;

    for (offset, line) in lines_with_offsets(implementation) {
        let trimmed = line.trim();

        if let Some(index) = markers.iter().position(|(_, marker)| marker == trimmed) {
            if starts[index].replace(offset).is_some() {
                return Err(GenError::MalformedTemplate {
                    artifact: ArtifactKind::Implementation,
                    detail: format!("marker `{}` appears more than once", markers[index].1),
                });
            }
        } else if trimmed == END_MARKER && end.replace(offset).is_some() {
            return Err(GenError::MalformedTemplate {
                artifact: ArtifactKind::Implementation,
                detail: format!("marker `{}` appears more than once", END_MARKER),
            });
        }
    }

    let mut found = Vec::with_capacity(markers.len());
    for ((arity, marker), start) in markers.iter().zip(&starts) {
        let start = start.ok_or_else(|| GenError::MarkerNotFound {
            marker: marker.clone(),
            artifact: ArtifactKind::Implementation,
        })?;
        found.push((*arity, marker.as_str(), start));
    }
    let end = end.ok_or_else(|| GenError::MarkerNotFound {
        marker: END_MARKER.to_string(),
        artifact: ArtifactKind::Implementation,
    })?;

    let mut regions = Vec::with_capacity(found.len());
    for (index, &(arity, marker, start)) in found.iter().enumerate() {
        let (next_marker, next_start) = match found.get(index + 1) {
            Some(&(_, next_marker, next_start)) => (next_marker, next_start),
            None => (END_MARKER, end),
        };
        if next_start <= start {
            return Err(GenError::MalformedTemplate {
                artifact: ArtifactKind::Implementation,
                detail: format!("marker `{}` appears before `{}`", next_marker, marker),
            });
        }
        regions.push(ArityRegion {
            arity,
            span: start..next_start,
        });
    }

    Ok(regions)
}

fn locate_namespace(preamble: &str) -> Result<String> {
    preamble
        .lines()
        .map(str::trim)
        .find_map(|line| {
            let rest = line.strip_prefix("namespace ")?;
            let name = rest.strip_suffix('{')?.trim();
            (!name.is_empty()).then(|| name.to_string())
        })
        .ok_or_else(|| GenError::MarkerNotFound {
            marker: "namespace".to_string(),
            artifact: ArtifactKind::Implementation,
        })
}

fn locate_helpers(interface: &str) -> Result<Range<usize>> {
    let mut start = None;
    for (offset, line) in lines_with_offsets(interface) {
        let trimmed = line.trim();
        match start {
            None if trimmed == HELPERS_MARKER => start = Some(offset),
            Some(_) if trimmed == HELPERS_MARKER => {
                return Err(GenError::MalformedTemplate {
                    artifact: ArtifactKind::Interface,
                    detail: format!("marker `{}` appears more than once", HELPERS_MARKER),
                });
            }
            Some(begin) if trimmed == END_MARKER => return Ok(begin..offset),
            _ => {}
        }
    }

    let marker = if start.is_none() {
        HELPERS_MARKER
    } else {
        END_MARKER
    };
    Err(GenError::MarkerNotFound {
        marker: marker.to_string(),
        artifact: ArtifactKind::Interface,
    })
}

/// Path of one master artifact inside `dir`
pub fn master_path(dir: &Path, canonical: &Canonical, kind: ArtifactKind) -> PathBuf {
    dir.join(format!(
        "{}.{}",
        canonical.base_name(),
        kind.extension(canonical)
    ))
}

/// The canonical interface/implementation pair
#[derive(Debug, Clone)]
pub struct MasterTemplate {
    interface: String,
    implementation: String,
    sections: TemplateSections,
}

impl MasterTemplate {
    /// Read `VectorD.h` and `VectorD.cpp` from `dir`
    pub fn load(dir: impl AsRef<Path>, canonical: &Canonical) -> Result<Self> {
        let dir = dir.as_ref();
        let read = |kind: ArtifactKind| -> Result<String> {
            let path = master_path(dir, canonical, kind);
            debug!("Reading canonical {} from {:?}", kind, path);
            std::fs::read_to_string(&path).map_err(|source| GenError::MissingMasterArtifact {
                artifact: kind,
                path,
                source,
            })
        };

        let interface = read(ArtifactKind::Interface)?;
        let implementation = read(ArtifactKind::Implementation)?;
        let template = Self::from_sources(canonical, interface, implementation)?;

        info!(
            "Loaded master template {} ({} arities)",
            canonical.base_name(),
            template.sections.arities.len()
        );
        Ok(template)
    }

    /// Build a master template from in-memory sources
    pub fn from_sources(
        canonical: &Canonical,
        interface: impl Into<String>,
        implementation: impl Into<String>,
    ) -> Result<Self> {
        let interface = normalize_line_endings(interface.into());
        let implementation = normalize_line_endings(implementation.into());
        let sections = TemplateSections::locate(canonical, &interface, &implementation)?;

        Ok(Self {
            interface,
            implementation,
            sections,
        })
    }

    pub fn source(&self, kind: ArtifactKind) -> &str {
        match kind {
            ArtifactKind::Interface => &self.interface,
            ArtifactKind::Implementation => &self.implementation,
        }
    }

    pub fn interface(&self) -> &str {
        &self.interface
    }

    pub fn implementation(&self) -> &str {
        &self.implementation
    }

    pub fn sections(&self) -> &TemplateSections {
        &self.sections
    }

    /// Canonical definitions of one arity, marker line included
    pub fn arity_source(&self, arity: u8) -> Option<&str> {
        self.sections
            .arities
            .iter()
            .find(|region| region.arity == arity)
            .map(|region| &self.implementation[region.span.clone()])
    }

    /// Stream helpers of the interface, marker line included
    pub fn helpers_source(&self) -> &str {
        &self.interface[self.sections.helpers.clone()]
    }
}

fn normalize_line_endings(text: String) -> String {
    if text.contains('\r') {
        text.replace("\r\n", "\n")
    } else {
        text
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn canonical() -> Canonical {
        Canonical::default()
    }

    #[test]
    fn test_field_letters() {
        assert_eq!(field_letters(2), ["x", "y"]);
        assert_eq!(field_letters(3), ["x", "y", "z"]);
        assert_eq!(field_letters(4), ["a", "b", "c", "d"]);
        assert_eq!(field_letters(10).len(), 10);
        assert!(field_letters(11).is_empty());
        for arity in ARITIES {
            for letter in field_letters(arity) {
                assert!(FIELD_ALPHABET.contains(letter));
            }
        }
    }

    #[test]
    fn test_sections_of_canonical_template() {
        let master = MasterTemplate::from_sources(
            &canonical(),
            fixtures::INTERFACE,
            fixtures::IMPLEMENTATION,
        )
        .unwrap();

        let sections = master.sections();
        assert_eq!(sections.namespace(), "util::math");
        assert_eq!(sections.arities().len(), 9);

        let arities: Vec<u8> = sections.arities().iter().map(|r| r.arity).collect();
        assert_eq!(arities, ARITIES.collect::<Vec<_>>());

        // Contiguous and non-overlapping
        for pair in sections.arities().windows(2) {
            assert_eq!(pair[0].span.end, pair[1].span.start);
        }

        let three = master.arity_source(3).unwrap();
        assert!(three.trim_start().starts_with("// Vector3d"));
        assert!(!three.contains("Vector4d"));

        let ten = master.arity_source(10).unwrap();
        assert!(ten.contains("Vector10d::at"));
        assert!(!ten.contains(END_MARKER));

        let helpers = master.helpers_source();
        assert!(helpers.trim_start().starts_with(HELPERS_MARKER));
        assert_eq!(helpers.matches("inline static").count(), 9);
    }

    #[test]
    fn test_crlf_is_normalized() {
        let interface = fixtures::INTERFACE.replace('\n', "\r\n");
        let implementation = fixtures::IMPLEMENTATION.replace('\n', "\r\n");
        let master = MasterTemplate::from_sources(&canonical(), interface, implementation).unwrap();
        assert!(!master.interface().contains('\r'));
        assert_eq!(master.implementation(), fixtures::IMPLEMENTATION);
    }

    #[test]
    fn test_missing_arity_marker() {
        let implementation = fixtures::IMPLEMENTATION.replace("// Vector7d", "// Vector7");
        let result = MasterTemplate::from_sources(&canonical(), fixtures::INTERFACE, implementation);
        match result {
            Err(GenError::MarkerNotFound { marker, artifact }) => {
                assert_eq!(marker, "// Vector7d");
                assert_eq!(artifact, ArtifactKind::Implementation);
            }
            other => panic!("expected MarkerNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_end_marker() {
        let implementation = fixtures::IMPLEMENTATION.replace("// End", "");
        let result = MasterTemplate::from_sources(&canonical(), fixtures::INTERFACE, implementation);
        assert!(matches!(result, Err(GenError::MarkerNotFound { marker, .. }) if marker == END_MARKER));
    }

    #[test]
    fn test_duplicate_marker() {
        let implementation = format!("{}\n\t// Vector5d\n", fixtures::IMPLEMENTATION);
        let result = MasterTemplate::from_sources(&canonical(), fixtures::INTERFACE, implementation);
        assert!(matches!(result, Err(GenError::MalformedTemplate { .. })));
    }

    #[test]
    fn test_out_of_order_markers() {
        let implementation = fixtures::IMPLEMENTATION
            .replace("// Vector4d", "// SWAP")
            .replace("// Vector5d", "// Vector4d")
            .replace("// SWAP", "// Vector5d");
        let result = MasterTemplate::from_sources(&canonical(), fixtures::INTERFACE, implementation);
        assert!(matches!(result, Err(GenError::MalformedTemplate { .. })));
    }

    #[test]
    fn test_missing_helpers_marker() {
        let interface = fixtures::INTERFACE.replace(HELPERS_MARKER, "// helpers");
        let result = MasterTemplate::from_sources(&canonical(), interface, fixtures::IMPLEMENTATION);
        assert!(matches!(
            result,
            Err(GenError::MarkerNotFound {
                artifact: ArtifactKind::Interface,
                ..
            })
        ));
    }

    #[test]
    fn test_missing_namespace() {
        let implementation = fixtures::IMPLEMENTATION.replacen("namespace util::math {", "", 1);
        let result = MasterTemplate::from_sources(&canonical(), fixtures::INTERFACE, implementation);
        assert!(matches!(result, Err(GenError::MarkerNotFound { marker, .. }) if marker == "namespace"));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let result = MasterTemplate::load(dir.path(), &canonical());
        assert!(matches!(
            result,
            Err(GenError::MissingMasterArtifact {
                artifact: ArtifactKind::Interface,
                ..
            })
        ));
    }
}
