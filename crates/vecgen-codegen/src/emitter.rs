//! Per-profile artifact emission

use crate::error::Result;
use crate::master::{ArtifactKind, MasterTemplate};
use crate::output::{CommitReport, OutputSet};
use crate::pipeline::Pipeline;
use rayon::prelude::*;
use std::path::Path;
use tracing::{debug, info};
use vecgen_profiles::{Canonical, Registry, TypeProfile};

/// One rendered output file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedArtifact {
    pub file_name: String,
    pub contents: String,
}

/// `Vector<file_tag>.<ext>`
pub fn artifact_file_name(
    canonical: &Canonical,
    profile: &TypeProfile,
    kind: ArtifactKind,
) -> String {
    format!(
        "{}.{}",
        canonical.stem_for(&profile.file_tag),
        kind.extension(canonical)
    )
}

/// Renders the interface/implementation pair of every registered profile
pub struct Emitter<'a> {
    registry: &'a Registry,
    master: &'a MasterTemplate,
    export: bool,
}

impl<'a> Emitter<'a> {
    pub fn new(registry: &'a Registry, master: &'a MasterTemplate, export: bool) -> Self {
        Self {
            registry,
            master,
            export,
        }
    }

    /// Both artifacts of one profile, interface first
    pub fn render_profile(&self, profile: &TypeProfile) -> Result<Vec<GeneratedArtifact>> {
        let canonical = self.registry.canonical();
        let pipeline = Pipeline::new(canonical, profile, self.export)?;

        ArtifactKind::ALL
            .into_iter()
            .map(|kind| -> Result<GeneratedArtifact> {
                let contents = pipeline.run(kind, self.master.source(kind))?;
                let file_name = artifact_file_name(canonical, profile, kind);
                debug!("Rendered {} ({} bytes)", file_name, contents.len());
                Ok(GeneratedArtifact {
                    file_name,
                    contents,
                })
            })
            .collect()
    }

    /// Every profile in registry order. Profiles render in parallel; the
    /// result order does not depend on scheduling.
    pub fn render(&self) -> Result<Vec<GeneratedArtifact>> {
        let rendered = self
            .registry
            .profiles()
            .par_iter()
            .map(|profile| self.render_profile(profile))
            .collect::<Result<Vec<_>>>()?;

        let artifacts: Vec<GeneratedArtifact> = rendered.into_iter().flatten().collect();
        info!(
            "Rendered {} artifacts for {} profiles",
            artifacts.len(),
            self.registry.len()
        );
        Ok(artifacts)
    }

    /// Render every profile and commit the result to `output_dir`
    pub fn emit(&self, output_dir: &Path) -> Result<CommitReport> {
        let mut outputs = OutputSet::new();
        for artifact in self.render()? {
            outputs.insert(artifact)?;
        }
        outputs.commit(output_dir)
    }
}
