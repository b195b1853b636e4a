//! vecgen code generation
//!
//! This crate turns the canonical double-precision vector template into:
//! - one interface/implementation pair per registered type profile
//! - a single generic header of class templates
//!
//! Rendering is pure and happens in memory; nothing touches the output
//! directory until the whole set has been rendered and is committed.

pub mod emitter;
pub mod error;
pub mod master;
pub mod output;
pub mod pipeline;
pub mod rules;
pub mod synthesis;

pub use emitter::{artifact_file_name, Emitter, GeneratedArtifact};
pub use error::{GenError, Result};
pub use master::{field_letters, ArtifactKind, MasterTemplate, ARITIES};
pub use output::{CommitReport, OutputSet};
pub use pipeline::Pipeline;
pub use rules::{RewriteRule, Stage};
pub use synthesis::{SynthesisFragment, Synthesizer};

use std::path::Path;
use tracing::info;
use vecgen_profiles::Registry;

/// A registry bound to a loaded master template
#[derive(Debug, Clone)]
pub struct Generator {
    registry: Registry,
    master: MasterTemplate,
    export: bool,
}

impl Generator {
    pub fn new(registry: Registry, master: MasterTemplate, export: bool) -> Self {
        Self {
            registry,
            master,
            export,
        }
    }

    /// Load the master pair from `input_dir` using the registry's conventions
    pub fn load(registry: Registry, input_dir: impl AsRef<Path>, export: bool) -> Result<Self> {
        let master = MasterTemplate::load(input_dir, registry.canonical())?;
        Ok(Self::new(registry, master, export))
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn master(&self) -> &MasterTemplate {
        &self.master
    }

    pub fn export(&self) -> bool {
        self.export
    }

    /// Number of files a successful run produces
    pub fn expected_outputs(&self) -> usize {
        self.registry.len() * ArtifactKind::ALL.len() + 1
    }

    /// Render every per-profile pair and the generic header
    pub fn render(&self) -> Result<OutputSet> {
        let emitter = Emitter::new(&self.registry, &self.master, self.export);
        let synthesizer = Synthesizer::new(self.registry.canonical(), &self.master);

        let (artifacts, generic) = rayon::join(|| emitter.render(), || synthesizer.synthesize());

        let mut outputs = OutputSet::new();
        for artifact in artifacts? {
            outputs.insert(artifact)?;
        }
        outputs.insert(generic?)?;

        info!(
            "Rendered {} files (export {})",
            outputs.len(),
            if self.export { "on" } else { "off" }
        );
        Ok(outputs)
    }

    /// Render and commit to `output_dir`
    pub fn generate(&self, output_dir: impl AsRef<Path>) -> Result<CommitReport> {
        self.render()?.commit(output_dir.as_ref())
    }
}
