//! Generic header synthesis
//!
//! Builds a single templated header (`VectorT.h`) from the canonical
//! implementation. Each arity section becomes the body of a class template:
//! qualifiers are stripped, the class is renamed to its generic name, the
//! element symbol becomes the type parameter and a default constructor is
//! added. The interface's stream helpers follow the classes, promoted to
//! function templates.

use crate::emitter::GeneratedArtifact;
use crate::error::{Result, GENERIC_TARGET};
use crate::master::{field_letters, ArtifactKind, MasterTemplate};
use crate::pipeline::class_name_pattern;
use crate::rules::{
    compile, expansion_literal, token_pattern, Action, Edit, Expect, RewriteRule, Scope,
    Sentinel, Stage,
};
use tracing::{debug, info};
use vecgen_profiles::Canonical;

/// One arity section before and after generalization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesisFragment {
    pub arity: u8,
    pub fields: &'static [&'static str],
    /// Section text as it appears in the canonical implementation
    pub source: String,
    /// Class body: re-indented, unqualified, generic
    pub generalized: String,
}

pub struct Synthesizer<'a> {
    canonical: &'a Canonical,
    master: &'a MasterTemplate,
}

impl<'a> Synthesizer<'a> {
    pub fn new(canonical: &'a Canonical, master: &'a MasterTemplate) -> Self {
        Self { canonical, master }
    }

    /// Output file name of the generic header
    pub fn file_name(&self) -> String {
        self.canonical.generic_file_name()
    }

    /// Generalized fragments in ascending arity order
    pub fn fragments(&self) -> Result<Vec<SynthesisFragment>> {
        let sections = self.master.sections();
        sections
            .arities()
            .iter()
            .map(|region| -> Result<SynthesisFragment> {
                let source = self.master.implementation()[region.span.clone()]
                    .trim_end()
                    .to_string();
                let generalized = self.generalize(region.arity, &source)?;
                debug!(
                    "Generalized {} ({} lines)",
                    self.canonical.generic_class_name(region.arity),
                    generalized.lines().count()
                );
                Ok(SynthesisFragment {
                    arity: region.arity,
                    fields: field_letters(region.arity),
                    source,
                    generalized,
                })
            })
            .collect()
    }

    fn generalize(&self, arity: u8, source: &str) -> Result<String> {
        let canonical = self.canonical;
        let class = canonical.class_name(arity);
        let generic = canonical.generic_class_name(arity);

        let text = indent(source);
        let marker_indent: String = text
            .chars()
            .take_while(|c| *c == '\t' || *c == ' ')
            .collect();

        let rules = [
            RewriteRule::new(
                "generic.qualifier",
                Stage::Generalization,
                Edit::Substitute {
                    patterns: vec![compile(&format!("{}::", token_pattern(&class)))?],
                    action: Action::Delete,
                },
            )
            .expecting(Expect::MatchIn(Scope::Both)),
            RewriteRule::new(
                "generic.class-name",
                Stage::Generalization,
                Edit::Substitute {
                    patterns: vec![compile(&token_pattern(&class))?],
                    action: Action::Replace(generic.clone()),
                },
            )
            .expecting(Expect::MatchIn(Scope::Both)),
            RewriteRule::new(
                "generic.symbol",
                Stage::Generalization,
                Edit::Substitute {
                    patterns: vec![compile(&token_pattern(&canonical.symbol))?],
                    action: Action::Replace(canonical.generic_param.clone()),
                },
            ),
            RewriteRule::new(
                "generic.default-constructor",
                Stage::Generalization,
                Edit::InsertAfterLine {
                    anchor: compile(&format!(r"(?m)^[ \t]*// {}$", regex::escape(&generic)))?,
                    text: format!("{marker_indent}inline {generic}() noexcept {{}}"),
                },
            )
            .expecting(Expect::MatchIn(Scope::Both)),
        ];

        let text = self.apply(&rules, text)?;
        self.check(&text)?;
        Ok(text)
    }

    /// Stream helpers promoted to function templates
    pub fn helpers(&self) -> Result<String> {
        let canonical = self.canonical;
        let param = expansion_literal(&canonical.generic_param);

        let rules = [
            RewriteRule::new(
                "generic.helper-template",
                Stage::Generalization,
                Edit::Substitute {
                    patterns: vec![compile(r"(?m)^(?P<indent>[ \t]*)inline static\b")?],
                    action: Action::Expand(format!(
                        "${{indent}}template<class {param}>\n${{indent}}inline static"
                    )),
                },
            )
            .expecting(Expect::MatchIn(Scope::Both)),
            RewriteRule::new(
                "generic.helper-class",
                Stage::Generalization,
                Edit::Substitute {
                    patterns: vec![class_name_pattern(canonical)?],
                    action: Action::Expand(format!(
                        "{}${{arity}}<{param}>",
                        expansion_literal(&canonical.class_prefix)
                    )),
                },
            )
            .expecting(Expect::MatchIn(Scope::Both)),
            RewriteRule::new(
                "generic.symbol",
                Stage::Generalization,
                Edit::Substitute {
                    patterns: vec![compile(&token_pattern(&canonical.symbol))?],
                    action: Action::Replace(canonical.generic_param.clone()),
                },
            ),
        ];

        let text = self.apply(&rules, self.master.helpers_source().trim_end().to_string())?;
        self.check(&text)?;
        Ok(text)
    }

    /// Class template wrapping one generalized fragment
    pub fn class_declaration(&self, fragment: &SynthesisFragment) -> String {
        let param = &self.canonical.generic_param;
        format!(
            "\ttemplate<class {param}>\n\tclass {name}\n\t{{\n\tpublic:\n\t\t{param} {fields};\n\tpublic:\n{body}\n\t}};",
            name = self.canonical.generic_class_name(fragment.arity),
            fields = fragment.fields.join(", "),
            body = fragment.generalized,
        )
    }

    /// Assemble the complete generic header
    pub fn synthesize(&self) -> Result<GeneratedArtifact> {
        let fragments = self.fragments()?;
        let helpers = self.helpers()?;

        let classes: Vec<String> = fragments
            .iter()
            .map(|fragment| self.class_declaration(fragment))
            .collect();

        let mut contents = String::new();
        contents.push_str("#pragma once\n#include <iostream>\n#include <cstdint>\n\n");
        contents.push_str(&format!(
            "namespace {} {{\n\n",
            self.master.sections().namespace()
        ));
        contents.push_str(&classes.join("\n\n"));
        contents.push_str("\n\n");
        contents.push_str(&helpers);
        contents.push_str("\n}\n");

        let file_name = self.file_name();
        info!("Synthesized {} ({} classes)", file_name, classes.len());
        Ok(GeneratedArtifact {
            file_name,
            contents,
        })
    }

    fn apply(&self, rules: &[RewriteRule], text: String) -> Result<String> {
        rules.iter().try_fold(text, |text, rule| {
            rule.apply_checked(&text, ArtifactKind::Implementation, GENERIC_TARGET)
        })
    }

    fn check(&self, text: &str) -> Result<()> {
        let sentinels = [
            Sentinel::new(class_name_pattern(self.canonical)?),
            Sentinel::literal(&self.canonical.symbol)?,
        ];
        sentinels
            .iter()
            .try_for_each(|sentinel| sentinel.check(text, ArtifactKind::Implementation, GENERIC_TARGET))
    }
}

/// One more tab on every non-blank line; blank lines become empty
fn indent(source: &str) -> String {
    source
        .lines()
        .map(|line| {
            if line.trim().is_empty() {
                String::new()
            } else {
                format!("\t{line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
