//! Per-profile rewrite pipeline
//!
//! The pipeline is the ordered rule list for one profile. Running it on an
//! artifact applies every gated, in-scope rule in stage order, fails if a
//! required rule matched nothing, and finally verifies that no canonical
//! placeholder survived.

use crate::error::Result;
use crate::master::{ArtifactKind, ARITIES, FIELD_ALPHABET};
use crate::rules::{
    compile, expansion_literal, token_pattern, Action, Edit, Expect, Gate, RewriteRule,
    RuleContext, Scope, Sentinel, Stage,
};
use regex::Regex;
use tracing::debug;
use vecgen_profiles::{Canonical, SemanticCategory, TypeProfile};

const IMPLEMENTATION_ONLY: Scope = Scope::Only(ArtifactKind::Implementation);
const INTERFACE_ONLY: Scope = Scope::Only(ArtifactKind::Interface);

/// Name of the narrowing helper macro injected into implementations
pub const CAST_HELPER: &str = "cast";

#[derive(Debug, Clone)]
pub struct Pipeline {
    target: String,
    category: SemanticCategory,
    export: bool,
    rules: Vec<RewriteRule>,
    sentinels: Vec<Sentinel>,
}

impl Pipeline {
    /// Build the rule list for `profile`
    pub fn new(canonical: &Canonical, profile: &TypeProfile, export: bool) -> Result<Self> {
        let mut rules = token_rules(canonical, profile)?;
        rules.extend(metadata_rules(canonical, profile)?);
        rules.extend(boolean_rules()?);
        rules.extend(cast_rules(profile)?);
        rules.extend(stream_rules()?);
        rules.extend(export_rules(canonical)?);
        debug_assert!(rules.windows(2).all(|pair| pair[0].stage <= pair[1].stage));

        Ok(Self {
            target: profile.short_tag.clone(),
            category: profile.category,
            export,
            rules,
            sentinels: sentinels(canonical, profile)?,
        })
    }

    /// Short tag of the profile this pipeline renders
    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn rules(&self) -> &[RewriteRule] {
        &self.rules
    }

    /// Rewrite one canonical artifact into the profile's artifact
    pub fn run(&self, kind: ArtifactKind, source: &str) -> Result<String> {
        let ctx = RuleContext {
            category: self.category,
            kind,
            export: self.export,
        };

        let mut text = source.to_string();
        let mut applied = 0;
        for rule in self.rules.iter().filter(|rule| rule.applies(&ctx)) {
            text = rule.apply_checked(&text, kind, &self.target)?;
            applied += 1;
        }

        for sentinel in &self.sentinels {
            sentinel.check(&text, kind, &self.target)?;
        }

        debug!(
            "Rendered {} artifact for '{}' ({} rules)",
            kind, self.target, applied
        );
        Ok(text)
    }
}

/// Matches any canonical class name, capturing the arity
pub(crate) fn class_name_pattern(canonical: &Canonical) -> Result<Regex> {
    let arities: Vec<String> = ARITIES.rev().map(|arity| arity.to_string()).collect();
    compile(&format!(
        r"\b{}(?P<arity>{}){}\b",
        regex::escape(&canonical.class_prefix),
        arities.join("|"),
        regex::escape(&canonical.short_tag)
    ))
}

fn substitute(patterns: Vec<Regex>, action: Action) -> Edit {
    Edit::Substitute { patterns, action }
}

fn literal(pattern: &str, replacement: &str) -> Result<Edit> {
    Ok(substitute(
        vec![compile(&token_pattern(pattern))?],
        Action::Replace(replacement.to_string()),
    ))
}

fn per_field(template: impl Fn(&str) -> String) -> Result<Vec<Regex>> {
    FIELD_ALPHABET
        .iter()
        .map(|field| compile(&template(field)))
        .collect()
}

fn token_rules(canonical: &Canonical, profile: &TypeProfile) -> Result<Vec<RewriteRule>> {
    let class_name = Action::Expand(format!(
        "{}${{arity}}{}",
        expansion_literal(&canonical.class_prefix),
        expansion_literal(&profile.short_tag)
    ));

    Ok(vec![
        RewriteRule::new(
            "token.symbol",
            Stage::TokenSubstitution,
            literal(&canonical.symbol, &profile.symbol)?,
        )
        .expecting(Expect::MatchIn(Scope::Both)),
        RewriteRule::new(
            "token.class-name",
            Stage::TokenSubstitution,
            substitute(vec![class_name_pattern(canonical)?], class_name),
        )
        .expecting(Expect::MatchIn(Scope::Both)),
        RewriteRule::new(
            "token.default-literal",
            Stage::TokenSubstitution,
            literal(&canonical.default_literal, &profile.default_literal)?,
        )
        .expecting(Expect::MatchIn(INTERFACE_ONLY)),
    ])
}

fn metadata_rules(canonical: &Canonical, profile: &TypeProfile) -> Result<Vec<RewriteRule>> {
    Ok(vec![
        RewriteRule::new(
            "metadata.byte-size",
            Stage::MetadataSubstitution,
            literal(
                &format!("Bytes: {}", canonical.byte_size),
                &format!("Bytes: {}", profile.byte_size),
            )?,
        )
        .expecting(Expect::MatchIn(Scope::Both)),
        RewriteRule::new(
            "metadata.range",
            Stage::MetadataSubstitution,
            literal(
                &format!("Range: {}", canonical.range),
                &format!("Range: {}", profile.range),
            )?,
        )
        .expecting(Expect::MatchIn(Scope::Both)),
        RewriteRule::new(
            "metadata.include-label",
            Stage::MetadataSubstitution,
            literal(&canonical.include_label(), &profile.include_label)?,
        )
        .scoped(IMPLEMENTATION_ONLY)
        .expecting(Expect::MatchIn(IMPLEMENTATION_ONLY)),
    ])
}

fn boolean_rules() -> Result<Vec<RewriteRule>> {
    let gate = Gate::Categories(vec![SemanticCategory::Boolean]);
    let rule = |name: &str, patterns: Vec<Regex>| {
        RewriteRule::new(name, Stage::BooleanPruning, substitute(patterns, Action::Delete))
            .gated(gate.clone())
            .scoped(IMPLEMENTATION_ONLY)
            .expecting(Expect::MatchIn(IMPLEMENTATION_ONLY))
    };

    Ok(vec![
        // ++x; --x;
        rule("bool.step", per_field(|f| format!(r"(?:\+\+|--){f};"))?),
        // x / number, x / v.x
        rule(
            "bool.divide",
            per_field(|f| format!(r"\b{f} / (?:number|v\.{f})\b,?"))?,
        ),
        // x += right.x; x *= number;
        rule(
            "bool.compound",
            per_field(|f| format!(r"\b{f} (?:\+=|-=|\*=|/=) (?:right\.{f}|number);"))?,
        ),
    ])
}

fn cast_rules(profile: &TypeProfile) -> Result<Vec<RewriteRule>> {
    let gate = Gate::Categories(
        SemanticCategory::ALL
            .into_iter()
            .filter(|category| category.needs_narrowing_cast())
            .collect(),
    );
    let include = compile(&format!(
        r#"#include\s+"{}""#,
        regex::escape(&profile.include_label)
    ))?;

    Ok(vec![
        RewriteRule::new(
            "cast.wrap",
            Stage::NarrowingCasts,
            substitute(
                per_field(|f| {
                    format!(r"\b{f} (?:\+=|-=|\*=|/=|\+|-|\*|/) (?:v\.{f}|right\.{f}|number)\b")
                })?,
                Action::Wrap {
                    prefix: format!("{CAST_HELPER}("),
                    suffix: ")".to_string(),
                },
            ),
        )
        .gated(gate.clone())
        .scoped(IMPLEMENTATION_ONLY)
        .expecting(Expect::MatchIn(IMPLEMENTATION_ONLY)),
        RewriteRule::new(
            "cast.helper",
            Stage::NarrowingCasts,
            Edit::InsertAfterLine {
                anchor: include,
                text: format!(
                    "\n#define {CAST_HELPER}(x) static_cast<{}>(x)",
                    profile.symbol
                ),
            },
        )
        .gated(gate.clone())
        .scoped(IMPLEMENTATION_ONLY)
        .expecting(Expect::MatchIn(IMPLEMENTATION_ONLY)),
        RewriteRule::new(
            "cast.scope",
            Stage::NarrowingCasts,
            Edit::AppendLine(format!("#undef {CAST_HELPER}")),
        )
        .gated(gate)
        .scoped(IMPLEMENTATION_ONLY),
    ])
}

fn stream_rules() -> Result<Vec<RewriteRule>> {
    let printable = Gate::Categories(
        SemanticCategory::ALL
            .into_iter()
            .filter(|category| category.needs_printable_stream())
            .collect(),
    );

    Ok(vec![
        RewriteRule::new(
            "stream.printable",
            Stage::StreamOutput,
            substitute(
                vec![compile(&format!(
                    r"<< (?P<field>v\.(?:{}))\b",
                    FIELD_ALPHABET.join("|")
                ))?],
                Action::Expand("<< (int)$field".to_string()),
            ),
        )
        .gated(printable)
        .expecting(Expect::MatchIn(INTERFACE_ONLY)),
        RewriteRule::new(
            "stream.wide",
            Stage::StreamOutput,
            literal("std::ostream&", "std::wostream&")?,
        )
        .gated(Gate::Categories(vec![SemanticCategory::WideCharacter]))
        .expecting(Expect::MatchIn(INTERFACE_ONLY)),
    ])
}

fn export_rules(canonical: &Canonical) -> Result<Vec<RewriteRule>> {
    Ok(vec![RewriteRule::new(
        "export.strip",
        Stage::ExportStripping,
        substitute(
            vec![compile(&format!(
                "{} ?",
                token_pattern(&canonical.export_token)
            ))?],
            Action::Delete,
        ),
    )
    .gated(Gate::ExportDisabled)])
}

/// Canonical placeholders that must be gone once every rule has run.
/// Values a profile shares with the canonical type are not placeholders.
fn sentinels(canonical: &Canonical, profile: &TypeProfile) -> Result<Vec<Sentinel>> {
    let mut sentinels = vec![Sentinel::new(class_name_pattern(canonical)?)];

    let pairs = [
        (canonical.symbol.clone(), profile.symbol.clone()),
        (
            canonical.default_literal.clone(),
            profile.default_literal.clone(),
        ),
        (
            format!("Bytes: {}", canonical.byte_size),
            format!("Bytes: {}", profile.byte_size),
        ),
        (
            format!("Range: {}", canonical.range),
            format!("Range: {}", profile.range),
        ),
        (canonical.include_label(), profile.include_label.clone()),
    ];
    for (placeholder, value) in pairs {
        if placeholder != value {
            sentinels.push(Sentinel::literal(&placeholder)?);
        }
    }
    Ok(sentinels)
}
