//! Rewrite rules
//!
//! A rule is plain data: where it runs (stage, category gate, artifact
//! scope), whether it must match, and what edit it performs. Patterns are
//! anchored on identifier boundaries so a short tag or field letter can never
//! rewrite the inside of a longer token.

use crate::error::{GenError, Result};
use crate::master::ArtifactKind;
use regex::{Captures, Regex};
use std::fmt;
use tracing::trace;
use vecgen_profiles::SemanticCategory;

/// Pipeline stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Stage {
    /// Element symbol, default literal and class names.
    /// Post: no canonical class name or symbol remains.
    TokenSubstitution,
    /// `Bytes:`, `Range:` annotations and the include label.
    /// Pre: class names already renamed (the include label is not a class name).
    MetadataSubstitution,
    /// Boolean only: drop arithmetic that has no meaning for `bool`.
    /// Must run before casts are injected so pruned statements are not wrapped.
    BooleanPruning,
    /// Narrow categories: wrap field arithmetic in `cast(...)` and define it.
    /// Pre: include label already substituted (the helper is anchored on it).
    NarrowingCasts,
    /// Narrow integers and wide characters: stream fields as integers.
    StreamOutput,
    /// Drop the export token when the export flag is off.
    ExportStripping,
    /// Synthesizer only: turn canonical fragments into generic ones.
    Generalization,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::TokenSubstitution => "token substitution",
            Stage::MetadataSubstitution => "metadata substitution",
            Stage::BooleanPruning => "boolean pruning",
            Stage::NarrowingCasts => "narrowing casts",
            Stage::StreamOutput => "stream output",
            Stage::ExportStripping => "export stripping",
            Stage::Generalization => "generalization",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Predicate deciding whether a rule runs for a profile
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Gate {
    Always,
    Categories(Vec<SemanticCategory>),
    ExportDisabled,
}

/// Artifacts a rule runs on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Both,
    Only(ArtifactKind),
}

impl Scope {
    pub fn includes(self, kind: ArtifactKind) -> bool {
        match self {
            Scope::Both => true,
            Scope::Only(only) => only == kind,
        }
    }
}

/// Whether an applied rule is allowed to match nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expect {
    Any,
    MatchIn(Scope),
}

impl Expect {
    pub fn required_for(self, kind: ArtifactKind) -> bool {
        match self {
            Expect::Any => false,
            Expect::MatchIn(scope) => scope.includes(kind),
        }
    }
}

/// What happens to each match of a substitution
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Literal replacement
    Replace(String),
    /// Replacement with `$name` capture expansion
    Expand(String),
    /// Keep the match, surround it
    Wrap { prefix: String, suffix: String },
    Delete,
}

impl Action {
    fn render(&self, caps: &Captures<'_>) -> String {
        match self {
            Action::Replace(text) => text.clone(),
            Action::Expand(template) => {
                let mut out = String::new();
                caps.expand(template, &mut out);
                out
            }
            Action::Wrap { prefix, suffix } => format!("{}{}{}", prefix, &caps[0], suffix),
            Action::Delete => String::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Edit {
    /// Apply `action` to every match of each pattern, patterns in order
    Substitute { patterns: Vec<Regex>, action: Action },
    /// Insert `text` as whole lines after the first line matching `anchor`
    InsertAfterLine { anchor: Regex, text: String },
    /// Append one line at the end of the artifact
    AppendLine(String),
}

/// What a rule is evaluated against
#[derive(Debug, Clone, Copy)]
pub struct RuleContext {
    pub category: SemanticCategory,
    pub kind: ArtifactKind,
    pub export: bool,
}

#[derive(Debug, Clone)]
pub struct RewriteRule {
    pub name: String,
    pub stage: Stage,
    pub gate: Gate,
    pub scope: Scope,
    pub expect: Expect,
    pub edit: Edit,
}

impl RewriteRule {
    /// An ungated optional rule on both artifacts
    pub fn new(name: impl Into<String>, stage: Stage, edit: Edit) -> Self {
        Self {
            name: name.into(),
            stage,
            gate: Gate::Always,
            scope: Scope::Both,
            expect: Expect::Any,
            edit,
        }
    }

    pub fn gated(mut self, gate: Gate) -> Self {
        self.gate = gate;
        self
    }

    pub fn scoped(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    pub fn expecting(mut self, expect: Expect) -> Self {
        self.expect = expect;
        self
    }

    pub fn applies(&self, ctx: &RuleContext) -> bool {
        if !self.scope.includes(ctx.kind) {
            return false;
        }
        match &self.gate {
            Gate::Always => true,
            Gate::Categories(categories) => categories.contains(&ctx.category),
            Gate::ExportDisabled => !ctx.export,
        }
    }

    /// Apply the edit, returning the new text and the number of matches
    pub fn apply(&self, text: &str) -> (String, usize) {
        match &self.edit {
            Edit::Substitute { patterns, action } => {
                let mut current = text.to_string();
                let mut total = 0;
                for pattern in patterns {
                    let mut count = 0;
                    let replaced = pattern.replace_all(&current, |caps: &Captures<'_>| {
                        count += 1;
                        action.render(caps)
                    });
                    if count > 0 {
                        current = replaced.into_owned();
                    }
                    total += count;
                }
                (current, total)
            }
            Edit::InsertAfterLine { anchor, text: insert } => {
                let Some(found) = anchor.find(text) else {
                    return (text.to_string(), 0);
                };
                let mut out = String::with_capacity(text.len() + insert.len() + 2);
                match text[found.end()..].find('\n') {
                    Some(newline) => {
                        let split = found.end() + newline + 1;
                        out.push_str(&text[..split]);
                        out.push_str(insert);
                        out.push('\n');
                        out.push_str(&text[split..]);
                    }
                    None => {
                        out.push_str(text);
                        out.push('\n');
                        out.push_str(insert);
                    }
                }
                (out, 1)
            }
            Edit::AppendLine(line) => {
                let mut out = text.to_string();
                if !out.is_empty() && !out.ends_with('\n') {
                    out.push('\n');
                }
                out.push_str(line);
                out.push('\n');
                (out, 1)
            }
        }
    }

    /// Apply the rule and fail if it is required for `kind` but matched nothing
    pub(crate) fn apply_checked(
        &self,
        text: &str,
        kind: ArtifactKind,
        target: &str,
    ) -> Result<String> {
        let (rewritten, matches) = self.apply(text);
        trace!("{} [{}] {}: {} matches", target, kind, self.name, matches);

        if matches == 0 && self.expect.required_for(kind) {
            return Err(GenError::RuleNotApplied {
                target: target.to_string(),
                artifact: kind,
                stage: self.stage,
                rule: self.name.clone(),
            });
        }
        Ok(rewritten)
    }
}

/// A canonical placeholder that must not survive rewriting
#[derive(Debug, Clone)]
pub struct Sentinel {
    pattern: Regex,
}

impl Sentinel {
    pub fn new(pattern: Regex) -> Self {
        Self { pattern }
    }

    /// Sentinel for a literal placeholder, matched as a whole token
    pub fn literal(literal: &str) -> Result<Self> {
        Ok(Self::new(compile(&token_pattern(literal))?))
    }

    pub(crate) fn check(&self, text: &str, kind: ArtifactKind, target: &str) -> Result<()> {
        match self.pattern.find(text) {
            Some(found) => Err(GenError::IncompleteSubstitution {
                target: target.to_string(),
                artifact: kind,
                sentinel: found.as_str().to_string(),
            }),
            None => Ok(()),
        }
    }
}

fn is_word(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Regex source matching `literal` only as a whole token
pub fn token_pattern(literal: &str) -> String {
    let mut pattern = String::with_capacity(literal.len() + 8);
    if literal.starts_with(is_word) {
        pattern.push_str(r"\b");
    }
    pattern.push_str(&regex::escape(literal));
    if literal.ends_with(is_word) {
        pattern.push_str(r"\b");
    }
    pattern
}

/// Escape `$` so a literal survives capture expansion
pub fn expansion_literal(text: &str) -> String {
    text.replace('$', "$$")
}

pub fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|source| GenError::Pattern {
        pattern: pattern.to_string(),
        source,
    })
}
