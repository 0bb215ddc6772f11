//! Presentation selection for working text.
//!
//! When an edit session opens, the host decides how the extracted text
//! should be presented: plain, as prose, or with lightweight markup
//! conventions. The decision is driven by an ordered rule list keyed on the
//! source language. Rules are host-supplied closures so an embedding editor
//! can hook its own setup (and report failure); the core only needs the
//! selected [`RenderMode`] back, falling back to [`RenderMode::Plain`] when
//! nothing matches or a hook fails.

use std::fmt;

use thiserror::Error;
use tracing::trace;

/// How working text is presented while an edit session is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderMode {
    /// No interpretation; the stripped text as-is.
    #[default]
    Plain,
    /// Natural-language prose conventions (filling, sentence motion).
    Prose,
    /// Lightweight markup conventions (headings, lists).
    Markup,
}

impl RenderMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RenderMode::Plain => "plain",
            RenderMode::Prose => "prose",
            RenderMode::Markup => "markup",
        }
    }
}

impl fmt::Display for RenderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A presentation hook refused to initialize.
///
/// Selection treats this as non-fatal: the session still opens, in
/// [`RenderMode::Plain`], and the failure is surfaced through logging and
/// the session's fallback flag.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("presentation setup failed for {language}: {reason}")]
pub struct RenderError {
    language: String,
    reason: String,
}

impl RenderError {
    pub fn new(language: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            reason: reason.into(),
        }
    }
}

type Predicate = Box<dyn Fn(&str) -> bool>;
type Handler = Box<dyn Fn(&str) -> Result<RenderMode, RenderError>>;

/// One presentation rule: a language predicate plus the hook that produces
/// the mode.
pub struct RenderRule {
    name: &'static str,
    predicate: Predicate,
    handler: Handler,
}

impl RenderRule {
    pub fn new(
        name: &'static str,
        predicate: impl Fn(&str) -> bool + 'static,
        handler: impl Fn(&str) -> Result<RenderMode, RenderError> + 'static,
    ) -> Self {
        Self {
            name,
            predicate: Box::new(predicate),
            handler: Box::new(handler),
        }
    }

    /// A rule that always selects `mode` for languages passing `predicate`.
    pub fn constant(
        name: &'static str,
        predicate: impl Fn(&str) -> bool + 'static,
        mode: RenderMode,
    ) -> Self {
        Self::new(name, predicate, move |_| Ok(mode))
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Debug for RenderRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderRule").field("name", &self.name).finish()
    }
}

/// Ordered rule list; the first rule whose predicate accepts the language
/// wins.
#[derive(Debug, Default)]
pub struct RenderRules {
    rules: Vec<RenderRule>,
}

impl RenderRules {
    pub fn new() -> Self {
        Self::default()
    }

    /// A rule list that selects `mode` for every language.
    pub fn always(mode: RenderMode) -> Self {
        let mut rules = Self::new();
        rules.push(RenderRule::constant("default", |_| true, mode));
        rules
    }

    pub fn push(&mut self, rule: RenderRule) {
        self.rules.push(rule);
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Runs the rule chain for `language`.
    ///
    /// No matching rule is not an error; that is the plain fallback. A
    /// matching rule whose handler fails returns the error to the caller,
    /// which decides whether to fall back.
    pub fn select(&self, language: &str) -> Result<RenderMode, RenderError> {
        for rule in &self.rules {
            if (rule.predicate)(language) {
                let mode = (rule.handler)(language)?;
                trace!(
                    target: "render",
                    rule = rule.name,
                    language,
                    mode = %mode,
                    "render_rule_matched"
                );
                return Ok(mode);
            }
        }
        Ok(RenderMode::Plain)
    }
}
