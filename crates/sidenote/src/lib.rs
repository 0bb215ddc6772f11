//! Comment-block editing workbench.
//!
//! [`Workbench`] bundles the whole stack behind one handle: the source
//! [`Document`], the lexical tracker for its language, the presentation
//! rule list, the session registry, and the margin-restoring reflow used on
//! writeback. Hosts embed one per buffer: detect and open a comment edit
//! with [`Workbench::start_edit`], mutate the working copy through
//! [`Workbench::working_mut`], then [`Workbench::save`] or
//! [`Workbench::discard`]. Defaults for the boundary policy and save
//! behavior come from [`Config`], loaded from `sidenote.toml` via
//! [`load_from`].

pub mod config;

pub use config::{Config, ConfigFile, EditConfig, RenderConfig, discover, load_from};
pub use sidenote_doc::{
    Bias, Document, GuardViolation, MarginReflow, Reflow, ReflowReport, SpliceOutcome,
};
pub use sidenote_edit::{
    ClosedSession, CommentRun, CommitOutcome, EditError, Policy, SaveOutcome, find_run,
};
pub use sidenote_session::{
    Marker, MetricsSnapshot, Session, SessionId, SessionRegistry, WorkingText,
};
pub use sidenote_syntax::{
    CommentSyntax, LexicalTracker, RenderError, RenderMode, RenderRule, RenderRules, ScanTracker,
    SyntaxError,
};

use anyhow::{Context, Result, anyhow};
use sidenote_edit as edit;
use tracing::info;

/// One document plus everything needed to edit its comment blocks.
pub struct Workbench {
    doc: Document,
    tracker: ScanTracker,
    rules: RenderRules,
    reflow: MarginReflow,
    registry: SessionRegistry,
    config: Config,
}

impl Workbench {
    /// Builds a workbench for `text` using the built-in comment syntax
    /// registered for `language`.
    pub fn from_language(name: &str, text: &str, language: &str) -> Result<Self> {
        let syntax = CommentSyntax::for_language(language)
            .ok_or_else(|| anyhow!("no comment syntax registered for language {language}"))?;
        Self::with_config(name, text, syntax, Config::default())
    }

    pub fn new(name: &str, text: &str, syntax: CommentSyntax) -> Result<Self> {
        Self::with_config(name, text, syntax, Config::default())
    }

    pub fn with_config(
        name: &str,
        text: &str,
        syntax: CommentSyntax,
        config: Config,
    ) -> Result<Self> {
        let doc = Document::from_str(name, text).with_context(|| format!("loading {name}"))?;
        info!(
            target: "workbench",
            name,
            language = syntax.language(),
            policy = ?config.effective_policy,
            "workbench_ready"
        );
        Ok(Self {
            doc,
            tracker: ScanTracker::new(syntax),
            rules: RenderRules::new(),
            reflow: MarginReflow,
            registry: SessionRegistry::new(),
            config,
        })
    }

    /// Opens (or resumes) an edit session at `position` under the
    /// configured boundary policy.
    pub fn start_edit(&mut self, position: usize) -> Result<SessionId, EditError> {
        self.start_edit_with(position, self.config.effective_policy)
    }

    /// Like [`Workbench::start_edit`] with an explicit policy.
    pub fn start_edit_with(
        &mut self,
        position: usize,
        policy: Policy,
    ) -> Result<SessionId, EditError> {
        edit::start_edit(
            &mut self.doc,
            &self.tracker,
            self.tracker.syntax(),
            &self.rules,
            &mut self.registry,
            position,
            policy,
        )
    }

    /// Detects the comment run at `position` without opening a session.
    pub fn run_at(&self, position: usize, policy: Policy) -> Option<CommentRun> {
        find_run(&self.doc, &self.tracker, position, policy)
    }

    /// Working text of an active session.
    pub fn working(&self, id: SessionId) -> Option<&WorkingText> {
        self.registry
            .get(id)
            .filter(|s| s.is_active())
            .map(Session::working)
    }

    /// Mutable working text of an active session.
    pub fn working_mut(&mut self, id: SessionId) -> Option<&mut WorkingText> {
        self.registry
            .get_mut(id)
            .filter(|s| s.is_active())
            .map(Session::working_mut)
    }

    /// Writes the session's working text back, keeping the session open
    /// when the config says so.
    pub fn save(&mut self, id: SessionId) -> Result<SaveOutcome, EditError> {
        self.save_with(id, self.config.keep_open_on_save())
    }

    pub fn save_with(&mut self, id: SessionId, keep_open: bool) -> Result<SaveOutcome, EditError> {
        edit::save(&mut self.doc, &mut self.registry, &self.reflow, id, keep_open)
    }

    /// Ends the session without writing back.
    pub fn discard(&mut self, id: SessionId) -> Result<ClosedSession, EditError> {
        edit::discard(&mut self.doc, &mut self.registry, id)
    }

    /// Tears down every active session without writing any of them back,
    /// returning the receipts in creation order.
    pub fn close_all(&mut self) -> Vec<ClosedSession> {
        let ids = self.registry.active_ids();
        let mut receipts = Vec::with_capacity(ids.len());
        for id in ids {
            if let Ok(receipt) = edit::discard(&mut self.doc, &mut self.registry, id) {
                receipts.push(receipt);
            }
        }
        receipts
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// The document stays writable from outside; guards veto edits that
    /// touch an active session's block.
    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    pub fn text(&self) -> String {
        self.doc.text()
    }

    pub fn session(&self, id: SessionId) -> Option<&Session> {
        self.registry.get(id)
    }

    pub fn sessions(&self) -> impl Iterator<Item = &Session> {
        self.registry.iter()
    }

    /// Presentation rules, for hosts installing their own hooks.
    pub fn rules_mut(&mut self) -> &mut RenderRules {
        &mut self.rules
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.registry.metrics().snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn from_language_rejects_unknown_languages() {
        let Err(err) = Workbench::from_language("x.cob", "* nope\n", "cobol") else {
            panic!("cobol has no built-in comment syntax");
        };
        assert!(err.to_string().contains("no comment syntax"));
    }

    #[test]
    fn start_edit_uses_the_configured_policy() {
        let mut cfg = Config {
            file: ConfigFile {
                edit: EditConfig {
                    policy: "restricted".to_string(),
                    keep_open_on_save: false,
                },
                render: RenderConfig::default(),
            },
            ..Config::default()
        };
        cfg.resolve();
        let syntax = CommentSyntax::for_language("rust").unwrap();
        let mut bench =
            Workbench::with_config("p.rs", "// a\n\n// b\n", syntax, cfg).unwrap();

        let id = bench.start_edit(1).unwrap();
        // Restricted detection stops at the blank line, so only the first
        // block is captured.
        assert_eq!(bench.working(id).unwrap().as_str(), "a\n");
    }

    #[test]
    fn working_access_ends_with_the_session() {
        let mut bench = Workbench::from_language("w.rs", "// note\n", "rust").unwrap();
        let id = bench.start_edit(1).unwrap();
        assert!(bench.working(id).is_some());
        bench.save_with(id, false).unwrap();
        assert!(bench.working(id).is_none());
        assert!(bench.working_mut(id).is_none());
    }

    #[test]
    fn close_all_discards_every_active_session() {
        let mut bench =
            Workbench::from_language("c.rs", "// one\n\ncode\n\n// two\n", "rust").unwrap();
        let first = bench.start_edit_with(1, Policy::BlankLineRestricted).unwrap();
        let second = bench.start_edit_with(15, Policy::BlankLineRestricted).unwrap();
        bench.working_mut(first).unwrap().set("scratch\n");

        let receipts = bench.close_all();
        assert_eq!(receipts.len(), 2);
        assert_eq!(receipts[0].id, first);
        assert_eq!(receipts[0].working.as_str(), "scratch\n");
        assert_eq!(receipts[1].id, second);
        // Nothing was written back and nothing stays locked.
        assert_eq!(bench.text(), "// one\n\ncode\n\n// two\n");
        assert_eq!(bench.document().guard_count(), 0);
        assert_eq!(bench.metrics().discarded, 2);
    }

    #[test]
    fn run_at_probes_without_opening() {
        let bench = Workbench::from_language("r.rs", "code\n// a\n// b\n", "rust").unwrap();
        let run = bench.run_at(6, Policy::Unrestricted).unwrap();
        assert_eq!((run.start, run.end), (4, 15));
        assert!(bench.run_at(2, Policy::Unrestricted).is_none());
    }
}
