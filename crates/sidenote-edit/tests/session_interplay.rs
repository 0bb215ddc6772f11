//! Sessions on a moving document: boundary tracking across external
//! edits, guard independence, and resume-then-commit flows.

use pretty_assertions::assert_eq;
use sidenote_doc::{Document, MarginReflow};
use sidenote_edit::{EditError, Policy, save, start_edit};
use sidenote_session::{SessionId, SessionRegistry};
use sidenote_syntax::{CommentSyntax, RenderRules, ScanTracker};

struct Host {
    doc: Document,
    tracker: ScanTracker,
    rules: RenderRules,
    registry: SessionRegistry,
}

impl Host {
    fn new(text: &str) -> Self {
        Self {
            doc: Document::from_str("interplay.rs", text).unwrap(),
            tracker: ScanTracker::new(CommentSyntax::for_language("rust").unwrap()),
            rules: RenderRules::new(),
            registry: SessionRegistry::new(),
        }
    }

    fn start(&mut self, position: usize, policy: Policy) -> SessionId {
        start_edit(
            &mut self.doc,
            &self.tracker,
            self.tracker.syntax(),
            &self.rules,
            &mut self.registry,
            position,
            policy,
        )
        .unwrap()
    }

    fn set_working(&mut self, id: SessionId, text: &str) {
        self.registry.get_mut(id).unwrap().working_mut().set(text);
    }

    fn save(&mut self, id: SessionId, keep_open: bool) {
        save(&mut self.doc, &mut self.registry, &MarginReflow, id, keep_open).unwrap();
    }
}

#[test]
fn boundary_tracks_insertions_before_the_block() {
    let mut host = Host::new("top\n// a\n// b\n");
    let id = host.start(6, Policy::Unrestricted);

    // Code added ahead of the block shifts the protected extent along.
    host.doc.insert(0, "pre\n").unwrap();
    host.set_working(id, "a\nc\n");
    host.save(id, false);

    assert_eq!(host.doc.text(), "pre\ntop\n// a\n// c\n");
}

#[test]
fn two_sessions_commit_independently() {
    let mut host = Host::new("// one\n\ncode\n\n// two\n");
    let first = host.start(1, Policy::Unrestricted);
    let second = host.start(15, Policy::BlankLineRestricted);
    assert_ne!(first, second);
    assert_eq!(host.doc.guard_count(), 2);

    host.set_working(first, "uno\n");
    host.set_working(second, "dos\n");
    host.save(first, false);
    assert_eq!(host.doc.guard_count(), 1);
    host.save(second, false);

    assert_eq!(host.doc.text(), "// uno\n\ncode\n\n// dos\n");
    assert_eq!(host.doc.guard_count(), 0);
    let metrics = host.registry.metrics().snapshot();
    assert_eq!(metrics.opened, 2);
    assert_eq!(metrics.committed, 2);
}

#[test]
fn guards_of_concurrent_sessions_lock_disjoint_ranges() {
    let mut host = Host::new("// one\n\ncode\n\n// two\n");
    host.start(1, Policy::BlankLineRestricted);
    host.start(15, Policy::BlankLineRestricted);

    // The gap between the blocks stays writable.
    host.doc.splice(8, 12, "data").unwrap();

    let inside_first = host.doc.splice(2, 3, "X").unwrap_err();
    assert_eq!(inside_first.start, 0);
    let inside_second = host.doc.splice(16, 17, "X").unwrap_err();
    assert_eq!(inside_second.start, 14);
}

#[test]
fn keep_open_save_then_resume_commits_once_more() {
    let mut host = Host::new("// a\n// b\nfn\n");
    let id = host.start(1, Policy::Unrestricted);
    host.set_working(id, "a\nb\nc\n");
    host.save(id, true);
    assert_eq!(host.doc.text(), "// a\n// b\n// c\nfn\n");

    // The session is still live, so editing the grown block resumes it.
    let resumed = host.start(2, Policy::Unrestricted);
    assert_eq!(resumed, id);
    host.set_working(id, "z\n");
    host.save(id, false);

    assert_eq!(host.doc.text(), "// z\nfn\n");
    let metrics = host.registry.metrics().snapshot();
    assert_eq!(metrics.opened, 1);
    assert_eq!(metrics.resumed, 1);
    assert_eq!(metrics.committed, 2);
}

#[test]
fn restricted_round_trip_preserves_surrounding_blank_lines() {
    let mut host = Host::new("code\n\n  // x\n\nmore\n");
    let id = host.start(9, Policy::BlankLineRestricted);
    let outcome = save(
        &mut host.doc,
        &mut host.registry,
        &MarginReflow,
        id,
        false,
    )
    .unwrap();

    assert_eq!(host.doc.text(), "code\n\n  // x\n\nmore\n");
    assert!(!outcome.commit.reflow.touched_following);
}

#[test]
fn closed_session_cannot_save_again() {
    let mut host = Host::new("// a\n");
    let id = host.start(1, Policy::Unrestricted);
    host.save(id, false);

    let err = save(&mut host.doc, &mut host.registry, &MarginReflow, id, false).unwrap_err();
    assert!(matches!(err, EditError::SessionClosed(_)));
}
