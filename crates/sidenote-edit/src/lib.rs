//! Comment-block editing operations.
//!
//! This crate ties the layers together into the user-visible verbs. An
//! edit starts with [`start_edit`]: detect the comment run around the
//! cursor, resume the session already covering it if one is active, or
//! strip the block into a fresh working copy behind a guarded boundary.
//! The working text is then edited freely through the session; [`save`]
//! writes it back (optionally keeping the session open) and [`discard`]
//! throws it away. Both end-of-life paths release the guard and drop the
//! boundary marks, handing the final working text back as a receipt.
//!
//! Everything is synchronous and single-threaded; failures are returned
//! eagerly as [`EditError`] and never leave the document half-written.

pub mod boundary;
pub mod extract;
pub mod writeback;

pub use boundary::{find_run, CommentRun, Policy};
pub use extract::{strip, StripOutcome};
pub use writeback::{commit, CommitOutcome};

use sidenote_doc::{Bias, Document, GuardViolation, Reflow};
use sidenote_session::{Session, SessionId, SessionRegistry, WorkingText};
use sidenote_syntax::{CommentSyntax, LexicalTracker, RenderMode, RenderRules};
use thiserror::Error;
use tracing::{debug, info, trace, warn};

/// Failures surfaced by the editing operations.
#[derive(Debug, Error)]
pub enum EditError {
    /// The cursor position resolves to no comment run.
    #[error("position {position} is not inside a comment")]
    NotInComment { position: usize },

    /// Extraction never matched the marker pattern, so there is nothing to
    /// prefix working lines with on writeback.
    #[error("no line of the block matched the comment marker pattern")]
    MarkerNotCaptured,

    /// A write ran into a guarded range.
    #[error(transparent)]
    Guard(#[from] GuardViolation),

    /// The session id is not registered.
    #[error("unknown session {0}")]
    UnknownSession(SessionId),

    /// The session was already torn down.
    #[error("session {0} is already closed")]
    SessionClosed(SessionId),
}

/// Receipt handed back when a session ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClosedSession {
    pub id: SessionId,
    /// The final working text, whether or not it was written back.
    pub working: WorkingText,
    /// Host view handle to restore, when one was recorded.
    pub view_token: Option<u64>,
}

/// Result of [`save`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveOutcome {
    pub commit: CommitOutcome,
    /// Present when the save also closed the session.
    pub closed: Option<ClosedSession>,
}

/// Opens (or resumes) an edit session for the comment run at `position`.
///
/// A run overlapping the boundary of an active session resumes that
/// session. Otherwise the run is stripped, its extent guarded behind fresh
/// boundary marks, and a presentation mode selected; a failing presentation
/// hook is logged and downgraded to plain rather than aborting the open.
#[allow(clippy::too_many_arguments)]
pub fn start_edit(
    doc: &mut Document,
    tracker: &dyn LexicalTracker,
    syntax: &CommentSyntax,
    rules: &RenderRules,
    registry: &mut SessionRegistry,
    position: usize,
    policy: Policy,
) -> Result<SessionId, EditError> {
    let run = find_run(doc, tracker, position, policy)
        .ok_or(EditError::NotInComment { position })?;

    if let Some(id) = registry.find_active_overlapping(doc, run.start, run.end) {
        registry.metrics().record_resumed();
        debug!(
            target: "session",
            id = id.raw(),
            start = run.start,
            end = run.end,
            "session_resumed"
        );
        return Ok(id);
    }

    let outcome = strip(doc, &run, syntax);
    let id = registry.allocate_id();
    let label = format!("{}:{}", doc.name, doc.line_of(run.start) + 1);
    let pair = doc.create_mark_pair(run.start, run.end, Bias::After, Bias::Before);
    // The pair was created just above, so the guard always attaches.
    let Some(guard) = doc.protect(pair, id.raw(), label.clone()) else {
        doc.drop_mark_pair(pair);
        return Err(EditError::UnknownSession(id));
    };

    let (mode, fallback) = match rules.select(syntax.language()) {
        Ok(mode) => (mode, false),
        Err(err) => {
            warn!(
                target: "render",
                language = syntax.language(),
                error = %err,
                "presentation_setup_failed_using_plain"
            );
            registry.metrics().record_render_fallback();
            (RenderMode::Plain, true)
        }
    };

    let mut session = Session::open(id, pair, guard, label);
    session.set_extract(outcome.working, outcome.marker, outcome.margin, outcome.dropped);
    session.set_render(mode, fallback);
    registry.insert(session);
    registry.metrics().record_opened();
    info!(
        target: "session",
        id = id.raw(),
        start = run.start,
        end = run.end,
        policy = ?run.policy,
        mode = %mode,
        "session_opened"
    );
    Ok(id)
}

/// Writes the session's working text back to the document.
///
/// With `keep_open` the session stays active for further edits; otherwise
/// the write is followed by teardown and the receipt is returned in
/// [`SaveOutcome::closed`]. A failed write leaves the session active and
/// the source unchanged.
pub fn save(
    doc: &mut Document,
    registry: &mut SessionRegistry,
    reflow: &dyn Reflow,
    id: SessionId,
    keep_open: bool,
) -> Result<SaveOutcome, EditError> {
    let session = registry
        .get_mut(id)
        .ok_or(EditError::UnknownSession(id))?;
    if !session.is_active() {
        return Err(EditError::SessionClosed(id));
    }
    let outcome = commit(doc, session, reflow)?;
    registry.metrics().record_committed();
    let closed = if keep_open {
        None
    } else {
        teardown(doc, registry, id)
    };
    info!(target: "edit.commit", session = id.raw(), keep_open, "session_saved");
    Ok(SaveOutcome {
        commit: outcome,
        closed,
    })
}

/// Ends the session without writing anything back.
pub fn discard(
    doc: &mut Document,
    registry: &mut SessionRegistry,
    id: SessionId,
) -> Result<ClosedSession, EditError> {
    match registry.get(id) {
        None => return Err(EditError::UnknownSession(id)),
        Some(session) if !session.is_active() => {
            return Err(EditError::SessionClosed(id));
        }
        Some(_) => {}
    }
    let closed = teardown(doc, registry, id).ok_or(EditError::SessionClosed(id))?;
    registry.metrics().record_discarded();
    info!(target: "session", id = id.raw(), "session_discarded");
    Ok(closed)
}

/// Releases the guard, drops the boundary marks, and closes the session in
/// place, leaving its record behind as a receipt.
fn teardown(
    doc: &mut Document,
    registry: &mut SessionRegistry,
    id: SessionId,
) -> Option<ClosedSession> {
    let session = registry.get_mut(id)?;
    if !session.is_active() {
        return None;
    }
    doc.release(session.guard());
    doc.drop_mark_pair(session.boundary());
    let working = session.take_working();
    let view_token = session.view_token();
    session.close();
    trace!(target: "session", id = id.raw(), "session_torn_down");
    Some(ClosedSession {
        id,
        working,
        view_token,
    })
}
