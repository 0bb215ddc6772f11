//! Writeback of edited working text.
//!
//! Reconstruction is the strict inverse of extraction: every working line
//! gets the canonical marker back, the block's old extent is replaced with
//! the result in one minimal-diff splice, and the recorded margin is
//! restored by re-flowing the region plus one following char. The session
//! guard drops for the duration of the write and is re-established over
//! the new extent, so a failed write leaves the region protected and the
//! session active.

use sidenote_doc::{Document, GuardViolation, Reflow, ReflowReport, SpliceOutcome};
use sidenote_session::Session;
use tracing::{debug, error};

use crate::EditError;

/// What a committed writeback did to the source document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommitOutcome {
    /// New boundary extent, `[start, end)`.
    pub start: usize,
    pub end: usize,
    /// The effective (diff-trimmed) text replacement.
    pub replaced: SpliceOutcome,
    /// What the indentation re-flow pass did.
    pub reflow: ReflowReport,
}

/// Writes the session's working text back into the document.
///
/// The boundary extent and guard are updated in place; the session stays
/// active either way. Fails with [`EditError::MarkerNotCaptured`] before
/// touching the document when extraction never fixed a marker.
pub fn commit(
    doc: &mut Document,
    session: &mut Session,
    reflow: &dyn Reflow,
) -> Result<CommitOutcome, EditError> {
    if !session.is_active() {
        return Err(EditError::SessionClosed(session.id()));
    }
    let canonical = match session.marker() {
        Some(marker) => marker.canonical().to_string(),
        None => return Err(EditError::MarkerNotCaptured),
    };
    let Some((start, end)) = doc.mark_extent(session.boundary()) else {
        return Err(EditError::SessionClosed(session.id()));
    };

    session.working_mut().ensure_trailing_newline();
    let mut recon = String::new();
    for line in session.working().lines() {
        recon.push_str(&canonical);
        recon.push_str(line);
        recon.push('\n');
    }

    doc.release(session.guard());
    match apply(doc, start, end, &recon, session.margin(), reflow) {
        Ok((new_start, new_end, replaced, report)) => {
            doc.move_mark_pair(session.boundary(), new_start, new_end);
            reprotect(doc, session);
            debug!(
                target: "edit.commit",
                session = session.id().raw(),
                old_start = start,
                old_end = end,
                start = new_start,
                end = new_end,
                reindented = report.reindented,
                "writeback_applied"
            );
            Ok(CommitOutcome {
                start: new_start,
                end: new_end,
                replaced,
                reflow: report,
            })
        }
        Err(violation) => {
            reprotect(doc, session);
            Err(EditError::Guard(violation))
        }
    }
}

type Applied = (usize, usize, SpliceOutcome, ReflowReport);

/// Replace, restore the line-start invariant, then re-indent. Runs with the
/// session guard down.
fn apply(
    doc: &mut Document,
    start: usize,
    end: usize,
    recon: &str,
    margin: &str,
    reflow: &dyn Reflow,
) -> Result<Applied, GuardViolation> {
    let replaced = doc.splice(start, end, recon)?;
    let mut new_start = start;
    if new_start > 0 && doc.char(new_start - 1) != Some('\n') {
        // The replacement must begin at a line start; re-supply the newline
        // the old extent carried.
        doc.insert(new_start, "\n")?;
        new_start += 1;
    }
    let text_end = new_start + recon.chars().count();
    let report = reflow.reflow(doc, new_start, (text_end + 1).min(doc.len()), margin)?;
    let new_end = text_end.saturating_add_signed(report.delta);
    Ok((new_start, new_end, replaced, report))
}

fn reprotect(doc: &mut Document, session: &mut Session) {
    match doc.protect(
        session.boundary(),
        session.id().raw(),
        session.label().to_string(),
    ) {
        Some(guard) => session.set_guard(guard),
        None => error!(
            target: "edit.commit",
            session = session.id().raw(),
            "guard_reestablish_failed"
        ),
    }
}
