//! Comment run detection.
//!
//! The walk starts one char past the cursor so a cursor sitting exactly on
//! a marker still counts as inside it, then alternates between skipping
//! whitespace backward and asking the tracker where it landed. Landing
//! inside a comment jumps to that comment's marker and repeats; landing
//! mid-token (inside a string literal) nudges forward one char and retries
//! with the whitespace skip floored so the walk cannot oscillate. The walk
//! ends on settled non-comment ground, which is the run start; if it never
//! passed through a comment on the way, the cursor was not in one.

use sidenote_doc::Document;
use sidenote_syntax::LexicalTracker;
use tracing::{debug, trace};

/// How run boundaries treat blank lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Policy {
    /// Whitespace, including blank lines, joins adjacent comment blocks
    /// into one run.
    #[default]
    Unrestricted,
    /// A blank line ends the run in either direction.
    BlankLineRestricted,
}

/// A contiguous comment block as char offsets `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommentRun {
    pub start: usize,
    pub end: usize,
    pub policy: Policy,
}

impl CommentRun {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Computes the comment run containing `position`, or `None` when the
/// position is not inside any comment.
pub fn find_run(
    doc: &Document,
    tracker: &dyn LexicalTracker,
    position: usize,
    policy: Policy,
) -> Option<CommentRun> {
    if doc.is_empty() {
        return None;
    }
    let len = doc.len();
    let mut pos = (position + 1).min(len);
    let mut floor = 0usize;
    let mut entered = false;
    loop {
        pos = skip_ws_backward(doc, pos, floor, policy);
        let state = tracker.state_at(doc, pos);
        if state.in_comment {
            entered = true;
            match state.comment_start {
                Some(start) if start < pos => {
                    pos = start;
                    continue;
                }
                _ => break,
            }
        }
        if !state.parse_complete && pos < len {
            // Mid-token; retry one char forward, never re-skipping below
            // this point.
            pos += 1;
            floor = pos;
            continue;
        }
        break;
    }
    if !entered {
        trace!(target: "edit.boundary", position, "position_outside_comments");
        return None;
    }
    let start = pos;
    let end = run_end(doc, tracker, start, policy);
    debug!(
        target: "edit.boundary",
        position,
        start,
        end,
        policy = ?policy,
        "run_detected"
    );
    Some(CommentRun { start, end, policy })
}

/// Steps `pos` backward over whitespace, stopping at `floor`, at the first
/// non-whitespace char, or (restricted) before stepping onto the newline of
/// a blank line.
fn skip_ws_backward(doc: &Document, mut pos: usize, floor: usize, policy: Policy) -> usize {
    while pos > floor {
        let Some(c) = doc.char(pos - 1) else { break };
        if !c.is_whitespace() {
            break;
        }
        if policy == Policy::BlankLineRestricted
            && c == '\n'
            && doc.is_blank_line(doc.line_of(pos - 1))
        {
            break;
        }
        pos -= 1;
    }
    pos
}

/// Walks forward from `start` over whitespace-then-comment sequences; the
/// run ends where no further comment follows. Trailing whitespace after the
/// last comment line stays outside the run.
fn run_end(doc: &Document, tracker: &dyn LexicalTracker, start: usize, policy: Policy) -> usize {
    let len = doc.len();
    let mut end = start;
    loop {
        let mut probe = end;
        let mut blocked = false;
        while probe < len {
            let Some(c) = doc.char(probe) else { break };
            if !c.is_whitespace() {
                break;
            }
            if policy == Policy::BlankLineRestricted && doc.is_blank_line(doc.line_of(probe)) {
                blocked = true;
                break;
            }
            probe += 1;
        }
        if blocked || probe >= len {
            break;
        }
        let state = tracker.state_at(doc, probe + 1);
        if state.in_comment && state.comment_start == Some(probe) {
            // Consume the comment line through its newline.
            end = (doc.line_end(doc.line_of(probe)) + 1).min(len);
            continue;
        }
        break;
    }
    end
}
