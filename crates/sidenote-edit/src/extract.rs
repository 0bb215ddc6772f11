//! Marker extraction.
//!
//! Turns the raw text of a comment run into an editable working copy: the
//! common left margin comes off first, then the first line matching the
//! marker pattern fixes the session marker, and every line sheds its own
//! literal match. Lines that do not carry the session marker (blank
//! separators, lines in a different marker style) are dropped from the
//! copy; their indices are reported so hosts can warn about the loss.

use sidenote_doc::Document;
use sidenote_session::{Marker, WorkingText};
use sidenote_syntax::CommentSyntax;
use tracing::debug;

use crate::boundary::CommentRun;

/// Result of stripping one comment run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StripOutcome {
    /// Marker-free content, one line per surviving block line, newline
    /// terminated.
    pub working: WorkingText,
    /// The captured marker, or `None` when no line matched the pattern.
    pub marker: Option<Marker>,
    /// Common leading indentation removed from the block, restored on
    /// writeback.
    pub margin: String,
    /// Indices (within the margin-normalized block) of dropped lines.
    pub dropped: Vec<usize>,
}

/// Extracts the working copy for `run`.
pub fn strip(doc: &Document, run: &CommentRun, syntax: &CommentSyntax) -> StripOutcome {
    let mut block = doc.slice(run.start, run.end);
    if !block.is_empty() && !block.ends_with('\n') {
        block.push('\n');
    }
    let margin = common_margin(&block);
    let mut marker: Option<Marker> = None;
    let mut dropped = Vec::new();
    let mut text = String::with_capacity(block.len());
    for (idx, line) in block.lines().enumerate() {
        let line = strip_margin(line, &margin);
        let Some(m) = syntax.match_at_start(line) else {
            dropped.push(idx);
            continue;
        };
        let keep = match &marker {
            None => {
                marker = Some(Marker::capture(m));
                true
            }
            Some(mk) => mk.accepts(m),
        };
        if keep {
            text.push_str(&line[m.len()..]);
            text.push('\n');
        } else {
            dropped.push(idx);
        }
    }
    if !dropped.is_empty() {
        debug!(
            target: "edit.strip",
            start = run.start,
            dropped = dropped.len(),
            "unmatched_lines_dropped"
        );
    }
    StripOutcome {
        working: WorkingText::new(text),
        marker,
        margin,
        dropped,
    }
}

/// The longest whitespace prefix shared by every non-blank line.
fn common_margin(text: &str) -> String {
    let mut margin: Option<&str> = None;
    for line in text.lines() {
        if line.trim().is_empty() {
            continue;
        }
        let indent = &line[..line.len() - line.trim_start().len()];
        margin = Some(match margin {
            None => indent,
            Some(current) => common_prefix(current, indent),
        });
    }
    margin.unwrap_or("").to_string()
}

fn common_prefix<'a>(a: &'a str, b: &str) -> &'a str {
    let mut len = 0;
    for (ca, cb) in a.chars().zip(b.chars()) {
        if ca != cb {
            break;
        }
        len += ca.len_utf8();
    }
    &a[..len]
}

/// Removes the margin from one line. Whitespace-only lines may hold less
/// than the full margin; whatever prefix of it they do hold comes off.
fn strip_margin<'a>(line: &'a str, margin: &str) -> &'a str {
    match line.strip_prefix(margin) {
        Some(rest) => rest,
        None => &line[common_prefix(line, margin).len()..],
    }
}
