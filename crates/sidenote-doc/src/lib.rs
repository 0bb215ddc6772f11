//! Rope-based reference document with live marks and range guards.
//!
//! The document is the single mutation point for everything above it: all
//! edits funnel through [`Document::splice`], which trims the edit down to
//! the minimal differing span, rejects writes into guarded ranges, and keeps
//! every registered mark pair consistent with the new text. Offsets are char
//! offsets into the rope throughout; byte arithmetic stays private.

use anyhow::Result;
use ropey::Rope;
use tracing::{debug, trace};

pub mod guard;
pub mod indent;
pub mod marks;

pub use guard::{GuardId, GuardViolation};
pub use indent::{MarginReflow, Reflow, ReflowReport};
pub use marks::{Bias, MarkPairId};

use guard::GuardSet;
use marks::MarkTable;

/// The effective edit applied by [`Document::splice`] after minimal-diff
/// trimming. `removed` and `inserted` are char counts at `start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpliceOutcome {
    pub start: usize,
    pub removed: usize,
    pub inserted: usize,
}

impl SpliceOutcome {
    pub fn noop(at: usize) -> Self {
        Self {
            start: at,
            removed: 0,
            inserted: 0,
        }
    }

    /// Whether the splice changed any text at all.
    pub fn changed(&self) -> bool {
        self.removed != 0 || self.inserted != 0
    }
}

/// A text document backed by a `ropey::Rope`, addressed by char offsets.
pub struct Document {
    rope: Rope,
    pub name: String,
    revision: u64,
    modified: bool,
    marks: MarkTable,
    guards: GuardSet,
}

impl Document {
    /// Construct a document from an in-memory string slice.
    pub fn from_str(name: impl Into<String>, content: &str) -> Result<Self> {
        Ok(Self {
            rope: Rope::from_str(content),
            name: name.into(),
            revision: 0,
            modified: false,
            marks: MarkTable::default(),
            guards: GuardSet::default(),
        })
    }

    /// Total length in chars.
    pub fn len(&self) -> usize {
        self.rope.len_chars()
    }

    pub fn is_empty(&self) -> bool {
        self.rope.len_chars() == 0
    }

    /// Full text as an owned `String`.
    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    /// Char at `offset`, or `None` past the end.
    pub fn char(&self, offset: usize) -> Option<char> {
        self.rope.get_char(offset)
    }

    /// The slice in char range `[start, end)`, clamped to the document.
    pub fn slice(&self, start: usize, end: usize) -> String {
        let total = self.rope.len_chars();
        let s = start.min(total);
        let e = end.min(total);
        if s >= e {
            return String::new();
        }
        self.rope.slice(s..e).to_string()
    }

    /// Total number of lines.
    pub fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    /// Return the requested line as an owned `String` (including trailing
    /// newline if present).
    pub fn line(&self, idx: usize) -> Option<String> {
        if idx < self.rope.len_lines() {
            Some(self.rope.line(idx).to_string())
        } else {
            None
        }
    }

    /// Line index containing `offset` (clamped to the last line).
    pub fn line_of(&self, offset: usize) -> usize {
        self.rope.char_to_line(offset.min(self.rope.len_chars()))
    }

    /// Char offset of the first char of line `idx`.
    pub fn line_start(&self, idx: usize) -> usize {
        let idx = idx.min(self.rope.len_lines().saturating_sub(1));
        self.rope.line_to_char(idx)
    }

    /// Char offset of the line's terminating newline, or the document end for
    /// the final line.
    pub fn line_end(&self, idx: usize) -> usize {
        let idx = idx.min(self.rope.len_lines().saturating_sub(1));
        let start = self.rope.line_to_char(idx);
        let line = self.rope.line(idx);
        let mut chars = line.len_chars();
        if chars > 0 && line.char(chars - 1) == '\n' {
            chars -= 1;
        }
        start + chars
    }

    /// Whether line `idx` is empty or holds only whitespace.
    pub fn is_blank_line(&self, idx: usize) -> bool {
        if idx >= self.rope.len_lines() {
            return true;
        }
        self.rope.line(idx).chars().all(|c| c.is_whitespace())
    }

    /// Leading whitespace of line `idx`.
    pub fn line_indent(&self, idx: usize) -> String {
        match self.line(idx) {
            Some(line) => line
                .chars()
                .take_while(|c| *c != '\n' && c.is_whitespace())
                .collect(),
            None => String::new(),
        }
    }

    /// Monotonic edit counter; bumped once per effective splice.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Whether the document has reported a modification since creation or the
    /// last [`Document::clear_modified`].
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Report the document modified without changing text. Used by re-flow
    /// when it touches a line it leaves textually intact.
    pub fn mark_modified(&mut self) {
        self.modified = true;
    }

    pub fn clear_modified(&mut self) {
        self.modified = false;
    }

    /// Insert `text` at `at`. Convenience over [`Document::splice`].
    pub fn insert(&mut self, at: usize, text: &str) -> Result<SpliceOutcome, GuardViolation> {
        self.splice(at, at, text)
    }

    /// Replace char range `[start, end)` with `replacement`.
    ///
    /// The edit is first checked against the guard set using the requested
    /// range, then trimmed to the minimal differing span (shared prefix and
    /// suffix chars are left untouched) so marks inside the unchanged portions
    /// survive. Marks adjust per their bias, the revision bumps once, and the
    /// effective edit is returned.
    pub fn splice(
        &mut self,
        start: usize,
        end: usize,
        replacement: &str,
    ) -> Result<SpliceOutcome, GuardViolation> {
        let total = self.rope.len_chars();
        let s = start.min(total);
        let e = end.min(total).max(s);

        if let Some(violation) = self.guards.check(&self.marks, s, e) {
            debug!(
                target: "doc.guard",
                owner = violation.owner,
                start = s,
                end = e,
                "splice_rejected"
            );
            return Err(violation);
        }

        let outgoing = self.slice(s, e);
        let (prefix, suffix) = common_affix(&outgoing, replacement);
        let eff_start = s + prefix;
        let eff_end = e - suffix;
        let incoming = mid_slice(replacement, prefix, suffix);

        if eff_start == eff_end && incoming.is_empty() {
            return Ok(SpliceOutcome::noop(eff_start));
        }

        if eff_start < eff_end {
            self.rope.remove(eff_start..eff_end);
        }
        if !incoming.is_empty() {
            self.rope.insert(eff_start, incoming);
        }
        let removed = eff_end - eff_start;
        let inserted = incoming.chars().count();
        self.marks.adjust(eff_start, removed, inserted);
        self.revision += 1;
        self.modified = true;
        trace!(
            target: "doc.splice",
            start = eff_start,
            removed,
            inserted,
            revision = self.revision,
            "splice"
        );
        Ok(SpliceOutcome {
            start: eff_start,
            removed,
            inserted,
        })
    }

    /// Register a live mark pair over `[start, end)` (normalized and
    /// clamped). The pair tracks subsequent edits per the endpoint biases.
    pub fn create_mark_pair(
        &mut self,
        start: usize,
        end: usize,
        start_bias: Bias,
        end_bias: Bias,
    ) -> MarkPairId {
        let total = self.rope.len_chars();
        let mut s = start.min(total);
        let mut e = end.min(total);
        if s > e {
            std::mem::swap(&mut s, &mut e);
        }
        self.marks.create(s, e, start_bias, end_bias)
    }

    /// Current extent of a mark pair, if it is still registered.
    pub fn mark_extent(&self, id: MarkPairId) -> Option<(usize, usize)> {
        self.marks.extent(id)
    }

    /// Reposition a mark pair. Returns false for an unknown id.
    pub fn move_mark_pair(&mut self, id: MarkPairId, start: usize, end: usize) -> bool {
        let total = self.rope.len_chars();
        let s = start.min(total);
        let e = end.min(total).max(s);
        self.marks.relocate(id, s, e)
    }

    /// Drop a mark pair and any guard still attached to it.
    pub fn drop_mark_pair(&mut self, id: MarkPairId) -> bool {
        self.guards.release_for_pair(id);
        self.marks.remove(id)
    }

    /// Protect the range tracked by `pair` against edits. `owner` and `label`
    /// identify the responsible session in rejection errors. Returns `None`
    /// for an unknown pair.
    pub fn protect(
        &mut self,
        pair: MarkPairId,
        owner: u64,
        label: impl Into<String>,
    ) -> Option<GuardId> {
        if self.marks.extent(pair).is_none() {
            return None;
        }
        let id = self.guards.protect(pair, owner, label.into());
        trace!(target: "doc.guard", owner, guard = id.raw(), "guard_established");
        Some(id)
    }

    /// Release a guard. Returns false if it was not live.
    pub fn release(&mut self, id: GuardId) -> bool {
        let released = self.guards.release(id);
        if released {
            trace!(target: "doc.guard", guard = id.raw(), "guard_released");
        }
        released
    }

    /// The guard covering `offset`, if any, as (owner, label, start, end).
    pub fn guard_at(&self, offset: usize) -> Option<(u64, &str, usize, usize)> {
        self.guards.covering(&self.marks, offset)
    }

    /// Number of live guards.
    pub fn guard_count(&self) -> usize {
        self.guards.len()
    }
}

/// Count the shared prefix and suffix of `old` and `new` in chars, with the
/// suffix bounded so the two never overlap.
fn common_affix(old: &str, new: &str) -> (usize, usize) {
    let mut prefix = 0usize;
    for (a, b) in old.chars().zip(new.chars()) {
        if a != b {
            break;
        }
        prefix += 1;
    }
    let old_rest = old.chars().count() - prefix;
    let new_rest = new.chars().count() - prefix;
    let limit = old_rest.min(new_rest);
    let mut suffix = 0usize;
    for (a, b) in old.chars().rev().zip(new.chars().rev()) {
        if suffix >= limit || a != b {
            break;
        }
        suffix += 1;
    }
    (prefix, suffix)
}

/// The byte slice of `text` with `prefix` leading and `suffix` trailing chars
/// removed.
fn mid_slice(text: &str, prefix: usize, suffix: usize) -> &str {
    let start = text
        .char_indices()
        .nth(prefix)
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    let trailing: usize = text.chars().rev().take(suffix).map(|c| c.len_utf8()).sum();
    &text[start..text.len() - trailing]
}
