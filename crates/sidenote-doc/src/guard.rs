//! Range locks over mark pairs.
//!
//! A guard ties read-only protection to a live mark pair: while the guard is
//! registered, any splice whose requested range reaches strictly inside the
//! pair's current extent is rejected before it touches the rope. Edits that
//! stop at the edges pass, matching the pair's edge-insertion biases. The
//! guard names its owning session so rejections can say who holds the lock.

use smallvec::SmallVec;
use thiserror::Error;

use crate::marks::{MarkPairId, MarkTable};

/// Handle to a registered guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GuardId(u64);

impl GuardId {
    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// Rejection raised when a splice reaches into a guarded range.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("chars {start}..{end} are read-only while edit session {owner} ({label}) is active")]
pub struct GuardViolation {
    pub owner: u64,
    pub label: String,
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone)]
struct GuardEntry {
    id: GuardId,
    pair: MarkPairId,
    owner: u64,
    label: String,
}

/// All live guards of one document. Documents carry a handful of sessions at
/// most, so the set stays inline.
#[derive(Debug, Default)]
pub(crate) struct GuardSet {
    entries: SmallVec<[GuardEntry; 4]>,
    next_id: u64,
}

impl GuardSet {
    pub(crate) fn protect(&mut self, pair: MarkPairId, owner: u64, label: String) -> GuardId {
        let id = GuardId(self.next_id);
        self.next_id += 1;
        self.entries.push(GuardEntry {
            id,
            pair,
            owner,
            label,
        });
        id
    }

    pub(crate) fn release(&mut self, id: GuardId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        self.entries.len() != before
    }

    pub(crate) fn release_for_pair(&mut self, pair: MarkPairId) {
        self.entries.retain(|e| e.pair != pair);
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// First guard violated by a splice over `[start, end)`, if any. An empty
    /// range models an insertion; it violates only strictly inside a guard.
    pub(crate) fn check(
        &self,
        marks: &MarkTable,
        start: usize,
        end: usize,
    ) -> Option<GuardViolation> {
        for entry in &self.entries {
            let Some((gs, ge)) = marks.extent(entry.pair) else {
                continue;
            };
            if start < ge && end > gs {
                return Some(GuardViolation {
                    owner: entry.owner,
                    label: entry.label.clone(),
                    start: gs,
                    end: ge,
                });
            }
        }
        None
    }

    pub(crate) fn covering<'a>(
        &'a self,
        marks: &MarkTable,
        offset: usize,
    ) -> Option<(u64, &'a str, usize, usize)> {
        for entry in &self.entries {
            if let Some((gs, ge)) = marks.extent(entry.pair)
                && offset >= gs
                && offset < ge
            {
                return Some((entry.owner, entry.label.as_str(), gs, ge));
            }
        }
        None
    }
}
